use std::collections::HashMap;

use chrono::Utc;

use crate::{
    models::{FollowerRating, ItemId, Rating, StatisticBundle},
    services::{score_index::FollowerScoreIndex, weights::WeightTable},
};

/// Mean of the ratings, rounded to one decimal place; 0 when empty
pub fn average(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|&r| r as u32).sum();
    let mean = sum as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Middle value, or the mean of the two middle values; 0 when empty
pub fn median(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let mut sorted = ratings.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid] as f64
    } else {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    }
}

/// Derives average, median and count from the followers' records
///
/// Zero ratings mean "tracking, not scored": they count towards `count` but not
/// towards the average or median.
pub fn compute_bundle(ratings: Vec<FollowerRating>) -> StatisticBundle {
    let scored: Vec<Rating> = ratings
        .iter()
        .map(|r| r.rating)
        .filter(|&r| r > 0)
        .collect();

    StatisticBundle {
        average: average(&scored),
        median: median(&scored),
        count: ratings.len(),
        ratings,
        computed_at: Utc::now(),
    }
}

/// Weighted number of loaded followers with any record of each item
///
/// Presence is what counts, not the rating value. Items nobody has are absent.
pub fn popularity_scores(
    index: &FollowerScoreIndex,
    weights: &WeightTable,
) -> HashMap<ItemId, u32> {
    let mut scores: HashMap<ItemId, u32> = HashMap::new();

    for (&follower_id, items) in index.iter() {
        let weight = weights.get(follower_id) as u32;
        for &item_id in items.keys() {
            *scores.entry(item_id).or_insert(0) += weight;
        }
    }

    scores
}
