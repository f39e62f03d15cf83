use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{FollowerId, ItemId, MediaType, RatedItem, Rating},
    services::providers::MediaService,
};

/// Upper bound on media list chunks per account
const MAX_RATED_ITEM_CHUNKS: u32 = 200;

/// Item -> rating map of a single follower
pub type FollowerScores = HashMap<ItemId, Rating>;

/// Per-follower ratings, present only for followers whose list has been loaded
///
/// A follower's map is always installed whole and never edited in place.
#[derive(Debug, Default)]
pub struct FollowerScoreIndex {
    scores: HashMap<FollowerId, FollowerScores>,
}

impl FollowerScoreIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self, follower_id: FollowerId, scores: FollowerScores) {
        self.scores.insert(follower_id, scores);
    }

    pub fn remove(&mut self, follower_id: FollowerId) -> Option<FollowerScores> {
        self.scores.remove(&follower_id)
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }

    pub fn get(&self, follower_id: FollowerId) -> Option<&FollowerScores> {
        self.scores.get(&follower_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FollowerId, &FollowerScores)> {
        self.scores.iter()
    }
}

/// Builds a follower's item -> rating map; a repeated item keeps its last entry
pub fn build_scores(entries: impl IntoIterator<Item = RatedItem>) -> FollowerScores {
    entries
        .into_iter()
        .map(|entry| (entry.item_id, entry.rating))
        .collect()
}

/// Pulls an account's whole media list, chunk by chunk
///
/// A list that still reports more chunks at the limit is an error rather than a
/// partial map, since installed maps must be complete.
pub async fn fetch_follower_scores(
    service: &dyn MediaService,
    user_name: &str,
    media_type: MediaType,
) -> AppResult<FollowerScores> {
    let mut entries = Vec::new();

    for chunk in 1..=MAX_RATED_ITEM_CHUNKS {
        let page = service.list_rated_items(user_name, media_type, chunk).await?;
        entries.extend(page.entries);

        if !page.has_next_chunk {
            return Ok(build_scores(entries));
        }
    }

    tracing::warn!(
        user_name = user_name,
        chunks = MAX_RATED_ITEM_CHUNKS,
        entries = entries.len(),
        "Media list still has chunks at the limit"
    );

    Err(AppError::ExternalApi(format!(
        "media list of {} exceeds {} chunks",
        user_name, MAX_RATED_ITEM_CHUNKS
    )))
}
