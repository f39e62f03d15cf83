use std::collections::HashMap;

use crate::models::FollowerId;

/// Influence of a follower that was never toggled
pub const DEFAULT_WEIGHT: u8 = 1;

/// Influence of a starred follower
pub const BOOSTED_WEIGHT: u8 = 2;

/// Per-follower influence on the popularity score
///
/// Independent of load state and kept across root user reloads.
#[derive(Debug, Default, Clone)]
pub struct WeightTable {
    weights: HashMap<FollowerId, u8>,
}

impl WeightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, follower_id: FollowerId) -> u8 {
        self.weights
            .get(&follower_id)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// Flips between the two tiers and returns the new weight
    pub fn toggle(&mut self, follower_id: FollowerId) -> u8 {
        let next = if self.get(follower_id) == DEFAULT_WEIGHT {
            BOOSTED_WEIGHT
        } else {
            DEFAULT_WEIGHT
        };
        self.weights.insert(follower_id, next);
        next
    }
}
