use std::collections::HashMap;

use crate::models::{ItemId, StatisticBundle};

/// Memoized statistic bundles for the current root user
///
/// Entries never expire on their own; the whole cache is dropped when the root user
/// is reloaded.
#[derive(Debug, Default)]
pub struct DetailCache {
    entries: HashMap<ItemId, StatisticBundle>,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, item_id: ItemId) -> Option<StatisticBundle> {
        self.entries.get(&item_id).cloned()
    }

    pub fn insert(&mut self, item_id: ItemId, bundle: StatisticBundle) {
        self.entries.insert(item_id, bundle);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
