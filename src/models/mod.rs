use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod anilist;

/// AniList user id of a followed account
pub type FollowerId = u64;

/// Stable id of a trackable media entity (show or book)
pub type ItemId = u64;

/// A follower's score for an item. 0 means tracked but not scored.
pub type Rating = u8;

/// Highest valid rating on the POINT_10 scale
pub const MAX_RATING: Rating = 10;

/// Kind of media list being compared
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    #[default]
    Anime,
    Manga,
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Anime => write!(f, "ANIME"),
            MediaType::Manga => write!(f, "MANGA"),
        }
    }
}

/// Where an item sits on an account's list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListStatus {
    Current,
    Planning,
    Completed,
    Dropped,
    Paused,
    Repeating,
}

/// Progress of fetching one follower's rated items
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    /// Only reached under the sticky failure policy
    Failed,
}

/// Public identity of an account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowerProfile {
    pub id: FollowerId,
    pub name: String,
    pub profile_url: String,
    pub avatar: Option<String>,
}

/// A followed account together with the state of its rating data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Follower {
    pub profile: FollowerProfile,
    pub state: LoadState,
}

impl Follower {
    pub fn new(profile: FollowerProfile) -> Self {
        Self {
            profile,
            state: LoadState::NotLoaded,
        }
    }

    pub fn id(&self) -> FollowerId {
        self.profile.id
    }
}

/// Resolved identity of the root user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: FollowerId,
    pub name: String,
    pub avatar: Option<String>,
}

/// One page of the accounts a user follows
#[derive(Debug, Clone, Default)]
pub struct FollowingPage {
    pub items: Vec<FollowerProfile>,
    pub has_next_page: bool,
}

/// A single entry on an account's media list
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatedItem {
    pub item_id: ItemId,
    pub rating: Rating,
    pub status: ListStatus,
}

/// One chunk of an account's media list
#[derive(Debug, Clone, Default)]
pub struct RatedItemsPage {
    pub entries: Vec<RatedItem>,
    pub has_next_chunk: bool,
}

/// A follower's record for a single item, as returned by the batch lookup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRecord {
    pub rating: Rating,
    pub status: ListStatus,
}

/// One row of a statistic bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowerRating {
    pub follower: FollowerProfile,
    pub rating: Rating,
    pub status: ListStatus,
}

/// Aggregate of what the followed accounts think of one item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatisticBundle {
    /// Followers with any record of the item, in directory order
    pub ratings: Vec<FollowerRating>,
    /// Mean of the positive ratings, one decimal place
    pub average: f64,
    /// Median of the positive ratings
    pub median: f64,
    /// Number of followers tracking the item, scored or not
    pub count: usize,
    pub computed_at: DateTime<Utc>,
}

impl StatisticBundle {
    pub fn empty() -> Self {
        Self {
            ratings: Vec::new(),
            average: 0.0,
            median: 0.0,
            count: 0,
            computed_at: Utc::now(),
        }
    }
}

/// Read-only snapshot of a follower for clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FollowerView {
    #[serde(flatten)]
    pub profile: FollowerProfile,
    pub state: LoadState,
    pub weight: u8,
}
