// ============================================================================
// AniList GraphQL wire types
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    FollowerProfile, ItemId, ItemRecord, ListStatus, Rating, RatedItem, UserIdentity, MAX_RATING,
};

/// Request body for the GraphQL endpoint
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

/// Envelope around every GraphQL response
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub status: Option<u16>,
    /// Response path the error belongs to, e.g. `["u20", "mediaList"]`
    #[serde(default)]
    pub path: Vec<serde_json::Value>,
}

impl GraphQlError {
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404) || self.message.to_lowercase().starts_with("not found")
    }

    /// Top-level field (or alias) the error is attached to
    pub fn root_field(&self) -> Option<&str> {
        self.path.first().and_then(|segment| segment.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiAvatar {
    #[serde(default)]
    pub large: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
}

/// `data` of the user lookup query
#[derive(Debug, Deserialize)]
pub struct UserData {
    #[serde(rename = "User")]
    pub user: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub avatar: ApiAvatar,
}

impl From<ApiUser> for UserIdentity {
    fn from(user: ApiUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            avatar: user.avatar.large.or(user.avatar.medium),
        }
    }
}

/// `data` of the following query
#[derive(Debug, Deserialize)]
pub struct FollowingData {
    #[serde(rename = "Page")]
    pub page: ApiFollowingPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFollowingPage {
    pub page_info: ApiPageInfo,
    #[serde(default)]
    pub following: Vec<ApiFollowedUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPageInfo {
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFollowedUser {
    pub id: u64,
    pub name: String,
    pub site_url: String,
    #[serde(default)]
    pub avatar: ApiAvatar,
}

impl From<ApiFollowedUser> for FollowerProfile {
    fn from(user: ApiFollowedUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            profile_url: user.site_url,
            avatar: user.avatar.medium.or(user.avatar.large),
        }
    }
}

/// `data` of the media list collection query
#[derive(Debug, Deserialize)]
pub struct CollectionData {
    #[serde(rename = "MediaListCollection")]
    pub collection: ApiCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCollection {
    #[serde(default)]
    pub lists: Vec<ApiList>,
    #[serde(default)]
    pub has_next_chunk: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApiList {
    #[serde(default)]
    pub entries: Vec<ApiListEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ApiListEntry {
    #[serde(default)]
    pub score: Option<f64>,
    pub status: ListStatus,
    pub media: ApiMediaRef,
}

#[derive(Debug, Deserialize)]
pub struct ApiMediaRef {
    pub id: ItemId,
}

impl From<&ApiListEntry> for RatedItem {
    fn from(entry: &ApiListEntry) -> Self {
        Self {
            item_id: entry.media.id,
            rating: normalize_score(entry.score),
            status: entry.status,
        }
    }
}

/// One aliased `Page` of the batch single-item query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMediaListPage {
    #[serde(default)]
    pub media_list: Vec<ApiMediaListRecord>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMediaListRecord {
    #[serde(default)]
    pub score: Option<f64>,
    pub status: ListStatus,
}

impl From<&ApiMediaListRecord> for ItemRecord {
    fn from(record: &ApiMediaListRecord) -> Self {
        Self {
            rating: normalize_score(record.score),
            status: record.status,
        }
    }
}

/// `data` of the batch query: alias -> page
pub type BatchData = HashMap<String, Option<ApiMediaListPage>>;

/// Converts a POINT_10 score into a rating, treating missing scores as 0
pub fn normalize_score(score: Option<f64>) -> Rating {
    match score {
        Some(s) if s.is_finite() && s > 0.0 => s.round().min(MAX_RATING as f64) as Rating,
        _ => 0,
    }
}
