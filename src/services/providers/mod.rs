/// Media service provider abstraction
///
/// The engine only ever talks to the remote media-list service through this trait,
/// so transport details (GraphQL aliasing, paging sizes, HTTP status handling) stay
/// inside the adapter and every result crossing the boundary is strictly typed.
use std::collections::{HashMap, HashSet};

use crate::{
    error::AppResult,
    models::{
        FollowerId, FollowingPage, ItemId, ItemRecord, MediaType, RatedItemsPage, UserIdentity,
    },
};

pub mod anilist;

pub use anilist::AniListProvider;

/// Trait for media-list services
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MediaService: Send + Sync {
    /// Resolve a user name to its identity
    ///
    /// Fails with `IdentityNotFound` if no such user exists.
    async fn resolve_identity(&self, name: &str) -> AppResult<UserIdentity>;

    /// One page (1-based) of the accounts `user_id` follows
    async fn list_following(&self, user_id: FollowerId, page: u32) -> AppResult<FollowingPage>;

    /// One chunk (1-based) of an account's media list
    async fn list_rated_items(
        &self,
        user_name: &str,
        media_type: MediaType,
        chunk: u32,
    ) -> AppResult<RatedItemsPage>;

    /// Every requested follower's record for a single item
    ///
    /// Followers without a record are absent from the map. Only transport or
    /// protocol failures fail the call.
    async fn batch_single_item_ratings(
        &self,
        item_id: ItemId,
        follower_ids: &HashSet<FollowerId>,
    ) -> AppResult<HashMap<FollowerId, ItemRecord>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
