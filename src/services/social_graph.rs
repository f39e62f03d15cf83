use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::{EngineSettings, FailurePolicy},
    error::{AppError, AppResult},
    models::{
        FollowerId, FollowerProfile, FollowerRating, FollowerView, ItemId, LoadState, Rating,
        StatisticBundle, UserIdentity,
    },
    services::{
        detail_cache::DetailCache,
        directory::{fetch_following, FollowerDirectory},
        providers::MediaService,
        score_index::{fetch_follower_scores, FollowerScoreIndex},
        stats,
        weights::WeightTable,
    },
};

/// Social layer over the root user's followed accounts
///
/// Owns the follower directory, the per-follower score index, the weight table and
/// the detail cache, each behind its own lock. Locks are always taken in the order
/// directory, score index, weights, detail cache, and never held across a call to
/// the media service.
pub struct SocialGraph {
    service: Arc<dyn MediaService>,
    settings: EngineSettings,
    directory: RwLock<FollowerDirectory>,
    scores: RwLock<FollowerScoreIndex>,
    weights: RwLock<WeightTable>,
    cache: RwLock<DetailCache>,
}

impl SocialGraph {
    pub fn new(service: Arc<dyn MediaService>, settings: EngineSettings) -> Self {
        Self {
            service,
            settings,
            directory: RwLock::new(FollowerDirectory::new()),
            scores: RwLock::new(FollowerScoreIndex::new()),
            weights: RwLock::new(WeightTable::new()),
            cache: RwLock::new(DetailCache::new()),
        }
    }

    /// Switches to a new root user and loads everyone it follows
    ///
    /// The previous follower set, score index and detail cache are dropped up front.
    /// On failure the directory stays empty. If another load starts before this one
    /// finishes, this result is discarded and `Superseded` is returned.
    pub async fn load_followers(&self, root_user_name: &str) -> AppResult<usize> {
        let generation = {
            let mut directory = self.directory.write().await;
            let mut scores = self.scores.write().await;
            let mut cache = self.cache.write().await;
            scores.clear();
            cache.clear();
            directory.begin_reload()
        };

        tracing::info!(
            root_user = %root_user_name,
            generation = generation,
            "Loading followed accounts"
        );

        let fetched = self.fetch_directory(root_user_name).await;

        let mut directory = self.directory.write().await;
        if !directory.is_current(generation) {
            tracing::warn!(
                root_user = %root_user_name,
                generation = generation,
                "Discarding follower list from a superseded load"
            );
            return Err(AppError::Superseded);
        }

        match fetched {
            Ok((identity, profiles)) => {
                let count = directory.install(identity, profiles);
                tracing::info!(
                    root_user = %root_user_name,
                    followers = count,
                    "Followed accounts loaded"
                );
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(root_user = %root_user_name, error = %e, "Follower load failed");
                Err(e)
            }
        }
    }

    async fn fetch_directory(
        &self,
        root_user_name: &str,
    ) -> AppResult<(UserIdentity, Vec<FollowerProfile>)> {
        let identity = self
            .service
            .resolve_identity(root_user_name)
            .await
            .map_err(directory_error)?;
        let profiles = fetch_following(self.service.as_ref(), identity.id)
            .await
            .map_err(directory_error)?;
        Ok((identity, profiles))
    }

    /// Fetches one follower's list into the score index
    ///
    /// A no-op for followers already loaded. Returns the number of items the follower
    /// has on their list.
    pub async fn load_follower_ratings(&self, follower_id: FollowerId) -> AppResult<usize> {
        let (generation, user_name) = {
            let mut directory = self.directory.write().await;
            let generation = directory.generation();
            let follower = directory
                .get_mut(follower_id)
                .ok_or(AppError::UnknownFollower(follower_id))?;

            match follower.state {
                LoadState::Loaded => {
                    let scores = self.scores.read().await;
                    let count = scores.get(follower_id).map(|s| s.len()).unwrap_or(0);
                    tracing::debug!(follower_id = follower_id, "Follower already loaded");
                    return Ok(count);
                }
                LoadState::Failed => {
                    return Err(AppError::FollowerRatingsFetchFailed {
                        follower_id,
                        reason: "previous fetch failed, reset the follower to retry".to_string(),
                    });
                }
                LoadState::NotLoaded | LoadState::Loading => {}
            }

            follower.state = LoadState::Loading;
            (generation, follower.profile.name.clone())
        };

        let fetched =
            fetch_follower_scores(self.service.as_ref(), &user_name, self.settings.media_type)
                .await;

        let mut directory = self.directory.write().await;
        if !directory.is_current(generation) {
            tracing::warn!(
                follower_id = follower_id,
                generation = generation,
                "Discarding ratings fetched for a superseded root user"
            );
            return Err(AppError::Superseded);
        }
        let follower = directory
            .get_mut(follower_id)
            .ok_or(AppError::UnknownFollower(follower_id))?;

        match fetched {
            Ok(follower_scores) => {
                let count = follower_scores.len();
                let mut scores = self.scores.write().await;
                scores.install(follower_id, follower_scores);
                follower.state = LoadState::Loaded;
                tracing::info!(follower_id = follower_id, items = count, "Follower ratings loaded");
                Ok(count)
            }
            Err(e) => {
                // A concurrent fetch for the same follower may already have succeeded
                if follower.state != LoadState::Loaded {
                    follower.state = match self.settings.failure_policy {
                        FailurePolicy::Retry => LoadState::NotLoaded,
                        FailurePolicy::Sticky => LoadState::Failed,
                    };
                }
                tracing::warn!(
                    follower_id = follower_id,
                    error = %e,
                    state = ?follower.state,
                    "Follower ratings fetch failed"
                );
                Err(AppError::FollowerRatingsFetchFailed {
                    follower_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Puts a follower back to `NotLoaded` and drops its ratings
    pub async fn reset_follower(&self, follower_id: FollowerId) -> AppResult<()> {
        let mut directory = self.directory.write().await;
        let follower = directory
            .get_mut(follower_id)
            .ok_or(AppError::UnknownFollower(follower_id))?;
        let mut scores = self.scores.write().await;
        scores.remove(follower_id);
        follower.state = LoadState::NotLoaded;
        Ok(())
    }

    /// Flips a follower between normal and boosted weight, returning the new weight
    ///
    /// Only accounts in the current directory can be weighted; their ratings need
    /// not be loaded yet.
    pub async fn toggle_weight(&self, follower_id: FollowerId) -> AppResult<u8> {
        let directory = self.directory.read().await;
        if directory.get(follower_id).is_none() {
            return Err(AppError::UnknownFollower(follower_id));
        }
        let weight = self.weights.write().await.toggle(follower_id);
        tracing::debug!(follower_id = follower_id, weight = weight, "Weight toggled");
        Ok(weight)
    }

    /// Weighted popularity of every item at least one loaded follower has
    pub async fn popularity_scores(&self) -> HashMap<ItemId, u32> {
        let scores = self.scores.read().await;
        let weights = self.weights.read().await;
        stats::popularity_scores(&scores, &weights)
    }

    /// Statistics of what the followed accounts think of one item
    ///
    /// Served from the detail cache when possible; otherwise one batch lookup covers
    /// every follower and the result is cached until the next root user reload. An
    /// empty directory yields an empty, uncached bundle.
    pub async fn inspect_item(&self, item_id: ItemId) -> AppResult<StatisticBundle> {
        if let Some(bundle) = self.cache.read().await.get(item_id) {
            tracing::debug!(item_id = item_id, "Cache hit");
            return Ok(bundle);
        }

        tracing::debug!(item_id = item_id, "Cache miss");

        let (generation, roster) = {
            let directory = self.directory.read().await;
            let roster: Vec<FollowerProfile> = directory
                .followers()
                .iter()
                .map(|f| f.profile.clone())
                .collect();
            (directory.generation(), roster)
        };

        if roster.is_empty() {
            return Ok(StatisticBundle::empty());
        }

        let follower_ids: HashSet<FollowerId> = roster.iter().map(|p| p.id).collect();
        let records = self
            .service
            .batch_single_item_ratings(item_id, &follower_ids)
            .await
            .map_err(|e| {
                tracing::warn!(item_id = item_id, error = %e, "Batch fetch failed");
                AppError::BatchFetchFailed {
                    item_id,
                    reason: e.to_string(),
                }
            })?;

        let ratings: Vec<FollowerRating> = roster
            .into_iter()
            .filter_map(|follower| {
                records.get(&follower.id).map(|record| FollowerRating {
                    follower,
                    rating: record.rating,
                    status: record.status,
                })
            })
            .collect();

        let bundle = stats::compute_bundle(ratings);

        let directory = self.directory.read().await;
        if !directory.is_current(generation) {
            tracing::warn!(
                item_id = item_id,
                generation = generation,
                "Discarding item statistics for a superseded root user"
            );
            return Err(AppError::Superseded);
        }
        self.cache.write().await.insert(item_id, bundle.clone());

        tracing::info!(
            item_id = item_id,
            count = bundle.count,
            average = bundle.average,
            "Item statistics computed"
        );

        Ok(bundle)
    }

    /// Followers in directory order with their load state and weight
    pub async fn followers(&self) -> Vec<FollowerView> {
        let directory = self.directory.read().await;
        let weights = self.weights.read().await;
        directory
            .followers()
            .iter()
            .map(|f| FollowerView {
                profile: f.profile.clone(),
                state: f.state,
                weight: weights.get(f.id()),
            })
            .collect()
    }

    /// A follower's item -> rating map; empty until the follower is loaded
    pub async fn follower_scores(
        &self,
        follower_id: FollowerId,
    ) -> AppResult<HashMap<ItemId, Rating>> {
        let directory = self.directory.read().await;
        if directory.get(follower_id).is_none() {
            return Err(AppError::UnknownFollower(follower_id));
        }
        let scores = self.scores.read().await;
        Ok(scores.get(follower_id).cloned().unwrap_or_default())
    }

    pub async fn root_user(&self) -> Option<UserIdentity> {
        self.directory.read().await.root().cloned()
    }

    pub async fn cached_item_count(&self) -> usize {
        self.cache.read().await.len()
    }
}

/// Labels a provider failure as a directory failure, keeping "no such user" distinct
fn directory_error(error: AppError) -> AppError {
    match error {
        AppError::IdentityNotFound(_) | AppError::InvalidInput(_) => error,
        other => AppError::DirectoryFetchFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        FollowingPage, ItemRecord, ListStatus, MediaType, RatedItem, RatedItemsPage,
    };
    use crate::services::providers::MockMediaService;
    use tokio_test::{assert_err, assert_ok};

    fn profile(id: FollowerId) -> FollowerProfile {
        FollowerProfile {
            id,
            name: format!("user{}", id),
            profile_url: format!("https://anilist.co/user/user{}", id),
            avatar: None,
        }
    }

    fn identity(name: &str) -> UserIdentity {
        UserIdentity {
            id: 1,
            name: name.to_string(),
            avatar: None,
        }
    }

    /// Mock that resolves any root user to followers 10 and 20
    fn mock_with_followers() -> MockMediaService {
        let mut service = MockMediaService::new();
        service
            .expect_resolve_identity()
            .returning(|name| Ok(identity(name)));
        service.expect_list_following().returning(|_, _| {
            Ok(FollowingPage {
                items: vec![profile(10), profile(20)],
                has_next_page: false,
            })
        });
        service
    }

    fn expect_rated_items(service: &mut MockMediaService, times: usize) {
        service
            .expect_list_rated_items()
            .times(times)
            .returning(|name, _, _| {
                let item_ids: &[ItemId] = if name == "user10" { &[42] } else { &[42, 43] };
                Ok(RatedItemsPage {
                    entries: item_ids
                        .iter()
                        .map(|&item_id| RatedItem {
                            item_id,
                            rating: 7,
                            status: ListStatus::Completed,
                        })
                        .collect(),
                    has_next_chunk: false,
                })
            });
    }

    fn graph(service: MockMediaService) -> SocialGraph {
        SocialGraph::new(Arc::new(service), EngineSettings::default())
    }

    fn record(rating: Rating, status: ListStatus) -> ItemRecord {
        ItemRecord { rating, status }
    }

    #[tokio::test]
    async fn test_load_followers_installs_not_loaded() {
        let graph = graph(mock_with_followers());

        let count = graph.load_followers("kumiko").await.unwrap();

        assert_eq!(count, 2);
        let followers = graph.followers().await;
        assert_eq!(followers.len(), 2);
        assert!(followers.iter().all(|f| f.state == LoadState::NotLoaded));
        assert!(followers.iter().all(|f| f.weight == 1));
        assert_eq!(graph.root_user().await.unwrap().name, "kumiko");
    }

    #[tokio::test]
    async fn test_load_followers_unknown_user_leaves_directory_empty() {
        let mut service = MockMediaService::new();
        service.expect_list_following().never();
        service
            .expect_resolve_identity()
            .returning(|name| Err(AppError::IdentityNotFound(name.to_string())));
        let graph = graph(service);

        let err = graph.load_followers("nobody").await.unwrap_err();

        assert!(matches!(err, AppError::IdentityNotFound(_)));
        assert!(graph.followers().await.is_empty());
        assert!(graph.root_user().await.is_none());
    }

    #[tokio::test]
    async fn test_load_followers_listing_failure_keeps_nothing() {
        let mut service = MockMediaService::new();
        service
            .expect_resolve_identity()
            .returning(|name| Ok(identity(name)));
        service.expect_list_following().returning(|_, page| {
            if page == 1 {
                Ok(FollowingPage {
                    items: vec![profile(10)],
                    has_next_page: true,
                })
            } else {
                Err(AppError::ExternalApi("status 500".to_string()))
            }
        });
        let graph = graph(service);

        let err = graph.load_followers("kumiko").await.unwrap_err();

        assert!(matches!(err, AppError::DirectoryFetchFailed(_)));
        assert!(graph.followers().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_follower_ratings_is_idempotent() {
        let mut service = mock_with_followers();
        expect_rated_items(&mut service, 1);
        let graph = graph(service);
        graph.load_followers("kumiko").await.unwrap();

        assert_eq!(graph.load_follower_ratings(20).await.unwrap(), 2);
        let before = graph.follower_scores(20).await.unwrap();

        // Second call must not reach the service (times(1) above)
        assert_eq!(graph.load_follower_ratings(20).await.unwrap(), 2);
        assert_eq!(graph.follower_scores(20).await.unwrap(), before);

        let followers = graph.followers().await;
        assert_eq!(followers[1].state, LoadState::Loaded);
        assert_eq!(followers[0].state, LoadState::NotLoaded);
    }

    #[tokio::test]
    async fn test_load_follower_ratings_unknown_follower() {
        let graph = graph(mock_with_followers());
        graph.load_followers("kumiko").await.unwrap();

        let err = graph.load_follower_ratings(99).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownFollower(99)));
    }

    #[tokio::test]
    async fn test_failed_ratings_fetch_is_retryable() {
        let mut service = mock_with_followers();
        let mut attempts = 0;
        service
            .expect_list_rated_items()
            .times(2)
            .returning(move |_, _, _| {
                attempts += 1;
                if attempts == 1 {
                    Err(AppError::ExternalApi("status 502".to_string()))
                } else {
                    Ok(RatedItemsPage {
                        entries: vec![RatedItem {
                            item_id: 42,
                            rating: 9,
                            status: ListStatus::Completed,
                        }],
                        has_next_chunk: false,
                    })
                }
            });
        let graph = graph(service);
        graph.load_followers("kumiko").await.unwrap();

        let err = graph.load_follower_ratings(10).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::FollowerRatingsFetchFailed { follower_id: 10, .. }
        ));
        assert_eq!(graph.followers().await[0].state, LoadState::NotLoaded);
        assert!(graph.popularity_scores().await.is_empty());

        assert_ok!(graph.load_follower_ratings(10).await);
        assert_eq!(graph.followers().await[0].state, LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_sticky_failure_blocks_until_reset() {
        let mut service = mock_with_followers();
        service
            .expect_list_rated_items()
            .times(1)
            .returning(|_, _, _| Err(AppError::ExternalApi("timeout".to_string())));
        let graph = SocialGraph::new(
            Arc::new(service),
            EngineSettings {
                media_type: MediaType::Anime,
                failure_policy: FailurePolicy::Sticky,
            },
        );
        graph.load_followers("kumiko").await.unwrap();

        assert_err!(graph.load_follower_ratings(10).await);
        assert_eq!(graph.followers().await[0].state, LoadState::Failed);

        // Blocked without another fetch
        assert_err!(graph.load_follower_ratings(10).await);

        graph.reset_follower(10).await.unwrap();
        assert_eq!(graph.followers().await[0].state, LoadState::NotLoaded);
    }

    #[tokio::test]
    async fn test_popularity_scores_follow_weights() {
        let mut service = mock_with_followers();
        expect_rated_items(&mut service, 2);
        let graph = graph(service);
        graph.load_followers("kumiko").await.unwrap();
        graph.load_follower_ratings(10).await.unwrap();
        graph.load_follower_ratings(20).await.unwrap();

        assert_eq!(graph.toggle_weight(20).await.unwrap(), 2);
        let popularity = graph.popularity_scores().await;
        assert_eq!(popularity[&42], 3);
        assert_eq!(popularity[&43], 2);

        assert_eq!(graph.toggle_weight(20).await.unwrap(), 1);
        let popularity = graph.popularity_scores().await;
        assert_eq!(popularity[&42], 2);
        assert_eq!(popularity[&43], 1);
    }

    #[tokio::test]
    async fn test_weight_can_be_set_before_loading() {
        let mut service = mock_with_followers();
        expect_rated_items(&mut service, 1);
        let graph = graph(service);
        graph.load_followers("kumiko").await.unwrap();

        assert_ok!(graph.toggle_weight(10).await);
        assert!(graph.popularity_scores().await.is_empty());

        graph.load_follower_ratings(10).await.unwrap();
        assert_eq!(graph.popularity_scores().await[&42], 2);
    }

    #[tokio::test]
    async fn test_reset_follower_removes_scores() {
        let mut service = mock_with_followers();
        expect_rated_items(&mut service, 1);
        let graph = graph(service);
        graph.load_followers("kumiko").await.unwrap();
        graph.load_follower_ratings(10).await.unwrap();

        graph.reset_follower(10).await.unwrap();

        assert!(graph.follower_scores(10).await.unwrap().is_empty());
        assert!(graph.popularity_scores().await.is_empty());
    }

    #[tokio::test]
    async fn test_inspect_item_builds_bundle_in_directory_order() {
        let mut service = mock_with_followers();
        service
            .expect_batch_single_item_ratings()
            .withf(|item_id, ids| *item_id == 42 && ids.len() == 2)
            .times(1)
            .returning(|_, _| {
                let mut records = HashMap::new();
                records.insert(20, record(8, ListStatus::Completed));
                records.insert(10, record(0, ListStatus::Planning));
                Ok(records)
            });
        let graph = graph(service);
        graph.load_followers("kumiko").await.unwrap();

        let bundle = graph.inspect_item(42).await.unwrap();

        assert_eq!(bundle.count, 2);
        assert_eq!(bundle.average, 8.0);
        assert_eq!(bundle.median, 8.0);
        assert_eq!(bundle.ratings[0].follower.id, 10);
        assert_eq!(bundle.ratings[0].status, ListStatus::Planning);
        assert_eq!(bundle.ratings[1].follower.id, 20);
    }

    #[tokio::test]
    async fn test_inspect_item_second_call_hits_cache() {
        let mut service = mock_with_followers();
        service
            .expect_batch_single_item_ratings()
            .times(1)
            .returning(|_, _| {
                let mut records = HashMap::new();
                records.insert(10, record(6, ListStatus::Current));
                Ok(records)
            });
        let graph = graph(service);
        graph.load_followers("kumiko").await.unwrap();

        let first = graph.inspect_item(42).await.unwrap();
        let second = graph.inspect_item(42).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(graph.cached_item_count().await, 1);
    }

    #[tokio::test]
    async fn test_reload_clears_detail_cache() {
        let mut service = mock_with_followers();
        service
            .expect_batch_single_item_ratings()
            .times(2)
            .returning(|_, _| Ok(HashMap::new()));
        let graph = graph(service);

        graph.load_followers("kumiko").await.unwrap();
        graph.inspect_item(42).await.unwrap();
        assert_eq!(graph.cached_item_count().await, 1);

        graph.load_followers("reina").await.unwrap();
        assert_eq!(graph.cached_item_count().await, 0);

        graph.inspect_item(42).await.unwrap();
    }

    #[tokio::test]
    async fn test_reload_clears_score_index() {
        let mut service = mock_with_followers();
        expect_rated_items(&mut service, 1);
        let graph = graph(service);
        graph.load_followers("kumiko").await.unwrap();
        graph.load_follower_ratings(10).await.unwrap();

        graph.load_followers("reina").await.unwrap();

        assert!(graph.popularity_scores().await.is_empty());
        assert!(graph
            .followers()
            .await
            .iter()
            .all(|f| f.state == LoadState::NotLoaded));
    }

    #[tokio::test]
    async fn test_inspect_item_empty_directory_is_not_cached() {
        let mut service = MockMediaService::new();
        service.expect_batch_single_item_ratings().never();
        let graph = graph(service);

        let bundle = graph.inspect_item(42).await.unwrap();

        assert_eq!(bundle.count, 0);
        assert_eq!(bundle.average, 0.0);
        assert_eq!(bundle.median, 0.0);
        assert!(bundle.ratings.is_empty());
        assert_eq!(graph.cached_item_count().await, 0);
    }

    #[tokio::test]
    async fn test_batch_failure_is_not_cached() {
        let mut service = mock_with_followers();
        let mut calls = 0;
        service
            .expect_batch_single_item_ratings()
            .times(2)
            .returning(move |_, _| {
                calls += 1;
                if calls == 1 {
                    Err(AppError::ExternalApi("status 500".to_string()))
                } else {
                    Ok(HashMap::new())
                }
            });
        let graph = graph(service);
        graph.load_followers("kumiko").await.unwrap();

        let err = graph.inspect_item(42).await.unwrap_err();
        assert!(matches!(err, AppError::BatchFetchFailed { item_id: 42, .. }));
        assert_eq!(graph.cached_item_count().await, 0);

        let bundle = graph.inspect_item(42).await.unwrap();
        assert_eq!(bundle.count, 0);
        assert_eq!(graph.cached_item_count().await, 1);
    }

    #[tokio::test]
    async fn test_follower_scores_unknown_follower() {
        let graph = graph(mock_with_followers());
        graph.load_followers("kumiko").await.unwrap();

        assert!(graph.follower_scores(10).await.unwrap().is_empty());
        assert!(matches!(
            graph.follower_scores(77).await,
            Err(AppError::UnknownFollower(77))
        ));
    }

    /// Service whose list, batch and "kumiko" lookups block until the gate opens
    ///
    /// Every root user follows 10 and 20; user10 rated item 42, user20 rated 43.
    #[derive(Default)]
    struct GatedService {
        gate: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl MediaService for GatedService {
        async fn resolve_identity(&self, name: &str) -> AppResult<UserIdentity> {
            if name == "kumiko" {
                self.gate.notified().await;
            }
            Ok(identity(name))
        }

        async fn list_following(
            &self,
            _user_id: FollowerId,
            _page: u32,
        ) -> AppResult<FollowingPage> {
            Ok(FollowingPage {
                items: vec![profile(10), profile(20)],
                has_next_page: false,
            })
        }

        async fn list_rated_items(
            &self,
            user_name: &str,
            _media_type: MediaType,
            _chunk: u32,
        ) -> AppResult<RatedItemsPage> {
            self.gate.notified().await;
            let item_id = if user_name == "user20" { 43 } else { 42 };
            Ok(RatedItemsPage {
                entries: vec![RatedItem {
                    item_id,
                    rating: 5,
                    status: ListStatus::Completed,
                }],
                has_next_chunk: false,
            })
        }

        async fn batch_single_item_ratings(
            &self,
            _item_id: ItemId,
            follower_ids: &HashSet<FollowerId>,
        ) -> AppResult<HashMap<FollowerId, ItemRecord>> {
            self.gate.notified().await;
            Ok(follower_ids
                .iter()
                .map(|&id| (id, record(5, ListStatus::Completed)))
                .collect())
        }

        fn name(&self) -> &'static str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_stale_follower_load_is_discarded() {
        let service = Arc::new(GatedService::default());
        let graph = SocialGraph::new(service.clone(), EngineSettings::default());

        let (stale, current) = tokio::join!(graph.load_followers("kumiko"), async {
            let count = graph.load_followers("reina").await;
            service.gate.notify_one();
            count
        });

        assert!(matches!(stale, Err(AppError::Superseded)));
        assert_eq!(current.unwrap(), 2);
        assert_eq!(graph.root_user().await.unwrap().name, "reina");
    }

    #[tokio::test]
    async fn test_stale_ratings_are_discarded() {
        let service = Arc::new(GatedService::default());
        let graph = SocialGraph::new(service.clone(), EngineSettings::default());
        graph.load_followers("reina").await.unwrap();

        let (stale, _) = tokio::join!(graph.load_follower_ratings(10), async {
            graph.load_followers("reina").await.unwrap();
            service.gate.notify_one();
        });

        assert!(matches!(stale, Err(AppError::Superseded)));
        assert!(graph.popularity_scores().await.is_empty());
        assert_eq!(graph.followers().await[0].state, LoadState::NotLoaded);
    }

    #[tokio::test]
    async fn test_stale_inspection_is_discarded() {
        let service = Arc::new(GatedService::default());
        let graph = SocialGraph::new(service.clone(), EngineSettings::default());
        graph.load_followers("reina").await.unwrap();

        let (stale, _) = tokio::join!(graph.inspect_item(42), async {
            graph.load_followers("reina").await.unwrap();
            service.gate.notify_one();
        });

        assert!(matches!(stale, Err(AppError::Superseded)));
        assert_eq!(graph.cached_item_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_loads_for_two_followers() {
        let service = Arc::new(GatedService::default());
        let graph = SocialGraph::new(service.clone(), EngineSettings::default());
        graph.load_followers("reina").await.unwrap();

        let (first, second, _) = tokio::join!(
            graph.load_follower_ratings(10),
            graph.load_follower_ratings(20),
            async {
                // Both fetches are in flight before either completes
                let followers = graph.followers().await;
                assert!(followers.iter().all(|f| f.state == LoadState::Loading));
                service.gate.notify_one();
                service.gate.notify_one();
            }
        );

        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 1);
        assert!(graph
            .followers()
            .await
            .iter()
            .all(|f| f.state == LoadState::Loaded));

        let scores_10 = graph.follower_scores(10).await.unwrap();
        let scores_20 = graph.follower_scores(20).await.unwrap();
        assert_eq!(scores_10.keys().copied().collect::<Vec<_>>(), vec![42]);
        assert_eq!(scores_20.keys().copied().collect::<Vec<_>>(), vec![43]);

        let popularity = graph.popularity_scores().await;
        assert_eq!(popularity[&42], 1);
        assert_eq!(popularity[&43], 1);
    }
}
