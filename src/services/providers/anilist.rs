/// AniList GraphQL provider
///
/// All four lookups go to the single GraphQL endpoint as `POST {query, variables}`.
///
/// The batch lookup multiplexes one aliased `Page(perPage: 1)` sub-query per follower
/// into a single request. `Page` is used instead of a bare `MediaList` lookup because
/// AniList answers a missing list entry with an empty page rather than a 404 that
/// would fail the whole document.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::instrument;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        anilist::{
            BatchData, CollectionData, FollowingData, GraphQlRequest, GraphQlResponse, UserData,
        },
        FollowerId, FollowerProfile, FollowingPage, ItemId, ItemRecord, MediaType, RatedItem,
        RatedItemsPage, UserIdentity,
    },
    services::providers::MediaService,
};

const USER_QUERY: &str = r#"
query ($name: String) {
  User(name: $name) {
    id
    name
    avatar { large medium }
  }
}"#;

const FOLLOWING_QUERY: &str = r#"
query ($userId: Int!, $page: Int, $perPage: Int) {
  Page(page: $page, perPage: $perPage) {
    pageInfo { hasNextPage }
    following(userId: $userId, sort: ID_DESC) {
      id
      name
      siteUrl
      avatar { medium large }
    }
  }
}"#;

const COLLECTION_QUERY: &str = r#"
query ($userName: String, $type: MediaType, $chunk: Int, $perChunk: Int) {
  MediaListCollection(userName: $userName, type: $type, chunk: $chunk, perChunk: $perChunk) {
    lists {
      entries {
        score(format: POINT_10)
        status
        media { id }
      }
    }
    hasNextChunk
  }
}"#;

/// Alias -> follower mapping for one multiplexed batch request
type BatchSlots = Vec<(String, FollowerId)>;

#[derive(Clone)]
pub struct AniListProvider {
    http_client: HttpClient,
    api_url: String,
    following_page_size: u32,
    rated_items_chunk_size: u32,
    batch_chunk_size: usize,
    max_concurrent_requests: usize,
}

impl AniListProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: config.anilist_api_url.clone(),
            following_page_size: config.following_page_size,
            rated_items_chunk_size: config.rated_items_chunk_size,
            batch_chunk_size: config.batch_chunk_size.max(1),
            max_concurrent_requests: config.max_concurrent_requests.max(1),
        }
    }

    /// Posts a GraphQL document and decodes the envelope
    ///
    /// Non-2xx responses are still decoded when they carry GraphQL errors, so callers
    /// can tell "not found" apart from transport failures. AniList answers with a
    /// non-2xx status even when only part of the document failed; `data` then holds
    /// whatever resolved.
    async fn post_query<V, T>(&self, query: &str, variables: V) -> AppResult<GraphQlResponse<T>>
    where
        V: Serialize + Send,
        T: DeserializeOwned + Send,
    {
        let response = self
            .http_client
            .post(&self.api_url)
            .header("Accept", "application/json")
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(parsed) = serde_json::from_str::<GraphQlResponse<T>>(&body) {
                if !parsed.errors.is_empty() {
                    return Ok(parsed);
                }
            }
            tracing::error!(
                status = %status,
                body = %body,
                "AniList request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "AniList returned status {}: {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, body = %body, "Failed to deserialize AniList response");
            AppError::ExternalApi(format!("Failed to parse AniList response: {}", e))
        })
    }

    /// Runs one multiplexed request for a slice of followers
    async fn fetch_batch_chunk(
        &self,
        item_id: ItemId,
        follower_ids: Vec<FollowerId>,
    ) -> AppResult<HashMap<FollowerId, ItemRecord>> {
        let (query, slots) = build_batch_query(&follower_ids);
        let response: GraphQlResponse<BatchData> =
            self.post_query(&query, json!({ "mediaId": item_id })).await?;
        let records = collect_batch_records(item_id, response, slots)?;

        tracing::debug!(
            item_id = item_id,
            requested = follower_ids.len(),
            found = records.len(),
            "Batch chunk fetched"
        );

        Ok(records)
    }
}

/// Maps a batch response back onto followers
///
/// Errors scoped to single aliases (private lists, deleted accounts) only cost
/// that follower its record. The chunk fails when the response has no `data`.
fn collect_batch_records(
    item_id: ItemId,
    response: GraphQlResponse<BatchData>,
    slots: BatchSlots,
) -> AppResult<HashMap<FollowerId, ItemRecord>> {
    let Some(data) = response.data else {
        let reason = if response.errors.is_empty() {
            "AniList response missing data".to_string()
        } else {
            let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
            messages.join("; ")
        };
        return Err(AppError::ExternalApi(reason));
    };

    for error in &response.errors {
        tracing::warn!(
            item_id = item_id,
            alias = error.root_field().unwrap_or("-"),
            message = %error.message,
            "Batch entry failed, treating as absent"
        );
    }

    let mut records = HashMap::new();
    for (alias, follower_id) in slots {
        let first = data
            .get(&alias)
            .and_then(|page| page.as_ref())
            .and_then(|page| page.media_list.first());
        if let Some(record) = first {
            records.insert(follower_id, ItemRecord::from(record));
        }
    }

    Ok(records)
}

/// Builds the aliased query document for a set of followers
///
/// Aliases must start with a letter, hence the `u` prefix.
fn build_batch_query(follower_ids: &[FollowerId]) -> (String, BatchSlots) {
    let mut slots = Vec::with_capacity(follower_ids.len());
    let mut parts = String::new();

    for &follower_id in follower_ids {
        let alias = format!("u{}", follower_id);
        parts.push_str(&format!(
            "  {alias}: Page(perPage: 1) {{ mediaList(userId: {follower_id}, mediaId: $mediaId) {{ score(format: POINT_10) status }} }}\n"
        ));
        slots.push((alias, follower_id));
    }

    (format!("query ($mediaId: Int) {{\n{}}}", parts), slots)
}

/// Unwraps `data`, turning GraphQL errors into an upstream error
fn into_data<T>(response: GraphQlResponse<T>) -> AppResult<T> {
    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(AppError::ExternalApi(messages.join("; ")));
    }
    response
        .data
        .ok_or_else(|| AppError::ExternalApi("AniList response missing data".to_string()))
}

#[async_trait::async_trait]
impl MediaService for AniListProvider {
    #[instrument(skip(self), fields(provider = "anilist"))]
    async fn resolve_identity(&self, name: &str) -> AppResult<UserIdentity> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("User name cannot be empty".to_string()));
        }

        let response: GraphQlResponse<UserData> =
            self.post_query(USER_QUERY, json!({ "name": name })).await?;

        if response.errors.iter().any(|e| e.is_not_found()) {
            return Err(AppError::IdentityNotFound(name.to_string()));
        }

        let identity: UserIdentity = into_data(response)?
            .user
            .ok_or_else(|| AppError::IdentityNotFound(name.to_string()))?
            .into();

        tracing::info!(user_id = identity.id, "Resolved root user");

        Ok(identity)
    }

    #[instrument(skip(self), fields(provider = "anilist"))]
    async fn list_following(&self, user_id: FollowerId, page: u32) -> AppResult<FollowingPage> {
        let response: GraphQlResponse<FollowingData> = self
            .post_query(
                FOLLOWING_QUERY,
                json!({ "userId": user_id, "page": page, "perPage": self.following_page_size }),
            )
            .await?;

        let api_page = into_data(response)?.page;
        let items: Vec<FollowerProfile> = api_page
            .following
            .into_iter()
            .map(FollowerProfile::from)
            .collect();

        tracing::debug!(count = items.len(), "Following page fetched");

        Ok(FollowingPage {
            items,
            has_next_page: api_page.page_info.has_next_page,
        })
    }

    #[instrument(skip(self), fields(provider = "anilist"))]
    async fn list_rated_items(
        &self,
        user_name: &str,
        media_type: MediaType,
        chunk: u32,
    ) -> AppResult<RatedItemsPage> {
        let response: GraphQlResponse<CollectionData> = self
            .post_query(
                COLLECTION_QUERY,
                json!({
                    "userName": user_name,
                    "type": media_type,
                    "chunk": chunk,
                    "perChunk": self.rated_items_chunk_size,
                }),
            )
            .await?;

        let collection = into_data(response)?.collection;
        let entries: Vec<RatedItem> = collection
            .lists
            .iter()
            .flat_map(|list| list.entries.iter())
            .map(RatedItem::from)
            .collect();

        tracing::debug!(entries = entries.len(), "Media list chunk fetched");

        Ok(RatedItemsPage {
            entries,
            has_next_chunk: collection.has_next_chunk,
        })
    }

    #[instrument(skip(self, follower_ids), fields(provider = "anilist", followers = follower_ids.len()))]
    async fn batch_single_item_ratings(
        &self,
        item_id: ItemId,
        follower_ids: &HashSet<FollowerId>,
    ) -> AppResult<HashMap<FollowerId, ItemRecord>> {
        if follower_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut ids: Vec<FollowerId> = follower_ids.iter().copied().collect();
        ids.sort_unstable();

        let permits = Arc::new(Semaphore::new(self.max_concurrent_requests));
        let mut tasks = JoinSet::new();

        for chunk in ids.chunks(self.batch_chunk_size) {
            let provider = self.clone();
            let permits = permits.clone();
            let chunk = chunk.to_vec();
            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                provider.fetch_batch_chunk(item_id, chunk).await
            });
        }

        let mut records = HashMap::with_capacity(ids.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(chunk_records)) => records.extend(chunk_records),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, item_id = item_id, "Batch chunk failed");
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Task join error");
                    return Err(AppError::Internal(e.to_string()));
                }
            }
        }

        tracing::info!(
            item_id = item_id,
            found = records.len(),
            "Batch item ratings fetched"
        );

        Ok(records)
    }

    fn name(&self) -> &'static str {
        "anilist"
    }
}
