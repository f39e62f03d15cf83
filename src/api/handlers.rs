use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{FollowerId, FollowerView, ItemId, Rating, StatisticBundle, UserIdentity},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct LoadRootRequest {
    pub user_name: String,
}

#[derive(Debug, Serialize)]
pub struct LoadRootResponse {
    pub root: Option<UserIdentity>,
    pub follower_count: usize,
}

#[derive(Debug, Serialize)]
pub struct LoadRatingsResponse {
    pub follower_id: FollowerId,
    pub item_count: usize,
}

#[derive(Debug, Serialize)]
pub struct WeightResponse {
    pub follower_id: FollowerId,
    pub weight: u8,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Switch to a new root user
pub async fn load_root(
    State(state): State<AppState>,
    Json(request): Json<LoadRootRequest>,
) -> AppResult<Json<LoadRootResponse>> {
    let user_name = request.user_name.trim();
    if user_name.is_empty() {
        return Err(AppError::InvalidInput("user_name cannot be empty".to_string()));
    }

    let follower_count = state.graph.load_followers(user_name).await?;

    Ok(Json(LoadRootResponse {
        root: state.graph.root_user().await,
        follower_count,
    }))
}

/// Followed accounts with load state and weight
pub async fn get_followers(State(state): State<AppState>) -> Json<Vec<FollowerView>> {
    Json(state.graph.followers().await)
}

/// Load one follower's ratings
pub async fn load_follower_ratings(
    State(state): State<AppState>,
    Path(follower_id): Path<FollowerId>,
) -> AppResult<Json<LoadRatingsResponse>> {
    let item_count = state.graph.load_follower_ratings(follower_id).await?;
    Ok(Json(LoadRatingsResponse {
        follower_id,
        item_count,
    }))
}

/// Make a follower loadable again
pub async fn reset_follower(
    State(state): State<AppState>,
    Path(follower_id): Path<FollowerId>,
) -> AppResult<StatusCode> {
    state.graph.reset_follower(follower_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a follower's weight
pub async fn toggle_weight(
    State(state): State<AppState>,
    Path(follower_id): Path<FollowerId>,
) -> AppResult<Json<WeightResponse>> {
    let weight = state.graph.toggle_weight(follower_id).await?;
    Ok(Json(WeightResponse {
        follower_id,
        weight,
    }))
}

/// One follower's item -> rating map
pub async fn get_follower_scores(
    State(state): State<AppState>,
    Path(follower_id): Path<FollowerId>,
) -> AppResult<Json<BTreeMap<ItemId, Rating>>> {
    let scores = state.graph.follower_scores(follower_id).await?;
    Ok(Json(scores.into_iter().collect()))
}

/// Weighted popularity per item
pub async fn get_popularity(State(state): State<AppState>) -> Json<BTreeMap<ItemId, u32>> {
    Json(state.graph.popularity_scores().await.into_iter().collect())
}

/// Statistics for one item
pub async fn get_item_stats(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> AppResult<Json<StatisticBundle>> {
    let bundle = state.graph.inspect_item(item_id).await?;
    Ok(Json(bundle))
}
