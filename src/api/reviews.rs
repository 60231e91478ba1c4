use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::Review;

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    review_id: Option<i64>,
    content: Option<String>,
    is_positive: Option<bool>,
    user_id: Option<i64>,
    film_id: Option<i64>,
    #[serde(default)]
    useful: i64,
}

impl ReviewPayload {
    fn into_review(self) -> AppResult<Review> {
        let content = match self.content {
            Some(content) if !content.trim().is_empty() => content,
            _ => {
                return Err(AppError::Validation(
                    "review content must not be blank".to_string(),
                ))
            }
        };
        let is_positive = self.is_positive.ok_or_else(|| {
            AppError::Validation("review isPositive flag is required".to_string())
        })?;
        let user_id = self
            .user_id
            .ok_or_else(|| AppError::Validation("review userId is required".to_string()))?;
        let film_id = self
            .film_id
            .ok_or_else(|| AppError::Validation("review filmId is required".to_string()))?;
        Ok(Review {
            id: self.review_id.unwrap_or_default(),
            content,
            is_positive,
            user_id,
            film_id,
            useful: self.useful,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewListParams {
    film_id: Option<i64>,
    #[serde(default = "default_count")]
    count: i64,
}

fn default_count() -> i64 {
    10
}

// Handlers

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ReviewPayload>,
) -> AppResult<Json<Review>> {
    let review = payload.into_review()?;
    let review = state.reviews.create(review).await?;
    Ok(Json(review))
}

pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<ReviewPayload>,
) -> AppResult<Json<Review>> {
    if payload.review_id.is_none() {
        return Err(AppError::Validation("review id is required".to_string()));
    }
    let review = payload.into_review()?;
    let review = state.reviews.update(review).await?;
    Ok(Json(review))
}

pub async fn get_many(
    State(state): State<AppState>,
    Query(params): Query<ReviewListParams>,
) -> AppResult<Json<Vec<Review>>> {
    let reviews = state.reviews.get_many(params.film_id, params.count).await?;
    Ok(Json(reviews))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Review>> {
    let review = state.reviews.get(id).await?;
    Ok(Json(review))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Review>> {
    let review = state.reviews.delete(id).await?;
    Ok(Json(review))
}

pub async fn like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.reviews.like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn dislike(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.reviews.dislike(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.reviews.remove_like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_dislike(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.reviews.remove_dislike(id, user_id).await?;
    Ok(StatusCode::OK)
}
