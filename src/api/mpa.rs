use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppResult;
use crate::models::Mpa;

use super::AppState;

pub async fn get_all(State(state): State<AppState>) -> AppResult<Json<Vec<Mpa>>> {
    let ratings = state.mpa.get_all().await?;
    Ok(Json(ratings))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Mpa>> {
    let rating = state.mpa.get(id).await?;
    Ok(Json(rating))
}
