use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppResult;
use crate::models::Genre;

use super::AppState;

pub async fn get_all(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.genres.get_all().await?;
    Ok(Json(genres))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Genre>> {
    let genre = state.genres.get(id).await?;
    Ok(Json(genre))
}
