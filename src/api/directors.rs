use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::Director;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct DirectorPayload {
    id: Option<i64>,
    name: Option<String>,
}

impl DirectorPayload {
    fn into_director(self) -> AppResult<Director> {
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                return Err(AppError::Validation(
                    "director name must not be blank".to_string(),
                ))
            }
        };
        Ok(Director {
            id: self.id.unwrap_or_default(),
            name,
        })
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<DirectorPayload>,
) -> AppResult<Json<Director>> {
    let director = payload.into_director()?;
    let director = state.directors.create(director).await?;
    Ok(Json(director))
}

pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<DirectorPayload>,
) -> AppResult<Json<Director>> {
    if payload.id.is_none() {
        return Err(AppError::Validation("director id is required".to_string()));
    }
    let director = payload.into_director()?;
    let director = state.directors.update(director).await?;
    Ok(Json(director))
}

pub async fn get_all(State(state): State<AppState>) -> AppResult<Json<Vec<Director>>> {
    let directors = state.directors.get_all().await?;
    Ok(Json(directors))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Director>> {
    let director = state.directors.get(id).await?;
    Ok(Json(director))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.directors.delete(id).await?;
    Ok(StatusCode::OK)
}
