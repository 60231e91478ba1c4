use std::collections::BTreeSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{Director, Film, Genre, Mpa};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmPayload {
    id: Option<i64>,
    name: Option<String>,
    description: Option<String>,
    release_date: Option<NaiveDate>,
    duration: Option<i64>,
    mpa: Option<Mpa>,
    genres: Option<BTreeSet<Genre>>,
    directors: Option<BTreeSet<Director>>,
}

impl FilmPayload {
    fn into_film(self) -> AppResult<Film> {
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                return Err(AppError::Validation(
                    "film name must not be blank".to_string(),
                ))
            }
        };
        let description = self.description.unwrap_or_default();
        if description.chars().count() > 200 {
            return Err(AppError::Validation(
                "film description must be at most 200 characters".to_string(),
            ));
        }
        let release_date = self.release_date.ok_or_else(|| {
            AppError::Validation("film release date is required".to_string())
        })?;
        let duration = self
            .duration
            .ok_or_else(|| AppError::Validation("film duration is required".to_string()))?;
        if duration <= 0 {
            return Err(AppError::Validation(
                "film duration must be positive".to_string(),
            ));
        }
        Ok(Film {
            id: self.id.unwrap_or_default(),
            name,
            description,
            release_date,
            duration,
            mpa: self.mpa,
            genres: self.genres.unwrap_or_default(),
            directors: self.directors.unwrap_or_default(),
            likes: BTreeSet::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PopularParams {
    #[serde(default = "default_count")]
    count: i64,
    genre_id: Option<i64>,
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct DirectorFilmsParams {
    sort_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    query: String,
    by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommonFilmsParams {
    user_id: Option<i64>,
    friend_id: Option<i64>,
}

fn default_count() -> i64 {
    10
}

fn required(param: Option<i64>, name: &str) -> AppResult<i64> {
    param.ok_or_else(|| AppError::Validation(format!("{name} parameter is required")))
}

// Handlers

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<FilmPayload>,
) -> AppResult<Json<Film>> {
    let film = payload.into_film()?;
    let film = state.films.create(film).await?;
    Ok(Json(film))
}

pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<FilmPayload>,
) -> AppResult<Json<Film>> {
    if payload.id.is_none() {
        return Err(AppError::Validation("film id is required".to_string()));
    }
    let film = payload.into_film()?;
    let film = state.films.update(film).await?;
    Ok(Json(film))
}

pub async fn get_all(State(state): State<AppState>) -> AppResult<Json<Vec<Film>>> {
    let films = state.films.get_all().await?;
    Ok(Json(films))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Film>> {
    let film = state.films.get(id).await?;
    Ok(Json(film))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Film>> {
    let film = state.films.delete(id).await?;
    Ok(Json(film))
}

pub async fn like(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.films.like(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn unlike(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.films.unlike(id, user_id).await?;
    Ok(StatusCode::OK)
}

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PopularParams>,
) -> AppResult<Json<Vec<Film>>> {
    let films = state
        .films
        .top_films(params.count, params.genre_id, params.year)
        .await?;
    Ok(Json(films))
}

pub async fn director_films(
    State(state): State<AppState>,
    Path(director_id): Path<i64>,
    Query(params): Query<DirectorFilmsParams>,
) -> AppResult<Json<Vec<Film>>> {
    let sort_by = params
        .sort_by
        .ok_or_else(|| AppError::Validation("sort_by parameter is required".to_string()))?;
    let films = state.films.director_films(director_id, &sort_by).await?;
    Ok(Json(films))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Film>>> {
    let by = params
        .by
        .ok_or_else(|| AppError::Validation("by parameter is required".to_string()))?;
    let films = state.films.search(&params.query, &by).await?;
    Ok(Json(films))
}

pub async fn common_films(
    State(state): State<AppState>,
    Query(params): Query<CommonFilmsParams>,
) -> AppResult<Json<Vec<Film>>> {
    let user_id = required(params.user_id, "user_id")?;
    let friend_id = required(params.friend_id, "friend_id")?;
    let films = state.films.common_films(user_id, friend_id).await?;
    Ok(Json(films))
}
