use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{Event, Film, User};

use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct UserPayload {
    id: Option<i64>,
    email: Option<String>,
    login: Option<String>,
    name: Option<String>,
    birthday: Option<NaiveDate>,
}

impl UserPayload {
    fn into_user(self) -> AppResult<User> {
        let email = match self.email {
            Some(email) if !email.trim().is_empty() => email,
            _ => {
                return Err(AppError::Validation(
                    "user email must not be blank".to_string(),
                ))
            }
        };
        if !email.contains('@') {
            return Err(AppError::Validation(
                "user email must contain '@'".to_string(),
            ));
        }
        let login = match self.login {
            Some(login) if !login.trim().is_empty() => login,
            _ => {
                return Err(AppError::Validation(
                    "user login must not be blank".to_string(),
                ))
            }
        };
        if login.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(
                "user login must not contain whitespace".to_string(),
            ));
        }
        let birthday = self
            .birthday
            .ok_or_else(|| AppError::Validation("user birthday is required".to_string()))?;
        if birthday > Utc::now().date_naive() {
            return Err(AppError::Validation(
                "user birthday must not be in the future".to_string(),
            ));
        }
        Ok(User {
            id: self.id.unwrap_or_default(),
            email,
            login,
            name: self.name.unwrap_or_default(),
            birthday,
            friends: BTreeSet::new(),
        })
    }
}

// Handlers

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<UserPayload>,
) -> AppResult<Json<User>> {
    let user = payload.into_user()?;
    let user = state.users.create(user).await?;
    Ok(Json(user))
}

pub async fn update(
    State(state): State<AppState>,
    Json(payload): Json<UserPayload>,
) -> AppResult<Json<User>> {
    if payload.id.is_none() {
        return Err(AppError::Validation("user id is required".to_string()));
    }
    let user = payload.into_user()?;
    let user = state.users.update(user).await?;
    Ok(Json(user))
}

pub async fn get_all(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state.users.get_all().await?;
    Ok(Json(users))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.users.get(id).await?;
    Ok(Json(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.users.delete(id).await?;
    Ok(Json(user))
}

pub async fn add_friend(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.users.add_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Path((id, friend_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state.users.remove_friend(id, friend_id).await?;
    Ok(StatusCode::OK)
}

pub async fn friends(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<User>>> {
    let friends = state.users.friends(id).await?;
    Ok(Json(friends))
}

pub async fn common_friends(
    State(state): State<AppState>,
    Path((id, other_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<User>>> {
    let friends = state.users.common_friends(id, other_id).await?;
    Ok(Json(friends))
}

pub async fn feed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Event>>> {
    let events = state.users.feed(id).await?;
    Ok(Json(events))
}

pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Film>>> {
    let films = state.users.recommendations(id).await?;
    Ok(Json(films))
}
