use std::sync::Arc;

use crate::db::Storage;
use crate::services::{
    DirectorService, FilmService, GenreService, MpaService, ReviewService, UserService,
};

/// Shared application state: one service per entity family, all wired to
/// the same storage backend.
#[derive(Clone)]
pub struct AppState {
    pub films: Arc<FilmService>,
    pub users: Arc<UserService>,
    pub reviews: Arc<ReviewService>,
    pub directors: Arc<DirectorService>,
    pub genres: Arc<GenreService>,
    pub mpa: Arc<MpaService>,
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        Self {
            films: Arc::new(FilmService::new(
                storage.films.clone(),
                storage.users.clone(),
                storage.genres.clone(),
                storage.mpa.clone(),
                storage.directors.clone(),
                storage.events.clone(),
            )),
            users: Arc::new(UserService::new(
                storage.users.clone(),
                storage.films.clone(),
                storage.events.clone(),
            )),
            reviews: Arc::new(ReviewService::new(
                storage.reviews.clone(),
                storage.films.clone(),
                storage.users.clone(),
                storage.events.clone(),
            )),
            directors: Arc::new(DirectorService::new(storage.directors.clone())),
            genres: Arc::new(GenreService::new(storage.genres.clone())),
            mpa: Arc::new(MpaService::new(storage.mpa.clone())),
        }
    }
}
