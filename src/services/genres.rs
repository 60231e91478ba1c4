use std::sync::Arc;

use crate::db::GenreStorage;
use crate::error::AppResult;
use crate::models::Genre;

/// Read access to the fixed genre catalogue.
pub struct GenreService {
    genres: Arc<dyn GenreStorage>,
}

impl GenreService {
    pub fn new(genres: Arc<dyn GenreStorage>) -> Self {
        Self { genres }
    }

    pub async fn get(&self, id: i64) -> AppResult<Genre> {
        self.genres.get(id).await
    }

    pub async fn get_all(&self) -> AppResult<Vec<Genre>> {
        self.genres.get_all().await
    }
}
