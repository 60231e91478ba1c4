use std::sync::Arc;

use crate::db::DirectorStorage;
use crate::error::{AppError, AppResult};
use crate::models::Director;

/// Director roster maintenance.
pub struct DirectorService {
    directors: Arc<dyn DirectorStorage>,
}

impl DirectorService {
    pub fn new(directors: Arc<dyn DirectorStorage>) -> Self {
        Self { directors }
    }

    pub async fn create(&self, director: Director) -> AppResult<Director> {
        let director = self.directors.add(director).await?;
        tracing::info!(director_id = director.id, name = %director.name, "director created");
        Ok(director)
    }

    pub async fn update(&self, director: Director) -> AppResult<Director> {
        if !self.directors.exists(director.id).await? {
            return Err(AppError::not_found("director", director.id));
        }
        let id = director.id;
        self.directors.update(director).await?;
        self.directors.get(id).await
    }

    pub async fn get(&self, id: i64) -> AppResult<Director> {
        self.directors.get(id).await
    }

    pub async fn get_all(&self) -> AppResult<Vec<Director>> {
        self.directors.get_all().await
    }

    /// Deleting an unknown director is a no-op, not an error.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.directors.delete(id).await
    }
}
