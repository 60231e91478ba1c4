use std::sync::Arc;

use crate::db::MpaStorage;
use crate::error::AppResult;
use crate::models::Mpa;

/// Read access to the fixed MPA rating catalogue.
pub struct MpaService {
    mpa: Arc<dyn MpaStorage>,
}

impl MpaService {
    pub fn new(mpa: Arc<dyn MpaStorage>) -> Self {
        Self { mpa }
    }

    pub async fn get(&self, id: i64) -> AppResult<Mpa> {
        self.mpa.get(id).await
    }

    pub async fn get_all(&self) -> AppResult<Vec<Mpa>> {
        self.mpa.get_all().await
    }
}
