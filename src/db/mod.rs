//! Storage abstractions over the catalogue's entity families.
//!
//! Each family gets its own trait so services can depend on exactly the
//! storage they touch and tests can mock each seam independently. Two
//! backends implement the traits: a process-local in-memory store and
//! PostgreSQL. The backend is chosen once at startup; services never know
//! which one they were handed.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::{AppError, AppResult};
use crate::models::{Director, Event, Film, Genre, Mpa, Review, User};

pub mod memory;
pub mod postgres;

/// Genres and MPA ratings ship with the schema; neither backend accepts
/// writes to them.
pub(crate) fn read_only(family: &str) -> AppError {
    AppError::Internal(format!("{family} reference data is read-only"))
}

/// User records and the directed friendship edges between them.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn add(&self, user: User) -> AppResult<User>;
    async fn update(&self, user: User) -> AppResult<()>;
    /// Removes the user along with their likes, friendship edges in both
    /// directions, reviews, and feed events.
    async fn delete(&self, id: i64) -> AppResult<()>;
    async fn get(&self, id: i64) -> AppResult<User>;
    async fn get_all(&self) -> AppResult<Vec<User>>;
    async fn exists(&self, id: i64) -> AppResult<bool>;
    async fn add_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()>;
    async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()>;
    /// Users `user_id` follows, ascending by id.
    async fn friends(&self, user_id: i64) -> AppResult<Vec<User>>;
    /// Users followed by both arguments, ascending by id.
    async fn common_friends(&self, user_id: i64, other_id: i64) -> AppResult<Vec<User>>;
    /// Ids of up to five users whose like sets overlap `user_id`'s,
    /// ordered by overlap size descending, then by id.
    async fn users_with_similar_likes(&self, user_id: i64) -> AppResult<Vec<i64>>;
}

/// Films, their likes, and the ranking and search queries built on them.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FilmStorage: Send + Sync {
    async fn add(&self, film: Film) -> AppResult<Film>;
    async fn update(&self, film: Film) -> AppResult<()>;
    /// Removes the film along with its likes, genre and director links,
    /// and reviews.
    async fn delete(&self, id: i64) -> AppResult<()>;
    async fn get(&self, id: i64) -> AppResult<Film>;
    async fn get_all(&self) -> AppResult<Vec<Film>>;
    async fn exists(&self, id: i64) -> AppResult<bool>;
    /// Records a like. Re-liking is a no-op.
    async fn like(&self, film_id: i64, user_id: i64) -> AppResult<()>;
    async fn unlike(&self, film_id: i64, user_id: i64) -> AppResult<()>;
    /// The `count` most-liked films, optionally restricted to a genre and
    /// release year. Ties break toward the lower film id.
    async fn top_films(
        &self,
        count: i64,
        genre_id: Option<i64>,
        year: Option<i32>,
    ) -> AppResult<Vec<Film>>;
    async fn director_films_by_likes(&self, director_id: i64) -> AppResult<Vec<Film>>;
    async fn director_films_by_year(&self, director_id: i64) -> AppResult<Vec<Film>>;
    /// Films liked by both users, most-liked first.
    async fn common_films(&self, user_id: i64, friend_id: i64) -> AppResult<Vec<Film>>;
    async fn search_by_title(&self, query: &str) -> AppResult<Vec<Film>>;
    async fn search_by_director(&self, query: &str) -> AppResult<Vec<Film>>;
    async fn search_by_title_or_director(&self, query: &str) -> AppResult<Vec<Film>>;
    /// Up to five films `peer_id` liked that `user_id` has not, most-liked
    /// first.
    async fn liked_by_peer_not_user(&self, peer_id: i64, user_id: i64) -> AppResult<Vec<Film>>;
}

/// Genre reference data. The catalogue ships a fixed set; both backends
/// reject writes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GenreStorage: Send + Sync {
    async fn add(&self, genre: Genre) -> AppResult<Genre>;
    async fn update(&self, genre: Genre) -> AppResult<()>;
    async fn delete(&self, id: i64) -> AppResult<()>;
    async fn get(&self, id: i64) -> AppResult<Genre>;
    async fn get_all(&self) -> AppResult<Vec<Genre>>;
    async fn exists(&self, id: i64) -> AppResult<bool>;
}

/// MPA rating reference data. Read-only like genres.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MpaStorage: Send + Sync {
    async fn add(&self, mpa: Mpa) -> AppResult<Mpa>;
    async fn update(&self, mpa: Mpa) -> AppResult<()>;
    async fn delete(&self, id: i64) -> AppResult<()>;
    async fn get(&self, id: i64) -> AppResult<Mpa>;
    async fn get_all(&self) -> AppResult<Vec<Mpa>>;
    async fn exists(&self, id: i64) -> AppResult<bool>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait DirectorStorage: Send + Sync {
    async fn add(&self, director: Director) -> AppResult<Director>;
    async fn update(&self, director: Director) -> AppResult<()>;
    /// Unlinks the director from their films and removes the record.
    /// Unknown ids are ignored.
    async fn delete(&self, id: i64) -> AppResult<()>;
    async fn get(&self, id: i64) -> AppResult<Director>;
    async fn get_all(&self) -> AppResult<Vec<Director>>;
    async fn exists(&self, id: i64) -> AppResult<bool>;
}

/// Reviews and their usefulness votes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ReviewStorage: Send + Sync {
    async fn add(&self, review: Review) -> AppResult<Review>;
    async fn update(&self, review: Review) -> AppResult<()>;
    async fn delete(&self, id: i64) -> AppResult<()>;
    async fn get(&self, id: i64) -> AppResult<Review>;
    /// Up to `count` reviews, for one film or across the catalogue,
    /// most useful first with ties toward the lower review id.
    async fn get_many(&self, film_id: Option<i64>, count: i64) -> AppResult<Vec<Review>>;
    async fn exists(&self, id: i64) -> AppResult<bool>;
}

/// Append-only activity ledger.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventStorage: Send + Sync {
    /// Appends the event and returns it with its assigned id.
    async fn add(&self, event: Event) -> AppResult<Event>;
    /// Every event authored by `user_id`, oldest first.
    async fn feed(&self, user_id: i64) -> AppResult<Vec<Event>>;
}

/// Handles to every entity family's storage, all backed by the same store.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStorage>,
    pub films: Arc<dyn FilmStorage>,
    pub genres: Arc<dyn GenreStorage>,
    pub mpa: Arc<dyn MpaStorage>,
    pub directors: Arc<dyn DirectorStorage>,
    pub reviews: Arc<dyn ReviewStorage>,
    pub events: Arc<dyn EventStorage>,
}

impl Storage {
    /// Process-local storage seeded with the stock genres and MPA ratings.
    pub fn in_memory() -> Self {
        memory::storage()
    }

    /// PostgreSQL-backed storage. Connects and applies pending migrations.
    pub async fn postgres(database_url: &str) -> anyhow::Result<Self> {
        postgres::storage(database_url).await
    }
}
