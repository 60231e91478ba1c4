//! Process-local backend. One `MemoryState` sits behind an `RwLock` and is
//! shared by every adapter, so cross-family operations (cascading deletes,
//! like-overlap queries) see a single consistent store. `BTreeMap` keys keep
//! iteration in ascending-id order, which gives listings and ranking
//! tiebreaks a stable order without extra bookkeeping.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};
use crate::models::{Director, Event, Film, Genre, Mpa, Review, User};

use super::{
    read_only, DirectorStorage, EventStorage, FilmStorage, GenreStorage, MpaStorage, ReviewStorage,
    Storage, UserStorage,
};

type Shared = Arc<RwLock<MemoryState>>;

#[derive(Default)]
struct MemoryState {
    next_user_id: i64,
    next_film_id: i64,
    next_director_id: i64,
    next_review_id: i64,
    next_event_id: i64,
    users: BTreeMap<i64, User>,
    films: BTreeMap<i64, Film>,
    genres: BTreeMap<i64, Genre>,
    mpa: BTreeMap<i64, Mpa>,
    directors: BTreeMap<i64, Director>,
    reviews: BTreeMap<i64, Review>,
    events: Vec<Event>,
}

impl MemoryState {
    fn seeded() -> Self {
        let mut state = MemoryState::default();
        let genres = [
            (1, "Comedy"),
            (2, "Drama"),
            (3, "Cartoon"),
            (4, "Thriller"),
            (5, "Documentary"),
            (6, "Action"),
        ];
        for (id, name) in genres {
            state.genres.insert(
                id,
                Genre {
                    id,
                    name: name.to_string(),
                },
            );
        }
        let ratings = [(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];
        for (id, name) in ratings {
            state.mpa.insert(
                id,
                Mpa {
                    id,
                    name: name.to_string(),
                },
            );
        }
        state
    }
}

/// Builds the full adapter set over one freshly seeded state.
pub(super) fn storage() -> Storage {
    let state = Arc::new(RwLock::new(MemoryState::seeded()));
    Storage {
        users: Arc::new(MemoryUserStorage {
            state: state.clone(),
        }),
        films: Arc::new(MemoryFilmStorage {
            state: state.clone(),
        }),
        genres: Arc::new(MemoryGenreStorage {
            state: state.clone(),
        }),
        mpa: Arc::new(MemoryMpaStorage {
            state: state.clone(),
        }),
        directors: Arc::new(MemoryDirectorStorage {
            state: state.clone(),
        }),
        reviews: Arc::new(MemoryReviewStorage {
            state: state.clone(),
        }),
        events: Arc::new(MemoryEventStorage { state }),
    }
}

/// Like count descending, film id ascending on ties.
fn by_likes_then_id(a: &Film, b: &Film) -> Ordering {
    b.like_count()
        .cmp(&a.like_count())
        .then(a.id.cmp(&b.id))
}

struct MemoryUserStorage {
    state: Shared,
}

#[async_trait]
impl UserStorage for MemoryUserStorage {
    async fn add(&self, mut user: User) -> AppResult<User> {
        let mut state = self.state.write().await;
        state.next_user_id += 1;
        user.id = state.next_user_id;
        user.friends.clear();
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> AppResult<()> {
        let mut state = self.state.write().await;
        let existing = state
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found("user", user.id))?;
        existing.email = user.email;
        existing.login = user.login;
        existing.name = user.name;
        existing.birthday = user.birthday;
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Err(AppError::not_found("user", id));
        }
        for user in state.users.values_mut() {
            user.friends.remove(&id);
        }
        for film in state.films.values_mut() {
            film.likes.remove(&id);
        }
        state.reviews.retain(|_, review| review.user_id != id);
        state.events.retain(|event| event.user_id != id);
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<User> {
        let state = self.state.read().await;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("user", id))
    }

    async fn get_all(&self) -> AppResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.users.contains_key(&id))
    }

    async fn add_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("user", user_id))?;
        user.friends.insert(friend_id);
        Ok(())
    }

    async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("user", user_id))?;
        user.friends.remove(&friend_id);
        Ok(())
    }

    async fn friends(&self, user_id: i64) -> AppResult<Vec<User>> {
        let state = self.state.read().await;
        let user = state
            .users
            .get(&user_id)
            .ok_or_else(|| AppError::not_found("user", user_id))?;
        Ok(user
            .friends
            .iter()
            .filter_map(|id| state.users.get(id))
            .cloned()
            .collect())
    }

    async fn common_friends(&self, user_id: i64, other_id: i64) -> AppResult<Vec<User>> {
        let state = self.state.read().await;
        let user = state
            .users
            .get(&user_id)
            .ok_or_else(|| AppError::not_found("user", user_id))?;
        let other = state
            .users
            .get(&other_id)
            .ok_or_else(|| AppError::not_found("user", other_id))?;
        Ok(user
            .friends
            .intersection(&other.friends)
            .filter_map(|id| state.users.get(id))
            .cloned()
            .collect())
    }

    async fn users_with_similar_likes(&self, user_id: i64) -> AppResult<Vec<i64>> {
        let state = self.state.read().await;
        let liked: BTreeSet<i64> = state
            .films
            .values()
            .filter(|film| film.likes.contains(&user_id))
            .map(|film| film.id)
            .collect();
        let mut overlaps: Vec<(usize, i64)> = Vec::new();
        for other in state.users.values() {
            if other.id == user_id {
                continue;
            }
            let shared = state
                .films
                .values()
                .filter(|film| liked.contains(&film.id) && film.likes.contains(&other.id))
                .count();
            if shared > 0 {
                overlaps.push((shared, other.id));
            }
        }
        overlaps.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(overlaps.into_iter().take(5).map(|(_, id)| id).collect())
    }
}

struct MemoryFilmStorage {
    state: Shared,
}

#[async_trait]
impl FilmStorage for MemoryFilmStorage {
    async fn add(&self, mut film: Film) -> AppResult<Film> {
        let mut state = self.state.write().await;
        state.next_film_id += 1;
        film.id = state.next_film_id;
        film.likes.clear();
        state.films.insert(film.id, film.clone());
        Ok(film)
    }

    async fn update(&self, film: Film) -> AppResult<()> {
        let mut state = self.state.write().await;
        let existing = state
            .films
            .get_mut(&film.id)
            .ok_or_else(|| AppError::not_found("film", film.id))?;
        let likes = std::mem::take(&mut existing.likes);
        *existing = film;
        existing.likes = likes;
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.films.remove(&id).is_none() {
            return Err(AppError::not_found("film", id));
        }
        state.reviews.retain(|_, review| review.film_id != id);
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Film> {
        let state = self.state.read().await;
        state
            .films
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("film", id))
    }

    async fn get_all(&self) -> AppResult<Vec<Film>> {
        let state = self.state.read().await;
        Ok(state.films.values().cloned().collect())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.films.contains_key(&id))
    }

    async fn like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        let film = state
            .films
            .get_mut(&film_id)
            .ok_or_else(|| AppError::not_found("film", film_id))?;
        film.likes.insert(user_id);
        Ok(())
    }

    async fn unlike(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        let film = state
            .films
            .get_mut(&film_id)
            .ok_or_else(|| AppError::not_found("film", film_id))?;
        film.likes.remove(&user_id);
        Ok(())
    }

    async fn top_films(
        &self,
        count: i64,
        genre_id: Option<i64>,
        year: Option<i32>,
    ) -> AppResult<Vec<Film>> {
        let state = self.state.read().await;
        let mut films: Vec<Film> = state
            .films
            .values()
            .filter(|film| genre_id.map_or(true, |id| film.genres.iter().any(|g| g.id == id)))
            .filter(|film| year.map_or(true, |y| film.release_year() == y))
            .cloned()
            .collect();
        films.sort_by(by_likes_then_id);
        films.truncate(count.max(0) as usize);
        Ok(films)
    }

    async fn director_films_by_likes(&self, director_id: i64) -> AppResult<Vec<Film>> {
        let state = self.state.read().await;
        let mut films: Vec<Film> = state
            .films
            .values()
            .filter(|film| film.directors.iter().any(|d| d.id == director_id))
            .cloned()
            .collect();
        films.sort_by(by_likes_then_id);
        Ok(films)
    }

    async fn director_films_by_year(&self, director_id: i64) -> AppResult<Vec<Film>> {
        let state = self.state.read().await;
        let mut films: Vec<Film> = state
            .films
            .values()
            .filter(|film| film.directors.iter().any(|d| d.id == director_id))
            .cloned()
            .collect();
        films.sort_by_key(|film| (film.release_year(), film.id));
        Ok(films)
    }

    async fn common_films(&self, user_id: i64, friend_id: i64) -> AppResult<Vec<Film>> {
        let state = self.state.read().await;
        let mut films: Vec<Film> = state
            .films
            .values()
            .filter(|film| film.likes.contains(&user_id) && film.likes.contains(&friend_id))
            .cloned()
            .collect();
        films.sort_by(by_likes_then_id);
        Ok(films)
    }

    async fn search_by_title(&self, query: &str) -> AppResult<Vec<Film>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        let mut films: Vec<Film> = state
            .films
            .values()
            .filter(|film| film.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        films.sort_by(by_likes_then_id);
        Ok(films)
    }

    async fn search_by_director(&self, query: &str) -> AppResult<Vec<Film>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        let mut films: Vec<Film> = state
            .films
            .values()
            .filter(|film| {
                film.directors
                    .iter()
                    .any(|d| d.name.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        films.sort_by(by_likes_then_id);
        Ok(films)
    }

    async fn search_by_title_or_director(&self, query: &str) -> AppResult<Vec<Film>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        let mut films: Vec<Film> = state
            .films
            .values()
            .filter(|film| {
                film.name.to_lowercase().contains(&needle)
                    || film
                        .directors
                        .iter()
                        .any(|d| d.name.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        films.sort_by(by_likes_then_id);
        Ok(films)
    }

    async fn liked_by_peer_not_user(&self, peer_id: i64, user_id: i64) -> AppResult<Vec<Film>> {
        let state = self.state.read().await;
        let mut films: Vec<Film> = state
            .films
            .values()
            .filter(|film| film.likes.contains(&peer_id) && !film.likes.contains(&user_id))
            .cloned()
            .collect();
        films.sort_by(by_likes_then_id);
        films.truncate(5);
        Ok(films)
    }
}

struct MemoryGenreStorage {
    state: Shared,
}

#[async_trait]
impl GenreStorage for MemoryGenreStorage {
    async fn add(&self, _genre: Genre) -> AppResult<Genre> {
        Err(read_only("genre"))
    }

    async fn update(&self, _genre: Genre) -> AppResult<()> {
        Err(read_only("genre"))
    }

    async fn delete(&self, _id: i64) -> AppResult<()> {
        Err(read_only("genre"))
    }

    async fn get(&self, id: i64) -> AppResult<Genre> {
        let state = self.state.read().await;
        state
            .genres
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("genre", id))
    }

    async fn get_all(&self) -> AppResult<Vec<Genre>> {
        let state = self.state.read().await;
        Ok(state.genres.values().cloned().collect())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.genres.contains_key(&id))
    }
}

struct MemoryMpaStorage {
    state: Shared,
}

#[async_trait]
impl MpaStorage for MemoryMpaStorage {
    async fn add(&self, _mpa: Mpa) -> AppResult<Mpa> {
        Err(read_only("mpa"))
    }

    async fn update(&self, _mpa: Mpa) -> AppResult<()> {
        Err(read_only("mpa"))
    }

    async fn delete(&self, _id: i64) -> AppResult<()> {
        Err(read_only("mpa"))
    }

    async fn get(&self, id: i64) -> AppResult<Mpa> {
        let state = self.state.read().await;
        state
            .mpa
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("mpa rating", id))
    }

    async fn get_all(&self) -> AppResult<Vec<Mpa>> {
        let state = self.state.read().await;
        Ok(state.mpa.values().cloned().collect())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.mpa.contains_key(&id))
    }
}

struct MemoryDirectorStorage {
    state: Shared,
}

#[async_trait]
impl DirectorStorage for MemoryDirectorStorage {
    async fn add(&self, mut director: Director) -> AppResult<Director> {
        let mut state = self.state.write().await;
        state.next_director_id += 1;
        director.id = state.next_director_id;
        state.directors.insert(director.id, director.clone());
        Ok(director)
    }

    async fn update(&self, director: Director) -> AppResult<()> {
        let mut state = self.state.write().await;
        let existing = state
            .directors
            .get_mut(&director.id)
            .ok_or_else(|| AppError::not_found("director", director.id))?;
        existing.name = director.name.clone();
        for film in state.films.values_mut() {
            if film.directors.iter().any(|d| d.id == director.id) {
                film.directors.retain(|d| d.id != director.id);
                film.directors.insert(director.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.directors.remove(&id);
        for film in state.films.values_mut() {
            film.directors.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Director> {
        let state = self.state.read().await;
        state
            .directors
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("director", id))
    }

    async fn get_all(&self) -> AppResult<Vec<Director>> {
        let state = self.state.read().await;
        Ok(state.directors.values().cloned().collect())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.directors.contains_key(&id))
    }
}

struct MemoryReviewStorage {
    state: Shared,
}

#[async_trait]
impl ReviewStorage for MemoryReviewStorage {
    async fn add(&self, mut review: Review) -> AppResult<Review> {
        let mut state = self.state.write().await;
        state.next_review_id += 1;
        review.id = state.next_review_id;
        review.useful = 0;
        state.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn update(&self, review: Review) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.reviews.contains_key(&review.id) {
            return Err(AppError::not_found("review", review.id));
        }
        state.reviews.insert(review.id, review);
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.reviews.remove(&id).is_none() {
            return Err(AppError::not_found("review", id));
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Review> {
        let state = self.state.read().await;
        state
            .reviews
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("review", id))
    }

    async fn get_many(&self, film_id: Option<i64>, count: i64) -> AppResult<Vec<Review>> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|review| film_id.map_or(true, |id| review.film_id == id))
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.useful.cmp(&a.useful).then(a.id.cmp(&b.id)));
        reviews.truncate(count.max(0) as usize);
        Ok(reviews)
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let state = self.state.read().await;
        Ok(state.reviews.contains_key(&id))
    }
}

struct MemoryEventStorage {
    state: Shared,
}

#[async_trait]
impl EventStorage for MemoryEventStorage {
    async fn add(&self, mut event: Event) -> AppResult<Event> {
        let mut state = self.state.write().await;
        state.next_event_id += 1;
        event.id = state.next_event_id;
        state.events.push(event.clone());
        Ok(event)
    }

    async fn feed(&self, user_id: i64) -> AppResult<Vec<Event>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|event| event.user_id == user_id)
            .cloned()
            .collect())
    }
}
