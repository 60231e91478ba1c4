//! PostgreSQL backend. Each adapter holds a clone of one shared pool; rows
//! map through `FromRow` structs and get their associations (likes, genres,
//! directors, friends) hydrated with follow-up queries. Ranking queries
//! count distinct likers and break ties toward the lower id so results stay
//! stable across runs.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::{Director, Event, Film, Genre, Mpa, Review, User};

use super::{
    read_only, DirectorStorage, EventStorage, FilmStorage, GenreStorage, MpaStorage, ReviewStorage,
    Storage, UserStorage,
};

/// Connects, applies pending migrations, and builds the adapter set.
pub(super) async fn storage(database_url: &str) -> anyhow::Result<Storage> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;
    Ok(Storage {
        users: Arc::new(PgUserStorage { pool: pool.clone() }),
        films: Arc::new(PgFilmStorage { pool: pool.clone() }),
        genres: Arc::new(PgGenreStorage { pool: pool.clone() }),
        mpa: Arc::new(PgMpaStorage { pool: pool.clone() }),
        directors: Arc::new(PgDirectorStorage { pool: pool.clone() }),
        reviews: Arc::new(PgReviewStorage { pool: pool.clone() }),
        events: Arc::new(PgEventStorage { pool }),
    })
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    email: String,
    login: String,
    name: String,
    birthday: NaiveDate,
}

impl UserRow {
    fn into_model(self, friends: BTreeSet<i64>) -> User {
        User {
            id: self.user_id,
            email: self.email,
            login: self.login,
            name: self.name,
            birthday: self.birthday,
            friends,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FilmRow {
    film_id: i64,
    name: String,
    description: String,
    release_date: NaiveDate,
    duration: i64,
    mpa_id: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct GenreRow {
    genre_id: i64,
    name: String,
}

impl GenreRow {
    fn into_model(self) -> Genre {
        Genre {
            id: self.genre_id,
            name: self.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MpaRow {
    mpa_id: i64,
    name: String,
}

impl MpaRow {
    fn into_model(self) -> Mpa {
        Mpa {
            id: self.mpa_id,
            name: self.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DirectorRow {
    director_id: i64,
    name: String,
}

impl DirectorRow {
    fn into_model(self) -> Director {
        Director {
            id: self.director_id,
            name: self.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    review_id: i64,
    content: String,
    is_positive: bool,
    user_id: i64,
    film_id: i64,
    useful: i64,
}

impl ReviewRow {
    fn into_model(self) -> Review {
        Review {
            id: self.review_id,
            content: self.content,
            is_positive: self.is_positive,
            user_id: self.user_id,
            film_id: self.film_id,
            useful: self.useful,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: i64,
    ts: i64,
    user_id: i64,
    event_type: String,
    operation: String,
    entity_id: i64,
}

impl EventRow {
    fn into_model(self) -> AppResult<Event> {
        Ok(Event {
            id: self.event_id,
            timestamp: self.ts,
            user_id: self.user_id,
            event_type: self.event_type.parse()?,
            operation: self.operation.parse()?,
            entity_id: self.entity_id,
        })
    }
}

struct PgUserStorage {
    pool: PgPool,
}

impl PgUserStorage {
    async fn hydrate(&self, row: UserRow) -> AppResult<User> {
        let friends: Vec<i64> =
            sqlx::query_scalar("SELECT friend_id FROM friends WHERE user_id = $1 ORDER BY friend_id")
                .bind(row.user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(row.into_model(friends.into_iter().collect()))
    }
}

#[async_trait]
impl UserStorage for PgUserStorage {
    async fn add(&self, mut user: User) -> AppResult<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, login, name, birthday) VALUES ($1, $2, $3, $4) \
             RETURNING user_id",
        )
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.name)
        .bind(user.birthday)
        .fetch_one(&self.pool)
        .await?;
        user.id = id;
        user.friends.clear();
        Ok(user)
    }

    async fn update(&self, user: User) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET email = $1, login = $2, name = $3, birthday = $4 WHERE user_id = $5",
        )
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.name)
        .bind(user.birthday)
        .bind(user.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("user", user.id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        // Likes, friendship edges, reviews, and events follow via FK cascade.
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("user", id));
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<User> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE user_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => self.hydrate(row).await,
            None => Err(AppError::not_found("user", id)),
        }
    }

    async fn get_all(&self) -> AppResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?;
        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.hydrate(row).await?);
        }
        Ok(users)
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn add_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO friends (user_id, friend_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(friend_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM friends WHERE user_id = $1 AND friend_id = $2")
            .bind(user_id)
            .bind(friend_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn friends(&self, user_id: i64) -> AppResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT u.* FROM users AS u \
             JOIN friends AS f ON u.user_id = f.friend_id \
             WHERE f.user_id = $1 ORDER BY u.user_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.hydrate(row).await?);
        }
        Ok(users)
    }

    async fn common_friends(&self, user_id: i64, other_id: i64) -> AppResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT u.* FROM users AS u \
             JOIN friends AS f ON u.user_id = f.friend_id \
             JOIN friends AS o ON u.user_id = o.friend_id \
             WHERE f.user_id = $1 AND o.user_id = $2 ORDER BY u.user_id",
        )
        .bind(user_id)
        .bind(other_id)
        .fetch_all(&self.pool)
        .await?;
        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(self.hydrate(row).await?);
        }
        Ok(users)
    }

    async fn users_with_similar_likes(&self, user_id: i64) -> AppResult<Vec<i64>> {
        let peers: Vec<i64> = sqlx::query_scalar(
            "SELECT user_id FROM likes \
             WHERE film_id IN (SELECT film_id FROM likes WHERE user_id = $1) \
             AND user_id <> $1 \
             GROUP BY user_id \
             ORDER BY COUNT(*) DESC, user_id ASC \
             LIMIT 5",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(peers)
    }
}

struct PgFilmStorage {
    pool: PgPool,
}

impl PgFilmStorage {
    /// Fills likes, genres, the MPA rating, and directors for one film row.
    async fn hydrate(&self, row: FilmRow) -> AppResult<Film> {
        let likes: Vec<i64> =
            sqlx::query_scalar("SELECT user_id FROM likes WHERE film_id = $1 ORDER BY user_id")
                .bind(row.film_id)
                .fetch_all(&self.pool)
                .await?;
        let genres: Vec<GenreRow> = sqlx::query_as(
            "SELECT g.genre_id, g.name FROM film_genres AS fg \
             JOIN genres AS g ON fg.genre_id = g.genre_id \
             WHERE fg.film_id = $1 ORDER BY g.genre_id",
        )
        .bind(row.film_id)
        .fetch_all(&self.pool)
        .await?;
        let directors: Vec<DirectorRow> = sqlx::query_as(
            "SELECT d.director_id, d.name FROM film_directors AS fd \
             JOIN directors AS d ON fd.director_id = d.director_id \
             WHERE fd.film_id = $1 ORDER BY d.director_id",
        )
        .bind(row.film_id)
        .fetch_all(&self.pool)
        .await?;
        let mpa = match row.mpa_id {
            Some(mpa_id) => {
                let row: Option<MpaRow> = sqlx::query_as("SELECT * FROM mpa WHERE mpa_id = $1")
                    .bind(mpa_id)
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(MpaRow::into_model)
            }
            None => None,
        };
        Ok(Film {
            id: row.film_id,
            name: row.name,
            description: row.description,
            release_date: row.release_date,
            duration: row.duration,
            mpa,
            genres: genres.into_iter().map(GenreRow::into_model).collect(),
            directors: directors.into_iter().map(DirectorRow::into_model).collect(),
            likes: likes.into_iter().collect(),
        })
    }

    async fn hydrate_all(&self, rows: Vec<FilmRow>) -> AppResult<Vec<Film>> {
        let mut films = Vec::with_capacity(rows.len());
        for row in rows {
            films.push(self.hydrate(row).await?);
        }
        Ok(films)
    }

    /// Rewrites the genre and director link tables for one film.
    async fn replace_links(&self, film_id: i64, film: &Film) -> AppResult<()> {
        sqlx::query("DELETE FROM film_genres WHERE film_id = $1")
            .bind(film_id)
            .execute(&self.pool)
            .await?;
        for genre in &film.genres {
            sqlx::query(
                "INSERT INTO film_genres (film_id, genre_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(film_id)
            .bind(genre.id)
            .execute(&self.pool)
            .await?;
        }
        sqlx::query("DELETE FROM film_directors WHERE film_id = $1")
            .bind(film_id)
            .execute(&self.pool)
            .await?;
        for director in &film.directors {
            sqlx::query(
                "INSERT INTO film_directors (film_id, director_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(film_id)
            .bind(director.id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl FilmStorage for PgFilmStorage {
    async fn add(&self, mut film: Film) -> AppResult<Film> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO films (name, description, release_date, duration, mpa_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING film_id",
        )
        .bind(&film.name)
        .bind(&film.description)
        .bind(film.release_date)
        .bind(film.duration)
        .bind(film.mpa.as_ref().map(|m| m.id))
        .fetch_one(&self.pool)
        .await?;
        film.id = id;
        film.likes.clear();
        self.replace_links(id, &film).await?;
        Ok(film)
    }

    async fn update(&self, film: Film) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE films SET name = $1, description = $2, release_date = $3, duration = $4, \
             mpa_id = $5 WHERE film_id = $6",
        )
        .bind(&film.name)
        .bind(&film.description)
        .bind(film.release_date)
        .bind(film.duration)
        .bind(film.mpa.as_ref().map(|m| m.id))
        .bind(film.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("film", film.id));
        }
        self.replace_links(film.id, &film).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        // Likes, link tables, and reviews follow via FK cascade.
        let result = sqlx::query("DELETE FROM films WHERE film_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("film", id));
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Film> {
        let row: Option<FilmRow> = sqlx::query_as("SELECT * FROM films WHERE film_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => self.hydrate(row).await,
            None => Err(AppError::not_found("film", id)),
        }
    }

    async fn get_all(&self) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = sqlx::query_as("SELECT * FROM films ORDER BY film_id")
            .fetch_all(&self.pool)
            .await?;
        self.hydrate_all(rows).await
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM films WHERE film_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        sqlx::query("INSERT INTO likes (film_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(film_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn unlike(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM likes WHERE film_id = $1 AND user_id = $2")
            .bind(film_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn top_films(
        &self,
        count: i64,
        genre_id: Option<i64>,
        year: Option<i32>,
    ) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = match (genre_id, year) {
            (Some(genre_id), Some(year)) => {
                sqlx::query_as(
                    "SELECT f.* FROM films AS f \
                     LEFT JOIN likes AS l ON f.film_id = l.film_id \
                     JOIN film_genres AS fg ON f.film_id = fg.film_id \
                     WHERE fg.genre_id = $1 AND EXTRACT(YEAR FROM f.release_date)::int = $2 \
                     GROUP BY f.film_id \
                     ORDER BY COUNT(DISTINCT l.user_id) DESC, f.film_id ASC \
                     LIMIT $3",
                )
                .bind(genre_id)
                .bind(year)
                .bind(count)
                .fetch_all(&self.pool)
                .await?
            }
            (Some(genre_id), None) => {
                sqlx::query_as(
                    "SELECT f.* FROM films AS f \
                     LEFT JOIN likes AS l ON f.film_id = l.film_id \
                     JOIN film_genres AS fg ON f.film_id = fg.film_id \
                     WHERE fg.genre_id = $1 \
                     GROUP BY f.film_id \
                     ORDER BY COUNT(DISTINCT l.user_id) DESC, f.film_id ASC \
                     LIMIT $2",
                )
                .bind(genre_id)
                .bind(count)
                .fetch_all(&self.pool)
                .await?
            }
            (None, Some(year)) => {
                sqlx::query_as(
                    "SELECT f.* FROM films AS f \
                     LEFT JOIN likes AS l ON f.film_id = l.film_id \
                     WHERE EXTRACT(YEAR FROM f.release_date)::int = $1 \
                     GROUP BY f.film_id \
                     ORDER BY COUNT(DISTINCT l.user_id) DESC, f.film_id ASC \
                     LIMIT $2",
                )
                .bind(year)
                .bind(count)
                .fetch_all(&self.pool)
                .await?
            }
            (None, None) => {
                sqlx::query_as(
                    "SELECT f.* FROM films AS f \
                     LEFT JOIN likes AS l ON f.film_id = l.film_id \
                     GROUP BY f.film_id \
                     ORDER BY COUNT(DISTINCT l.user_id) DESC, f.film_id ASC \
                     LIMIT $1",
                )
                .bind(count)
                .fetch_all(&self.pool)
                .await?
            }
        };
        self.hydrate_all(rows).await
    }

    async fn director_films_by_likes(&self, director_id: i64) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = sqlx::query_as(
            "SELECT f.* FROM films AS f \
             JOIN film_directors AS fd ON fd.film_id = f.film_id \
             LEFT JOIN likes AS l ON f.film_id = l.film_id \
             WHERE fd.director_id = $1 \
             GROUP BY f.film_id \
             ORDER BY COUNT(DISTINCT l.user_id) DESC, f.film_id ASC",
        )
        .bind(director_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn director_films_by_year(&self, director_id: i64) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = sqlx::query_as(
            "SELECT f.* FROM films AS f \
             JOIN film_directors AS fd ON fd.film_id = f.film_id \
             WHERE fd.director_id = $1 \
             ORDER BY EXTRACT(YEAR FROM f.release_date) ASC, f.film_id ASC",
        )
        .bind(director_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn common_films(&self, user_id: i64, friend_id: i64) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = sqlx::query_as(
            "SELECT f.* FROM films AS f \
             JOIN likes AS l1 ON f.film_id = l1.film_id AND l1.user_id = $1 \
             JOIN likes AS l2 ON f.film_id = l2.film_id AND l2.user_id = $2 \
             LEFT JOIN likes AS l ON f.film_id = l.film_id \
             GROUP BY f.film_id \
             ORDER BY COUNT(DISTINCT l.user_id) DESC, f.film_id ASC",
        )
        .bind(user_id)
        .bind(friend_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn search_by_title(&self, query: &str) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = sqlx::query_as(
            "SELECT f.* FROM films AS f \
             LEFT JOIN likes AS l ON f.film_id = l.film_id \
             WHERE LOWER(f.name) LIKE '%' || LOWER($1) || '%' \
             GROUP BY f.film_id \
             ORDER BY COUNT(DISTINCT l.user_id) DESC, f.film_id ASC",
        )
        .bind(query)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn search_by_director(&self, query: &str) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = sqlx::query_as(
            "SELECT f.* FROM films AS f \
             JOIN film_directors AS fd ON fd.film_id = f.film_id \
             JOIN directors AS d ON d.director_id = fd.director_id \
             LEFT JOIN likes AS l ON f.film_id = l.film_id \
             WHERE LOWER(d.name) LIKE '%' || LOWER($1) || '%' \
             GROUP BY f.film_id \
             ORDER BY COUNT(DISTINCT l.user_id) DESC, f.film_id ASC",
        )
        .bind(query)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn search_by_title_or_director(&self, query: &str) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = sqlx::query_as(
            "SELECT f.* FROM films AS f \
             LEFT JOIN film_directors AS fd ON fd.film_id = f.film_id \
             LEFT JOIN directors AS d ON d.director_id = fd.director_id \
             LEFT JOIN likes AS l ON f.film_id = l.film_id \
             WHERE LOWER(f.name) LIKE '%' || LOWER($1) || '%' \
             OR LOWER(d.name) LIKE '%' || LOWER($1) || '%' \
             GROUP BY f.film_id \
             ORDER BY COUNT(DISTINCT l.user_id) DESC, f.film_id ASC",
        )
        .bind(query)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn liked_by_peer_not_user(&self, peer_id: i64, user_id: i64) -> AppResult<Vec<Film>> {
        let rows: Vec<FilmRow> = sqlx::query_as(
            "SELECT f.* FROM films AS f \
             JOIN likes AS l ON l.film_id = f.film_id \
             LEFT JOIN likes AS l_all ON l_all.film_id = f.film_id \
             WHERE l.user_id = $1 \
             AND f.film_id NOT IN (SELECT film_id FROM likes WHERE user_id = $2) \
             GROUP BY f.film_id \
             ORDER BY COUNT(DISTINCT l_all.user_id) DESC, f.film_id ASC \
             LIMIT 5",
        )
        .bind(peer_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }
}

struct PgGenreStorage {
    pool: PgPool,
}

#[async_trait]
impl GenreStorage for PgGenreStorage {
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
        let row: Option<GenreRow> = sqlx::query_as("SELECT * FROM genres WHERE genre_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(GenreRow::into_model)
            .ok_or_else(|| AppError::not_found("genre", id))
    }

    async fn get_all(&self) -> AppResult<Vec<Genre>> {
        let rows: Vec<GenreRow> = sqlx::query_as("SELECT * FROM genres ORDER BY genre_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GenreRow::into_model).collect())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM genres WHERE genre_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

struct PgMpaStorage {
    pool: PgPool,
}

#[async_trait]
impl MpaStorage for PgMpaStorage {
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
        let row: Option<MpaRow> = sqlx::query_as("SELECT * FROM mpa WHERE mpa_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(MpaRow::into_model)
            .ok_or_else(|| AppError::not_found("mpa rating", id))
    }

    async fn get_all(&self) -> AppResult<Vec<Mpa>> {
        let rows: Vec<MpaRow> = sqlx::query_as("SELECT * FROM mpa ORDER BY mpa_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(MpaRow::into_model).collect())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM mpa WHERE mpa_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

struct PgDirectorStorage {
    pool: PgPool,
}

#[async_trait]
impl DirectorStorage for PgDirectorStorage {
    async fn add(&self, mut director: Director) -> AppResult<Director> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO directors (name) VALUES ($1) RETURNING director_id")
                .bind(&director.name)
                .fetch_one(&self.pool)
                .await?;
        director.id = id;
        Ok(director)
    }

    async fn update(&self, director: Director) -> AppResult<()> {
        let result = sqlx::query("UPDATE directors SET name = $1 WHERE director_id = $2")
            .bind(&director.name)
            .bind(director.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("director", director.id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        // Film links follow via FK cascade; unknown ids delete zero rows.
        sqlx::query("DELETE FROM directors WHERE director_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Director> {
        let row: Option<DirectorRow> =
            sqlx::query_as("SELECT * FROM directors WHERE director_id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(DirectorRow::into_model)
            .ok_or_else(|| AppError::not_found("director", id))
    }

    async fn get_all(&self) -> AppResult<Vec<Director>> {
        let rows: Vec<DirectorRow> = sqlx::query_as("SELECT * FROM directors ORDER BY director_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(DirectorRow::into_model).collect())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM directors WHERE director_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

struct PgReviewStorage {
    pool: PgPool,
}

#[async_trait]
impl ReviewStorage for PgReviewStorage {
    async fn add(&self, mut review: Review) -> AppResult<Review> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO reviews (content, is_positive, user_id, film_id, useful) \
             VALUES ($1, $2, $3, $4, 0) RETURNING review_id",
        )
        .bind(&review.content)
        .bind(review.is_positive)
        .bind(review.user_id)
        .bind(review.film_id)
        .fetch_one(&self.pool)
        .await?;
        review.id = id;
        review.useful = 0;
        Ok(review)
    }

    async fn update(&self, review: Review) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE reviews SET content = $1, is_positive = $2, user_id = $3, film_id = $4, \
             useful = $5 WHERE review_id = $6",
        )
        .bind(&review.content)
        .bind(review.is_positive)
        .bind(review.user_id)
        .bind(review.film_id)
        .bind(review.useful)
        .bind(review.id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("review", review.id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE review_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("review", id));
        }
        Ok(())
    }

    async fn get(&self, id: i64) -> AppResult<Review> {
        let row: Option<ReviewRow> = sqlx::query_as("SELECT * FROM reviews WHERE review_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ReviewRow::into_model)
            .ok_or_else(|| AppError::not_found("review", id))
    }

    async fn get_many(&self, film_id: Option<i64>, count: i64) -> AppResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = match film_id {
            Some(film_id) => {
                sqlx::query_as(
                    "SELECT * FROM reviews WHERE film_id = $1 \
                     ORDER BY useful DESC, review_id ASC LIMIT $2",
                )
                .bind(film_id)
                .bind(count)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT * FROM reviews ORDER BY useful DESC, review_id ASC LIMIT $1",
                )
                .bind(count)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(ReviewRow::into_model).collect())
    }

    async fn exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM reviews WHERE review_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

struct PgEventStorage {
    pool: PgPool,
}

#[async_trait]
impl EventStorage for PgEventStorage {
    async fn add(&self, mut event: Event) -> AppResult<Event> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO events (ts, user_id, event_type, operation, entity_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING event_id",
        )
        .bind(event.timestamp)
        .bind(event.user_id)
        .bind(event.event_type.as_str())
        .bind(event.operation.as_str())
        .bind(event.entity_id)
        .fetch_one(&self.pool)
        .await?;
        event.id = id;
        Ok(event)
    }

    async fn feed(&self, user_id: i64) -> AppResult<Vec<Event>> {
        let rows: Vec<EventRow> =
            sqlx::query_as("SELECT * FROM events WHERE user_id = $1 ORDER BY event_id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(EventRow::into_model).collect()
    }
}
