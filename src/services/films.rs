use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::{
    DirectorStorage, EventStorage, FilmStorage, GenreStorage, MpaStorage, UserStorage,
};
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventOperation, EventType, Film};

/// Date of the first public film screening; nothing can be released earlier.
fn earliest_release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1895, 12, 28).unwrap_or(NaiveDate::MIN)
}

/// Reference failures on a film payload are the caller's mistake, not a
/// missing resource.
fn as_validation(err: AppError) -> AppError {
    match err {
        AppError::NotFound(message) => AppError::Validation(message),
        other => other,
    }
}

/// Film catalogue operations: CRUD, likes, and the ranking and search
/// queries built on the like graph.
pub struct FilmService {
    films: Arc<dyn FilmStorage>,
    users: Arc<dyn UserStorage>,
    genres: Arc<dyn GenreStorage>,
    mpa: Arc<dyn MpaStorage>,
    directors: Arc<dyn DirectorStorage>,
    events: Arc<dyn EventStorage>,
}

impl FilmService {
    pub fn new(
        films: Arc<dyn FilmStorage>,
        users: Arc<dyn UserStorage>,
        genres: Arc<dyn GenreStorage>,
        mpa: Arc<dyn MpaStorage>,
        directors: Arc<dyn DirectorStorage>,
        events: Arc<dyn EventStorage>,
    ) -> Self {
        Self {
            films,
            users,
            genres,
            mpa,
            directors,
            events,
        }
    }

    pub async fn create(&self, mut film: Film) -> AppResult<Film> {
        self.validate(&mut film).await?;
        let film = self.films.add(film).await?;
        tracing::info!(film_id = film.id, name = %film.name, "film created");
        Ok(film)
    }

    pub async fn update(&self, mut film: Film) -> AppResult<Film> {
        if !self.films.exists(film.id).await? {
            return Err(AppError::not_found("film", film.id));
        }
        self.validate(&mut film).await?;
        let id = film.id;
        self.films.update(film).await?;
        self.films.get(id).await
    }

    pub async fn get(&self, id: i64) -> AppResult<Film> {
        self.films.get(id).await
    }

    pub async fn get_all(&self) -> AppResult<Vec<Film>> {
        self.films.get_all().await
    }

    /// Removes the film and returns its last state.
    pub async fn delete(&self, id: i64) -> AppResult<Film> {
        let film = self.films.get(id).await?;
        self.films.delete(id).await?;
        tracing::info!(film_id = id, "film deleted");
        Ok(film)
    }

    /// Records a like and its feed event. Checks the film first, then the
    /// user; a failed check aborts before anything is written.
    pub async fn like(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        self.check_film(film_id).await?;
        self.check_user(user_id).await?;
        self.films.like(film_id, user_id).await?;
        self.events
            .add(Event::new(
                user_id,
                EventType::Like,
                EventOperation::Add,
                film_id,
            ))
            .await?;
        Ok(())
    }

    /// Withdraws a like. The REMOVE event is appended whether or not a like
    /// existed, mirroring the ledger's view of the request.
    pub async fn unlike(&self, film_id: i64, user_id: i64) -> AppResult<()> {
        self.check_film(film_id).await?;
        self.check_user(user_id).await?;
        self.films.unlike(film_id, user_id).await?;
        self.events
            .add(Event::new(
                user_id,
                EventType::Like,
                EventOperation::Remove,
                film_id,
            ))
            .await?;
        Ok(())
    }

    pub async fn top_films(
        &self,
        count: i64,
        genre_id: Option<i64>,
        year: Option<i32>,
    ) -> AppResult<Vec<Film>> {
        if count <= 0 {
            return Ok(Vec::new());
        }
        self.films.top_films(count, genre_id, year).await
    }

    pub async fn director_films(&self, director_id: i64, sort_by: &str) -> AppResult<Vec<Film>> {
        if !self.directors.exists(director_id).await? {
            return Err(AppError::not_found("director", director_id));
        }
        match sort_by {
            "likes" => self.films.director_films_by_likes(director_id).await,
            "year" => self.films.director_films_by_year(director_id).await,
            other => Err(AppError::Validation(format!("unknown sort key: {other}"))),
        }
    }

    pub async fn search(&self, query: &str, by: &str) -> AppResult<Vec<Film>> {
        match by {
            "title" => self.films.search_by_title(query).await,
            "director" => self.films.search_by_director(query).await,
            "title,director" | "director,title" => {
                self.films.search_by_title_or_director(query).await
            }
            other => Err(AppError::Validation(format!("unknown search key: {other}"))),
        }
    }

    pub async fn common_films(&self, user_id: i64, friend_id: i64) -> AppResult<Vec<Film>> {
        self.check_user(user_id).await?;
        self.check_user(friend_id).await?;
        self.films.common_films(user_id, friend_id).await
    }

    /// Checks the release-date floor and swaps every genre, MPA, and
    /// director reference for its canonical record.
    async fn validate(&self, film: &mut Film) -> AppResult<()> {
        if film.release_date < earliest_release_date() {
            return Err(AppError::Validation(
                "release date must not be before 1895-12-28".to_string(),
            ));
        }
        if let Some(mpa) = film.mpa.take() {
            film.mpa = Some(self.mpa.get(mpa.id).await.map_err(as_validation)?);
        }
        let mut genres = BTreeSet::new();
        for genre in std::mem::take(&mut film.genres) {
            genres.insert(self.genres.get(genre.id).await.map_err(as_validation)?);
        }
        film.genres = genres;
        let mut directors = BTreeSet::new();
        for director in std::mem::take(&mut film.directors) {
            directors.insert(self.directors.get(director.id).await.map_err(as_validation)?);
        }
        film.directors = directors;
        Ok(())
    }

    async fn check_film(&self, film_id: i64) -> AppResult<()> {
        if !self.films.exists(film_id).await? {
            return Err(AppError::not_found("film", film_id));
        }
        Ok(())
    }

    async fn check_user(&self, user_id: i64) -> AppResult<()> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::not_found("user", user_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::db::{
        MockDirectorStorage, MockEventStorage, MockFilmStorage, MockGenreStorage, MockMpaStorage,
        MockUserStorage,
    };
    use crate::models::{Genre, Mpa};

    fn service(
        films: MockFilmStorage,
        users: MockUserStorage,
        genres: MockGenreStorage,
        mpa: MockMpaStorage,
        directors: MockDirectorStorage,
        events: MockEventStorage,
    ) -> FilmService {
        FilmService::new(
            Arc::new(films),
            Arc::new(users),
            Arc::new(genres),
            Arc::new(mpa),
            Arc::new(directors),
            Arc::new(events),
        )
    }

    fn sample_film() -> Film {
        Film {
            id: 0,
            name: "Alien".to_string(),
            description: String::new(),
            release_date: NaiveDate::from_ymd_opt(1979, 5, 25).unwrap(),
            duration: 117,
            mpa: None,
            genres: BTreeSet::new(),
            directors: BTreeSet::new(),
            likes: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_like_checks_film_before_user() {
        let mut films = MockFilmStorage::new();
        films
            .expect_exists()
            .with(eq(3))
            .returning(|_| Ok(false));
        let mut users = MockUserStorage::new();
        users.expect_exists().times(0);
        let mut events = MockEventStorage::new();
        events.expect_add().times(0);
        let svc = service(
            films,
            users,
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            events,
        );

        let err = svc.like(3, 7).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains("film 3"));
    }

    #[tokio::test]
    async fn test_like_unknown_user_writes_nothing() {
        let mut films = MockFilmStorage::new();
        films.expect_exists().returning(|_| Ok(true));
        films.expect_like().times(0);
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(false));
        let mut events = MockEventStorage::new();
        events.expect_add().times(0);
        let svc = service(
            films,
            users,
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            events,
        );

        let err = svc.like(3, 7).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(err.to_string().contains("user 7"));
    }

    #[tokio::test]
    async fn test_like_appends_feed_event() {
        let mut films = MockFilmStorage::new();
        films.expect_exists().returning(|_| Ok(true));
        films
            .expect_like()
            .with(eq(3), eq(7))
            .returning(|_, _| Ok(()));
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(true));
        let mut events = MockEventStorage::new();
        events
            .expect_add()
            .withf(|event| {
                event.user_id == 7
                    && event.event_type == EventType::Like
                    && event.operation == EventOperation::Add
                    && event.entity_id == 3
            })
            .returning(Ok);
        let svc = service(
            films,
            users,
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            events,
        );

        svc.like(3, 7).await.unwrap();
    }

    #[tokio::test]
    async fn test_unlike_always_appends_remove_event() {
        let mut films = MockFilmStorage::new();
        films.expect_exists().returning(|_| Ok(true));
        films.expect_unlike().returning(|_, _| Ok(()));
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(true));
        let mut events = MockEventStorage::new();
        events
            .expect_add()
            .withf(|event| event.operation == EventOperation::Remove)
            .times(1)
            .returning(Ok);
        let svc = service(
            films,
            users,
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            events,
        );

        svc.unlike(3, 7).await.unwrap();
    }

    #[tokio::test]
    async fn test_top_films_non_positive_count_is_empty() {
        let mut films = MockFilmStorage::new();
        films.expect_top_films().times(0);
        let svc = service(
            films,
            MockUserStorage::new(),
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            MockEventStorage::new(),
        );

        assert!(svc.top_films(0, None, None).await.unwrap().is_empty());
        assert!(svc.top_films(-3, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_director_films_unknown_sort_key_is_validation() {
        let mut directors = MockDirectorStorage::new();
        directors.expect_exists().returning(|_| Ok(true));
        let svc = service(
            MockFilmStorage::new(),
            MockUserStorage::new(),
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            directors,
            MockEventStorage::new(),
        );

        let err = svc.director_films(1, "rating").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_director_films_checks_director_before_sort_key() {
        let mut directors = MockDirectorStorage::new();
        directors.expect_exists().returning(|_| Ok(false));
        let svc = service(
            MockFilmStorage::new(),
            MockUserStorage::new(),
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            directors,
            MockEventStorage::new(),
        );

        let err = svc.director_films(9, "rating").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_search_unknown_key_is_validation() {
        let svc = service(
            MockFilmStorage::new(),
            MockUserStorage::new(),
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            MockEventStorage::new(),
        );

        let err = svc.search("alien", "genre").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_accepts_both_combined_orders() {
        let mut films = MockFilmStorage::new();
        films
            .expect_search_by_title_or_director()
            .times(2)
            .returning(|_| Ok(Vec::new()));
        let svc = service(
            films,
            MockUserStorage::new(),
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            MockEventStorage::new(),
        );

        svc.search("alien", "title,director").await.unwrap();
        svc.search("alien", "director,title").await.unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_pre_cinema_release_date() {
        let mut films = MockFilmStorage::new();
        films.expect_add().times(0);
        let svc = service(
            films,
            MockUserStorage::new(),
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            MockEventStorage::new(),
        );

        let mut film = sample_film();
        film.release_date = NaiveDate::from_ymd_opt(1895, 12, 27).unwrap();
        let err = svc.create(film).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_resolves_reference_names() {
        let mut films = MockFilmStorage::new();
        films.expect_add().returning(|mut film: Film| {
            film.id = 1;
            Ok(film)
        });
        let mut genres = MockGenreStorage::new();
        genres.expect_get().with(eq(2)).returning(|_| {
            Ok(Genre {
                id: 2,
                name: "Drama".to_string(),
            })
        });
        let mut mpa = MockMpaStorage::new();
        mpa.expect_get().with(eq(4)).returning(|_| {
            Ok(Mpa {
                id: 4,
                name: "R".to_string(),
            })
        });
        let svc = service(
            films,
            MockUserStorage::new(),
            genres,
            mpa,
            MockDirectorStorage::new(),
            MockEventStorage::new(),
        );

        let mut film = sample_film();
        film.mpa = Some(Mpa {
            id: 4,
            name: String::new(),
        });
        film.genres.insert(Genre {
            id: 2,
            name: "wrong".to_string(),
        });
        let created = svc.create(film).await.unwrap();
        assert_eq!(created.mpa.unwrap().name, "R");
        assert_eq!(created.genres.iter().next().unwrap().name, "Drama");
    }

    #[tokio::test]
    async fn test_create_unknown_genre_is_validation() {
        let mut films = MockFilmStorage::new();
        films.expect_add().times(0);
        let mut genres = MockGenreStorage::new();
        genres
            .expect_get()
            .with(eq(99))
            .returning(|id| Err(AppError::not_found("genre", id)));
        let svc = service(
            films,
            MockUserStorage::new(),
            genres,
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            MockEventStorage::new(),
        );

        let mut film = sample_film();
        film.genres.insert(Genre {
            id: 99,
            name: String::new(),
        });
        let err = svc.create(film).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_film_is_not_found() {
        let mut films = MockFilmStorage::new();
        films.expect_exists().with(eq(8)).returning(|_| Ok(false));
        films.expect_update().times(0);
        let svc = service(
            films,
            MockUserStorage::new(),
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            MockEventStorage::new(),
        );

        let mut film = sample_film();
        film.id = 8;
        let err = svc.update(film).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_common_films_checks_both_users_in_order() {
        let mut users = MockUserStorage::new();
        users.expect_exists().with(eq(1)).returning(|_| Ok(true));
        users.expect_exists().with(eq(2)).returning(|_| Ok(false));
        let mut films = MockFilmStorage::new();
        films.expect_common_films().times(0);
        let svc = service(
            films,
            users,
            MockGenreStorage::new(),
            MockMpaStorage::new(),
            MockDirectorStorage::new(),
            MockEventStorage::new(),
        );

        let err = svc.common_films(1, 2).await.unwrap_err();
        assert!(err.to_string().contains("user 2"));
    }
}
