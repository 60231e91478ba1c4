use std::sync::Arc;

use crate::db::{EventStorage, FilmStorage, UserStorage};
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventOperation, EventType, Film, User};

/// User accounts, the friendship graph, the activity feed, and the
/// taste-overlap recommendations built on top of them.
pub struct UserService {
    users: Arc<dyn UserStorage>,
    films: Arc<dyn FilmStorage>,
    events: Arc<dyn EventStorage>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStorage>,
        films: Arc<dyn FilmStorage>,
        events: Arc<dyn EventStorage>,
    ) -> Self {
        Self {
            users,
            films,
            events,
        }
    }

    pub async fn create(&self, mut user: User) -> AppResult<User> {
        fallback_name(&mut user);
        let user = self.users.add(user).await?;
        tracing::info!(user_id = user.id, login = %user.login, "user created");
        Ok(user)
    }

    pub async fn update(&self, mut user: User) -> AppResult<User> {
        if !self.users.exists(user.id).await? {
            return Err(AppError::not_found("user", user.id));
        }
        fallback_name(&mut user);
        let id = user.id;
        self.users.update(user).await?;
        self.users.get(id).await
    }

    pub async fn get(&self, id: i64) -> AppResult<User> {
        self.users.get(id).await
    }

    pub async fn get_all(&self) -> AppResult<Vec<User>> {
        self.users.get_all().await
    }

    /// Removes the account and returns its last state. Likes, friendship
    /// edges, and authored feed entries go with it.
    pub async fn delete(&self, id: i64) -> AppResult<User> {
        let user = self.users.get(id).await?;
        self.users.delete(id).await?;
        tracing::info!(user_id = id, "user deleted");
        Ok(user)
    }

    /// Adds a one-way friendship edge and records it in the feed. Repeating
    /// the request re-appends the event even though the edge is unchanged.
    pub async fn add_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        self.check_user(user_id).await?;
        self.check_user(friend_id).await?;
        self.users.add_friend(user_id, friend_id).await?;
        self.events
            .add(Event::new(
                user_id,
                EventType::Friend,
                EventOperation::Add,
                friend_id,
            ))
            .await?;
        Ok(())
    }

    pub async fn remove_friend(&self, user_id: i64, friend_id: i64) -> AppResult<()> {
        self.check_user(user_id).await?;
        self.check_user(friend_id).await?;
        self.users.remove_friend(user_id, friend_id).await?;
        self.events
            .add(Event::new(
                user_id,
                EventType::Friend,
                EventOperation::Remove,
                friend_id,
            ))
            .await?;
        Ok(())
    }

    pub async fn friends(&self, user_id: i64) -> AppResult<Vec<User>> {
        self.check_user(user_id).await?;
        self.users.friends(user_id).await
    }

    pub async fn common_friends(&self, user_id: i64, other_id: i64) -> AppResult<Vec<User>> {
        self.check_user(user_id).await?;
        self.check_user(other_id).await?;
        self.users.common_friends(user_id, other_id).await
    }

    pub async fn feed(&self, user_id: i64) -> AppResult<Vec<Event>> {
        self.check_user(user_id).await?;
        self.events.feed(user_id).await
    }

    /// Collaborative filtering over the like graph: take the users whose
    /// liked sets overlap this one's the most, then pull the films they
    /// liked that this user has not, best-liked first, up to five. An
    /// unknown user simply has no peers and gets an empty list.
    pub async fn recommendations(&self, user_id: i64) -> AppResult<Vec<Film>> {
        let peers = self.users.users_with_similar_likes(user_id).await?;
        let mut recommended: Vec<Film> = Vec::new();
        for peer_id in peers {
            let candidates = self.films.liked_by_peer_not_user(peer_id, user_id).await?;
            for film in candidates {
                if recommended.iter().any(|known| known.id == film.id) {
                    continue;
                }
                recommended.push(film);
                if recommended.len() == 5 {
                    return Ok(recommended);
                }
            }
        }
        Ok(recommended)
    }

    async fn check_user(&self, user_id: i64) -> AppResult<()> {
        if !self.users.exists(user_id).await? {
            return Err(AppError::not_found("user", user_id));
        }
        Ok(())
    }
}

/// A blank display name falls back to the login.
fn fallback_name(user: &mut User) {
    if user.name.trim().is_empty() {
        tracing::debug!(login = %user.login, "empty name replaced with login");
        user.name = user.login.clone();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;
    use mockall::predicate::eq;

    use super::*;
    use crate::db::{MockEventStorage, MockFilmStorage, MockUserStorage};

    fn service(
        users: MockUserStorage,
        films: MockFilmStorage,
        events: MockEventStorage,
    ) -> UserService {
        UserService::new(Arc::new(users), Arc::new(films), Arc::new(events))
    }

    fn sample_user(name: &str) -> User {
        User {
            id: 0,
            email: "ripley@nostromo.example".to_string(),
            login: "ripley".to_string(),
            name: name.to_string(),
            birthday: NaiveDate::from_ymd_opt(1979, 5, 25).unwrap(),
            friends: BTreeSet::new(),
        }
    }

    fn film(id: i64) -> Film {
        Film {
            id,
            name: format!("film-{id}"),
            description: String::new(),
            release_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            duration: 90,
            mpa: None,
            genres: BTreeSet::new(),
            directors: BTreeSet::new(),
            likes: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_create_replaces_blank_name_with_login() {
        let mut users = MockUserStorage::new();
        users
            .expect_add()
            .withf(|user| user.name == "ripley")
            .returning(|mut user: User| {
                user.id = 1;
                Ok(user)
            });
        let svc = service(users, MockFilmStorage::new(), MockEventStorage::new());

        let created = svc.create(sample_user("   ")).await.unwrap();
        assert_eq!(created.name, "ripley");
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_name() {
        let mut users = MockUserStorage::new();
        users
            .expect_add()
            .withf(|user| user.name == "Ellen Ripley")
            .returning(|mut user: User| {
                user.id = 1;
                Ok(user)
            });
        let svc = service(users, MockFilmStorage::new(), MockEventStorage::new());

        svc.create(sample_user("Ellen Ripley")).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_friend_appends_feed_event() {
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(true));
        users
            .expect_add_friend()
            .with(eq(1), eq(2))
            .returning(|_, _| Ok(()));
        let mut events = MockEventStorage::new();
        events
            .expect_add()
            .withf(|event| {
                event.user_id == 1
                    && event.event_type == EventType::Friend
                    && event.operation == EventOperation::Add
                    && event.entity_id == 2
            })
            .returning(Ok);
        let svc = service(users, MockFilmStorage::new(), events);

        svc.add_friend(1, 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_friend_checks_the_requester_first() {
        let mut users = MockUserStorage::new();
        users.expect_exists().with(eq(1)).returning(|_| Ok(false));
        users.expect_add_friend().times(0);
        let mut events = MockEventStorage::new();
        events.expect_add().times(0);
        let svc = service(users, MockFilmStorage::new(), events);

        let err = svc.add_friend(1, 2).await.unwrap_err();
        assert!(err.to_string().contains("user 1"));
    }

    #[tokio::test]
    async fn test_remove_friend_unknown_friend_writes_no_event() {
        let mut users = MockUserStorage::new();
        users.expect_exists().with(eq(1)).returning(|_| Ok(true));
        users.expect_exists().with(eq(2)).returning(|_| Ok(false));
        users.expect_remove_friend().times(0);
        let mut events = MockEventStorage::new();
        events.expect_add().times(0);
        let svc = service(users, MockFilmStorage::new(), events);

        let err = svc.remove_friend(1, 2).await.unwrap_err();
        assert!(err.to_string().contains("user 2"));
    }

    #[tokio::test]
    async fn test_recommendations_walk_peers_in_rank_order() {
        let mut users = MockUserStorage::new();
        users
            .expect_users_with_similar_likes()
            .with(eq(1))
            .returning(|_| Ok(vec![2, 3]));
        let mut films = MockFilmStorage::new();
        films
            .expect_liked_by_peer_not_user()
            .with(eq(2), eq(1))
            .returning(|_, _| Ok(vec![film(4)]));
        films
            .expect_liked_by_peer_not_user()
            .with(eq(3), eq(1))
            .returning(|_, _| Ok(vec![film(5)]));
        let svc = service(users, films, MockEventStorage::new());

        let recommended = svc.recommendations(1).await.unwrap();
        let ids: Vec<i64> = recommended.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_recommendations_deduplicate_across_peers() {
        let mut users = MockUserStorage::new();
        users
            .expect_users_with_similar_likes()
            .returning(|_| Ok(vec![2, 3]));
        let mut films = MockFilmStorage::new();
        films
            .expect_liked_by_peer_not_user()
            .with(eq(2), eq(1))
            .returning(|_, _| Ok(vec![film(4), film(6)]));
        films
            .expect_liked_by_peer_not_user()
            .with(eq(3), eq(1))
            .returning(|_, _| Ok(vec![film(6), film(7)]));
        let svc = service(users, films, MockEventStorage::new());

        let recommended = svc.recommendations(1).await.unwrap();
        let ids: Vec<i64> = recommended.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![4, 6, 7]);
    }

    #[tokio::test]
    async fn test_recommendations_stop_at_five_films() {
        let mut users = MockUserStorage::new();
        users
            .expect_users_with_similar_likes()
            .returning(|_| Ok(vec![2, 3]));
        let mut films = MockFilmStorage::new();
        films
            .expect_liked_by_peer_not_user()
            .with(eq(2), eq(1))
            .returning(|_, _| Ok(vec![film(10), film(11), film(12), film(13), film(14)]));
        films
            .expect_liked_by_peer_not_user()
            .with(eq(3), eq(1))
            .times(0)
            .returning(|_, _| Ok(Vec::new()));
        let svc = service(users, films, MockEventStorage::new());

        let recommended = svc.recommendations(1).await.unwrap();
        assert_eq!(recommended.len(), 5);
    }

    #[tokio::test]
    async fn test_recommendations_without_peers_are_empty() {
        let mut users = MockUserStorage::new();
        users
            .expect_users_with_similar_likes()
            .returning(|_| Ok(Vec::new()));
        let svc = service(users, MockFilmStorage::new(), MockEventStorage::new());

        assert!(svc.recommendations(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feed_unknown_user_is_not_found() {
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(false));
        let mut events = MockEventStorage::new();
        events.expect_feed().times(0);
        let svc = service(users, MockFilmStorage::new(), events);

        let err = svc.feed(9).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_not_found() {
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(false));
        users.expect_update().times(0);
        let svc = service(users, MockFilmStorage::new(), MockEventStorage::new());

        let mut user = sample_user("Ellen");
        user.id = 9;
        let err = svc.update(user).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
