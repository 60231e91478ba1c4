use std::sync::Arc;

use crate::db::{EventStorage, FilmStorage, ReviewStorage, UserStorage};
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventOperation, EventType, Review};

/// Film reviews and the usefulness votes cast on them. Review writes are
/// mirrored into the activity feed; votes are not.
pub struct ReviewService {
    reviews: Arc<dyn ReviewStorage>,
    films: Arc<dyn FilmStorage>,
    users: Arc<dyn UserStorage>,
    events: Arc<dyn EventStorage>,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewStorage>,
        films: Arc<dyn FilmStorage>,
        users: Arc<dyn UserStorage>,
        events: Arc<dyn EventStorage>,
    ) -> Self {
        Self {
            reviews,
            films,
            users,
            events,
        }
    }

    pub async fn create(&self, review: Review) -> AppResult<Review> {
        self.check_user(review.user_id).await?;
        self.check_film(review.film_id).await?;
        let review = self.reviews.add(review).await?;
        self.events
            .add(Event::new(
                review.user_id,
                EventType::Review,
                EventOperation::Add,
                review.id,
            ))
            .await?;
        tracing::info!(review_id = review.id, film_id = review.film_id, "review created");
        Ok(review)
    }

    /// Full-payload replace. The feed entry is attributed to the author
    /// named in the payload.
    pub async fn update(&self, review: Review) -> AppResult<Review> {
        if !self.reviews.exists(review.id).await? {
            return Err(AppError::not_found("review", review.id));
        }
        self.check_user(review.user_id).await?;
        let id = review.id;
        let user_id = review.user_id;
        self.reviews.update(review).await?;
        self.events
            .add(Event::new(
                user_id,
                EventType::Review,
                EventOperation::Update,
                id,
            ))
            .await?;
        self.reviews.get(id).await
    }

    /// Removes the review and returns its last state. The feed entry is
    /// attributed to the stored author, not the caller.
    pub async fn delete(&self, id: i64) -> AppResult<Review> {
        let review = self.reviews.get(id).await?;
        self.reviews.delete(id).await?;
        self.events
            .add(Event::new(
                review.user_id,
                EventType::Review,
                EventOperation::Remove,
                id,
            ))
            .await?;
        tracing::info!(review_id = id, "review deleted");
        Ok(review)
    }

    pub async fn get(&self, id: i64) -> AppResult<Review> {
        self.reviews.get(id).await
    }

    /// Reviews for one film, or for all films when no filter is given, most
    /// useful first.
    pub async fn get_many(&self, film_id: Option<i64>, count: i64) -> AppResult<Vec<Review>> {
        if let Some(film_id) = film_id {
            self.check_film(film_id).await?;
        }
        self.reviews.get_many(film_id, count.max(0)).await
    }

    pub async fn like(&self, review_id: i64, user_id: i64) -> AppResult<()> {
        self.vote(review_id, user_id, Review::like).await
    }

    pub async fn dislike(&self, review_id: i64, user_id: i64) -> AppResult<()> {
        self.vote(review_id, user_id, Review::dislike).await
    }

    pub async fn remove_like(&self, review_id: i64, user_id: i64) -> AppResult<()> {
        self.vote(review_id, user_id, Review::remove_like).await
    }

    pub async fn remove_dislike(&self, review_id: i64, user_id: i64) -> AppResult<()> {
        self.vote(review_id, user_id, Review::remove_dislike).await
    }

    /// Applies one usefulness adjustment. Checks the review first, then the
    /// voter; the vote itself never reaches the feed.
    async fn vote(
        &self,
        review_id: i64,
        user_id: i64,
        adjust: fn(&mut Review),
    ) -> AppResult<()> {
        let mut review = self.reviews.get(review_id).await?;
        self.check_user(user_id).await?;
        adjust(&mut review);
        self.reviews.update(review).await
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
    use crate::db::{MockEventStorage, MockFilmStorage, MockReviewStorage, MockUserStorage};

    fn service(
        reviews: MockReviewStorage,
        films: MockFilmStorage,
        users: MockUserStorage,
        events: MockEventStorage,
    ) -> ReviewService {
        ReviewService::new(
            Arc::new(reviews),
            Arc::new(films),
            Arc::new(users),
            Arc::new(events),
        )
    }

    fn sample_review() -> Review {
        Review {
            id: 0,
            content: "Tense and sparse.".to_string(),
            is_positive: true,
            user_id: 1,
            film_id: 2,
            useful: 0,
        }
    }

    #[tokio::test]
    async fn test_create_checks_author_before_film() {
        let mut users = MockUserStorage::new();
        users.expect_exists().with(eq(1)).returning(|_| Ok(false));
        let mut films = MockFilmStorage::new();
        films.expect_exists().times(0);
        let mut reviews = MockReviewStorage::new();
        reviews.expect_add().times(0);
        let svc = service(reviews, films, users, MockEventStorage::new());

        let err = svc.create(sample_review()).await.unwrap_err();
        assert!(err.to_string().contains("user 1"));
    }

    #[tokio::test]
    async fn test_create_event_carries_the_assigned_id() {
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(true));
        let mut films = MockFilmStorage::new();
        films.expect_exists().returning(|_| Ok(true));
        let mut reviews = MockReviewStorage::new();
        reviews.expect_add().returning(|mut review: Review| {
            review.id = 17;
            Ok(review)
        });
        let mut events = MockEventStorage::new();
        events
            .expect_add()
            .withf(|event| {
                event.user_id == 1
                    && event.event_type == EventType::Review
                    && event.operation == EventOperation::Add
                    && event.entity_id == 17
            })
            .returning(Ok);
        let svc = service(reviews, films, users, events);

        let created = svc.create(sample_review()).await.unwrap();
        assert_eq!(created.id, 17);
    }

    #[tokio::test]
    async fn test_delete_event_names_the_stored_author() {
        let mut reviews = MockReviewStorage::new();
        reviews.expect_get().with(eq(17)).returning(|id| {
            let mut review = sample_review();
            review.id = id;
            review.user_id = 9;
            Ok(review)
        });
        reviews.expect_delete().with(eq(17)).returning(|_| Ok(()));
        let mut events = MockEventStorage::new();
        events
            .expect_add()
            .withf(|event| {
                event.user_id == 9
                    && event.operation == EventOperation::Remove
                    && event.entity_id == 17
            })
            .returning(Ok);
        let svc = service(
            reviews,
            MockFilmStorage::new(),
            MockUserStorage::new(),
            events,
        );

        let deleted = svc.delete(17).await.unwrap();
        assert_eq!(deleted.user_id, 9);
    }

    #[tokio::test]
    async fn test_like_increments_usefulness() {
        let mut reviews = MockReviewStorage::new();
        reviews.expect_get().returning(|id| {
            let mut review = sample_review();
            review.id = id;
            review.useful = 3;
            Ok(review)
        });
        reviews
            .expect_update()
            .withf(|review| review.useful == 4)
            .returning(|_| Ok(()));
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(true));
        let svc = service(
            reviews,
            MockFilmStorage::new(),
            users,
            MockEventStorage::new(),
        );

        svc.like(5, 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_dislike_decrements_usefulness() {
        let mut reviews = MockReviewStorage::new();
        reviews.expect_get().returning(|id| {
            let mut review = sample_review();
            review.id = id;
            Ok(review)
        });
        reviews
            .expect_update()
            .withf(|review| review.useful == -1)
            .returning(|_| Ok(()));
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(true));
        let svc = service(
            reviews,
            MockFilmStorage::new(),
            users,
            MockEventStorage::new(),
        );

        svc.dislike(5, 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_vote_checks_review_before_voter() {
        let mut reviews = MockReviewStorage::new();
        reviews
            .expect_get()
            .with(eq(5))
            .returning(|id| Err(AppError::not_found("review", id)));
        reviews.expect_update().times(0);
        let mut users = MockUserStorage::new();
        users.expect_exists().times(0);
        let svc = service(
            reviews,
            MockFilmStorage::new(),
            users,
            MockEventStorage::new(),
        );

        let err = svc.like(5, 1).await.unwrap_err();
        assert!(err.to_string().contains("review 5"));
    }

    #[tokio::test]
    async fn test_vote_unknown_voter_leaves_review_untouched() {
        let mut reviews = MockReviewStorage::new();
        reviews.expect_get().returning(|id| {
            let mut review = sample_review();
            review.id = id;
            Ok(review)
        });
        reviews.expect_update().times(0);
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(false));
        let svc = service(
            reviews,
            MockFilmStorage::new(),
            users,
            MockEventStorage::new(),
        );

        let err = svc.like(5, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_event_names_the_payload_author() {
        let mut reviews = MockReviewStorage::new();
        reviews.expect_exists().returning(|_| Ok(true));
        reviews.expect_update().returning(|_| Ok(()));
        reviews.expect_get().returning(|id| {
            let mut review = sample_review();
            review.id = id;
            Ok(review)
        });
        let mut users = MockUserStorage::new();
        users.expect_exists().returning(|_| Ok(true));
        let mut events = MockEventStorage::new();
        events
            .expect_add()
            .withf(|event| {
                event.user_id == 1
                    && event.operation == EventOperation::Update
                    && event.entity_id == 12
            })
            .returning(Ok);
        let svc = service(reviews, MockFilmStorage::new(), users, events);

        let mut review = sample_review();
        review.id = 12;
        svc.update(review).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_many_unknown_film_is_not_found() {
        let mut films = MockFilmStorage::new();
        films.expect_exists().returning(|_| Ok(false));
        let mut reviews = MockReviewStorage::new();
        reviews.expect_get_many().times(0);
        let svc = service(
            reviews,
            films,
            MockUserStorage::new(),
            MockEventStorage::new(),
        );

        let err = svc.get_many(Some(8), 10).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_many_clamps_negative_count() {
        let mut reviews = MockReviewStorage::new();
        reviews
            .expect_get_many()
            .with(eq(None), eq(0))
            .returning(|_, _| Ok(Vec::new()));
        let svc = service(
            reviews,
            MockFilmStorage::new(),
            MockUserStorage::new(),
            MockEventStorage::new(),
        );

        assert!(svc.get_many(None, -4).await.unwrap().is_empty());
    }
}
