//! Reviews and the tour rating aggregates derived from them.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::application::services::ResourceService;
use crate::application::services::populate::populate_users;
use crate::domain::document::FieldPath;
use crate::domain::entities::{DEFAULT_RATINGS_AVERAGE, NewReview, Review, ReviewPatch, Role, Tour, User};
use crate::domain::pipeline::{Accumulator, Group, GroupKey, Pipeline, Stage};
use crate::domain::query::{Filter, QueryParams};
use crate::domain::repositories::Collection;
use crate::error::AppError;

/// Fields of the author embedded in review responses.
const AUTHOR_FIELDS: &[&str] = &["name", "photo"];

/// Service for reviews.
///
/// Every write is followed by [`ReviewService::recompute_ratings`] for the
/// affected tour. The recompute is a separate write and is not atomic with
/// the review change.
#[derive(Clone)]
pub struct ReviewService {
    reviews: ResourceService<Review>,
    tours: Collection<Tour>,
    users: Collection<User>,
}

impl ReviewService {
    pub fn new(reviews: Collection<Review>, tours: Collection<Tour>, users: Collection<User>) -> Self {
        Self {
            reviews: ResourceService::new(reviews),
            tours,
            users,
        }
    }

    /// Lists reviews, optionally only those of one tour, with authors embedded.
    pub async fn find_many(
        &self,
        params: &QueryParams,
        tour: Option<Uuid>,
    ) -> Result<Vec<Value>, AppError> {
        let parent = match tour {
            Some(tour) => Filter::new().eq("tour", tour.to_string()),
            None => Filter::new(),
        };

        let mut docs = self.reviews.find_many(params, parent).await?;
        populate_users(&mut docs, "user", &self.users, AUTHOR_FIELDS).await?;
        Ok(docs)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Value, AppError> {
        let review = self.reviews.find_by_id(id).await?;
        self.present(&review).await
    }

    /// Reviews of `tour` shaped for the tour detail response.
    pub async fn for_tour(&self, tour: Uuid) -> Result<Vec<Value>, AppError> {
        let reviews = self
            .reviews
            .collection()
            .find_all(Filter::new().eq("tour", tour.to_string()))
            .await?;

        let mut docs = reviews
            .iter()
            .map(ResourceService::present)
            .collect::<Result<Vec<_>, _>>()?;
        populate_users(&mut docs, "user", &self.users, AUTHOR_FIELDS).await?;
        Ok(docs)
    }

    /// Creates a review by `author`.
    ///
    /// `tour` defaults to `route_tour` when the payload leaves it out. Only an
    /// admin may name another `user`; everyone else always writes as
    /// themselves.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the tour does not exist
    /// - [`AppError::Validation`] if the user already reviewed this tour
    pub async fn create(
        &self,
        mut input: NewReview,
        route_tour: Option<Uuid>,
        author: &User,
    ) -> Result<Value, AppError> {
        if input.tour.is_none() {
            input.tour = route_tour;
        }
        if author.role != Role::Admin || input.user.is_none() {
            input.user = Some(author.id);
        }

        if let Some(tour) = input.tour
            && self.tours.find_by_id(tour).await?.is_none()
        {
            return Err(AppError::not_found("No tour found with that ID"));
        }

        let review = self.reviews.create(input).await?;
        self.recompute_ratings(review.tour).await?;

        tracing::info!(review = %review.id, tour = %review.tour, "Review created");
        self.present(&review).await
    }

    /// Updates a review. Only its author or an admin may do this.
    pub async fn update(&self, id: Uuid, patch: ReviewPatch, actor: &User) -> Result<Value, AppError> {
        let existing = self.reviews.find_by_id(id).await?;
        ensure_can_modify(&existing, actor)?;

        let review = self.reviews.update_by_id(id, patch).await?;
        self.recompute_ratings(review.tour).await?;
        self.present(&review).await
    }

    /// Deletes a review. Only its author or an admin may do this.
    pub async fn delete(&self, id: Uuid, actor: &User) -> Result<(), AppError> {
        let existing = self.reviews.find_by_id(id).await?;
        ensure_can_modify(&existing, actor)?;

        let review = self.reviews.delete_by_id(id).await?;
        self.recompute_ratings(review.tour).await?;

        tracing::info!(review = %id, tour = %review.tour, "Review deleted");
        Ok(())
    }

    /// Writes the count and mean rating of `tour`'s reviews onto the tour.
    /// With no reviews left the tour falls back to 4.0 and 0.
    pub async fn recompute_ratings(&self, tour: Uuid) -> Result<(), AppError> {
        let pipeline = Pipeline::new()
            .stage(Stage::Match(Filter::new().eq("tour", tour.to_string())))
            .stage(Stage::Group(Group {
                key: GroupKey::All,
                key_as: "tour".to_string(),
                fields: vec![
                    ("nRating".to_string(), Accumulator::Count),
                    ("avgRating".to_string(), Accumulator::Avg(FieldPath::new("rating"))),
                ],
            }));

        let stats = self.reviews.collection().aggregate(pipeline).await?;
        let (quantity, average) = match stats.first() {
            Some(stats) => (
                stats["nRating"].as_u64().unwrap_or(0),
                stats["avgRating"].as_f64().unwrap_or(DEFAULT_RATINGS_AVERAGE),
            ),
            None => (0, DEFAULT_RATINGS_AVERAGE),
        };

        let mut changes = Map::new();
        changes.insert("ratingsQuantity".to_string(), json!(quantity));
        changes.insert("ratingsAverage".to_string(), json!(average));
        self.tours.update_by_id(tour, changes).await?;

        tracing::debug!(tour = %tour, quantity, average, "Tour ratings recomputed");
        Ok(())
    }

    async fn present(&self, review: &Review) -> Result<Value, AppError> {
        let mut docs = vec![ResourceService::present(review)?];
        populate_users(&mut docs, "user", &self.users, AUTHOR_FIELDS).await?;
        Ok(docs.pop().unwrap_or(Value::Null))
    }
}

fn ensure_can_modify(review: &Review, actor: &User) -> Result<(), AppError> {
    if review.user == actor.id || actor.role == Role::Admin {
        Ok(())
    } else {
        Err(AppError::forbidden("You can only modify your own reviews"))
    }
}
