//! Review entity. One review per user per tour.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::domain::document::{CollectionSpec, Document, Resource};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub review: String,
    pub rating: u8,
    pub tour: Uuid,
    pub user: Uuid,
    #[serde(with = "crate::domain::document::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Review payload. `tour` and `user` are usually filled from the route and
/// the authenticated principal.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    #[validate(length(min = 1, message = "Review can not be empty"))]
    pub review: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    pub tour: Option<Uuid>,
    pub user: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPatch {
    #[validate(length(min = 1, message = "Review can not be empty"))]
    pub review: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<u8>,
}

impl Document for Review {
    const COLLECTION: CollectionSpec = CollectionSpec {
        name: "reviews",
        unique_keys: &[&["tour", "user"]],
    };
    const LABEL: &'static str = "review";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Resource for Review {
    type Create = NewReview;
    type Update = ReviewPatch;

    fn create(input: NewReview, id: Uuid, now: DateTime<Utc>) -> Result<Self, AppError> {
        let tour = input
            .tour
            .ok_or_else(|| AppError::bad_request("Review must belong to a tour", Value::Null))?;
        let user = input
            .user
            .ok_or_else(|| AppError::bad_request("Review must belong to a user", Value::Null))?;

        Ok(Self {
            id,
            review: input.review.trim().to_string(),
            rating: input.rating,
            tour,
            user,
            created_at: now,
        })
    }

    fn apply(&mut self, patch: ReviewPatch) -> Result<(), AppError> {
        if let Some(review) = patch.review {
            self.review = review.trim().to_string();
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        Ok(())
    }
}
