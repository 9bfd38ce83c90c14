//! Tour entity with its embedded locations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::document::{CollectionSpec, Document, Resource};
use crate::domain::query::Filter;
use crate::error::AppError;
use crate::utils::validation::{validate_coordinates, validate_tour_name};

/// Rating shown for tours without reviews.
pub const DEFAULT_RATINGS_AVERAGE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    #[default]
    Point,
}

/// A GeoJSON point with an optional description. Waypoints carry the tour `day`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "type", default)]
    pub kind: PointKind,
    #[validate(custom(function = "validate_coordinates"))]
    pub coordinates: [f64; 2],
    pub address: Option<String>,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    pub duration: u32,
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    #[serde(default = "default_ratings_average")]
    pub ratings_average: f64,
    #[serde(default)]
    pub ratings_quantity: u64,
    pub price: f64,
    pub price_discount: Option<f64>,
    pub summary: String,
    pub description: Option<String>,
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub secret_tour: bool,
    pub start_location: Option<Location>,
    #[serde(default)]
    pub locations: Vec<Location>,
    /// Ids of the users guiding this tour.
    #[serde(default)]
    pub guides: Vec<Uuid>,
    #[serde(with = "crate::domain::document::timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_ratings_average() -> f64 {
    DEFAULT_RATINGS_AVERAGE
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_new_tour_discount"))]
pub struct NewTour {
    #[validate(
        length(min = 10, max = 40, message = "A tour name must have between 10 and 40 characters"),
        custom(function = "validate_tour_name")
    )]
    pub name: String,
    #[validate(range(min = 1, message = "A tour must have a duration"))]
    pub duration: u32,
    #[validate(range(min = 1, message = "A tour must have a group size"))]
    pub max_group_size: u32,
    pub difficulty: Difficulty,
    #[validate(range(exclusive_min = 0.0, message = "A tour must have a positive price"))]
    pub price: f64,
    pub price_discount: Option<f64>,
    #[validate(length(min = 1, message = "A tour must have a summary"))]
    pub summary: String,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "A tour must have a cover image"))]
    pub image_cover: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub start_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub secret_tour: bool,
    #[validate(nested)]
    pub start_location: Option<Location>,
    #[serde(default)]
    #[validate(nested)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub guides: Vec<Uuid>,
}

fn validate_new_tour_discount(tour: &NewTour) -> Result<(), ValidationError> {
    match tour.price_discount {
        Some(discount) if discount >= tour.price => Err(discount_error()),
        _ => Ok(()),
    }
}

fn discount_error() -> ValidationError {
    ValidationError::new("price_discount")
        .with_message("Discount price should be below the regular price".into())
}

/// Partial update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TourPatch {
    #[validate(
        length(min = 10, max = 40, message = "A tour name must have between 10 and 40 characters"),
        custom(function = "validate_tour_name")
    )]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "A tour must have a duration"))]
    pub duration: Option<u32>,
    #[validate(range(min = 1, message = "A tour must have a group size"))]
    pub max_group_size: Option<u32>,
    pub difficulty: Option<Difficulty>,
    #[validate(range(exclusive_min = 0.0, message = "A tour must have a positive price"))]
    pub price: Option<f64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub price_discount: Option<Option<f64>>,
    #[validate(length(min = 1, message = "A tour must have a summary"))]
    pub summary: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    pub image_cover: Option<String>,
    pub images: Option<Vec<String>>,
    pub start_dates: Option<Vec<DateTime<Utc>>>,
    pub secret_tour: Option<bool>,
    #[validate(nested)]
    pub start_location: Option<Location>,
    #[validate(nested)]
    pub locations: Option<Vec<Location>>,
    pub guides: Option<Vec<Uuid>>,
}

/// URL slug derived from a tour name: `"The Sea Explorer"` becomes `"the-sea-explorer"`.
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

impl Tour {
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    fn check_discount(&self) -> Result<(), AppError> {
        match self.price_discount {
            Some(discount) if discount >= self.price => Err(AppError::bad_request(
                format!(
                    "Discount price ({discount}) should be below the regular price ({})",
                    self.price
                ),
                Value::Null,
            )),
            _ => Ok(()),
        }
    }
}

impl Document for Tour {
    const COLLECTION: CollectionSpec = CollectionSpec {
        name: "tours",
        unique_keys: &[&["name"]],
    };
    const LABEL: &'static str = "tour";

    fn id(&self) -> Uuid {
        self.id
    }

    /// Secret tours never appear in reads or aggregations.
    fn scope() -> Filter {
        Filter::new().ne("secretTour", true)
    }

    /// Adds the derived `slug` and `durationWeeks` fields.
    fn present(mut doc: Value) -> Value {
        if let Value::Object(map) = &mut doc {
            if let Some(name) = map.get("name").and_then(Value::as_str) {
                let slug = slugify(name);
                map.insert("slug".to_string(), Value::String(slug));
            }
            if let Some(duration) = map.get("duration").and_then(Value::as_f64) {
                map.insert("durationWeeks".to_string(), Value::from(duration / 7.0));
            }
        }
        doc
    }
}

impl Resource for Tour {
    type Create = NewTour;
    type Update = TourPatch;

    fn create(input: NewTour, id: Uuid, now: DateTime<Utc>) -> Result<Self, AppError> {
        let tour = Self {
            id,
            name: input.name.trim().to_string(),
            duration: input.duration,
            max_group_size: input.max_group_size,
            difficulty: input.difficulty,
            ratings_average: DEFAULT_RATINGS_AVERAGE,
            ratings_quantity: 0,
            price: input.price,
            price_discount: input.price_discount,
            summary: input.summary.trim().to_string(),
            description: input.description.map(|d| d.trim().to_string()),
            image_cover: input.image_cover,
            images: input.images,
            start_dates: input.start_dates,
            secret_tour: input.secret_tour,
            start_location: input.start_location,
            locations: input.locations,
            guides: input.guides,
            created_at: now,
        };
        tour.check_discount()?;
        Ok(tour)
    }

    fn apply(&mut self, patch: TourPatch) -> Result<(), AppError> {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(max_group_size) = patch.max_group_size {
            self.max_group_size = max_group_size;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(price_discount) = patch.price_discount {
            self.price_discount = price_discount;
        }
        if let Some(summary) = patch.summary {
            self.summary = summary.trim().to_string();
        }
        if let Some(description) = patch.description {
            self.description = description.map(|d| d.trim().to_string());
        }
        if let Some(image_cover) = patch.image_cover {
            self.image_cover = image_cover;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(start_dates) = patch.start_dates {
            self.start_dates = start_dates;
        }
        if let Some(secret_tour) = patch.secret_tour {
            self.secret_tour = secret_tour;
        }
        if let Some(start_location) = patch.start_location {
            self.start_location = Some(start_location);
        }
        if let Some(locations) = patch.locations {
            self.locations = locations;
        }
        if let Some(guides) = patch.guides {
            self.guides = guides;
        }
        self.check_discount()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_tour() -> NewTour {
        serde_json::from_value(json!({
            "name": "The Forest Hiker",
            "duration": 5,
            "maxGroupSize": 25,
            "difficulty": "easy",
            "price": 397,
            "summary": "  Breathtaking hike through the Canadian Banff National Park ",
            "imageCover": "tour-1-cover.jpg",
            "startLocation": {
                "type": "Point",
                "coordinates": [-115.570154, 51.178456],
                "address": "224 Banff Ave, Banff, AB, Canada"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_new_tour_validation() {
        let mut tour = new_tour();
        assert!(tour.validate().is_ok());

        tour.price_discount = Some(500.0);
        assert!(tour.validate().is_err());

        let mut short = new_tour();
        short.name = "Short".to_string();
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_invalid_coordinates_fail_nested_validation() {
        let mut tour = new_tour();
        if let Some(location) = tour.start_location.as_mut() {
            location.coordinates = [51.178456, -115.570154];
        }
        assert!(tour.validate().is_err());
    }

    #[test]
    fn test_create_sets_rating_defaults() {
        let tour = Tour::create(new_tour(), Uuid::new_v4(), Utc::now()).unwrap();

        assert_eq!(tour.ratings_average, DEFAULT_RATINGS_AVERAGE);
        assert_eq!(tour.ratings_quantity, 0);
        assert_eq!(
            tour.summary,
            "Breathtaking hike through the Canadian Banff National Park"
        );
        assert_eq!(tour.slug(), "the-forest-hiker");
    }

    #[test]
    fn test_patch_rejects_discount_above_price() {
        let mut tour = Tour::create(new_tour(), Uuid::new_v4(), Utc::now()).unwrap();

        let patch: TourPatch = serde_json::from_value(json!({ "priceDiscount": 400 })).unwrap();
        assert!(tour.apply(patch).is_err());

        let patch: TourPatch =
            serde_json::from_value(json!({ "price": 500, "priceDiscount": 400 })).unwrap();
        assert!(tour.apply(patch).is_ok());

        let clear: TourPatch = serde_json::from_value(json!({ "priceDiscount": null })).unwrap();
        tour.apply(clear).unwrap();
        assert_eq!(tour.price_discount, None);
    }

    #[test]
    fn test_present_adds_derived_fields() {
        let doc = Tour::present(json!({ "name": "The Sea Explorer", "duration": 14 }));
        assert_eq!(doc["slug"], "the-sea-explorer");
        assert_eq!(doc["durationWeeks"], 2.0);

        let projected = Tour::present(json!({ "price": 497 }));
        assert!(projected.get("slug").is_none());
    }
}
