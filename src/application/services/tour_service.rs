//! Tour listings, analytics and geospatial lookups.

use serde_json::{Value, json};
use uuid::Uuid;

use crate::application::services::populate::populate_users;
use crate::application::services::{ResourceService, ReviewService};
use crate::domain::document::{Document, FieldPath};
use crate::domain::entities::{NewTour, Tour, TourPatch, User};
use crate::domain::geo::{DistanceUnit, GeoPoint};
use crate::domain::pipeline::{Accumulator, Group, GroupKey, Pipeline, Stage};
use crate::domain::query::{Filter, Projection, Query, QueryParams, SortKey};
use crate::domain::repositories::Collection;
use crate::error::AppError;

/// Fields of each guide embedded in tour responses.
const GUIDE_FIELDS: &[&str] = &["name", "email", "role", "photo"];

pub const TOP_TOURS_LIMIT: &str = "5";
pub const TOP_TOURS_SORT: &str = "-ratingsAverage,price";
pub const TOP_TOURS_FIELDS: &str = "name,price,ratingsAverage,summary,difficulty";

/// Tours rated at least this well are included in the statistics.
const STATS_MIN_RATING: f64 = 4.5;

#[derive(Clone)]
pub struct TourService {
    tours: ResourceService<Tour>,
    reviews: ReviewService,
    users: Collection<User>,
}

impl TourService {
    pub fn new(tours: Collection<Tour>, reviews: ReviewService, users: Collection<User>) -> Self {
        Self {
            tours: ResourceService::new(tours),
            reviews,
            users,
        }
    }

    pub async fn find_many(&self, params: &QueryParams) -> Result<Vec<Value>, AppError> {
        let mut docs = self.tours.find_many(params, Filter::new()).await?;
        populate_users(&mut docs, "guides", &self.users, GUIDE_FIELDS).await?;
        Ok(docs)
    }

    /// The five best-rated tours, cheapest first among equals.
    pub async fn top_five(&self, params: &QueryParams) -> Result<Vec<Value>, AppError> {
        self.find_many(&top_five_params(params)).await
    }

    /// A tour with its guides and reviews embedded.
    pub async fn detail(&self, id: Uuid) -> Result<Value, AppError> {
        let tour = self.tours.find_by_id(id).await?;

        let mut docs = vec![ResourceService::present(&tour)?];
        populate_users(&mut docs, "guides", &self.users, GUIDE_FIELDS).await?;
        let mut doc = docs.pop().unwrap_or(Value::Null);

        let reviews = self.reviews.for_tour(id).await?;
        if let Value::Object(map) = &mut doc {
            map.insert("reviews".to_string(), Value::Array(reviews));
        }
        Ok(doc)
    }

    pub async fn create(&self, input: NewTour) -> Result<Value, AppError> {
        let tour = self.tours.create(input).await?;
        tracing::info!(tour = %tour.id, name = %tour.name, "Tour created");
        self.present(&tour).await
    }

    pub async fn update(&self, id: Uuid, patch: TourPatch) -> Result<Value, AppError> {
        let tour = self.tours.update_by_id(id, patch).await?;
        self.present(&tour).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let tour = self.tours.delete_by_id(id).await?;
        tracing::info!(tour = %id, name = %tour.name, "Tour deleted");
        Ok(())
    }

    /// Per-difficulty statistics over well-rated tours, cheapest on average first.
    pub async fn stats(&self) -> Result<Vec<Value>, AppError> {
        let pipeline = Pipeline::new()
            .stage(Stage::Match(Filter::new().gte("ratingsAverage", STATS_MIN_RATING)))
            .stage(Stage::Group(Group {
                key: GroupKey::Field(FieldPath::new("difficulty")),
                key_as: "difficulty".to_string(),
                fields: vec![
                    ("numTours".to_string(), Accumulator::Count),
                    ("numRatings".to_string(), Accumulator::Sum(FieldPath::new("ratingsQuantity"))),
                    ("avgRating".to_string(), Accumulator::Avg(FieldPath::new("ratingsAverage"))),
                    ("avgPrice".to_string(), Accumulator::Avg(FieldPath::new("price"))),
                    ("minPrice".to_string(), Accumulator::Min(FieldPath::new("price"))),
                    ("maxPrice".to_string(), Accumulator::Max(FieldPath::new("price"))),
                ],
            }))
            .stage(Stage::Sort(vec![SortKey::asc("avgPrice")]));

        self.tours.collection().aggregate(pipeline).await
    }

    /// Tour starts per month of `year`, with the names of the starting tours.
    pub async fn monthly_plan(&self, year: i32) -> Result<Vec<Value>, AppError> {
        let (from, to) = year_bounds(year)?;

        let pipeline = Pipeline::new()
            .stage(Stage::Unwind(FieldPath::new("startDates")))
            .stage(Stage::Match(
                Filter::new().gte("startDates", from).lt("startDates", to),
            ))
            .stage(Stage::Group(Group {
                key: GroupKey::Month(FieldPath::new("startDates")),
                key_as: "month".to_string(),
                fields: vec![
                    ("numTourStarts".to_string(), Accumulator::Count),
                    ("tours".to_string(), Accumulator::Push(FieldPath::new("name"))),
                ],
            }))
            .stage(Stage::Sort(vec![SortKey::asc("month")]))
            .stage(Stage::Limit(12));

        self.tours.collection().aggregate(pipeline).await
    }

    /// Tours whose start location lies within `distance` of `center`.
    pub async fn within(
        &self,
        distance: f64,
        center: GeoPoint,
        unit: DistanceUnit,
    ) -> Result<Vec<Value>, AppError> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(AppError::bad_request(
                "Distance must be a non-negative number",
                Value::Null,
            ));
        }

        let query = Query::<Tour>::all()
            .matching(Filter::new().within("startLocation", center, unit.to_radians(distance)))
            .select(Projection::default_exclusions());

        let docs = self.tours.collection().find_documents(query).await?;
        Ok(docs.into_iter().map(Tour::present).collect())
    }

    /// Distance from `center` to every tour's start location, nearest first.
    pub async fn distances(
        &self,
        center: GeoPoint,
        unit: DistanceUnit,
    ) -> Result<Vec<Value>, AppError> {
        let near = self
            .tours
            .collection()
            .geo_near("startLocation", center)
            .await?;

        Ok(near
            .into_iter()
            .map(|(doc, meters)| {
                json!({
                    "id": doc["id"],
                    "name": doc["name"],
                    "distance": meters * unit.meters_multiplier(),
                })
            })
            .collect())
    }

    async fn present(&self, tour: &Tour) -> Result<Value, AppError> {
        let mut docs = vec![ResourceService::present(tour)?];
        populate_users(&mut docs, "guides", &self.users, GUIDE_FIELDS).await?;
        Ok(docs.pop().unwrap_or(Value::Null))
    }
}

/// Request parameters with the top-five alias applied.
pub fn top_five_params(params: &QueryParams) -> QueryParams {
    let mut params = params.clone();
    params.set("limit", TOP_TOURS_LIMIT);
    params.set("sort", TOP_TOURS_SORT);
    params.set("fields", TOP_TOURS_FIELDS);
    params
}

/// `[{year}-01-01, {year + 1}-01-01)` as RFC 3339 date prefixes.
fn year_bounds(year: i32) -> Result<(String, String), AppError> {
    if !(1..9999).contains(&year) {
        return Err(AppError::bad_request(
            format!("Invalid year: {year}"),
            Value::Null,
        ));
    }
    Ok((format!("{year:04}-01-01"), format!("{:04}-01-01", year + 1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::DocumentStore;
    use crate::infrastructure::persistence::MemoryDocumentStore;
    use std::sync::Arc;

    fn service() -> TourService {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let tours: Collection<Tour> = Collection::new(store.clone());
        let users: Collection<User> = Collection::new(store.clone());
        let reviews = ReviewService::new(Collection::new(store), tours.clone(), users.clone());
        TourService::new(tours, reviews, users)
    }

    fn new_tour(name: &str, difficulty: &str, price: f64, lng: f64, lat: f64, starts: &[&str]) -> NewTour {
        serde_json::from_value(json!({
            "name": name,
            "duration": 7,
            "maxGroupSize": 15,
            "difficulty": difficulty,
            "price": price,
            "summary": "A tour",
            "imageCover": "cover.jpg",
            "startDates": starts,
            "startLocation": { "type": "Point", "coordinates": [lng, lat] }
        }))
        .unwrap()
    }

    async fn seed(service: &TourService) {
        let tours = [
            new_tour("The Forest Hiker", "easy", 397.0, -115.570154, 51.178456,
                &["2021-04-25T09:00:00Z", "2021-07-20T09:00:00Z", "2022-03-05T09:00:00Z"]),
            new_tour("The Sea Explorer", "medium", 497.0, -80.185942, 25.774772,
                &["2021-06-19T09:00:00Z", "2021-07-20T09:00:00Z"]),
            new_tour("The Snow Adventurer", "difficult", 997.0, -106.822318, 39.190872,
                &["2022-01-05T10:00:00Z"]),
        ];
        for tour in tours {
            service.create(tour).await.unwrap();
        }
    }

    #[test]
    fn test_top_five_params_override_request() {
        let params = top_five_params(&QueryParams::parse("limit=50&difficulty=easy"));

        assert_eq!(params.get_str("limit"), Some("5"));
        assert_eq!(params.get_str("sort"), Some("-ratingsAverage,price"));
        assert_eq!(params.get_str("difficulty"), Some("easy"));
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(
            year_bounds(2021).unwrap(),
            ("2021-01-01".to_string(), "2022-01-01".to_string())
        );
        assert!(year_bounds(0).is_err());
    }

    #[tokio::test]
    async fn test_monthly_plan_counts_starts_per_month() {
        let service = service();
        seed(&service).await;

        let plan = service.monthly_plan(2021).await.unwrap();
        let months: Vec<u64> = plan.iter().map(|m| m["month"].as_u64().unwrap()).collect();
        assert_eq!(months, vec![4, 6, 7]);

        let july = &plan[2];
        assert_eq!(july["numTourStarts"], 2);
        let mut names: Vec<&str> = july["tours"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        names.sort();
        assert_eq!(names, vec!["The Forest Hiker", "The Sea Explorer"]);
    }

    #[tokio::test]
    async fn test_stats_group_by_difficulty() {
        let service = service();
        seed(&service).await;

        // Default rating 4.0 is below the threshold.
        assert!(service.stats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_within_and_distances() {
        let service = service();
        seed(&service).await;

        // Los Angeles
        let center = GeoPoint::new(-118.113491, 34.111745);

        let near = service.within(1500.0, center, DistanceUnit::Miles).await.unwrap();
        assert_eq!(near.len(), 2);
        let near = service.within(1000.0, center, DistanceUnit::Miles).await.unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0]["name"], "The Snow Adventurer");

        let distances = service.distances(center, DistanceUnit::Kilometers).await.unwrap();
        assert_eq!(distances.len(), 3);
        assert_eq!(distances[0]["name"], "The Snow Adventurer");
        assert_eq!(distances[2]["name"], "The Sea Explorer");
        let first = distances[0]["distance"].as_f64().unwrap();
        assert!(first > 1100.0 && first < 1200.0);
    }

    #[tokio::test]
    async fn test_detail_embeds_reviews() {
        let service = service();
        let created = service
            .create(new_tour("The Park Camper", "medium", 1497.0, -118.0, 36.0, &[]))
            .await
            .unwrap();
        let id: Uuid = serde_json::from_value(created["id"].clone()).unwrap();

        let detail = service.detail(id).await.unwrap();
        assert_eq!(detail["slug"], "the-park-camper");
        assert_eq!(detail["durationWeeks"], 1.0);
        assert_eq!(detail["reviews"], json!([]));
    }
}
