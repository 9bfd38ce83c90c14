mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use tourify::domain::entities::Role;

async fn tour_ratings(server: &TestServer, tour_id: &str) -> (f64, u64) {
    let json = server
        .get(&format!("/api/v1/tours/{tour_id}"))
        .await
        .json::<Value>();
    (
        json["data"]["ratingsAverage"].as_f64().unwrap(),
        json["data"]["ratingsQuantity"].as_u64().unwrap(),
    )
}

#[tokio::test]
async fn test_create_review_requires_login() {
    let app = common::spawn_app();
    let tour = common::create_tour(&app.state, common::tour_payload("The Forest Hiker", 397.0, "easy")).await;

    app.server
        .post("/api/v1/reviews")
        .json(&json!({ "review": "Great", "rating": 5, "tour": tour }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_nested_review_fills_tour_and_author() {
    let app = common::spawn_app();
    let laura = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;
    let tour = common::create_tour(&app.state, common::tour_payload("The Forest Hiker", 397.0, "easy")).await;

    let response = app
        .server
        .post(&format!("/api/v1/tours/{tour}/reviews"))
        .add_header("Authorization", common::bearer(&laura.token))
        .json(&json!({ "review": "Loved every minute", "rating": 5 }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<Value>();
    assert_eq!(json["data"]["tour"], tour);
    assert_eq!(json["data"]["user"]["id"], common::user_id(&laura.user));
    assert_eq!(json["data"]["user"]["name"], "Laura");
    assert!(json["data"]["user"].get("email").is_none());

    assert_eq!(tour_ratings(&app.server, &tour).await, (5.0, 1));
}

#[tokio::test]
async fn test_review_author_cannot_be_spoofed() {
    let app = common::spawn_app();
    let laura = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;
    let steve = common::create_user(&app.state, "Steve", "steve@example.com", Role::User).await;
    let tour = common::create_tour(&app.state, common::tour_payload("The Forest Hiker", 397.0, "easy")).await;

    let response = app
        .server
        .post(&format!("/api/v1/tours/{tour}/reviews"))
        .add_header("Authorization", common::bearer(&laura.token))
        .json(&json!({
            "review": "Posted in someone else's name",
            "rating": 1,
            "user": common::user_id(&steve.user)
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(
        response.json::<Value>()["data"]["user"]["id"],
        common::user_id(&laura.user)
    );
}

#[tokio::test]
async fn test_second_review_for_same_tour_is_rejected() {
    let app = common::spawn_app();
    let laura = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;
    let tour = common::create_tour(&app.state, common::tour_payload("The Forest Hiker", 397.0, "easy")).await;
    let path = format!("/api/v1/tours/{tour}/reviews");

    app.server
        .post(&path)
        .add_header("Authorization", common::bearer(&laura.token))
        .json(&json!({ "review": "Loved it", "rating": 5 }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .post(&path)
        .add_header("Authorization", common::bearer(&laura.token))
        .json(&json!({ "review": "Loved it again", "rating": 4 }))
        .await;

    response.assert_status_bad_request();
    let message = response.json::<Value>()["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Duplicate value for tour, user"));
    assert_eq!(tour_ratings(&app.server, &tour).await, (5.0, 1));
}

#[tokio::test]
async fn test_review_for_missing_tour() {
    let app = common::spawn_app();
    let laura = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;

    let response = app
        .server
        .post("/api/v1/reviews")
        .add_header("Authorization", common::bearer(&laura.token))
        .json(&json!({ "review": "Hmm", "rating": 3, "tour": uuid::Uuid::new_v4() }))
        .await;

    response.assert_status_not_found();
    assert_eq!(
        response.json::<Value>()["message"],
        "No tour found with that ID"
    );
}

#[tokio::test]
async fn test_review_rating_out_of_range() {
    let app = common::spawn_app();
    let laura = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;
    let tour = common::create_tour(&app.state, common::tour_payload("The Forest Hiker", 397.0, "easy")).await;

    app.server
        .post(&format!("/api/v1/tours/{tour}/reviews"))
        .add_header("Authorization", common::bearer(&laura.token))
        .json(&json!({ "review": "Off the charts", "rating": 6 }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_ratings_follow_review_changes() {
    let app = common::spawn_app();
    let admin = common::admin(&app.state).await;
    let laura = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;
    let ben = common::create_user(&app.state, "Ben", "ben@example.com", Role::User).await;
    let tour = common::create_tour(&app.state, common::tour_payload("The Forest Hiker", 397.0, "easy")).await;
    let path = format!("/api/v1/tours/{tour}/reviews");

    let first = app
        .server
        .post(&path)
        .add_header("Authorization", common::bearer(&laura.token))
        .json(&json!({ "review": "Good", "rating": 4 }))
        .await
        .json::<Value>();
    let review_id = first["data"]["id"].as_str().unwrap().to_string();

    app.server
        .post(&path)
        .add_header("Authorization", common::bearer(&ben.token))
        .json(&json!({ "review": "Fine", "rating": 3 }))
        .await
        .assert_status(StatusCode::CREATED);
    assert_eq!(tour_ratings(&app.server, &tour).await, (3.5, 2));

    // Only the author may edit.
    let forbidden = app
        .server
        .patch(&format!("/api/v1/reviews/{review_id}"))
        .add_header("Authorization", common::bearer(&ben.token))
        .json(&json!({ "rating": 1 }))
        .await;
    forbidden.assert_status_forbidden();
    assert_eq!(
        forbidden.json::<Value>()["message"],
        "You can only modify your own reviews"
    );

    app.server
        .patch(&format!("/api/v1/reviews/{review_id}"))
        .add_header("Authorization", common::bearer(&laura.token))
        .json(&json!({ "rating": 5 }))
        .await
        .assert_status_ok();
    assert_eq!(tour_ratings(&app.server, &tour).await, (4.0, 2));

    // Admins may delete any review.
    app.server
        .delete(&format!("/api/v1/reviews/{review_id}"))
        .add_header("Authorization", common::bearer(&admin.token))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(tour_ratings(&app.server, &tour).await, (3.0, 1));

    let remaining = app
        .server
        .get(&path)
        .await
        .json::<Value>();
    let remaining_id = remaining["data"][0]["id"].as_str().unwrap().to_string();

    app.server
        .delete(&format!("/api/v1/reviews/{remaining_id}"))
        .add_header("Authorization", common::bearer(&ben.token))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert_eq!(tour_ratings(&app.server, &tour).await, (4.0, 0));
}

#[tokio::test]
async fn test_nested_list_is_scoped_to_tour() {
    let app = common::spawn_app();
    let laura = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;
    let forest = common::create_tour(&app.state, common::tour_payload("The Forest Hiker", 397.0, "easy")).await;
    let sea = common::create_tour(&app.state, common::tour_payload("The Sea Explorer", 497.0, "medium")).await;

    for (tour, rating) in [(&forest, 5), (&sea, 2)] {
        app.server
            .post(&format!("/api/v1/tours/{tour}/reviews"))
            .add_header("Authorization", common::bearer(&laura.token))
            .json(&json!({ "review": "Review", "rating": rating }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let nested = app
        .server
        .get(&format!("/api/v1/tours/{forest}/reviews"))
        .await
        .json::<Value>();
    assert_eq!(nested["results"], 1);
    assert_eq!(nested["data"][0]["rating"], 5);

    let all = app
        .server
        .get("/api/v1/reviews")
        .add_query_param("rating[gte]", 2)
        .await
        .json::<Value>();
    assert_eq!(all["results"], 2);

    let detail = app.server.get(&format!("/api/v1/tours/{sea}")).await.json::<Value>();
    assert_eq!(detail["data"]["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(detail["data"]["reviews"][0]["user"]["name"], "Laura");
}

#[tokio::test]
async fn test_get_review() {
    let app = common::spawn_app();
    let laura = common::create_user(&app.state, "Laura", "laura@example.com", Role::User).await;
    let tour = common::create_tour(&app.state, common::tour_payload("The Forest Hiker", 397.0, "easy")).await;

    let created = app
        .server
        .post("/api/v1/reviews")
        .add_header("Authorization", common::bearer(&laura.token))
        .json(&json!({ "review": "Great views", "rating": 5, "tour": tour }))
        .await
        .json::<Value>();
    let id = created["data"]["id"].as_str().unwrap();

    let response = app.server.get(&format!("/api/v1/reviews/{id}")).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["review"], "Great views");

    app.server
        .get("/api/v1/reviews/not-an-id")
        .await
        .assert_status_bad_request();
}
