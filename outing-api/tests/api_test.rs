use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use outing_api::{app, AppState, DiscoveryDefaults};
use outing_catalog::{EventAggregator, LocalCatalog};
use outing_core::FareConfig;
use outing_places::{seed, SmartAddResolver};
use outing_promo::CouponService;
use outing_store::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn test_app() -> Router {
    let directory = Arc::new(seed::cleveland());
    let coupons = CouponService::hydrate(Arc::new(MemoryStore::new())).await.unwrap();

    let state = AppState {
        aggregator: Arc::new(EventAggregator::new(
            Vec::new(),
            Some(LocalCatalog::cleveland(chrono::Utc::now())),
        )),
        resolver: Arc::new(SmartAddResolver::new(directory.clone(), FareConfig::default())),
        coupons: Arc::new(coupons),
        discovery: DiscoveryDefaults {
            origin: directory.default_origin(),
            radius_miles: 25.0,
            page_size: 50,
        },
    };
    app(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_events_from_local_catalog() {
    let app = test_app().await;

    let (status, body) = send(&app, get("/v1/events?category=sports")).await;
    assert_eq!(status, StatusCode::OK);
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e["category"] == "sports"));
    assert_eq!(body["warnings"].as_array().unwrap().len(), 0);

    // New York is outside the offline coverage
    let (_, body) = send(&app, get("/v1/events?lat=40.7128&lng=-74.0060")).await;
    assert!(body["events"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_events_rejects_half_a_coordinate() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/v1/events?lat=41.5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("lat and lng"));
}

#[tokio::test]
async fn test_smart_add_team_and_short_query() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        post(
            "/v1/places/smart-add",
            json!({"query": "browns game", "origin": {"lat": 41.4993, "lng": -81.6944}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["primary"]["name"], "Cleveland Browns Stadium");
    assert!(body["quote"]["total"].as_f64().unwrap() >= 3.0);
    assert!(!body["drop_offs"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, post("/v1/places/smart-add", json!({"query": "xy"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["notes"], "Type at least 3 characters");
}

#[tokio::test]
async fn test_coupon_validate_reports_errors_in_body() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        post(
            "/v1/coupons/validate",
            json!({"code": "SAVE20", "user_id": "rider-1", "ride_amount": 30.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "Minimum ride amount is $40.00");
}

#[tokio::test]
async fn test_coupon_apply_and_redeem() {
    let app = test_app().await;
    let request = json!({
        "code": "welcome50",
        "user_id": "rider-1",
        "ride_amount": 80.0,
        "is_first_ride": true
    });

    let (status, body) = send(&app, post("/v1/coupons/apply", request.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["discount_amount"], 25.0);
    assert_eq!(body["final_amount"], 55.0);

    let mut redeem = request.clone();
    redeem["ride_id"] = json!("ride-42");
    let (status, body) = send(&app, post("/v1/coupons/redeem", redeem)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"]["ride_id"], "ride-42");
    assert_eq!(body["coupon"]["usage_count"], 1);

    let (_, usage) = send(&app, get("/v1/users/rider-1/coupon-usage")).await;
    assert_eq!(usage.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, post("/v1/coupons/apply", json!({
        "code": "NOPE", "user_id": "rider-1", "ride_amount": 10.0
    })))
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Invalid coupon code");
}

#[tokio::test]
async fn test_coupon_rejects_negative_amount() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        post(
            "/v1/coupons/apply",
            json!({"code": "SAVE20", "user_id": "rider-1", "ride_amount": -5.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_create_then_disable() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        post(
            "/v1/admin/coupons",
            json!({"code": "gameday5", "coupon_type": "fixed_amount", "value": 5.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["code"], "GAMEDAY5");

    let (_, active) = send(&app, get("/v1/coupons/active")).await;
    assert!(active
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["code"] == "GAMEDAY5"));

    let (status, _) = send(
        &app,
        post(
            "/v1/admin/coupons",
            json!({"code": "GAMEDAY5", "coupon_type": "fixed_amount", "value": 5.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, post("/v1/admin/coupons/gameday5/disable", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "disabled");

    let (status, _) = send(&app, post("/v1/admin/coupons/missing/disable", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
