use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use booking_model::record::*;
use booking_model::{BookingDataset, ModelArtifact, Predictor, SchemaPolicy, Trainer};
use booking_service::{create_router, AppState, ErrorMode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::OnceLock;
use tower::util::ServiceExt;

fn artifact_bytes() -> &'static Vec<u8> {
    static BYTES: OnceLock<Vec<u8>> = OnceLock::new();
    BYTES.get_or_init(|| {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..90 {
            let canceled = i % 3 == 0;
            records.push(
                RawRecord::new()
                    .with(NO_OF_ADULTS, (1 + i % 2) as f64)
                    .with(NO_OF_CHILDREN, 0.0)
                    .with(NO_OF_WEEK_NIGHTS, (i % 4) as f64)
                    .with(NO_OF_WEEKEND_NIGHTS, (i % 2) as f64)
                    .with(LEAD_TIME, if canceled { 150.0 + i as f64 } else { (i % 30) as f64 })
                    .with(AVG_PRICE_PER_ROOM, 90.0 + (i % 11) as f64)
                    .with(ROOM_TYPE_RESERVED, if i % 4 == 0 { "Room_Type 4" } else { "Room_Type 1" })
                    .with(TYPE_OF_MEAL_PLAN, if i % 2 == 0 { "Meal Plan 1" } else { "Not Selected" })
                    .with(MARKET_SEGMENT_TYPE, if i % 5 == 0 { "Offline" } else { "Online" })
                    .with(REPEATED_GUEST, 0.0)
                    .with(NO_OF_SPECIAL_REQUESTS, if canceled { 0.0 } else { 1.0 + (i % 2) as f64 }),
            );
            labels.push(if canceled { "Canceled" } else { "Not_Canceled" }.to_string());
        }
        Trainer::builder()
            .n_estimators(15)
            .build()
            .fit(&BookingDataset::new(records, labels))
            .unwrap()
            .artifact
            .to_bytes()
            .unwrap()
    })
}

fn predictor(policy: SchemaPolicy) -> Predictor {
    let artifact = ModelArtifact::from_bytes(artifact_bytes()).unwrap();
    Predictor::from_artifact(artifact).unwrap().with_policy(policy)
}

fn app(mode: ErrorMode, policy: SchemaPolicy) -> Router {
    create_router(AppState::new(predictor(policy), mode))
}

fn booking() -> Value {
    json!({
        "no_of_adults": 2,
        "no_of_children": 0,
        "total_nights": 3,
        "lead_time": 200,
        "avg_price_per_room": 95.0,
        "room_type_reserved": "Room_Type 1",
        "type_of_meal_plan": "Meal Plan 1",
        "market_segment_type": "Online",
        "repeated_guest": 0,
        "no_of_special_requests": 0
    })
}

async fn post(app: Router, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_predict_returns_label() {
    let expected = predictor(SchemaPolicy::Lenient)
        .predict_json(&booking())
        .unwrap()
        .label;

    let (status, body) = post(app(ErrorMode::Typed, SchemaPolicy::Lenient), booking().to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "prediction": expected }));
    assert!(["Canceled", "Not_Canceled"].contains(&expected.as_str()));
}

#[tokio::test]
async fn test_split_night_counts_match_total_nights() {
    let (_, combined) = post(app(ErrorMode::Typed, SchemaPolicy::Lenient), booking().to_string()).await;

    let mut request = booking();
    let fields = request.as_object_mut().unwrap();
    fields.remove("total_nights");
    fields.insert("no_of_week_nights".to_string(), json!(2));
    fields.insert("no_of_weekend_nights".to_string(), json!(1));

    let (status, body) = post(app(ErrorMode::Typed, SchemaPolicy::Lenient), request.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, combined);
}

#[tokio::test]
async fn test_missing_field_compat_mode_is_200() {
    let mut request = booking();
    request.as_object_mut().unwrap().remove("lead_time");

    let (status, body) = post(app(ErrorMode::Compat, SchemaPolicy::Lenient), request.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": "Missing field: lead_time" }));
}

#[tokio::test]
async fn test_missing_field_typed_mode_is_400() {
    let mut request = booking();
    request.as_object_mut().unwrap().remove("lead_time");

    let (status, body) = post(app(ErrorMode::Typed, SchemaPolicy::Lenient), request.to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["error"], "Missing field: lead_time");
}

#[tokio::test]
async fn test_invalid_json_is_validation_error() {
    let (status, body) = post(app(ErrorMode::Typed, SchemaPolicy::Lenient), "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_non_object_body_is_validation_error() {
    let (status, body) = post(app(ErrorMode::Compat, SchemaPolicy::Lenient), "[1, 2]".to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().contains("JSON object"));
}

#[tokio::test]
async fn test_unseen_categories_give_same_prediction() {
    let mut first = booking();
    first["type_of_meal_plan"] = json!("Meal Plan 3");
    let mut second = booking();
    second["type_of_meal_plan"] = json!("Meal Plan 9");

    let (status_a, body_a) = post(app(ErrorMode::Typed, SchemaPolicy::Lenient), first.to_string()).await;
    let (status_b, body_b) = post(app(ErrorMode::Typed, SchemaPolicy::Lenient), second.to_string()).await;
    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);
    assert_eq!(body_a, body_b);
}

#[tokio::test]
async fn test_strict_policy_unseen_category_is_422() {
    let mut request = booking();
    request["market_segment_type"] = json!("Aviation");

    let (status, body) = post(app(ErrorMode::Typed, SchemaPolicy::Strict), request.to_string()).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "schema_mismatch");
}

#[tokio::test]
async fn test_health() {
    let response = app(ErrorMode::Typed, SchemaPolicy::Lenient)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["schema_version"], 1);
    assert_eq!(body["classes"], json!(["Canceled", "Not_Canceled"]));
    assert!(body["n_features"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let response = app(ErrorMode::Typed, SchemaPolicy::Lenient)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/predict")
                .header("origin", "https://hotel.example")
                .header("content-type", "application/json")
                .body(Body::from(booking().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
