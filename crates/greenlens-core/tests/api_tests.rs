//! HTTP API tests
//!
//! Drive the router in-process with scripted providers and signed tokens.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use greenlens_core::api::{AppState, router};
use greenlens_core::auth::{Claims, JwtAuthenticator};
use greenlens_core::config::Config;
use greenlens_core::crisis::SimulationRepository;
use greenlens_core::image::{GeneratedImage, ImageGenerator};
use greenlens_core::llm::{TextCompletion, TextGenerator};
use greenlens_core::storage::Database;
use greenlens_core::{Error, Result};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "api-test-secret";

const DOCUMENT: &str = "Intro line\n\
### 2030\nReservoirs fall to record lows.\n\
### 2050\nCities ration water by district.\n\
### 2100\nDesalination rings every coast.\n";

struct FakeText;

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate_text(&self, prompt: &str) -> Result<TextCompletion> {
        if prompt.starts_with("Product: ") {
            return Ok(TextCompletion::new("- Contains palm oil\n- Try a local brand"));
        }
        match prompt.split_once(" scenario: ") {
            Some((head, _)) => {
                let year = head.rsplit_once(", ").map(|(_, y)| y).unwrap_or(head);
                Ok(TextCompletion::new(format!(
                    "Dry riverbed in {}. Late afternoon light.",
                    year
                )))
            }
            None => Ok(TextCompletion::new(DOCUMENT)),
        }
    }
}

struct FakeImages {
    fail_on: Option<&'static str>,
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        if let Some(year) = self.fail_on {
            if prompt.contains(year) {
                return Err(Error::ImageError("content policy violation".to_string()));
            }
        }
        let year = prompt
            .split_whitespace()
            .find(|w| w.len() >= 4 && w[..4].chars().all(|c| c.is_ascii_digit()))
            .map(|w| &w[..4])
            .unwrap_or("none");
        Ok(GeneratedImage::new(format!("https://img.example.com/{}.png", year)))
    }
}

async fn app_with(images: FakeImages) -> (Router, Database) {
    let db = Database::in_memory().await.unwrap();
    let state = AppState::new(
        db.clone(),
        Arc::new(FakeText),
        Arc::new(images),
        Arc::new(JwtAuthenticator::new(SECRET)),
        &Config::default(),
    );
    (router(state), db)
}

async fn app() -> (Router, Database) {
    app_with(FakeImages { fail_on: None }).await
}

fn token_for(id: i64, secret: &str) -> String {
    let claims = Claims {
        sub: format!("user{}", id),
        id,
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn post(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (app, _db) = app().await;

    let response = app
        .oneshot(post("/crisis/simulate", None, r#"{"crisis":"su krizi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], "E001");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let (app, _db) = app().await;
    let token = token_for(1, "some-other-secret");

    let response = app
        .oneshot(get("/crisis/history", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_simulate_returns_ordered_scenarios() {
    let (app, db) = app().await;
    let token = token_for(7, SECRET);

    let response = app
        .oneshot(post(
            "/crisis/simulate",
            Some(&token),
            r#"{"crisis":"su krizi"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let text = body_text(response).await;
    let first = text.find("\"2030\"").unwrap();
    let second = text.find("\"2050\"").unwrap();
    let third = text.find("\"2100\"").unwrap();
    assert!(first < second && second < third);

    let body: Value = serde_json::from_str(&text).unwrap();
    assert!(body["sim_id"].as_i64().unwrap() > 0);
    assert_eq!(
        body["scenarios"]["2050"]["text"],
        "Cities ration water by district."
    );
    assert_eq!(
        body["scenarios"]["2050"]["image_url"],
        "https://img.example.com/2050.png"
    );

    let count = SimulationRepository::new(&db).count_by_owner(7).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_history_is_scoped_to_caller() {
    let (app, _db) = app().await;
    let alice = token_for(1, SECRET);
    let bob = token_for(2, SECRET);

    for topic in ["su krizi", "orman yangini"] {
        let body = json!({ "crisis": topic }).to_string();
        let response = app
            .clone()
            .oneshot(post("/crisis/simulate", Some(&alice), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get("/crisis/history", Some(&alice)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["crisis"], "orman yangini");
    assert!(items[0].get("owner_id").is_none());

    let response = app
        .oneshot(get("/crisis/history", Some(&bob)))
        .await
        .unwrap();
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_image_failure_is_bad_gateway_and_stores_nothing() {
    let (app, db) = app_with(FakeImages {
        fail_on: Some("2050"),
    })
    .await;
    let token = token_for(3, SECRET);

    let response = app
        .oneshot(post(
            "/crisis/simulate",
            Some(&token),
            r#"{"crisis":"su krizi"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], "E102");
    assert_eq!(body["error"]["message"], "Upstream AI provider request failed");

    let count = SimulationRepository::new(&db).count_by_owner(3).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (app, _db) = app().await;
    let token = token_for(1, SECRET);

    let response = app
        .oneshot(post("/crisis/simulate", Some(&token), "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"]["code"], "E800");
}

#[tokio::test]
async fn test_scan_requires_barcode_or_name() {
    let (app, _db) = app().await;
    let token = token_for(1, SECRET);

    let response = app
        .oneshot(post(
            "/greenlens/scan",
            Some(&token),
            r#"{"barcode":"  ","product_name":""}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scan_then_history() {
    let (app, _db) = app().await;
    let token = token_for(5, SECRET);

    let response = app
        .clone()
        .oneshot(post(
            "/greenlens/scan",
            Some(&token),
            r#"{"product_name":"Hazelnut spread"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body["scan_id"].as_i64().unwrap() > 0);
    assert!(body["report"].as_str().unwrap().contains("palm oil"));

    let response = app
        .oneshot(get("/greenlens/history", Some(&token)))
        .await
        .unwrap();
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_name"], "Hazelnut spread");
    assert!(items[0]["barcode"].is_null());
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let (app, _db) = app().await;

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["overall_status"], "ok");
}
