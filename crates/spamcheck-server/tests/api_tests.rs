//! Router tests for the spamcheck HTTP API

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use spamcheck_classifiers::{
    ClassifierArtifact, ClassifierModel, DecisionModel, FeatureVector, LoadedModel,
    LogisticRegression, ModelConfig, SpamClassificationService, TextNormalizer, TfidfVectorizer,
    VectorizerOptions,
};
use spamcheck_server::{create_router, AppState, RateLimitConfig, ServerConfig};
use spamcheck_telemetry::HistoryStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const SPAM_WORDS: &[&str] = &["buy", "now", "limited", "offer", "gratis", "pulsa"];
const HAM_WORDS: &[&str] = &["hello", "how", "are", "you", "today", "rumah"];

fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.rate_limit = RateLimitConfig::disabled();
    config.history.cache_ttl_secs = 0;
    config
}

fn test_vectorizer() -> TfidfVectorizer {
    let corpus = [SPAM_WORDS.join(" "), HAM_WORDS.join(" ")];
    TfidfVectorizer::fit(corpus.as_slice(), &TextNormalizer::default(), VectorizerOptions::default())
        .unwrap()
}

fn test_classifier(vectorizer: &TfidfVectorizer) -> ClassifierModel {
    let mut coef = vec![0.0; vectorizer.dimension()];
    for (words, weight) in [(SPAM_WORDS, 3.0), (HAM_WORDS, -3.0)] {
        for word in words {
            if let Some(i) = vectorizer.index_of(word) {
                coef[i] = weight;
            }
        }
    }
    ClassifierModel::LogisticRegression(LogisticRegression {
        coef,
        intercept: 0.0,
    })
}

fn test_model(classifier: Option<Arc<dyn DecisionModel>>) -> LoadedModel {
    let vectorizer = test_vectorizer();
    let classifier = classifier.unwrap_or_else(|| Arc::new(test_classifier(&vectorizer)));
    LoadedModel::new(vectorizer, classifier).unwrap()
}

fn build_app(config: ServerConfig, ready: bool) -> Router {
    build_app_with(config, ready.then(|| test_model(None)))
}

fn build_app_with(config: ServerConfig, model: Option<LoadedModel>) -> Router {
    let service = match model {
        Some(model) => SpamClassificationService::with_model(config.model.clone(), model),
        None => SpamClassificationService::new(config.model.clone()),
    };
    let history = HistoryStore::in_memory(config.history.clone());
    let handle = PrometheusBuilder::new().build_recorder().handle();
    create_router(AppState::from_parts(config, service, history, handle))
}

fn classify_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ml/classify/")
        .header("content-type", "application/json")
        .header("user-agent", "api-tests")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_classify_spam() {
    let app = build_app(test_config(), true);
    let (status, body) = send(&app, classify_request(json!({ "text": "Buy now! Limited time offer!!!" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "spam");
    assert_eq!(body["message"], "This message is SPAM");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.5..=1.0).contains(&confidence));
}

#[tokio::test]
async fn test_classify_not_spam() {
    let app = build_app(test_config(), true);
    let (status, body) = send(&app, classify_request(json!({ "text": "Hello, how are you today?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "not_spam");
    assert_eq!(body["message"], "This message is not SPAM");
}

#[tokio::test]
async fn test_validation_errors() {
    let app = build_app(test_config(), true);

    let (status, body) = send(&app, classify_request(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "text": ["This field is required."] }));

    let (status, body) = send(&app, classify_request(json!({ "text": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "text": ["This field may not be blank."] }));

    let (status, body) = send(&app, classify_request(json!({ "text": "a".repeat(5001) }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "text": ["Ensure this field has no more than 5000 characters."] })
    );

    let (status, body) = send(&app, classify_request(json!({ "text": { "nested": true } }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "text": ["Not a valid string."] }));
}

#[tokio::test]
async fn test_exactly_max_length_is_accepted() {
    let app = build_app(test_config(), true);
    let (status, _) = send(&app, classify_request(json!({ "text": "a".repeat(5000) }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = build_app(test_config(), true);
    let request = Request::builder()
        .method("POST")
        .uri("/api/ml/classify/")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["text"][0].is_string());
}

#[tokio::test]
async fn test_surrounding_whitespace_is_stripped() {
    let app = build_app(test_config(), true);

    let padded = format!("{}\n", "a".repeat(5000));
    let (status, _) = send(&app, classify_request(json!({ "text": padded }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, classify_request(json!({ "text": "  Hello, how are you today?  " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "not_spam");

    let (_, history) = send(&app, get("/api/ml/history/")).await;
    assert_eq!(history[0]["text_input"], "Hello, how are you today?");
}

#[tokio::test]
async fn test_state_from_disk_persists_history() {
    let temp_dir = TempDir::new().unwrap();

    let mut config = test_config();
    config.model = ModelConfig::with_dir(temp_dir.path().join("models"));
    config.history.path = Some(temp_dir.path().join("history.jsonl"));

    let vectorizer = test_vectorizer();
    std::fs::create_dir_all(&config.model.dir).unwrap();
    vectorizer.save(config.model.vocabulary_path()).unwrap();
    ClassifierArtifact::new(test_classifier(&vectorizer))
        .save(config.model.classifier_path())
        .unwrap();

    let handle = || PrometheusBuilder::new().build_recorder().handle();

    {
        let state = AppState::new(config.clone(), handle());
        assert!(state.service.is_ready());

        let app = create_router(state.clone());
        let (status, body) = send(&app, classify_request(json!({ "text": "Buy now" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction"], "spam");
        state.history.flush().unwrap();
    }

    // A restarted server reloads the recorded classification
    let app = create_router(AppState::new(config, handle()));
    let (status, history) = send(&app, get("/api/ml/history/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["text_input"], "Buy now");
    assert_eq!(history[0]["prediction"], "spam");
}

#[tokio::test]
async fn test_unready_is_checked_before_validation() {
    let app = build_app(test_config(), false);

    for body in [json!({ "text": "Buy now" }), json!({}), json!({ "text": "" })] {
        let (status, body) = send(&app, classify_request(body)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "ML model is not loaded. Please try again later.");
    }
}

#[tokio::test]
async fn test_ml_health() {
    let (status, body) = send(&build_app(test_config(), true), get("/api/ml/health/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "healthy",
            "model_loaded": true,
            "service": "ML Spam Classification Service",
        })
    );

    let (status, body) = send(&build_app(test_config(), false), get("/api/ml/health/")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_history_lists_recent_classifications() {
    let app = build_app(test_config(), true);
    let long_text = format!("Buy now {}", "x".repeat(142));
    assert_eq!(long_text.chars().count(), 150);

    send(&app, classify_request(json!({ "text": "Hello, how are you today?" }))).await;
    send(&app, classify_request(json!({ "text": long_text }))).await;

    let (status, body) = send(&app, get("/api/ml/history/")).await;
    assert_eq!(status, StatusCode::OK);

    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);

    let newest = &entries[0];
    let shown = newest["text_input"].as_str().unwrap();
    assert_eq!(shown.chars().count(), 103);
    assert!(shown.ends_with("..."));
    assert!(newest.get("ip_hash").is_none());
    assert!(newest.get("user_agent").is_none());
    assert!(newest["created_at"].is_string());

    assert_eq!(entries[1]["text_input"], "Hello, how are you today?");
    assert_eq!(entries[1]["prediction"], "not_spam");
}

#[tokio::test]
async fn test_history_is_capped_at_limit() {
    let mut config = test_config();
    config.history.limit = 3;
    let app = build_app(config, true);

    for i in 0..5 {
        send(&app, classify_request(json!({ "text": format!("hello {i}") }))).await;
    }

    let (_, body) = send(&app, get("/api/ml/history/")).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["text_input"], "hello 4");
}

#[tokio::test]
async fn test_history_listing_is_cached() {
    let mut config = test_config();
    config.history.cache_ttl_secs = 300;
    let app = build_app(config, true);

    let (_, before) = send(&app, get("/api/ml/history/")).await;
    assert_eq!(before, json!([]));

    send(&app, classify_request(json!({ "text": "Buy now" }))).await;

    let (status, after) = send(&app, get("/api/ml/history/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after, json!([]));
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let mut config = test_config();
    config.rate_limit.requests_per_minute = 2;
    let app = build_app(config, true);

    let from = |addr: &str| {
        let mut request = classify_request(json!({ "text": "Buy now" }));
        let addr: SocketAddr = addr.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    };

    assert_eq!(send(&app, from("10.0.0.1:5000")).await.0, StatusCode::OK);
    assert_eq!(send(&app, from("10.0.0.1:5001")).await.0, StatusCode::OK);

    let (status, body) = send(&app, from("10.0.0.1:5002")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].is_string());

    assert_eq!(send(&app, from("10.0.0.2:5000")).await.0, StatusCode::OK);
}

struct PanickingModel {
    dimension: usize,
}

impl DecisionModel for PanickingModel {
    fn predict_class(&self, _features: &FeatureVector) -> u8 {
        panic!("simulated model fault");
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

#[tokio::test]
async fn test_inference_fault_is_internal_error() {
    let dimension = test_model(None).vectorizer.dimension();
    let model = test_model(Some(Arc::new(PanickingModel { dimension })));
    let app = build_app_with(test_config(), Some(model));

    let (status, body) = send(&app, classify_request(json!({ "text": "Buy now" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));

    // Nothing is recorded for a failed classification
    let (_, history) = send(&app, get("/api/ml/history/")).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_method_and_route_errors() {
    let app = build_app(test_config(), true);

    let response = app.clone().oneshot(get("/api/ml/classify/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&app, get("/api/ml/unknown/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_liveness_and_metrics() {
    let app = build_app(test_config(), false);

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
