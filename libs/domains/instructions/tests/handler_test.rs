//! Handler tests for Instructions domain
//!
//! These tests drive the HTTP router end to end against the in-memory
//! repository and a keyword embedder:
//! - Request deserialization and validation
//! - Status codes and response bodies
//! - Ordering between the embedding call and the store call

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum_helpers::ErrorResponse;
use domain_instructions::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use test_utils::TestDataBuilder;
use test_utils::assertions::assert_descending;
use tower::ServiceExt; // For oneshot()

const DIMENSION: u64 = 4;

/// Embeds text onto a few topic axes so similarity is predictable.
struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, text: &str) -> InstructionResult<Vec<f32>> {
        let text = text.to_lowercase();
        let axis = |words: &[&str]| {
            if words.iter().any(|w| text.contains(w)) {
                1.0
            } else {
                0.0
            }
        };
        Ok(vec![
            axis(&["french", "français"]),
            axis(&["brief", "short", "concise"]),
            axis(&["code", "rust"]),
            0.1,
        ])
    }
}

struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    fn model(&self) -> &str {
        "unreachable"
    }

    async fn embed(&self, _text: &str) -> InstructionResult<Vec<f32>> {
        Err(InstructionError::Embedding(
            "error sending request: connection refused".to_string(),
        ))
    }
}

fn app_with(repo: InMemoryInstructionRepository, embedder: Arc<dyn EmbeddingProvider>) -> Router {
    let service = InstructionService::new(
        repo,
        embedder,
        ServiceConfig::default().with_vector_size(DIMENSION),
    );
    handlers::router(service)
}

fn app() -> Router {
    app_with(InMemoryInstructionRepository::new(), Arc::new(KeywordEmbedder))
}

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn add(
    app: &Router,
    collection: &str,
    id: &str,
    content: &str,
    metadata: Value,
) -> StatusCode {
    let request = json_request(
        Method::POST,
        "/instructions",
        json!({
            "collection_name": collection,
            "instruction_id": id,
            "content": content,
            "metadata": metadata
        }),
    );
    app.clone().oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn test_french_scenario() {
    let app = app();

    let request = json_request(
        Method::POST,
        "/instructions",
        json!({
            "collection_name": "docs",
            "instruction_id": "a1",
            "content": "Always answer in French",
            "metadata": {"lang": "fr"}
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let status: StatusResponse = json_body(response.into_body()).await;
    assert_eq!(status.status, "success");

    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, "/instructions/docs/a1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(
        body,
        json!({
            "instruction_id": "a1",
            "content": "Always answer in French",
            "metadata": {"lang": "fr"}
        })
    );

    add(&app, "docs", "b1", "Keep replies brief", json!({})).await;

    let request = json_request(
        Method::POST,
        "/instructions/search",
        json!({"collection_name": "docs", "query": "respond in French", "limit": 1}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let hits: Vec<ScoredInstruction> = json_body(response.into_body()).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].instruction_id, "a1");
    assert_eq!(hits[0].content, "Always answer in French");
}

#[tokio::test]
async fn test_add_then_get_round_trips_nested_metadata() {
    let app = app();
    let builder = TestDataBuilder::from_test_name("round_trip");
    let collection = builder.collection_name("main");
    let id = builder.instruction_id("nested");

    let metadata = json!({"tags": ["tone", {"weight": 2}], "owner": {"team": "core"}, "draft": null});
    assert_eq!(
        add(&app, &collection, &id, "Write idiomatic Rust code", metadata.clone()).await,
        StatusCode::CREATED
    );

    let response = app
        .oneshot(empty_request(Method::GET, &format!("/instructions/{collection}/{id}")))
        .await
        .unwrap();
    let instruction: Instruction = json_body(response.into_body()).await;
    assert_eq!(instruction.instruction_id, id);
    assert_eq!(Value::Object(instruction.metadata), metadata);
}

#[tokio::test]
async fn test_uuid_instruction_id_round_trips() {
    let app = app();
    let id = TestDataBuilder::from_test_name("uuid_id").uuid().to_string();

    add(&app, "docs", &id, "Be concise", json!({})).await;

    let response = app
        .oneshot(empty_request(Method::GET, &format!("/instructions/docs/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let instruction: Instruction = json_body(response.into_body()).await;
    assert_eq!(instruction.instruction_id, id);
}

#[tokio::test]
async fn test_repeated_add_is_last_write_wins() {
    let app = app();

    add(&app, "docs", "a1", "Always answer in French", json!({"v": 1})).await;
    add(&app, "docs", "a1", "Keep replies brief", json!({"v": 2})).await;

    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, "/instructions/docs/a1"))
        .await
        .unwrap();
    let instruction: Instruction = json_body(response.into_body()).await;
    assert_eq!(instruction.content, "Keep replies brief");
    assert_eq!(instruction.metadata["v"], 2);

    let request = json_request(
        Method::POST,
        "/collections/instructions/list",
        json!({"collection_name": "docs"}),
    );
    let items: Vec<Instruction> = json_body(app.oneshot(request).await.unwrap().into_body()).await;
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_get_missing_instruction_returns_404() {
    let app = app();
    add(&app, "docs", "a1", "Always answer in French", json!({})).await;

    let response = app
        .oneshot(empty_request(Method::GET, "/instructions/docs/nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let error: ErrorResponse = json_body(response.into_body()).await;
    assert_eq!(error.error, "NOT_FOUND");
    assert!(error.message.contains("nope"));
}

#[tokio::test]
async fn test_get_from_unknown_collection_is_dependency_failure() {
    let response = app()
        .oneshot(empty_request(Method::GET, "/instructions/ghost/a1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = json_body(response.into_body()).await;
    assert_eq!(error.error, "DEPENDENCY_FAILURE");
    assert!(error.message.contains("ghost"));
}

#[tokio::test]
async fn test_delete_then_get_returns_404() {
    let app = app();
    add(&app, "docs", "a1", "Always answer in French", json!({})).await;

    let response = app
        .clone()
        .oneshot(empty_request(Method::DELETE, "/instructions/docs/a1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status: StatusResponse = json_body(response.into_body()).await;
    assert_eq!(status.status, "success");

    let response = app
        .clone()
        .oneshot(empty_request(Method::GET, "/instructions/docs/a1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Deleting again is still a success.
    let response = app
        .oneshot(empty_request(Method::DELETE, "/instructions/docs/a1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_is_nearest_first_and_capped() {
    let app = app();
    add(&app, "docs", "fr", "Always answer in French", json!({})).await;
    add(&app, "docs", "brief", "Keep replies brief", json!({})).await;
    add(&app, "docs", "code", "Prefer Rust code samples", json!({})).await;
    add(&app, "docs", "fr-brief", "Short answers in French", json!({})).await;

    let request = json_request(
        Method::POST,
        "/instructions/search",
        json!({"collection_name": "docs", "query": "brief French reply", "limit": 3}),
    );
    let hits: Vec<ScoredInstruction> =
        json_body(app.clone().oneshot(request).await.unwrap().into_body()).await;

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].instruction_id, "fr-brief");
    let scores: Vec<f32> = hits.iter().map(|h| h.score).collect();
    assert_descending(&scores, "search");

    // Default limit is 5, more than stored
    let request = json_request(
        Method::POST,
        "/instructions/search",
        json!({"collection_name": "docs", "query": "anything"}),
    );
    let hits: Vec<ScoredInstruction> =
        json_body(app.oneshot(request).await.unwrap().into_body()).await;
    assert_eq!(hits.len(), 4);
}

#[tokio::test]
async fn test_search_zero_limit_is_store_failure() {
    let app = app();
    add(&app, "docs", "a1", "Always answer in French", json!({})).await;

    let request = json_request(
        Method::POST,
        "/instructions/search",
        json!({"collection_name": "docs", "query": "French", "limit": 0}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_list_instructions_respects_limit() {
    let app = app();
    for i in 0..5 {
        add(&app, "docs", &format!("i{i}"), &format!("Rule number {i}"), json!({})).await;
    }

    let request = json_request(
        Method::POST,
        "/collections/instructions/list",
        json!({"collection_name": "docs", "limit": 2}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let items: Vec<Instruction> = json_body(response.into_body()).await;
    assert_eq!(items.len(), 2);

    let request = json_request(
        Method::POST,
        "/collections/instructions/list",
        json!({"collection_name": "docs"}),
    );
    let items: Vec<Value> = json_body(app.oneshot(request).await.unwrap().into_body()).await;
    assert_eq!(items.len(), 5);
    assert!(items.iter().all(|item| item.get("vector").is_none()));
}

#[tokio::test]
async fn test_list_collections_after_adds() {
    let app = app();
    add(&app, "alpha", "a1", "Always answer in French", json!({})).await;
    add(&app, "beta", "b1", "Keep replies brief", json!({})).await;

    let response = app
        .oneshot(empty_request(Method::GET, "/collections"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut names: Vec<String> = json_body(response.into_body()).await;
    names.sort();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn test_unreachable_embedder_fails_without_store_writes() {
    let repo = InMemoryInstructionRepository::new();
    let app = app_with(repo.clone(), Arc::new(UnreachableEmbedder));

    let request = json_request(
        Method::POST,
        "/instructions",
        json!({"collection_name": "docs", "instruction_id": "a1", "content": "Always answer in French"}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = json_body(response.into_body()).await;
    assert!(error.message.contains("connection refused"));

    let request = json_request(
        Method::POST,
        "/instructions/search",
        json!({"collection_name": "docs", "query": "French"}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Nothing reached the store, not even the collection ensure
    assert!(repo.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_validates_input() {
    let app = app();

    let cases = [
        json!({"collection_name": "docs", "instruction_id": "", "content": "x"}),
        json!({"collection_name": "", "instruction_id": "a1", "content": "x"}),
        json!({"collection_name": "docs", "instruction_id": "a1", "content": ""}),
        json!({"collection_name": "docs", "instruction_id": "a1"}),
        json!({"collection_name": "docs", "instruction_id": "a1", "content": "x", "metadata": {"content": "shadow"}}),
        json!({"collection_name": "docs", "instruction_id": "a1", "content": "x", "metadata": "flat"}),
    ];

    for body in cases {
        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/instructions", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/instructions/search")
        .header("content-type", "application/json")
        .body(Body::from("{\"collection_name\": \"docs\","))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_negative_limit_returns_400() {
    let request = json_request(
        Method::POST,
        "/collections/instructions/list",
        json!({"collection_name": "docs", "limit": -1}),
    );

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
