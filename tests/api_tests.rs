//! API integration tests
//!
//! These tests require a running worker (with the real model loaded).
//! Run with: cargo test --test api_tests

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const BASE_URL: &str = "http://localhost:8100";

/// Check if the worker is available
async fn api_available() -> bool {
    let client = Client::new();
    client
        .get(format!("{}/health", BASE_URL))
        .timeout(Duration::from_secs(2))
        .send()
        .await
        .map(|r| r.status().is_success())
        .unwrap_or(false)
}

#[tokio::test]
async fn test_health_endpoint() {
    if !api_available().await {
        eprintln!("Skipping test: worker not available at {}", BASE_URL);
        return;
    }

    let client = Client::new();
    let resp = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["model"].is_string());
    assert!(body["dimension"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_embed_endpoint() {
    if !api_available().await {
        eprintln!("Skipping test: worker not available");
        return;
    }

    let client = Client::new();
    let resp = client
        .post(format!("{}/embed", BASE_URL))
        .json(&json!({"texts": ["Hello world", "How are you?"]}))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["count"], 2);

    let dimension = body["dimension"].as_u64().unwrap() as usize;
    let embeddings = body["embeddings"].as_array().unwrap();
    assert_eq!(embeddings.len(), 2);

    for embedding in embeddings {
        let vector: Vec<f64> = embedding
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert_eq!(vector.len(), dimension);

        let norm: f64 = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!(
            (norm - 1.0).abs() < 0.01,
            "embedding must be unit-norm, got {}",
            norm
        );
    }
}

#[tokio::test]
async fn test_embed_empty_validation() {
    if !api_available().await {
        eprintln!("Skipping test: worker not available");
        return;
    }

    let client = Client::new();
    let resp = client
        .post(format!("{}/embed", BASE_URL))
        .json(&json!({"texts": []}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn test_extract_entities_endpoint() {
    if !api_available().await {
        eprintln!("Skipping test: worker not available");
        return;
    }

    let client = Client::new();
    let resp = client
        .post(format!("{}/extract-entities", BASE_URL))
        .json(&json!({"text": "We use Python and SurrealDB"}))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());

    let body: Value = resp.json().await.unwrap();
    assert!(body["count"].as_u64().unwrap() >= 2);

    let names: Vec<&str> = body["entities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Python"));
    assert!(names.contains(&"SurrealDB"));
}

#[tokio::test]
async fn test_extract_entities_empty_validation() {
    if !api_available().await {
        eprintln!("Skipping test: worker not available");
        return;
    }

    let client = Client::new();
    let resp = client
        .post(format!("{}/extract-entities", BASE_URL))
        .json(&json!({"text": ""}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
}
