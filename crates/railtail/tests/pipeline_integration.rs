//! Metadata resolver and end-to-end pipeline tests.
//!
//! The query API is served by `mockito`; the subscription endpoint by the
//! mock provider in `common`.

mod common;

use std::time::Duration;

use common::{config_for, operation_id, record, MockProvider, STEP, TEST_TOKEN};
use mockito::{Matcher, Mock, Server, ServerGuard};
use railtail::{
    log_channel, GraphQlClient, LogPipeline, MetadataResolver, StreamConfig, StreamError,
};
use serde_json::json;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Test Helpers
// ============================================================================

async fn mock_environment(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/graphql")
        .match_header("authorization", "Bearer test-token")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({ "variables": { "id": "env-1" } })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({ "data": { "environment": { "id": "env-1", "projectId": "proj-1" } } })
                .to_string(),
        )
        .create_async()
        .await
}

async fn mock_project(server: &mut ServerGuard) -> Mock {
    let body = json!({
        "data": { "project": {
            "id": "proj-1",
            "name": "shop",
            "services": { "edges": [
                { "node": { "id": "svc-1", "name": "api" } },
                { "node": { "id": "svc-2", "name": "worker" } },
            ]},
            "environments": { "edges": [
                { "node": { "id": "env-1", "name": "production" } },
                { "node": { "id": "env-2", "name": "staging" } },
            ]},
        }}
    });

    server
        .mock("POST", "/graphql")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJson(json!({ "variables": { "id": "proj-1" } })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

fn resolver(server: &ServerGuard) -> MetadataResolver {
    let client = GraphQlClient::new(
        format!("{}/graphql", server.url()),
        TEST_TOKEN,
        Duration::from_secs(5),
    )
    .expect("failed to build client");
    MetadataResolver::new(client)
}

// ============================================================================
// Metadata Resolver Tests
// ============================================================================

#[tokio::test]
async fn test_resolve_builds_full_table() {
    let mut server = Server::new_async().await;
    let environment = mock_environment(&mut server).await;
    let project = mock_project(&mut server).await;

    let table = resolver(&server).resolve("env-1").await.unwrap();

    environment.assert_async().await;
    project.assert_async().await;
    assert_eq!(table.len(), 5);
    assert_eq!(table.get("proj-1"), Some("shop"));
    assert_eq!(table.get("svc-1"), Some("api"));
    assert_eq!(table.get("svc-2"), Some("worker"));
    assert_eq!(table.get("env-1"), Some("production"));
    assert_eq!(table.get("env-2"), Some("staging"));
}

#[tokio::test]
async fn test_server_error_is_metadata_fetch_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/graphql")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let err = resolver(&server).resolve("env-1").await.unwrap_err();

    assert!(matches!(err, StreamError::MetadataFetch(_)));
    assert!(err.to_string().contains("500"));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_graphql_errors_are_metadata_fetch_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(json!({ "errors": [{ "message": "Not Authorized" }] }).to_string())
        .create_async()
        .await;

    let err = resolver(&server).resolve("env-1").await.unwrap_err();

    assert!(matches!(err, StreamError::MetadataFetch(_)));
    assert!(err.to_string().contains("Not Authorized"));
}

#[tokio::test]
async fn test_malformed_body_is_metadata_fetch_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(json!({ "data": { "environment": { "id": "env-1" } } }).to_string())
        .create_async()
        .await;

    let err = resolver(&server).resolve("env-1").await.unwrap_err();

    assert!(matches!(err, StreamError::MetadataFetch(_)));
    assert!(err.to_string().contains("malformed"));
}

#[tokio::test]
async fn test_project_query_failure_is_fatal() {
    let mut server = Server::new_async().await;
    let _environment = mock_environment(&mut server).await;
    let _project = server
        .mock("POST", "/graphql")
        .match_body(Matcher::PartialJson(json!({ "variables": { "id": "proj-1" } })))
        .with_status(502)
        .create_async()
        .await;

    let err = resolver(&server).resolve("env-1").await.unwrap_err();
    assert!(err.is_fatal());
}

// ============================================================================
// Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_pipeline_streams_enriched_documents() {
    let mut server = Server::new_async().await;
    let _environment = mock_environment(&mut server).await;
    let _project = mock_project(&mut server).await;

    let provider = MockProvider::new().await;
    let mut config = config_for(&provider);
    config.api_url = format!("{}/graphql", server.url());

    let pipeline = LogPipeline::new(config).unwrap();
    let supervisor = pipeline.supervisor();
    let (sink, mut batches) = log_channel(4);
    let cancel = CancellationToken::new();

    let run = {
        let cancel = cancel.clone();
        tokio::spawn(async move { pipeline.run(sink, cancel).await })
    };

    let (mut conn, subscribe) = provider.accept_subscribed().await;
    let mut worker = record(2, "job done");
    worker["tags"]["serviceId"] = json!("svc-2");
    conn.send_records(&operation_id(&subscribe), vec![record(1, "ready"), worker])
        .await;

    let batch = timeout(STEP, batches.recv()).await.unwrap().unwrap();
    let services: Vec<_> = batch
        .documents
        .iter()
        .map(|d| d["_metadata"]["serviceName"].clone())
        .collect();
    assert_eq!(services, vec![json!("api"), json!("worker")]);
    assert_eq!(batch.documents[0]["_metadata"]["projectName"], "shop");

    cancel.cancel();
    timeout(STEP, run).await.unwrap().unwrap().unwrap();
    assert_eq!(supervisor.epoch(), 1);
}

#[tokio::test]
async fn test_pipeline_stops_on_metadata_failure_without_connecting() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/graphql")
        .with_status(401)
        .create_async()
        .await;

    let provider = MockProvider::new().await;
    let mut config = config_for(&provider);
    config.api_url = format!("{}/graphql", server.url());

    let pipeline = LogPipeline::new(config).unwrap();
    let (sink, _batches) = log_channel(1);

    let err = pipeline
        .run(sink, CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, StreamError::MetadataFetch(_)));
    assert_eq!(pipeline.supervisor().epoch(), 0);
}

#[tokio::test]
async fn test_pipeline_finishes_when_receiver_dropped() {
    let mut server = Server::new_async().await;
    let _environment = mock_environment(&mut server).await;
    let _project = mock_project(&mut server).await;

    let provider = MockProvider::new().await;
    let mut config = config_for(&provider);
    config.api_url = format!("{}/graphql", server.url());

    let pipeline = LogPipeline::new(config).unwrap();
    let (sink, batches) = log_channel(1);
    drop(batches);

    let run = tokio::spawn(async move { pipeline.run(sink, CancellationToken::new()).await });

    let (mut conn, subscribe) = provider.accept_subscribed().await;
    conn.send_records(&operation_id(&subscribe), vec![record(1, "dropped")])
        .await;

    let result = timeout(STEP, run).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[test]
fn test_pipeline_rejects_missing_environment() {
    let err = LogPipeline::new(StreamConfig::new(TEST_TOKEN, "")).unwrap_err();
    assert!(matches!(err, StreamError::Config(_)));
}
