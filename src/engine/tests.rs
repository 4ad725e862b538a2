//! Tests for the sync engine

use super::*;
use crate::catalog::discover;
use crate::config::SearchFilter;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const START: &str = "2020-05-14T14:14:14.455852+00:00";

fn obj(value: JsonValue) -> JsonObject {
    value.as_object().cloned().unwrap()
}

fn test_config(server: &MockServer) -> TapConfig {
    TapConfig::new("acme")
        .with_personal_access_token("mock-token")
        .with_start_date(START)
        .with_base_urls(server.uri(), format!("{}/connect/token", server.uri()))
}

fn engine_for(server: &MockServer, datasources: &[&str]) -> SyncEngine {
    let names: Vec<String> = datasources.iter().map(ToString::to_string).collect();
    let catalog = discover(&names).unwrap();
    SyncEngine::new(test_config(server), catalog, StateManager::in_memory()).unwrap()
}

fn records(messages: &[Message]) -> Vec<JsonObject> {
    messages
        .iter()
        .filter_map(Message::as_record)
        .cloned()
        .collect()
}

fn kinds(messages: &[Message]) -> Vec<&'static str> {
    messages
        .iter()
        .map(|m| match m {
            Message::Schema { .. } => "schema",
            Message::Record { .. } => "record",
            Message::State { .. } => "state",
        })
        .collect()
}

#[tokio::test]
async fn test_pages_until_no_continuation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datagateway/v3/acme/datasources/ref/site/data/query"))
        .and(body_json(json!({"continuationToken": "more"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [{"rowData": {"reference": "R2"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/datagateway/v3/acme/datasources/ref/site/data/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "continuationToken": "more",
            "rows": [{"rowData": {"reference": "R1"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, &["site"]);
    let mut messages: Vec<Message> = Vec::new();
    let stats = engine.run(&mut messages).await.unwrap();

    assert_eq!(
        kinds(&messages),
        vec!["schema", "record", "state", "record", "state"]
    );
    assert_eq!(
        records(&messages),
        vec![obj(json!({"reference": "R1"})), obj(json!({"reference": "R2"}))]
    );
    assert_eq!(stats.records_for("site_stream"), 2);
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.checkpoints, 2);
}

#[tokio::test]
async fn test_empty_page_writes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datagateway/v3/acme/datasources/ref/customer/data/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, &["customer"]);
    let mut messages: Vec<Message> = Vec::new();
    engine.run(&mut messages).await.unwrap();

    assert_eq!(kinds(&messages), vec!["schema"]);
}

#[tokio::test]
async fn test_no_data_response_ends_stream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datagateway/v3/acme/datasources/ref/project/data/query"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, &["project"]);
    let mut messages: Vec<Message> = Vec::new();
    let stats = engine.run(&mut messages).await.unwrap();

    assert_eq!(kinds(&messages), vec!["schema"]);
    assert_eq!(stats.pages_fetched, 0);
    assert_eq!(stats.streams_synced, 1);
}

#[tokio::test]
async fn test_sibling_last_modified_is_merged() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/datagateway/v3/acme/datasources/ref/project/data/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [{
                "lastModified": "2021-02-24T08:30:26+00:00",
                "rowData": {"reference": "75521249", "customer": {"Id": "2386264880"}}
            }]
        })))
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, &["project"]);
    let mut messages: Vec<Message> = Vec::new();
    engine.run(&mut messages).await.unwrap();

    assert_eq!(
        records(&messages),
        vec![obj(json!({
            "reference": "75521249",
            "customer_id": "2386264880",
            "lastModified": "2021-02-24T08:30:26+00:00"
        }))]
    );
}

#[tokio::test]
async fn test_missing_bookmark_does_not_advance() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/workflow/v4/acme/workItems/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"workItemId": "W1", "lastModified": "2021-01-01T00:00:00Z"},
                {"workItemId": "W2"},
                {"workItemId": "W3", "lastModified": ""}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = engine_for(&server, &["work-item"]);
    let mut messages: Vec<Message> = Vec::new();
    engine.run(&mut messages).await.unwrap();

    assert_eq!(records(&messages).len(), 3);
    assert_eq!(
        engine.state().bookmark("workitem_stream"),
        Some(&json!("2021-01-01T00:00:00Z"))
    );
}

#[tokio::test]
async fn test_filtered_search_advances_filter_bookmark() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/workflow/v4/acme/workItems/search"))
        .and(body_json(json!({
            "lastModifiedAfter": START,
            "orderBy": "lastModified",
            "orderByDirection": "ascending",
            "filterGroups": [{"filters": [{"fieldName": "isCompleted", "value": true}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"workItemId": "W1", "lastModified": "2021-03-01T00:00:00Z"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server).with_workitem_filter(SearchFilter::new(
        "completed",
        json!([{"fieldName": "isCompleted", "value": true}]),
    ));
    let catalog = discover(&["work-item".to_string()]).unwrap();
    let mut engine = SyncEngine::new(config, catalog, StateManager::in_memory()).unwrap();
    let mut messages: Vec<Message> = Vec::new();
    engine.run(&mut messages).await.unwrap();

    assert_eq!(
        engine.state().bookmark("workitem_stream_completed"),
        Some(&json!("2021-03-01T00:00:00Z"))
    );
    assert_eq!(engine.state().bookmark("workitem_stream"), None);
    assert_eq!(
        messages.last().and_then(Message::as_state),
        Some(&json!({"workitem_stream_completed": "2021-03-01T00:00:00Z"}))
    );
}

#[tokio::test]
async fn test_child_streams_not_synced_alone() {
    let server = MockServer::start().await;

    let mut engine = engine_for(&server, &["work-item-history", "activity"]);
    let mut messages: Vec<Message> = Vec::new();
    let stats = engine.run(&mut messages).await.unwrap();

    assert_eq!(kinds(&messages), vec!["schema", "schema"]);
    assert_eq!(stats.streams_synced, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_state_output_persisted() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    Mock::given(method("POST"))
        .and(path("/workflow/v4/acme/workItems/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"workItemId": "W1", "lastModified": "2021-01-01T00:00:00Z"}]
        })))
        .mount(&server)
        .await;

    let catalog = discover(&["work-item".to_string()]).unwrap();
    let state = StateManager::in_memory().with_output(&state_path);
    let mut engine = SyncEngine::new(test_config(&server), catalog, state).unwrap();
    let mut messages: Vec<Message> = Vec::new();
    engine.run(&mut messages).await.unwrap();

    let saved = StateManager::from_file(&state_path).unwrap();
    assert_eq!(
        saved.bookmark("workitem_stream"),
        Some(&json!("2021-01-01T00:00:00Z"))
    );
}

#[test]
fn test_bookmark_value() {
    let record = obj(json!({"a": "x", "b": null, "c": "", "d": 5}));
    assert_eq!(bookmark_value(&record, "a"), Some(json!("x")));
    assert_eq!(bookmark_value(&record, "b"), None);
    assert_eq!(bookmark_value(&record, "c"), None);
    assert_eq!(bookmark_value(&record, "d"), Some(json!(5)));
    assert_eq!(bookmark_value(&record, "missing"), None);
}

#[test]
fn test_history_record_timestamps() {
    let parent = json!("2020-12-01T12:26:21Z");

    let transitioned = Row::new(obj(json!({
        "stage_transition_receivedAt": "received",
        "stage_transition_transitionedAt": "transitioned"
    })));
    assert_eq!(
        history_record(transitioned, Some(&parent))["lastModified"],
        "transitioned"
    );

    let received = Row::new(obj(json!({"stage_transition_receivedAt": "received"})));
    assert_eq!(
        history_record(received, Some(&parent))["lastModified"],
        "received"
    );

    let bare = Row::new(obj(json!({"stage_stageType": "Unassigned"})));
    assert_eq!(history_record(bare.clone(), Some(&parent))["lastModified"], parent);
    assert_eq!(history_record(bare, None)["lastModified"], JsonValue::Null);
}
