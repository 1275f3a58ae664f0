use super::*;
use axum::{
    extract::Query,
    http::HeaderMap,
    response::{IntoResponse, Response as HttpResponse},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use tokio::net::TcpListener;

fn event_a() -> serde_json::Value {
    json!({
        "id": "evt-a",
        "name": "Launch Party",
        "description": "kickoff",
        "created_at": "2026-02-01T18:00:00Z"
    })
}

fn event_b() -> serde_json::Value {
    json!({
        "id": "evt-b",
        "name": "Demo Day",
        "created_at": "2026-03-10T12:00:00Z"
    })
}

async fn handle_events(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> HttpResponse {
    if headers.get("apikey").is_none() || headers.get("authorization").is_none() {
        return (StatusCode::UNAUTHORIZED, "missing service credentials").into_response();
    }

    let select = params.get("select").cloned().unwrap_or_default();
    if !select.contains("assets") {
        return Json(json!([event_a(), event_b()])).into_response();
    }

    // Single-object read: the accept header must request exactly one row.
    if headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("vnd.pgrst.object"))
        != Some(true)
    {
        return (StatusCode::BAD_REQUEST, "expected single-object accept header").into_response();
    }

    let id = params
        .get("id")
        .and_then(|v| v.strip_prefix("eq."))
        .unwrap_or_default();
    match id {
        "evt-a" => Json(json!({
            "id": "evt-a",
            "name": "Launch Party",
            "description": "kickoff",
            "created_at": "2026-02-01T18:00:00Z",
            "assets": [{
                "id": "ast-1",
                "event_id": "evt-a",
                "url": "https://media.test/ast-1.jpg",
                "created_at": "2026-02-02T09:00:00Z"
            }]
        }))
        .into_response(),
        // Simulates a faulty service answering with a different row.
        "evt-swapped" => Json(event_a()).into_response(),
        _ => (
            StatusCode::NOT_ACCEPTABLE,
            "JSON object requested, multiple (or no) rows returned",
        )
            .into_response(),
    }
}

async fn handle_memberships(Query(params): Query<HashMap<String, String>>) -> HttpResponse {
    let user = params
        .get("user_id")
        .and_then(|v| v.strip_prefix("eq."))
        .unwrap_or_default();
    match user {
        "user-err" => (StatusCode::INTERNAL_SERVER_ERROR, "simulated failure").into_response(),
        "user-1" => Json(json!([
            {
                "user_id": "user-1",
                "event_id": "evt-a",
                "created_at": "2026-02-01T18:05:00Z",
                "events": {
                    "id": "evt-a",
                    "name": "Launch Party",
                    "created_at": "2026-02-01T18:00:00Z",
                    "event_memberships": [{"count": 2}]
                }
            },
            // Row for another user that a buggy service might leak through.
            {
                "user_id": "user-9",
                "event_id": "evt-b",
                "created_at": "2026-03-01T08:00:00Z",
                "events": {
                    "id": "evt-b",
                    "name": "Demo Day",
                    "created_at": "2026-03-10T12:00:00Z",
                    "event_memberships": [{"count": 1}]
                }
            }
        ]))
        .into_response(),
        _ => Json(json!([])).into_response(),
    }
}

async fn spawn_data_service() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let app = Router::new()
        .route("/rest/v1/events", get(handle_events))
        .route("/rest/v1/event_memberships", get(handle_memberships));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn lists_all_events_in_service_order() {
    let session = DataSession::new(spawn_data_service().await, "test-key");

    let events = list_events(&session).await.expect("list events");

    let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Launch Party", "Demo Day"]);
    assert!(events.iter().all(|e| e.assets.is_empty()));
}

#[tokio::test]
async fn get_event_returns_requested_record_with_assets() {
    let session = DataSession::new(spawn_data_service().await, "test-key");

    let event = get_event(&session, &EventId::from("evt-a"))
        .await
        .expect("get event");

    assert_eq!(event.id, EventId::from("evt-a"));
    assert_eq!(event.assets.len(), 1);
    assert_eq!(event.assets[0].url, "https://media.test/ast-1.jpg");
}

#[tokio::test]
async fn get_event_for_missing_id_fails_with_not_exactly_one() {
    let session = DataSession::new(spawn_data_service().await, "test-key");

    let err = get_event(&session, &EventId::from("missing-id"))
        .await
        .expect_err("missing id must fail");

    assert!(matches!(err, RemoteQueryError::NotExactlyOne { id } if id.as_str() == "missing-id"));
}

#[tokio::test]
async fn get_event_never_returns_a_mismatched_record() {
    let session = DataSession::new(spawn_data_service().await, "test-key");

    let err = get_event(&session, &EventId::from("evt-swapped"))
        .await
        .expect_err("mismatched row must fail");

    assert!(matches!(
        err,
        RemoteQueryError::MismatchedRow { requested, returned }
            if requested.as_str() == "evt-swapped" && returned.as_str() == "evt-a"
    ));
}

#[tokio::test]
async fn memberships_map_to_annotated_events_for_that_user_only() {
    let session = DataSession::new(spawn_data_service().await, "test-key");

    let events = list_events_for_user(&session, &UserId::from("user-1"))
        .await
        .expect("list for user");

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, EventId::from("evt-a"));
    assert_eq!(events[0].attendee_count, Some(2));
}

#[tokio::test]
async fn user_without_memberships_gets_an_empty_list() {
    let session = DataSession::new(spawn_data_service().await, "test-key");

    let events = list_events_for_user(&session, &UserId::from("user-2"))
        .await
        .expect("list for user");

    assert!(events.is_empty());
}

#[tokio::test]
async fn rejected_query_surfaces_status_and_message() {
    let session = DataSession::new(spawn_data_service().await, "test-key");

    let err = list_events_for_user(&session, &UserId::from("user-err"))
        .await
        .expect_err("rejection must propagate");

    assert!(matches!(
        err,
        RemoteQueryError::Rejected { status: 500, ref message } if message.contains("simulated")
    ));
}

#[tokio::test]
async fn blank_identifiers_fail_before_any_request() {
    let session = DataSession::new("http://127.0.0.1:9", "test-key");

    let err = get_event(&session, &EventId::from("  "))
        .await
        .expect_err("blank id must fail");
    assert!(matches!(err, RemoteQueryError::BlankIdentifier));

    let err = list_events_for_user(&session, &UserId::from(""))
        .await
        .expect_err("blank user id must fail");
    assert!(matches!(err, RemoteQueryError::BlankIdentifier));
}
