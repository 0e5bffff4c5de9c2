//! Integration tests against an in-process server.
//!
//! Each test binds a throwaway axum router to an ephemeral port and drives
//! the real client over HTTP.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use slotify_client::{Client, ClientError};
use slotify_core::{
    BlackoutList, Category, MeetingOptions, MeetingRequest, PlannerState, UploadError, UploadFile,
    UploadState,
};

async fn spawn_server(router: Router) -> Client {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Client::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap()
}

fn event_stream(chunks: &[&'static str]) -> Response {
    let parts: Vec<Result<&'static str, Infallible>> = chunks.iter().copied().map(Ok).collect();
    let body = Body::from_stream(futures::stream::iter(parts));
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

fn calendar() -> Option<UploadFile> {
    Some(UploadFile {
        file_name: "calendar.csv".to_string(),
        content: b"Alice,Standup,9:00,9:30\nBob,Review,13:00,14:00\n".to_vec(),
    })
}

#[tokio::test]
async fn rejected_upload_fails_with_server_message_and_restores_trigger() {
    let client = spawn_server(Router::new().route(
        "/api/upload",
        post(|_body: Bytes| async {
            (StatusCode::BAD_REQUEST, Json(json!({"error": "bad file"})))
        }),
    ))
    .await;

    let mut planner = PlannerState::new();
    let lifecycle = client
        .upload(calendar(), &mut planner.trigger, &CancellationToken::new(), |_| {})
        .await;

    assert_eq!(
        lifecycle.state(),
        &UploadState::Failed(UploadError::Validation("bad file".to_string()))
    );
    assert_eq!(lifecycle.message(), "bad file");
    assert!(planner.trigger.is_enabled());
    assert_eq!(planner.trigger.label(), "Upload");
}

#[tokio::test]
async fn successful_json_response_is_still_a_rejection() {
    let client = spawn_server(Router::new().route(
        "/api/upload",
        post(|_body: Bytes| async { Json(json!({"participants": []})) }),
    ))
    .await;

    let mut planner = PlannerState::new();
    let lifecycle = client
        .upload(calendar(), &mut planner.trigger, &CancellationToken::new(), |_| {})
        .await;

    assert_eq!(
        lifecycle.into_outcome(),
        Err(UploadError::Transport("Server error: 200".to_string()))
    );
}

#[tokio::test]
async fn streamed_upload_publishes_availability() {
    let client = spawn_server(Router::new().route(
        "/api/upload",
        post(|_body: Bytes| async {
            event_stream(&[
                "event: progress\ndata: {\"message\":\"Reading file\"}\n\n",
                "event: progress\ndata: {\"message\":\"Building schedules\"}\n",
                "\nevent: done\ndata: {\"busySlots\":{\"Alice\":[{\"start\":\"09:00\",\"end\":\"09:30\"}],",
                "\"Bob\":[{\"start\":\"13:00\",\"end\":\"14:00\"}]},\"participants\":[\"Alice\",\"Bob\"]}\n\n",
            ])
        }),
    ))
    .await;

    let mut planner = PlannerState::new();
    let mut progress = Vec::new();
    let lifecycle = client
        .upload(
            calendar(),
            &mut planner.trigger,
            &CancellationToken::new(),
            |message| progress.push(message.to_string()),
        )
        .await;

    assert_eq!(progress, vec!["Reading file", "Building schedules"]);
    planner.adopt(lifecycle.into_outcome().unwrap());
    assert_eq!(planner.participants(), ["Alice", "Bob"]);
    assert_eq!(planner.availability().busy_for("Bob").len(), 1);
    assert!(planner.trigger.is_enabled());
}

#[tokio::test]
async fn stream_closed_without_result_is_incomplete() {
    let client = spawn_server(Router::new().route(
        "/api/upload",
        post(|_body: Bytes| async {
            event_stream(&["event: progress\ndata: {\"message\":\"Reading file\"}\n\nevent: done\n"])
        }),
    ))
    .await;

    let mut planner = PlannerState::new();
    let lifecycle = client
        .upload(calendar(), &mut planner.trigger, &CancellationToken::new(), |_| {})
        .await;

    assert_eq!(lifecycle.into_outcome(), Err(UploadError::Incomplete));
    assert!(planner.trigger.is_enabled());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = Client::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();

    let mut planner = PlannerState::new();
    let lifecycle = client
        .upload(calendar(), &mut planner.trigger, &CancellationToken::new(), |_| {})
        .await;

    assert!(matches!(
        lifecycle.state(),
        UploadState::Failed(UploadError::Transport(_))
    ));
    assert!(planner.trigger.is_enabled());
}

#[tokio::test]
async fn state_round_trip_and_slot_search() {
    let client = spawn_server(
        Router::new()
            .route(
                "/api/state",
                get(|| async {
                    Json(json!({
                        "hasData": true,
                        "busySlots": {"Alice": [{"start": "09:00", "end": "10:00"}]},
                        "participants": ["Alice", "Bob", "Carol"],
                    }))
                })
                .delete(|| async { StatusCode::NO_CONTENT }),
            )
            .route(
                "/api/meeting-request",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "slots": [
                            {
                                "start": "11:00",
                                "availableOptional": body["optional"],
                                "unavailableOptional": [],
                            },
                            {"start": "15:00", "end": "15:30"},
                        ],
                    }))
                }),
            ),
    )
    .await;

    let mut planner = PlannerState::new();
    planner.restore(client.load_state().await.unwrap());
    assert_eq!(planner.participant_summary(), "3 participants");

    planner.selection.toggle("Alice", Category::Required).unwrap();
    planner.selection.toggle("Bob", Category::Required).unwrap();
    planner.selection.toggle("Carol", Category::Optional).unwrap();
    let options = MeetingOptions {
        duration_minutes: 30,
        ..MeetingOptions::default()
    };
    let request =
        MeetingRequest::build(&planner.selection, &options, &BlackoutList::new()).unwrap();

    let result = client.find_slots(&request).await.unwrap();
    assert_eq!(result.slots.len(), 2);
    assert_eq!(result.slots[0].available_optional, vec!["Carol"]);

    client.clear_state().await.unwrap();
    planner.reset();
    assert!(!planner.has_data());
}

#[tokio::test]
async fn slot_search_error_uses_payload_message() {
    let client = spawn_server(Router::new().route(
        "/api/meeting-request",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Participant not found: Zed"})),
            )
        }),
    ))
    .await;

    let request = MeetingRequest {
        required: vec!["Alice".to_string(), "Zed".to_string()],
        optional: Vec::new(),
        duration_minutes: 60,
        buffer_minutes: 0,
        blackouts: Vec::new(),
    };
    let err = client.find_slots(&request).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 400, .. }));
    assert_eq!(err.to_string(), "Participant not found: Zed");
}
