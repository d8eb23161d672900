use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tracing::{debug, warn};

use super::domain::{Person, PersonId};
use super::service::MatchingService;

/// Router builder exposing submission, optimization and live result endpoints.
pub fn matching_router(service: Arc<MatchingService>) -> Router {
    Router::new()
        .route("/preferences", post(submit_handler))
        .route("/optimize", post(optimize_handler))
        .route("/assignments", get(assignments_socket))
        .route("/api/v1/catalog", get(catalog_handler))
        .route("/api/v1/preferences", get(preferences_handler))
        .route("/api/v1/preferences/:person_id", get(person_handler))
        .with_state(service)
}

pub(crate) async fn submit_handler(
    State(service): State<Arc<MatchingService>>,
    axum::Json(person): axum::Json<Person>,
) -> Response {
    match service.submit_preferences(person) {
        Ok(stored) => {
            let payload = json!({
                "status": "received",
                "id": stored.id,
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn optimize_handler(State(service): State<Arc<MatchingService>>) -> Response {
    let ticket = service.trigger_run();
    let payload = json!({
        "status": "started",
        "run": ticket.sequence,
    });
    (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
}

pub(crate) async fn catalog_handler(State(service): State<Arc<MatchingService>>) -> Response {
    let services = service.catalog().services().to_vec();
    (StatusCode::OK, axum::Json(services)).into_response()
}

pub(crate) async fn preferences_handler(State(service): State<Arc<MatchingService>>) -> Response {
    let people: Vec<Person> = service
        .snapshot()
        .people()
        .iter()
        .map(|person| person.as_ref().clone())
        .collect();
    (StatusCode::OK, axum::Json(people)).into_response()
}

pub(crate) async fn person_handler(
    State(service): State<Arc<MatchingService>>,
    Path(person_id): Path<String>,
) -> Response {
    let id = PersonId(person_id);
    match service.person(&id) {
        Some(person) => (StatusCode::OK, axum::Json(person.as_ref().clone())).into_response(),
        None => {
            let payload = json!({
                "error": format!("no preferences recorded for volunteer {id}"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn assignments_socket(
    State(service): State<Arc<MatchingService>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| stream_assignments(socket, service))
}

/// Forwards every published batch to the socket as one JSON text frame until either side
/// goes away.
async fn stream_assignments(socket: WebSocket, service: Arc<MatchingService>) {
    let mut subscription = service.subscribe();
    let subscription_id = subscription.id();
    let (mut sender, mut receiver) = socket.split();
    debug!(subscription = %subscription_id, "assignment listener connected");

    loop {
        tokio::select! {
            batch = subscription.recv() => {
                let Some(batch) = batch else { break };
                let payload = match serde_json::to_string(&*batch) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(error = %err, "failed to serialize assignments");
                        continue;
                    }
                };
                if let Err(err) = sender.send(Message::Text(payload)).await {
                    warn!(error = %err, subscription = %subscription_id, "failed to push assignments");
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(error = %err, subscription = %subscription_id, "listener socket error");
                    break;
                }
            },
        }
    }

    service.unsubscribe(subscription_id);
    debug!(subscription = %subscription_id, "assignment listener disconnected");
}
