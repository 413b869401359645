//! Axum route handlers for the tailoring API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::{Stream, StreamExt};

use crate::errors::AppError;
use crate::state::AppState;
use crate::tailor::clear::{clear_all, ClearedFields};
use crate::tailor::generator::{tailor_updates, GenerationRequest};

/// SSE event name carrying one serialized `DisplayUpdate`.
pub const UPDATE_EVENT: &str = "update";

/// POST /api/v1/tailor
///
/// Streams display updates as Server-Sent Events. Missing input, access
/// rejections and model failures all arrive as updates, never as error statuses.
pub async fn handle_tailor(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let Json(request) = body?;

    let events = tailor_updates(&state, &headers, request)
        .map(|update| Event::default().event(UPDATE_EVENT).json_data(update));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// POST /api/v1/clear
pub async fn handle_clear() -> Json<ClearedFields> {
    Json(ClearedFields::from(clear_all()))
}
