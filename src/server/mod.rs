//! HTTP surface: `GET /chat_stream` as server-sent events.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::chat::{ChatRequest, ChatService};
use crate::error::CounselError;

/// Router exposing the chat stream and a liveness probe.
pub fn router(service: ChatService) -> Router {
    Router::new()
        .route("/chat_stream", get(chat_stream))
        .route("/health", get(health))
        .with_state(service)
}

async fn health() -> &'static str {
    "ok"
}

async fn chat_stream(
    State(service): State<ChatService>,
    Query(request): Query<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(
        checkpoint_id = ?request.checkpoint_id,
        chat_type = %request.chat_type,
        "chat_stream request"
    );
    // Dropping the response body drops the frame stream, which cancels the turn.
    let frames = service.generate_chat_responses(request, CancellationToken::new());
    let events = frames.map(|frame| Ok(Event::default().data(frame.to_json())));
    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(service: ChatService, addr: &str) -> Result<(), CounselError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "counsel listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
