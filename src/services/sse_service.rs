//! Bridges per-session broadcast channels into SSE responses.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::SharedState,
};

/// Subscribe to one session's event stream.
pub fn subscribe(state: &SharedState, quiz_id: Uuid) -> broadcast::Receiver<ServerEvent> {
    state.sse().subscribe(quiz_id)
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    quiz_id: Uuid,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive;
                            // the client reconciles via the snapshot endpoint.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(%quiz_id, "session SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Confirm a new subscription on the session's channel.
pub async fn broadcast_handshake(state: &SharedState, quiz_id: Uuid) {
    let payload = Handshake {
        quiz_id: quiz_id.to_string(),
        message: "session stream connected".into(),
        degraded: state.is_degraded().await,
    };
    if let Ok(event) = ServerEvent::json(Some("handshake".to_string()), &payload) {
        state.sse().broadcast(quiz_id, event);
    }
}
