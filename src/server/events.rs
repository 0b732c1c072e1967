use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use super::AppState;
use crate::watch::{ChangeSignal, ChangeWatcher, ClientId};

/// Comment line cadence that keeps intermediaries from timing out an
/// otherwise idle stream.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Per-subscriber signal buffer. Signals are coalesced markers, so a couple
/// of slots is plenty.
const CLIENT_BUFFER: usize = 16;

/// `GET /api/events`: long-lived SSE stream of change notifications.
///
/// Named events: `connected` (once, on open) and `issues-changed` (one per
/// coalesced change under the watched beads directory), both with an empty
/// `{}` payload. `:heartbeat` comment lines arrive periodically and must be
/// ignored by clients.
///
/// The watch always tracks whichever project was most recently active when a
/// subscriber connected; with no active project the stream still opens, it
/// just never carries change signals.
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    match state.config.active_project() {
        Ok(Some(project)) => {
            let watched = state.watcher.current_watched_path();
            if watched.as_deref() != Some(project.path.as_path()) {
                state.watcher.watch_project(&project.path);
            }
        }
        Ok(None) => {}
        Err(err) => warn!(error = %err, "could not resolve active project"),
    }

    let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
    // The connected marker goes into the sink before registration so it is
    // always the first event on the stream, ahead of any broadcast.
    let _ = tx.try_send(ChangeSignal::Connected);
    let client_id = state.watcher.add_client(tx);
    let guard = DisconnectGuard {
        watcher: state.watcher.clone(),
        client_id,
    };

    let stream = ReceiverStream::new(rx).map(move |signal| {
        let _guard = &guard;
        Ok(Event::default().event(signal.event_name()).data("{}"))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}

/// Deregisters the subscriber when the stream is dropped; normal close,
/// transport error, or server shutdown all end here.
struct DisconnectGuard {
    watcher: ChangeWatcher,
    client_id: ClientId,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        self.watcher.remove_client(self.client_id);
    }
}
