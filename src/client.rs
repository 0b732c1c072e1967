//! Native consumer of the `/api/events` stream.
//!
//! Mirrors what the browser UI does with `EventSource`: hold one connection
//! open, invalidate every cached collection on `issues-changed`, and
//! reconnect forever with a fixed delay when the connection drops. Useful
//! for tests and for shells embedding the UI without a browser event loop.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Fixed delay between reconnect attempts. Flat and uncapped: silent
/// degradation followed by automatic recovery is the designed failure mode,
/// so there is nothing to back off from.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Invalidation hooks called on every change signal. Invalidation is coarse
/// and unconditional: the next read re-fetches from the backend; no
/// patching or reconciliation is attempted.
pub trait CacheInvalidation: Send + Sync {
    fn invalidate_issues(&self);
    fn invalidate_issue_details(&self);
    fn invalidate_labels(&self);
}

/// Handle to a running events subscription. Dropping it (or calling
/// [`disconnect`](EventsClient::disconnect)) tears the connection down and
/// cancels any pending reconnect.
pub struct EventsClient {
    task: JoinHandle<()>,
}

impl EventsClient {
    /// Subscribe to `url` (the `/api/events` endpoint) and keep the
    /// subscription alive until the handle is dropped. Only one connection
    /// attempt is ever in flight.
    pub fn connect(url: String, caches: Arc<dyn CacheInvalidation>) -> Self {
        let task = tokio::spawn(run_loop(url, caches, RECONNECT_DELAY));
        Self { task }
    }

    pub fn disconnect(self) {
        self.task.abort();
    }
}

impl Drop for EventsClient {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_loop(url: String, caches: Arc<dyn CacheInvalidation>, reconnect_delay: Duration) {
    let client = reqwest::Client::new();
    loop {
        match stream_events(&client, &url, caches.as_ref()).await {
            Ok(()) => debug!("events stream ended, reconnecting"),
            Err(err) => warn!(error = %err, "events stream failed, reconnecting"),
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Consume one connection until the server closes it or it errors.
async fn stream_events(
    client: &reqwest::Client,
    url: &str,
    caches: &dyn CacheInvalidation,
) -> reqwest::Result<()> {
    let response = client
        .get(url)
        .header("accept", "text/event-stream")
        .send()
        .await?
        .error_for_status()?;

    let mut body = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        // Frames are blank-line terminated blocks.
        while let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            match event_name(&frame) {
                Some("issues-changed") => {
                    caches.invalidate_issues();
                    caches.invalidate_issue_details();
                    caches.invalidate_labels();
                }
                Some("connected") => debug!("events stream connected"),
                _ => {} // heartbeat comments and unnamed frames
            }
        }
    }

    Ok(())
}

/// Extract the `event:` field from an SSE frame, if it has one. Comment
/// lines (leading `:`) carry no name and are ignored.
fn event_name(frame: &str) -> Option<&str> {
    frame
        .lines()
        .find_map(|line| line.strip_prefix("event:"))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_event_name_parsing() {
        assert_eq!(event_name("event: issues-changed\ndata: {}\n\n"), Some("issues-changed"));
        assert_eq!(event_name("event: connected\ndata: {}\n\n"), Some("connected"));
        assert_eq!(event_name(":heartbeat\n\n"), None);
        assert_eq!(event_name("data: {}\n\n"), None);
    }

    #[derive(Default)]
    struct CountingCaches {
        issues: AtomicUsize,
        details: AtomicUsize,
        labels: AtomicUsize,
    }

    impl CacheInvalidation for CountingCaches {
        fn invalidate_issues(&self) {
            self.issues.fetch_add(1, Ordering::SeqCst);
        }
        fn invalidate_issue_details(&self) {
            self.details.fetch_add(1, Ordering::SeqCst);
        }
        fn invalidate_labels(&self) {
            self.labels.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Minimal SSE server: accepts connections, writes a canned response,
    /// closes. Counts accepted connections.
    async fn spawn_sse_server(body: &'static str, accepts: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                accepts.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n{body}"
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/api/events")
    }

    #[tokio::test]
    async fn test_change_event_invalidates_all_caches() {
        let accepts = Arc::new(AtomicUsize::new(0));
        let url = spawn_sse_server(
            "event: connected\ndata: {}\n\n:heartbeat\n\nevent: issues-changed\ndata: {}\n\n",
            Arc::clone(&accepts),
        )
        .await;

        let caches = Arc::new(CountingCaches::default());
        let client = reqwest::Client::new();
        stream_events(&client, &url, caches.as_ref()).await.unwrap();

        assert_eq!(caches.issues.load(Ordering::SeqCst), 1);
        assert_eq!(caches.details.load(Ordering::SeqCst), 1);
        assert_eq!(caches.labels.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reconnects_with_fixed_delay() {
        let accepts = Arc::new(AtomicUsize::new(0));
        let url = spawn_sse_server("event: connected\ndata: {}\n\n", Arc::clone(&accepts)).await;

        let caches: Arc<dyn CacheInvalidation> = Arc::new(CountingCaches::default());
        let delay = Duration::from_millis(100);
        let task = tokio::spawn(run_loop(url, caches, delay));

        // Each connection ends immediately (server closes), so over ~5
        // delays we expect roughly one accept per delay, and never the
        // burst a reconnect-without-delay bug would produce.
        tokio::time::sleep(delay * 5).await;
        task.abort();

        let seen = accepts.load(Ordering::SeqCst);
        assert!(seen >= 2, "expected reconnects, saw {seen}");
        assert!(seen <= 7, "reconnects not rate-limited, saw {seen}");
    }
}
