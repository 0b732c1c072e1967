//! Change-notification pipeline: a filesystem watch over the active
//! project's beads data files, debounced into a single coalesced signal and
//! fanned out to every open SSE subscriber.

pub mod debounce;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::BEADS_DIR;
pub use debounce::Debounce;

/// Quiet period after the last filesystem event before subscribers are
/// notified. Batches multi-file saves into one signal.
pub const BROADCAST_DEBOUNCE: Duration = Duration::from_millis(100);

/// How long a file must stay unchanged before the watcher reports it, so a
/// truncate+append save shows up as one event rather than two.
const WRITE_STABILIZE: Duration = Duration::from_millis(100);

/// Signal delivered to a subscriber's sink. Carries no payload; clients
/// re-fetch from the read API instead of reconciling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSignal {
    /// Stream-open marker, written once per connection.
    Connected,
    /// Something changed under the watched beads directory.
    IssuesChanged,
}

impl ChangeSignal {
    /// SSE event name for this signal.
    pub fn event_name(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::IssuesChanged => "issues-changed",
        }
    }
}

/// Opaque subscriber handle returned by [`ChangeWatcher::add_client`].
pub type ClientId = Uuid;

/// Open push channels, keyed by client id.
#[derive(Default)]
struct SubscriberRegistry {
    clients: Mutex<HashMap<ClientId, mpsc::Sender<ChangeSignal>>>,
}

impl SubscriberRegistry {
    fn add(&self, sink: mpsc::Sender<ChangeSignal>) -> ClientId {
        let id = Uuid::new_v4();
        self.clients.lock().unwrap().insert(id, sink);
        id
    }

    fn remove(&self, id: ClientId) {
        self.clients.lock().unwrap().remove(&id);
    }

    fn count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    /// Write `signal` to every registered sink. Sinks whose receiving end is
    /// gone are collected during the pass and pruned after it, so one dead
    /// subscriber never blocks the signal to the rest. A full (lagging) sink
    /// is skipped: a change signal is already queued for that client.
    fn broadcast(&self, signal: ChangeSignal) {
        let mut clients = self.clients.lock().unwrap();
        let mut dead = Vec::new();
        for (id, sink) in clients.iter() {
            match sink.try_send(signal) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*id),
                Err(mpsc::error::TrySendError::Full(_)) => {}
            }
        }
        for id in dead {
            debug!(client = %id, "dropping disconnected subscriber");
            clients.remove(&id);
        }
    }
}

/// Keeps the OS watch alive; dropping it stops the watcher thread and the
/// bridge task.
struct WatchHandle {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    _bridge: JoinHandle<()>,
}

#[derive(Default)]
struct WatchState {
    current_path: Option<PathBuf>,
    handle: Option<WatchHandle>,
}

impl WatchState {
    fn stop(&mut self) {
        self.handle = None;
        self.current_path = None;
    }
}

/// Watches one project's beads directory at a time and fans coalesced change
/// signals out to registered subscribers.
///
/// Built once in the composition root and injected into the HTTP layer;
/// switching projects fully replaces the prior watch. Cheap to clone: all
/// state is shared.
#[derive(Clone)]
pub struct ChangeWatcher {
    inner: Arc<WatcherInner>,
}

struct WatcherInner {
    registry: Arc<SubscriberRegistry>,
    broadcast: Debounce,
    state: Mutex<WatchState>,
}

impl Default for ChangeWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeWatcher {
    pub fn new() -> Self {
        let registry = Arc::new(SubscriberRegistry::default());
        let broadcast = {
            let registry = Arc::clone(&registry);
            Debounce::new(BROADCAST_DEBOUNCE, move || {
                registry.broadcast(ChangeSignal::IssuesChanged);
            })
        };
        Self {
            inner: Arc::new(WatcherInner {
                registry,
                broadcast,
                state: Mutex::new(WatchState::default()),
            }),
        }
    }

    /// Start watching `project_path`'s beads directory, replacing any
    /// existing watch.
    ///
    /// A missing beads directory or an empty one (no `.jsonl` files) is a
    /// normal "nothing to watch yet" state: the previous watch is still
    /// stopped, no new one starts, and no error is raised. Watch setup
    /// failures are logged and swallowed, and the watcher keeps running.
    pub fn watch_project(&self, project_path: &Path) {
        let mut state = self.inner.state.lock().unwrap();
        state.stop();

        let beads_dir = project_path.join(BEADS_DIR);
        if !beads_dir.is_dir() {
            return;
        }

        // Watch the explicit file list rather than a glob or the directory:
        // glob matching over this class of watcher is unreliable across
        // platforms, and directory watches pick up unrelated writes.
        let files = jsonl_files(&beads_dir);
        if files.is_empty() {
            return;
        }

        match start_file_watch(&files, self.inner.broadcast.clone()) {
            Ok(handle) => {
                state.current_path = Some(project_path.to_path_buf());
                state.handle = Some(handle);
            }
            Err(err) => {
                error!(path = %beads_dir.display(), error = %err, "failed to start file watch");
            }
        }
    }

    /// Stop any active watch. Idempotent.
    pub fn stop_watching(&self) {
        self.inner.state.lock().unwrap().stop();
    }

    /// Register a subscriber sink; returns its id. Registration alone never
    /// triggers a broadcast.
    pub fn add_client(&self, sink: mpsc::Sender<ChangeSignal>) -> ClientId {
        self.inner.registry.add(sink)
    }

    /// Deregister a subscriber. No-op for unknown ids.
    pub fn remove_client(&self, id: ClientId) {
        self.inner.registry.remove(id);
    }

    pub fn current_watched_path(&self) -> Option<PathBuf> {
        self.inner.state.lock().unwrap().current_path.clone()
    }

    pub fn client_count(&self) -> usize {
        self.inner.registry.count()
    }
}

/// Enumerate the tracked data files (`*.jsonl`) directly inside `beads_dir`.
fn jsonl_files(beads_dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(beads_dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(path = %beads_dir.display(), error = %err, "cannot enumerate beads directory");
            return Vec::new();
        }
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "jsonl"))
        .collect()
}

/// Start a stabilized watch over the given files and wire its events into
/// the debounced broadcast.
///
/// notify's callback runs on the watcher's own thread; events cross into the
/// runtime through a std channel drained by a blocking task, the same bridge
/// shape as elsewhere in the async code. Watch runtime errors are logged,
/// never propagated.
fn start_file_watch(files: &[PathBuf], broadcast: Debounce) -> notify::Result<WatchHandle> {
    let (std_tx, std_rx) = std::sync::mpsc::channel::<DebounceEventResult>();

    let mut debouncer = new_debouncer(WRITE_STABILIZE, move |res| {
        let _ = std_tx.send(res);
    })?;
    for file in files {
        debouncer.watcher().watch(file, RecursiveMode::NonRecursive)?;
    }

    let bridge = tokio::task::spawn_blocking(move || {
        while let Ok(result) = std_rx.recv() {
            match result {
                Ok(_events) => broadcast.call(),
                Err(err) => error!(error = %err, "file watch error"),
            }
        }
    });

    Ok(WatchHandle {
        _debouncer: debouncer,
        _bridge: bridge,
    })
}
