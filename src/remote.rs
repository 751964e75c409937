//! Optional remote mirror of the canvas document
//!
//! A dedicated thread runs a single-threaded tokio runtime that owns the
//! `DocumentStore`. Local saves are debounced before they are pushed, the
//! remote is polled on an interval, and remote documents reach the GUI through
//! a std channel. `SyncGate` decides which remote documents are applied.

use std::future::Future;
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::constants::remote::REQUEST_TIMEOUT_SECS;
use crate::persistence::Document;
use crate::workspace::Workspace;

/// Local document plus the mirror's ordering timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    #[serde(flatten)]
    pub document: Document,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: i64,
}

impl RemoteDocument {
    pub fn stamped_now(document: Document) -> Self {
        let timestamp = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        Self { document, timestamp }
    }
}

/// Whole-document remote storage
pub trait DocumentStore: Send + 'static {
    /// `Ok(None)` when nothing has been stored yet
    fn fetch(&self) -> impl Future<Output = Result<Option<RemoteDocument>>> + Send;

    fn put(&self, document: &RemoteDocument) -> impl Future<Output = Result<()>> + Send;
}

/// JSON document behind a single URL (GET to read, PUT to replace)
pub struct HttpDocumentStore {
    client: reqwest::Client,
    url: String,
}

impl HttpDocumentStore {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, url: url.into() })
    }
}

impl DocumentStore for HttpDocumentStore {
    async fn fetch(&self) -> Result<Option<RemoteDocument>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", self.url))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document = response
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", self.url))?
            .json::<Option<RemoteDocument>>()
            .await
            .context("Failed to decode remote document")?;
        Ok(document)
    }

    async fn put(&self, document: &RemoteDocument) -> Result<()> {
        self.client
            .put(&self.url)
            .json(document)
            .send()
            .await
            .with_context(|| format!("PUT {} failed", self.url))?
            .error_for_status()
            .with_context(|| format!("PUT {} returned an error status", self.url))?;
        Ok(())
    }
}

/// Newest-timestamp-wins filter for incoming remote documents
#[derive(Debug, Default)]
pub struct SyncGate {
    last_seen: i64,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a timestamp we produced so its echo is not applied back
    pub fn record_local(&mut self, timestamp: i64) {
        self.last_seen = self.last_seen.max(timestamp);
    }

    /// Ignore everything while a drag is active; otherwise accept only strictly newer documents
    pub fn should_apply(&mut self, timestamp: i64, dragging: bool) -> bool {
        if dragging || timestamp <= self.last_seen {
            return false;
        }
        self.last_seen = timestamp;
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MirrorOptions {
    /// Quiet period after the last push request before writing
    pub debounce: Duration,
    /// `None` disables polling
    pub poll_interval: Option<Duration>,
}

enum Command {
    Push(Box<RemoteDocument>),
    Fetch,
    Shutdown,
}

pub struct RemoteMirror {
    commands: mpsc::UnboundedSender<Command>,
    updates: std_mpsc::Receiver<RemoteDocument>,
    gate: SyncGate,
    worker: Option<JoinHandle<()>>,
}

impl RemoteMirror {
    pub fn spawn<S: DocumentStore>(store: S, options: MirrorOptions) -> Result<Self> {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (update_tx, updates) = std_mpsc::channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build remote mirror runtime")?;

        let worker = thread::Builder::new()
            .name("remote-mirror".into())
            .spawn(move || runtime.block_on(run_mirror(store, options, command_rx, update_tx)))
            .context("Failed to spawn remote mirror thread")?;

        info!(debounce_ms = options.debounce.as_millis() as u64, polling = options.poll_interval.is_some(), "Remote mirror started");
        Ok(Self {
            commands,
            updates,
            gate: SyncGate::new(),
            worker: Some(worker),
        })
    }

    /// Queue the current workspace for a debounced push
    pub fn push(&mut self, workspace: &Workspace) {
        let document = RemoteDocument::stamped_now(Document::from_workspace(workspace));
        self.gate.record_local(document.timestamp);
        if self.commands.send(Command::Push(Box::new(document))).is_err() {
            warn!("Remote mirror stopped, push dropped");
        }
    }

    /// Ask for one immediate fetch; the result arrives through `poll_update`
    pub fn fetch_once(&self) {
        if self.commands.send(Command::Fetch).is_err() {
            warn!("Remote mirror stopped, fetch dropped");
        }
    }

    /// Newest remote document the gate lets through since the last call
    pub fn poll_update(&mut self, dragging: bool) -> Option<Document> {
        let mut latest = None;
        while let Ok(remote) = self.updates.try_recv() {
            if self.gate.should_apply(remote.timestamp, dragging) {
                latest = Some(remote.document);
            } else {
                debug!(timestamp = remote.timestamp, dragging = dragging, "Ignoring remote document");
            }
        }
        latest
    }

    /// Flush any pending push and stop the worker
    pub fn shutdown(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = self.commands.send(Command::Shutdown);
        if worker.join().is_err() {
            error!("Remote mirror thread panicked");
        }
        info!("Remote mirror stopped");
    }
}

impl Drop for RemoteMirror {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn push_document<S: DocumentStore>(store: &S, document: &RemoteDocument) {
    match store.put(document).await {
        Ok(()) => debug!(timestamp = document.timestamp, cards = document.document.cards.len(), "Pushed document"),
        Err(e) => warn!(error = ?e, "Remote push failed, continuing local-only"),
    }
}

async fn fetch_document<S: DocumentStore>(store: &S, updates: &std_mpsc::Sender<RemoteDocument>) -> bool {
    match store.fetch().await {
        Ok(Some(document)) => updates.send(document).is_ok(),
        Ok(None) => true,
        Err(e) => {
            warn!(error = ?e, "Remote fetch failed");
            true
        }
    }
}

async fn run_mirror<S: DocumentStore>(
    store: S,
    options: MirrorOptions,
    mut commands: mpsc::UnboundedReceiver<Command>,
    updates: std_mpsc::Sender<RemoteDocument>,
) {
    let mut pending: Option<Box<RemoteDocument>> = None;
    let debounce = sleep(options.debounce);
    tokio::pin!(debounce);

    let polling = options.poll_interval.is_some();
    let period = options.poll_interval.unwrap_or(Duration::from_secs(3600));
    let mut poll = interval_at(Instant::now() + period, period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Push(document)) => {
                    pending = Some(document);
                    debounce.as_mut().reset(Instant::now() + options.debounce);
                }
                Some(Command::Fetch) => {
                    if !fetch_document(&store, &updates).await {
                        break;
                    }
                }
                Some(Command::Shutdown) | None => {
                    if let Some(document) = pending.take() {
                        push_document(&store, &document).await;
                    }
                    break;
                }
            },
            _ = &mut debounce, if pending.is_some() => {
                if let Some(document) = pending.take() {
                    push_document(&store, &document).await;
                }
            }
            _ = poll.tick(), if polling => {
                if !fetch_document(&store, &updates).await {
                    // GUI side is gone
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewCard;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MemoryDocumentStore {
        state: Arc<Mutex<MemoryState>>,
    }

    #[derive(Default)]
    struct MemoryState {
        document: Option<RemoteDocument>,
        puts: usize,
    }

    impl MemoryDocumentStore {
        fn puts(&self) -> usize {
            self.state.lock().unwrap().puts
        }

        fn stored(&self) -> Option<RemoteDocument> {
            self.state.lock().unwrap().document.clone()
        }
    }

    impl DocumentStore for MemoryDocumentStore {
        async fn fetch(&self) -> Result<Option<RemoteDocument>> {
            Ok(self.state.lock().unwrap().document.clone())
        }

        async fn put(&self, document: &RemoteDocument) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.document = Some(document.clone());
            state.puts += 1;
            Ok(())
        }
    }

    fn workspace_with(names: &[&str]) -> Workspace {
        let mut workspace = Workspace::default();
        for name in names {
            workspace.store.create(NewCard::new(*name));
        }
        workspace
    }

    fn wait_for_update(mirror: &mut RemoteMirror) -> Option<Document> {
        for _ in 0..100 {
            thread::sleep(Duration::from_millis(10));
            if let Some(document) = mirror.poll_update(false) {
                return Some(document);
            }
        }
        None
    }

    #[test]
    fn test_sync_gate() {
        let mut gate = SyncGate::new();
        gate.record_local(100);
        assert!(!gate.should_apply(100, false), "own echo");
        assert!(!gate.should_apply(90, false), "stale");
        assert!(!gate.should_apply(200, true), "dragging");
        assert!(gate.should_apply(200, false));
        assert!(!gate.should_apply(200, false));
    }

    #[test]
    fn test_debounce_coalesces_burst() {
        let store = MemoryDocumentStore::default();
        let options = MirrorOptions {
            debounce: Duration::from_millis(100),
            poll_interval: None,
        };
        let mut mirror = RemoteMirror::spawn(store.clone(), options).unwrap();

        let mut workspace = Workspace::default();
        for i in 0..5 {
            workspace.store.create(NewCard::new(format!("Company {i}")));
            mirror.push(&workspace);
        }
        thread::sleep(Duration::from_millis(500));

        assert_eq!(store.puts(), 1);
        assert_eq!(store.stored().unwrap().document.cards.len(), 5);
        mirror.shutdown();
        assert_eq!(store.puts(), 1);
    }

    #[test]
    fn test_shutdown_flushes_pending_push() {
        let store = MemoryDocumentStore::default();
        let options = MirrorOptions {
            debounce: Duration::from_secs(30),
            poll_interval: None,
        };
        let mut mirror = RemoteMirror::spawn(store.clone(), options).unwrap();
        mirror.push(&workspace_with(&["Acme Corp"]));
        mirror.shutdown();
        assert_eq!(store.puts(), 1);
        assert_eq!(store.stored().unwrap().document.cards[0].company, "Acme Corp");
    }

    #[test]
    fn test_fetch_once_delivers_newer_document() {
        let store = MemoryDocumentStore::default();
        let remote = workspace_with(&["Gusto", "Ramp"]);
        store.state.lock().unwrap().document = Some(RemoteDocument {
            document: Document::from_workspace(&remote),
            timestamp: i64::MAX,
        });

        let options = MirrorOptions {
            debounce: Duration::from_millis(50),
            poll_interval: None,
        };
        let mut mirror = RemoteMirror::spawn(store, options).unwrap();

        // Held back while a drag is active
        mirror.fetch_once();
        thread::sleep(Duration::from_millis(100));
        assert!(mirror.poll_update(true).is_none());

        mirror.fetch_once();
        let document = wait_for_update(&mut mirror).expect("remote document should arrive");
        assert_eq!(document.cards.len(), 2);

        // Same timestamp again is not re-applied
        mirror.fetch_once();
        thread::sleep(Duration::from_millis(100));
        assert!(mirror.poll_update(false).is_none());
    }

    #[test]
    fn test_polling_picks_up_remote_changes() {
        let store = MemoryDocumentStore::default();
        let options = MirrorOptions {
            debounce: Duration::from_millis(50),
            poll_interval: Some(Duration::from_millis(20)),
        };
        let mut mirror = RemoteMirror::spawn(store.clone(), options).unwrap();
        store.state.lock().unwrap().document = Some(RemoteDocument {
            document: Document::from_workspace(&workspace_with(&["Brex"])),
            timestamp: i64::MAX - 1,
        });

        let document = wait_for_update(&mut mirror).expect("poll should deliver");
        assert_eq!(document.cards[0].company, "Brex");
    }

    #[test]
    fn test_remote_document_shape() {
        let remote = RemoteDocument {
            document: Document::from_workspace(&workspace_with(&["Acme Corp"])),
            timestamp: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&remote).unwrap();
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);
        assert!(value["cards"].is_array());
        assert!(value["viewSettings"].is_object());
        assert!(value.get("document").is_none());

        let back: RemoteDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, remote);
    }
}
