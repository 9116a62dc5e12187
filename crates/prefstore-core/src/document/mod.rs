//! Reactive document
//!
//! The in-memory mirror of one scope file. It starts empty, is hydrated once
//! from the backend (whole-object replacement), and from then on every
//! structural change is handed to the debounced writer. Changes are only
//! ever made through storage helpers; the mutators are crate-private.

mod writer;


use crate::backend::{StorageBackend, json_type_name};
use crate::config::StorageConfig;
use crate::error::LoadError;
use crate::events::{ListenerSet, Subscription};
use crate::scope::StorageScope;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use writer::{DocumentWriter, WriterCommand};

/// A committed change to the document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange {
    /// Initial load finished; `keys` entries were loaded
    Hydrated { keys: usize },
    /// A top-level key was written
    Set { key: String, value: Value },
    /// A top-level key was removed
    Removed { key: String },
}

struct WriterHandle {
    tx: mpsc::UnboundedSender<WriterCommand>,
    /// Newest snapshot handed to the writer
    last_scheduled: Value,
}

/// Shared JSON object backing all helpers of one scope
pub struct ReactiveDocument {
    path: PathBuf,
    backend: Arc<dyn StorageBackend>,
    debounce: Duration,
    content: RwLock<Map<String, Value>>,
    /// Serializes mutation, scheduling and the queueing of change events
    commit: Mutex<()>,
    writer: Mutex<Option<WriterHandle>>,
    initialized: AtomicBool,
    hydrated: watch::Sender<bool>,
    listeners: Arc<ListenerSet<DocumentChange>>,
}

impl ReactiveDocument {
    /// Create an empty, not yet hydrated document for the file at `path`
    pub fn new(path: impl Into<PathBuf>, backend: Arc<dyn StorageBackend>, debounce: Duration) -> Self {
        Self {
            path: path.into(),
            backend,
            debounce,
            content: RwLock::new(Map::new()),
            commit: Mutex::new(()),
            writer: Mutex::new(None),
            initialized: AtomicBool::new(false),
            hydrated: watch::Sender::new(false),
            listeners: ListenerSet::new(),
        }
    }

    /// Create the document for `scope` under the configured directory
    pub fn for_scope(
        scope: &StorageScope,
        config: &StorageConfig,
        backend: Arc<dyn StorageBackend>,
    ) -> Self {
        Self::new(
            scope.file_path(&config.local_storage_dir),
            backend,
            config.debounce,
        )
    }

    /// Load the file and start persisting changes.
    ///
    /// A JSON object replaces the current content wholesale; anything else
    /// (missing file, unreadable, malformed, non-object) leaves the document
    /// empty. Only the first call loads; later calls wait for it to finish.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::debug!(path = %self.path.display(), "Document already initialized");
            self.when_hydrated().await;
            return;
        }

        let loaded = self.load().await;

        let keys = {
            let _guard = self.commit.lock();
            if let Some(map) = loaded {
                *self.content.write() = map;
            }
            let snapshot = self.snapshot();
            let keys = snapshot.as_object().map_or(0, Map::len);

            let tx = DocumentWriter::spawn(
                self.path.clone(),
                Arc::clone(&self.backend),
                self.debounce,
                snapshot.clone(),
            );
            *self.writer.lock() = Some(WriterHandle {
                tx,
                last_scheduled: snapshot,
            });
            self.listeners.enqueue(DocumentChange::Hydrated { keys });
            keys
        };

        self.hydrated.send_replace(true);
        tracing::info!(path = %self.path.display(), keys, "Storage document hydrated");
        self.listeners.drain();
    }

    async fn load(&self) -> Option<Map<String, Value>> {
        let err = match self.backend.load(&self.path).await {
            Ok(Value::Object(map)) => return Some(map),
            Ok(other) => LoadError::NotAnObject {
                path: self.path.clone(),
                found: json_type_name(&other),
            },
            Err(e) => e,
        };

        if err.is_not_found() {
            tracing::debug!(path = %self.path.display(), "No persisted state; starting empty");
        } else {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Ignoring unreadable storage file; starting empty"
            );
        }
        None
    }

    /// Whether the initial load has completed
    pub fn is_hydrated(&self) -> bool {
        *self.hydrated.borrow()
    }

    /// Wait until the initial load has completed
    pub async fn when_hydrated(&self) {
        let mut rx = self.hydrated.subscribe();
        // The sender lives in `self`, so this only returns once hydrated
        let _ = rx.wait_for(|hydrated| *hydrated).await;
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value stored under a top-level key
    pub fn get(&self, key: &str) -> Option<Value> {
        self.content.read().get(key).cloned()
    }

    /// Whole content as a JSON object
    pub fn snapshot(&self) -> Value {
        Value::Object(self.content.read().clone())
    }

    /// Top-level keys currently present
    pub fn keys(&self) -> Vec<String> {
        self.content.read().keys().cloned().collect()
    }

    /// Observe every committed change, in commit order.
    ///
    /// Listeners run after the document lock is released and may write to
    /// storage helpers. When several threads commit at once, one of them
    /// delivers all queued changes in order.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DocumentChange) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Write any pending change now instead of waiting for the debounce
    /// window. Returns immediately if the document is not hydrated.
    pub async fn flush(&self) {
        let ack = {
            let writer = self.writer.lock();
            let Some(handle) = writer.as_ref() else {
                return;
            };
            let (ack, done) = oneshot::channel();
            if handle.tx.send(WriterCommand::Flush(ack)).is_err() {
                return;
            }
            done
        };
        let _ = ack.await;
    }

    pub(crate) fn insert(&self, key: &str, value: Value) {
        {
            let _guard = self.commit.lock();
            {
                let mut content = self.content.write();
                if content.get(key) == Some(&value) {
                    return;
                }
                content.insert(key.to_string(), value.clone());
            }
            self.schedule_save();
            self.listeners.enqueue(DocumentChange::Set {
                key: key.to_string(),
                value,
            });
        }
        self.listeners.drain();
    }

    pub(crate) fn remove(&self, key: &str) {
        {
            let _guard = self.commit.lock();
            if self.content.write().remove(key).is_none() {
                return;
            }
            self.schedule_save();
            self.listeners.enqueue(DocumentChange::Removed {
                key: key.to_string(),
            });
        }
        self.listeners.drain();
    }

    /// Hand the current snapshot to the writer unless it is structurally
    /// equal to the last one handed over
    fn schedule_save(&self) {
        let snapshot = self.snapshot();
        let mut writer = self.writer.lock();
        let Some(handle) = writer.as_mut() else {
            tracing::trace!(path = %self.path.display(), "Change before hydration not scheduled");
            return;
        };

        if handle.last_scheduled == snapshot {
            tracing::trace!(path = %self.path.display(), "Snapshot unchanged; no write scheduled");
            return;
        }

        handle.last_scheduled = snapshot.clone();
        if handle.tx.send(WriterCommand::Snapshot(snapshot)).is_err() {
            tracing::warn!(path = %self.path.display(), "Document writer is gone; change not persisted");
        }
    }
}

impl std::fmt::Debug for ReactiveDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveDocument")
            .field("path", &self.path)
            .field("debounce", &self.debounce)
            .field("hydrated", &self.is_hydrated())
            .field("keys", &self.content.read().len())
            .finish()
    }
}
