//! Storage helper
//!
//! A typed handle on one key. Reads never block and never see "unset": with
//! nothing stored, [`StorageHelper::get`] yields the configured default.
//! Writing a value structurally equal to the default removes the key instead,
//! so the persisted document only holds deviations from defaults.
//!
//! # Lifecycle
//!
//! The helper reads its stored value once on construction. A synchronous
//! read makes it `Ready` immediately; a deferred one puts it in `Loading`
//! until the read settles. While loading, every operation works against the
//! in-memory value and nothing is written through. On settlement a stored,
//! non-default value is shallow-merged onto the value held at that moment and
//! committed like [`StorageHelper::set`]. If the caller wrote while loading,
//! the settled value is then written through whenever it differs from what
//! was stored. `Ready` is entered exactly once, whether or not the read
//! succeeded.
//!
//! Change listeners run after the helper's lock is released, in commit order.

mod adapter;


pub use adapter::{DocumentAdapter, ItemLoad, MemoryAdapter, StorageAdapter};

use crate::error::{StorageError, StorageResult};
use crate::events::{ListenerSet, Subscription};
use crate::value::{StorageValue, deep_equal, is_empty_item, shallow_merge};
use parking_lot::{ReentrantMutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

/// Initialization state of a helper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperStatus {
    Uninitialized,
    Loading,
    Ready,
}

/// A committed transition of a helper's stored value.
///
/// `None` means nothing is stored (the helper reads as its default).
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent<T> {
    pub key: String,
    pub value: Option<T>,
    pub old_value: Option<T>,
}

struct HelperState<T> {
    current: Option<T>,
    status: HelperStatus,
    /// A caller changed the value before the helper became ready
    written_while_loading: bool,
}

/// Typed accessor for one key of a store
pub struct StorageHelper<T> {
    key: String,
    default_value: T,
    adapter: Arc<dyn StorageAdapter>,
    state: RwLock<HelperState<T>>,
    /// Serializes commit, event queueing and write-through. Reentrant because
    /// a document listener run during write-through may write back here.
    commit: ReentrantMutex<()>,
    listeners: Arc<ListenerSet<ChangeEvent<T>>>,
    ready: watch::Sender<bool>,
}

impl<T: StorageValue> StorageHelper<T> {
    /// Create a helper and start its initial read.
    ///
    /// A deferred read is driven on the current tokio runtime. Without one the
    /// read is abandoned, logged, and the helper starts ready with defaults.
    pub fn new(
        key: impl Into<String>,
        default_value: T,
        adapter: Arc<dyn StorageAdapter>,
    ) -> Arc<Self> {
        let helper = Arc::new(Self {
            key: key.into(),
            default_value,
            adapter,
            state: RwLock::new(HelperState {
                current: None,
                status: HelperStatus::Uninitialized,
                written_while_loading: false,
            }),
            commit: ReentrantMutex::new(()),
            listeners: ListenerSet::new(),
            ready: watch::Sender::new(false),
        });
        helper.init();
        helper
    }

    fn init(self: &Arc<Self>) {
        match self.adapter.get_item(&self.key) {
            ItemLoad::Ready(stored) => self.settle(Ok(stored)),
            ItemLoad::Deferred(pending) => {
                self.state.write().status = HelperStatus::Loading;
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        let helper = Arc::downgrade(self);
                        runtime.spawn(async move {
                            let loaded = pending.await;
                            if let Some(helper) = helper.upgrade() {
                                helper.settle(loaded);
                            }
                        });
                    }
                    Err(e) => self.settle(Err(StorageError::Runtime(e.to_string()))),
                }
            }
        }
    }

    fn settle(&self, loaded: StorageResult<Option<Value>>) {
        {
            let _guard = self.commit.lock();
            self.settle_locked(loaded);
        }
        self.listeners.drain();
        self.ready.send_replace(true);
    }

    fn settle_locked(&self, loaded: StorageResult<Option<Value>>) {
        // Taken before the stored value is applied, which flags it again
        let written_while_loading = std::mem::take(&mut self.state.write().written_while_loading);

        let stored = match loaded {
            Ok(stored) => stored.filter(|stored| !is_empty_item(stored)),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Initial read failed; using default");
                None
            }
        };

        let mut applied = false;
        if let Some(stored) = stored.as_ref().filter(|stored| !self.is_default_json(stored)) {
            // Stored fields overlay whatever is held now, like a merge
            match self.overlay(&self.get(), stored.clone()) {
                Ok(value) => {
                    self.commit_value(value);
                    applied = true;
                }
                Err(e) => {
                    tracing::warn!(
                        key = %self.key,
                        error = %e,
                        "Ignoring stored value of unexpected shape; using default"
                    );
                }
            }
        }

        let current = {
            let mut state = self.state.write();
            state.status = HelperStatus::Ready;
            state.written_while_loading = false;
            state.current.clone()
        };

        // Caller changes made while loading must reach the adapter unless
        // the stored item already holds exactly the settled value
        if written_while_loading {
            let settled = match current.as_ref().map(serde_json::to_value).transpose() {
                Ok(settled) => settled,
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "Settled value is not serializable");
                    None
                }
            };
            if settled != stored {
                self.write_through(current.as_ref());
            }
        }

        tracing::trace!(key = %self.key, applied, written_while_loading, "Storage helper ready");
    }

    /// The stored value, or the default when nothing is stored
    pub fn get(&self) -> T {
        self.state
            .read()
            .current
            .clone()
            .unwrap_or_else(|| self.default_value.clone())
    }

    /// Store `value`.
    ///
    /// A value structurally equal to the default behaves as [`reset`]: the key
    /// is removed rather than the default written out. This is intentional
    /// and callers cannot persist an explicit copy of the default.
    ///
    /// [`reset`]: StorageHelper::reset
    pub fn set(&self, value: T) {
        {
            let _guard = self.commit.lock();
            self.commit_value(value);
        }
        self.listeners.drain();
    }

    /// Shallow-merge a partial object onto a copy of the current value and
    /// store the result.
    ///
    /// Each top-level field of `partial` replaces the same field of the
    /// current value. A non-object `partial` replaces the value outright.
    pub fn merge<P: Serialize>(&self, partial: P) {
        match serde_json::to_value(partial) {
            Ok(overlay) => self.merge_with(move |_| Some(overlay)),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Dropping merge: partial is not serializable");
            }
        }
    }

    /// Run `update` against a draft copy of the current value and store the
    /// result.
    ///
    /// The draft may be mutated in place. Returning `Some(partial)` also
    /// shallow-merges `partial` onto the draft; `None` or `Some(null)` keeps
    /// the draft as mutated. The live value and the default are never touched.
    pub fn merge_with<F>(&self, update: F)
    where
        F: FnOnce(&mut T) -> Option<Value>,
    {
        {
            let _guard = self.commit.lock();

            let mut draft = self.get();
            let next = match update(&mut draft) {
                Some(overlay) if !overlay.is_null() => match self.overlay(&draft, overlay) {
                    Ok(next) => Some(next),
                    Err(e) => {
                        tracing::warn!(key = %self.key, error = %e, "Dropping merge result");
                        None
                    }
                },
                _ => Some(draft),
            };

            if let Some(next) = next {
                self.commit_value(next);
            }
        }
        self.listeners.drain();
    }

    fn overlay(&self, draft: &T, overlay: Value) -> StorageResult<T> {
        let mut merged =
            serde_json::to_value(draft).map_err(|e| StorageError::value(&self.key, e))?;
        shallow_merge(&mut merged, overlay);
        serde_json::from_value(merged).map_err(|e| StorageError::value(&self.key, e))
    }

    /// Remove the stored value; [`get`](StorageHelper::get) returns the
    /// default afterwards
    pub fn reset(&self) {
        {
            let _guard = self.commit.lock();
            self.commit_reset();
        }
        self.listeners.drain();
    }

    /// Caller holds `commit`; the change event is queued, not delivered
    fn commit_value(&self, value: T) {
        if self.is_default_value(&value) {
            self.commit_reset();
            return;
        }

        let (old_value, ready) = {
            let mut state = self.state.write();
            if state
                .current
                .as_ref()
                .is_some_and(|current| deep_equal(current, &value))
            {
                return;
            }
            let old_value = state.current.replace(value.clone());
            let ready = state.status == HelperStatus::Ready;
            if !ready {
                state.written_while_loading = true;
            }
            (old_value, ready)
        };

        // Queued before write-through so a write made back into this helper
        // by a document listener is ordered after this one
        self.listeners.enqueue(ChangeEvent {
            key: self.key.clone(),
            value: Some(value.clone()),
            old_value,
        });

        if ready {
            self.write_through(Some(&value));
        }
    }

    /// Caller holds `commit`; the change event is queued, not delivered
    fn commit_reset(&self) {
        let (old_value, ready) = {
            let mut state = self.state.write();
            let old_value = state.current.take();
            let ready = state.status == HelperStatus::Ready;
            if !ready && old_value.is_some() {
                state.written_while_loading = true;
            }
            (old_value, ready)
        };

        if old_value.is_some() {
            self.listeners.enqueue(ChangeEvent {
                key: self.key.clone(),
                value: None,
                old_value,
            });
        }

        if ready {
            self.write_through(None);
        }
    }

    /// Whether `value` is structurally equal to the configured default
    pub fn is_default_value(&self, value: &T) -> bool {
        deep_equal(value, &self.default_value)
    }

    fn is_default_json(&self, value: &Value) -> bool {
        serde_json::to_value(&self.default_value).is_ok_and(|default| &default == value)
    }

    fn write_through(&self, value: Option<&T>) {
        let result = match value {
            Some(value) => serde_json::to_value(value)
                .map_err(|e| StorageError::value(&self.key, e))
                .and_then(|json| self.adapter.set_item(&self.key, json)),
            None => self.adapter.remove_item(&self.key),
        };

        if let Err(e) = result {
            let payload = value
                .and_then(|v| serde_json::to_string(v).ok())
                .unwrap_or_else(|| "<removed>".to_string());
            let path = self
                .adapter
                .location()
                .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string());
            tracing::warn!(
                key = %self.key,
                path = %path,
                payload = %payload,
                error = %e,
                "Failed to write storage item"
            );
        }
    }

    /// Observe committed value transitions, in commit order.
    ///
    /// Listeners run with no helper or document lock held and may write to
    /// any helper, including this one.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent<T>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Wait until the initial read has settled
    pub async fn when_ready(&self) {
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl<T> StorageHelper<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    pub fn status(&self) -> HelperStatus {
        self.state.read().status
    }

    pub fn is_ready(&self) -> bool {
        self.status() == HelperStatus::Ready
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for StorageHelper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("StorageHelper")
            .field("key", &self.key)
            .field("default_value", &self.default_value)
            .field("current", &state.current)
            .field("status", &state.status)
            .finish()
    }
}
