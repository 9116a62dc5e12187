//! Debounced document writer
//!
//! One writer task runs per hydrated document. It receives snapshots over an
//! unbounded channel and writes only the newest one, once no further snapshot
//! has arrived for the debounce window (trailing edge).

use crate::backend::StorageBackend;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};

pub(super) enum WriterCommand {
    /// The document changed; this is its full content
    Snapshot(Value),
    /// Write any pending snapshot now, then acknowledge
    Flush(oneshot::Sender<()>),
}

pub(super) struct DocumentWriter {
    path: PathBuf,
    backend: Arc<dyn StorageBackend>,
    debounce: Duration,
    /// Content of the file as of the last successful load or save
    last_persisted: Value,
}

impl DocumentWriter {
    /// Start the writer task and return its command channel.
    ///
    /// Dropping the sender makes the task write any pending snapshot and exit.
    pub(super) fn spawn(
        path: PathBuf,
        backend: Arc<dyn StorageBackend>,
        debounce: Duration,
        last_persisted: Value,
    ) -> mpsc::UnboundedSender<WriterCommand> {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = Self {
            path,
            backend,
            debounce,
            last_persisted,
        };
        tokio::spawn(writer.run(rx));
        tx
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<WriterCommand>) {
        let mut pending: Option<(Value, Instant)> = None;

        loop {
            let deadline = pending.as_ref().map(|(_, deadline)| *deadline);
            let command = match deadline {
                Some(deadline) => tokio::select! {
                    command = rx.recv() => command,
                    _ = sleep_until(deadline) => {
                        self.write_pending(&mut pending).await;
                        continue;
                    }
                },
                None => rx.recv().await,
            };

            match command {
                Some(WriterCommand::Snapshot(snapshot)) => {
                    pending = Some((snapshot, Instant::now() + self.debounce));
                }
                Some(WriterCommand::Flush(ack)) => {
                    self.write_pending(&mut pending).await;
                    let _ = ack.send(());
                }
                None => {
                    self.write_pending(&mut pending).await;
                    break;
                }
            }
        }

        tracing::debug!(path = %self.path.display(), "Document writer stopped");
    }

    async fn write_pending(&mut self, pending: &mut Option<(Value, Instant)>) {
        if let Some((snapshot, _)) = pending.take() {
            self.write(snapshot).await;
        }
    }

    async fn write(&mut self, snapshot: Value) {
        if snapshot == self.last_persisted {
            tracing::debug!(
                path = %self.path.display(),
                "Skipping write: content matches last persisted snapshot"
            );
            return;
        }

        match self.backend.save(&self.path, &snapshot).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Saved storage document");
                self.last_persisted = snapshot;
            }
            Err(e) => {
                // Dropped without retry; the next change schedules a fresh attempt
                tracing::warn!(
                    path = %self.path.display(),
                    payload = %snapshot,
                    error = %e,
                    "Failed to save storage document"
                );
            }
        }
    }
}
