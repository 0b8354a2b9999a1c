use std::sync::Arc;

use today_core::{
    storage::{KeyValueStore, StoreError},
    tasks::AppState,
};
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, instrument, warn};

/// Storage slot holding the serialized `AppState`.
pub const TASKS_STATE_KEY: &str = "tasksState";
/// Prefix of the keys unreadable state is parked under before it gets
/// overwritten: `tasksState.corrupt.1`, `tasksState.corrupt.2`, ...
pub const CORRUPT_STATE_KEY: &str = "tasksState.corrupt";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("stored state is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("failed to read stored state: {0}")]
    Read(#[source] StoreError),
    #[error("failed to keep a copy of the corrupt state: {0}")]
    Backup(#[source] StoreError),
    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write state (generation {generation}): {reason}")]
    Write { generation: u64, reason: String },
    #[error("state writer stopped")]
    WriterGone,
}

/// How to react when the stored state cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Fall back to the default state, keeping a copy of the unreadable bytes.
    #[default]
    Lenient,
    /// Surface corrupt state as an error.
    Strict,
}

/// Read the persisted state, or the default when nothing usable is stored.
///
/// A store that cannot be read is always an error: starting empty would let
/// the first write replace state that may still be intact.
#[instrument(skip(store))]
pub async fn load_state<S>(store: &S, policy: LoadPolicy) -> Result<AppState, PersistError>
where
    S: KeyValueStore + ?Sized,
{
    let bytes = match store.get(TASKS_STATE_KEY).await {
        Ok(bytes) => bytes,
        Err(StoreError::NotFound { .. }) => {
            debug!("no stored state, starting empty");
            return Ok(AppState::default());
        }
        Err(err) => return Err(PersistError::Read(err)),
    };

    match serde_json::from_slice::<AppState>(&bytes) {
        Ok(state) => {
            debug!(tasks = state.tasks.len(), "loaded stored state");
            Ok(state)
        }
        Err(err) if policy == LoadPolicy::Strict => Err(PersistError::Corrupt(err)),
        Err(err) => {
            let backup = park_corrupt(store, &bytes)
                .await
                .map_err(PersistError::Backup)?;
            warn!(%backup, "stored state is corrupt, starting empty: {err}");
            Ok(AppState::default())
        }
    }
}

/// Copy unreadable bytes to the first free backup slot. Returns its key.
async fn park_corrupt<S>(store: &S, bytes: &[u8]) -> Result<String, StoreError>
where
    S: KeyValueStore + ?Sized,
{
    let mut slot = 1u32;
    loop {
        let key = format!("{CORRUPT_STATE_KEY}.{slot}");
        match store.get(&key).await {
            Ok(_) => slot += 1,
            Err(StoreError::NotFound { .. }) => {
                store.put(&key, bytes).await?;
                return Ok(key);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Result of the most recent completed write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Generation of the snapshot that was written; 0 before any write.
    pub generation: u64,
    pub error: Option<String>,
}

impl WriteOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    generation: u64,
    bytes: Arc<Vec<u8>>,
}

/// Single writer for the state slot.
///
/// Submitted snapshots are handed to one background task through a watch
/// channel: at most one write is in flight, and anything submitted meanwhile
/// collapses into the newest snapshot. Writes land in generation order, so an
/// older state can never overwrite a newer one.
pub struct PersistQueue {
    pending: watch::Sender<Snapshot>,
    outcome: watch::Receiver<WriteOutcome>,
    generation: u64,
    worker: JoinHandle<()>,
}

impl PersistQueue {
    /// Start the writer on the current tokio runtime.
    pub fn spawn<S>(store: S, key: impl Into<String>) -> Self
    where
        S: KeyValueStore + 'static,
    {
        let (pending, pending_rx) = watch::channel(Snapshot::default());
        let (outcome_tx, outcome) = watch::channel(WriteOutcome::default());
        let worker = tokio::spawn(run_writer(store, key.into(), pending_rx, outcome_tx));
        Self {
            pending,
            outcome,
            generation: 0,
            worker,
        }
    }

    /// Queue the whole state for writing. Returns the snapshot generation.
    pub fn submit(&mut self, state: &AppState) -> Result<u64, PersistError> {
        let bytes = serde_json::to_vec(state).map_err(PersistError::Encode)?;
        self.generation += 1;
        let snapshot = Snapshot {
            generation: self.generation,
            bytes: Arc::new(bytes),
        };
        self.pending
            .send(snapshot)
            .map_err(|_| PersistError::WriterGone)?;
        Ok(self.generation)
    }

    /// Generation of the newest submitted snapshot.
    pub fn submitted(&self) -> u64 {
        self.generation
    }

    pub fn last_outcome(&self) -> WriteOutcome {
        self.outcome.borrow().clone()
    }

    /// Wait until the newest submitted snapshot has been written.
    pub async fn flush(&self) -> Result<(), PersistError> {
        let target = self.generation;
        let mut outcome = self.outcome.clone();
        let done = outcome
            .wait_for(|o| o.generation >= target)
            .await
            .map_err(|_| PersistError::WriterGone)?
            .clone();
        match done.error {
            Some(reason) => Err(PersistError::Write {
                generation: done.generation,
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Flush and stop the writer.
    pub async fn shutdown(self) -> Result<(), PersistError> {
        let flushed = self.flush().await;
        drop(self.pending);
        if let Err(err) = self.worker.await {
            warn!("state writer ended abnormally: {err}");
        }
        flushed
    }
}

async fn run_writer<S: KeyValueStore>(
    store: S,
    key: String,
    mut pending: watch::Receiver<Snapshot>,
    outcome: watch::Sender<WriteOutcome>,
) {
    while pending.changed().await.is_ok() {
        let snapshot = pending.borrow_and_update().clone();
        let error = match store.put(&key, &snapshot.bytes).await {
            Ok(()) => {
                debug!(generation = snapshot.generation, "state written");
                None
            }
            Err(err) => {
                error!(generation = snapshot.generation, "state write failed: {err}");
                Some(err.to_string())
            }
        };
        outcome.send_replace(WriteOutcome {
            generation: snapshot.generation,
            error,
        });
    }
}
