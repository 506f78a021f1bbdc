//! Worker-owned SQLite connection.
//!
//! A `Storage` handle owns one connection on a dedicated thread. Callers
//! submit closures over the connection and await exactly one reply each.
//! Requests run in submission order, one at a time, so every component
//! built on a handle gets single-writer semantics for free.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use lemon_db::DbError;
use rusqlite::Connection;
use tokio::sync::{mpsc, oneshot};

use crate::{Result, StoreError};

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum Command {
    Run(Job),
    Shutdown { reply_to: oneshot::Sender<()> },
}

/// Failure of a single storage request.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// The worker has shut down or died.
    #[error("storage worker is not running")]
    Closed,

    #[error(transparent)]
    Db(#[from] DbError),
}

impl CallError {
    /// Map a database failure with `f`; a dead worker is always
    /// [`StoreError::StorageUnavailable`].
    pub fn or_unavailable(self, f: impl FnOnce(String) -> StoreError) -> StoreError {
        match self {
            Self::Closed => StoreError::StorageUnavailable(Self::Closed.to_string()),
            Self::Db(e) => f(e.to_string()),
        }
    }
}

/// Cloneable handle to a storage worker.
#[derive(Clone)]
pub struct Storage {
    sender: mpsc::UnboundedSender<Command>,
    label: Arc<str>,
}

impl Storage {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let label = path.display().to_string();
        Self::spawn(label, move || lemon_db::open(&path)).await
    }

    /// Open a private in-memory database.
    pub async fn open_memory() -> Result<Self> {
        Self::spawn(":memory:".to_string(), lemon_db::open_memory).await
    }

    async fn spawn<F>(label: String, opener: F) -> Result<Self>
    where
        F: FnOnce() -> lemon_db::Result<Connection> + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let worker_label = label.clone();

        thread::Builder::new()
            .name("lemon-storage".to_string())
            .spawn(move || run_worker(worker_label, opener, receiver, ready_tx))
            .map_err(|e| StoreError::StorageUnavailable(format!("spawn worker: {e}")))?;

        match ready_rx.await {
            Ok(Ok(())) => {
                tracing::debug!(db = %label, "storage opened");
                Ok(Self {
                    sender,
                    label: label.into(),
                })
            }
            Ok(Err(e)) => {
                tracing::error!(db = %label, error = %e, "failed to open storage");
                Err(StoreError::StorageUnavailable(format!("{label}: {e}")))
            }
            Err(_) => Err(StoreError::StorageUnavailable(format!(
                "{label}: worker exited before opening"
            ))),
        }
    }

    /// Run `f` against the connection and wait for its result.
    pub async fn call<T, F>(&self, f: F) -> std::result::Result<T, CallError>
    where
        F: FnOnce(&mut Connection) -> lemon_db::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_to, reply) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            // Receiver gone means the caller stopped waiting.
            let _ = reply_to.send(f(conn));
        });

        self.sender
            .send(Command::Run(job))
            .map_err(|_| CallError::Closed)?;

        reply.await.map_err(|_| CallError::Closed)?.map_err(CallError::Db)
    }

    /// Stop the worker and close the connection. Later calls fail with
    /// [`CallError::Closed`]. Closing twice is harmless.
    pub async fn close(&self) {
        let (reply_to, reply) = oneshot::channel();
        if self.sender.send(Command::Shutdown { reply_to }).is_ok() {
            let _ = reply.await;
        }
        tracing::debug!(db = %self.label, "storage closed");
    }
}

fn run_worker<F>(
    label: String,
    opener: F,
    mut receiver: mpsc::UnboundedReceiver<Command>,
    ready_tx: oneshot::Sender<lemon_db::Result<()>>,
) where
    F: FnOnce() -> lemon_db::Result<Connection>,
{
    let mut conn = match opener() {
        Ok(conn) => conn,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    if ready_tx.send(Ok(())).is_err() {
        return;
    }

    let mut shutdown_reply = None;
    while let Some(command) = receiver.blocking_recv() {
        match command {
            Command::Run(job) => job(&mut conn),
            Command::Shutdown { reply_to } => {
                shutdown_reply = Some(reply_to);
                break;
            }
        }
    }

    receiver.close();
    if let Err((_, e)) = conn.close() {
        tracing::warn!(db = %label, error = %e, "closing connection failed");
    }
    if let Some(reply_to) = shutdown_reply {
        let _ = reply_to.send(());
    }
    tracing::debug!(db = %label, "storage worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_call_returns_value() {
        let storage = Storage::open_memory().await.expect("open");
        let answer: i64 = storage
            .call(|conn| Ok(conn.query_row("SELECT 40 + 2", [], |row| row.get(0))?))
            .await
            .expect("call");
        assert_eq!(answer, 42);
    }

    #[tokio::test]
    async fn test_calls_run_in_order() {
        let storage = Storage::open_memory().await.expect("open");
        storage
            .call(|conn| Ok(conn.execute_batch("CREATE TABLE log (n INTEGER);")?))
            .await
            .expect("create");

        let pending: Vec<_> = (0..20)
            .map(|n| {
                storage.call(move |conn| Ok(conn.execute("INSERT INTO log (n) VALUES (?1)", [n])?))
            })
            .collect();
        for call in pending {
            call.await.expect("insert");
        }

        let values: Vec<i64> = storage
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT n FROM log ORDER BY rowid")?;
                let rows = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .expect("select");
        assert_eq!(values, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_db_error_is_reported() {
        let storage = Storage::open_memory().await.expect("open");
        let result = storage
            .call(|conn| Ok(conn.execute_batch("SELECT * FROM missing;")?))
            .await;
        assert!(matches!(result, Err(CallError::Db(_))));

        // The worker survives a failed request.
        storage.call(|_| Ok(())).await.expect("still running");
    }

    #[tokio::test]
    async fn test_closed_storage() {
        let storage = Storage::open_memory().await.expect("open");
        storage.close().await;
        storage.close().await;

        let result = storage.call(|_| Ok(())).await;
        assert!(matches!(result, Err(CallError::Closed)));
        assert!(matches!(
            CallError::Closed.or_unavailable(StoreError::QueryFailed),
            StoreError::StorageUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_open_unreachable_path() {
        let result = Storage::open("/nonexistent/little-lemon/menu.db").await;
        assert!(matches!(result, Err(StoreError::StorageUnavailable(_))));
    }
}
