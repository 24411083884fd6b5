use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::oneshot;

mod migrations;

use migrations::run_migrations;

type CacheTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum CacheCommand {
    Execute(CacheTask),
    Shutdown,
}

struct CacheStoreInner {
    sender: mpsc::Sender<CacheCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for CacheStoreInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(CacheCommand::Shutdown) {
                error!("Failed to send shutdown to cache thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join cache thread: {join_err:?}");
            }
        }
    }
}

/// Durable key-value store backed by SQLite.
///
/// A dedicated worker thread owns the connection and every operation runs as
/// a task on that thread, so writes are serialized and a multi-entry write
/// is never observable half done. Handles are cheap to clone; dropping the
/// last one shuts the worker down.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<CacheStoreInner>,
}

impl CacheStore {
    /// Open (creating if needed) the store at `db_path`. Parent directories
    /// are created, the schema is migrated to the current version, and the
    /// call does not return until the worker is ready to accept operations.
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create cache directory {}", parent.display())
            })?;
        }
        Self::spawn_worker(Some(db_path))
    }

    /// Open a store that lives only as long as the handle. Used by tests and
    /// callers that want caching semantics without persistence.
    pub fn open_in_memory() -> Result<Self> {
        Self::spawn_worker(None)
    }

    fn spawn_worker(db_path: Option<PathBuf>) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<CacheCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("devscan-cache".into())
            .spawn(move || {
                let open_result = match &path_for_thread {
                    Some(path) => Connection::open(path),
                    None => Connection::open_in_memory(),
                };
                let mut conn = match open_result {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("failed to open cache database")));
                        return;
                    }
                };

                if path_for_thread.is_some() {
                    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                        error!("Failed to enable WAL mode: {err}");
                    }
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run cache migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("Cache initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        CacheCommand::Execute(task) => {
                            task(&mut conn);
                        }
                        CacheCommand::Shutdown => break,
                    }
                }

                info!("Cache thread shutting down");
            })
            .with_context(|| "failed to spawn cache worker thread")?;

        ready_rx
            .recv()
            .context("cache worker exited before signaling readiness")??;

        match &db_path {
            Some(path) => info!("Cache store initialized at {}", path.display()),
            None => info!("Cache store initialized in memory"),
        }

        Ok(Self {
            inner: Arc::new(CacheStoreInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.inner.sender.clone();
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = CacheCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("Cache caller dropped before receiving result");
            }
        }));

        sender
            .send(command)
            .map_err(|err| anyhow!("failed to send command to cache thread: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("cache thread terminated unexpectedly"))?
    }

    /// Look up a single key. Absent keys read as `None`, not as an error.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| "failed to read cache entry")
        })
        .await
    }

    /// Look up several keys at once. The result contains only the keys that
    /// were present, so callers can tell a partial cache from a full one.
    pub async fn get_all(&self, keys: &[&str]) -> Result<HashMap<String, String>> {
        let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT value FROM kv_entries WHERE key = ?1")?;
            let mut entries = HashMap::new();
            for key in keys {
                let value: Option<String> = stmt
                    .query_row(params![key], |row| row.get(0))
                    .optional()?;
                if let Some(value) = value {
                    entries.insert(key, value);
                }
            }
            Ok(entries)
        })
        .await
    }

    /// Write every entry in one transaction. Existing values are replaced;
    /// either all entries land or none do.
    pub async fn put_all(&self, entries: &[(String, String)]) -> Result<()> {
        let entries = entries.to_vec();
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .with_context(|| "failed to begin cache transaction")?;
            for (key, value) in &entries {
                tx.execute(
                    "INSERT OR REPLACE INTO kv_entries (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )
                .with_context(|| "failed to write cache entry")?;
            }
            tx.commit().with_context(|| "failed to commit cache entries")
        })
        .await
    }

    /// Whether every one of `keys` is present.
    pub async fn has_all(&self, keys: &[&str]) -> Result<bool> {
        let wanted = keys.len();
        let entries = self.get_all(keys).await?;
        Ok(entries.len() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn absent_keys_read_as_none() {
        let store = CacheStore::open_in_memory().unwrap();

        assert_eq!(store.get("Device Model").await.unwrap(), None);
        assert!(!store.has_all(&["Device Model"]).await.unwrap());
        assert!(store
            .get_all(&["Device Model", "OS Version"])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn put_all_makes_every_entry_visible() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put_all(&entries(&[("Device Model", "Pixel 4"), ("OS Version", "11")]))
            .await
            .unwrap();

        assert_eq!(
            store.get("Device Model").await.unwrap().as_deref(),
            Some("Pixel 4")
        );
        assert!(store.has_all(&["Device Model", "OS Version"]).await.unwrap());

        let all = store.get_all(&["Device Model", "OS Version"]).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get("OS Version").map(String::as_str), Some("11"));
    }

    #[tokio::test]
    async fn put_all_replaces_existing_values() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put_all(&entries(&[("OS Version", "10")]))
            .await
            .unwrap();
        store
            .put_all(&entries(&[("OS Version", "11"), ("Manufacturer", "Google")]))
            .await
            .unwrap();

        assert_eq!(store.get("OS Version").await.unwrap().as_deref(), Some("11"));
        assert_eq!(
            store.get("Manufacturer").await.unwrap().as_deref(),
            Some("Google")
        );
    }

    #[tokio::test]
    async fn has_all_is_false_for_partial_sets() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put_all(&entries(&[("Device Model", "Pixel 4")]))
            .await
            .unwrap();

        assert!(store.has_all(&["Device Model"]).await.unwrap());
        assert!(!store
            .has_all(&["Device Model", "Screen Resolution"])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.db");

        {
            let store = CacheStore::open(path.clone()).unwrap();
            store
                .put_all(&entries(&[
                    ("Device Model", "Pixel 4"),
                    ("Screen Resolution", "1080 x 2280"),
                ]))
                .await
                .unwrap();
        }

        let reopened = CacheStore::open(path).unwrap();
        assert!(reopened
            .has_all(&["Device Model", "Screen Resolution"])
            .await
            .unwrap());
        assert_eq!(
            reopened.get("Screen Resolution").await.unwrap().as_deref(),
            Some("1080 x 2280")
        );
    }

    #[tokio::test]
    async fn empty_values_are_stored_verbatim() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put_all(&entries(&[("Manufacturer", "")]))
            .await
            .unwrap();

        assert_eq!(store.get("Manufacturer").await.unwrap().as_deref(), Some(""));
        assert!(store.has_all(&["Manufacturer"]).await.unwrap());
    }
}
