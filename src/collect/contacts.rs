use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use rusqlite::{params, Connection, OpenFlags};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::ContactRecord;

/// Read-only handle on the platform contacts index: a `contacts` table plus
/// a `phone_numbers` table keyed by contact id.
pub struct ContactsIndex {
    path: PathBuf,
}

impl ContactsIndex {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open contacts index {}", self.path.display()))
    }

    /// Synchronous collection loop. One query lists the contacts, then
    /// every contact flagged as having numbers costs a secondary lookup.
    /// That per-contact cost is why callers go through [`ContactCollection`]
    /// instead of running this on an interactive thread.
    ///
    /// Cancellation is checked between contacts; a cancelled run reports an
    /// error rather than a partial list.
    fn collect(&self, cancel: &CancellationToken) -> Result<Vec<ContactRecord>> {
        let conn = self.open()?;

        let mut stmt = conn.prepare(
            "SELECT id, display_name, has_phone_number
             FROM contacts
             ORDER BY id",
        )?;
        let listed = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("failed to list contacts index")?;

        let mut number_stmt = conn.prepare(
            "SELECT number FROM phone_numbers
             WHERE contact_id = ?1
             ORDER BY rowid",
        )?;

        let mut contacts = Vec::new();
        for (id, name, has_phone_number) in listed {
            if cancel.is_cancelled() {
                bail!("contact collection cancelled");
            }
            if has_phone_number == 0 {
                continue;
            }

            let phone_numbers = number_stmt
                .query_map(params![id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("phone number lookup failed for contact {id}"))?;

            if phone_numbers.is_empty() {
                warn!("Contact {id} is flagged as having numbers but none were found; skipping");
                continue;
            }

            contacts.push(ContactRecord {
                name,
                phone_numbers,
            });
        }

        info!("Contact collection finished with {} records", contacts.len());
        Ok(contacts)
    }
}

/// An in-flight contact collection.
///
/// The loop runs on a blocking worker so interactive callers never sit
/// behind the per-contact lookups. Dropping the handle without awaiting
/// [`finish`](Self::finish) cancels the run, so an abandoned collection
/// stops at the next contact boundary instead of scanning to completion
/// unobserved.
pub struct ContactCollection {
    handle: Option<JoinHandle<Result<Vec<ContactRecord>>>>,
    cancel: CancellationToken,
}

impl ContactCollection {
    /// Spawn the collection task. Must be called from within a Tokio
    /// runtime.
    pub fn start(index: ContactsIndex) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || index.collect(&token));
        Self {
            handle: Some(handle),
            cancel,
        }
    }

    /// Ask the running collection to stop at the next contact boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Await the collected records. A cancelled collection reports an
    /// explicit error, never a truncated list.
    pub async fn finish(mut self) -> Result<Vec<ContactRecord>> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("contact collection already finished"))?;
        handle
            .await
            .context("contact collection task failed to join")?
    }
}

impl Drop for ContactCollection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
