/// Run status side channel.
///
/// Payload-driven runs report their progress under a status key so the
/// scheduler that launched them can follow along. Without a status database
/// the run uses `NullStatusStore` and reporting is a no-op.
///
/// Expected schema for `PgStatusStore`:
///
/// ```sql
/// CREATE TABLE run_status (
///     key        TEXT PRIMARY KEY,
///     state      TEXT NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use postgres::{Client, NoTls};
use tracing::debug;

use crate::error::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    InProgress,
    Done,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Pending => "pending",
            RunState::InProgress => "in_progress",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the state of a run under its status key.
pub trait StatusStore: Send + Sync {
    fn mark(&self, key: &str, state: RunState) -> Result<(), SourceError>;
}

/// Discards every status update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusStore;

impl StatusStore for NullStatusStore {
    fn mark(&self, key: &str, state: RunState) -> Result<(), SourceError> {
        debug!(key, state = %state, "status store not configured, skipping update");
        Ok(())
    }
}

/// Upserts status rows into the `run_status` table.
pub struct PgStatusStore {
    database_url: String,
}

impl PgStatusStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self { database_url: database_url.into() }
    }
}

impl StatusStore for PgStatusStore {
    fn mark(&self, key: &str, state: RunState) -> Result<(), SourceError> {
        let mut client = Client::connect(&self.database_url, NoTls)?;
        client.execute(
            "INSERT INTO run_status (key, state, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT (key) DO UPDATE SET state = EXCLUDED.state, updated_at = EXCLUDED.updated_at",
            &[&key, &state.as_str(), &Utc::now()],
        )?;
        debug!(key, state = %state, "status updated");
        Ok(())
    }
}

/// Picks the status store for the configured database, if any.
pub fn status_store(database_url: Option<&str>) -> Arc<dyn StatusStore> {
    match database_url {
        Some(url) => Arc::new(PgStatusStore::new(url)),
        None => Arc::new(NullStatusStore),
    }
}
