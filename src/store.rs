//! Persistence gateway for log points.
//!
//! The service layer talks to durable storage through [`LogPointStore`];
//! adapters own row mapping and whatever coarse pruning their backend can
//! express. Identity collisions are arbitrated by the storage layer itself
//! (unique constraint, write lock), never by a check-then-insert in callers.

use crate::codec::CodecError;
use crate::model::{ApplicationFilter, LogPoint, LogPointConfig, LogPointUpdate};
use thiserror::Error;

/// Errors surfaced by a log point store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A live probe already exists for (workspace, file, line, client)
    #[error("log point already exists at {file_name}:{line_no} for client {client}")]
    DuplicateLogPoint {
        file_name: String,
        line_no: i32,
        client: String,
    },

    /// A stored list column failed to decode; storage integrity is lost
    #[error("corrupt column {column} on log point {id}")]
    CorruptColumn {
        id: String,
        column: &'static str,
        #[source]
        source: CodecError,
    },

    /// List encoding failed on the write path
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Underlying database error
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Durable storage operations required by the log point service.
///
/// Lookups return `Ok(None)` for absent rows; only duplicate identities,
/// corrupt stored columns, and backend failures are errors.
#[async_trait::async_trait]
pub trait LogPointStore: Send + Sync {
    /// Fetch a probe with its targeting filters, scoped to a workspace
    async fn get(&self, workspace_id: &str, id: &str)
        -> Result<Option<LogPointConfig>, StoreError>;

    /// Fetch a probe by id across workspaces (direct dispatch path)
    async fn get_by_id(&self, id: &str) -> Result<Option<LogPoint>, StoreError>;

    /// Insert a new probe; fails with [`StoreError::DuplicateLogPoint`] when
    /// a live probe already occupies the same (workspace, file, line, client)
    async fn insert(&self, config: &LogPointConfig) -> Result<(), StoreError>;

    /// Overwrite the mutable fields of a probe
    async fn update(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
        update: &LogPointUpdate,
    ) -> Result<(), StoreError>;

    /// Toggle the disabled flag
    async fn set_disabled(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
        disabled: bool,
    ) -> Result<(), StoreError>;

    /// Remove a single probe
    async fn delete(&self, workspace_id: &str, user_id: &str, id: &str)
        -> Result<(), StoreError>;

    /// Remove a batch of probes, returning how many rows went away
    async fn delete_many(
        &self,
        workspace_id: &str,
        user_id: &str,
        ids: &[String],
    ) -> Result<u64, StoreError>;

    /// List a user's probes in a workspace, ordered by file, line, client
    async fn list_by_workspace_and_user(
        &self,
        workspace_id: &str,
        user_id: &str,
        predefined_only: bool,
    ) -> Result<Vec<LogPoint>, StoreError>;

    /// Scan a workspace's enabled probes for targeting.
    ///
    /// The requester is a coarse pruning hint only: adapters may use it to
    /// narrow the scan but must return a superset of the probes
    /// [`crate::matcher::select_targets`] would keep.
    async fn scan_by_workspace(
        &self,
        workspace_id: &str,
        requester: &ApplicationFilter,
    ) -> Result<Vec<LogPointConfig>, StoreError>;
}
