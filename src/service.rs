//! Upstream contract for log point management and dispatch.
//!
//! Wraps a [`LogPointStore`] and owns everything the storage layer does not:
//! id generation, expiration normalization, absolute expiry computation, and
//! the authoritative targeting pass over coarse scans.

use crate::expiration::{compute_expire_timestamp, normalize_expire_count, normalize_expire_secs};
use crate::matcher;
use crate::model::{ApplicationFilter, LogPoint, LogPointConfig, LogPointUpdate};
use crate::store::{LogPointStore, StoreError};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

pub struct LogPointService<S> {
    store: S,
}

impl<S: LogPointStore> LogPointService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Store a new log point and return its effective id.
    ///
    /// The caller-supplied workspace, user, and origin win over whatever the
    /// submitted config carries; an empty id is replaced with a fresh UUID.
    /// Expiration limits are normalized and the absolute expiry is computed
    /// from the submission instant.
    pub async fn put_log_point(
        &self,
        workspace_id: &str,
        user_id: &str,
        mut config: LogPointConfig,
        from_api: bool,
    ) -> Result<String, StoreError> {
        if config.point.id.is_empty() {
            config.point.id = Uuid::new_v4().to_string();
        }
        config.point.workspace_id = workspace_id.to_string();
        config.point.user_id = user_id.to_string();
        config.point.from_api = from_api;

        config.point.expire_secs = normalize_expire_secs(config.point.expire_secs);
        config.point.expire_count = normalize_expire_count(config.point.expire_count);
        config.point.expire_timestamp =
            compute_expire_timestamp(config.point.expire_secs, Utc::now());

        self.store.insert(&config).await?;

        metrics::counter!("logpoints.created").increment(1);
        info!(
            id = %config.point.id,
            file_name = %config.point.file_name,
            line_no = config.point.line_no,
            "Log point stored"
        );

        Ok(config.point.id)
    }

    /// Fetch a probe with its targeting filters, scoped to a workspace
    pub async fn get_log_point(
        &self,
        workspace_id: &str,
        id: &str,
    ) -> Result<Option<LogPointConfig>, StoreError> {
        self.store.get(workspace_id, id).await
    }

    /// Fetch a probe by id alone (direct dispatch by probe identifier)
    pub async fn get_log_point_by_id(&self, id: &str) -> Result<Option<LogPoint>, StoreError> {
        self.store.get_by_id(id).await
    }

    /// List a user's probes in a workspace
    pub async fn list_log_points(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Vec<LogPoint>, StoreError> {
        self.store
            .list_by_workspace_and_user(workspace_id, user_id, false)
            .await
    }

    /// List only the predefined/system-provided probes
    pub async fn list_predefined_log_points(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Vec<LogPoint>, StoreError> {
        self.store
            .list_by_workspace_and_user(workspace_id, user_id, true)
            .await
    }

    /// Overwrite the mutable fields of a probe.
    ///
    /// The absolute expiry is recomputed from the update instant, so an
    /// earlier expiry never outlives a change to `expire_secs`.
    pub async fn update_log_point(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
        mut update: LogPointUpdate,
    ) -> Result<(), StoreError> {
        update.expire_secs = normalize_expire_secs(update.expire_secs);
        update.expire_count = normalize_expire_count(update.expire_count);
        update.expire_timestamp = compute_expire_timestamp(update.expire_secs, Utc::now());

        self.store.update(workspace_id, user_id, id, &update).await
    }

    /// Enable or disable a probe without touching its other fields
    pub async fn enable_disable_log_point(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
        disabled: bool,
    ) -> Result<(), StoreError> {
        self.store
            .set_disabled(workspace_id, user_id, id, disabled)
            .await
    }

    /// Remove a single probe
    pub async fn remove_log_point(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
    ) -> Result<(), StoreError> {
        self.store.delete(workspace_id, user_id, id).await?;
        metrics::counter!("logpoints.removed").increment(1);
        Ok(())
    }

    /// Remove a batch of probes, returning how many existed
    pub async fn remove_log_points(
        &self,
        workspace_id: &str,
        user_id: &str,
        ids: &[String],
    ) -> Result<u64, StoreError> {
        let affected = self.store.delete_many(workspace_id, user_id, ids).await?;
        metrics::counter!("logpoints.removed").increment(affected);
        Ok(affected)
    }

    /// Resolve the probes a live application instance should evaluate.
    ///
    /// The store performs a coarse superset scan; the in-process matcher is
    /// the authority on targeting and on excluding disabled probes.
    pub async fn query_log_points(
        &self,
        workspace_id: &str,
        requester: &ApplicationFilter,
    ) -> Result<Vec<LogPoint>, StoreError> {
        let candidates = self.store.scan_by_workspace(workspace_id, requester).await?;
        let matched = matcher::select_targets(candidates, requester);

        metrics::counter!("logpoints.dispatched").increment(matched.len() as u64);
        debug!(
            workspace_id,
            matched = matched.len(),
            "Resolved log points for dispatch"
        );

        Ok(matched)
    }
}
