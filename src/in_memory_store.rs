//! In-memory adapter for the log point store.
//!
//! Observably equivalent to the PostgreSQL adapter and used as the test and
//! embedding vehicle. Identity uniqueness is enforced atomically under the
//! write lock, so concurrent inserts race here exactly as they do against
//! the database constraint: the loser gets `DuplicateLogPoint`.

use crate::model::{ApplicationFilter, LogPoint, LogPointConfig, LogPointUpdate};
use crate::store::{LogPointStore, StoreError};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryLogPointStore {
    rows: RwLock<Vec<LogPointConfig>>,
}

impl InMemoryLogPointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_identity(row: &LogPoint, other: &LogPoint) -> bool {
    row.workspace_id == other.workspace_id
        && row.file_name == other.file_name
        && row.line_no == other.line_no
        && row.client == other.client
}

fn owned_by(row: &LogPoint, workspace_id: &str, user_id: &str, id: &str) -> bool {
    row.workspace_id == workspace_id && row.user_id == user_id && row.id == id
}

#[async_trait::async_trait]
impl LogPointStore for InMemoryLogPointStore {
    async fn get(
        &self,
        workspace_id: &str,
        id: &str,
    ) -> Result<Option<LogPointConfig>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| row.point.workspace_id == workspace_id && row.point.id == id)
            .cloned())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<LogPoint>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| row.point.id == id)
            .map(|row| row.point.clone()))
    }

    async fn insert(&self, config: &LogPointConfig) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;

        if rows.iter().any(|row| same_identity(&row.point, &config.point)) {
            return Err(StoreError::DuplicateLogPoint {
                file_name: config.point.file_name.clone(),
                line_no: config.point.line_no,
                client: config.point.client.clone(),
            });
        }

        rows.push(config.clone());
        Ok(())
    }

    async fn update(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
        update: &LogPointUpdate,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;

        // Updating an absent row is a no-op, matching an UPDATE that
        // affects zero rows.
        if let Some(row) = rows
            .iter_mut()
            .find(|row| owned_by(&row.point, workspace_id, user_id, id))
        {
            row.point.condition_expression = update.condition_expression.clone();
            row.point.expire_secs = update.expire_secs;
            row.point.expire_count = update.expire_count;
            row.point.expire_timestamp = update.expire_timestamp;
            row.point.log_expression = update.log_expression.clone();
            row.point.stdout_enabled = update.stdout_enabled;
            row.point.log_level = update.log_level.clone();
            row.point.webhook_ids = update.webhook_ids.clone();
            row.point.predefined = update.predefined;
            row.point.probe_name = update.probe_name.clone();
        }

        Ok(())
    }

    async fn set_disabled(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
        disabled: bool,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;

        if let Some(row) = rows
            .iter_mut()
            .find(|row| owned_by(&row.point, workspace_id, user_id, id))
        {
            row.point.disabled = disabled;
        }

        Ok(())
    }

    async fn delete(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        rows.retain(|row| !owned_by(&row.point, workspace_id, user_id, id));
        Ok(())
    }

    async fn delete_many(
        &self,
        workspace_id: &str,
        user_id: &str,
        ids: &[String],
    ) -> Result<u64, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| {
            !(row.point.workspace_id == workspace_id
                && row.point.user_id == user_id
                && ids.contains(&row.point.id))
        });
        Ok((before - rows.len()) as u64)
    }

    async fn list_by_workspace_and_user(
        &self,
        workspace_id: &str,
        user_id: &str,
        predefined_only: bool,
    ) -> Result<Vec<LogPoint>, StoreError> {
        let rows = self.rows.read().await;
        let mut points: Vec<LogPoint> = rows
            .iter()
            .filter(|row| {
                row.point.workspace_id == workspace_id
                    && row.point.user_id == user_id
                    && (!predefined_only || row.point.predefined)
            })
            .map(|row| row.point.clone())
            .collect();

        points.sort_by(|a, b| {
            (&a.file_name, a.line_no, &a.client).cmp(&(&b.file_name, b.line_no, &b.client))
        });

        Ok(points)
    }

    async fn scan_by_workspace(
        &self,
        workspace_id: &str,
        _requester: &ApplicationFilter,
    ) -> Result<Vec<LogPointConfig>, StoreError> {
        // No indexable filter columns here: the scan prunes by workspace and
        // disabled only and the matcher does the rest.
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| row.point.workspace_id == workspace_id && !row.point.disabled)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(workspace_id: &str, id: &str, client: &str) -> LogPointConfig {
        LogPointConfig {
            point: LogPoint {
                id: id.to_string(),
                workspace_id: workspace_id.to_string(),
                user_id: "u1".to_string(),
                file_name: "a.py".to_string(),
                line_no: 10,
                client: client.to_string(),
                condition_expression: None,
                expire_secs: None,
                expire_count: None,
                file_hash: None,
                disabled: false,
                expire_timestamp: None,
                log_expression: "hit".to_string(),
                stdout_enabled: false,
                log_level: "INFO".to_string(),
                webhook_ids: vec![],
                from_api: false,
                predefined: false,
                probe_name: None,
            },
            application_filters: vec![],
        }
    }

    #[tokio::test]
    async fn test_duplicate_identity_is_rejected() {
        let store = InMemoryLogPointStore::new();
        store.insert(&test_config("W1", "lp-1", "c1")).await.unwrap();

        let result = store.insert(&test_config("W1", "lp-2", "c1")).await;
        match result {
            Err(StoreError::DuplicateLogPoint {
                file_name,
                line_no,
                client,
            }) => {
                assert_eq!(file_name, "a.py");
                assert_eq!(line_no, 10);
                assert_eq!(client, "c1");
            }
            other => panic!("Expected DuplicateLogPoint, got {other:?}"),
        }

        // Same file and line but another client is a distinct identity
        store.insert(&test_config("W1", "lp-3", "c2")).await.unwrap();
    }

    #[tokio::test]
    async fn test_deleting_frees_the_identity() {
        let store = InMemoryLogPointStore::new();
        store.insert(&test_config("W1", "lp-1", "c1")).await.unwrap();
        store.delete("W1", "u1", "lp-1").await.unwrap();

        store.insert(&test_config("W1", "lp-2", "c1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_many_reports_affected_rows() {
        let store = InMemoryLogPointStore::new();
        store.insert(&test_config("W1", "lp-1", "c1")).await.unwrap();
        store.insert(&test_config("W1", "lp-2", "c2")).await.unwrap();
        store.insert(&test_config("W1", "lp-3", "c3")).await.unwrap();

        let ids = vec![
            "lp-1".to_string(),
            "lp-3".to_string(),
            "missing".to_string(),
        ];
        let affected = store.delete_many("W1", "u1", &ids).await.unwrap();
        assert_eq!(affected, 2);

        let remaining = store.list_by_workspace_and_user("W1", "u1", false).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "lp-2");
    }

    #[tokio::test]
    async fn test_scan_skips_other_workspaces_and_disabled_rows() {
        let store = InMemoryLogPointStore::new();
        store.insert(&test_config("W1", "lp-1", "c1")).await.unwrap();
        store.insert(&test_config("W2", "lp-2", "c1")).await.unwrap();
        store.insert(&test_config("W1", "lp-3", "c3")).await.unwrap();
        store.set_disabled("W1", "u1", "lp-3", true).await.unwrap();

        let scanned = store
            .scan_by_workspace("W1", &ApplicationFilter::default())
            .await
            .unwrap();
        assert_eq!(scanned.len(), 1);
        assert_eq!(scanned[0].point.id, "lp-1");
    }
}
