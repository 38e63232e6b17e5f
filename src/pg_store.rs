//! PostgreSQL adapter for the log point store.

use crate::codec;
use crate::config::DatabaseConfig;
use crate::model::{ApplicationFilter, LogPoint, LogPointConfig, LogPointUpdate};
use crate::store::{LogPointStore, StoreError};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Log point store backed by PostgreSQL.
///
/// Identity uniqueness is enforced by the `log_points_identity_key`
/// constraint; concurrent inserts race in the database, and the loser
/// surfaces as [`StoreError::DuplicateLogPoint`].
pub struct PgLogPointStore {
    pool: PgPool,
}

/// Raw row shape; list columns stay encoded until [`LogPointRow::into_point`]
/// or [`LogPointRow::into_config`] runs the codec over them.
#[derive(Debug, FromRow)]
struct LogPointRow {
    id: String,
    workspace_id: String,
    user_id: String,
    file_name: String,
    line_no: i32,
    client: String,
    condition_expression: Option<String>,
    expire_secs: Option<i64>,
    expire_count: Option<i64>,
    file_hash: Option<String>,
    disabled: bool,
    expire_timestamp: Option<DateTime<Utc>>,
    application_filters: Option<String>,
    log_expression: String,
    stdout_enabled: bool,
    log_level: String,
    webhook_ids: Option<String>,
    from_api: bool,
    predefined: bool,
    probe_name: Option<String>,
}

impl LogPointRow {
    fn into_point(self) -> Result<LogPoint, StoreError> {
        let webhook_ids =
            codec::decode_list(self.webhook_ids.as_deref()).map_err(|source| {
                StoreError::CorruptColumn {
                    id: self.id.clone(),
                    column: "webhook_ids",
                    source,
                }
            })?;

        Ok(LogPoint {
            id: self.id,
            workspace_id: self.workspace_id,
            user_id: self.user_id,
            file_name: self.file_name,
            line_no: self.line_no,
            client: self.client,
            condition_expression: self.condition_expression,
            expire_secs: self.expire_secs,
            expire_count: self.expire_count,
            file_hash: self.file_hash,
            disabled: self.disabled,
            expire_timestamp: self.expire_timestamp,
            log_expression: self.log_expression,
            stdout_enabled: self.stdout_enabled,
            log_level: self.log_level,
            webhook_ids,
            from_api: self.from_api,
            predefined: self.predefined,
            probe_name: self.probe_name,
        })
    }

    fn into_config(mut self) -> Result<LogPointConfig, StoreError> {
        let application_filters = codec::decode_list(self.application_filters.take().as_deref())
            .map_err(|source| StoreError::CorruptColumn {
                id: self.id.clone(),
                column: "application_filters",
                source,
            })?;

        Ok(LogPointConfig {
            point: self.into_point()?,
            application_filters,
        })
    }
}

/// Rows with no filters or a wholly-null encoding; part of every coarse clause
const NO_FILTER_ROWS: &str =
    "application_filters IS NULL OR application_filters IN ('', '[]', 'null')";

/// Whether an attribute value can be matched with a LIKE pattern against the
/// compact JSON encoding without escaping.
fn like_safe(value: &str) -> bool {
    value.chars().all(|c| !matches!(c, '"' | '\\' | '%' | '_'))
}

impl PgLogPointStore {
    /// Create a new store with a connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!("Connected to PostgreSQL database");

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool (for health checks)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl LogPointStore for PgLogPointStore {
    async fn get(
        &self,
        workspace_id: &str,
        id: &str,
    ) -> Result<Option<LogPointConfig>, StoreError> {
        let row = sqlx::query_as::<_, LogPointRow>(
            r#"
            SELECT id, workspace_id, user_id, file_name, line_no, client,
                   condition_expression, expire_secs, expire_count, file_hash,
                   disabled, expire_timestamp, application_filters, log_expression,
                   stdout_enabled, log_level, webhook_ids, from_api, predefined, probe_name
            FROM log_points
            WHERE workspace_id = $1 AND id = $2
            "#,
        )
        .bind(workspace_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LogPointRow::into_config).transpose()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<LogPoint>, StoreError> {
        let row = sqlx::query_as::<_, LogPointRow>(
            r#"
            SELECT id, workspace_id, user_id, file_name, line_no, client,
                   condition_expression, expire_secs, expire_count, file_hash,
                   disabled, expire_timestamp, application_filters, log_expression,
                   stdout_enabled, log_level, webhook_ids, from_api, predefined, probe_name
            FROM log_points
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LogPointRow::into_point).transpose()
    }

    #[instrument(skip(self, config), fields(id = %config.point.id, workspace_id = %config.point.workspace_id))]
    async fn insert(&self, config: &LogPointConfig) -> Result<(), StoreError> {
        let application_filters = codec::encode_list(&config.application_filters)?;
        let webhook_ids = codec::encode_list(&config.point.webhook_ids)?;

        let result = sqlx::query(
            r#"
            INSERT INTO log_points (
                id, workspace_id, user_id, file_name, line_no, client,
                condition_expression, expire_secs, expire_count, file_hash,
                disabled, expire_timestamp, application_filters, log_expression,
                stdout_enabled, log_level, webhook_ids, from_api, predefined, probe_name
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(&config.point.id)
        .bind(&config.point.workspace_id)
        .bind(&config.point.user_id)
        .bind(&config.point.file_name)
        .bind(config.point.line_no)
        .bind(&config.point.client)
        .bind(&config.point.condition_expression)
        .bind(config.point.expire_secs)
        .bind(config.point.expire_count)
        .bind(&config.point.file_hash)
        .bind(config.point.disabled)
        .bind(config.point.expire_timestamp)
        .bind(&application_filters)
        .bind(&config.point.log_expression)
        .bind(config.point.stdout_enabled)
        .bind(&config.point.log_level)
        .bind(&webhook_ids)
        .bind(config.point.from_api)
        .bind(config.point.predefined)
        .bind(&config.point.probe_name)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(
                    file_name = %config.point.file_name,
                    line_no = config.point.line_no,
                    "Log point inserted"
                );
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::DuplicateLogPoint {
                    file_name: config.point.file_name.clone(),
                    line_no: config.point.line_no,
                    client: config.point.client.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, update))]
    async fn update(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
        update: &LogPointUpdate,
    ) -> Result<(), StoreError> {
        let webhook_ids = codec::encode_list(&update.webhook_ids)?;

        sqlx::query(
            r#"
            UPDATE log_points
            SET condition_expression = $1, expire_secs = $2, expire_count = $3,
                expire_timestamp = $4, log_expression = $5, stdout_enabled = $6,
                log_level = $7, webhook_ids = $8, predefined = $9, probe_name = $10
            WHERE workspace_id = $11 AND user_id = $12 AND id = $13
            "#,
        )
        .bind(&update.condition_expression)
        .bind(update.expire_secs)
        .bind(update.expire_count)
        .bind(update.expire_timestamp)
        .bind(&update.log_expression)
        .bind(update.stdout_enabled)
        .bind(&update.log_level)
        .bind(&webhook_ids)
        .bind(update.predefined)
        .bind(&update.probe_name)
        .bind(workspace_id)
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_disabled(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
        disabled: bool,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE log_points
            SET disabled = $1
            WHERE workspace_id = $2 AND user_id = $3 AND id = $4
            "#,
        )
        .bind(disabled)
        .bind(workspace_id)
        .bind(user_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(
        &self,
        workspace_id: &str,
        user_id: &str,
        id: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM log_points WHERE workspace_id = $1 AND user_id = $2 AND id = $3")
            .bind(workspace_id)
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_many(
        &self,
        workspace_id: &str,
        user_id: &str,
        ids: &[String],
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM log_points WHERE workspace_id = $1 AND user_id = $2 AND id = ANY($3)",
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(ids)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_by_workspace_and_user(
        &self,
        workspace_id: &str,
        user_id: &str,
        predefined_only: bool,
    ) -> Result<Vec<LogPoint>, StoreError> {
        let mut sql = String::from(
            r#"
            SELECT id, workspace_id, user_id, file_name, line_no, client,
                   condition_expression, expire_secs, expire_count, file_hash,
                   disabled, expire_timestamp, application_filters, log_expression,
                   stdout_enabled, log_level, webhook_ids, from_api, predefined, probe_name
            FROM log_points
            WHERE workspace_id = $1 AND user_id = $2
            "#,
        );

        if predefined_only {
            sql.push_str(" AND predefined = TRUE");
        }
        sql.push_str(" ORDER BY file_name, line_no, client");

        let rows = sqlx::query_as::<_, LogPointRow>(&sql)
            .bind(workspace_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(LogPointRow::into_point).collect()
    }

    #[instrument(skip(self, requester))]
    async fn scan_by_workspace(
        &self,
        workspace_id: &str,
        requester: &ApplicationFilter,
    ) -> Result<Vec<LogPointConfig>, StoreError> {
        // The filter list is a single encoded column, so only a superset scan
        // can be pushed down. Per attribute, a matching filter must carry
        // either null or the requester's exact value, both of which survive
        // as literal substrings of the compact encoding written by
        // codec::encode_list; values needing JSON or LIKE escaping are left
        // entirely to the in-process matcher.
        let mut sql = String::from(
            r#"
            SELECT id, workspace_id, user_id, file_name, line_no, client,
                   condition_expression, expire_secs, expire_count, file_hash,
                   disabled, expire_timestamp, application_filters, log_expression,
                   stdout_enabled, log_level, webhook_ids, from_api, predefined, probe_name
            FROM log_points
            WHERE workspace_id = $1 AND disabled = FALSE
            "#,
        );

        let mut patterns: Vec<String> = Vec::new();
        let mut param_count = 1;

        for (key, value) in [
            ("name", requester.name.as_deref()),
            ("version", requester.version.as_deref()),
            ("stage", requester.stage.as_deref()),
        ] {
            match value {
                Some(value) if like_safe(value) => {
                    param_count += 1;
                    sql.push_str(&format!(
                        " AND ({NO_FILTER_ROWS} OR application_filters LIKE '%\"{key}\":null%' OR application_filters LIKE ${param_count})"
                    ));
                    patterns.push(format!("%\"{key}\":\"{value}\"%"));
                }
                Some(_) => {}
                None => {
                    sql.push_str(&format!(
                        " AND ({NO_FILTER_ROWS} OR application_filters LIKE '%\"{key}\":null%')"
                    ));
                }
            }
        }

        let mut query = sqlx::query_as::<_, LogPointRow>(&sql).bind(workspace_id);
        for pattern in &patterns {
            query = query.bind(pattern);
        }

        let rows = query.fetch_all(&self.pool).await?;

        debug!(row_count = rows.len(), "Coarse scan fetched candidate log points");

        rows.into_iter().map(LogPointRow::into_config).collect()
    }
}
