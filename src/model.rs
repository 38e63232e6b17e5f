use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored log point: a diagnostic probe bound to a source file and line in a
/// running application, emitting a log statement when hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPoint {
    /// Probe ID (UUID string, server-generated when submitted empty)
    pub id: String,
    /// Owning workspace
    pub workspace_id: String,
    /// User who created the probe
    pub user_id: String,
    /// Source file the probe is bound to
    pub file_name: String,
    /// Line number within the file
    pub line_no: i32,
    /// Client identifier the probe was submitted from
    pub client: String,
    /// Optional boolean condition gating the probe
    pub condition_expression: Option<String>,
    /// Relative expiration in seconds; `None` means no time limit
    pub expire_secs: Option<i64>,
    /// Expiration in hit count; `None` means no hit limit
    pub expire_count: Option<i64>,
    /// Content hash of the source file at submission time
    pub file_hash: Option<String>,
    /// Disabled probes are never dispatched
    pub disabled: bool,
    /// Absolute expiry instant, present iff `expire_secs` is set
    pub expire_timestamp: Option<DateTime<Utc>>,
    /// Log message template evaluated when the probe fires
    pub log_expression: String,
    /// Mirror emitted logs to the application's stdout
    pub stdout_enabled: bool,
    /// Severity level for emitted logs
    pub log_level: String,
    /// Webhooks notified when the probe fires (ordered, possibly empty)
    pub webhook_ids: Vec<String>,
    /// Whether the probe was created through the public API
    pub from_api: bool,
    /// Predefined/system-provided probe
    pub predefined: bool,
    /// Optional display name
    pub probe_name: Option<String>,
}

/// Targeting predicate over a running application's identity attributes.
///
/// Absent attributes are wildcards; specified attributes must match the
/// requesting application exactly. Absent attributes serialize as explicit
/// `null` so the stored encoding always carries every key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFilter {
    /// Application name
    #[serde(default)]
    pub name: Option<String>,
    /// Application version
    #[serde(default)]
    pub version: Option<String>,
    /// Deployment stage (e.g. "dev", "prod")
    #[serde(default)]
    pub stage: Option<String>,
    /// Host/instance tags; every specified tag must be present and equal
    #[serde(default)]
    pub custom_tags: BTreeMap<String, String>,
}

/// A log point together with its resolved targeting filters.
///
/// An empty filter list marks a global probe that matches every application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPointConfig {
    #[serde(flatten)]
    pub point: LogPoint,
    /// Targeting filters, OR-combined at dispatch time
    #[serde(default)]
    pub application_filters: Vec<ApplicationFilter>,
}

/// Mutable fields of a stored log point.
///
/// `disabled` is intentionally absent; enabling/disabling is a separate
/// operation. `expire_timestamp` is recomputed by the service from
/// `expire_secs` on every update and any caller-supplied value is overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogPointUpdate {
    pub condition_expression: Option<String>,
    pub expire_secs: Option<i64>,
    pub expire_count: Option<i64>,
    pub expire_timestamp: Option<DateTime<Utc>>,
    pub log_expression: String,
    pub stdout_enabled: bool,
    pub log_level: String,
    pub webhook_ids: Vec<String>,
    pub predefined: bool,
    pub probe_name: Option<String>,
}
