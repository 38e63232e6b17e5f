//! Log Point Store
//!
//! Storage and application-aware targeting for log points: diagnostic probes
//! bound to a source file and line in a running application, which emit a log
//! statement when hit without redeploying code.
//!
//! ## Features
//!
//! - **Normalized Expiration**: relative hit-count and duration limits are
//!   normalized on write, with the time limit materialized as an absolute
//!   expiry instant recomputed on every update
//! - **Application-Aware Targeting**: probes carry OR-combined filters over
//!   an application's identity attributes; a coarse store-side scan is
//!   re-checked by an authoritative in-process matcher
//! - **Pluggable Persistence**: a PostgreSQL adapter with storage-enforced
//!   identity uniqueness, plus an in-memory adapter with the same observable
//!   semantics
//!
//! ## Architecture
//!
//! ```text
//! LogPointService ──▶ expiration (normalize limits, absolute expiry)
//!        │
//!        ├─────────▶ LogPointStore ──▶ PostgreSQL / in-memory rows
//!        │                │
//!        │                └─ codec (encoded filter / webhook columns)
//!        │
//!        └─────────▶ matcher (authoritative targeting pass)
//! ```

pub mod codec;
pub mod config;
pub mod expiration;
pub mod in_memory_store;
pub mod matcher;
pub mod model;
pub mod pg_store;
pub mod service;
pub mod store;

pub use config::Config;
pub use in_memory_store::InMemoryLogPointStore;
pub use model::{ApplicationFilter, LogPoint, LogPointConfig, LogPointUpdate};
pub use pg_store::PgLogPointStore;
pub use service::LogPointService;
pub use store::{LogPointStore, StoreError};
