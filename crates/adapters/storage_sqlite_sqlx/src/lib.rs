//! # tempo-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`AutomationStore`](tempo_app::ports::AutomationStore)
//!   port: CRUD, whole-table reads, and the record change feed
//! - Manage the `SQLite` connection pool lifecycle
//! - Run database migrations (sqlx embedded migrations)
//! - Map between domain types and database rows, reporting malformed rows
//!   per record instead of failing whole-table reads
//!
//! ## Dependency rule
//! Depends on `tempo-app` (for port traits) and `tempo-domain` (for domain
//! types). The `app` and `domain` crates must never reference this adapter.

mod automation_store;
mod error;
mod pool;

pub use automation_store::SqliteAutomationStore;
pub use error::StorageError;
pub use pool::{Config, Database};
