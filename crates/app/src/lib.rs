//! # tempo-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationStore` — persistence, deletion, and the record change feed
//!   - `CommandSink` — retained message delivery to the device transport
//! - Provide the **dispatch routine** shared by both entry points
//!   (`Dispatcher`), including the per-record-per-minute fire guard that
//!   keeps the reactive and sweep paths from double-firing a record
//! - Provide the two **entry points**:
//!   - `ChangeWatcher` — evaluates records as soon as they change
//!   - `SweepScheduler` — evaluates every record at each minute boundary
//!
//! ## Dependency rule
//! Depends on `tempo-domain` only (plus `tokio::sync`/`tokio::time` for
//! channels and timers). Never imports adapter crates. Adapters depend on
//! *this* crate, not the reverse.

pub mod dispatcher;
pub mod ports;
pub mod sweep;
pub mod watcher;
