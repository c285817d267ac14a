//! # tempo-domain
//!
//! Pure domain model for the tempo automation dispatcher.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Automations** (scheduled device commands: topic, desired
//!   state, wall-clock time, timezone, weekday recurrence)
//! - Define **Schedules** and the matching core: minute-resolution,
//!   timezone-aware due checks and weekday eligibility
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod schedule;
