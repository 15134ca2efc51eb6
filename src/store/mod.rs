// src/store/mod.rs

//! Dependency state store and propagation.
//!
//! - [`unit`] holds unit records and cached dependency snapshots.
//! - [`state_store`] owns the canonical unit map (register / remove /
//!   set_status).
//! - [`propagation`] pushes a status change into same-group dependents.
//! - [`predicates`] provides the read-only dependency checks used by the
//!   admission gate and the permit controller.

pub mod predicates;
pub mod propagation;
pub mod state_store;
pub mod unit;

pub use predicates::DependencyView;
pub use state_store::{DependencyStore, Registration, Transition};
pub use unit::{DependencyState, UnitRecord, UnitSpec};
