//! Shared types and models for the Farm Management Platform
//!
//! This crate contains the domain models and the pure inventory logic
//! (ledger arithmetic, reconciliation deltas, low-stock alert state
//! machine) shared between the backend and its test suites.

pub mod models;
pub mod reconciliation;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
