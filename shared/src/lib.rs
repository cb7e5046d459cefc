//! Shared types and domain logic for the Retail Back-Office Platform
//!
//! This crate contains the types and pure reconciliation functions shared
//! between the backend services and their test suites: weighted-average
//! costing, derived receiving status, payment categorization, day-closing
//! aggregation and AR/AP aging.

pub mod models;
pub mod reconcile;
pub mod types;

pub use models::*;
pub use reconcile::*;
pub use types::*;
