//! Test utilities
//!
//! In-memory repositories and fixtures for service tests. The repositories
//! evaluate the same `PericiaCriterion` lists the SQL adapter translates.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
