//! # redmodel Testkit
//!
//! Test utilities for redmodel.
//!
//! This crate provides:
//! - Test fixtures and repository helpers
//! - Property-based test generators using proptest
//! - A store integrity auditor
//! - Model-based integration test harness
//! - Concurrent stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use redmodel_testkit::prelude::*;
//!
//! with_users(|users| {
//!     let id = users.add_user("a@x.com", "al");
//!     let report = audit_entity(&mut users.connection(), "User", id).unwrap();
//!     assert!(report.is_clean());
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::audit::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use audit::*;
pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
