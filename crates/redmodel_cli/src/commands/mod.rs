//! CLI command implementations.

pub mod audit;
pub mod inspect;
pub mod lookup;
