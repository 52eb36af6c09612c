//! Shared helpers for redmodel benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
