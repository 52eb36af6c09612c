//! Entity types and property extraction.

mod extract;
mod id;
mod model;

pub use extract::{extract, Extraction};
pub use id::{EntityId, ParseEntityIdError};
pub use model::Entity;
