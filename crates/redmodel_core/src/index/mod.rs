//! Constraint index bookkeeping.
//!
//! Uniqueness is enforced with one store key per claimed value,
//! `{type}:{field}:{value}`, holding the owning id. Each entity also owns a
//! reverse key set at `{type}:{id}:rks` listing the unique keys it currently
//! claims, so update and delete can release them without scanning.
//!
//! | Key | Value |
//! |---|---|
//! | `{type}:mid` | id counter |
//! | `{type}:{id}` | encoded attribute map |
//! | `{type}:{id}:rks` | set of unique keys |
//! | `{type}:{field}:{value}` | owning id |

mod keys;
mod reverse;

pub use keys::{counter_key, data_key, reverse_key_set_key, unique_key, UniqueKey};
pub use reverse::ReverseKeySet;
