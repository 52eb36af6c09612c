//! # redmodel Codec
//!
//! Attribute values and their serialized formats for redmodel.
//!
//! Every entity is stored as one [`AttributeMap`]: a string-keyed map of
//! JSON-like [`Value`]s. This crate owns that value model and the opaque
//! encode/decode pair used to put it into the store.
//!
//! ## Formats
//!
//! - [`Format::Json`] - JSON text (default, human-readable in `redis-cli`)
//! - [`Format::Cbor`] - Compact CBOR binary
//!
//! Both formats round-trip exactly, including explicit nulls and the
//! distinction between `1` and `1.0`.
//!
//! ## Usage
//!
//! ```
//! use redmodel_codec::{AttributeMap, Format, Value};
//!
//! let mut map = AttributeMap::new();
//! map.insert("email".to_string(), Value::from("a@x.com"));
//!
//! let bytes = Format::Json.encode(&map).unwrap();
//! assert_eq!(Format::Json.decode(&bytes).unwrap(), map);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod format;
mod value;

pub use error::{CodecError, CodecResult};
pub use format::{CborCodec, Codec, Format, JsonCodec};
pub use value::{AttributeMap, Value};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            (-1.0e12f64..1.0e12).prop_map(Value::Float),
            "[a-z@.]{0,12}".prop_map(Value::Text),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z_]{1,6}", inner, 0..4).prop_map(Value::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn any_map_survives_both_formats(map in prop::collection::btree_map("[a-z_]{1,8}", value(), 0..6)) {
            for format in [Format::Json, Format::Cbor] {
                let bytes = format.encode(&map).unwrap();
                prop_assert_eq!(format.decode(&bytes).unwrap(), map.clone());
            }
        }
    }
}
