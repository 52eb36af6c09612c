//! Serialized formats for attribute maps.

use crate::error::{CodecError, CodecResult};
use crate::value::AttributeMap;

/// An encode/decode pair for attribute maps.
///
/// Implementations must round-trip exactly: `decode(encode(m)) == m`,
/// including explicit nulls.
pub trait Codec: Send + Sync {
    /// Short format name, used in logs.
    fn name(&self) -> &'static str;

    /// Encode an attribute map to bytes.
    fn encode(&self, map: &AttributeMap) -> CodecResult<Vec<u8>>;

    /// Decode an attribute map from bytes.
    fn decode(&self, bytes: &[u8]) -> CodecResult<AttributeMap>;
}

/// Rejects maps holding NaN or infinite floats, which neither format can
/// store without changing them.
fn ensure_finite(map: &AttributeMap) -> CodecResult<()> {
    match map.iter().find_map(|(k, v)| v.find_non_finite(k)) {
        Some(path) => Err(CodecError::NonFiniteFloat { path }),
        None => Ok(()),
    }
}

/// JSON text encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, map: &AttributeMap) -> CodecResult<Vec<u8>> {
        ensure_finite(map)?;
        serde_json::to_vec(map).map_err(|e| CodecError::encoding_failed(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<AttributeMap> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
    }
}

/// CBOR binary encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn encode(&self, map: &AttributeMap) -> CodecResult<Vec<u8>> {
        ensure_finite(map)?;
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(map, &mut buffer)
            .map_err(|e| CodecError::encoding_failed(format!("{e:?}")))?;
        Ok(buffer)
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<AttributeMap> {
        ciborium::de::from_reader(bytes).map_err(|e| CodecError::decoding_failed(format!("{e:?}")))
    }
}

/// Selects the format entities are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// JSON text (default).
    #[default]
    Json,
    /// CBOR binary.
    Cbor,
}

impl Format {
    /// Returns the codec for this format.
    #[must_use]
    pub fn codec(self) -> &'static dyn Codec {
        match self {
            Format::Json => &JsonCodec,
            Format::Cbor => &CborCodec,
        }
    }

    /// Encode an attribute map in this format.
    pub fn encode(self, map: &AttributeMap) -> CodecResult<Vec<u8>> {
        self.codec().encode(map)
    }

    /// Decode an attribute map in this format.
    pub fn decode(self, bytes: &[u8]) -> CodecResult<AttributeMap> {
        self.codec().decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample() -> AttributeMap {
        let mut nested = AttributeMap::new();
        nested.insert("city".into(), Value::from("Oslo"));
        nested.insert("zip".into(), Value::Null);

        let mut map = AttributeMap::new();
        map.insert("email".into(), Value::from("a@x.com"));
        map.insert("age".into(), Value::Integer(30));
        map.insert("score".into(), Value::Float(2.0));
        map.insert("nickname".into(), Value::Null);
        map.insert("tags".into(), Value::from(vec!["a", "b"]));
        map.insert("address".into(), Value::Map(nested));
        map
    }

    #[test]
    fn both_formats_roundtrip_nulls_and_floats() {
        for format in [Format::Json, Format::Cbor] {
            let map = sample();
            let bytes = format.encode(&map).unwrap();
            assert_eq!(format.decode(&bytes).unwrap(), map, "format {format:?}");
        }
    }

    #[test]
    fn json_is_plain_text() {
        let mut map = AttributeMap::new();
        map.insert("email".into(), Value::from("a@x.com"));
        map.insert("nickname".into(), Value::from("bob"));
        let bytes = Format::Json.encode(&map).unwrap();
        assert_eq!(bytes, br#"{"email":"a@x.com","nickname":"bob"}"#.to_vec());
    }

    #[test]
    fn non_finite_float_rejected() {
        let mut map = AttributeMap::new();
        map.insert("ratio".into(), Value::Float(f64::INFINITY));
        for format in [Format::Json, Format::Cbor] {
            let err = format.encode(&map).unwrap_err();
            assert_eq!(err, CodecError::NonFiniteFloat { path: "ratio".into() });
        }
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(matches!(
            Format::Json.decode(b"not json"),
            Err(CodecError::DecodingFailed { .. })
        ));
        assert!(matches!(
            Format::Json.decode(b"[1,2]"),
            Err(CodecError::DecodingFailed { .. })
        ));
        assert!(Format::Cbor.decode(&[0xff, 0x00]).is_err());
    }

    #[test]
    fn codec_names() {
        assert_eq!(Format::Json.codec().name(), "json");
        assert_eq!(Format::Cbor.codec().name(), "cbor");
        assert_eq!(Format::default(), Format::Json);
    }
}
