//! Inspect command implementation.

use redmodel_codec::{AttributeMap, Format};
use redmodel_core::index::{data_key, reverse_key_set_key};
use redmodel_core::transaction::allocator;
use redmodel_core::{EntityId, ModelError, ModelResult, Store};
use serde::Serialize;

/// Entity inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Entity type.
    pub entity_type: String,
    /// Entity id.
    pub id: u64,
    /// Current value of the type's id counter.
    pub counter: u64,
    /// Decoded data, if the data key exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AttributeMap>,
    /// Members of the reverse key set.
    pub unique_keys: Vec<String>,
}

/// Parses an `--encoding` argument.
pub fn parse_encoding(encoding: &str) -> Result<Format, String> {
    match encoding {
        "json" => Ok(Format::Json),
        "cbor" => Ok(Format::Cbor),
        other => Err(format!("unknown encoding {other:?} (expected json or cbor)")),
    }
}

/// Reads everything stored for one entity.
pub fn collect(
    store: &mut dyn Store,
    entity_type: &str,
    id: EntityId,
    encoding: Format,
) -> ModelResult<InspectResult> {
    let counter = allocator::peek(store, entity_type)?;

    let key = data_key(entity_type, id);
    let attributes = match store.get(&key)? {
        Some(bytes) => Some(
            encoding
                .decode(&bytes)
                .map_err(|e| ModelError::corrupt(&key, e.to_string()))?,
        ),
        None => None,
    };
    let unique_keys = store
        .smembers(&reverse_key_set_key(entity_type, id))?
        .into_iter()
        .collect();

    Ok(InspectResult {
        entity_type: entity_type.to_owned(),
        id: id.get(),
        counter,
        attributes,
        unique_keys,
    })
}

/// Runs the inspect command.
pub fn run(
    store: &mut dyn Store,
    entity_type: &str,
    id: u64,
    encoding: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let encoding = parse_encoding(encoding)?;
    let result = collect(store, entity_type, EntityId::new(id), encoding)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("{}:{}", result.entity_type, result.id);
    println!("==========");
    println!();
    println!("Counter: {}", result.counter);
    println!();
    match &result.attributes {
        Some(attributes) => {
            println!("Attributes:");
            for (name, value) in attributes {
                println!("  {name} = {value}");
            }
        }
        None => println!("Attributes: (not found)"),
    }
    println!();
    println!("Unique keys:");
    if result.unique_keys.is_empty() {
        println!("  (none)");
    }
    for key in &result.unique_keys {
        println!("  {key}");
    }
}
