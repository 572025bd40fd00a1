//! Tagged JSON document format.
//!
//! A document is a JSON object mapping each key to a tagged entry:
//!
//! ```json
//! {
//!   "timeout": { "t": "i32", "v": 30 },
//!   "servers": { "t": "arr", "v": [ { "t": "str", "v": "a" } ] }
//! }
//! ```
//!
//! Arrays and objects nest the same `{"t", "v"}` shape. Decoding trusts only
//! the tag: a value whose JSON shape does not fit its tag is a parse error,
//! never a silent reinterpretation.

use std::sync::Arc;

use serde_json::{Map, Number, Value as Json};

use crate::error::{KvsError, Result};
use crate::value::{KvsMap, KvsValue, KvsValueKind};

const TAG_FIELD: &str = "t";
const VALUE_FIELD: &str = "v";

/// Serialize a key-value map into document bytes.
///
/// Output is pretty-printed and deterministic for a given map (entries keep
/// map order).
pub fn to_document(map: &KvsMap) -> Result<Vec<u8>> {
    let root = encode_map(map)?;
    Ok(serde_json::to_vec_pretty(&Json::Object(root))?)
}

/// Parse document bytes into a key-value map, preserving document order.
pub fn from_document(bytes: &[u8]) -> Result<KvsMap> {
    let root: Json = serde_json::from_slice(bytes)?;
    match root {
        Json::Object(entries) => decode_map(&entries),
        other => Err(KvsError::parse(format!(
            "document root must be an object, found {}",
            json_shape(&other)
        ))),
    }
}

/// Encode one value as a tagged JSON entry.
pub fn encode_value(value: &KvsValue) -> Result<Json> {
    let payload = match value {
        KvsValue::Null => Json::Null,
        KvsValue::Boolean(v) => Json::Bool(*v),
        KvsValue::I32(v) => Json::from(*v),
        KvsValue::U32(v) => Json::from(*v),
        KvsValue::I64(v) => Json::from(*v),
        KvsValue::U64(v) => Json::from(*v),
        KvsValue::F64(v) => Number::from_f64(*v)
            .map(Json::Number)
            .ok_or_else(|| KvsError::parse(format!("f64 value {} has no JSON form", v)))?,
        KvsValue::String(v) => Json::String(v.clone()),
        KvsValue::Array(items) => Json::Array(
            items
                .iter()
                .map(encode_value)
                .collect::<Result<Vec<_>>>()?,
        ),
        KvsValue::Object(entries) => Json::Object(encode_map(entries)?),
    };

    let mut entry = Map::with_capacity(2);
    entry.insert(TAG_FIELD.to_string(), Json::from(value.kind().tag()));
    entry.insert(VALUE_FIELD.to_string(), payload);
    Ok(Json::Object(entry))
}

/// Decode one tagged JSON entry.
pub fn decode_value(entry: &Json) -> Result<KvsValue> {
    let Json::Object(fields) = entry else {
        return Err(KvsError::parse(format!(
            "entry must be an object, found {}",
            json_shape(entry)
        )));
    };
    if fields.len() != 2 {
        return Err(KvsError::parse(format!(
            "entry must have exactly \"{}\" and \"{}\" fields, found {}",
            TAG_FIELD,
            VALUE_FIELD,
            fields.len()
        )));
    }

    let tag = match fields.get(TAG_FIELD) {
        Some(Json::String(tag)) => tag.as_str(),
        Some(other) => {
            return Err(KvsError::parse(format!(
                "type tag must be a string, found {}",
                json_shape(other)
            )));
        }
        None => return Err(KvsError::parse("entry has no type tag")),
    };
    let kind = KvsValueKind::from_tag(tag)
        .ok_or_else(|| KvsError::parse(format!("unknown type tag '{}'", tag)))?;
    let payload = fields
        .get(VALUE_FIELD)
        .ok_or_else(|| KvsError::parse(format!("'{}' entry has no value", tag)))?;

    decode_payload(kind, payload)
}

fn decode_payload(kind: KvsValueKind, payload: &Json) -> Result<KvsValue> {
    let value = match (kind, payload) {
        (KvsValueKind::Null, Json::Null) => KvsValue::Null,
        (KvsValueKind::Boolean, Json::Bool(v)) => KvsValue::Boolean(*v),
        (KvsValueKind::I32, Json::Number(n)) => KvsValue::I32(
            n.as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| out_of_range(kind, n))?,
        ),
        (KvsValueKind::U32, Json::Number(n)) => KvsValue::U32(
            n.as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| out_of_range(kind, n))?,
        ),
        (KvsValueKind::I64, Json::Number(n)) => {
            KvsValue::I64(n.as_i64().ok_or_else(|| out_of_range(kind, n))?)
        }
        (KvsValueKind::U64, Json::Number(n)) => {
            KvsValue::U64(n.as_u64().ok_or_else(|| out_of_range(kind, n))?)
        }
        (KvsValueKind::F64, Json::Number(n)) => {
            KvsValue::F64(n.as_f64().ok_or_else(|| out_of_range(kind, n))?)
        }
        (KvsValueKind::String, Json::String(v)) => KvsValue::String(v.clone()),
        (KvsValueKind::Array, Json::Array(items)) => KvsValue::Array(Arc::new(
            items.iter().map(decode_value).collect::<Result<Vec<_>>>()?,
        )),
        (KvsValueKind::Object, Json::Object(entries)) => {
            KvsValue::Object(Arc::new(decode_map(entries)?))
        }
        (kind, other) => {
            return Err(KvsError::parse(format!(
                "'{}' entry holds {}",
                kind,
                json_shape(other)
            )));
        }
    };
    Ok(value)
}

fn encode_map(map: &KvsMap) -> Result<Map<String, Json>> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), encode_value(value)?)))
        .collect()
}

fn decode_map(entries: &Map<String, Json>) -> Result<KvsMap> {
    entries
        .iter()
        .map(|(key, entry)| {
            let value = decode_value(entry)
                .map_err(|e| KvsError::parse(format!("key '{}': {}", key, e)))?;
            Ok((key.clone(), value))
        })
        .collect()
}

fn out_of_range(kind: KvsValueKind, n: &Number) -> KvsError {
    KvsError::parse(format!("number {} does not fit '{}'", n, kind))
}

fn json_shape(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}
