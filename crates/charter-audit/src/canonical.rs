//! Byte-stable canonical JSON encoding.
//!
//! Entry hashes are computed over this encoding, so it must produce
//! identical bytes for semantically identical bodies regardless of how the
//! body travelled: object keys are emitted in sorted order at every depth,
//! there is no insignificant whitespace, and only integer numbers are
//! accepted (float formatting is not stable across implementations).

use serde::Serialize;
use serde_json::Value;

use crate::error::{AuditError, AuditResult};

/// Serialize a value to canonical JSON bytes.
///
/// # Errors
///
/// Returns [`AuditError::Canonicalization`] if the value contains a
/// non-integer number, or [`AuditError::Serialization`] if it cannot be
/// represented as JSON at all.
pub fn canonicalize<T: Serialize>(value: &T) -> AuditResult<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    let mut out = Vec::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> AuditResult<()> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => {
            if n.is_f64() {
                return Err(AuditError::Canonicalization(format!(
                    "non-integer number {n} has no stable encoding"
                )));
            }
            out.extend_from_slice(n.to_string().as_bytes());
        },
        Value::String(s) => out.extend_from_slice(&serde_json::to_vec(s)?),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        },
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(&serde_json::to_vec(key)?);
                out.push(b':');
                // Key came from the map, so the lookup cannot miss.
                if let Some(v) = map.get(*key) {
                    write_canonical(v, out)?;
                }
            }
            out.push(b'}');
        },
    }
    Ok(())
}
