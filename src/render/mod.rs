//! Output helpers for JSON results and errors.

pub mod error;

use serde::Serialize;

use crate::error::Result;

/// Serialize a value for `--format json`.
///
/// # Errors
///
/// Returns a JSON error if the value cannot be serialized.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
