use serde::{de::DeserializeOwned, Serialize};

use crate::errors::{ErrorInfo, SelError};

/// Whitespace layout of encoded JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonLayout {
    /// Single line; the form that is hashed.
    Compact,
    /// Indented, newline terminated; the form written for people and plotting tools.
    Pretty,
}

fn decode_error(format: &str, err: impl ToString, location: Option<(usize, usize)>) -> SelError {
    let mut info = ErrorInfo::new(format!("{format}-decode"), err.to_string());
    if let Some((line, column)) = location {
        info = info.with_context("line", line).with_context("column", column);
    }
    SelError::Serde(info)
}

/// Encodes `value` as JSON with every object's keys in sorted order.
///
/// Struct fields and map entries pass through `serde_json::Value`, whose maps
/// are key-ordered as long as serde_json's `preserve_order` feature is off.
pub fn to_json_bytes<T: Serialize>(value: &T, layout: JsonLayout) -> Result<Vec<u8>, SelError> {
    let encode =
        |err: serde_json::Error| SelError::Serde(ErrorInfo::new("json-encode", err.to_string()));
    let value = serde_json::to_value(value).map_err(encode)?;
    match layout {
        JsonLayout::Compact => serde_json::to_vec(&value).map_err(encode),
        JsonLayout::Pretty => {
            let mut bytes = serde_json::to_vec_pretty(&value).map_err(encode)?;
            bytes.push(b'\n');
            Ok(bytes)
        }
    }
}

/// Pretty JSON for reports, inspections and version records.
pub fn to_report_json<T: Serialize>(value: &T) -> Result<Vec<u8>, SelError> {
    to_json_bytes(value, JsonLayout::Pretty)
}

/// Decodes JSON, reporting the line and column of a syntax or type error.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, SelError> {
    serde_json::from_slice(data).map_err(|err| {
        let location = (err.line() > 0).then(|| (err.line(), err.column()));
        decode_error("json", err, location)
    })
}

/// Encodes `value` as YAML, the format of pipeline configurations.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String, SelError> {
    serde_yaml::to_string(value)
        .map_err(|err| SelError::Serde(ErrorInfo::new("yaml-encode", err.to_string())))
}

/// Decodes YAML, reporting the line and column of the offending node.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, SelError> {
    serde_yaml::from_slice(data).map_err(|err| {
        let location = err.location().map(|at| (at.line(), at.column()));
        decode_error("yaml", err, location)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn map_keys_are_sorted_in_both_layouts() {
        let map: HashMap<&str, u32> = [("threshold", 1), ("bins", 2), ("mass", 3)].into();
        let compact = to_json_bytes(&map, JsonLayout::Compact).unwrap();
        assert_eq!(compact, br#"{"bins":2,"mass":3,"threshold":1}"#.to_vec());
        let pretty = String::from_utf8(to_report_json(&map).unwrap()).unwrap();
        assert!(pretty.ends_with("}\n"));
        assert!(pretty.find("bins").unwrap() < pretty.find("threshold").unwrap());
    }

    #[test]
    fn yaml_errors_carry_their_location() {
        let yaml = b"threshold: 0.8\nbins: [1\n";
        let err = from_yaml_slice::<HashMap<String, f64>>(yaml).unwrap_err();
        assert_eq!(err.info().code, "yaml-decode");
        assert!(err.info().context.contains_key("line"));
    }

    #[test]
    fn json_type_errors_carry_their_location() {
        let err = from_json_slice::<Vec<f64>>(b"[1.0,\n \"x\"]").unwrap_err();
        assert_eq!(err.info().code, "json-decode");
        assert_eq!(err.info().context.get("line").map(String::as_str), Some("2"));
    }
}
