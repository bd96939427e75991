//! JSON loading for the three external file formats (§4.8, §6): patch
//! files, pointer-defaults files, and freespace files. Out of THE CORE per
//! §1, but required ambient scaffolding for a runnable CLI; grounded in
//! `original_source/src/json_bpatch/main.py` and `target.py`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::PatchFitError;
use crate::freespace::Freespace;
use crate::patch::{Component, Datum, Patch};
use crate::pointer::Pointer;
use crate::propagate::PatchMap;

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("could not parse {} as JSON", path.display()))
}

fn merged_value<'a>(obj: &'a Map<String, Value>, defaults: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.get(name).or_else(|| defaults.get(name))
}

fn get_int(obj: &Map<String, Value>, defaults: &Map<String, Value>, name: &str) -> Result<i64, PatchFitError> {
    match merged_value(obj, defaults, name) {
        Some(Value::Number(n)) if n.is_i64() => Ok(n.as_i64().unwrap()),
        Some(other) => Err(PatchFitError::Schema {
            field: name.to_string(),
            message: format!("must be an integer, got {other}"),
        }),
        None => Err(PatchFitError::Schema {
            field: name.to_string(),
            message: "is required".to_string(),
        }),
    }
}

fn get_bool(obj: &Map<String, Value>, defaults: &Map<String, Value>, name: &str) -> Result<bool, PatchFitError> {
    match merged_value(obj, defaults, name) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(PatchFitError::Schema {
            field: name.to_string(),
            message: format!("must be a boolean, got {other}"),
        }),
        None => Err(PatchFitError::Schema {
            field: name.to_string(),
            message: "is required".to_string(),
        }),
    }
}

/// Validates a defaults object: none of the pointer fields may be the wrong
/// JSON type, and `referent` must not appear at all.
fn validate_defaults(defaults: &Map<String, Value>) -> Result<(), PatchFitError> {
    if defaults.contains_key("referent") {
        return Err(PatchFitError::ReferentInDefaults);
    }
    for name in ["offset", "size", "align", "stride"] {
        if let Some(v) = defaults.get(name) {
            if !matches!(v, Value::Number(n) if n.is_i64()) {
                return Err(PatchFitError::Schema {
                    field: name.to_string(),
                    message: format!("must be an integer, got {v}"),
                });
            }
        }
    }
    for name in ["signed", "bigendian"] {
        if let Some(v) = defaults.get(name) {
            if !matches!(v, Value::Bool(_)) {
                return Err(PatchFitError::Schema {
                    field: name.to_string(),
                    message: format!("must be a boolean, got {v}"),
                });
            }
        }
    }
    Ok(())
}

fn make_pointer(obj: &Map<String, Value>, defaults: &Map<String, Value>) -> Result<Pointer, PatchFitError> {
    let offset = get_int(obj, defaults, "offset")?;
    let size = get_int(obj, defaults, "size")?;
    let align = get_int(obj, defaults, "align")?;
    let stride = get_int(obj, defaults, "stride")?;
    let signed = get_bool(obj, defaults, "signed")?;
    let bigendian = get_bool(obj, defaults, "bigendian")?;
    let referent = match obj.get("referent") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(PatchFitError::Schema {
                field: "referent".to_string(),
                message: format!("must be a string, got {other}"),
            })
        }
        None => {
            return Err(PatchFitError::Schema {
                field: "referent".to_string(),
                message: "is required".to_string(),
            })
        }
    };
    Pointer::new(referent, offset as i128, size, align, stride as i128, signed, bigendian)
}

/// Decodes a Datum literal string per §6: `@path` reads raw file bytes,
/// `=...` is base64, anything else is whitespace-separated hex byte pairs.
fn make_datum(s: &str) -> Result<Datum> {
    if let Some(path) = s.strip_prefix('@') {
        let bytes = std::fs::read(path).with_context(|| format!("could not read datum file {path:?}"))?;
        Ok(Datum(bytes))
    } else if let Some(encoded) = s.strip_prefix('=') {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| PatchFitError::Schema {
                field: "datum".to_string(),
                message: format!("invalid base64: {e}"),
            })?;
        Ok(Datum(bytes))
    } else {
        let mut bytes = Vec::with_capacity(s.len() / 3 + 1);
        for token in s.split_whitespace() {
            let byte = u8::from_str_radix(token, 16).map_err(|_| PatchFitError::UnknownDatumPrefix(s.to_string()))?;
            bytes.push(byte);
        }
        Ok(Datum(bytes))
    }
}

fn make_component(obj: &Value, defaults: &Map<String, Value>) -> Result<Component> {
    match obj {
        Value::String(s) => Ok(Component::Datum(make_datum(s)?)),
        Value::Object(fields) => Ok(Component::Pointer(make_pointer(fields, defaults)?)),
        other => Err(PatchFitError::Schema {
            field: "patch item".to_string(),
            message: format!("must be a Datum string or a Pointer object, got {other}"),
        }
        .into()),
    }
}

/// Parses a fully-loaded patch JSON document (top-level object mapping name
/// → array of components) plus a defaults JSON document into a [`PatchMap`].
pub fn load(patch_json: &Value, defaults_json: &Value) -> Result<PatchMap> {
    let defaults = match defaults_json {
        Value::Object(m) => m.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(PatchFitError::Schema {
                field: "defaults".to_string(),
                message: format!("must be a JSON object, got {other}"),
            }
            .into())
        }
    };
    validate_defaults(&defaults)?;

    let patches = match patch_json {
        Value::Object(m) => m,
        other => {
            return Err(PatchFitError::Schema {
                field: "patch file".to_string(),
                message: format!("must be a JSON object mapping names to patches, got {other}"),
            }
            .into())
        }
    };

    let mut patch_map = HashMap::with_capacity(patches.len());
    for (name, components) in patches {
        let items = components.as_array().ok_or_else(|| PatchFitError::Schema {
            field: name.clone(),
            message: "must be a JSON array of patch items".to_string(),
        })?;
        let components = items
            .iter()
            .map(|item| make_component(item, &defaults))
            .collect::<Result<Vec<_>>>()?;
        patch_map.insert(name.clone(), Patch::new(components));
    }
    Ok(patch_map)
}

/// Loads and parses the patch file and (optional) defaults file from disk.
pub fn load_patch_file(patch_path: &Path, defaults_path: Option<&Path>) -> Result<PatchMap> {
    let patch_json = read_json(patch_path)?;
    let defaults_json = match defaults_path {
        Some(p) => read_json(p)?,
        None => Value::Object(Map::new()),
    };
    load(&patch_json, &defaults_json)
}

/// Loads a freespace JSON file (an array of `[start, end]` pairs) into a
/// [`Freespace`].
pub fn load_freespace_file(path: &Path) -> Result<Freespace> {
    let value = read_json(path)?;
    let array = value.as_array().ok_or_else(|| PatchFitError::Schema {
        field: "freespace file".to_string(),
        message: "must be a JSON array of [start, end] pairs".to_string(),
    })?;
    let mut freespace = Freespace::new();
    for entry in array {
        let pair = entry.as_array().filter(|a| a.len() == 2).ok_or_else(|| PatchFitError::Schema {
            field: "freespace entry".to_string(),
            message: "must be a two-element [start, end] array".to_string(),
        })?;
        let start = pair[0].as_u64().ok_or_else(|| PatchFitError::Schema {
            field: "freespace entry".to_string(),
            message: "start must be a non-negative integer".to_string(),
        })?;
        let end = pair[1].as_u64().ok_or_else(|| PatchFitError::Schema {
            field: "freespace entry".to_string(),
            message: "end must be a non-negative integer".to_string(),
        })?;
        if end < start {
            return Err(PatchFitError::Schema {
                field: "freespace entry".to_string(),
                message: "end must not precede start".to_string(),
            }
            .into());
        }
        freespace.add(start, end - start);
    }
    Ok(freespace)
}

/// Serializes a [`Freespace`] back into the `[[start, end], ...]` shape.
pub fn freespace_to_json(freespace: &Freespace) -> Value {
    Value::Array(
        freespace
            .intervals()
            .iter()
            .map(|&(start, stop)| Value::Array(vec![Value::from(start), Value::from(stop)]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_datum_and_pointer_components() {
        let patch_json = json!({
            "_root": ["DE AD BE EF", { "referent": "leaf" }],
            "leaf": ["AA"]
        });
        let defaults = json!({ "offset": 0, "size": 1, "align": 1, "stride": 1, "signed": false, "bigendian": false });
        let patch_map = load(&patch_json, &defaults).unwrap();
        assert_eq!(patch_map["_root"].len(), 5);
        assert_eq!(patch_map["leaf"].len(), 1);
    }

    #[test]
    fn s8_rejects_non_bool_for_bool_field() {
        let patch_json = json!({
            "_root": [{ "referent": "leaf", "offset": 0, "size": 1, "align": 1, "stride": 1, "signed": 1, "bigendian": false }],
            "leaf": ["AA"]
        });
        let err = load(&patch_json, &json!({})).unwrap_err();
        let err = err.downcast::<PatchFitError>().unwrap();
        assert!(matches!(err, PatchFitError::Schema { field, .. } if field == "signed"));
    }

    #[test]
    fn rejects_referent_in_defaults() {
        let err = load(&json!({}), &json!({ "referent": "x" })).unwrap_err();
        let err = err.downcast::<PatchFitError>().unwrap();
        assert!(matches!(err, PatchFitError::ReferentInDefaults));
    }

    #[test]
    fn base64_datum_with_padding() {
        let patch_json = json!({ "x": ["=//4="] });
        let patch_map = load(&patch_json, &json!({})).unwrap();
        assert_eq!(patch_map["x"].len(), 2);
    }

    #[test]
    fn freespace_round_trips_through_json() {
        let mut freespace = Freespace::new();
        freespace.add(0, 10);
        freespace.add(20, 5);
        let value = freespace_to_json(&freespace);
        assert_eq!(value, json!([[0, 10], [20, 25]]));
    }
}
