//! Deep structural comparison of compare objects.
//!
//! Both sides of a comparison are canonicalized first: null entries are
//! stripped (so "field absent" and "field explicitly null" read the
//! same) and arrays of strings are sorted (tag lists and enum value
//! lists are unordered collections on the portal). The resulting diff is
//! informational only; control flow consumes nothing but the `equal`
//! verdict.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Compare objects are projections of portal objects and are always JSON
/// objects. Anything else reaching the engine is a bug in a task variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("compare objects must be JSON objects, got {kind}")]
pub struct CompareError {
    pub kind: &'static str,
}

/// One differing path. `from` is the existing side, `to` the requested
/// side; absence on one side leaves that field `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Value>,
}

/// Verdict plus the canonicalized inputs and a dot-path-keyed diff.
#[derive(Debug, Clone, Serialize)]
pub struct CompareOutcome {
    pub equal: bool,
    pub existing: Value,
    pub requested: Value,
    pub diff: BTreeMap<String, DiffEntry>,
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let canonical: Map<String, Value> = map
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, canonicalize_value(v)))
                .collect();
            Value::Object(canonical)
        }
        Value::Array(items) => {
            let mut canonical: Vec<Value> =
                items.into_iter().map(canonicalize_value).collect();
            if canonical.first().map_or(false, Value::is_string) {
                canonical.sort_by(|a, b| {
                    a.as_str()
                        .map(str::to_owned)
                        .unwrap_or_else(|| a.to_string())
                        .cmp(
                            &b.as_str()
                                .map(str::to_owned)
                                .unwrap_or_else(|| b.to_string()),
                        )
                });
            }
            Value::Array(canonical)
        }
        leaf => leaf,
    }
}

/// Canonicalize a compare object. Fails on non-object input.
pub fn canonicalize(value: Value) -> Result<Value, CompareError> {
    if !value.is_object() {
        return Err(CompareError {
            kind: kind_name(&value),
        });
    }
    Ok(canonicalize_value(value))
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn diff_objects(
    prefix: &str,
    existing: &Map<String, Value>,
    requested: &Map<String, Value>,
    out: &mut BTreeMap<String, DiffEntry>,
) {
    for (key, from) in existing {
        let path = join_path(prefix, key);
        match requested.get(key) {
            None => {
                out.insert(
                    path,
                    DiffEntry {
                        from: Some(from.clone()),
                        to: None,
                    },
                );
            }
            Some(to) if to == from => {}
            Some(to) => match (from, to) {
                (Value::Object(from_map), Value::Object(to_map)) => {
                    diff_objects(&path, from_map, to_map, out);
                }
                _ => {
                    out.insert(
                        path,
                        DiffEntry {
                            from: Some(from.clone()),
                            to: Some(to.clone()),
                        },
                    );
                }
            },
        }
    }
    for (key, to) in requested {
        if !existing.contains_key(key) {
            out.insert(
                join_path(prefix, key),
                DiffEntry {
                    from: None,
                    to: Some(to.clone()),
                },
            );
        }
    }
}

/// Canonicalize both sides and compare structurally.
pub fn compare(existing: Value, requested: Value) -> Result<CompareOutcome, CompareError> {
    let existing = canonicalize(existing)?;
    let requested = canonicalize(requested)?;

    let equal = existing == requested;
    let mut diff = BTreeMap::new();
    if !equal {
        // both sides are objects after canonicalize()
        if let (Value::Object(from), Value::Object(to)) = (&existing, &requested) {
            diff_objects("", from, to, &mut diff);
        }
    }

    Ok(CompareOutcome {
        equal,
        existing,
        requested,
        diff,
    })
}
