//! # YAML Rendering
//!
//! Bridges [`Value`] and `serde_yaml`. ESPHome uses local tags for values
//! that are not plain strings; those map onto dedicated [`Value`] variants
//! in both directions:
//!
//! | Tag        | Variant            |
//! |------------|--------------------|
//! | `!lambda`  | [`Value::Lambda`]  |
//! | `!secret`  | [`Value::Secret`]  |
//! | `!include` | [`Value::Include`] |

use crate::document::{Mapping, Value};
use crate::error::Result;
use serde_yaml::value::{Tag, TaggedValue};

pub const LAMBDA_TAG: &str = "lambda";
pub const SECRET_TAG: &str = "secret";
pub const INCLUDE_TAG: &str = "include";

/// Render a value as a YAML document
pub fn to_string(value: &Value) -> Result<String> {
    Ok(serde_yaml::to_string(&to_yaml(value))?)
}

/// Parse YAML text, recognizing the ESPHome tags
pub fn from_str(text: &str) -> Result<Value> {
    let parsed: serde_yaml::Value = serde_yaml::from_str(text)?;
    Ok(from_yaml(parsed))
}

fn tagged(tag: &str, text: &str) -> serde_yaml::Value {
    serde_yaml::Value::Tagged(Box::new(TaggedValue {
        tag: Tag::new(tag),
        value: serde_yaml::Value::String(text.to_string()),
    }))
}

pub fn to_yaml(value: &Value) -> serde_yaml::Value {
    match value {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Int(i) => serde_yaml::Value::Number((*i).into()),
        Value::Float(f) => serde_yaml::Value::Number((*f).into()),
        Value::Str(s) => serde_yaml::Value::String(s.clone()),
        Value::Lambda(expr) => tagged(LAMBDA_TAG, expr),
        Value::Secret(name) => tagged(SECRET_TAG, name),
        Value::Include(path) => tagged(INCLUDE_TAG, path),
        Value::Seq(items) => serde_yaml::Value::Sequence(items.iter().map(to_yaml).collect()),
        Value::Map(map) => {
            let mut out = serde_yaml::Mapping::new();
            for (key, value) in map {
                out.insert(serde_yaml::Value::String(key.clone()), to_yaml(value));
            }
            serde_yaml::Value::Mapping(out)
        }
    }
}

pub fn from_yaml(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_yaml::Value::String(s) => Value::Str(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Seq(items.into_iter().map(from_yaml).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut out = Mapping::new();
            for (key, value) in map {
                out.insert(key_to_string(key), from_yaml(value));
            }
            Value::Map(out)
        }
        serde_yaml::Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            let tag = tag.to_string();
            let scalar = match &value {
                serde_yaml::Value::String(s) => Some(s.clone()),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                serde_yaml::Value::Bool(b) => Some(b.to_string()),
                _ => None,
            };
            match (tag.trim_start_matches('!'), scalar) {
                (LAMBDA_TAG, Some(s)) => Value::Lambda(s),
                (SECRET_TAG, Some(s)) => Value::Secret(s),
                (INCLUDE_TAG, Some(s)) => Value::Include(s),
                _ => from_yaml(value),
            }
        }
    }
}

fn key_to_string(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
