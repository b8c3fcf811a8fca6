//! # SquareLine Project Model
//!
//! The `.spj` file is a JSON tree. Every node carries its widget type in
//! `saved_objtypeKey`, a `guid`, a flat list of property records and its
//! children. Property records are loosely typed: depending on the tag they
//! carry `strval`, `integer`, `intarray`, `flags`, layout fields or a nested
//! `childs` list. They are decoded exactly once here, into the closed
//! [`PropertyValue`] union, so nothing downstream has to probe raw JSON.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// A parsed SquareLine project
#[derive(Debug, Clone)]
pub struct Project {
    pub root: SourceNode,
}

impl Project {
    /// Parse a project from its JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawProject = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    /// Parse a project from raw file contents; bad encoding counts as malformed
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: RawProject = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    /// Build a project from an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawProject = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawProject) -> Result<Self> {
        let root = raw.root.ok_or(ConvertError::MissingRoot)?;
        Ok(Self { root: root.into() })
    }
}

/// Read and parse a project file.
///
/// A missing file is reported as [`ConvertError::NotFound`], distinct from
/// unparsable content.
pub fn load_project(path: &Path) -> Result<Project> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConvertError::NotFound(path.to_path_buf())
        } else {
            ConvertError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    Project::from_slice(&bytes)
}

/// One widget in the builder tree
#[derive(Debug, Clone, Default)]
pub struct SourceNode {
    /// `saved_objtypeKey`, absent on the project root
    pub kind: Option<String>,
    pub guid: Option<String>,
    pub properties: Vec<PropertyRecord>,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    /// First property record carrying `tag`
    pub fn property(&self, tag: &str) -> Option<&PropertyRecord> {
        self.properties.iter().find(|p| p.tag == tag)
    }

    /// All property records carrying `tag`, in source order
    pub fn properties_tagged<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a PropertyRecord> + 'a {
        self.properties.iter().filter(move |p| p.tag == tag)
    }
}

/// A typed property record
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    /// `strtype`, e.g. `OBJECT/Name` or `_style/Bg_Color`
    pub tag: String,
    pub value: PropertyValue,
}

/// Flex layout fields of a `Layout_type` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutRecord {
    pub layout_type: i64,
    pub flow: i64,
    pub wrap: bool,
    pub reversed: bool,
    pub main_alignment: i64,
    pub cross_alignment: i64,
    pub track_alignment: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Empty,
    Text(String),
    Integer(i64),
    IntArray(Vec<i64>),
    /// Bitflag record (sizes); `values` is the accompanying array, if any
    Flags { bits: i64, values: Vec<i64> },
    Layout(LayoutRecord),
    /// Style blocks, style states, event handlers and actions.
    /// `label` is the record's string value (state name, event, verb).
    NodeList {
        label: Option<String>,
        records: Vec<PropertyRecord>,
    },
}

impl PropertyRecord {
    pub fn text(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: PropertyValue::Text(value.into()),
        }
    }

    pub fn integer(tag: impl Into<String>, value: i64) -> Self {
        Self {
            tag: tag.into(),
            value: PropertyValue::Integer(value),
        }
    }

    pub fn int_array(tag: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            tag: tag.into(),
            value: PropertyValue::IntArray(values),
        }
    }

    pub fn node_list(
        tag: impl Into<String>,
        label: Option<&str>,
        records: Vec<PropertyRecord>,
    ) -> Self {
        Self {
            tag: tag.into(),
            value: PropertyValue::NodeList {
                label: label.map(str::to_string),
                records,
            },
        }
    }

    /// String payload; for node lists this is the label
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            PropertyValue::Text(s) => Some(s),
            PropertyValue::NodeList { label, .. } => label.as_deref(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            PropertyValue::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Integer array payload, also available on flag records
    pub fn as_int_array(&self) -> Option<&[i64]> {
        match &self.value {
            PropertyValue::IntArray(v) => Some(v),
            PropertyValue::Flags { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Nested records; empty for scalar records
    pub fn records(&self) -> &[PropertyRecord] {
        match &self.value {
            PropertyValue::NodeList { records, .. } => records,
            _ => &[],
        }
    }

    /// First nested record carrying `tag`
    pub fn child(&self, tag: &str) -> Option<&PropertyRecord> {
        self.records().iter().find(|r| r.tag == tag)
    }
}

// ---------------------------------------------------------------------------
// Raw JSON shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawProject {
    root: Option<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "saved_objtypeKey", default)]
    kind: Option<String>,
    #[serde(default)]
    guid: Option<String>,
    #[serde(default)]
    properties: Vec<RawRecord>,
    #[serde(default)]
    children: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    strtype: String,
    #[serde(default)]
    strval: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    integer: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int_array")]
    intarray: Option<Vec<i64>>,
    #[serde(default, deserialize_with = "lenient_int")]
    flags: Option<i64>,
    #[serde(default)]
    childs: Option<Vec<RawRecord>>,
    #[serde(rename = "LayoutType", default, deserialize_with = "lenient_int")]
    layout_type: Option<i64>,
    #[serde(rename = "Flow", default, deserialize_with = "lenient_int")]
    flow: Option<i64>,
    #[serde(rename = "Wrap", default, deserialize_with = "lenient_bool")]
    wrap: bool,
    #[serde(rename = "Reversed", default, deserialize_with = "lenient_bool")]
    reversed: bool,
    #[serde(rename = "MainAlignment", default, deserialize_with = "lenient_int")]
    main_alignment: Option<i64>,
    #[serde(rename = "CrossAlignment", default, deserialize_with = "lenient_int")]
    cross_alignment: Option<i64>,
    #[serde(rename = "TrackAlignment", default, deserialize_with = "lenient_int")]
    track_alignment: Option<i64>,
}

impl From<RawNode> for SourceNode {
    fn from(raw: RawNode) -> Self {
        Self {
            kind: raw.kind,
            guid: raw.guid,
            properties: raw.properties.into_iter().map(Into::into).collect(),
            children: raw.children.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RawRecord> for PropertyRecord {
    fn from(raw: RawRecord) -> Self {
        let value = if let Some(childs) = raw.childs {
            PropertyValue::NodeList {
                label: raw.strval,
                records: childs.into_iter().map(Into::into).collect(),
            }
        } else if let Some(layout_type) = raw.layout_type {
            PropertyValue::Layout(LayoutRecord {
                layout_type,
                flow: raw.flow.unwrap_or(0),
                wrap: raw.wrap,
                reversed: raw.reversed,
                main_alignment: raw.main_alignment.unwrap_or(0),
                cross_alignment: raw.cross_alignment.unwrap_or(0),
                track_alignment: raw.track_alignment.unwrap_or(0),
            })
        } else if let Some(bits) = raw.flags {
            PropertyValue::Flags {
                bits,
                values: raw.intarray.unwrap_or_default(),
            }
        } else if let Some(values) = raw.intarray {
            PropertyValue::IntArray(values)
        } else if let Some(i) = raw.integer {
            PropertyValue::Integer(i)
        } else if let Some(s) = raw.strval {
            PropertyValue::Text(s)
        } else {
            PropertyValue::Empty
        };

        Self {
            tag: raw.strtype,
            value,
        }
    }
}

fn number_to_i64(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))
}

fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => number_to_i64(&n),
        Some(serde_json::Value::Bool(b)) => Some(i64::from(b)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_int_array<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(value.map(|items| {
        items
            .iter()
            .map(|item| match item {
                serde_json::Value::Number(n) => number_to_i64(n).unwrap_or(0),
                other => {
                    tracing::debug!("Non-numeric array item {} read as 0", other);
                    0
                }
            })
            .collect()
    }))
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => number_to_i64(&n).unwrap_or(0) != 0,
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    })
}
