//! # Output Document Model
//!
//! The converted tree is built from [`Value`]s. Besides plain scalars it has
//! the three ESPHome-specific scalar kinds (`!lambda`, `!secret`,
//! `!include`) so the serializer can tag them instead of emitting strings.

use indexmap::IndexMap;

/// Insertion-ordered mapping; key order is the emitted YAML order
pub type Mapping = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Expression evaluated by the firmware at runtime
    Lambda(String),
    Secret(String),
    Include(String),
    Seq(Vec<Value>),
    Map(Mapping),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn lambda(expr: impl Into<String>) -> Self {
        Value::Lambda(expr.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key on a mapping value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|m| m.get(key))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Map(m)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

/// Build a [`Mapping`] from `key => value` pairs
#[macro_export]
macro_rules! mapping {
    () => { $crate::document::Mapping::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::document::Mapping::new();
        $( map.insert(::std::string::String::from($key), $crate::document::Value::from($value)); )+
        map
    }};
}

/// Merge `update` into `target`, recursing where both sides hold mappings.
/// Any other collision is won by `update`.
pub fn deep_merge(target: &mut Mapping, update: Mapping) {
    for (key, value) in update {
        if let Value::Map(incoming) = value {
            if let Some(Value::Map(existing)) = target.get_mut(&key) {
                deep_merge(existing, incoming);
                continue;
            }
            target.insert(key, Value::Map(incoming));
        } else {
            target.insert(key, value);
        }
    }
}

/// One converted widget: `{ keyword: body }`
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub keyword: String,
    pub body: Mapping,
}

impl Fragment {
    pub fn new(keyword: impl Into<String>, body: Mapping) -> Self {
        Self {
            keyword: keyword.into(),
            body,
        }
    }

    pub fn into_value(self) -> Value {
        let mut map = Mapping::new();
        map.insert(self.keyword, Value::Map(self.body));
        Value::Map(map)
    }
}

/// One entry of the top-level `image:` list
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    pub id: String,
    pub file: String,
}

pub const IMAGE_TYPE: &str = "RGB565";
pub const IMAGE_TRANSPARENCY: &str = "alpha_channel";

/// The full converter output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub pages: Vec<Mapping>,
    pub images: Vec<ImageEntry>,
}

impl Document {
    /// `{ lvgl: { pages: [...] }, image: [...] }`, `image` omitted when empty
    pub fn to_value(&self) -> Value {
        let pages = self.pages.iter().cloned().map(Value::Map).collect::<Vec<_>>();
        let mut root = mapping! { "lvgl" => mapping! { "pages" => Value::Seq(pages) } };

        if !self.images.is_empty() {
            let images = self
                .images
                .iter()
                .map(|image| {
                    Value::Map(mapping! {
                        "id" => image.id.as_str(),
                        "file" => image.file.as_str(),
                        "type" => IMAGE_TYPE,
                        "transparency" => IMAGE_TRANSPARENCY,
                    })
                })
                .collect();
            root.insert("image".to_string(), Value::Seq(images));
        }

        Value::Map(root)
    }

    /// Render as ESPHome YAML
    pub fn to_yaml(&self) -> crate::error::Result<String> {
        crate::yaml::to_string(&self.to_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_merge_recurses_into_maps() {
        let mut target = mapping! {
            "id" => "a",
            "state" => mapping! { "checked" => true },
        };
        deep_merge(
            &mut target,
            mapping! {
                "state" => mapping! { "disabled" => false },
                "id" => "b",
            },
        );

        assert_eq!(target["id"], Value::str("b"));
        let state = target["state"].as_map().unwrap();
        assert_eq!(state["checked"], Value::Bool(true));
        assert_eq!(state["disabled"], Value::Bool(false));
    }

    #[test]
    fn test_deep_merge_replaces_non_map_with_map() {
        let mut target = mapping! { "layout" => "none" };
        deep_merge(&mut target, mapping! { "layout" => mapping! { "pad_row" => 2i64 } });
        assert_eq!(target["layout"].get("pad_row"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_document_omits_empty_image_list() {
        let doc = Document {
            pages: vec![mapping! { "id" => "page" }],
            images: vec![],
        };
        let value = doc.to_value();
        assert!(value.get("image").is_none());
        let pages = value.get("lvgl").unwrap().get("pages").unwrap().as_seq().unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_document_image_entries_carry_fixed_tags() {
        let doc = Document {
            pages: vec![],
            images: vec![ImageEntry {
                id: "gear_png".into(),
                file: "assets/gear_RGB565.png".into(),
            }],
        };
        let value = doc.to_value();
        let image = &value.get("image").unwrap().as_seq().unwrap()[0];
        assert_eq!(image.get("type"), Some(&Value::str("RGB565")));
        assert_eq!(image.get("transparency"), Some(&Value::str("alpha_channel")));
    }
}
