//! Document formats: parsing raw text into a [`ValueTree`] and round-tripping
//! subtrees through text for structured lookups.

use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Number};
use thiserror::Error;

use super::ConfigError;

/// Generic parsed configuration document.
pub type ValueTree = serde_json::Value;

/// Key used to wrap fragments for formats that cannot hold a bare scalar at the root.
const TOML_FRAGMENT_KEY: &str = "value";

/// Parses a whole configuration document.
pub trait DocumentParser: Send + Sync + fmt::Debug {
    fn parse(&self, raw: &str) -> Result<ValueTree, ConfigError>;
}

/// Serializes a subtree to text and decodes that text straight into a typed
/// destination with the format's own deserializer.
///
/// Decoding from text rather than from the tree keeps the format's scalar
/// rules: YAML `version: 2` decodes into a `String`.
pub trait FragmentCodec: Send + Sync + fmt::Debug {
    fn encode(&self, value: &ValueTree) -> Result<String, CodecError>;
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError>;
}

/// TOML fragment envelope, see [`TOML_FRAGMENT_KEY`].
#[derive(Deserialize)]
struct TomlFragment<T> {
    value: T,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CodecError(String);

impl CodecError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self(message.to_string())
    }
}

/// Built-in document formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Toml => "toml",
        }
    }

    /// Picks a format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    fn parse_error(self, err: impl fmt::Display) -> ConfigError {
        ConfigError::Parse {
            format: self.name(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl DocumentParser for Format {
    fn parse(&self, raw: &str) -> Result<ValueTree, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(ValueTree::Object(Map::new()));
        }

        let tree = match self {
            Format::Yaml => serde_yaml::from_str(raw).map_err(|e| self.parse_error(e))?,
            Format::Json => serde_json::from_str(raw).map_err(|e| self.parse_error(e))?,
            Format::Toml => {
                let table: toml::Table = toml::from_str(raw).map_err(|e| self.parse_error(e))?;
                toml_to_tree(toml::Value::Table(table))
            }
        };

        // A document of only comments is an empty mapping too.
        Ok(match tree {
            ValueTree::Null => ValueTree::Object(Map::new()),
            tree => tree,
        })
    }
}

impl FragmentCodec for Format {
    fn encode(&self, value: &ValueTree) -> Result<String, CodecError> {
        match self {
            Format::Yaml => serde_yaml::to_string(value).map_err(CodecError::new),
            Format::Json => serde_json::to_string(value).map_err(CodecError::new),
            Format::Toml => {
                let mut wrapper = Map::new();
                wrapper.insert(TOML_FRAGMENT_KEY.to_string(), value.clone());
                toml::to_string(&wrapper).map_err(CodecError::new)
            }
        }
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        match self {
            Format::Yaml => serde_yaml::from_str(text).map_err(CodecError::new),
            Format::Json => serde_json::from_str(text).map_err(CodecError::new),
            Format::Toml => toml::from_str::<TomlFragment<T>>(text)
                .map(|fragment| fragment.value)
                .map_err(CodecError::new),
        }
    }
}

/// Converts a TOML value into the generic tree. Datetimes become their RFC 3339 text.
fn toml_to_tree(value: toml::Value) -> ValueTree {
    match value {
        toml::Value::String(s) => ValueTree::String(s),
        toml::Value::Integer(i) => ValueTree::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map_or(ValueTree::Null, ValueTree::Number),
        toml::Value::Boolean(b) => ValueTree::Bool(b),
        toml::Value::Datetime(dt) => ValueTree::String(dt.to_string()),
        toml::Value::Array(arr) => ValueTree::Array(arr.into_iter().map(toml_to_tree).collect()),
        toml::Value::Table(t) => {
            ValueTree::Object(t.into_iter().map(|(k, v)| (k, toml_to_tree(v))).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_each_format() {
        let yaml = Format::Yaml.parse("server:\n  port: 8080\n").unwrap();
        let json = Format::Json.parse(r#"{"server": {"port": 8080}}"#).unwrap();
        let toml = Format::Toml.parse("[server]\nport = 8080\n").unwrap();

        let expected = json!({"server": {"port": 8080}});
        assert_eq!(yaml, expected);
        assert_eq!(json, expected);
        assert_eq!(toml, expected);
    }

    #[test]
    fn test_empty_yaml_is_empty_mapping() {
        assert_eq!(Format::Yaml.parse("").unwrap(), json!({}));
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = Format::Json.parse("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "json", .. }));
    }

    #[test]
    fn test_toml_datetime_becomes_string() {
        let tree = Format::Toml.parse("at = 1979-05-27T07:32:00Z\n").unwrap();
        assert_eq!(tree["at"], json!("1979-05-27T07:32:00Z"));
    }

    #[test]
    fn test_fragment_round_trip_scalar_through_toml() {
        let text = Format::Toml.encode(&json!("hello")).unwrap();
        assert_eq!(Format::Toml.decode::<String>(&text).unwrap(), "hello");
    }

    #[test]
    fn test_yaml_scalars_decode_into_strings() {
        for (tree, expected) in [(json!(2), "2"), (json!(1.5), "1.5"), (json!(true), "true")] {
            let text = Format::Yaml.encode(&tree).unwrap();
            assert_eq!(Format::Yaml.decode::<String>(&text).unwrap(), expected);
        }
        assert_eq!(Format::Yaml.decode::<String>("0123\n").unwrap(), "0123");
    }

    #[test]
    fn test_json_decode_keeps_json_rules() {
        let text = Format::Json.encode(&json!(2)).unwrap();
        assert!(Format::Json.decode::<String>(&text).is_err());
        assert_eq!(Format::Json.decode::<u8>(&text).unwrap(), 2);
    }

    #[test]
    fn test_toml_cannot_encode_null() {
        assert!(Format::Toml.encode(&ValueTree::Null).is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("app.YML"), Some(Format::Yaml));
        assert_eq!(Format::from_path("conf/app.toml"), Some(Format::Toml));
        assert_eq!(Format::from_path("app.ini"), None);
    }
}
