//! Per-application configuration records.
//!
//! An [`ApplicationConfig`] is an ordered list of named, optionally valued
//! string fields. The `Id` field names the component; its `/`-separated
//! segments form the component's structural path.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Field holding the component identifier.
pub const ID_FIELD: &str = "Id";

/// Separator between the segments of an identifier path.
pub const ID_PATH_SEPARATOR: char = '/';

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("component has no id")]
    EmptyId,
    #[error("component '{id}' has invalid path length of {len} (expected {expected})")]
    InvalidPathLength { id: String, len: usize, expected: usize },
    #[error("no {field} given for component '{id}'")]
    MissingField { id: String, field: &'static str },
    #[error("invalid environment variable '{entry}', missing '='")]
    InvalidEnvironment { entry: String },
    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    #[error("malformed configuration block '{block}': {reason}")]
    MalformedBlock { block: String, reason: String },
}

/// A scalar as it may appear in a configuration file.
///
/// Non-string scalars are kept so that `StackSize: 2097152` works as well
/// as `StackSize: "2097152"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Unsigned(n) => write!(f, "{}", n),
            ConfigValue::Signed(n) => write!(f, "{}", n),
            ConfigValue::Float(n) => write!(f, "{}", n),
            ConfigValue::String(s) => f.write_str(s),
        }
    }
}

/// One application block: ordered key to optional value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationConfig {
    id: String,
    id_path: Vec<String>,
    fields: Vec<(String, Option<String>)>,
}

impl ApplicationConfig {
    /// Build a record from its fields, in order.
    ///
    /// The identifier is taken from the first `Id` field. A record without
    /// one gets an empty identifier and an empty path, which component
    /// construction rejects.
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<String>)>,
        K: Into<String>,
    {
        let fields: Vec<(String, Option<String>)> =
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let id = fields
            .iter()
            .find(|(k, _)| k == ID_FIELD)
            .and_then(|(_, v)| v.clone())
            .unwrap_or_default();
        let id_path = split_id_path(&id);

        Self { id, id_path, fields }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn id_path(&self) -> &[String] {
        &self.id_path
    }

    /// Look up the first entry for `key`.
    ///
    /// Returns `Some(None)` when the key is present without a value.
    pub fn find(&self, key: &str) -> Option<Option<&str>> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    /// Look up the value of the first entry for `key`, treating a
    /// value-less entry as absent.
    pub fn find_value(&self, key: &str) -> Option<&str> {
        self.find(key).flatten()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Split an identifier into its path segments. An empty id has no segments.
pub fn split_id_path(id: &str) -> Vec<String> {
    if id.is_empty() {
        return Vec::new();
    }
    id.split(ID_PATH_SEPARATOR).map(str::to_string).collect()
}

/// Parse an unsigned integer argument such as a stack size.
pub fn convert_arg_to_uinteger(field: &str, value: &str) -> Result<u64, ValidationError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl<'de> Deserialize<'de> for ApplicationConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = ApplicationConfig;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of application fields")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Option<ConfigValue>>()? {
                    if key.is_empty() {
                        return Err(de::Error::custom("application field names cannot be empty"));
                    }
                    fields.push((key, value.map(|v| v.to_string())));
                }
                Ok(ApplicationConfig::from_fields(fields))
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

impl Serialize for ApplicationConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(fields: &[(&str, Option<&str>)]) -> ApplicationConfig {
        ApplicationConfig::from_fields(
            fields.iter().map(|(k, v)| (k.to_string(), v.map(str::to_string))),
        )
    }

    #[test]
    fn test_id_and_path_from_id_field() {
        let cfg = config(&[("Id", Some("left/host0/iperf")), ("Binary", Some("iperf"))]);
        assert_eq!(cfg.id(), "left/host0/iperf");
        assert_eq!(cfg.id_path(), &["left", "host0", "iperf"]);
    }

    #[test]
    fn test_missing_id_gives_empty_path() {
        let cfg = config(&[("Binary", Some("iperf"))]);
        assert_eq!(cfg.id(), "");
        assert!(cfg.id_path().is_empty());
    }

    #[test]
    fn test_find_distinguishes_null_values() {
        let cfg = config(&[("Id", Some("a/b/c")), ("StdinFile", None)]);
        assert_eq!(cfg.find("StdinFile"), Some(None));
        assert_eq!(cfg.find_value("StdinFile"), None);
        assert_eq!(cfg.find("Missing"), None);
    }

    #[test]
    fn test_find_returns_first_entry() {
        let cfg = config(&[("Binary", Some("first")), ("Binary", Some("second"))]);
        assert_eq!(cfg.find_value("Binary"), Some("first"));
        assert_eq!(cfg.len(), 2);
    }

    #[test]
    fn test_convert_arg_to_uinteger() {
        assert_eq!(convert_arg_to_uinteger("StackSize", "2097152"), Ok(2_097_152));
        assert_eq!(convert_arg_to_uinteger("StackSize", " 42 "), Ok(42));
        assert!(matches!(
            convert_arg_to_uinteger("StackSize", "-1"),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(convert_arg_to_uinteger("StackSize", "1MiB").is_err());
    }

    #[test]
    fn test_deserialize_preserves_order_and_scalars() {
        let yaml = r#"
Id: left/host0/app
Binary: /usr/bin/app
StackSize: 2097152
Verbose: true
StdinFile: ~
"#;
        let cfg: ApplicationConfig = serde_yaml::from_str(yaml).unwrap();
        let keys: Vec<&str> = cfg.fields().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Id", "Binary", "StackSize", "Verbose", "StdinFile"]);
        assert_eq!(cfg.find_value("StackSize"), Some("2097152"));
        assert_eq!(cfg.find_value("Verbose"), Some("true"));
        assert_eq!(cfg.find("StdinFile"), Some(None));
    }
}
