//! Attribute normalization for inbound SCIM payloads.
//!
//! Identity providers send attribute keys in arbitrary casing, nest extension
//! attributes under the extension URN, and encode booleans as strings. The
//! [`AttributeNormalizer`] flattens such a payload into a [`CanonicalAttributes`]
//! map keyed by lower-case dotted attribute paths (see [`crate::schema::paths`]).
//!
//! Normalization never fails: keys that do not resolve against the
//! [`SchemaRegistry`] are dropped, and so are values of the wrong shape.
//!
//! # Example
//!
//! ```rust
//! use scim_provisioning::normalizer::AttributeNormalizer;
//! use scim_provisioning::schema::{SchemaRegistry, paths};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let attrs = AttributeNormalizer::new(&registry).normalize(&json!({
//!     "UsErNaMe": "bjensen@example.com",
//!     "ACTIVE": "False",
//!     "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"Manager": "krbs"}
//! }));
//! assert_eq!(attrs.get_str(paths::USER_NAME), Some("bjensen@example.com"));
//! assert_eq!(attrs.get_bool(paths::ACTIVE), Some(false));
//! assert_eq!(attrs.get_str(paths::MANAGER), Some("krbs"));
//! # Ok(())
//! # }
//! ```

use crate::schema::{AttributeType, ResolvedAttribute, SchemaRegistry};
use log::{debug, trace};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flat map from canonical attribute path to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalAttributes {
    values: BTreeMap<String, Value>,
}

impl CanonicalAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a canonical path, replacing any previous value.
    pub fn insert(&mut self, path: impl Into<String>, value: Value) {
        self.values.insert(path.into(), value);
    }

    /// Set a canonical path only when a value is present.
    pub fn insert_opt(&mut self, path: impl Into<String>, value: Option<impl Into<Value>>) {
        if let Some(value) = value {
            self.values.insert(path.into(), value.into());
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.values.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values.contains_key(path)
    }

    /// Non-empty, trimmed string value at `path`.
    ///
    /// Explicit `null` and blank strings read as absent.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.values
            .get(path)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.values.get(path).and_then(Value::as_bool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Where a nested JSON object is being resolved.
#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    /// Core User attributes, optionally under a complex parent (`name.`)
    Core { prefix: &'a str },
    /// Attributes of an extension schema, addressed by its URN
    Extension { urn: &'a str },
}

/// Resolves arbitrarily-cased SCIM payloads to canonical attribute paths.
#[derive(Debug, Clone, Copy)]
pub struct AttributeNormalizer<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> AttributeNormalizer<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Normalize a whole resource payload. Non-object input yields an empty map.
    pub fn normalize(&self, payload: &Value) -> CanonicalAttributes {
        let mut attrs = CanonicalAttributes::new();
        if let Some(object) = payload.as_object() {
            self.walk(object, Scope::Core { prefix: "" }, &mut attrs);
        }
        attrs
    }

    /// Normalize a value addressed by an explicit attribute path, as in a PATCH
    /// operation carrying `path`. Unresolvable paths yield an empty map.
    pub fn normalize_at(&self, path: &str, value: &Value) -> CanonicalAttributes {
        let mut attrs = CanonicalAttributes::new();
        match self.registry.resolve(path) {
            Some(attr) => self.place(attr, value, &mut attrs),
            None => {
                if let (Some(schema), Some(object)) =
                    (self.registry.extension_schema(path), value.as_object())
                {
                    self.walk(object, Scope::Extension { urn: &schema.id }, &mut attrs);
                } else {
                    debug!("Ignoring unresolvable attribute path '{}'", path);
                }
            }
        }
        attrs
    }

    fn walk(&self, object: &Map<String, Value>, scope: Scope<'_>, attrs: &mut CanonicalAttributes) {
        for (key, value) in object {
            let candidate = match scope {
                Scope::Core { prefix } => format!("{}{}", prefix, key),
                Scope::Extension { urn } => format!("{}:{}", urn, key),
            };

            if let Some(attr) = self.registry.resolve(&candidate) {
                self.place(attr, value, attrs);
                continue;
            }

            let top_level = matches!(scope, Scope::Core { prefix: "" });
            match value.as_object() {
                Some(nested) if top_level && self.registry.is_core_schema(key) => {
                    self.walk(nested, Scope::Core { prefix: "" }, attrs);
                }
                Some(nested) if top_level => {
                    if let Some(schema) = self.registry.extension_schema(key) {
                        self.walk(nested, Scope::Extension { urn: &schema.id }, attrs);
                    } else {
                        debug!("Ignoring unknown attribute '{}'", key);
                    }
                }
                _ => debug!("Ignoring unknown attribute '{}'", candidate),
            }
        }
    }

    /// Store `value` under a resolved attribute, descending into complex values.
    fn place(&self, attr: &ResolvedAttribute, value: &Value, attrs: &mut CanonicalAttributes) {
        if attr.is_complex() {
            match value.as_object() {
                Some(nested) => {
                    let prefix = format!("{}.", attr.name);
                    self.walk(nested, Scope::Core { prefix: &prefix }, attrs);
                }
                None => debug!("Ignoring non-object value for complex attribute '{}'", attr.name),
            }
            return;
        }

        trace!("Normalized '{}' = {}", attr.canonical, value);
        attrs.insert(attr.canonical.clone(), coerce(attr, value));
    }
}

/// Coerce a raw payload value to the shape of a simple attribute.
fn coerce(attr: &ResolvedAttribute, value: &Value) -> Value {
    // RFC 7643 reference form, e.g. `"manager": {"value": "krbs"}`
    let value = match value.as_object() {
        Some(object) => object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("value"))
            .map(|(_, v)| v)
            .unwrap_or(value),
        None => value,
    };

    match (attr.data_type, value) {
        (AttributeType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str()
        {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => value.clone(),
        },
        _ => value.clone(),
    }
}
