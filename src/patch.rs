//! SCIM PATCH (RFC 7644 §3.5.2) over canonical attribute maps.
//!
//! Two request shapes are accepted:
//!
//! - path-addressed: `{"op": "replace", "path": "name.formatted", "value": "..."}`,
//!   where `path` may carry an extension URN prefix
//!   (`urn:...:enterprise:2.0:User:manager`)
//! - bulk: `{"op": "replace", "value": {...}}` with no `path`; the object is
//!   normalized and merged into the resource
//!
//! `add` and `replace` both have replace semantics on the single-valued
//! attributes this adapter stores. `remove` is rejected. The whole request is
//! parsed and validated before the first operation is applied, and operations
//! are then applied strictly in order, so a later operation overwrites an
//! earlier one.
//!
//! ```rust
//! use scim_provisioning::normalizer::CanonicalAttributes;
//! use scim_provisioning::patch::{PatchEngine, PatchRequest};
//! use scim_provisioning::schema::{SchemaRegistry, paths};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let request = PatchRequest::from_json(&json!({
//!     "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
//!     "Operations": [
//!         {"op": "Replace", "path": "locale", "value": "nl_NL"},
//!         {"op": "replace", "path": "LOCALE", "value": "en"}
//!     ]
//! }))?;
//! let patched = PatchEngine::new(&registry).apply(CanonicalAttributes::new(), &request);
//! assert_eq!(patched.get_str(paths::LOCALE), Some("en"));
//! # Ok(())
//! # }
//! ```

use crate::error::{ScimError, ScimResult};
use crate::normalizer::{AttributeNormalizer, CanonicalAttributes};
use crate::schema::{Mutability, SchemaRegistry};
use log::debug;
use serde_json::{Map, Value};

/// Supported PATCH operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp {
    Add,
    Replace,
}

impl PatchOp {
    fn parse(op: &str) -> ScimResult<Self> {
        match op.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            other => Err(ScimError::unsupported_operation(format!(
                "PATCH operation '{}'",
                other
            ))),
        }
    }
}

/// One validated PATCH operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: Option<String>,
    pub value: Value,
}

/// A validated PATCH request body.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRequest {
    operations: Vec<PatchOperation>,
}

fn get_ignore_case<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

impl PatchRequest {
    /// Parse and validate a PATCH body. Fails on the first invalid operation;
    /// nothing is applied at this stage.
    pub fn from_json(body: &Value) -> ScimResult<Self> {
        let object = body
            .as_object()
            .ok_or_else(|| ScimError::invalid_request("PATCH body must be a JSON object"))?;
        let raw_operations = get_ignore_case(object, "Operations")
            .and_then(Value::as_array)
            .ok_or_else(|| ScimError::invalid_request("PATCH body must carry an 'Operations' array"))?;

        let operations = raw_operations
            .iter()
            .enumerate()
            .map(|(index, raw)| Self::parse_operation(index, raw))
            .collect::<ScimResult<Vec<_>>>()?;

        Ok(Self { operations })
    }

    fn parse_operation(index: usize, raw: &Value) -> ScimResult<PatchOperation> {
        let object = raw.as_object().ok_or_else(|| {
            ScimError::invalid_request(format!("PATCH operation {} must be an object", index))
        })?;

        let op = get_ignore_case(object, "op")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ScimError::invalid_request(format!("PATCH operation {} must have an 'op'", index))
            })
            .and_then(PatchOp::parse)?;

        let path = get_ignore_case(object, "path")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let value = get_ignore_case(object, "value").cloned().ok_or_else(|| {
            ScimError::invalid_request(format!("PATCH operation {} requires a 'value'", index))
        })?;

        if path.is_none() && !value.is_object() {
            return Err(ScimError::invalid_request(format!(
                "PATCH operation {} without 'path' requires an object 'value'",
                index
            )));
        }

        Ok(PatchOperation { op, path, value })
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }
}

/// Applies validated PATCH requests to canonical attribute maps.
#[derive(Debug, Clone, Copy)]
pub struct PatchEngine<'r> {
    registry: &'r SchemaRegistry,
    normalizer: AttributeNormalizer<'r>,
}

impl<'r> PatchEngine<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            normalizer: AttributeNormalizer::new(registry),
        }
    }

    /// Apply every operation of `request` to `current`, in order.
    ///
    /// Read-only attributes (`id`, `meta.*`) addressed by an operation are dropped.
    pub fn apply(
        &self,
        mut current: CanonicalAttributes,
        request: &PatchRequest,
    ) -> CanonicalAttributes {
        for operation in request.operations() {
            let delta = match &operation.path {
                Some(path) => self.normalizer.normalize_at(path, &operation.value),
                None => self.normalizer.normalize(&operation.value),
            };

            for (path, value) in delta.iter() {
                let read_only = self
                    .registry
                    .resolve(path)
                    .is_some_and(|attr| attr.mutability == Mutability::ReadOnly);
                if read_only {
                    debug!("PATCH {:?} ignoring read-only attribute '{}'", operation.op, path);
                    continue;
                }
                current.insert(path, value.clone());
            }
        }
        current
    }
}
