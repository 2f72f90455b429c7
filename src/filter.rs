//! Evaluation of the SCIM filter subset used by provisioning clients.
//!
//! Only `<attribute> eq "<value>"` is implemented. The attribute name and the
//! operator keyword are case-insensitive, the attribute resolves through the
//! schema registry like any payload key, and string comparison ignores case.
//!
//! Per SCIM list semantics a filter that cannot match (malformed expression,
//! unknown attribute) yields zero resources rather than an error. The one
//! rejected case is a well-formed expression using a SCIM operator this adapter
//! does not implement (`co`, `sw`, `gt`, ...), reported as
//! [`ScimError::UnsupportedOperation`].
//!
//! ```rust
//! use scim_provisioning::filter::Filter;
//! use scim_provisioning::normalizer::CanonicalAttributes;
//! use scim_provisioning::schema::{SchemaRegistry, paths};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::new()?;
//! let filter = Filter::parse(&registry, r#"UserName EQ "BJensen@example.com""#)?;
//!
//! let mut attrs = CanonicalAttributes::new();
//! attrs.insert(paths::USER_NAME, json!("bjensen@example.com"));
//! assert!(filter.matches(&attrs));
//! # Ok(())
//! # }
//! ```

use crate::error::{ScimError, ScimResult};
use crate::normalizer::CanonicalAttributes;
use crate::schema::SchemaRegistry;
use log::debug;
use serde_json::Value;

/// SCIM comparison operators other than `eq` (RFC 7644 §3.4.2.2).
const UNIMPLEMENTED_OPERATORS: &[&str] = &["ne", "co", "sw", "ew", "pr", "gt", "ge", "lt", "le"];

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `<attribute> eq "<value>"`, keyed by canonical attribute path
    Equals { path: String, value: String },
    /// An expression that matches nothing
    MatchNone,
}

impl Filter {
    /// Parse a filter expression.
    pub fn parse(registry: &SchemaRegistry, expression: &str) -> ScimResult<Self> {
        let Some((attribute, operator, operand)) = split_expression(expression) else {
            debug!("Malformed filter '{}' matches nothing", expression);
            return Ok(Self::MatchNone);
        };

        let operator = operator.to_ascii_lowercase();
        if operator != "eq" {
            if UNIMPLEMENTED_OPERATORS.contains(&operator.as_str()) {
                return Err(ScimError::unsupported_operation(format!(
                    "filter operator '{}'",
                    operator
                )));
            }
            debug!("Unknown filter operator '{}' matches nothing", operator);
            return Ok(Self::MatchNone);
        }

        let Some(value) = unquote(operand) else {
            debug!("Filter operand {} is not a quoted string", operand);
            return Ok(Self::MatchNone);
        };

        match registry.resolve(attribute) {
            Some(attr) if !attr.is_complex() => Ok(Self::Equals {
                path: attr.canonical.clone(),
                value: value.to_string(),
            }),
            _ => {
                debug!("Filter attribute '{}' does not resolve", attribute);
                Ok(Self::MatchNone)
            }
        }
    }

    /// Evaluate against a resource's canonical attributes.
    pub fn matches(&self, attrs: &CanonicalAttributes) -> bool {
        match self {
            Self::MatchNone => false,
            Self::Equals { path, value } => match attrs.get(path) {
                Some(Value::String(actual)) => actual.to_lowercase() == value.to_lowercase(),
                Some(Value::Bool(actual)) => value.eq_ignore_ascii_case(&actual.to_string()),
                Some(Value::Number(actual)) => actual.to_string() == *value,
                _ => false,
            },
        }
    }
}

/// Split into (attribute, operator, operand); the operand keeps its quotes and
/// may contain whitespace.
fn split_expression(expression: &str) -> Option<(&str, &str, &str)> {
    let rest = expression.trim();
    let (attribute, rest) = rest.split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    match rest.split_once(char::is_whitespace) {
        Some((operator, operand)) => Some((attribute, operator, operand.trim())),
        // `pr` takes no operand
        None if !rest.is_empty() => Some((attribute, rest, "")),
        None => None,
    }
}

fn unquote(operand: &str) -> Option<&str> {
    let inner = operand.strip_prefix('"')?.strip_suffix('"')?;
    if inner.contains('"') { None } else { Some(inner) }
}
