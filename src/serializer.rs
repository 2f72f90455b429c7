//! Rendering of internal entities as SCIM JSON.
//!
//! User resources carry a `meta` block with RFC 3339 timestamps and an absolute
//! location. The Enterprise extension block, and its URN in `schemas`, appear
//! only when the member has a manager relationship.

use crate::config::ScimConfig;
use crate::error::ScimError;
use crate::model::ScimUser;
use crate::schema::embedded::{ERROR_SCHEMA, LIST_RESPONSE_SCHEMA};
use crate::schema::{CORE_USER_SCHEMA, ENTERPRISE_USER_SCHEMA};
use chrono::SecondsFormat;
use serde_json::{Map, Value, json};

/// Render a user as a SCIM User resource.
pub fn user_resource(config: &ScimConfig, user: &ScimUser) -> Value {
    let member = &user.member;
    let id = member.id.to_string();

    let mut schemas = vec![Value::from(CORE_USER_SCHEMA)];
    if user.manager.is_some() {
        schemas.push(Value::from(ENTERPRISE_USER_SCHEMA));
    }

    let mut resource = Map::new();
    resource.insert("schemas".to_string(), Value::Array(schemas));
    resource.insert("id".to_string(), Value::from(id.clone()));
    if let Some(external_id) = &member.external_id {
        resource.insert("externalId".to_string(), Value::from(external_id.clone()));
    }
    resource.insert("userName".to_string(), Value::from(user.account.email.clone()));
    if let Some(display_name) = &member.display_name {
        resource.insert("name".to_string(), json!({ "formatted": display_name }));
        resource.insert("displayName".to_string(), Value::from(display_name.clone()));
    }
    resource.insert("locale".to_string(), Value::from(user.account.locale.clone()));
    resource.insert("timezone".to_string(), Value::from(user.account.timezone.clone()));
    resource.insert("active".to_string(), Value::Bool(member.active));
    if let Some(manager) = &user.manager {
        resource.insert(ENTERPRISE_USER_SCHEMA.to_string(), json!({ "manager": manager }));
    }
    resource.insert(
        "meta".to_string(),
        json!({
            "resourceType": "User",
            "created": member.created.to_rfc3339_opts(SecondsFormat::Millis, true),
            "lastModified": member.last_modified.to_rfc3339_opts(SecondsFormat::Millis, true),
            "location": config.location(&member.tenant_id, "Users", &id),
        }),
    );

    Value::Object(resource)
}

/// Wrap a page of resources in a list-response envelope.
pub fn list_response(resources: Vec<Value>, total_results: usize, start_index: usize) -> Value {
    json!({
        "schemas": [LIST_RESPONSE_SCHEMA],
        "totalResults": total_results,
        "itemsPerPage": resources.len(),
        "startIndex": start_index,
        "Resources": resources,
    })
}

/// Render an error as an RFC 7644 §3.12 error document.
pub fn error_document(error: &ScimError) -> Value {
    let mut document = json!({
        "schemas": [ERROR_SCHEMA],
        "status": error.status_code().to_string(),
        "detail": error.to_string(),
    });
    if let Some(scim_type) = error.scim_type() {
        document["scimType"] = Value::from(scim_type);
    }
    document
}
