//! Per-route handlers.

use super::core::{ScimEndpoint, ScimRequest, ScimResponse};
use crate::auth::TenantAuthenticator;
use crate::config::{MAX_PAGE_SIZE, TenantSettings};
use crate::error::{ScimError, ScimResult};
use crate::filter::Filter;
use crate::normalizer::AttributeNormalizer;
use crate::patch::PatchRequest;
use crate::serializer;
use crate::storage::IdentityStore;
use serde_json::{Map, Value};

pub(super) fn service_provider_config<S: IdentityStore, A: TenantAuthenticator>(
    endpoint: &ScimEndpoint<S, A>,
    tenant: &TenantSettings,
) -> ScimResult<ScimResponse> {
    let document = endpoint
        .discovery
        .service_provider_config(&endpoint.config, &tenant.tenant_id)?;
    Ok(ScimResponse::json(200, document))
}

pub(super) fn schemas<S: IdentityStore, A: TenantAuthenticator>(
    endpoint: &ScimEndpoint<S, A>,
    tenant: &TenantSettings,
    urn: Option<&str>,
) -> ScimResult<ScimResponse> {
    let discovery = &endpoint.discovery;
    let document = match urn {
        Some(urn) => discovery.schema(&endpoint.config, &tenant.tenant_id, urn)?,
        None => discovery.schemas(&endpoint.config, &tenant.tenant_id)?,
    };
    Ok(ScimResponse::json(200, document))
}

pub(super) fn resource_types<S: IdentityStore, A: TenantAuthenticator>(
    endpoint: &ScimEndpoint<S, A>,
    tenant: &TenantSettings,
    name: Option<&str>,
) -> ScimResult<ScimResponse> {
    let discovery = &endpoint.discovery;
    let document = match name {
        Some(name) => discovery.resource_type(&endpoint.config, &tenant.tenant_id, name)?,
        None => discovery.resource_types(&endpoint.config, &tenant.tenant_id)?,
    };
    Ok(ScimResponse::json(200, document))
}

pub(super) async fn list_users<S: IdentityStore, A: TenantAuthenticator>(
    endpoint: &ScimEndpoint<S, A>,
    tenant: &TenantSettings,
    request: &ScimRequest,
) -> ScimResult<ScimResponse> {
    let sync = &endpoint.synchronizer;
    let filter = request
        .query_param("filter")
        .map(|expression| Filter::parse(sync.registry(), expression))
        .transpose()?;

    let start_index = integer_param(request, "startIndex")?.map_or(1, |i| i.max(1) as usize);
    let count = integer_param(request, "count")?
        .map_or(MAX_PAGE_SIZE, |c| (c.max(0) as usize).min(MAX_PAGE_SIZE));

    let page = sync
        .list_users(tenant, filter.as_ref(), start_index, count)
        .await?;
    let resources = page
        .users
        .iter()
        .map(|user| serializer::user_resource(&endpoint.config, user))
        .collect();

    Ok(ScimResponse::json(
        200,
        serializer::list_response(resources, page.total_results, page.start_index),
    ))
}

pub(super) async fn get_user<S: IdentityStore, A: TenantAuthenticator>(
    endpoint: &ScimEndpoint<S, A>,
    tenant: &TenantSettings,
    id: &str,
) -> ScimResult<ScimResponse> {
    let user = endpoint.synchronizer.get_user(tenant, id).await?;
    Ok(ScimResponse::json(
        200,
        serializer::user_resource(&endpoint.config, &user),
    ))
}

pub(super) async fn create_user<S: IdentityStore, A: TenantAuthenticator>(
    endpoint: &ScimEndpoint<S, A>,
    tenant: &TenantSettings,
    request: &ScimRequest,
) -> ScimResult<ScimResponse> {
    let sync = &endpoint.synchronizer;
    let body = json_body(request)?;
    let attrs = AttributeNormalizer::new(sync.registry()).normalize(&body);

    let user = sync.create_user(tenant, &attrs).await?;
    let location = endpoint
        .config
        .location(&tenant.tenant_id, "Users", &user.member.id.to_string());
    Ok(
        ScimResponse::json(201, serializer::user_resource(&endpoint.config, &user))
            .with_header("Location", location),
    )
}

pub(super) async fn replace_user<S: IdentityStore, A: TenantAuthenticator>(
    endpoint: &ScimEndpoint<S, A>,
    tenant: &TenantSettings,
    id: &str,
    request: &ScimRequest,
) -> ScimResult<ScimResponse> {
    let sync = &endpoint.synchronizer;
    let body = json_body(request)?;
    let attrs = AttributeNormalizer::new(sync.registry()).normalize(&body);

    let user = sync.replace_user(tenant, id, &attrs).await?;
    Ok(ScimResponse::json(
        200,
        serializer::user_resource(&endpoint.config, &user),
    ))
}

pub(super) async fn patch_user<S: IdentityStore, A: TenantAuthenticator>(
    endpoint: &ScimEndpoint<S, A>,
    tenant: &TenantSettings,
    id: &str,
    request: &ScimRequest,
) -> ScimResult<ScimResponse> {
    let patch = PatchRequest::from_json(&json_body(request)?)?;
    let user = endpoint.synchronizer.patch_user(tenant, id, &patch).await?;
    Ok(ScimResponse::json(
        200,
        serializer::user_resource(&endpoint.config, &user),
    ))
}

pub(super) async fn delete_user<S: IdentityStore, A: TenantAuthenticator>(
    endpoint: &ScimEndpoint<S, A>,
    tenant: &TenantSettings,
    id: &str,
) -> ScimResult<ScimResponse> {
    endpoint.synchronizer.delete_user(tenant, id).await?;
    Ok(ScimResponse::no_content())
}

/// Parse the request body as a JSON object.
fn json_body(request: &ScimRequest) -> ScimResult<Value> {
    let raw = request
        .body
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| ScimError::invalid_request("request body is required"))?;
    let object: Map<String, Value> = serde_json::from_str(raw)?;
    Ok(Value::Object(object))
}

fn integer_param(request: &ScimRequest, name: &str) -> ScimResult<Option<i64>> {
    request
        .query_param(name)
        .map(|raw| {
            raw.trim().parse::<i64>().map_err(|_| {
                ScimError::invalid_request(format!("query parameter '{}' must be an integer", name))
            })
        })
        .transpose()
}
