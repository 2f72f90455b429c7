//! Tenant resolution and bearer token checks, which run before anything else.

use crate::common::*;
use scim_provisioning::auth::TenantAuthenticator;
use scim_provisioning::endpoint::{HttpMethod, ScimEndpoint, ScimRequest};
use scim_provisioning::error::{ScimError, ScimResult};
use scim_provisioning::storage::InMemoryIdentityStore;
use serde_json::json;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(ScimRequest::new(HttpMethod::Get, "/acme/Users"))
        .await;
    assert_scim_error(&response, 401, None);
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized_even_for_writes() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(
            ScimRequest::new(HttpMethod::Post, "/acme/Users")
                .with_authorization("Bearer initech-token")
                .with_json_body(&user_payload("b@example.com", "bj", None)),
        )
        .await;
    assert_scim_error(&response, 401, None);
    assert_eq!(endpoint.synchronizer().store().stats().await.members, 0);
}

#[tokio::test]
async fn test_authorization_header_is_accepted() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(
            ScimRequest::new(HttpMethod::Get, "/acme/ServiceProviderConfig")
                .with_authorization("bearer acme-token"),
        )
        .await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_unknown_tenant_is_not_found() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(ScimRequest::new(HttpMethod::Get, "/globex/Users").with_bearer_token(TOKEN))
        .await;
    assert_scim_error(&response, 404, None);
}

#[tokio::test]
async fn test_unknown_endpoint_is_not_found() {
    let endpoint = create_endpoint();
    let response = endpoint.handle(request(HttpMethod::Get, "/Groups")).await;
    assert_scim_error(&response, 404, None);
}

/// Admits everything; tenant lookup still applies.
struct AllowAll;

impl TenantAuthenticator for AllowAll {
    async fn authenticate(&self, _tenant_id: &str, _bearer_token: Option<&str>) -> ScimResult<()> {
        Ok(())
    }
}

/// Rejects everything.
struct DenyAll;

impl TenantAuthenticator for DenyAll {
    async fn authenticate(&self, tenant_id: &str, _bearer_token: Option<&str>) -> ScimResult<()> {
        Err(ScimError::unauthorized(format!("tenant {} is locked", tenant_id)))
    }
}

#[tokio::test]
async fn test_custom_authenticator_is_used() {
    init_logging();
    let open = ScimEndpoint::with_authenticator(test_config(), InMemoryIdentityStore::new(), AllowAll)
        .expect("Failed to create endpoint");
    let response = open
        .handle(ScimRequest::new(HttpMethod::Get, "/acme/Users"))
        .await;
    assert_eq!(response.status, 200);

    // configuration is still consulted for the tenant itself
    let response = open
        .handle(ScimRequest::new(HttpMethod::Get, "/globex/Users"))
        .await;
    assert_scim_error(&response, 404, None);

    let locked = ScimEndpoint::with_authenticator(test_config(), InMemoryIdentityStore::new(), DenyAll)
        .expect("Failed to create endpoint");
    let response = locked.handle(request(HttpMethod::Get, "/Users")).await;
    assert_scim_error(&response, 401, None);
    assert!(body(&response)["detail"].as_str().unwrap().contains("locked"));
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let endpoint = create_endpoint();
    let created = create_user(&endpoint, "b@example.com", "bj", None).await;
    let id = resource_id(&created);

    let response = endpoint
        .handle(
            ScimRequest::new(HttpMethod::Get, format!("/initech/Users/{}", id))
                .with_bearer_token("initech-token"),
        )
        .await;
    assert_scim_error(&response, 404, None);

    let response = endpoint
        .handle(
            ScimRequest::new(HttpMethod::Get, "/initech/Users").with_bearer_token("initech-token"),
        )
        .await;
    assert_eq!(body(&response)["totalResults"], json!(0));
}
