//! User lifecycle over the endpoint: create, read, replace, delete.

use crate::common::*;
use scim_provisioning::endpoint::{HttpMethod, ScimRequest};
use serde_json::json;

#[tokio::test]
async fn test_create_returns_resource_and_location() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(
            request(HttpMethod::Post, "/Users")
                .with_json_body(&user_payload("bjensen@example.com", "bjensen", None)),
        )
        .await;

    assert_eq!(response.status, 201);
    let resource = body(&response);
    let id = resource_id(resource);
    let location = format!("{}/acme/Users/{}", BASE_URL, id);
    assert_eq!(response.header("Location"), Some(location.as_str()));
    assert_eq!(resource["meta"]["location"], location);
    assert_eq!(resource["meta"]["resourceType"], "User");
    assert_eq!(resource["userName"], "bjensen@example.com");
    assert_eq!(resource["externalId"], "bjensen");
    assert_eq!(resource["name"]["formatted"], "User bjensen");
    assert_eq!(resource["displayName"], "User bjensen");
    assert_eq!(resource["locale"], "en_US");
    assert_eq!(resource["timezone"], "UTC");
    assert_eq!(resource["active"], json!(true));
    assert_eq!(resource["schemas"], json!([CORE_USER]));
}

#[tokio::test]
async fn test_get_round_trip() {
    let endpoint = create_endpoint();
    let created = create_user(&endpoint, "b@example.com", "bj", None).await;

    let response = endpoint
        .handle(request(HttpMethod::Get, &format!("/Users/{}", resource_id(&created))))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response), &created);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let endpoint = create_endpoint();
    for path in [
        "/Users/does-not-exist",
        "/Users/6f1e4c1a-8e43-4d4a-9a4f-1b2c3d4e5f60",
    ] {
        let response = endpoint.handle(request(HttpMethod::Get, path)).await;
        assert_scim_error(&response, 404, None);
    }
}

#[tokio::test]
async fn test_missing_role_is_a_configuration_error() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(
            ScimRequest::new(HttpMethod::Post, "/unconfigured/Users")
                .with_bearer_token("unconfigured-token")
                .with_json_body(&user_payload("b@example.com", "bj", Some("krbs"))),
        )
        .await;

    assert_eq!(response.status, 400);
    assert!(body(&response)["detail"]
        .as_str()
        .unwrap()
        .contains("default role"));
    let stats = endpoint.synchronizer().store().stats().await;
    assert_eq!((stats.accounts, stats.members, stats.groups), (0, 0, 0));
}

#[tokio::test]
async fn test_duplicate_external_id_conflicts() {
    let endpoint = create_endpoint();
    create_user(&endpoint, "a@example.com", "dup", None).await;

    let response = endpoint
        .handle(
            request(HttpMethod::Post, "/Users")
                .with_json_body(&user_payload("b@example.com", "dup", None)),
        )
        .await;
    assert_scim_error(&response, 409, Some("uniqueness"));
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let endpoint = create_endpoint();

    let response = endpoint
        .handle(request(HttpMethod::Post, "/Users").with_body("not json"))
        .await;
    assert_scim_error(&response, 400, Some("invalidSyntax"));

    let response = endpoint
        .handle(request(HttpMethod::Post, "/Users").with_json_body(&json!(["a"])))
        .await;
    assert_scim_error(&response, 400, Some("invalidSyntax"));

    let response = endpoint
        .handle(request(HttpMethod::Post, "/Users").with_json_body(&json!({"externalId": "x"})))
        .await;
    assert_scim_error(&response, 400, Some("invalidValue"));

    let response = endpoint.handle(request(HttpMethod::Post, "/Users")).await;
    assert_scim_error(&response, 400, Some("invalidValue"));
}

#[tokio::test]
async fn test_put_replaces_mutable_attributes() {
    let endpoint = create_endpoint();
    let created = create_user(&endpoint, "b@example.com", "bj", None).await;
    let id = resource_id(&created);

    let response = endpoint
        .handle(request(HttpMethod::Put, &format!("/Users/{}", id)).with_json_body(&json!({
            "schemas": [CORE_USER],
            "id": "ignored",
            "userName": "b@example.com",
            "externalId": "bj",
            "displayName": "Babs",
            "locale": "nl_NL",
            "timezone": "Europe/Amsterdam",
            "active": "false"
        })))
        .await;

    assert_eq!(response.status, 200);
    let resource = body(&response);
    assert_eq!(resource["id"], id);
    assert_eq!(resource["displayName"], "Babs");
    assert_eq!(resource["locale"], "nl_NL");
    assert_eq!(resource["timezone"], "Europe/Amsterdam");
    assert_eq!(resource["active"], json!(false));
    assert_eq!(resource["meta"]["created"], created["meta"]["created"]);
}

#[tokio::test]
async fn test_put_unknown_user_is_not_found() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(
            request(HttpMethod::Put, "/Users/6f1e4c1a-8e43-4d4a-9a4f-1b2c3d4e5f60")
                .with_json_body(&user_payload("b@example.com", "bj", None)),
        )
        .await;
    assert_scim_error(&response, 404, None);
}

#[tokio::test]
async fn test_delete_user() {
    let endpoint = create_endpoint();
    let created = create_user(&endpoint, "b@example.com", "bj", Some("krbs")).await;
    let path = format!("/Users/{}", resource_id(&created));

    let response = endpoint.handle(request(HttpMethod::Delete, &path)).await;
    assert_eq!(response.status, 204);
    assert!(response.body.is_none());

    let response = endpoint.handle(request(HttpMethod::Get, &path)).await;
    assert_scim_error(&response, 404, None);
    let response = endpoint.handle(request(HttpMethod::Delete, &path)).await;
    assert_scim_error(&response, 404, None);

    let stats = endpoint.synchronizer().store().stats().await;
    assert_eq!(stats.memberships, 0);
    assert_eq!(stats.groups, 1);
}

#[tokio::test]
async fn test_same_account_in_two_tenants() {
    let endpoint = create_endpoint();
    create_user(&endpoint, "shared@example.com", "s", None).await;

    let response = endpoint
        .handle(
            ScimRequest::new(HttpMethod::Post, "/initech/Users")
                .with_bearer_token("initech-token")
                .with_json_body(&user_payload("shared@example.com", "s", None)),
        )
        .await;
    assert_eq!(response.status, 201);

    let stats = endpoint.synchronizer().store().stats().await;
    assert_eq!(stats.accounts, 1);
    assert_eq!(stats.members, 2);
}
