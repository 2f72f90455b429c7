//! Discovery endpoints over HTTP-shaped requests.

use crate::common::*;
use scim_provisioning::endpoint::{HttpMethod, SCIM_CONTENT_TYPE};
use serde_json::json;

#[tokio::test]
async fn test_service_provider_config() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(request(HttpMethod::Get, "/ServiceProviderConfig"))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some(SCIM_CONTENT_TYPE));
    let doc = body(&response);
    assert_eq!(doc["patch"]["supported"], json!(true));
    assert_eq!(doc["bulk"]["supported"], json!(false));
    assert_eq!(doc["filter"]["supported"], json!(false));
    assert_eq!(doc["sort"]["supported"], json!(false));
    assert_eq!(doc["etag"]["supported"], json!(false));
    assert_eq!(doc["changePassword"]["supported"], json!(false));
}

#[tokio::test]
async fn test_schemas_collection_and_lookup() {
    let endpoint = create_endpoint();

    let response = endpoint.handle(request(HttpMethod::Get, "/Schemas")).await;
    assert_eq!(response.status, 200);
    let doc = body(&response);
    assert_eq!(doc["totalResults"], json!(2));
    let ids: Vec<&str> = doc["Resources"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["id"].as_str())
        .collect();
    assert_eq!(ids, vec![CORE_USER, ENTERPRISE]);

    let response = endpoint
        .handle(request(
            HttpMethod::Get,
            "/Schemas/urn:ietf:params:scim:schemas:extension:enterprise:2.0:user",
        ))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["id"], ENTERPRISE);
    assert_eq!(
        body(&response)["meta"]["location"],
        format!("{}/acme/Schemas/{}", BASE_URL, ENTERPRISE)
    );
}

#[tokio::test]
async fn test_unknown_schema_is_not_found() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(request(HttpMethod::Get, "/Schemas/urn:example:params:scim:schemas:Unknown"))
        .await;
    assert_scim_error(&response, 404, None);
}

#[tokio::test]
async fn test_resource_types() {
    let endpoint = create_endpoint();

    let response = endpoint.handle(request(HttpMethod::Get, "/ResourceTypes")).await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["Resources"][0]["name"], "User");

    let response = endpoint
        .handle(request(HttpMethod::Get, "/resourcetypes/USER"))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["endpoint"], "/Users");
    assert_eq!(body(&response)["schemaExtensions"][0]["schema"], ENTERPRISE);

    let response = endpoint
        .handle(request(HttpMethod::Get, "/ResourceTypes/Group"))
        .await;
    assert_scim_error(&response, 404, None);
}

#[tokio::test]
async fn test_discovery_is_read_only() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(request(HttpMethod::Post, "/Schemas").with_json_body(&json!({})))
        .await;
    assert_scim_error(&response, 400, None);
}
