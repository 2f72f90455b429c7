//! PATCH requests as identity providers send them.

use crate::common::*;
use scim_provisioning::endpoint::HttpMethod;
use serde_json::json;

#[tokio::test]
async fn test_last_write_wins_within_one_request() {
    let endpoint = create_endpoint();
    let user = create_user(&endpoint, "b@example.com", "bj", None).await;

    let response = endpoint
        .handle(
            request(HttpMethod::Patch, &format!("/Users/{}", resource_id(&user))).with_json_body(
                &patch_payload(json!([
                    {"op": "replace", "path": "locale", "value": "nl_NL"},
                    {"op": "replace", "path": "locale", "value": "en"}
                ])),
            ),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["locale"], "en");
}

#[tokio::test]
async fn test_bulk_replace_with_mixed_case_keys() {
    let endpoint = create_endpoint();
    let user = create_user(&endpoint, "b@example.com", "bj", None).await;

    // the shape Azure AD sends for deprovisioning
    let response = endpoint
        .handle(
            request(HttpMethod::Patch, &format!("/Users/{}", resource_id(&user))).with_json_body(
                &json!({
                    "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
                    "Operations": [{"op": "Replace", "value": {"ACTIVE": "False", "DisplayName": "Gone"}}]
                }),
            ),
        )
        .await;

    assert_eq!(response.status, 200);
    let resource = body(&response);
    assert_eq!(resource["active"], json!(false));
    assert_eq!(resource["displayName"], "Gone");
    assert_eq!(resource["name"]["formatted"], "Gone");
    assert_eq!(resource["userName"], "b@example.com");
    assert_eq!(resource["externalId"], "bj");
}

#[tokio::test]
async fn test_patch_name_formatted_path() {
    let endpoint = create_endpoint();
    let user = create_user(&endpoint, "b@example.com", "bj", None).await;

    let response = endpoint
        .handle(
            request(HttpMethod::Patch, &format!("/Users/{}", resource_id(&user))).with_json_body(
                &patch_payload(json!([
                    {"op": "replace", "path": "NAME.FORMATTED", "value": "Barbara Jensen"}
                ])),
            ),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["displayName"], "Barbara Jensen");
}

#[tokio::test]
async fn test_remove_is_rejected_without_partial_application() {
    let endpoint = create_endpoint();
    let user = create_user(&endpoint, "b@example.com", "bj", None).await;
    let path = format!("/Users/{}", resource_id(&user));

    let response = endpoint
        .handle(request(HttpMethod::Patch, &path).with_json_body(&patch_payload(json!([
            {"op": "replace", "path": "locale", "value": "nl_NL"},
            {"op": "remove", "path": "displayName"}
        ]))))
        .await;
    assert_scim_error(&response, 400, None);

    let response = endpoint.handle(request(HttpMethod::Get, &path)).await;
    assert_eq!(body(&response)["locale"], "en_US");
    assert_eq!(body(&response)["displayName"], "User bj");
}

#[tokio::test]
async fn test_patch_unknown_user_is_not_found() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(
            request(HttpMethod::Patch, "/Users/6f1e4c1a-8e43-4d4a-9a4f-1b2c3d4e5f60")
                .with_json_body(&patch_payload(json!([
                    {"op": "replace", "path": "locale", "value": "en"}
                ]))),
        )
        .await;
    assert_scim_error(&response, 404, None);
}

#[tokio::test]
async fn test_patch_read_only_attributes_are_ignored() {
    let endpoint = create_endpoint();
    let user = create_user(&endpoint, "b@example.com", "bj", None).await;
    let id = resource_id(&user);

    let response = endpoint
        .handle(
            request(HttpMethod::Patch, &format!("/Users/{}", id)).with_json_body(&patch_payload(
                json!([
                    {"op": "replace", "path": "id", "value": "hijacked"},
                    {"op": "replace", "path": "meta.created", "value": "2001-01-01T00:00:00Z"}
                ]),
            )),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(body(&response)["id"], id);
    assert_eq!(body(&response)["meta"]["created"], user["meta"]["created"]);
}
