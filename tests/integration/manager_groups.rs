//! Group derivation from the Enterprise `manager` attribute.

use crate::common::*;
use scim_provisioning::endpoint::{HttpMethod, ScimEndpoint};
use scim_provisioning::model::{MemberId, MembershipRole};
use scim_provisioning::storage::{IdentityStore, InMemoryIdentityStore, StoreTransaction};
use serde_json::json;

async fn role_in(
    endpoint: &ScimEndpoint<InMemoryIdentityStore>,
    group: &str,
    member_id: &str,
) -> Option<MembershipRole> {
    let member_id = MemberId::parse(member_id)?;
    let mut tx = endpoint.synchronizer().store().begin().await.ok()?;
    let group = tx.find_group_by_name(TENANT, group).await.ok()??;
    tx.get_membership(group.id, member_id)
        .await
        .ok()?
        .map(|m| m.role)
}

#[tokio::test]
async fn test_repeat_provisioning_is_idempotent() {
    let endpoint = create_endpoint();
    let created = create_user(&endpoint, "b@example.com", "bj", Some("krbs")).await;
    let path = format!("/Users/{}", resource_id(&created));

    for _ in 0..3 {
        let response = endpoint
            .handle(
                request(HttpMethod::Put, &path)
                    .with_json_body(&user_payload("b@example.com", "bj", Some("krbs"))),
            )
            .await;
        assert_eq!(response.status, 200);
    }

    let stats = endpoint.synchronizer().store().stats().await;
    assert_eq!(stats.groups, 1);
    assert_eq!(stats.memberships, 1);
}

#[tokio::test]
async fn test_manager_as_reference_object() {
    let endpoint = create_endpoint();
    let response = endpoint
        .handle(request(HttpMethod::Post, "/Users").with_json_body(&json!({
            "userName": "b@example.com",
            "URN:IETF:PARAMS:SCIM:SCHEMAS:EXTENSION:ENTERPRISE:2.0:USER": {
                "Manager": {"value": "krbs", "displayName": "K. R. B. S."}
            }
        })))
        .await;

    assert_eq!(response.status, 201);
    assert_eq!(body(&response)[ENTERPRISE]["manager"], "krbs");
}

#[tokio::test]
async fn test_promotion_is_monotonic() {
    let endpoint = create_endpoint();
    let x = create_user(&endpoint, "x@example.com", "x", Some("G")).await;
    let id = resource_id(&x).to_string();
    assert_eq!(role_in(&endpoint, "G", &id).await, Some(MembershipRole::Member));

    // X's external id now equals the existing group's name
    let response = endpoint
        .handle(
            request(HttpMethod::Patch, &format!("/Users/{}", id)).with_json_body(&patch_payload(
                json!([{"op": "replace", "path": "externalId", "value": "G"}]),
            )),
        )
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(role_in(&endpoint, "G", &id).await, Some(MembershipRole::Manager));
    // still reports to "G" after the escalation
    assert_eq!(body(&response)[ENTERPRISE]["manager"], "G");

    // a later update that does not touch manager keeps the role
    let response = endpoint
        .handle(
            request(HttpMethod::Patch, &format!("/Users/{}", id)).with_json_body(&patch_payload(
                json!([{"op": "replace", "path": "displayName", "value": "Boss"}]),
            )),
        )
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(role_in(&endpoint, "G", &id).await, Some(MembershipRole::Manager));
}

#[tokio::test]
async fn test_manager_provisioned_after_reports_is_promoted() {
    let endpoint = create_endpoint();
    let report = create_user(&endpoint, "r@example.com", "r", Some("krbs")).await;
    let boss = create_user(&endpoint, "k@example.com", "krbs", None).await;

    assert_eq!(
        role_in(&endpoint, "krbs", resource_id(&boss)).await,
        Some(MembershipRole::Manager)
    );
    assert_eq!(
        role_in(&endpoint, "krbs", resource_id(&report)).await,
        Some(MembershipRole::Member)
    );
    // being a manager is not a manager relationship of one's own
    assert_eq!(boss["schemas"], json!([CORE_USER]));
}

#[tokio::test]
async fn test_manager_provisioned_before_reports_is_back_filled() {
    let endpoint = create_endpoint();
    let boss = create_user(&endpoint, "k@example.com", "krbs", None).await;
    create_user(&endpoint, "r@example.com", "r", Some("krbs")).await;

    assert_eq!(
        role_in(&endpoint, "krbs", resource_id(&boss)).await,
        Some(MembershipRole::Manager)
    );
}

#[tokio::test]
async fn test_manager_change_moves_membership() {
    let endpoint = create_endpoint();
    let user = create_user(&endpoint, "b@example.com", "bj", Some("old")).await;
    let id = resource_id(&user).to_string();

    let response = endpoint
        .handle(
            request(HttpMethod::Put, &format!("/Users/{}", id))
                .with_json_body(&user_payload("b@example.com", "bj", Some("new"))),
        )
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response)[ENTERPRISE]["manager"], "new");
    assert_eq!(role_in(&endpoint, "old", &id).await, None);
    assert_eq!(role_in(&endpoint, "new", &id).await, Some(MembershipRole::Member));
}

#[tokio::test]
async fn test_omitted_manager_keeps_relationship() {
    let endpoint = create_endpoint();
    let user = create_user(&endpoint, "b@example.com", "bj", Some("krbs")).await;
    let path = format!("/Users/{}", resource_id(&user));

    let response = endpoint
        .handle(
            request(HttpMethod::Put, &path)
                .with_json_body(&user_payload("b@example.com", "bj", None)),
        )
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(body(&response)[ENTERPRISE]["manager"], "krbs");
}

#[tokio::test]
async fn test_extension_appears_after_manager_is_patched_in() {
    let endpoint = create_endpoint();
    let user = create_user(&endpoint, "b@example.com", "bj", None).await;
    let path = format!("/Users/{}", resource_id(&user));
    assert_eq!(user["schemas"], json!([CORE_USER]));
    assert!(user.get(ENTERPRISE).is_none());

    let response = endpoint
        .handle(request(HttpMethod::Patch, &path).with_json_body(&patch_payload(json!([{
            "op": "add",
            "path": "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager",
            "value": "krbs"
        }]))))
        .await;
    assert_eq!(response.status, 200);

    let response = endpoint.handle(request(HttpMethod::Get, &path)).await;
    let resource = body(&response);
    assert_eq!(resource["schemas"], json!([CORE_USER, ENTERPRISE]));
    assert_eq!(resource[ENTERPRISE]["manager"], "krbs");

    let response = endpoint.handle(request(HttpMethod::Get, "/Users")).await;
    assert_eq!(
        body(&response)["Resources"][0]["schemas"],
        json!([CORE_USER, ENTERPRISE])
    );
}
