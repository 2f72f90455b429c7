//! Identity synchronization: turns canonical SCIM User attributes into writes
//! across member identities, underlying accounts and the manager-derived group
//! graph.
//!
//! Every provisioning request runs in one [`StoreTransaction`]: the account,
//! the member and all group/membership side effects are committed together or
//! not at all.
//!
//! # Manager side effects
//!
//! When the attributes carry a `manager` value `M`:
//!
//! 1. the tenant's group named `M` is fetched, or created when absent (a
//!    concurrent creator winning the race is treated as "already exists")
//! 2. the member gets the `member` role in that group unless it already holds
//!    `manager` there
//! 3. `member`-role memberships in other groups are removed, so a member has a
//!    single manager at a time
//! 4. when step 1 created the group and another member's external id is `M`,
//!    that member becomes the group's manager
//!
//! Independently, a member whose own external id names an existing group is
//! promoted to `manager` in that group. Roles only escalate; nothing here
//! demotes a manager.
//!
//! # Example Usage
//!
//! ```rust
//! use scim_provisioning::config::TenantSettings;
//! use scim_provisioning::normalizer::AttributeNormalizer;
//! use scim_provisioning::schema::SchemaRegistry;
//! use scim_provisioning::storage::InMemoryIdentityStore;
//! use scim_provisioning::synchronizer::IdentitySynchronizer;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(SchemaRegistry::new()?);
//! let sync = IdentitySynchronizer::new(InMemoryIdentityStore::new(), Arc::clone(&registry));
//! let tenant = TenantSettings::new("acme").with_default_role("viewer");
//!
//! let attrs = AttributeNormalizer::new(&registry).normalize(&json!({
//!     "userName": "bjensen@example.com",
//!     "externalId": "bjensen",
//!     "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"manager": "krbs"}
//! }));
//! let user = sync.create_user(&tenant, &attrs).await?;
//! assert_eq!(user.manager.as_deref(), Some("krbs"));
//! # Ok(())
//! # }
//! ```

use crate::config::TenantSettings;
use crate::error::{ScimError, ScimResult};
use crate::filter::Filter;
use crate::model::{
    GroupId, GroupMembership, MemberId, MemberIdentity, MembershipRole, ScimUser,
    UnderlyingAccount,
};
use crate::normalizer::CanonicalAttributes;
use crate::patch::{PatchEngine, PatchRequest};
use crate::schema::{SchemaRegistry, paths};
use crate::storage::{IdentityStore, StoreTransaction};
use chrono::Utc;
use log::{debug, info, trace};
use std::sync::Arc;

/// One page of a user listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPage {
    /// Number of users matching the filter, across all pages
    pub total_results: usize,
    /// 1-based index of the first user in `users`
    pub start_index: usize,
    pub users: Vec<ScimUser>,
}

/// Provisioning core, generic over the persistence backend.
#[derive(Debug, Clone)]
pub struct IdentitySynchronizer<S: IdentityStore> {
    store: S,
    registry: Arc<SchemaRegistry>,
}

impl<S: IdentityStore> IdentitySynchronizer<S> {
    pub fn new(store: S, registry: Arc<SchemaRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Provision a new member from canonical attributes (`POST /Users`).
    pub async fn create_user(
        &self,
        tenant: &TenantSettings,
        attrs: &CanonicalAttributes,
    ) -> ScimResult<ScimUser> {
        let role = tenant.require_default_role()?;
        let user_name = required_user_name(attrs)?;
        let tenant_id = tenant.tenant_id.as_str();

        let mut tx = self.store.begin().await?;

        let account = resolve_account(&mut tx, tenant, user_name, attrs).await?;
        if tx.find_member_by_account(tenant_id, account.id).await?.is_some() {
            return Err(ScimError::conflict(paths::USER_NAME, user_name));
        }

        let external_id = attrs.get_str(paths::EXTERNAL_ID);
        if let Some(external_id) = external_id {
            if tx
                .find_member_by_external_id(tenant_id, external_id)
                .await?
                .is_some()
            {
                return Err(ScimError::conflict(paths::EXTERNAL_ID, external_id));
            }
        }

        let mut member = MemberIdentity::new(tenant_id, account.id, role);
        member.external_id = external_id.map(str::to_string);
        member.display_name = display_name(attrs);
        member.manager = attrs.get_str(paths::MANAGER).map(str::to_string);
        member.active = attrs.get_bool(paths::ACTIVE).unwrap_or(true);
        let member = tx.insert_member(member).await?;

        let manager = sync_groups(&mut tx, &member, attrs.get_str(paths::MANAGER)).await?;
        tx.commit().await?;

        info!(
            "Provisioned member {} ({}) in tenant '{}'",
            member.id, account.email, tenant_id
        );
        Ok(ScimUser {
            member,
            account,
            manager,
        })
    }

    /// Fetch one member by its SCIM id.
    pub async fn get_user(&self, tenant: &TenantSettings, id: &str) -> ScimResult<ScimUser> {
        let mut tx = self.store.begin().await?;
        load_user(&mut tx, &tenant.tenant_id, id).await
    }

    /// List the tenant's members, oldest first, optionally filtered.
    ///
    /// `start_index` is 1-based; values below 1 are treated as 1. `count` is
    /// capped by the caller.
    pub async fn list_users(
        &self,
        tenant: &TenantSettings,
        filter: Option<&Filter>,
        start_index: usize,
        count: usize,
    ) -> ScimResult<UserPage> {
        let tenant_id = tenant.tenant_id.as_str();
        let mut tx = self.store.begin().await?;

        let mut matching = Vec::new();
        for member in tx.list_members(tenant_id).await? {
            let user = join_user(&mut tx, member).await?;
            let keep = filter.is_none_or(|f| f.matches(&user.to_canonical()));
            if keep {
                matching.push(user);
            } else {
                trace!("Member {} does not match filter", user.member.id);
            }
        }

        let start_index = start_index.max(1);
        let total_results = matching.len();
        let users = matching
            .into_iter()
            .skip(start_index - 1)
            .take(count)
            .collect();

        Ok(UserPage {
            total_results,
            start_index,
            users,
        })
    }

    /// Replace a member's mutable attributes (`PUT /Users/{id}`).
    ///
    /// Optional attributes absent from `attrs` are cleared; `manager` absence
    /// leaves existing group relationships untouched.
    pub async fn replace_user(
        &self,
        tenant: &TenantSettings,
        id: &str,
        attrs: &CanonicalAttributes,
    ) -> ScimResult<ScimUser> {
        tenant.require_default_role()?;
        let mut tx = self.store.begin().await?;
        let current = load_user(&mut tx, &tenant.tenant_id, id).await?;
        let updated = write_update(&mut tx, tenant, current, attrs).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Apply a PATCH request to a member (`PATCH /Users/{id}`).
    ///
    /// The operations run against the member's current canonical view and the
    /// merged result goes through the same update path as a PUT.
    pub async fn patch_user(
        &self,
        tenant: &TenantSettings,
        id: &str,
        request: &PatchRequest,
    ) -> ScimResult<ScimUser> {
        tenant.require_default_role()?;
        let mut tx = self.store.begin().await?;
        let current = load_user(&mut tx, &tenant.tenant_id, id).await?;
        let mut base = current.to_canonical();
        // name.formatted mirrors displayName and would shadow a patched displayName
        base.remove(paths::NAME_FORMATTED);
        let merged = PatchEngine::new(&self.registry).apply(base, request);
        let updated = write_update(&mut tx, tenant, current, &merged).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Remove a member and its group memberships (`DELETE /Users/{id}`).
    pub async fn delete_user(&self, tenant: &TenantSettings, id: &str) -> ScimResult<()> {
        let tenant_id = tenant.tenant_id.as_str();
        let member_id = parse_member_id(id)?;

        let mut tx = self.store.begin().await?;
        if !tx.delete_member(tenant_id, member_id).await? {
            return Err(ScimError::resource_not_found("User", id));
        }
        tx.commit().await?;

        info!("Deleted member {} from tenant '{}'", member_id, tenant_id);
        Ok(())
    }
}

fn required_user_name(attrs: &CanonicalAttributes) -> ScimResult<&str> {
    attrs
        .get_str(paths::USER_NAME)
        .ok_or_else(|| ScimError::invalid_request("userName is required"))
}

/// `name.formatted` wins over `displayName`.
fn display_name(attrs: &CanonicalAttributes) -> Option<String> {
    attrs
        .get_str(paths::NAME_FORMATTED)
        .or_else(|| attrs.get_str(paths::DISPLAY_NAME))
        .map(str::to_string)
}

fn parse_member_id(id: &str) -> ScimResult<MemberId> {
    MemberId::parse(id).ok_or_else(|| ScimError::resource_not_found("User", id))
}

/// Look up the account for `email`, creating it with the supplied name and
/// the supplied or tenant default preferences when absent.
async fn resolve_account<T: StoreTransaction>(
    tx: &mut T,
    tenant: &TenantSettings,
    email: &str,
    attrs: &CanonicalAttributes,
) -> ScimResult<UnderlyingAccount> {
    if let Some(account) = tx.find_account_by_email(email).await? {
        debug!("Reusing account {} for '{}'", account.id, email);
        return Ok(account);
    }

    let locale = attrs
        .get_str(paths::LOCALE)
        .unwrap_or(&tenant.default_locale);
    let timezone = attrs
        .get_str(paths::TIMEZONE)
        .unwrap_or(&tenant.default_timezone);
    let mut account = UnderlyingAccount::new(email, locale, timezone);
    account.name = display_name(attrs);
    let account = tx.insert_account(account).await?;
    info!("Created account {} for '{}'", account.id, email);
    Ok(account)
}

async fn load_user<T: StoreTransaction>(
    tx: &mut T,
    tenant_id: &str,
    id: &str,
) -> ScimResult<ScimUser> {
    let member_id = parse_member_id(id)?;
    let member = tx
        .get_member(tenant_id, member_id)
        .await?
        .ok_or_else(|| ScimError::resource_not_found("User", id))?;
    join_user(tx, member).await
}

async fn join_user<T: StoreTransaction>(
    tx: &mut T,
    member: MemberIdentity,
) -> ScimResult<ScimUser> {
    let account = tx.get_account(member.account_id).await?.ok_or_else(|| {
        ScimError::internal(format!(
            "member {} references missing account {}",
            member.id, member.account_id
        ))
    })?;
    let manager = manager_of(tx, &member).await?;
    Ok(ScimUser {
        member,
        account,
        manager,
    })
}

/// Name of the group the member reports to.
///
/// That is the group it belongs to with the `member` role or, once that
/// membership was escalated to `manager`, the group named by its last
/// `manager` value as long as it still belongs to it.
async fn manager_of<T: StoreTransaction>(
    tx: &mut T,
    member: &MemberIdentity,
) -> ScimResult<Option<String>> {
    let tenant_id = member.tenant_id.as_str();
    let memberships = tx.memberships_for_member(member.id).await?;
    for membership in &memberships {
        if membership.role != MembershipRole::Member {
            continue;
        }
        if let Some(group) = tx.get_group(tenant_id, membership.group_id).await? {
            return Ok(Some(group.name));
        }
    }

    let Some(name) = member.manager.as_deref() else {
        return Ok(None);
    };
    match tx.find_group_by_name(tenant_id, name).await? {
        Some(group) if memberships.iter().any(|m| m.group_id == group.id) => Ok(Some(group.name)),
        _ => Ok(None),
    }
}

async fn write_update<T: StoreTransaction>(
    tx: &mut T,
    tenant: &TenantSettings,
    current: ScimUser,
    attrs: &CanonicalAttributes,
) -> ScimResult<ScimUser> {
    let tenant_id = tenant.tenant_id.as_str();
    let user_name = required_user_name(attrs)?;
    let ScimUser {
        mut member,
        mut account,
        ..
    } = current;

    if !account.email.eq_ignore_ascii_case(user_name) {
        let target = resolve_account(tx, tenant, user_name, attrs).await?;
        if let Some(other) = tx.find_member_by_account(tenant_id, target.id).await? {
            if other.id != member.id {
                return Err(ScimError::conflict(paths::USER_NAME, user_name));
            }
        }
        debug!(
            "Member {} moves from account {} to {}",
            member.id, account.id, target.id
        );
        member.account_id = target.id;
        account = target;
    }

    let name = display_name(attrs);
    let locale = attrs.get_str(paths::LOCALE);
    let timezone = attrs.get_str(paths::TIMEZONE);
    let account_changed = name.as_ref().is_some_and(|n| Some(n) != account.name.as_ref())
        || locale.is_some_and(|l| l != account.locale)
        || timezone.is_some_and(|t| t != account.timezone);
    if account_changed {
        if name.is_some() {
            account.name = name.clone();
        }
        if let Some(locale) = locale {
            account.locale = locale.to_string();
        }
        if let Some(timezone) = timezone {
            account.timezone = timezone.to_string();
        }
        account.last_modified = Utc::now();
        account = tx.update_account(account).await?;
    }

    let external_id = attrs.get_str(paths::EXTERNAL_ID);
    if let Some(external_id) = external_id {
        if let Some(other) = tx.find_member_by_external_id(tenant_id, external_id).await? {
            if other.id != member.id {
                return Err(ScimError::conflict(paths::EXTERNAL_ID, external_id));
            }
        }
    }

    member.external_id = external_id.map(str::to_string);
    member.display_name = name;
    if let Some(manager) = attrs.get_str(paths::MANAGER) {
        member.manager = Some(manager.to_string());
    }
    member.active = attrs.get_bool(paths::ACTIVE).unwrap_or(true);
    member.last_modified = Utc::now();
    let member = tx.update_member(member).await?;

    let manager = sync_groups(tx, &member, attrs.get_str(paths::MANAGER)).await?;

    info!("Updated member {} in tenant '{}'", member.id, tenant_id);
    Ok(ScimUser {
        member,
        account,
        manager,
    })
}

/// Apply the manager side effect and self-promotion for `member`, returning
/// its manager relationship afterwards.
async fn sync_groups<T: StoreTransaction>(
    tx: &mut T,
    member: &MemberIdentity,
    manager: Option<&str>,
) -> ScimResult<Option<String>> {
    let tenant_id = member.tenant_id.as_str();

    if let Some(manager) = manager {
        let (group, created) = tx.create_group_or_fetch(tenant_id, manager).await?;
        if created {
            info!("Created group '{}' in tenant '{}'", group.name, tenant_id);
            if let Some(owner) = tx.find_member_by_external_id(tenant_id, manager).await? {
                ensure_role(tx, group.id, owner.id, MembershipRole::Manager).await?;
            }
        }

        ensure_role(tx, group.id, member.id, MembershipRole::Member).await?;

        for stale in tx.memberships_for_member(member.id).await? {
            if stale.group_id != group.id && stale.role == MembershipRole::Member {
                tx.delete_membership(stale.group_id, member.id).await?;
                debug!(
                    "Removed member {} from previous manager group {}",
                    member.id, stale.group_id
                );
            }
        }
    }

    if let Some(external_id) = member.external_id.as_deref() {
        if let Some(group) = tx.find_group_by_name(tenant_id, external_id).await? {
            ensure_role(tx, group.id, member.id, MembershipRole::Manager).await?;
        }
    }

    manager_of(tx, member).await
}

/// Give `member_id` at least `role` in the group. Existing roles are never
/// lowered.
async fn ensure_role<T: StoreTransaction>(
    tx: &mut T,
    group_id: GroupId,
    member_id: MemberId,
    role: MembershipRole,
) -> ScimResult<()> {
    let existing = tx.get_membership(group_id, member_id).await?;
    if existing.is_some_and(|m| m.role >= role) {
        trace!(
            "Member {} already holds {} or higher in group {}",
            member_id, role, group_id
        );
        return Ok(());
    }

    tx.put_membership(GroupMembership {
        group_id,
        member_id,
        role,
    })
    .await?;
    if role == MembershipRole::Manager {
        info!("Member {} is now manager of group {}", member_id, group_id);
    } else {
        debug!("Member {} joined group {} as {}", member_id, group_id, role);
    }
    Ok(())
}
