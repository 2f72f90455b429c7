//! Persistence seam for tenant identity data.
//!
//! The provisioning core needs four primitives, each usable inside one
//! transaction scope: get-by-id, get-by-unique-key, create-or-fetch-on-conflict
//! and update. [`IdentityStore`] hands out [`StoreTransaction`]s exposing them;
//! writes become visible to other transactions only on [`StoreTransaction::commit`],
//! and dropping a transaction without committing discards them.
//!
//! Uniqueness is enforced by the store, not by callers:
//!
//! - account email (case-insensitive)
//! - (tenant, member external id)
//! - (tenant, account), i.e. one member per account per tenant
//! - (tenant, group name)
//! - (group, member) for memberships
//!
//! # Example Usage
//!
//! ```rust
//! use scim_provisioning::storage::{IdentityStore, InMemoryIdentityStore, StoreTransaction};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryIdentityStore::new();
//! let mut tx = store.begin().await?;
//! let (group, created) = tx.create_group_or_fetch("acme", "krbs").await?;
//! assert!(created);
//! tx.commit().await?;
//!
//! let mut tx = store.begin().await?;
//! let (again, created) = tx.create_group_or_fetch("acme", "krbs").await?;
//! assert!(!created);
//! assert_eq!(again.id, group.id);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::{StorageError, StorageResult};
pub use in_memory::{InMemoryIdentityStore, InMemoryStoreStats, InMemoryTransaction};

use crate::model::{
    AccountId, Group, GroupId, GroupMembership, MemberId, MemberIdentity, UnderlyingAccount,
};
use log::warn;
use std::future::Future;

/// Source of transactions over the persisted identity data.
pub trait IdentityStore: Send + Sync {
    type Transaction: StoreTransaction;

    /// Open a transaction scope.
    fn begin(&self) -> impl Future<Output = StorageResult<Self::Transaction>> + Send;
}

/// Operations available inside one transaction scope.
pub trait StoreTransaction: Send {
    fn get_account(
        &mut self,
        id: AccountId,
    ) -> impl Future<Output = StorageResult<Option<UnderlyingAccount>>> + Send;

    /// Look up an account by contact address, ignoring case.
    fn find_account_by_email(
        &mut self,
        email: &str,
    ) -> impl Future<Output = StorageResult<Option<UnderlyingAccount>>> + Send;

    fn insert_account(
        &mut self,
        account: UnderlyingAccount,
    ) -> impl Future<Output = StorageResult<UnderlyingAccount>> + Send;

    fn update_account(
        &mut self,
        account: UnderlyingAccount,
    ) -> impl Future<Output = StorageResult<UnderlyingAccount>> + Send;

    fn get_member(
        &mut self,
        tenant_id: &str,
        id: MemberId,
    ) -> impl Future<Output = StorageResult<Option<MemberIdentity>>> + Send;

    fn find_member_by_external_id(
        &mut self,
        tenant_id: &str,
        external_id: &str,
    ) -> impl Future<Output = StorageResult<Option<MemberIdentity>>> + Send;

    fn find_member_by_account(
        &mut self,
        tenant_id: &str,
        account_id: AccountId,
    ) -> impl Future<Output = StorageResult<Option<MemberIdentity>>> + Send;

    /// All members of a tenant, oldest first.
    fn list_members(
        &mut self,
        tenant_id: &str,
    ) -> impl Future<Output = StorageResult<Vec<MemberIdentity>>> + Send;

    fn insert_member(
        &mut self,
        member: MemberIdentity,
    ) -> impl Future<Output = StorageResult<MemberIdentity>> + Send;

    fn update_member(
        &mut self,
        member: MemberIdentity,
    ) -> impl Future<Output = StorageResult<MemberIdentity>> + Send;

    /// Delete a member together with its memberships.
    fn delete_member(
        &mut self,
        tenant_id: &str,
        id: MemberId,
    ) -> impl Future<Output = StorageResult<bool>> + Send;

    fn get_group(
        &mut self,
        tenant_id: &str,
        id: GroupId,
    ) -> impl Future<Output = StorageResult<Option<Group>>> + Send;

    fn find_group_by_name(
        &mut self,
        tenant_id: &str,
        name: &str,
    ) -> impl Future<Output = StorageResult<Option<Group>>> + Send;

    /// Insert a group; fails with [`StorageError::UniqueViolation`] when the
    /// tenant already has a group of that name.
    fn insert_group(&mut self, group: Group) -> impl Future<Output = StorageResult<Group>> + Send;

    /// Return the tenant's group named `name`, creating it when absent.
    ///
    /// The boolean is `true` when this call created the group. A uniqueness
    /// violation on insert means a concurrent writer won; the existing row is
    /// re-fetched instead of failing.
    fn create_group_or_fetch(
        &mut self,
        tenant_id: &str,
        name: &str,
    ) -> impl Future<Output = StorageResult<(Group, bool)>> + Send {
        async move {
            if let Some(group) = self.find_group_by_name(tenant_id, name).await? {
                return Ok((group, false));
            }
            match self.insert_group(Group::new(tenant_id, name)).await {
                Ok(group) => Ok((group, true)),
                Err(e) if e.is_unique_violation() => {
                    warn!(
                        "Group '{}' in tenant '{}' created concurrently, re-fetching",
                        name, tenant_id
                    );
                    self.find_group_by_name(tenant_id, name)
                        .await?
                        .map(|group| (group, false))
                        .ok_or_else(|| {
                            StorageError::internal(format!(
                                "group '{}' reported as existing but not found",
                                name
                            ))
                        })
                }
                Err(e) => Err(e),
            }
        }
    }

    fn get_membership(
        &mut self,
        group_id: GroupId,
        member_id: MemberId,
    ) -> impl Future<Output = StorageResult<Option<GroupMembership>>> + Send;

    fn memberships_for_member(
        &mut self,
        member_id: MemberId,
    ) -> impl Future<Output = StorageResult<Vec<GroupMembership>>> + Send;

    fn memberships_for_group(
        &mut self,
        group_id: GroupId,
    ) -> impl Future<Output = StorageResult<Vec<GroupMembership>>> + Send;

    /// Insert or replace the membership for its (group, member) pair.
    fn put_membership(
        &mut self,
        membership: GroupMembership,
    ) -> impl Future<Output = StorageResult<GroupMembership>> + Send;

    fn delete_membership(
        &mut self,
        group_id: GroupId,
        member_id: MemberId,
    ) -> impl Future<Output = StorageResult<bool>> + Send;

    /// Publish all writes made in this transaction atomically.
    fn commit(self) -> impl Future<Output = StorageResult<()>> + Send;
}
