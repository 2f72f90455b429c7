//! In-memory implementation of the identity store.
//!
//! All data lives in id-keyed arenas behind a single `tokio::sync::Mutex`. A
//! transaction owns the lock for its whole lifetime, so transactions are fully
//! serialized. Reads go straight to the committed arenas; the first write takes
//! a private copy, which [`StoreTransaction::commit`] publishes and a drop
//! discards. Read-only transactions never copy anything. This is meant for
//! tests, development and single-process deployments.
//!
//! # Example Usage
//!
//! ```rust
//! use scim_provisioning::model::UnderlyingAccount;
//! use scim_provisioning::storage::{IdentityStore, InMemoryIdentityStore, StoreTransaction};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryIdentityStore::new();
//!
//! let mut tx = store.begin().await?;
//! tx.insert_account(UnderlyingAccount::new("b@example.com", "en_US", "UTC")).await?;
//! drop(tx); // rolled back
//!
//! assert_eq!(store.stats().await.accounts, 0);
//! # Ok(())
//! # }
//! ```

use super::{IdentityStore, StorageError, StorageResult, StoreTransaction};
use crate::model::{
    AccountId, Group, GroupId, GroupMembership, MemberId, MemberIdentity, UnderlyingAccount,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct StoreData {
    accounts: HashMap<AccountId, UnderlyingAccount>,
    members: HashMap<MemberId, MemberIdentity>,
    groups: HashMap<GroupId, Group>,
    memberships: HashMap<(GroupId, MemberId), GroupMembership>,
}

impl StoreData {
    fn check_account_unique(&self, account: &UnderlyingAccount) -> StorageResult<()> {
        let taken = self
            .accounts
            .values()
            .any(|a| a.id != account.id && a.email.eq_ignore_ascii_case(&account.email));
        if taken {
            return Err(StorageError::unique_violation("account", account.email.clone()));
        }
        Ok(())
    }

    fn check_member_unique(&self, member: &MemberIdentity) -> StorageResult<()> {
        for other in self.members.values() {
            if other.id == member.id || other.tenant_id != member.tenant_id {
                continue;
            }
            if other.account_id == member.account_id {
                return Err(StorageError::unique_violation(
                    "member",
                    format!("{}/account:{}", member.tenant_id, member.account_id),
                ));
            }
            if let (Some(a), Some(b)) = (&other.external_id, &member.external_id) {
                if a == b {
                    return Err(StorageError::unique_violation(
                        "member",
                        format!("{}/externalId:{}", member.tenant_id, b),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Thread-safe in-memory identity store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityStore {
    data: Arc<Mutex<StoreData>>,
}

/// Row counts, for debugging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InMemoryStoreStats {
    pub accounts: usize,
    pub members: usize,
    pub groups: usize,
    pub memberships: usize,
}

impl InMemoryIdentityStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get committed row counts. Waits for any open transaction to finish.
    pub async fn stats(&self) -> InMemoryStoreStats {
        let data = self.data.lock().await;
        InMemoryStoreStats {
            accounts: data.accounts.len(),
            members: data.members.len(),
            groups: data.groups.len(),
            memberships: data.memberships.len(),
        }
    }
}

impl IdentityStore for InMemoryIdentityStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> StorageResult<InMemoryTransaction> {
        let guard = Arc::clone(&self.data).lock_owned().await;
        Ok(InMemoryTransaction {
            guard,
            working: None,
        })
    }
}

/// Serialized transaction over an [`InMemoryIdentityStore`].
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreData>,
    /// Copy of the committed data, taken on the first write
    working: Option<StoreData>,
}

impl InMemoryTransaction {
    fn data(&self) -> &StoreData {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn data_mut(&mut self) -> &mut StoreData {
        let Self { guard, working } = self;
        working.get_or_insert_with(|| StoreData::clone(&**guard))
    }
}

impl StoreTransaction for InMemoryTransaction {
    async fn get_account(&mut self, id: AccountId) -> StorageResult<Option<UnderlyingAccount>> {
        Ok(self.data().accounts.get(&id).cloned())
    }

    async fn find_account_by_email(
        &mut self,
        email: &str,
    ) -> StorageResult<Option<UnderlyingAccount>> {
        let email = email.trim();
        Ok(self
            .data()
            .accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert_account(
        &mut self,
        account: UnderlyingAccount,
    ) -> StorageResult<UnderlyingAccount> {
        if self.data().accounts.contains_key(&account.id) {
            return Err(StorageError::unique_violation("account", account.id.to_string()));
        }
        self.data().check_account_unique(&account)?;
        self.data_mut().accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_account(
        &mut self,
        account: UnderlyingAccount,
    ) -> StorageResult<UnderlyingAccount> {
        if !self.data().accounts.contains_key(&account.id) {
            return Err(StorageError::not_found("account", account.id));
        }
        self.data().check_account_unique(&account)?;
        self.data_mut().accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_member(
        &mut self,
        tenant_id: &str,
        id: MemberId,
    ) -> StorageResult<Option<MemberIdentity>> {
        Ok(self
            .data()
            .members
            .get(&id)
            .filter(|m| m.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_member_by_external_id(
        &mut self,
        tenant_id: &str,
        external_id: &str,
    ) -> StorageResult<Option<MemberIdentity>> {
        Ok(self
            .data()
            .members
            .values()
            .find(|m| m.tenant_id == tenant_id && m.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn find_member_by_account(
        &mut self,
        tenant_id: &str,
        account_id: AccountId,
    ) -> StorageResult<Option<MemberIdentity>> {
        Ok(self
            .data()
            .members
            .values()
            .find(|m| m.tenant_id == tenant_id && m.account_id == account_id)
            .cloned())
    }

    async fn list_members(&mut self, tenant_id: &str) -> StorageResult<Vec<MemberIdentity>> {
        let mut members: Vec<MemberIdentity> = self
            .data()
            .members
            .values()
            .filter(|m| m.tenant_id == tenant_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(members)
    }

    async fn insert_member(&mut self, member: MemberIdentity) -> StorageResult<MemberIdentity> {
        if self.data().members.contains_key(&member.id) {
            return Err(StorageError::unique_violation("member", member.id.to_string()));
        }
        self.data().check_member_unique(&member)?;
        self.data_mut().members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn update_member(&mut self, member: MemberIdentity) -> StorageResult<MemberIdentity> {
        match self.data().members.get(&member.id) {
            Some(existing) if existing.tenant_id == member.tenant_id => {}
            _ => return Err(StorageError::not_found("member", member.id)),
        }
        self.data().check_member_unique(&member)?;
        self.data_mut().members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn delete_member(&mut self, tenant_id: &str, id: MemberId) -> StorageResult<bool> {
        let owned = self
            .data()
            .members
            .get(&id)
            .is_some_and(|m| m.tenant_id == tenant_id);
        if !owned {
            return Ok(false);
        }
        let data = self.data_mut();
        data.members.remove(&id);
        data.memberships.retain(|(_, member_id), _| *member_id != id);
        Ok(true)
    }

    async fn get_group(&mut self, tenant_id: &str, id: GroupId) -> StorageResult<Option<Group>> {
        Ok(self
            .data()
            .groups
            .get(&id)
            .filter(|g| g.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_group_by_name(
        &mut self,
        tenant_id: &str,
        name: &str,
    ) -> StorageResult<Option<Group>> {
        Ok(self
            .data()
            .groups
            .values()
            .find(|g| g.tenant_id == tenant_id && g.name == name)
            .cloned())
    }

    async fn insert_group(&mut self, group: Group) -> StorageResult<Group> {
        let taken = self.data().groups.values().any(|g| {
            g.id == group.id || (g.tenant_id == group.tenant_id && g.name == group.name)
        });
        if taken {
            return Err(StorageError::unique_violation(
                "group",
                format!("{}/{}", group.tenant_id, group.name),
            ));
        }
        self.data_mut().groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn get_membership(
        &mut self,
        group_id: GroupId,
        member_id: MemberId,
    ) -> StorageResult<Option<GroupMembership>> {
        Ok(self.data().memberships.get(&(group_id, member_id)).copied())
    }

    async fn memberships_for_member(
        &mut self,
        member_id: MemberId,
    ) -> StorageResult<Vec<GroupMembership>> {
        let mut found: Vec<GroupMembership> = self
            .data()
            .memberships
            .values()
            .filter(|m| m.member_id == member_id)
            .copied()
            .collect();
        found.sort_by_key(|m| m.group_id);
        Ok(found)
    }

    async fn memberships_for_group(
        &mut self,
        group_id: GroupId,
    ) -> StorageResult<Vec<GroupMembership>> {
        let mut found: Vec<GroupMembership> = self
            .data()
            .memberships
            .values()
            .filter(|m| m.group_id == group_id)
            .copied()
            .collect();
        found.sort_by_key(|m| m.member_id);
        Ok(found)
    }

    async fn put_membership(
        &mut self,
        membership: GroupMembership,
    ) -> StorageResult<GroupMembership> {
        if !self.data().groups.contains_key(&membership.group_id) {
            return Err(StorageError::not_found("group", membership.group_id));
        }
        if !self.data().members.contains_key(&membership.member_id) {
            return Err(StorageError::not_found("member", membership.member_id));
        }
        self.data_mut()
            .memberships
            .insert((membership.group_id, membership.member_id), membership);
        Ok(membership)
    }

    async fn delete_membership(
        &mut self,
        group_id: GroupId,
        member_id: MemberId,
    ) -> StorageResult<bool> {
        let key = (group_id, member_id);
        if !self.data().memberships.contains_key(&key) {
            return Ok(false);
        }
        Ok(self.data_mut().memberships.remove(&key).is_some())
    }

    async fn commit(self) -> StorageResult<()> {
        let Self { mut guard, working } = self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }
}
