//! Internal identity model.
//!
//! Entities reference each other through opaque id newtypes rather than object
//! references; a [`GroupMembership`] row is the only link between a
//! [`MemberIdentity`] and a [`Group`].

use crate::normalizer::CanonicalAttributes;
use crate::schema::paths;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an id from its string form; `None` for malformed input.
            pub fn parse(value: &str) -> Option<Self> {
                Uuid::parse_str(value.trim()).ok().map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a [`MemberIdentity`]; exposed as the SCIM resource `id`.
    MemberId
);
opaque_id!(
    /// Identifier of an [`UnderlyingAccount`].
    AccountId
);
opaque_id!(
    /// Identifier of a [`Group`].
    GroupId
);

/// A cross-tenant account carrying personal preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnderlyingAccount {
    pub id: AccountId,
    /// Contact address; unique across all accounts (compared case-insensitively)
    pub email: String,
    pub name: Option<String>,
    pub locale: String,
    pub timezone: String,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl UnderlyingAccount {
    pub fn new(email: impl Into<String>, locale: impl Into<String>, timezone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            email: email.into(),
            name: None,
            locale: locale.into(),
            timezone: timezone.into(),
            created: now,
            last_modified: now,
        }
    }
}

/// A tenant-scoped identity, exposed as a SCIM User.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberIdentity {
    pub id: MemberId,
    pub tenant_id: String,
    pub account_id: AccountId,
    /// Caller-supplied identifier, unique within the tenant when present
    pub external_id: Option<String>,
    pub display_name: Option<String>,
    /// Last `manager` value supplied for this member; names the group whose
    /// membership is reported as the manager relationship
    pub manager: Option<String>,
    /// Security role label taken from the tenant's default role
    pub role: String,
    pub active: bool,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl MemberIdentity {
    pub fn new(tenant_id: impl Into<String>, account_id: AccountId, role: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: MemberId::new(),
            tenant_id: tenant_id.into(),
            account_id,
            external_id: None,
            display_name: None,
            manager: None,
            role: role.into(),
            active: true,
            created: now,
            last_modified: now,
        }
    }
}

/// A tenant-scoped named collection, derived from `manager` references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub tenant_id: String,
    /// Unique within the tenant
    pub name: String,
    pub created: DateTime<Utc>,
}

impl Group {
    pub fn new(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(),
            tenant_id: tenant_id.into(),
            name: name.into(),
            created: Utc::now(),
        }
    }
}

/// Role of a member within a group.
///
/// Ordered so that `Manager > Member`; role transitions only ever escalate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipRole {
    Member,
    Manager,
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member => f.write_str("member"),
            Self::Manager => f.write_str("manager"),
        }
    }
}

/// Association of a member with a group. At most one per (group, member).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: GroupId,
    pub member_id: MemberId,
    pub role: MembershipRole,
}

/// A member joined with its account and manager relationship, as exposed over SCIM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScimUser {
    pub member: MemberIdentity,
    pub account: UnderlyingAccount,
    /// Name of the group this member belongs to with the `member` role
    pub manager: Option<String>,
}

impl ScimUser {
    /// Project onto canonical attribute paths; the base a PATCH applies to and
    /// the view filters are evaluated against.
    pub fn to_canonical(&self) -> CanonicalAttributes {
        let mut attrs = CanonicalAttributes::new();
        attrs.insert(paths::ID, Value::from(self.member.id.to_string()));
        attrs.insert_opt(paths::EXTERNAL_ID, self.member.external_id.clone());
        attrs.insert(paths::USER_NAME, Value::from(self.account.email.clone()));
        attrs.insert_opt(paths::DISPLAY_NAME, self.member.display_name.clone());
        attrs.insert_opt(paths::NAME_FORMATTED, self.member.display_name.clone());
        attrs.insert(paths::LOCALE, Value::from(self.account.locale.clone()));
        attrs.insert(paths::TIMEZONE, Value::from(self.account.timezone.clone()));
        attrs.insert(paths::ACTIVE, Value::Bool(self.member.active));
        attrs.insert_opt(paths::MANAGER, self.manager.clone());
        attrs.insert(paths::META_RESOURCE_TYPE, Value::from("User"));
        attrs.insert(
            paths::META_CREATED,
            Value::from(self.member.created.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        attrs.insert(
            paths::META_LAST_MODIFIED,
            Value::from(self.member.last_modified.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        attrs
    }
}
