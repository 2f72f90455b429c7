//! Explicit configuration for the SCIM adapter.
//!
//! A [`ScimConfig`] is built once (in code or from JSON) and handed to the
//! endpoint layer, which threads the matching [`TenantSettings`] into the
//! identity synchronizer for each request.
//!
//! ```rust
//! use scim_provisioning::config::{ScimConfig, TenantSettings};
//!
//! let config = ScimConfig::new("https://scim.example.com/")
//!     .with_tenant(TenantSettings::new("acme").with_default_role("viewer"));
//! assert_eq!(config.base_url(), "https://scim.example.com");
//! assert!(config.tenant("acme").is_some());
//! ```

use crate::error::{ScimError, ScimResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCALE: &str = "en_US";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Default and maximum page size for `GET /Users`.
pub const MAX_PAGE_SIZE: usize = 200;

/// Per-tenant provisioning settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSettings {
    pub tenant_id: String,
    /// Pre-shared bearer token; `None` disables the token check for this tenant
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Role given to provisioned members; `None` means the tenant has no
    /// security configuration and writes are rejected
    #[serde(default)]
    pub default_role: Option<String>,
    #[serde(default = "default_locale")]
    pub default_locale: String,
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl TenantSettings {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            bearer_token: None,
            default_role: None,
            default_locale: default_locale(),
            default_timezone: default_timezone(),
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = Some(role.into());
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    pub fn with_default_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.default_timezone = timezone.into();
        self
    }

    /// The role for new members, or a configuration error when none is set.
    pub fn require_default_role(&self) -> ScimResult<&str> {
        self.default_role
            .as_deref()
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .ok_or_else(|| {
                ScimError::configuration(format!(
                    "tenant '{}' has no default role configured; configure its security roles before provisioning",
                    self.tenant_id
                ))
            })
    }
}

/// Adapter-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScimConfig {
    /// Base URL that tenant paths are appended to, e.g. `https://scim.example.com`
    base_url: String,
    #[serde(default)]
    tenants: Vec<TenantSettings>,
}

impl Default for ScimConfig {
    fn default() -> Self {
        Self::new("https://localhost")
    }
}

impl ScimConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tenants: Vec::new(),
        }
    }

    /// Load configuration from a JSON document.
    pub fn from_json_str(json: &str) -> ScimResult<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Add or replace the settings of one tenant.
    pub fn with_tenant(mut self, settings: TenantSettings) -> Self {
        self.tenants.retain(|t| t.tenant_id != settings.tenant_id);
        self.tenants.push(settings);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tenant(&self, tenant_id: &str) -> Option<&TenantSettings> {
        self.tenants.iter().find(|t| t.tenant_id == tenant_id)
    }

    pub fn tenants(&self) -> &[TenantSettings] {
        &self.tenants
    }

    /// Absolute URL of a resource: `{base_url}/{tenant}/{endpoint}/{id}`.
    pub fn location(&self, tenant_id: &str, endpoint: &str, resource_id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            tenant_id,
            endpoint.trim_matches('/'),
            resource_id
        )
    }
}
