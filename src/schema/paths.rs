//! Canonical (lower-case) attribute paths used as keys in canonical attribute maps.

pub const ID: &str = "id";
pub const EXTERNAL_ID: &str = "externalid";
pub const USER_NAME: &str = "username";
pub const DISPLAY_NAME: &str = "displayname";
pub const NAME_FORMATTED: &str = "name.formatted";
pub const NAME_GIVEN: &str = "name.givenname";
pub const NAME_FAMILY: &str = "name.familyname";
pub const LOCALE: &str = "locale";
pub const TIMEZONE: &str = "timezone";
pub const ACTIVE: &str = "active";
pub const META_RESOURCE_TYPE: &str = "meta.resourcetype";
pub const META_CREATED: &str = "meta.created";
pub const META_LAST_MODIFIED: &str = "meta.lastmodified";
pub const META_LOCATION: &str = "meta.location";

/// Enterprise extension `manager`, keyed by the lower-cased extension URN.
pub const MANAGER: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:user:manager";
