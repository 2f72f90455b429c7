//! Path routing. Resource segments match case-insensitively; the tenant
//! segment and resource ids are taken verbatim.

use crate::error::{ScimError, ScimResult};
use std::fmt;

/// A resolved endpoint below the tenant prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    ServiceProviderConfig,
    ResourceTypes(Option<&'a str>),
    Schemas(Option<&'a str>),
    Users(Option<&'a str>),
}

impl fmt::Display for Route<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (endpoint, id) = match self {
            Self::ServiceProviderConfig => ("/ServiceProviderConfig", None),
            Self::ResourceTypes(id) => ("/ResourceTypes", *id),
            Self::Schemas(id) => ("/Schemas", *id),
            Self::Users(id) => ("/Users", *id),
        };
        match id {
            Some(id) => write!(f, "{}/{{{}}}", endpoint, id),
            None => f.write_str(endpoint),
        }
    }
}

/// Split `/{tenant}/{resource}[/{id}]` into the tenant id and route.
pub fn parse_path(path: &str) -> ScimResult<(&str, Route<'_>)> {
    let not_found = || ScimError::resource_not_found("endpoint", path);

    let path = path.split('?').next().unwrap_or(path);
    let mut segments = path.trim_matches('/').split('/').filter(|s| !s.is_empty());
    let tenant_id = segments.next().ok_or_else(not_found)?;
    let resource = segments.next().ok_or_else(not_found)?;
    let id = segments.next();
    if segments.next().is_some() {
        return Err(not_found());
    }

    let route = match resource.to_ascii_lowercase().as_str() {
        "serviceproviderconfig" | "serviceproviderconfigs" if id.is_none() => {
            Route::ServiceProviderConfig
        }
        "resourcetypes" => Route::ResourceTypes(id),
        "schemas" => Route::Schemas(id),
        "users" => Route::Users(id),
        _ => return Err(not_found()),
    };
    Ok((tenant_id, route))
}
