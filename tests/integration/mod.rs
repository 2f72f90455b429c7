//! End-to-end scenarios over the in-memory store.

pub mod auth;
pub mod case_insensitivity;
pub mod discovery;
pub mod manager_groups;
pub mod patch;
pub mod provisioning;
