//! Package repository descriptions
//!
//! Repositories are forwarded to the build pipeline untouched; resolving
//! their metadata happens elsewhere.

use serde::{Deserialize, Serialize};

/// A package repository the build environment may install from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    /// Repository id
    pub name: String,

    #[serde(default)]
    pub base_urls: Vec<String>,

    #[serde(default)]
    pub metalink: Option<String>,

    #[serde(default)]
    pub mirrorlist: Option<String>,

    /// Armored GPG keys
    #[serde(default)]
    pub gpg_keys: Vec<String>,

    #[serde(default)]
    pub check_gpg: Option<bool>,

    #[serde(default)]
    pub ignore_ssl: Option<bool>,
}

impl RepoConfig {
    /// Create a repository served from a single base URL
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_urls: vec![base_url.into()],
            ..Self::default()
        }
    }
}
