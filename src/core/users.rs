//! User and group records provisioned into the deployed tree
//!
//! Records are carried verbatim; validating them is the caller's job.

use serde::{Deserialize, Serialize};

/// A user account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    /// Login name
    pub name: String,

    /// GECOS description
    #[serde(default)]
    pub description: Option<String>,

    /// Password hash (crypt format)
    #[serde(default)]
    pub password: Option<String>,

    /// SSH public key
    #[serde(default)]
    pub key: Option<String>,

    /// Home directory
    #[serde(default)]
    pub home: Option<String>,

    /// Login shell
    #[serde(default)]
    pub shell: Option<String>,

    /// Supplementary groups
    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub uid: Option<u32>,

    #[serde(default)]
    pub gid: Option<u32>,

    /// Account expiry, in days since the epoch
    #[serde(default)]
    pub expire_date: Option<u32>,
}

impl User {
    /// Create a user with only a login name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Group {
    /// Group name
    pub name: String,

    #[serde(default)]
    pub gid: Option<u32>,
}

impl Group {
    pub fn new(name: impl Into<String>, gid: Option<u32>) -> Self {
        Self {
            name: name.into(),
            gid,
        }
    }
}
