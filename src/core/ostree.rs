//! OSTree commit and remote descriptions
//!
//! The compiler never fetches or verifies commits; it only records which
//! commit the deployment pipeline pulls and how the remote is registered in
//! the deployed repository. Syntax checks here run during request
//! validation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::SpecError;

/// Reference to an immutable commit in an OSTree repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommitSpec {
    /// Branch the commit was published on (e.g. "fedora/38/x86_64/iot")
    #[serde(rename = "ref")]
    pub ref_: String,

    /// Repository URL the commit is pulled from
    pub url: String,

    /// Alternate URL for content, when it differs from the metadata URL
    #[serde(default)]
    pub content_url: Option<String>,

    /// Commit checksum (SHA-256, hex)
    pub checksum: String,

    /// Name of the secrets provider the source needs
    #[serde(default)]
    pub secrets: Option<String>,
}

impl CommitSpec {
    /// Create a commit reference
    pub fn new(
        ref_: impl Into<String>,
        url: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        Self {
            ref_: ref_.into(),
            url: url.into(),
            content_url: None,
            checksum: checksum.into(),
            secrets: None,
        }
    }

    /// Check ref and checksum syntax
    pub fn validate(&self) -> Result<(), SpecError> {
        verify_ref(&self.ref_)?;
        verify_checksum(&self.checksum)
    }
}

/// Remote registered inside the deployed repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Remote {
    /// Remote name (e.g. "fedora-iot")
    pub name: String,

    /// Remote URL
    pub url: String,

    /// Alternate content URL
    #[serde(default)]
    pub content_url: Option<String>,

    /// Armored GPG public keys used to verify commits from this remote
    #[serde(default)]
    pub gpg_keys: Vec<String>,
}

impl Remote {
    /// Create a remote without signing keys
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            content_url: None,
            gpg_keys: Vec::new(),
        }
    }

    /// Check the remote name syntax
    pub fn validate(&self) -> Result<(), SpecError> {
        if remote_name_regex().is_match(&self.name) {
            Ok(())
        } else {
            Err(SpecError::InvalidRemoteName {
                value: self.name.clone(),
            })
        }
    }
}

fn ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[\w\d][-._\w\d]*/)*[\w\d][-._\w\d]*$").expect("ref pattern is valid")
    })
}

fn checksum_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-f]{64}$").expect("checksum pattern is valid"))
}

fn remote_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w\d][-._\w\d]*$").expect("remote pattern is valid"))
}

/// Verify that a string is a well-formed OSTree ref
pub fn verify_ref(value: &str) -> Result<(), SpecError> {
    if ref_regex().is_match(value) {
        Ok(())
    } else {
        Err(SpecError::InvalidRef {
            value: value.to_string(),
        })
    }
}

/// Verify that a string is a well-formed commit checksum
pub fn verify_checksum(value: &str) -> Result<(), SpecError> {
    if checksum_regex().is_match(value) {
        Ok(())
    } else {
        Err(SpecError::InvalidChecksum {
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CHECKSUM: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_valid_refs() {
        for r in ["fedora/38/x86_64/iot", "rhel/9/x86_64/edge", "main", "a-b_c.d/e"] {
            assert!(verify_ref(r).is_ok(), "ref '{r}' should be valid");
        }
    }

    #[test]
    fn test_invalid_refs() {
        for r in ["", "/leading", "trailing/", "double//slash", "-dash", "sp ace"] {
            assert!(verify_ref(r).is_err(), "ref '{r}' should be invalid");
        }
    }

    #[test]
    fn test_checksum_must_be_sha256_hex() {
        assert!(verify_checksum(CHECKSUM).is_ok());
        assert!(verify_checksum(&CHECKSUM.to_uppercase()).is_err());
        assert!(verify_checksum(&CHECKSUM[1..]).is_err());
    }

    #[test]
    fn test_commit_validate() {
        let commit = CommitSpec::new("fedora/38/x86_64/iot", "https://example.com/repo", CHECKSUM);
        assert!(commit.validate().is_ok());

        let bad = CommitSpec::new("fedora//iot", "https://example.com/repo", CHECKSUM);
        assert_eq!(
            bad.validate(),
            Err(SpecError::InvalidRef {
                value: "fedora//iot".to_string()
            })
        );
    }

    #[test]
    fn test_remote_name_rejects_slashes() {
        assert!(Remote::new("fedora-iot", "https://example.com").validate().is_ok());
        assert!(Remote::new("fedora/iot", "https://example.com").validate().is_err());
    }

    #[test]
    fn test_commit_ref_field_is_named_ref() {
        let commit: CommitSpec = toml::from_str(&format!(
            r#"
ref = "rhel/9/x86_64/edge"
url = "https://example.com/repo"
checksum = "{CHECKSUM}"
"#
        ))
        .expect("Failed to parse commit");
        assert_eq!(commit.ref_, "rhel/9/x86_64/edge");
        assert!(commit.content_url.is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_slash_joined_segments_are_valid_refs(
            segments in prop::collection::vec("[a-z0-9][a-z0-9._-]{0,10}", 1..5)
        ) {
            let r = segments.join("/");
            prop_assert!(verify_ref(&r).is_ok(), "ref '{}' should be valid", r);
        }
    }
}
