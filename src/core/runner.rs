//! Build runner descriptors
//!
//! A runner names the host environment the build pipeline executes under.
//! The compiler forwards it to the build pipeline and never interprets it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::SpecError;

/// Execution environment for build stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "distro", rename_all = "lowercase")]
pub enum Runner {
    Fedora { version: u32 },
    Rhel { major: u32, minor: u32 },
    Centos { version: u32 },
    /// Generic Linux host
    #[default]
    Linux,
}

impl Runner {
    /// Runner id as understood by the execution engine
    pub fn name(&self) -> String {
        match self {
            Self::Fedora { version } => format!("org.osbuild.fedora{version}"),
            Self::Rhel { major, minor } => format!("org.osbuild.rhel{major}{minor}"),
            Self::Centos { version } => format!("org.osbuild.centos{version}"),
            Self::Linux => "org.osbuild.linux".to_string(),
        }
    }

    /// Packages the build root needs before any stage can run
    pub fn build_packages(&self) -> Vec<String> {
        let mut packages = vec!["glibc".to_string(), "systemd".to_string()];
        match self {
            Self::Rhel { major, .. } | Self::Centos { version: major } if *major < 9 => {
                packages.push("platform-python".to_string());
            }
            Self::Linux => {}
            _ => packages.push("python3".to_string()),
        }
        packages
    }
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fedora { version } => write!(f, "fedora-{version}"),
            Self::Rhel { major, minor } => write!(f, "rhel-{major}.{minor}"),
            Self::Centos { version } => write!(f, "centos-{version}"),
            Self::Linux => f.write_str("linux"),
        }
    }
}

impl FromStr for Runner {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SpecError::InvalidRunner {
            value: s.to_string(),
        };

        if s == "linux" {
            return Ok(Self::Linux);
        }

        let caps = runner_regex().captures(s).ok_or_else(invalid)?;
        let major: u32 = caps[2].parse().map_err(|_| invalid())?;
        let minor: Option<u32> = match caps.get(3) {
            Some(m) => Some(m.as_str().parse().map_err(|_| invalid())?),
            None => None,
        };

        match (&caps[1], minor) {
            ("fedora", None) => Ok(Self::Fedora { version: major }),
            ("centos", None) => Ok(Self::Centos { version: major }),
            ("rhel", Some(minor)) => Ok(Self::Rhel { major, minor }),
            _ => Err(invalid()),
        }
    }
}

fn runner_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(fedora|centos|rhel)-(\d+)(?:\.(\d+))?$").expect("runner pattern is valid")
    })
}
