//! Post-boot customization set
//!
//! The ostree image compiler carries the workload along with the image but
//! never inspects it: the deployed commit already contains the content.

use serde::{Deserialize, Serialize};

/// Packages and services layered on top of the base system
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Workload {
    #[serde(default)]
    pub packages: Vec<String>,

    #[serde(default)]
    pub enabled_services: Vec<String>,

    #[serde(default)]
    pub disabled_services: Vec<String>,
}

impl Workload {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
            && self.enabled_services.is_empty()
            && self.disabled_services.is_empty()
    }
}
