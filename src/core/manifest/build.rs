//! Build environment pipeline
//!
//! Every other pipeline runs its stages inside the tree this pipeline
//! produces.

use serde_json::json;
use sha2::{Digest, Sha256};

use super::stage::Stage;
use crate::config::defaults::BUILD_PIPELINE;
use crate::core::repos::RepoConfig;
use crate::core::runner::Runner;

/// Build root installed from `repos` under `runner`
#[derive(Debug, Clone, PartialEq)]
pub struct Build {
    name: String,
    runner: Runner,
    repos: Vec<RepoConfig>,
    packages: Vec<String>,
    checkpoint: bool,
}

impl Build {
    /// Create a build pipeline with the runner's base packages
    pub fn new(runner: &Runner, repos: &[RepoConfig]) -> Self {
        Self {
            name: BUILD_PIPELINE.to_string(),
            runner: *runner,
            repos: repos.to_vec(),
            packages: runner.build_packages(),
            checkpoint: false,
        }
    }

    /// Mark the pipeline's output as reusable across compilations
    #[must_use]
    pub fn checkpointed(mut self) -> Self {
        self.checkpoint = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn repos(&self) -> &[RepoConfig] {
        &self.repos
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn is_checkpoint(&self) -> bool {
        self.checkpoint
    }

    /// Content key of the build inputs
    ///
    /// Two build pipelines with equal keys produce the same tree, so the
    /// execution engine may reuse one's checkpoint for the other.
    pub fn checkpoint_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.runner.name().as_bytes());
        hasher.update([0]);
        for package in &self.packages {
            hasher.update(package.as_bytes());
            hasher.update([0]);
        }
        for repo in &self.repos {
            // RepoConfig holds only strings, vectors and options
            let encoded = serde_json::to_vec(repo).unwrap_or_default();
            hasher.update(&encoded);
            hasher.update([0]);
        }
        hex::encode(hasher.finalize())
    }

    pub(super) fn stages(&self) -> Vec<Stage> {
        let repositories: Vec<&str> = self.repos.iter().map(|r| r.name.as_str()).collect();
        vec![Stage::new(
            "org.osbuild.rpm",
            json!({
                "repositories": repositories,
                "packages": self.packages,
            }),
        )]
    }
}
