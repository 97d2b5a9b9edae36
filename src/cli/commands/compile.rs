//! Compile command implementation
//!
//! Implements `treecompose compile` to turn an image request into a
//! manifest. Runner and seed come from the command line, then the request
//! file, then the global config, then the built-in defaults.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;

use super::load_request;
use crate::cli::output::{self, status};
use crate::core::global_config::GlobalConfig;
use crate::core::manifest::{Artifact, Manifest, Pipeline};
use crate::core::runner::Runner;
use crate::infra::dirs::TreecomposeDirs;
use crate::infra::filesystem;

/// Options for the compile command
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Image request file
    pub file: PathBuf,
    /// Manifest destination; stdout when unset
    pub output: Option<PathBuf>,
    /// Seed override
    pub seed: Option<u64>,
    /// Runner override
    pub runner: Option<String>,
}

#[derive(Debug, Serialize)]
struct Checkpoint<'a> {
    pipeline: &'a str,
    key: String,
}

#[derive(Debug, Serialize)]
struct CompileSummary<'a> {
    manifest: String,
    runner: String,
    seed: u64,
    pipelines: Vec<&'a str>,
    checkpoints: Vec<Checkpoint<'a>>,
    artifact: &'a Artifact,
}

/// Execute the compile command
pub async fn execute(options: CompileOptions) -> Result<()> {
    let request = load_request(&options.file)?;
    let global =
        GlobalConfig::load(&TreecomposeDirs::new()).context("Failed to load global config")?;

    let runner = match options.runner.as_deref() {
        Some(value) => value.parse::<Runner>()?,
        None => match request.runner {
            Some(runner) => runner,
            None => global.runner().context("Invalid runner in global config")?,
        },
    };

    let seed = match options.seed.or(request.seed).or(global.compile.seed) {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            tracing::info!("No seed given, using {seed}");
            seed
        }
    };

    tracing::info!(
        "Compiling {} with runner {} and seed {seed}",
        options.file.display(),
        runner
    );

    let mut manifest = Manifest::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let artifact = request
        .image
        .compile(&mut manifest, &request.repos, &runner, &mut rng)
        .with_context(|| format!("Failed to compile {}", options.file.display()))?;

    let rendered = manifest.render(global.pretty())?;

    let Some(path) = &options.output else {
        println!("{rendered}");
        return Ok(());
    };

    filesystem::write_file(path, &rendered)?;

    let summary = CompileSummary {
        manifest: path.display().to_string(),
        runner: runner.to_string(),
        seed,
        pipelines: manifest.pipelines().iter().map(Pipeline::name).collect(),
        checkpoints: checkpoints(&manifest),
        artifact: &artifact,
    };

    if output::config().json {
        return output::print_json(&summary);
    }

    output::print_status(
        status::SUCCESS,
        &format!("Wrote manifest to {}", summary.manifest),
    );
    output::print_status(
        status::INFO,
        &format!("Pipelines: {}", summary.pipelines.join(" -> ")),
    );
    for checkpoint in &summary.checkpoints {
        output::print_status(
            status::INFO,
            &format!("Checkpoint {} ({})", checkpoint.pipeline, checkpoint.key),
        );
    }
    output::print_status(
        status::SUCCESS,
        &format!(
            "Artifact {} ({}) from pipeline '{}'",
            artifact.filename(),
            artifact.mime_type(),
            artifact.pipeline()
        ),
    );
    Ok(())
}

fn checkpoints(manifest: &Manifest) -> Vec<Checkpoint<'_>> {
    manifest
        .pipelines()
        .iter()
        .filter_map(Pipeline::as_build)
        .filter(|build| build.is_checkpoint())
        .map(|build| Checkpoint {
            pipeline: build.name(),
            key: build.checkpoint_key(),
        })
        .collect()
}
