//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod check;
pub mod compile;
pub mod formats;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::core::image_file::{ImageFile, ImageRequest};
use crate::infra::filesystem;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile an image request into a manifest
    Compile {
        /// Image request file (TOML)
        file: PathBuf,

        /// Write the manifest here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for generated partition and filesystem ids
        #[arg(long)]
        seed: Option<u64>,

        /// Runner descriptor (e.g. fedora-38, rhel-8.6, linux)
        #[arg(long)]
        runner: Option<String>,
    },

    /// Validate an image request and show the pipelines it compiles to
    Check {
        /// Image request file (TOML)
        file: PathBuf,
    },

    /// List image formats and compression types
    Formats,
}

impl Commands {
    /// Execute the command
    pub async fn run(self) -> Result<()> {
        match self {
            Self::Compile {
                file,
                output,
                seed,
                runner,
            } => {
                let options = compile::CompileOptions {
                    file,
                    output,
                    seed,
                    runner,
                };
                compile::execute(options).await
            }
            Self::Check { file } => check::execute(&file).await,
            Self::Formats => formats::execute().await,
        }
    }
}

/// Read and validate an image request file
pub(crate) fn load_request(file: &std::path::Path) -> Result<ImageRequest> {
    let content = filesystem::read_file(file)?;
    let image_file = ImageFile::from_toml(&content)
        .with_context(|| format!("Failed to parse image request {}", file.display()))?;
    image_file
        .into_request()
        .with_context(|| format!("Invalid image request {}", file.display()))
}
