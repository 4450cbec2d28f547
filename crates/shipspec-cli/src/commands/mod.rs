//! Subcommand handlers.
//!
//! `main.rs` parses arguments into a [`RunContext`] and dispatches here; each
//! handler drives one pipeline entry point and prints the summary.

pub mod derive;
pub mod refresh;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use shipspec_lib::{ApiConfig, FsBlobStore, MissingPagePolicy, PipelineReport};

use crate::output::{render_report, OutputFormat, ProgressRenderer};
use crate::terminal::ColorPalette;

/// Everything a handler needs, resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: ApiConfig,
    pub cache_dir: PathBuf,
    pub policy: MissingPagePolicy,
    pub format: OutputFormat,
    pub palette: ColorPalette,
}

impl RunContext {
    pub fn store(&self) -> FsBlobStore {
        FsBlobStore::new(&self.cache_dir)
    }

    /// Stage lines go to stderr so stdout only carries the summary.
    pub fn renderer(&self) -> ProgressRenderer<io::Stderr> {
        let stderr = io::stderr();
        let interactive = stderr.is_terminal();
        ProgressRenderer::new(stderr, self.palette, interactive)
    }

    pub fn print_report(&self, report: &PipelineReport) -> Result<()> {
        let mut stdout = io::stdout().lock();
        render_report(
            self.format,
            report,
            &self.cache_dir,
            &self.palette,
            &mut stdout,
        )
        .and_then(|()| stdout.flush())
        .context("failed to write run summary")
    }
}
