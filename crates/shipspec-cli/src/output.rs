//! Progress rendering and run summaries.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use shipspec_lib::{
    Error, PipelineObserver, PipelineReport, Progress, Stage, MODULES_BLOB, SHIPS_BLOB,
    SPECS_BLOB,
};

use crate::terminal::ColorPalette;

/// How the run summary is printed on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// State shown in front of each stage line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Running,
    Completed,
    Error,
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StageStatus::Running => "Running",
            StageStatus::Completed => "Completed",
            StageStatus::Error => "Error",
        }
    }

    pub fn color(&self, palette: &ColorPalette) -> &'static str {
        match self {
            StageStatus::Running => palette.white,
            StageStatus::Completed => palette.green,
            StageStatus::Error => palette.red,
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Format one status line, e.g. `Completed  Saving (ships.json) 100.0%`.
pub fn status_line(
    status: StageStatus,
    stage: Stage,
    progress: Progress,
    palette: &ColorPalette,
) -> String {
    format!(
        "{color}{label:<10}{reset} {description} {gray}{pct:.1}%{reset}",
        color = status.color(palette),
        label = status.label(),
        description = stage.description(),
        gray = palette.gray,
        pct = progress.percentage(),
        reset = palette.reset,
    )
}

/// Renders pipeline events as one status line per stage.
///
/// On an interactive terminal the running line is rewritten in place as
/// progress arrives; otherwise only the final line of each stage is written.
pub struct ProgressRenderer<W: Write> {
    out: W,
    palette: ColorPalette,
    interactive: bool,
    current: Progress,
}

impl<W: Write> ProgressRenderer<W> {
    pub fn new(out: W, palette: ColorPalette, interactive: bool) -> Self {
        Self {
            out,
            palette,
            interactive,
            current: Progress::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, status: StageStatus, stage: Stage, newline: bool) {
        let line = status_line(status, stage, self.current, &self.palette);
        let prefix = if self.interactive { "\r" } else { "" };
        let end = if newline { "\n" } else { "" };
        // progress output is best effort
        let _ = write!(self.out, "{prefix}{line}{end}");
        let _ = self.out.flush();
    }
}

impl<W: Write> PipelineObserver for ProgressRenderer<W> {
    fn stage_started(&mut self, stage: Stage) {
        self.current = Progress::default();
        if self.interactive {
            self.write_line(StageStatus::Running, stage, false);
        }
    }

    fn progress(&mut self, stage: Stage, total: u64, count: u64) {
        self.current = Progress::new(total, count);
        if self.interactive {
            self.write_line(StageStatus::Running, stage, false);
        }
    }

    fn stage_finished(&mut self, stage: Stage) {
        self.write_line(StageStatus::Completed, stage, true);
    }

    fn stage_failed(&mut self, stage: Stage, _error: &Error) {
        self.write_line(StageStatus::Error, stage, true);
    }
}

#[derive(Debug, Serialize)]
struct ReportOutput<'a> {
    cache_dir: String,
    #[serde(flatten)]
    report: &'a PipelineReport,
}

/// Print the summary of a successful run.
pub fn render_report(
    format: OutputFormat,
    report: &PipelineReport,
    cache_dir: &Path,
    palette: &ColorPalette,
    out: &mut dyn Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let output = ReportOutput {
                cache_dir: cache_dir.display().to_string(),
                report,
            };
            serde_json::to_writer_pretty(&mut *out, &output)?;
            writeln!(out)
        }
        OutputFormat::Text => render_text_report(report, cache_dir, palette, out),
    }
}

fn render_text_report(
    report: &PipelineReport,
    cache_dir: &Path,
    palette: &ColorPalette,
    out: &mut dyn Write,
) -> io::Result<()> {
    writeln!(
        out,
        "Cache directory: {gray}{}{reset}",
        cache_dir.display(),
        gray = palette.gray,
        reset = palette.reset
    )?;

    for stage in &report.stages {
        let written = match stage {
            Stage::SaveShips => Some((SHIPS_BLOB, report.ships)),
            Stage::SaveModules => Some((MODULES_BLOB, report.modules)),
            Stage::SaveSpecs => Some((SPECS_BLOB, report.specs)),
            _ => None,
        };
        if let Some((blob, records)) = written {
            writeln!(out, "  {blob:<13} {records} records")?;
        }
    }

    if !report.unresolved.is_empty() {
        writeln!(
            out,
            "{warn}warning:{reset} {} module reference(s) missing from the module catalog",
            report.unresolved.len(),
            warn = palette.warning,
            reset = palette.reset
        )?;
        for (ship_id, reference) in &report.unresolved {
            writeln!(
                out,
                "  ship {ship_id}: {} module {}",
                reference.slot, reference.module_id
            )?;
        }
    }
    Ok(())
}
