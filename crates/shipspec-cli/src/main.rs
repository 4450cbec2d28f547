use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shipspec_cli::commands::{derive::handle_derive, refresh, RunContext};
use shipspec_cli::output::OutputFormat;
use shipspec_cli::terminal::ColorPalette;
use shipspec_lib::{default_cache_dir, ApiConfig, MissingPagePolicy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Warship catalog cache and spec derivation")]
struct Cli {
    /// Directory holding ships.json, modules.json and specs.json.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Encyclopedia API base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Application id sent with every request (defaults to SHIPSPEC_API_KEY).
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Minimum spacing between consecutive requests, in milliseconds.
    #[arg(long, global = true)]
    cooldown_ms: Option<u64>,

    /// What to do when a catalog page answers with an error status.
    #[arg(long, global = true, value_enum, default_value_t = PagePolicyArg::Abort)]
    on_missing_page: PagePolicyArg,

    /// Summary format written to stdout.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Disable colored status lines.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch both catalogs, cache them and derive ship specs.
    Refresh,
    /// Fetch and cache the ship catalog only.
    FetchShips,
    /// Re-derive ship specs from the cached catalogs without network access.
    Derive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PagePolicyArg {
    Abort,
    Skip,
}

impl From<PagePolicyArg> for MissingPagePolicy {
    fn from(value: PagePolicyArg) -> Self {
        match value {
            PagePolicyArg::Abort => MissingPagePolicy::Abort,
            PagePolicyArg::Skip => MissingPagePolicy::Skip,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let ctx = build_context(&cli)?;

    match cli.command {
        Command::Refresh => refresh::handle_refresh(&ctx),
        Command::FetchShips => refresh::handle_fetch_ships(&ctx),
        Command::Derive => handle_derive(&ctx),
    }
}

fn build_context(cli: &Cli) -> Result<RunContext> {
    let mut config = ApiConfig::from_env();
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    if let Some(key) = &cli.api_key {
        config.application_id = Some(key.clone());
    }
    if let Some(ms) = cli.cooldown_ms {
        config.cooldown = Duration::from_millis(ms);
    }

    let cache_dir = match &cli.cache_dir {
        Some(dir) => dir.clone(),
        None => default_cache_dir().context("failed to resolve the cache directory")?,
    };

    Ok(RunContext {
        config,
        cache_dir,
        policy: cli.on_missing_page.into(),
        format: cli.format,
        palette: ColorPalette::resolve(cli.no_color),
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
