//! Network-backed commands: the full refresh and the ships-only fetch.

use anyhow::{Context, Result};
use tracing::debug;

use shipspec_lib::{
    CatalogPipeline, FixedCooldown, FsBlobStore, HttpTransport, PaginatedCollector,
    RateLimitedFetcher,
};

use super::RunContext;

type HttpPipeline = CatalogPipeline<HttpTransport, FixedCooldown, FsBlobStore>;

fn build_pipeline(ctx: &RunContext) -> Result<HttpPipeline> {
    let transport =
        HttpTransport::from_config(&ctx.config).context("failed to build the HTTP client")?;
    let fetcher = RateLimitedFetcher::new(transport, FixedCooldown::new(ctx.config.cooldown));
    let collector = PaginatedCollector::new(fetcher).with_policy(ctx.policy);
    debug!(
        base_url = %ctx.config.base_url,
        cooldown_ms = ctx.config.cooldown.as_millis() as u64,
        policy = ?ctx.policy,
        "pipeline configured"
    );
    Ok(CatalogPipeline::new(collector, ctx.store(), ctx.config.clone()))
}

/// Handle `refresh`: fetch both catalogs, cache them and derive specs.
pub fn handle_refresh(ctx: &RunContext) -> Result<()> {
    // fail fast before touching the network or the cache
    ctx.config.require_application_id()?;
    let pipeline = build_pipeline(ctx)?;
    let mut renderer = ctx.renderer();
    let report = pipeline
        .run(&mut renderer)
        .context("catalog refresh failed")?;
    ctx.print_report(&report)
}

/// Handle `fetch-ships`: fetch and cache the ship catalog only.
pub fn handle_fetch_ships(ctx: &RunContext) -> Result<()> {
    ctx.config.require_application_id()?;
    let pipeline = build_pipeline(ctx)?;
    let mut renderer = ctx.renderer();
    let report = pipeline
        .fetch_ships_only(&mut renderer)
        .context("ship catalog fetch failed")?;
    ctx.print_report(&report)
}
