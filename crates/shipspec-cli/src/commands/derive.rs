//! Offline re-derivation from the cached catalogs.

use anyhow::{Context, Result};

use shipspec_lib::derive_from_cache;

use super::RunContext;

/// Handle `derive`: rebuild `specs.json` from `ships.json` and `modules.json`.
pub fn handle_derive(ctx: &RunContext) -> Result<()> {
    let store = ctx.store();
    let mut renderer = ctx.renderer();
    let report = derive_from_cache(&store, &mut renderer).with_context(|| {
        format!(
            "failed to derive specs from cache at {}; run `shipspec refresh` first",
            ctx.cache_dir.display()
        )
    })?;
    ctx.print_report(&report)
}
