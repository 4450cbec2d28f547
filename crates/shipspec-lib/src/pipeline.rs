//! Catalog refresh pipeline.
//!
//! A run is an ordered list of [`Stage`]s: fetch ships, save, fetch modules,
//! save, reload both, derive specs, save specs. Every stage reports progress
//! through a [`PipelineObserver`]. The first failing stage ends the run with
//! [`Error::Stage`], which names the stage; later stages never start.

use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use crate::attach::UnresolvedModule;
use crate::config::ApiConfig;
use crate::derive::derive_all;
use crate::error::{Error, Result};
use crate::fetch::Transport;
use crate::model::{Catalog, Module, RecordId, Ship};
use crate::paginate::{CatalogQuery, PaginatedCollector};
use crate::progress::ProgressSink;
use crate::rate_limit::RateLimiter;
use crate::store::{BlobStore, MODULES_BLOB, SHIPS_BLOB, SPECS_BLOB};

/// One step of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    FetchShips,
    SaveShips,
    FetchModules,
    SaveModules,
    LoadShips,
    LoadModules,
    DeriveSpecs,
    SaveSpecs,
}

impl Stage {
    /// Every stage of a full run, in execution order.
    pub const ALL: [Stage; 8] = [
        Stage::FetchShips,
        Stage::SaveShips,
        Stage::FetchModules,
        Stage::SaveModules,
        Stage::LoadShips,
        Stage::LoadModules,
        Stage::DeriveSpecs,
        Stage::SaveSpecs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::FetchShips => "fetch-ships",
            Stage::SaveShips => "save-ships",
            Stage::FetchModules => "fetch-modules",
            Stage::SaveModules => "save-modules",
            Stage::LoadShips => "load-ships",
            Stage::LoadModules => "load-modules",
            Stage::DeriveSpecs => "derive-specs",
            Stage::SaveSpecs => "save-specs",
        }
    }

    /// Operator-facing description of the stage.
    pub fn description(&self) -> &'static str {
        match self {
            Stage::FetchShips => "Retrieving list of available warships",
            Stage::SaveShips => "Saving (ships.json)",
            Stage::FetchModules => "Retrieving list of available modules",
            Stage::SaveModules => "Saving (modules.json)",
            Stage::LoadShips => "Loading saved ships data",
            Stage::LoadModules => "Loading saved modules data",
            Stage::DeriveSpecs => "Calculating ship specifications based on API data",
            Stage::SaveSpecs => "Saving (specs.json)",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Stage {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Receives stage lifecycle and progress events.
///
/// Within a stage, `progress` starts at count 0 and never decreases.
pub trait PipelineObserver {
    fn stage_started(&mut self, _stage: Stage) {}
    fn progress(&mut self, _stage: Stage, _total: u64, _count: u64) {}
    fn stage_finished(&mut self, _stage: Stage) {}
    fn stage_failed(&mut self, _stage: Stage, _error: &Error) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl PipelineObserver for SilentObserver {}

/// Summary of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<Stage>,
    pub ships: usize,
    pub modules: usize,
    pub specs: usize,
    /// Module references that were missing from the module catalog.
    pub unresolved: Vec<(RecordId, UnresolvedModule)>,
}

/// Fetches both catalogs, caches them and derives the spec catalog.
pub struct CatalogPipeline<T, L, S> {
    collector: PaginatedCollector<T, L>,
    store: S,
    config: ApiConfig,
}

impl<T: Transport, L: RateLimiter, S: BlobStore> CatalogPipeline<T, L, S> {
    pub fn new(collector: PaginatedCollector<T, L>, store: S, config: ApiConfig) -> Self {
        Self {
            collector,
            store,
            config,
        }
    }

    /// Run every stage in order.
    pub fn run(&self, observer: &mut dyn PipelineObserver) -> Result<PipelineReport> {
        let mut runner = StageRunner::new(observer);

        let ships: Catalog<Value> = runner.run(Stage::FetchShips, |sink| {
            let query = CatalogQuery::ships(&self.config)?;
            self.collector.collect(&query, sink)
        })?;
        runner.run(Stage::SaveShips, |sink| save(&self.store, SHIPS_BLOB, &ships, sink))?;
        drop(ships);

        let modules: Catalog<Value> = runner.run(Stage::FetchModules, |sink| {
            let query = CatalogQuery::modules(&self.config)?;
            self.collector.collect(&query, sink)
        })?;
        runner.run(Stage::SaveModules, |sink| {
            save(&self.store, MODULES_BLOB, &modules, sink)
        })?;
        drop(modules);

        let mut report = derive_stages(&self.store, &mut runner)?;
        report.stages = runner.finish();
        info!(
            ships = report.ships,
            modules = report.modules,
            specs = report.specs,
            "catalog refresh complete"
        );
        Ok(report)
    }

    /// Fetch and cache the ship catalog only.
    pub fn fetch_ships_only(&self, observer: &mut dyn PipelineObserver) -> Result<PipelineReport> {
        let mut runner = StageRunner::new(observer);

        let ships: Catalog<Value> = runner.run(Stage::FetchShips, |sink| {
            let query = CatalogQuery::ships(&self.config)?;
            self.collector.collect(&query, sink)
        })?;
        runner.run(Stage::SaveShips, |sink| save(&self.store, SHIPS_BLOB, &ships, sink))?;

        Ok(PipelineReport {
            stages: runner.finish(),
            ships: ships.len(),
            ..PipelineReport::default()
        })
    }

    /// Re-derive specs from the cached catalogs without touching the network.
    pub fn derive_from_cache(&self, observer: &mut dyn PipelineObserver) -> Result<PipelineReport> {
        derive_from_cache(&self.store, observer)
    }
}

/// Load the cached ship and module catalogs, derive specs and save them.
pub fn derive_from_cache<S: BlobStore>(
    store: &S,
    observer: &mut dyn PipelineObserver,
) -> Result<PipelineReport> {
    let mut runner = StageRunner::new(observer);
    let mut report = derive_stages(store, &mut runner)?;
    report.stages = runner.finish();
    Ok(report)
}

fn derive_stages<S: BlobStore>(store: &S, runner: &mut StageRunner<'_>) -> Result<PipelineReport> {
    let ships: Catalog<Ship> = runner.run(Stage::LoadShips, |sink| load(store, SHIPS_BLOB, sink))?;
    let modules: Catalog<Module> =
        runner.run(Stage::LoadModules, |sink| load(store, MODULES_BLOB, sink))?;

    let derived = runner.run(Stage::DeriveSpecs, |sink| {
        Ok(derive_all(&ships, &modules, sink))
    })?;
    runner.run(Stage::SaveSpecs, |sink| {
        save(store, SPECS_BLOB, &derived.specs, sink)
    })?;

    Ok(PipelineReport {
        stages: Vec::new(),
        ships: ships.len(),
        modules: modules.len(),
        specs: derived.specs.len(),
        unresolved: derived.unresolved,
    })
}

fn save<S: BlobStore, V: Serialize + ?Sized>(
    store: &S,
    path: &str,
    value: &V,
    sink: &mut dyn ProgressSink,
) -> Result<()> {
    sink.update(1, 0);
    store.save(Path::new(path), value)?;
    sink.update(1, 1);
    Ok(())
}

fn load<S: BlobStore, V: DeserializeOwned>(
    store: &S,
    path: &str,
    sink: &mut dyn ProgressSink,
) -> Result<V> {
    sink.update(1, 0);
    let value = store.load(Path::new(path))?;
    sink.update(1, 1);
    Ok(value)
}

/// Runs stages one at a time, forwarding events to the observer and tagging
/// failures with their stage.
struct StageRunner<'o> {
    observer: &'o mut dyn PipelineObserver,
    completed: Vec<Stage>,
}

impl<'o> StageRunner<'o> {
    fn new(observer: &'o mut dyn PipelineObserver) -> Self {
        Self {
            observer,
            completed: Vec::new(),
        }
    }

    fn run<R>(
        &mut self,
        stage: Stage,
        body: impl FnOnce(&mut dyn ProgressSink) -> Result<R>,
    ) -> Result<R> {
        info!(stage = %stage, "{}", stage.description());
        self.observer.stage_started(stage);

        let outcome = {
            let mut sink = StageSink {
                observer: &mut *self.observer,
                stage,
            };
            body(&mut sink)
        };

        match outcome {
            Ok(value) => {
                self.observer.stage_finished(stage);
                self.completed.push(stage);
                Ok(value)
            }
            Err(err) => {
                error!(stage = %stage, error = %err, "stage failed");
                self.observer.stage_failed(stage, &err);
                Err(err.in_stage(stage))
            }
        }
    }

    fn finish(self) -> Vec<Stage> {
        self.completed
    }
}

struct StageSink<'a> {
    observer: &'a mut dyn PipelineObserver,
    stage: Stage,
}

impl ProgressSink for StageSink<'_> {
    fn update(&mut self, total: u64, count: u64) {
        self.observer.progress(self.stage, total, count);
    }
}
