//! shipspec library entry points.
//!
//! This crate pulls the warship and module catalogs from the encyclopedia
//! API at a bounded request rate, caches them as JSON blobs, and derives a
//! performance spec per ship (detection, top speed, ranked torpedoes, gun
//! range). Higher-level consumers (the CLI) should only depend on the
//! functions exported here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod attach;
pub mod config;
pub mod derive;
pub mod error;
pub mod fetch;
pub mod model;
pub mod paginate;
pub mod pipeline;
pub mod progress;
pub mod rate_limit;
pub mod store;

pub use attach::{attach_modules, AttachedModules, UnresolvedModule};
pub use config::{default_cache_dir, ApiConfig};
pub use derive::{derive_all, derive_record, derive_spec, ShipSpec, ShipSpecRecord};
pub use error::{Error, Result};
pub use fetch::{FetchOutcome, HttpTransport, RateLimitedFetcher, Transport, TransportResponse};
pub use model::{Catalog, Module, RecordId, Ship, TorpedoProfile};
pub use paginate::{CatalogQuery, MissingPagePolicy, PaginatedCollector};
pub use pipeline::{
    derive_from_cache, CatalogPipeline, PipelineObserver, PipelineReport, SilentObserver, Stage,
};
pub use progress::{NoProgress, Progress, ProgressSink};
pub use rate_limit::{FixedCooldown, RateLimiter, Unthrottled};
pub use store::{BlobStore, FsBlobStore, MODULES_BLOB, SHIPS_BLOB, SPECS_BLOB};
