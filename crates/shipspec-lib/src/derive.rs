//! Per-ship performance spec derivation.
//!
//! A [`ShipSpec`] is a pure function of one [`Ship`] and the module catalog:
//! detection ranges, top speed, ranked torpedo armament and maximum gun range.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::attach::{attach_modules, AttachedModules, UnresolvedModule};
use crate::model::{Catalog, Module, RecordId, Ship, ShipImages, TorpedoProfile};
use crate::progress::ProgressSink;

/// Upgrade id of Concealment System Modification 1.
pub const CONCEALMENT_UPGRADE_ID: RecordId = 4265791408;
/// Commander-skill concealment factor; always applied.
pub const COMMANDER_CONCEALMENT_FACTOR: f64 = 0.9;
/// Extra factor when the concealment upgrade is available.
pub const CONCEALMENT_UPGRADE_FACTOR: f64 = 0.9;

pub const ENGINE_SLOT: &str = "engine";
pub const TORPEDOES_SLOT: &str = "torpedoes";
pub const FIRE_CONTROL_SLOT: &str = "fire_control";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub default: f64,
    pub best: f64,
}

/// Derived performance summary of one ship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipSpec {
    pub detect: Detection,
    pub max_speed: f64,
    /// Best torpedo first.
    pub torpedoes: Vec<TorpedoProfile>,
    pub max_art_range: f64,
}

/// Entry of the derived catalog: display fields plus the [`ShipSpec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipSpecRecord {
    pub ship_id: RecordId,
    pub name: String,
    pub nation: String,
    pub tier: u8,
    #[serde(rename = "type")]
    pub ship_type: String,
    pub images: Option<ShipImages>,
    pub is_premium: bool,
    pub is_special: bool,
    pub spec: ShipSpec,
}

/// One derived record plus the module references it could not resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedShip {
    pub record: ShipSpecRecord,
    pub unresolved: Vec<UnresolvedModule>,
}

/// Result of deriving a whole ship catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedCatalog {
    pub specs: Catalog<ShipSpecRecord>,
    /// Unresolved references as `(ship_id, reference)`.
    pub unresolved: Vec<(RecordId, UnresolvedModule)>,
}

/// Round to one decimal place, halves away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Default and best-case detection by sea.
pub fn detection(ship: &Ship) -> Detection {
    let default = ship.detect_distance_by_ship().unwrap_or(0.0);
    let upgrade = if ship.has_upgrade(CONCEALMENT_UPGRADE_ID) {
        CONCEALMENT_UPGRADE_FACTOR
    } else {
        1.0
    };
    Detection {
        default,
        best: round1(default * COMMANDER_CONCEALMENT_FACTOR * upgrade),
    }
}

/// Fastest engine among the attached ones; 0 without engines.
pub fn max_speed(attached: &AttachedModules<'_>) -> f64 {
    max_or_zero(
        attached
            .slot(ENGINE_SLOT)
            .filter_map(|module| module.profile.engine.as_ref()?.max_speed),
    )
}

/// Torpedo profiles ranked by range, then speed, then damage, best first.
pub fn ranked_torpedoes(attached: &AttachedModules<'_>) -> Vec<TorpedoProfile> {
    let mut torpedoes: Vec<TorpedoProfile> = attached
        .slot(TORPEDOES_SLOT)
        .filter_map(|module| module.profile.torpedoes.clone())
        .collect();
    torpedoes.sort_by(|a, b| torpedo_rank(b, a));
    torpedoes
}

/// Ascending comparison on `(distance, torpedo_speed, max_damage)`, with
/// missing values compared as 0.
pub fn torpedo_rank(a: &TorpedoProfile, b: &TorpedoProfile) -> Ordering {
    let key = |t: &TorpedoProfile| {
        [t.distance(), t.torpedo_speed(), t.max_damage()].map(|value| value.unwrap_or(0.0))
    };
    let (a, b) = (key(a), key(b));
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Longest fire-control range among the attached ones; 0 without any.
pub fn max_artillery_range(attached: &AttachedModules<'_>) -> f64 {
    let base = max_or_zero(
        attached
            .slot(FIRE_CONTROL_SLOT)
            .filter_map(|module| module.profile.fire_control.as_ref()?.distance),
    );
    apply_range_corrections(base)
}

/// Upgrade and commander-skill range modifiers. Deliberately not modelled:
/// the base range is returned unchanged.
pub fn apply_range_corrections(base: f64) -> f64 {
    base
}

/// Compute the [`ShipSpec`] of `ship` from its already attached modules.
pub fn derive_spec(ship: &Ship, attached: &AttachedModules<'_>) -> ShipSpec {
    ShipSpec {
        detect: detection(ship),
        max_speed: max_speed(attached),
        torpedoes: ranked_torpedoes(attached),
        max_art_range: max_artillery_range(attached),
    }
}

/// Attach `ship`'s modules from `modules` and derive its catalog record.
pub fn derive_record(ship: &Ship, modules: &Catalog<Module>) -> DerivedShip {
    let attached = attach_modules(&ship.modules, modules);
    let spec = derive_spec(ship, &attached);
    DerivedShip {
        record: ShipSpecRecord {
            ship_id: ship.ship_id,
            name: ship.name.clone(),
            nation: ship.nation.clone(),
            tier: ship.tier,
            ship_type: ship.ship_type.clone(),
            images: ship.images.clone(),
            is_premium: ship.is_premium,
            is_special: ship.is_special,
            spec,
        },
        unresolved: attached.into_unresolved(),
    }
}

/// Derive a record for every ship, in id order.
///
/// `sink` receives `(ships, 0)` up front and `(ships, n)` after the n-th ship.
pub fn derive_all(
    ships: &Catalog<Ship>,
    modules: &Catalog<Module>,
    sink: &mut dyn ProgressSink,
) -> DerivedCatalog {
    let total = ships.len() as u64;
    let mut derived = DerivedCatalog::default();
    sink.update(total, 0);

    for (index, (&ship_id, ship)) in ships.iter().enumerate() {
        let DerivedShip { record, unresolved } = derive_record(ship, modules);
        derived.specs.insert(ship_id, record);
        derived
            .unresolved
            .extend(unresolved.into_iter().map(|reference| (ship_id, reference)));
        sink.update(total, index as u64 + 1);
    }

    if !derived.unresolved.is_empty() {
        warn!(
            references = derived.unresolved.len(),
            "ships reference modules missing from the module catalog"
        );
    }
    info!(ships = derived.specs.len(), "ship specs derived");
    derived
}

fn max_or_zero(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(None, |best: Option<f64>, value| {
        Some(best.map_or(value, |best| best.max(value)))
    })
    .unwrap_or(0.0)
}
