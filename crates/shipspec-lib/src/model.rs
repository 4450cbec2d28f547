//! Typed views of the encyclopedia's ship and module records.
//!
//! Only the fields the spec deriver reads are modelled, each as a named
//! optional. Everything else the API sends is ignored on decode; the raw
//! catalogs are cached as untyped JSON so nothing is lost on disk.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Upstream numeric identifier (`ship_id`, `module_id`, upgrade ids).
pub type RecordId = u64;

/// Keyed collection of one record type, ordered by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog<T> {
    records: BTreeMap<RecordId, T>,
}

impl<T> Catalog<T> {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Shallow merge: new ids are added, colliding ids are overwritten.
    pub fn merge<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = (RecordId, T)>,
    {
        self.records.extend(records);
    }
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for Catalog<T> {
    type Target = BTreeMap<RecordId, T>;

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

impl<T> DerefMut for Catalog<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.records
    }
}

impl<T> FromIterator<(RecordId, T)> for Catalog<T> {
    fn from_iter<I: IntoIterator<Item = (RecordId, T)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Catalog<T> {
    type Item = (RecordId, T);
    type IntoIter = std::collections::btree_map::IntoIter<RecordId, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Ship images as published by the encyclopedia.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contour: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Concealment {
    #[serde(default)]
    pub detect_distance_by_ship: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultProfile {
    #[serde(default)]
    pub concealment: Option<Concealment>,
}

/// One warship from `encyclopedia/ships/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub ship_id: RecordId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nation: String,
    #[serde(default)]
    pub tier: u8,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub ship_type: String,
    #[serde(default)]
    pub images: Option<ShipImages>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_special: bool,
    #[serde(default)]
    pub default_profile: Option<DefaultProfile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upgrades: Vec<RecordId>,
    /// Slot category -> module ids that fit that slot, in upstream order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub modules: BTreeMap<String, Vec<RecordId>>,
}

impl Ship {
    /// Base detection range by sea; `None` when not published.
    pub fn detect_distance_by_ship(&self) -> Option<f64> {
        self.default_profile
            .as_ref()?
            .concealment
            .as_ref()?
            .detect_distance_by_ship
    }

    pub fn has_upgrade(&self, upgrade: RecordId) -> bool {
        self.upgrades.contains(&upgrade)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineProfile {
    #[serde(default)]
    pub max_speed: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FireControlProfile {
    #[serde(default)]
    pub distance: Option<f64>,
}

/// Torpedo armament profile, held exactly as the API sent it.
///
/// The ranking keys are read through accessors; the object itself is never
/// rewritten, so integers stay integers and `null`s stay in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TorpedoProfile {
    raw: Map<String, Value>,
}

impl TorpedoProfile {
    /// Range in km.
    pub fn distance(&self) -> Option<f64> {
        self.number("distance")
    }

    /// Speed in knots.
    pub fn torpedo_speed(&self) -> Option<f64> {
        self.number("torpedo_speed")
    }

    pub fn max_damage(&self) -> Option<f64> {
        self.number("max_damage")
    }

    /// Any upstream key, ranking or not.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.raw.get(key)?.as_f64()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleProfile {
    #[serde(default)]
    pub engine: Option<EngineProfile>,
    #[serde(default)]
    pub torpedoes: Option<TorpedoProfile>,
    #[serde(default)]
    pub fire_control: Option<FireControlProfile>,
}

/// One module from `encyclopedia/modules/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub module_id: RecordId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub module_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub profile: ModuleProfile,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ship_decodes_nested_concealment_and_slots() {
        let ship: Ship = serde_json::from_value(json!({
            "ship_id": 3751786480u64,
            "name": "Shimakaze",
            "nation": "japan",
            "tier": 10,
            "type": "Destroyer",
            "is_premium": false,
            "is_special": false,
            "default_profile": {"concealment": {"detect_distance_by_ship": 7.4, "total": 6}},
            "upgrades": [4265791408u64],
            "modules": {"engine": [1], "torpedoes": [2, 3], "hull": []},
            "description": "ignored"
        }))
        .unwrap();

        assert_eq!(ship.ship_type, "Destroyer");
        assert_eq!(ship.detect_distance_by_ship(), Some(7.4));
        assert!(ship.has_upgrade(4265791408));
        assert_eq!(ship.modules["torpedoes"], vec![2, 3]);
    }

    #[test]
    fn missing_and_null_fields_fall_back_to_defaults() {
        let ship: Ship = serde_json::from_value(json!({
            "ship_id": 1,
            "default_profile": null,
            "upgrades": null,
            "modules": null
        }))
        .unwrap();

        assert_eq!(ship.detect_distance_by_ship(), None);
        assert!(ship.upgrades.is_empty());
        assert!(ship.modules.is_empty());
    }

    #[test]
    fn module_keeps_only_known_profile_sections() {
        let module: Module = serde_json::from_value(json!({
            "module_id": 10,
            "type": "Torpedoes",
            "profile": {
                "torpedoes": {"distance": 12.0, "torpedo_speed": 67, "max_damage": 21967, "torpedo_name": "Type93"},
                "hull": {"health": 19000}
            }
        }))
        .unwrap();

        let torpedoes = module.profile.torpedoes.expect("torpedo profile");
        assert_eq!(torpedoes.distance(), Some(12.0));
        assert_eq!(torpedoes.torpedo_speed(), Some(67.0));
        assert_eq!(torpedoes.get("torpedo_name"), Some(&json!("Type93")));
        assert!(module.profile.engine.is_none());
    }

    #[test]
    fn torpedo_profile_serializes_back_unchanged() {
        let upstream = json!({
            "distance": 8,
            "torpedo_speed": 60,
            "max_damage": null,
            "torpedo_name": "X",
            "shot_speed": 7.5
        });
        let profile: TorpedoProfile = serde_json::from_value(upstream.clone()).unwrap();

        assert_eq!(profile.distance(), Some(8.0));
        assert_eq!(profile.max_damage(), None);
        // integer numbers stay integers, nulls stay present
        assert_eq!(serde_json::to_value(&profile).unwrap(), upstream);
        assert!(serde_json::to_string(&profile)
            .unwrap()
            .contains(r#""distance":8,"#));
    }

    #[test]
    fn catalog_merge_overwrites_colliding_ids() {
        let mut catalog: Catalog<&str> = [(1, "a"), (2, "b")].into_iter().collect();
        catalog.merge([(2, "c"), (3, "d")]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[&2], "c");
    }
}
