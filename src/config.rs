//! Simulation configuration and species replay files.
//!
//! [`SimConfig`] maps to a `config.toml`:
//!
//! ```toml
//! [world]
//! width = 200
//! height = 150
//! wrap = true
//! seed = 42
//!
//! [zones]
//! layout = "random"
//! shifting = true
//! shift_interval = 100
//! ```
//!
//! Species line-ups replay from a JSON list of `{name, population,
//! traits}` records. Absent trait fields take the species defaults, and
//! legacy mobility fields (`can_move`, `movement_strategy`,
//! `is_predator`, `movement_cost`) are silently dropped: movement is
//! derived from complexity now.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SimError;
use crate::species::{EnergySource, SpeciesTraits};
use crate::zones::{ZoneKind, ZoneLayout};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub width: u16,
    pub height: u16,
    pub wrap: bool,
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 150,
            wrap: true,
            seed: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ZonesConfig {
    pub layout: ZoneLayout,
    /// Extra shift passes beyond the regular cycle.
    pub shifting: bool,
    pub shift_interval: u64,
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            layout: ZoneLayout::Random,
            shifting: false,
            shift_interval: 100,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub zones: ZonesConfig,
}

impl SimConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

/// One species entry in a replay file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpeciesEntry {
    pub name: String,
    pub population: usize,
    #[serde(default)]
    pub traits: TraitOverrides,
}

/// Trait fields as they appear on disk; every one is optional and falls
/// back to the default trait record. Unknown keys are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct TraitOverrides {
    pub base_energy: Option<i32>,
    pub energy_decay: Option<i32>,
    pub energy_from_birth: Option<i32>,
    pub photosynthesis_rate: Option<i32>,
    pub movement_range: Option<i32>,
    pub hunting_efficiency: Option<f64>,
    pub can_be_consumed: Option<bool>,
    pub colonial_affinity: Option<f64>,
    pub cluster_reproduction_bonus: Option<f64>,
    pub reproduction_threshold: Option<i32>,
    pub mutation_rate: Option<f64>,
    pub sexual_reproduction: Option<bool>,
    pub complexity: Option<i32>,
    pub metabolic_efficiency: Option<f64>,
    pub heat_tolerance: Option<f64>,
    pub cold_tolerance: Option<f64>,
    pub toxin_resistance: Option<f64>,
    pub max_lifespan: Option<i32>,
    pub age_decline_start: Option<f64>,
    pub energy_source: Option<EnergySource>,
    pub starvation_threshold: Option<i32>,
    pub optimal_zone_bonus: Option<f64>,
    pub native_zone_type: Option<ZoneKind>,
    pub native_zone_affinity: Option<f64>,
    pub color: Option<(u8, u8, u8)>,
}

impl TraitOverrides {
    /// Build a sanitized trait record, defaulting every absent field.
    pub fn resolve(&self) -> SpeciesTraits {
        let d = SpeciesTraits::default();
        SpeciesTraits {
            base_energy: self.base_energy.unwrap_or(d.base_energy),
            energy_decay: self.energy_decay.unwrap_or(d.energy_decay),
            energy_from_birth: self.energy_from_birth.unwrap_or(d.energy_from_birth),
            photosynthesis_rate: self.photosynthesis_rate.unwrap_or(d.photosynthesis_rate),
            movement_range: self.movement_range.unwrap_or(d.movement_range),
            movement_cost: d.movement_cost,
            hunting_efficiency: self.hunting_efficiency.unwrap_or(d.hunting_efficiency),
            can_be_consumed: self.can_be_consumed.unwrap_or(d.can_be_consumed),
            colonial_affinity: self.colonial_affinity.unwrap_or(d.colonial_affinity),
            cluster_reproduction_bonus: self
                .cluster_reproduction_bonus
                .unwrap_or(d.cluster_reproduction_bonus),
            reproduction_threshold: self
                .reproduction_threshold
                .unwrap_or(d.reproduction_threshold),
            mutation_rate: self.mutation_rate.unwrap_or(d.mutation_rate),
            sexual_reproduction: self.sexual_reproduction.unwrap_or(d.sexual_reproduction),
            complexity: self.complexity.unwrap_or(d.complexity),
            metabolic_efficiency: self.metabolic_efficiency.unwrap_or(d.metabolic_efficiency),
            heat_tolerance: self.heat_tolerance.unwrap_or(d.heat_tolerance),
            cold_tolerance: self.cold_tolerance.unwrap_or(d.cold_tolerance),
            toxin_resistance: self.toxin_resistance.unwrap_or(d.toxin_resistance),
            max_lifespan: self.max_lifespan.unwrap_or(d.max_lifespan),
            age_decline_start: self.age_decline_start.unwrap_or(d.age_decline_start),
            energy_source: self.energy_source.unwrap_or(d.energy_source),
            starvation_threshold: self
                .starvation_threshold
                .unwrap_or(d.starvation_threshold),
            optimal_zone_bonus: self.optimal_zone_bonus.unwrap_or(d.optimal_zone_bonus),
            native_zone_type: self.native_zone_type.unwrap_or(d.native_zone_type),
            native_zone_affinity: self.native_zone_affinity.unwrap_or(d.native_zone_affinity),
            color: self.color.unwrap_or(d.color),
        }
        .sanitize()
    }

    pub fn from_traits(traits: &SpeciesTraits) -> Self {
        Self {
            base_energy: Some(traits.base_energy),
            energy_decay: Some(traits.energy_decay),
            energy_from_birth: Some(traits.energy_from_birth),
            photosynthesis_rate: Some(traits.photosynthesis_rate),
            movement_range: Some(traits.movement_range),
            hunting_efficiency: Some(traits.hunting_efficiency),
            can_be_consumed: Some(traits.can_be_consumed),
            colonial_affinity: Some(traits.colonial_affinity),
            cluster_reproduction_bonus: Some(traits.cluster_reproduction_bonus),
            reproduction_threshold: Some(traits.reproduction_threshold),
            mutation_rate: Some(traits.mutation_rate),
            sexual_reproduction: Some(traits.sexual_reproduction),
            complexity: Some(traits.complexity),
            metabolic_efficiency: Some(traits.metabolic_efficiency),
            heat_tolerance: Some(traits.heat_tolerance),
            cold_tolerance: Some(traits.cold_tolerance),
            toxin_resistance: Some(traits.toxin_resistance),
            max_lifespan: Some(traits.max_lifespan),
            age_decline_start: Some(traits.age_decline_start),
            energy_source: Some(traits.energy_source),
            starvation_threshold: Some(traits.starvation_threshold),
            optimal_zone_bonus: Some(traits.optimal_zone_bonus),
            native_zone_type: Some(traits.native_zone_type),
            native_zone_affinity: Some(traits.native_zone_affinity),
            color: Some(traits.color),
        }
    }
}

pub fn load_species(path: impl AsRef<Path>) -> Result<Vec<SpeciesEntry>, SimError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn save_species(path: impl AsRef<Path>, entries: &[SpeciesEntry]) -> Result<(), SimError> {
    let text = serde_json::to_string_pretty(entries)?;
    std::fs::write(path, text)?;
    Ok(())
}
