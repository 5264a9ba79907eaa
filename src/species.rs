//! Species: immutable trait records, the mutation operator, and the
//! registry that owns every lineage a grid has ever produced.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::color;
use crate::rng::SimRng;
use crate::zones::ZoneKind;

pub type SpeciesId = u32;

/// The sentinel color that asks the registry to derive one from traits.
pub const UNSET_COLOR: (u8, u8, u8) = (0, 255, 0);

/// Metabolic class of a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnergySource {
    #[default]
    Photosynthesis,
    Predation,
    Hybrid,
}

/// Movement policy, derived from complexity and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Seek,
    Flee,
    Hunt,
}

/// Heritable numeric traits of a species. Immutable once registered;
/// construction clamps every field into its range and derives
/// `movement_cost` from complexity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTraits {
    /// Energy of a newly born cell, in [1, 200].
    pub base_energy: i32,
    /// Base per-tick loss, in [0, 10].
    pub energy_decay: i32,
    /// Parent's cost to produce offspring.
    pub energy_from_birth: i32,
    /// Base per-tick gain, in [0, 20].
    pub photosynthesis_rate: i32,
    /// Radius in Chebyshev distance.
    pub movement_range: i32,
    /// Derived: `1 + complexity / 2`.
    pub movement_cost: i32,
    /// Stored share of prey energy, in [0, 0.8]; phase 3 uses the
    /// complexity-derived share from [`Self::hunting_gain`].
    pub hunting_efficiency: f64,
    pub can_be_consumed: bool,
    /// Same-species adjacency multiplier on metabolism, in [1.0, 1.5].
    pub colonial_affinity: f64,
    /// Reproduction-threshold divisor in clusters, in [1.0, 2.0].
    pub cluster_reproduction_bonus: f64,
    /// Minimum energy to reproduce.
    pub reproduction_threshold: i32,
    /// Per-birth mutation probability, in [0, 1].
    pub mutation_rate: f64,
    /// Requires a second same-species neighbor to reproduce.
    pub sexual_reproduction: bool,
    /// Gates strategy and hunting ability, in [1, 5].
    pub complexity: i32,
    /// Divisor on energy gain, in [0.5, 2.0].
    pub metabolic_efficiency: f64,
    pub heat_tolerance: f64,
    pub cold_tolerance: f64,
    pub toxin_resistance: f64,
    /// In [0, 1000]; zero means immortal.
    pub max_lifespan: i32,
    /// Fraction of lifespan at which decay ramps up, in [0, 1].
    pub age_decline_start: f64,
    pub energy_source: EnergySource,
    /// Dies below this outside an optimal zone.
    pub starvation_threshold: i32,
    /// Gain multiplier inside an optimal zone.
    pub optimal_zone_bonus: f64,
    /// Zone kind where reproduction is favored.
    pub native_zone_type: ZoneKind,
    /// Reproduction-threshold divisor in the native zone, in [1.0, 2.0].
    pub native_zone_affinity: f64,
    pub color: (u8, u8, u8),
}

impl Default for SpeciesTraits {
    fn default() -> Self {
        Self {
            base_energy: 100,
            energy_decay: 2,
            energy_from_birth: 50,
            photosynthesis_rate: 3,
            movement_range: 1,
            movement_cost: 1,
            hunting_efficiency: 0.5,
            can_be_consumed: true,
            colonial_affinity: 1.2,
            cluster_reproduction_bonus: 1.3,
            reproduction_threshold: 60,
            mutation_rate: 0.01,
            sexual_reproduction: false,
            complexity: 1,
            metabolic_efficiency: 1.0,
            heat_tolerance: 0.5,
            cold_tolerance: 0.5,
            toxin_resistance: 0.5,
            max_lifespan: 200,
            age_decline_start: 0.7,
            energy_source: EnergySource::Photosynthesis,
            starvation_threshold: 10,
            optimal_zone_bonus: 2.0,
            native_zone_type: ZoneKind::Fertile,
            native_zone_affinity: 1.5,
            color: UNSET_COLOR,
        }
    }
}

impl SpeciesTraits {
    /// Clamp every numeric trait into its range and rederive the fields
    /// that are functions of other traits.
    #[must_use]
    pub fn sanitize(mut self) -> Self {
        self.base_energy = self.base_energy.clamp(1, 200);
        self.energy_decay = self.energy_decay.clamp(0, 10);
        self.energy_from_birth = self.energy_from_birth.max(1);
        self.photosynthesis_rate = self.photosynthesis_rate.clamp(0, 20);
        self.movement_range = self.movement_range.max(1);
        self.hunting_efficiency = self.hunting_efficiency.clamp(0.0, 0.8);
        self.colonial_affinity = self.colonial_affinity.clamp(1.0, 1.5);
        self.cluster_reproduction_bonus = self.cluster_reproduction_bonus.clamp(1.0, 2.0);
        self.reproduction_threshold = self.reproduction_threshold.max(1);
        self.mutation_rate = self.mutation_rate.clamp(0.0, 1.0);
        self.complexity = self.complexity.clamp(1, 5);
        self.metabolic_efficiency = self.metabolic_efficiency.clamp(0.5, 2.0);
        self.heat_tolerance = self.heat_tolerance.clamp(0.0, 1.0);
        self.cold_tolerance = self.cold_tolerance.clamp(0.0, 1.0);
        self.toxin_resistance = self.toxin_resistance.clamp(0.0, 1.0);
        self.max_lifespan = self.max_lifespan.clamp(0, 1000);
        self.age_decline_start = self.age_decline_start.clamp(0.0, 1.0);
        self.starvation_threshold = self.starvation_threshold.max(0);
        self.optimal_zone_bonus = self.optimal_zone_bonus.clamp(1.0, 3.0);
        self.native_zone_affinity = self.native_zone_affinity.clamp(1.0, 2.0);
        if self.native_zone_type == ZoneKind::Void {
            self.native_zone_type = ZoneKind::Neutral;
        }
        self.movement_cost = 1 + self.complexity / 2;
        self
    }

    /// Upkeep multiplier for structural complexity.
    pub fn complexity_cost(&self) -> f64 {
        1.0 + f64::from(self.complexity - 1) * 0.3
    }

    /// Zone-specific multiplier from the species' tolerances.
    pub fn adaptation_bonus(&self, zone: ZoneKind) -> f64 {
        match zone {
            ZoneKind::Desert => 0.5 + self.heat_tolerance,
            ZoneKind::Fertile => 1.0 + (1.0 - (self.heat_tolerance - 0.5).abs()) * 0.5,
            ZoneKind::Toxic => 0.3 + self.toxin_resistance * 1.2,
            ZoneKind::Paradise => 1.5,
            _ => 1.0,
        }
    }

    /// Whether a zone counts as this species' optimal habitat.
    pub fn is_optimal_zone(&self, zone: ZoneKind) -> bool {
        match zone {
            ZoneKind::Desert => self.heat_tolerance > 0.7,
            ZoneKind::Fertile => (0.4..=0.6).contains(&self.heat_tolerance),
            ZoneKind::Toxic => self.toxin_resistance > 0.7,
            ZoneKind::Paradise => true,
            _ => false,
        }
    }

    /// Gain multiplier from food availability for the metabolic class.
    pub fn food_source_multiplier(&self, has_prey_nearby: bool) -> f64 {
        match self.energy_source {
            EnergySource::Photosynthesis => 1.0,
            EnergySource::Predation => {
                if has_prey_nearby {
                    2.0
                } else {
                    0.1
                }
            }
            EnergySource::Hybrid => {
                if has_prey_nearby {
                    1.5
                } else {
                    0.7
                }
            }
        }
    }

    /// Movement policy is a pure function of complexity.
    pub fn movement_strategy(&self) -> Strategy {
        match self.complexity {
            1 => Strategy::Seek,
            2 => Strategy::Flee,
            _ => Strategy::Hunt,
        }
    }

    pub fn can_hunt(&self) -> bool {
        self.complexity >= 3
    }

    /// Share of prey energy a hunter actually extracts; scales with
    /// complexity, capped at 0.8.
    pub fn hunting_gain(&self) -> f64 {
        if !self.can_hunt() {
            return 0.0;
        }
        (0.35 + f64::from(self.complexity) * 0.15).min(0.8)
    }

    /// Independent per-trait perturbations for a mutant lineage. The
    /// result is clamped and recolored.
    #[must_use]
    pub fn mutated(&self, rng: &mut SimRng) -> SpeciesTraits {
        let mut next = SpeciesTraits {
            base_energy: jitter_int(self.base_energy, 5, rng),
            energy_decay: jitter_int(self.energy_decay, 1, rng),
            energy_from_birth: jitter_int(self.energy_from_birth, 5, rng),
            photosynthesis_rate: jitter_int(self.photosynthesis_rate, 1, rng),
            movement_range: jitter_int(self.movement_range, 1, rng),
            movement_cost: self.movement_cost,
            hunting_efficiency: jitter_float(self.hunting_efficiency, 0.1, rng),
            can_be_consumed: self.can_be_consumed,
            colonial_affinity: jitter_float(self.colonial_affinity, 0.1, rng),
            cluster_reproduction_bonus: jitter_float(self.cluster_reproduction_bonus, 0.1, rng),
            reproduction_threshold: jitter_int(self.reproduction_threshold, 5, rng),
            mutation_rate: jitter_float(self.mutation_rate, 0.005, rng),
            sexual_reproduction: self.sexual_reproduction ^ rng.gen_bool(0.02),
            complexity: jitter_int(self.complexity, 1, rng),
            metabolic_efficiency: jitter_float(self.metabolic_efficiency, 0.1, rng),
            heat_tolerance: jitter_float(self.heat_tolerance, 0.1, rng),
            cold_tolerance: jitter_float(self.cold_tolerance, 0.1, rng),
            toxin_resistance: jitter_float(self.toxin_resistance, 0.1, rng),
            max_lifespan: jitter_int(self.max_lifespan, 20, rng),
            age_decline_start: jitter_float(self.age_decline_start, 0.1, rng),
            energy_source: mutate_energy_source(self.energy_source, rng),
            starvation_threshold: jitter_int(self.starvation_threshold, 3, rng),
            optimal_zone_bonus: jitter_float(self.optimal_zone_bonus, 0.2, rng),
            native_zone_type: mutate_native_zone(self.native_zone_type, rng),
            native_zone_affinity: jitter_float(self.native_zone_affinity, 0.1, rng),
            color: self.color,
        }
        .sanitize();
        next.color = color::species_color(&next);
        next
    }
}

fn jitter_int(value: i32, delta: i32, rng: &mut SimRng) -> i32 {
    value + rng.gen_range(-delta..=delta)
}

fn jitter_float(value: f64, delta: f64, rng: &mut SimRng) -> f64 {
    value + rng.gen_range(-delta..=delta)
}

fn mutate_energy_source(current: EnergySource, rng: &mut SimRng) -> EnergySource {
    if !rng.gen_bool(0.05) {
        return current;
    }
    let others: Vec<EnergySource> = [
        EnergySource::Photosynthesis,
        EnergySource::Predation,
        EnergySource::Hybrid,
    ]
    .into_iter()
    .filter(|s| *s != current)
    .collect();
    *others.choose(rng).expect("two alternatives remain")
}

fn mutate_native_zone(current: ZoneKind, rng: &mut SimRng) -> ZoneKind {
    if !rng.gen_bool(0.02) {
        return current;
    }
    if rng.gen_bool(0.7) {
        *current.adjacent().choose(rng).expect("adjacency is non-empty")
    } else {
        *ZoneKind::NATIVE_POOL.choose(rng).expect("pool is non-empty")
    }
}

/// A lineage: one trait record plus running bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,
    pub parent_id: Option<SpeciesId>,
    pub generation_born: u64,
    pub traits: SpeciesTraits,
    pub population: u32,
    pub total_births: u64,
    pub total_deaths: u64,
}

/// Owns every species ever created in one grid, living and extinct, with
/// its own monotonic id counter so simulations stay independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesRegistry {
    next_id: SpeciesId,
    species: BTreeMap<SpeciesId, Species>,
    extinct: BTreeSet<SpeciesId>,
}

impl Default for SpeciesRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeciesRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            species: BTreeMap::new(),
            extinct: BTreeSet::new(),
        }
    }

    /// Register a founding species. Traits are sanitized; the sentinel
    /// color is replaced with one derived from the traits.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        traits: SpeciesTraits,
        generation_born: u64,
    ) -> SpeciesId {
        self.insert(name.into(), traits, None, generation_born)
    }

    /// Register a mutant of an existing lineage.
    pub fn spawn_mutant(
        &mut self,
        parent_id: SpeciesId,
        generation: u64,
        rng: &mut SimRng,
    ) -> SpeciesId {
        let parent = self
            .species
            .get(&parent_id)
            .expect("mutation parent was never registered");
        let traits = parent.traits.mutated(rng);
        let name = format!("{}_m{}", parent.name, generation);
        self.insert(name, traits, Some(parent_id), generation)
    }

    fn insert(
        &mut self,
        name: String,
        traits: SpeciesTraits,
        parent_id: Option<SpeciesId>,
        generation_born: u64,
    ) -> SpeciesId {
        let mut traits = traits.sanitize();
        if traits.color == UNSET_COLOR {
            traits.color = color::species_color(&traits);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.species.insert(
            id,
            Species {
                id,
                name,
                parent_id,
                generation_born,
                traits,
                population: 0,
                total_births: 0,
                total_deaths: 0,
            },
        );
        id
    }

    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(&id)
    }

    pub fn is_extinct(&self, id: SpeciesId) -> bool {
        self.extinct.contains(&id)
    }

    /// Every species ever issued, in id order.
    pub fn all(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    /// Species whose lineage still has living cells, in id order.
    pub fn living(&self) -> impl Iterator<Item = &Species> {
        self.species
            .values()
            .filter(|s| !self.extinct.contains(&s.id))
    }

    pub fn living_count(&self) -> usize {
        self.living().count()
    }

    pub fn total_count(&self) -> usize {
        self.species.len()
    }

    /// Reassign the native habitat after seeding settles where a lineage
    /// actually lives; the display color follows the traits.
    pub fn set_native_zone(&mut self, id: SpeciesId, kind: ZoneKind) {
        if kind == ZoneKind::Void {
            return;
        }
        if let Some(species) = self.species.get_mut(&id) {
            species.traits.native_zone_type = kind;
            species.traits.color = color::species_color(&species.traits);
        }
    }

    pub fn record_placement(&mut self, id: SpeciesId) {
        if let Some(species) = self.species.get_mut(&id) {
            species.population += 1;
        }
    }

    pub fn record_birth(&mut self, id: SpeciesId) {
        if let Some(species) = self.species.get_mut(&id) {
            species.population += 1;
            species.total_births += 1;
        }
    }

    pub fn record_death(&mut self, id: SpeciesId) {
        if let Some(species) = self.species.get_mut(&id) {
            species.population = species.population.saturating_sub(1);
            species.total_deaths += 1;
        }
    }

    /// Recompute populations from the living cells and move lineages whose
    /// count reached zero into the extinct set.
    pub fn update_populations<I: IntoIterator<Item = SpeciesId>>(&mut self, living_cells: I) {
        for species in self.species.values_mut() {
            species.population = 0;
        }
        for id in living_cells {
            if let Some(species) = self.species.get_mut(&id) {
                species.population += 1;
            }
        }
        let species = &self.species;
        self.extinct.retain(|id| {
            species.get(id).map(|s| s.population == 0).unwrap_or(true)
        });
        for s in self.species.values() {
            if s.population == 0 && !self.extinct.contains(&s.id) {
                tracing::debug!(species = s.id, name = %s.name, "species extinct");
                self.extinct.insert(s.id);
            }
        }
    }

    /// Most populous living species; ties break toward the older id.
    pub fn dominant(&self) -> Option<SpeciesId> {
        let mut best: Option<(&Species, u32)> = None;
        for s in self.living() {
            match best {
                Some((_, pop)) if s.population <= pop => {}
                _ => best = Some((s, s.population)),
            }
        }
        best.map(|(s, _)| s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn sanitize_clamps_into_ranges() {
        let traits = SpeciesTraits {
            base_energy: 9999,
            energy_decay: -3,
            photosynthesis_rate: 50,
            complexity: 12,
            metabolic_efficiency: 0.01,
            colonial_affinity: 3.0,
            hunting_efficiency: 1.5,
            max_lifespan: 5000,
            native_zone_type: ZoneKind::Void,
            ..SpeciesTraits::default()
        }
        .sanitize();
        assert_eq!(traits.base_energy, 200);
        assert_eq!(traits.energy_decay, 0);
        assert_eq!(traits.photosynthesis_rate, 20);
        assert_eq!(traits.complexity, 5);
        assert_eq!(traits.metabolic_efficiency, 0.5);
        assert_eq!(traits.colonial_affinity, 1.5);
        assert_eq!(traits.hunting_efficiency, 0.8);
        assert_eq!(traits.max_lifespan, 1000);
        assert_eq!(traits.native_zone_type, ZoneKind::Neutral);
    }

    #[test]
    fn movement_cost_tracks_complexity() {
        for (complexity, cost) in [(1, 1), (2, 2), (3, 2), (4, 3), (5, 3)] {
            let traits = SpeciesTraits {
                complexity,
                ..SpeciesTraits::default()
            }
            .sanitize();
            assert_eq!(traits.movement_cost, cost);
        }
    }

    #[test]
    fn strategy_follows_complexity() {
        let seek = SpeciesTraits::default().sanitize();
        assert_eq!(seek.movement_strategy(), Strategy::Seek);
        let flee = SpeciesTraits {
            complexity: 2,
            ..seek
        }
        .sanitize();
        assert_eq!(flee.movement_strategy(), Strategy::Flee);
        let hunt = SpeciesTraits {
            complexity: 3,
            ..seek
        }
        .sanitize();
        assert_eq!(hunt.movement_strategy(), Strategy::Hunt);
        assert!(hunt.can_hunt());
        assert!(!flee.can_hunt());
    }

    #[test]
    fn hunting_gain_scales_and_caps() {
        let mk = |complexity| {
            SpeciesTraits {
                complexity,
                ..SpeciesTraits::default()
            }
            .sanitize()
        };
        assert_eq!(mk(1).hunting_gain(), 0.0);
        assert!((mk(3).hunting_gain() - 0.8).abs() < 1e-9);
        assert!((mk(5).hunting_gain() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn mutants_stay_inside_trait_ranges() {
        let mut rng = SimRng::seed_from_u64(11);
        let mut traits = SpeciesTraits::default().sanitize();
        for _ in 0..500 {
            traits = traits.mutated(&mut rng);
            assert!((1..=200).contains(&traits.base_energy));
            assert!((0..=10).contains(&traits.energy_decay));
            assert!((0..=20).contains(&traits.photosynthesis_rate));
            assert!((1..=5).contains(&traits.complexity));
            assert!((0.0..=1.0).contains(&traits.mutation_rate));
            assert!((0.0..=0.8).contains(&traits.hunting_efficiency));
            assert!((1.0..=1.5).contains(&traits.colonial_affinity));
            assert!((0.5..=2.0).contains(&traits.metabolic_efficiency));
            assert!((0..=1000).contains(&traits.max_lifespan));
            assert!((1.0..=2.0).contains(&traits.native_zone_affinity));
            assert_ne!(traits.native_zone_type, ZoneKind::Void);
            assert_eq!(traits.movement_cost, 1 + traits.complexity / 2);
        }
    }

    #[test]
    fn registry_ids_ascend_and_persist() {
        let mut rng = SimRng::seed_from_u64(3);
        let mut registry = SpeciesRegistry::new();
        let a = registry.register("alpha", SpeciesTraits::default(), 0);
        let b = registry.register("beta", SpeciesTraits::default(), 0);
        assert!(b > a);
        let m = registry.spawn_mutant(a, 7, &mut rng);
        assert!(m > b);
        let mutant = registry.get(m).unwrap();
        assert_eq!(mutant.parent_id, Some(a));
        assert_eq!(mutant.generation_born, 7);
        assert!(mutant.name.starts_with("alpha_m7"));

        // Extinction keeps the record queryable.
        registry.update_populations([b, b]);
        assert!(registry.is_extinct(a));
        assert!(registry.is_extinct(m));
        assert!(registry.get(a).is_some());
        assert_eq!(registry.living_count(), 1);
        assert_eq!(registry.dominant(), Some(b));
    }

    #[test]
    fn default_color_is_derived_on_register() {
        let mut registry = SpeciesRegistry::new();
        let id = registry.register("green", SpeciesTraits::default(), 0);
        assert_ne!(registry.get(id).unwrap().traits.color, UNSET_COLOR);
    }
}
