//! Per-site cell state and the energy metabolism applied each tick.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::species::{SpeciesId, SpeciesTraits};
use crate::zones::ZoneKind;

/// Cap on the recent-position trail.
const TRAIL_LEN: usize = 10;

/// Everything the aging phase needs to know about a cell's surroundings.
#[derive(Debug, Clone, Copy)]
pub struct MetabolismInputs {
    pub zone: ZoneKind,
    pub zone_decay_mult: f64,
    /// Same-species adjacency multiplier, 1.0 when isolated.
    pub colony_bonus: f64,
    pub has_prey_nearby: bool,
    pub population_pressure: f64,
}

/// Outcome of one metabolism step, applied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct AgingOutcome {
    pub age: i32,
    pub energy: f64,
    pub survived: bool,
}

/// A single living unit occupying one grid site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub x: u16,
    pub y: u16,
    pub species_id: SpeciesId,
    pub energy: f64,
    /// Fixed at creation to twice the species' base energy.
    pub max_energy: f64,
    /// Age in generations.
    pub age: i32,
    #[serde(skip)]
    pub moved_this_tick: bool,
    /// Last few positions, oldest first.
    pub trail: VecDeque<(u16, u16)>,
}

impl Cell {
    pub fn new(
        x: u16,
        y: u16,
        species_id: SpeciesId,
        traits: &SpeciesTraits,
        energy: Option<f64>,
    ) -> Self {
        let max_energy = f64::from(traits.base_energy) * 2.0;
        let energy = energy
            .unwrap_or(f64::from(traits.base_energy))
            .clamp(0.0, max_energy);
        Self {
            x,
            y,
            species_id,
            energy,
            max_energy,
            age: 0,
            moved_this_tick: false,
            trail: VecDeque::new(),
        }
    }

    pub fn energy_fraction(&self) -> f64 {
        if self.max_energy > 0.0 {
            self.energy / self.max_energy
        } else {
            0.0
        }
    }

    /// One generation of aging and metabolism. Pure: the caller applies
    /// the outcome, which keeps the decision pass parallel-safe.
    pub fn age_one_generation(
        &self,
        traits: &SpeciesTraits,
        inputs: &MetabolismInputs,
    ) -> AgingOutcome {
        let age = self.age + 1;
        let dead = |energy| AgingOutcome {
            age,
            energy,
            survived: false,
        };

        if traits.max_lifespan > 0 && age >= traits.max_lifespan {
            return dead(self.energy);
        }

        let adaptation = traits.adaptation_bonus(inputs.zone);
        let complexity_cost = traits.complexity_cost();
        let aging_penalty = aging_penalty(age, traits);

        let decay = (f64::from(traits.energy_decay)
            * inputs.zone_decay_mult
            * inputs.colony_bonus
            * complexity_cost
            * aging_penalty
            / adaptation)
            .round();
        let mut energy = (self.energy - decay).max(0.0);

        let food_mult = traits.food_source_multiplier(inputs.has_prey_nearby);
        let zone_bonus = if traits.is_optimal_zone(inputs.zone) {
            traits.optimal_zone_bonus
        } else {
            1.0
        };
        // The zone's decay multiplier drives the gain as well; the
        // generation multiplier only steers movement.
        let gain = (f64::from(traits.photosynthesis_rate)
            * inputs.zone_decay_mult
            * inputs.colony_bonus
            * adaptation
            * food_mult
            * zone_bonus
            * inputs.population_pressure
            / traits.metabolic_efficiency)
            .round();
        energy = (energy + gain).min(self.max_energy);

        if !traits.is_optimal_zone(inputs.zone)
            && energy < f64::from(traits.starvation_threshold)
        {
            return dead(energy);
        }
        if energy <= 0.0 {
            return dead(energy);
        }
        AgingOutcome {
            age,
            energy,
            survived: true,
        }
    }

    pub fn can_reproduce(&self, traits: &SpeciesTraits) -> bool {
        self.energy >= f64::from(traits.reproduction_threshold)
    }

    /// Deduct the birth cost and return the share handed to the offspring.
    pub fn consume_reproduction_energy(&mut self, traits: &SpeciesTraits) -> f64 {
        let cost = f64::from(traits.energy_from_birth);
        self.energy = (self.energy - cost).max(0.0);
        cost / 2.0
    }

    pub fn can_move(&self, traits: &SpeciesTraits) -> bool {
        !self.moved_this_tick && self.energy >= f64::from(traits.movement_cost)
    }

    /// Move to a new site: pay the cost, remember where we came from.
    pub fn relocate(&mut self, x: u16, y: u16, traits: &SpeciesTraits) {
        self.trail.push_back((self.x, self.y));
        if self.trail.len() > TRAIL_LEN {
            self.trail.pop_front();
        }
        self.x = x;
        self.y = y;
        self.energy = (self.energy - f64::from(traits.movement_cost)).max(0.0);
        self.moved_this_tick = true;
    }
}

fn aging_penalty(age: i32, traits: &SpeciesTraits) -> f64 {
    if traits.max_lifespan == 0 {
        return 1.0;
    }
    let age_ratio = f64::from(age) / f64::from(traits.max_lifespan);
    if age_ratio <= traits.age_decline_start {
        return 1.0;
    }
    let decline = (age_ratio - traits.age_decline_start) / (1.0 - traits.age_decline_start);
    1.0 + decline * 0.5
}
