//! Phase 1: aging and energy metabolism.

use rayon::prelude::*;

use crate::cell::MetabolismInputs;
use crate::grid::Grid;
use crate::species::EnergySource;

struct Outcome {
    idx: usize,
    age: i32,
    energy: f64,
    survived: bool,
}

/// Age every living cell and settle its energy budget. Decisions are
/// per-cell independent given the zone cache, so the decision pass runs
/// in parallel against the pre-phase board; deaths apply afterwards.
pub fn run(grid: &mut Grid) {
    let outcomes: Vec<Outcome> = {
        let g: &Grid = &*grid;
        g.cells
            .par_iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let cell = slot.as_ref()?;
                let traits = g.species_traits(cell.species_id);
                let zone = g.zone_props_at(cell.x, cell.y);
                let inputs = MetabolismInputs {
                    zone: zone.kind,
                    zone_decay_mult: zone.energy_decay_mult,
                    colony_bonus: g.colony_bonus(
                        cell.x,
                        cell.y,
                        cell.species_id,
                        traits.colonial_affinity,
                    ),
                    has_prey_nearby: traits.energy_source != EnergySource::Photosynthesis
                        && g.has_prey_neighbor(cell.x, cell.y, cell.species_id),
                    population_pressure: g.pressure_at(cell.x, cell.y),
                };
                let out = cell.age_one_generation(traits, &inputs);
                Some(Outcome {
                    idx,
                    age: out.age,
                    energy: out.energy,
                    survived: out.survived,
                })
            })
            .collect()
    };

    for outcome in outcomes {
        if outcome.survived {
            let cell = grid.cells[outcome.idx]
                .as_mut()
                .expect("survivor vanished between decision and apply");
            cell.age = outcome.age;
            cell.energy = outcome.energy;
        } else if let Some(cell) = grid.cells[outcome.idx].take() {
            grid.deaths_this_gen += 1;
            grid.registry.record_death(cell.species_id);
        }
    }
}
