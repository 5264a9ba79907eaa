//! Phase 4: energy-coupled Conway births and deaths.
//!
//! The neighbor-count cache is rebuilt from the post-movement alive map,
//! then every site is decided against that frozen structure. Deaths and
//! births queue up and apply at the end, deaths first.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::cell::Cell;
use crate::grid::Grid;
use crate::species::SpeciesId;

struct Birth {
    idx: usize,
    x: u16,
    y: u16,
    species_id: SpeciesId,
    energy: f64,
}

pub fn run(grid: &mut Grid) {
    let lattice = grid.lattice();
    grid.neighbor_counts.rebuild(lattice, &grid.cells);

    let mut deaths: Vec<usize> = Vec::new();
    let mut births: Vec<Birth> = Vec::new();

    for y in 0..lattice.height {
        for x in 0..lattice.width {
            let idx = lattice.index(x, y);
            let k = i32::from(grid.neighbor_counts.get(idx));

            if let Some(cell) = grid.cells[idx].as_ref() {
                let r = cell.energy_fraction();
                let age = cell.age;
                // Well-fed cells live by the classic rule; depleted ones
                // need the extra warmth of a denser cluster.
                let (min_n, max_n) = if r > 0.4 { (2, 3) } else { (3, 4) };
                let weakened = r > 0.4 && r <= 0.7;
                let mut dies = if weakened && k == 4 {
                    grid.rng.gen_bool(0.3)
                } else {
                    k < min_n || k > max_n
                };
                // Geometry-breaking perturbation: old cells sitting at the
                // crowding limit occasionally fall over.
                if !dies && k == 4 && age > 50 && grid.rng.gen_bool(0.02) {
                    dies = true;
                }
                if dies {
                    deaths.push(idx);
                }
            } else if (2..=4).contains(&k) {
                if let Some(birth) = decide_birth(grid, x, y, idx, k) {
                    births.push(birth);
                }
            }
        }
    }

    for idx in deaths {
        if let Some(cell) = grid.cells[idx].take() {
            grid.deaths_this_gen += 1;
            grid.registry.record_death(cell.species_id);
        }
    }
    for birth in births {
        let traits = &grid
            .registry
            .get(birth.species_id)
            .expect("birth species registered")
            .traits;
        grid.cells[birth.idx] = Some(Cell::new(
            birth.x,
            birth.y,
            birth.species_id,
            traits,
            Some(birth.energy),
        ));
        grid.births_this_gen += 1;
        grid.registry.record_birth(birth.species_id);
    }
}

fn decide_birth(grid: &mut Grid, x: u16, y: u16, idx: usize, k: i32) -> Option<Birth> {
    let lattice = grid.lattice();
    let neighbor_idxs: Vec<usize> = lattice
        .neighbors(x, y, 1)
        .into_iter()
        .map(|(nx, ny)| lattice.index(nx, ny))
        .filter(|&nidx| grid.cells[nidx].is_some())
        .collect();
    if neighbor_idxs.len() < 2 {
        return None;
    }

    let &parent_idx = neighbor_idxs.choose(&mut grid.rng)?;
    let parent_species = grid.cells[parent_idx].as_ref()?.species_id;
    let traits = *grid.species_traits(parent_species);

    let mut second_idx = None;
    if traits.sexual_reproduction {
        let mates: Vec<usize> = neighbor_idxs
            .iter()
            .copied()
            .filter(|&nidx| {
                nidx != parent_idx
                    && grid.cells[nidx]
                        .as_ref()
                        .is_some_and(|c| c.species_id == parent_species)
            })
            .collect();
        match mates.choose(&mut grid.rng) {
            Some(&mate) => second_idx = Some(mate),
            None => return None, // no partner, no offspring
        }
    }

    let (can_enter, zone_kind, zone_mutation_mult) = {
        let props = grid.zone_props_at(x, y);
        (props.can_enter, props.kind, props.mutation_rate_mult)
    };
    if !can_enter {
        return None;
    }
    let pressure = grid.pressure_at(x, y);

    // Overcrowding raises the bar; native habitat and same-species
    // clusters lower it.
    let difficulty = (1.0 / pressure.max(0.8)).max(1.0);
    let native_bonus = if zone_kind == traits.native_zone_type {
        traits.native_zone_affinity
    } else {
        1.0
    };
    let same_neighbors = grid.same_species_neighbor_count(x, y, parent_species);
    let cluster_bonus =
        1.0 + (same_neighbors as f64 / 3.0).min(1.0) * (traits.cluster_reproduction_bonus - 1.0);

    let birth_probability = if k == 3 { 1.0 } else { 0.5 };
    if !grid.rng.gen_bool(birth_probability) {
        return None;
    }

    let effective_threshold =
        f64::from(traits.reproduction_threshold) * difficulty / (native_bonus * cluster_bonus);

    let parent_energy = grid.cells[parent_idx].as_ref()?.energy;
    let offspring_energy;
    if parent_energy >= effective_threshold && parent_energy >= f64::from(traits.reproduction_threshold)
    {
        let parent = grid.cells[parent_idx].as_mut()?;
        let mut energy = parent.consume_reproduction_energy(&traits);
        if let Some(mate_idx) = second_idx {
            if let Some(mate) = grid.cells[mate_idx].as_mut() {
                if mate.can_reproduce(&traits) {
                    energy += mate.consume_reproduction_energy(&traits) / 2.0;
                }
            }
        }
        offspring_energy = energy;
    } else if pressure < 0.6 {
        // Severely overcrowded and the parents are weak: no birth.
        return None;
    } else {
        offspring_energy = f64::from(traits.base_energy) / 3.0;
    }

    let sexual_mult = if second_idx.is_some() { 0.5 } else { 1.0 };
    let mutation_rate = (traits.mutation_rate * zone_mutation_mult * sexual_mult).clamp(0.0, 1.0);
    let species_id = if mutation_rate > 0.0 && grid.rng.gen_bool(mutation_rate) {
        grid.mutations_this_gen += 1;
        let mutant = grid
            .registry
            .spawn_mutant(parent_species, grid.generation, &mut grid.rng);
        tracing::trace!(parent = parent_species, mutant, "mutation at birth");
        mutant
    } else {
        parent_species
    };

    Some(Birth {
        idx,
        x,
        y,
        species_id,
        energy: offspring_energy,
    })
}
