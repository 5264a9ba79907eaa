//! Phase 2: strategy-gated movement.
//!
//! Every cell may move; complexity only bounds the policy. Mobile
//! candidates are snapshotted first so nothing moves twice, then the
//! decide-and-apply loop runs sequentially: two movers may want the same
//! destination, and the second must see the first already there.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::grid::{Grid, MIGRATION_PRESSURE};
use crate::species::{EnergySource, Strategy};

pub fn run(grid: &mut Grid, migration_event: bool) {
    let lattice = grid.lattice();

    let mobile: Vec<(u16, u16)> = grid
        .cells
        .iter()
        .flatten()
        .filter(|cell| cell.can_move(grid.species_traits(cell.species_id)))
        .map(|cell| (cell.x, cell.y))
        .collect();

    for (ox, oy) in mobile {
        let idx = lattice.index(ox, oy);
        let (species_id, energy) = match grid.cells[idx].as_ref() {
            Some(cell) if !cell.moved_this_tick => (cell.species_id, cell.energy),
            _ => continue, // displaced, eaten earlier in the loop, or taken over by a mover
        };
        let traits = *grid.species_traits(species_id);
        let threshold = f64::from(traits.reproduction_threshold);
        let strategy = traits.movement_strategy();

        let mut should_move = migration_event && grid.rng.gen_bool(MIGRATION_PRESSURE);
        if !should_move {
            should_move = match strategy {
                Strategy::Hunt => {
                    let has_prey = traits.energy_source != EnergySource::Photosynthesis
                        && grid.has_prey_neighbor(ox, oy, species_id);
                    if !has_prey || energy < threshold * 1.2 {
                        true
                    } else {
                        grid.rng.gen_bool(0.3)
                    }
                }
                Strategy::Flee => {
                    if grid.has_hunter_neighbor(ox, oy) {
                        true
                    } else if energy < threshold * 0.7 {
                        grid.zone_props_at(ox, oy).energy_generation_mult < 1.0
                    } else {
                        false
                    }
                }
                Strategy::Seek => {
                    let quality = grid.zone_props_at(ox, oy).energy_generation_mult;
                    if grid.pressure_at(ox, oy) < 0.8 {
                        true
                    } else if quality < 1.0 {
                        true
                    } else if energy > threshold * 1.2 {
                        grid.rng.gen_bool(0.35)
                    } else {
                        energy < threshold * 0.85
                    }
                }
            };
        }
        if !should_move {
            continue;
        }

        // Desperation and abundance both widen the search.
        let radius = if energy < threshold * 0.5 || energy > threshold * 1.5 {
            2
        } else {
            1
        };

        let mut spots: Vec<(u16, u16)> = Vec::new();
        for (nx, ny) in lattice.neighbors(ox, oy, radius) {
            if !grid.zone_props_at(nx, ny).can_enter {
                continue;
            }
            match grid.cells[lattice.index(nx, ny)].as_ref() {
                None => spots.push((nx, ny)),
                Some(occupant) if energy > occupant.energy * 1.1 => spots.push((nx, ny)),
                Some(_) => {}
            }
        }
        if spots.is_empty() {
            continue;
        }

        let preferred = match strategy {
            Strategy::Seek => seek_candidates(grid, ox, oy, &spots),
            Strategy::Flee => {
                let hunters = grid.hunter_neighbor_positions(ox, oy);
                if hunters.is_empty() {
                    seek_candidates(grid, ox, oy, &spots)
                } else {
                    farthest_from(&spots, &hunters)
                }
            }
            Strategy::Hunt => {
                let prey = grid.prey_neighbor_positions(ox, oy, species_id);
                if prey.is_empty() {
                    seek_candidates(grid, ox, oy, &spots)
                } else {
                    nearest_to(&spots, &prey)
                }
            }
        };
        let pool = if preferred.is_empty() { &spots } else { &preferred };
        let Some(&(tx, ty)) = pool.choose(&mut grid.rng) else {
            continue;
        };

        let tidx = lattice.index(tx, ty);
        if let Some(displaced) = grid.cells[tidx].take() {
            grid.deaths_this_gen += 1;
            grid.registry.record_death(displaced.species_id);
        }
        let mut cell = grid.cells[idx]
            .take()
            .expect("mover vanished between decision and apply");
        cell.relocate(tx, ty, &traits);
        grid.cells[tidx] = Some(cell);
    }

    for cell in grid.cells.iter_mut().flatten() {
        cell.moved_this_tick = false;
    }
}

/// Spots in zones scoring strictly better than the current one; among
/// those, only the best score survives so ties break at random upstream.
fn seek_candidates(grid: &Grid, x: u16, y: u16, spots: &[(u16, u16)]) -> Vec<(u16, u16)> {
    let mut best_score = grid.zone_props_at(x, y).energy_generation_mult;
    let mut best: Vec<(u16, u16)> = Vec::new();
    for &(nx, ny) in spots {
        let props = grid.zone_props_at(nx, ny);
        let score = props.energy_generation_mult - props.energy_decay_mult;
        if score > best_score {
            best_score = score;
            best.clear();
            best.push((nx, ny));
        } else if !best.is_empty() && score == best_score {
            best.push((nx, ny));
        }
    }
    best
}

fn manhattan(a: (u16, u16), b: (u16, u16)) -> i32 {
    (i32::from(a.0) - i32::from(b.0)).abs() + (i32::from(a.1) - i32::from(b.1)).abs()
}

fn min_distance(spot: (u16, u16), targets: &[(u16, u16)]) -> i32 {
    targets
        .iter()
        .map(|&t| manhattan(spot, t))
        .min()
        .unwrap_or(i32::MAX)
}

fn farthest_from(spots: &[(u16, u16)], threats: &[(u16, u16)]) -> Vec<(u16, u16)> {
    let best = spots
        .iter()
        .map(|&s| min_distance(s, threats))
        .max()
        .unwrap_or(0);
    spots
        .iter()
        .copied()
        .filter(|&s| min_distance(s, threats) == best)
        .collect()
}

fn nearest_to(spots: &[(u16, u16)], targets: &[(u16, u16)]) -> Vec<(u16, u16)> {
    let best = spots
        .iter()
        .map(|&s| min_distance(s, targets))
        .min()
        .unwrap_or(0);
    spots
        .iter()
        .copied()
        .filter(|&s| min_distance(s, targets) == best)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimRng;
    use crate::species::SpeciesTraits;
    use crate::zones::{Zone, ZoneKind};
    use rand::SeedableRng;

    fn quiet_traits() -> SpeciesTraits {
        SpeciesTraits {
            energy_decay: 0,
            photosynthesis_rate: 0,
            max_lifespan: 0,
            starvation_threshold: 0,
            colonial_affinity: 1.0,
            mutation_rate: 0.0,
            reproduction_threshold: 100,
            ..SpeciesTraits::default()
        }
    }

    /// In a packed desert only the strong cell finds a destination, by
    /// displacing a weaker neighbor; the vacated origin then frees up a
    /// chain of follow-up moves without changing the head count.
    #[test]
    fn strong_cell_displaces_weaker_occupant() {
        let mut grid = Grid::new(5, 5, true, SimRng::seed_from_u64(8)).unwrap();
        grid.zone_manager_mut()
            .add_zone(Zone::of_kind(0, 0, 5, 5, ZoneKind::Desert));
        let strong = grid.registry_mut().register("strong", quiet_traits(), 0);
        let weak = grid.registry_mut().register("weak", quiet_traits(), 0);
        for y in 0..5u16 {
            for x in 0..5u16 {
                if (x, y) == (2, 2) {
                    grid.spawn_cell(x, y, strong, 200.0).unwrap();
                } else {
                    grid.spawn_cell(x, y, weak, 50.0).unwrap();
                }
            }
        }
        grid.zone_cache.rebuild(grid.lattice, &grid.zone_manager, &grid.cells);

        run(&mut grid, false);

        assert_eq!(grid.deaths_this_gen, 1);
        assert_eq!(grid.cells.iter().flatten().count(), 24);
        let mover = grid
            .cells
            .iter()
            .flatten()
            .find(|c| c.species_id == strong)
            .expect("the strong cell survived");
        assert_ne!((mover.x, mover.y), (2, 2));
        assert_eq!(mover.energy, 199.0);
        assert_eq!(mover.trail.back(), Some(&(2, 2)));
        assert!(!mover.moved_this_tick, "flags reset after the phase");
        grid.validate().unwrap();
    }

    /// Barrier zones never show up as destinations, and with nowhere to
    /// go a gated cell stays put.
    #[test]
    fn sealed_cell_stays_put() {
        let mut grid = Grid::new(5, 5, true, SimRng::seed_from_u64(9)).unwrap();
        grid.zone_manager_mut()
            .add_zone(Zone::of_kind(0, 0, 5, 5, ZoneKind::Void));
        grid.zone_manager_mut()
            .add_zone(Zone::of_kind(2, 2, 1, 1, ZoneKind::Desert));
        let id = grid.registry_mut().register("pinned", quiet_traits(), 0);
        grid.spawn_cell(2, 2, id, 100.0).unwrap();
        grid.zone_cache.rebuild(grid.lattice, &grid.zone_manager, &grid.cells);

        run(&mut grid, true);

        let cell = grid.cell_at(2, 2).expect("cell stayed");
        assert_eq!(cell.energy, 100.0, "no movement cost without a move");
        assert_eq!(grid.deaths_this_gen, 0);
    }

    #[test]
    fn distance_helpers_pick_extremes() {
        let spots = [(0u16, 0u16), (4, 0), (2, 2)];
        let threats = [(0u16, 1u16)];
        assert_eq!(farthest_from(&spots, &threats), vec![(4, 0)]);
        assert_eq!(nearest_to(&spots, &threats), vec![(0, 0)]);
    }
}
