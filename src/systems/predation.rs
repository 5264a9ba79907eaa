//! Phase 3: hunters consume one adjacent prey cell.

use rand::seq::SliceRandom;
use rayon::prelude::*;

use crate::grid::Grid;

/// Candidate gathering reads the pre-phase board in parallel; the apply
/// loop is sequential so "target still alive" checks hold and no prey is
/// consumed twice.
pub fn run(grid: &mut Grid) {
    let lattice = grid.lattice();
    let hunters: Vec<(usize, Vec<usize>)> = {
        let g: &Grid = &*grid;
        g.cells
            .par_iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let cell = slot.as_ref()?;
                if !g.species_traits(cell.species_id).can_hunt() {
                    return None;
                }
                let candidates: Vec<usize> = lattice
                    .neighbors(cell.x, cell.y, 1)
                    .into_iter()
                    .filter_map(|(nx, ny)| {
                        let nidx = lattice.index(nx, ny);
                        let neighbor = g.cells[nidx].as_ref()?;
                        if neighbor.species_id == cell.species_id {
                            return None;
                        }
                        let traits = g.species_traits(neighbor.species_id);
                        (traits.can_be_consumed && !traits.can_hunt()).then_some(nidx)
                    })
                    .collect();
                (!candidates.is_empty()).then_some((idx, candidates))
            })
            .collect()
    };

    for (hunter_idx, candidates) in hunters {
        let Some(&prey_idx) = candidates.choose(&mut grid.rng) else {
            continue;
        };
        if grid.cells[prey_idx].is_none() || grid.cells[hunter_idx].is_none() {
            continue;
        }
        let hunter_species = grid.cells[hunter_idx]
            .as_ref()
            .expect("hunter checked above")
            .species_id;
        let gain_fraction = grid.species_traits(hunter_species).hunting_gain();
        let prey = grid.cells[prey_idx].take().expect("prey checked above");
        let transferred = (prey.energy * gain_fraction).round();
        let hunter = grid.cells[hunter_idx].as_mut().expect("hunter checked above");
        hunter.energy = (hunter.energy + transferred).min(hunter.max_energy);
        grid.deaths_this_gen += 1;
        grid.registry.record_death(prey.species_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SimRng;
    use crate::species::{EnergySource, SpeciesTraits};
    use rand::SeedableRng;

    fn hunter_traits() -> SpeciesTraits {
        SpeciesTraits {
            complexity: 3,
            energy_source: EnergySource::Predation,
            can_be_consumed: false,
            ..SpeciesTraits::default()
        }
    }

    #[test]
    fn hunters_skip_armored_and_rival_hunters() {
        let mut grid = Grid::new(7, 7, false, SimRng::seed_from_u64(2)).unwrap();
        let hunter = grid.registry_mut().register("hunter", hunter_traits(), 0);
        let armored = grid.registry_mut().register(
            "armored",
            SpeciesTraits {
                can_be_consumed: false,
                ..SpeciesTraits::default()
            },
            0,
        );
        let rival = grid.registry_mut().register(
            "rival",
            SpeciesTraits {
                complexity: 3,
                can_be_consumed: true,
                ..SpeciesTraits::default()
            },
            0,
        );
        let prey = grid.registry_mut().register("prey", SpeciesTraits::default(), 0);

        grid.spawn_cell(2, 2, hunter, 100.0).unwrap();
        grid.spawn_cell(1, 2, armored, 50.0).unwrap();
        grid.spawn_cell(3, 2, rival, 50.0).unwrap();
        grid.spawn_cell(2, 3, prey, 50.0).unwrap();

        run(&mut grid);

        // Only the plain prey is eligible; complexity 3 extracts 80%.
        assert!(grid.cell_at(2, 3).is_none());
        assert!(grid.cell_at(1, 2).is_some());
        assert_eq!(grid.cell_at(2, 2).unwrap().energy, 140.0);
        // The rival hunter shares the prey's neighborhood but loses the
        // race: the prey is gone when its turn comes.
        assert_eq!(grid.cell_at(3, 2).unwrap().energy, 50.0);
        assert_eq!(grid.deaths_this_gen, 1);
        grid.validate().unwrap();
    }

    #[test]
    fn one_prey_feeds_at_most_one_hunter() {
        let mut grid = Grid::new(7, 7, false, SimRng::seed_from_u64(5)).unwrap();
        let hunter = grid.registry_mut().register("hunter", hunter_traits(), 0);
        let prey = grid.registry_mut().register("prey", SpeciesTraits::default(), 0);

        grid.spawn_cell(1, 2, hunter, 100.0).unwrap();
        grid.spawn_cell(3, 2, hunter, 100.0).unwrap();
        grid.spawn_cell(2, 2, prey, 50.0).unwrap();

        run(&mut grid);

        assert!(grid.cell_at(2, 2).is_none());
        assert_eq!(grid.deaths_this_gen, 1);
        let mut energies = [
            grid.cell_at(1, 2).unwrap().energy,
            grid.cell_at(3, 2).unwrap().energy,
        ];
        energies.sort_by(f64::total_cmp);
        assert_eq!(energies, [100.0, 140.0]);
        grid.validate().unwrap();
    }

    #[test]
    fn transfer_is_capped_by_max_energy() {
        let mut grid = Grid::new(5, 5, false, SimRng::seed_from_u64(6)).unwrap();
        let hunter = grid.registry_mut().register(
            "small_hunter",
            SpeciesTraits {
                base_energy: 50,
                ..hunter_traits()
            },
            0,
        );
        let prey = grid.registry_mut().register("fat_prey", SpeciesTraits::default(), 0);
        grid.spawn_cell(2, 2, hunter, 90.0).unwrap();
        grid.spawn_cell(2, 3, prey, 200.0).unwrap();

        run(&mut grid);

        assert_eq!(grid.cell_at(2, 2).unwrap().energy, 100.0);
    }
}
