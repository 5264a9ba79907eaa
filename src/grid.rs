//! The lattice, its caches, and the synchronous tick engine.
//!
//! A [`Grid`] owns the cell array, the species registry, the zone manager,
//! and one RNG stream. Each [`Grid::step`] runs the five-phase pipeline:
//! age, move, predate, reproduce, then registry bookkeeping. Callers read
//! state only between steps, through [`Grid::stats`] and
//! [`Grid::snapshot`].

use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::cell::Cell;
use crate::error::SimError;
use crate::metrics::PhaseTimings;
use crate::rng::SimRng;
use crate::snapshot::{CellView, GridView, SpeciesView, Stats, ZoneView};
use crate::species::{SpeciesId, SpeciesRegistry, SpeciesTraits};
use crate::systems;
use crate::zones::{Zone, ZoneKind, ZoneLayout, ZoneManager, ZoneProperties};

/// Generations between unconditional zone shift passes.
pub const ZONE_SHIFT_PERIOD: u64 = 50;
/// Generations between migration pressure events.
pub const MIGRATION_PERIOD: u64 = 150;
/// Per-cell probability of a forced move during a migration event.
pub const MIGRATION_PRESSURE: f64 = 0.3;
/// Retry budget multiplier for random seeding.
const SEED_ATTEMPTS_PER_CELL: usize = 100;

/// Copyable lattice geometry. Phase systems carry this by value so they
/// can run neighbor queries while holding borrows of the cell array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lattice {
    pub width: u16,
    pub height: u16,
    pub wrap: bool,
}

impl Lattice {
    pub fn area(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    #[inline]
    pub fn index(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < i32::from(self.width) && y >= 0 && y < i32::from(self.height)
    }

    /// Sites within a Chebyshev radius, excluding the center. Wraps on
    /// the torus, clips at the edge otherwise.
    pub fn neighbors(&self, x: u16, y: u16, radius: i32) -> Vec<(u16, u16)> {
        let span = 2 * radius as usize + 1;
        let mut out = Vec::with_capacity(span * span - 1);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = i32::from(x) + dx;
                let ny = i32::from(y) + dy;
                if self.wrap {
                    out.push((
                        nx.rem_euclid(i32::from(self.width)) as u16,
                        ny.rem_euclid(i32::from(self.height)) as u16,
                    ));
                } else if self.contains(nx, ny) {
                    out.push((nx as u16, ny as u16));
                }
            }
        }
        out
    }
}

/// 8-neighborhood living-cell counts for every site, rebuilt once per
/// tick from the alive map. The inner scan is the hot loop and runs
/// row-parallel.
#[derive(Debug, Clone, Default)]
pub struct NeighborCounts {
    counts: Vec<u8>,
}

impl NeighborCounts {
    pub fn rebuild(&mut self, lattice: Lattice, cells: &[Option<Cell>]) {
        let w = usize::from(lattice.width);
        let h = usize::from(lattice.height);
        let alive: Vec<bool> = cells.iter().map(Option::is_some).collect();
        self.counts.clear();
        self.counts.resize(w * h, 0);
        let alive = &alive;
        self.counts
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, slot) in row.iter_mut().enumerate() {
                    let mut n = 0u8;
                    for dy in -1i32..=1 {
                        for dx in -1i32..=1 {
                            if dx == 0 && dy == 0 {
                                continue;
                            }
                            let mut nx = x as i32 + dx;
                            let mut ny = y as i32 + dy;
                            if lattice.wrap {
                                nx = nx.rem_euclid(w as i32);
                                ny = ny.rem_euclid(h as i32);
                            } else if nx < 0 || nx >= w as i32 || ny < 0 || ny >= h as i32 {
                                continue;
                            }
                            if alive[ny as usize * w + nx as usize] {
                                n += 1;
                            }
                        }
                    }
                    *slot = n;
                }
            });
    }

    #[inline]
    pub fn get(&self, idx: usize) -> u8 {
        self.counts[idx]
    }
}

/// Per-site zone lookup plus per-zone population pressure, rebuilt once
/// per tick after any zone shift. Zone lookup is `O(zones)` per site
/// naively; caching it here dominates every caller.
#[derive(Debug, Clone, Default)]
pub struct ZoneCache {
    site: Vec<u32>,
    zone_pressure: Vec<f64>,
    default_pressure: f64,
}

impl ZoneCache {
    pub fn rebuild(&mut self, lattice: Lattice, manager: &ZoneManager, cells: &[Option<Cell>]) {
        let w = usize::from(lattice.width);
        self.site = (0..lattice.area())
            .into_par_iter()
            .map(|idx| manager.zone_index_at((idx % w) as i32, (idx / w) as i32))
            .collect();
        self.zone_pressure = manager
            .zones()
            .par_iter()
            .map(|zone| {
                zone.properties
                    .population_pressure(count_in_rect(lattice, cells, zone))
            })
            .collect();
        let total = cells.iter().flatten().count();
        self.default_pressure = manager
            .default_zone()
            .properties
            .population_pressure(total);
    }

    #[inline]
    fn zone_index(&self, lattice: Lattice, x: u16, y: u16) -> u32 {
        self.site[lattice.index(x, y)]
    }

    pub fn zone<'a>(&self, manager: &'a ZoneManager, lattice: Lattice, x: u16, y: u16) -> &'a Zone {
        match self.zone_index(lattice, x, y) {
            u32::MAX => manager.default_zone(),
            i => &manager.zones()[i as usize],
        }
    }

    pub fn pressure(&self, lattice: Lattice, x: u16, y: u16) -> f64 {
        match self.zone_index(lattice, x, y) {
            u32::MAX => self.default_pressure,
            i => self.zone_pressure[i as usize],
        }
    }
}

fn count_in_rect(lattice: Lattice, cells: &[Option<Cell>], zone: &Zone) -> usize {
    let x0 = zone.x.max(0);
    let y0 = zone.y.max(0);
    let x1 = (zone.x + zone.width).min(i32::from(lattice.width));
    let y1 = (zone.y + zone.height).min(i32::from(lattice.height));
    let mut count = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            if cells[lattice.index(x as u16, y as u16)].is_some() {
                count += 1;
            }
        }
    }
    count
}

/// Spatial arrangement for the initial population of a species.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SeedPattern {
    /// Uniformly at random over enterable empty sites.
    #[default]
    Random,
    /// Stable 2x2 blocks spiraling out from a species-dependent offset.
    Center,
    /// Along the lattice perimeter.
    Edge,
}

/// What seeding actually accomplished. Partial placement is accepted;
/// the caller learns how many cells landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub species_id: SpeciesId,
    pub requested: usize,
    pub placed: usize,
}

/// The simulation world: a toroidal (or clipped) lattice of cells plus
/// everything that drives them.
pub struct Grid {
    pub(crate) lattice: Lattice,
    pub(crate) cells: Vec<Option<Cell>>,
    pub(crate) registry: SpeciesRegistry,
    pub(crate) zone_manager: ZoneManager,
    pub(crate) rng: SimRng,
    pub(crate) generation: u64,
    pub(crate) births_this_gen: u32,
    pub(crate) deaths_this_gen: u32,
    pub(crate) mutations_this_gen: u32,
    pub(crate) neighbor_counts: NeighborCounts,
    pub(crate) zone_cache: ZoneCache,
    timings: PhaseTimings,
}

impl Grid {
    pub fn new(width: u16, height: u16, wrap: bool, rng: SimRng) -> Result<Self, SimError> {
        if width == 0 || height == 0 {
            return Err(SimError::InvalidConfiguration(format!(
                "grid dimensions must be positive, got {width}x{height}"
            )));
        }
        let lattice = Lattice {
            width,
            height,
            wrap,
        };
        Ok(Self {
            lattice,
            cells: vec![None; lattice.area()],
            registry: SpeciesRegistry::new(),
            zone_manager: ZoneManager::new(width, height),
            rng,
            generation: 0,
            births_this_gen: 0,
            deaths_this_gen: 0,
            mutations_this_gen: 0,
            neighbor_counts: NeighborCounts::default(),
            zone_cache: ZoneCache::default(),
            timings: PhaseTimings::default(),
        })
    }

    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    pub fn width(&self) -> u16 {
        self.lattice.width
    }

    pub fn height(&self) -> u16 {
        self.lattice.height
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn registry(&self) -> &SpeciesRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SpeciesRegistry {
        &mut self.registry
    }

    pub fn zone_manager(&self) -> &ZoneManager {
        &self.zone_manager
    }

    pub fn zone_manager_mut(&mut self) -> &mut ZoneManager {
        &mut self.zone_manager
    }

    pub fn cells(&self) -> &[Option<Cell>] {
        &self.cells
    }

    pub fn timings(&self) -> PhaseTimings {
        self.timings
    }

    /// Cell at a site; out-of-range coordinates read as empty rather than
    /// faulting (only reachable when `wrap` is off).
    pub fn cell_at(&self, x: u16, y: u16) -> Option<&Cell> {
        if x >= self.lattice.width || y >= self.lattice.height {
            return None;
        }
        self.cells[self.lattice.index(x, y)].as_ref()
    }

    /// Living cells in the 8-neighborhood, computed fresh from the grid.
    pub fn living_neighbor_count(&self, x: u16, y: u16) -> usize {
        self.lattice
            .neighbors(x, y, 1)
            .into_iter()
            .filter(|&(nx, ny)| self.cells[self.lattice.index(nx, ny)].is_some())
            .count()
    }

    /// Install one of the stock zone layouts.
    pub fn setup_zones(&mut self, layout: ZoneLayout) {
        match layout {
            ZoneLayout::Neutral => {}
            ZoneLayout::Random => {
                let count = self.rng.gen_range(3..=7);
                self.zone_manager.create_random_zones(&mut self.rng, count);
            }
            ZoneLayout::Quadrant => self.zone_manager.create_quadrant_zones(),
            ZoneLayout::Ring => self.zone_manager.create_ring_world(50),
        }
        tracing::info!(?layout, zones = self.zone_manager.zones().len(), "zones configured");
    }

    /// Register a species and place its initial population. The zone
    /// where most cells land becomes the species' native habitat.
    pub fn seed_species(
        &mut self,
        name: &str,
        traits: SpeciesTraits,
        population: usize,
        pattern: SeedPattern,
    ) -> Result<SeedSummary, SimError> {
        let species_id = self.registry.register(name, traits, self.generation);
        let mut tally: BTreeMap<ZoneKind, usize> = BTreeMap::new();
        let placed = match pattern {
            SeedPattern::Random => self.seed_random(species_id, population, &mut tally),
            SeedPattern::Center => self.seed_center(species_id, population, &mut tally),
            SeedPattern::Edge => self.seed_edge(species_id, population, &mut tally),
        };
        if let Some((&kind, &count)) = tally.iter().max_by_key(|entry| *entry.1) {
            self.registry.set_native_zone(species_id, kind);
            tracing::debug!(species = species_id, ?kind, count, "native zone assigned");
        }
        if placed < population {
            tracing::warn!(
                species = name,
                placed,
                requested = population,
                "seeding ran out of room"
            );
        } else {
            tracing::info!(species = name, placed, "seeded species");
        }
        Ok(SeedSummary {
            species_id,
            requested: population,
            placed,
        })
    }

    /// Drop a cell straight onto the lattice, bypassing the seeding
    /// patterns. Used by tests and replay tooling.
    pub fn spawn_cell(
        &mut self,
        x: u16,
        y: u16,
        species_id: SpeciesId,
        energy: f64,
    ) -> Result<(), SimError> {
        if x >= self.lattice.width || y >= self.lattice.height {
            return Err(SimError::InvalidConfiguration(format!(
                "({x}, {y}) is outside the {}x{} grid",
                self.lattice.width, self.lattice.height
            )));
        }
        if self.registry.get(species_id).is_none() {
            return Err(SimError::UnknownSpecies(species_id));
        }
        if self.cells[self.lattice.index(x, y)].is_some() {
            return Err(SimError::InvalidConfiguration(format!(
                "site ({x}, {y}) is already occupied"
            )));
        }
        self.place_new_cell(x, y, species_id, Some(energy));
        Ok(())
    }

    /// Advance one generation and return the new generation number.
    pub fn step(&mut self) -> u64 {
        let started = Instant::now();
        self.generation += 1;
        self.births_this_gen = 0;
        self.deaths_this_gen = 0;
        self.mutations_this_gen = 0;

        let mut shift = self.generation % ZONE_SHIFT_PERIOD == 0;
        if let Some(interval) = self.zone_manager.shift_interval() {
            shift = shift || self.generation % interval == 0;
        }
        if shift {
            self.zone_manager.shift_zones(&mut self.rng);
            tracing::info!(generation = self.generation, "zones shifted");
        }
        let migration_event = self.generation % MIGRATION_PERIOD == 0;
        if migration_event {
            tracing::info!(generation = self.generation, "migration pressure event");
        }

        let t = Instant::now();
        self.zone_cache
            .rebuild(self.lattice, &self.zone_manager, &self.cells);
        self.timings.caches = t.elapsed();

        let t = Instant::now();
        systems::aging::run(self);
        self.timings.aging = t.elapsed();

        let t = Instant::now();
        systems::movement::run(self, migration_event);
        self.timings.movement = t.elapsed();

        let t = Instant::now();
        systems::predation::run(self);
        self.timings.predation = t.elapsed();

        let t = Instant::now();
        systems::reproduction::run(self);
        self.timings.reproduction = t.elapsed();

        let ids: Vec<SpeciesId> = self.cells.iter().flatten().map(|c| c.species_id).collect();
        self.registry.update_populations(ids);

        self.timings.total = started.elapsed();
        self.timings.log(self.generation);
        if self.generation % 100 == 0 {
            let stats = self.stats();
            tracing::info!(
                generation = stats.generation,
                population = stats.population,
                species = stats.species_count,
                births = stats.births,
                deaths = stats.deaths,
                "generation summary"
            );
        }

        #[cfg(debug_assertions)]
        if let Err(err) = self.validate() {
            panic!("tick {} aborted on invariant breach: {err}", self.generation);
        }

        self.generation
    }

    /// Aggregate statistics for the current generation.
    pub fn stats(&self) -> Stats {
        let population = self.cells.iter().flatten().count() as u32;
        let mut species_count = 0u32;
        let mut age_sum = 0u64;
        for species in self.registry.living() {
            species_count += 1;
            age_sum += self.generation - species.generation_born;
        }
        let avg_species_age = if species_count > 0 {
            age_sum as f64 / f64::from(species_count)
        } else {
            0.0
        };
        Stats {
            generation: self.generation,
            population,
            species_count,
            births: self.births_this_gen,
            deaths: self.deaths_this_gen,
            mutations: self.mutations_this_gen,
            avg_species_age,
            dominant_species_id: self.registry.dominant(),
        }
    }

    /// Read-only copy of everything a renderer needs.
    pub fn snapshot(&self) -> GridView {
        GridView {
            width: self.lattice.width,
            height: self.lattice.height,
            generation: self.generation,
            cells: self
                .cells
                .iter()
                .map(|slot| {
                    slot.as_ref().map(|c| CellView {
                        species_id: c.species_id,
                        energy: c.energy,
                        max_energy: c.max_energy,
                        age: c.age,
                    })
                })
                .collect(),
            species: self
                .registry
                .all()
                .map(|s| SpeciesView {
                    id: s.id,
                    name: s.name.clone(),
                    color: s.traits.color,
                    population: s.population,
                    extinct: self.registry.is_extinct(s.id),
                })
                .collect(),
            zones: self
                .zone_manager
                .zones()
                .iter()
                .map(|z| ZoneView {
                    x: z.x,
                    y: z.y,
                    width: z.width,
                    height: z.height,
                    kind: z.properties.kind,
                    can_enter: z.properties.can_enter,
                    color: z.properties.background_color,
                })
                .collect(),
        }
    }

    /// Check the structural invariants: stored coordinates agree with the
    /// lattice, energies are within bounds, and registry populations match
    /// the living cells.
    pub fn validate(&self) -> Result<(), SimError> {
        let mut counts: BTreeMap<SpeciesId, u32> = BTreeMap::new();
        for y in 0..self.lattice.height {
            for x in 0..self.lattice.width {
                if let Some(cell) = &self.cells[self.lattice.index(x, y)] {
                    if (cell.x, cell.y) != (x, y) {
                        return Err(SimError::InvariantBreach(format!(
                            "cell stored at ({x}, {y}) believes it is at ({}, {})",
                            cell.x, cell.y
                        )));
                    }
                    if !(0.0..=cell.max_energy).contains(&cell.energy) {
                        return Err(SimError::InvariantBreach(format!(
                            "cell at ({x}, {y}) has energy {} outside [0, {}]",
                            cell.energy, cell.max_energy
                        )));
                    }
                    if self.registry.get(cell.species_id).is_none() {
                        return Err(SimError::InvariantBreach(format!(
                            "cell at ({x}, {y}) references unissued species {}",
                            cell.species_id
                        )));
                    }
                    *counts.entry(cell.species_id).or_insert(0) += 1;
                }
            }
        }
        for species in self.registry.all() {
            let actual = counts.get(&species.id).copied().unwrap_or(0);
            if species.population != actual {
                return Err(SimError::InvariantBreach(format!(
                    "species {} records population {} but {} cells are alive",
                    species.id, species.population, actual
                )));
            }
        }
        Ok(())
    }

    // ---- helpers shared by the phase systems ----

    pub(crate) fn species_traits(&self, id: SpeciesId) -> &SpeciesTraits {
        &self
            .registry
            .get(id)
            .expect("cell references a species the registry never issued")
            .traits
    }

    pub(crate) fn zone_props_at(&self, x: u16, y: u16) -> &ZoneProperties {
        &self
            .zone_cache
            .zone(&self.zone_manager, self.lattice, x, y)
            .properties
    }

    pub(crate) fn pressure_at(&self, x: u16, y: u16) -> f64 {
        self.zone_cache.pressure(self.lattice, x, y)
    }

    pub(crate) fn colony_bonus(&self, x: u16, y: u16, species_id: SpeciesId, affinity: f64) -> f64 {
        let mut same = 0usize;
        let mut total = 0usize;
        for (nx, ny) in self.lattice.neighbors(x, y, 1) {
            if let Some(n) = &self.cells[self.lattice.index(nx, ny)] {
                total += 1;
                if n.species_id == species_id {
                    same += 1;
                }
            }
        }
        if total == 0 {
            1.0
        } else {
            1.0 + (same as f64 / total as f64) * (affinity - 1.0)
        }
    }

    pub(crate) fn has_prey_neighbor(&self, x: u16, y: u16, species_id: SpeciesId) -> bool {
        self.lattice.neighbors(x, y, 1).into_iter().any(|(nx, ny)| {
            self.cells[self.lattice.index(nx, ny)]
                .as_ref()
                .is_some_and(|n| {
                    n.species_id != species_id
                        && self.species_traits(n.species_id).can_be_consumed
                })
        })
    }

    pub(crate) fn has_hunter_neighbor(&self, x: u16, y: u16) -> bool {
        self.lattice.neighbors(x, y, 1).into_iter().any(|(nx, ny)| {
            self.cells[self.lattice.index(nx, ny)]
                .as_ref()
                .is_some_and(|n| self.species_traits(n.species_id).can_hunt())
        })
    }

    pub(crate) fn hunter_neighbor_positions(&self, x: u16, y: u16) -> Vec<(u16, u16)> {
        self.lattice
            .neighbors(x, y, 1)
            .into_iter()
            .filter(|&(nx, ny)| {
                self.cells[self.lattice.index(nx, ny)]
                    .as_ref()
                    .is_some_and(|n| self.species_traits(n.species_id).can_hunt())
            })
            .collect()
    }

    /// Huntable neighbors: another species, consumable, and not
    /// themselves a hunter.
    pub(crate) fn prey_neighbor_positions(
        &self,
        x: u16,
        y: u16,
        species_id: SpeciesId,
    ) -> Vec<(u16, u16)> {
        self.lattice
            .neighbors(x, y, 1)
            .into_iter()
            .filter(|&(nx, ny)| {
                self.cells[self.lattice.index(nx, ny)]
                    .as_ref()
                    .is_some_and(|n| {
                        if n.species_id == species_id {
                            return false;
                        }
                        let traits = self.species_traits(n.species_id);
                        traits.can_be_consumed && !traits.can_hunt()
                    })
            })
            .collect()
    }

    pub(crate) fn same_species_neighbor_count(
        &self,
        x: u16,
        y: u16,
        species_id: SpeciesId,
    ) -> usize {
        self.lattice
            .neighbors(x, y, 1)
            .into_iter()
            .filter(|&(nx, ny)| {
                self.cells[self.lattice.index(nx, ny)]
                    .as_ref()
                    .is_some_and(|n| n.species_id == species_id)
            })
            .count()
    }

    // ---- seeding internals ----

    /// In-bounds, empty, and enterable; returns the zone kind for the
    /// native-habitat tally.
    fn open_in_bounds(&self, x: i32, y: i32) -> Option<ZoneKind> {
        if !self.lattice.contains(x, y) {
            return None;
        }
        let (x, y) = (x as u16, y as u16);
        if self.cells[self.lattice.index(x, y)].is_some() {
            return None;
        }
        let props = &self.zone_manager.zone_at(i32::from(x), i32::from(y)).properties;
        props.can_enter.then_some(props.kind)
    }

    fn place_new_cell(&mut self, x: u16, y: u16, species_id: SpeciesId, energy: Option<f64>) {
        let traits = &self
            .registry
            .get(species_id)
            .expect("species registered before placement")
            .traits;
        let cell = Cell::new(x, y, species_id, traits, energy);
        self.cells[self.lattice.index(x, y)] = Some(cell);
        self.registry.record_placement(species_id);
    }

    fn seed_random(
        &mut self,
        species_id: SpeciesId,
        population: usize,
        tally: &mut BTreeMap<ZoneKind, usize>,
    ) -> usize {
        let mut placed = 0;
        let mut attempts = 0;
        let budget = population.saturating_mul(SEED_ATTEMPTS_PER_CELL);
        while placed < population && attempts < budget {
            attempts += 1;
            let x = self.rng.gen_range(0..self.lattice.width);
            let y = self.rng.gen_range(0..self.lattice.height);
            let Some(kind) = self.open_in_bounds(i32::from(x), i32::from(y)) else {
                continue;
            };
            self.place_new_cell(x, y, species_id, None);
            *tally.entry(kind).or_insert(0) += 1;
            placed += 1;
        }
        placed
    }

    fn seed_center(
        &mut self,
        species_id: SpeciesId,
        population: usize,
        tally: &mut BTreeMap<ZoneKind, usize>,
    ) -> usize {
        let mut placed = 0;
        // Later species spiral out from an offset center so line-ups do
        // not stack on the exact same sites.
        let prior = self.registry.living_count().saturating_sub(1) as f64;
        let offset_angle = (prior * 60.0).to_radians();
        let offset_dist = prior * 15.0;
        let cx = i32::from(self.lattice.width) / 2 + (offset_dist * offset_angle.cos()) as i32;
        let cy = i32::from(self.lattice.height) / 2 + (offset_dist * offset_angle.sin()) as i32;

        let mut radius = 0i32;
        while placed < population && radius < 50 {
            for angle in (0..360).step_by(30) {
                if placed >= population {
                    break;
                }
                let a = f64::from(angle).to_radians();
                let bx = cx + (f64::from(radius) * a.cos()) as i32;
                let by = cy + (f64::from(radius) * a.sin()) as i32;
                let sites = [(bx, by), (bx + 1, by), (bx, by + 1), (bx + 1, by + 1)];
                let mut kinds = [ZoneKind::Neutral; 4];
                let mut can_place = true;
                for (slot, &(x, y)) in kinds.iter_mut().zip(&sites) {
                    match self.open_in_bounds(x, y) {
                        Some(kind) => *slot = kind,
                        None => {
                            can_place = false;
                            break;
                        }
                    }
                }
                if !can_place {
                    continue;
                }
                for (&(x, y), kind) in sites.iter().zip(kinds) {
                    if placed >= population {
                        break;
                    }
                    self.place_new_cell(x as u16, y as u16, species_id, None);
                    *tally.entry(kind).or_insert(0) += 1;
                    placed += 1;
                }
            }
            radius += 4;
        }

        // Scatter whatever could not be placed as blocks.
        let mut attempts = 0;
        let budget = population.saturating_mul(50);
        while placed < population && attempts < budget {
            attempts += 1;
            let a = self.rng.gen::<f64>() * std::f64::consts::TAU;
            let d = self.rng.gen::<f64>() * 50.0;
            let x = cx + (d * a.cos()) as i32;
            let y = cy + (d * a.sin()) as i32;
            if let Some(kind) = self.open_in_bounds(x, y) {
                self.place_new_cell(x as u16, y as u16, species_id, None);
                *tally.entry(kind).or_insert(0) += 1;
                placed += 1;
            }
        }
        placed
    }

    fn seed_edge(
        &mut self,
        species_id: SpeciesId,
        population: usize,
        tally: &mut BTreeMap<ZoneKind, usize>,
    ) -> usize {
        let w = self.lattice.width;
        let h = self.lattice.height;
        let mut positions: Vec<(u16, u16)> = Vec::new();
        for x in 0..w {
            positions.push((x, 0));
            if h > 1 {
                positions.push((x, h - 1));
            }
        }
        for y in 1..h.saturating_sub(1) {
            positions.push((0, y));
            if w > 1 {
                positions.push((w - 1, y));
            }
        }
        positions.shuffle(&mut self.rng);
        let mut placed = 0;
        for &(x, y) in positions.iter().take(population) {
            if let Some(kind) = self.open_in_bounds(i32::from(x), i32::from(y)) {
                self.place_new_cell(x, y, species_id, None);
                *tally.entry(kind).or_insert(0) += 1;
                placed += 1;
            }
        }
        placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn grid(width: u16, height: u16, wrap: bool) -> Grid {
        Grid::new(width, height, wrap, SimRng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(Grid::new(0, 10, true, SimRng::seed_from_u64(1)).is_err());
        assert!(Grid::new(10, 0, true, SimRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn neighbors_wrap_on_the_torus() {
        let lattice = Lattice {
            width: 10,
            height: 8,
            wrap: true,
        };
        let n = lattice.neighbors(0, 0, 1);
        assert_eq!(n.len(), 8);
        assert!(n.contains(&(9, 7)));
        assert!(n.contains(&(1, 1)));
    }

    #[test]
    fn neighbors_clip_at_the_edge() {
        let lattice = Lattice {
            width: 10,
            height: 8,
            wrap: false,
        };
        let n = lattice.neighbors(0, 0, 1);
        assert_eq!(n.len(), 3);
        let n = lattice.neighbors(5, 4, 2);
        assert_eq!(n.len(), 24);
    }

    #[test]
    fn empty_grid_steps_without_life() {
        let mut grid = grid(8, 8, true);
        assert_eq!(grid.step(), 1);
        assert_eq!(grid.step(), 2);
        let stats = grid.stats();
        assert_eq!(stats.population, 0);
        assert_eq!(stats.species_count, 0);
        assert_eq!(stats.dominant_species_id, None);
        grid.validate().unwrap();
    }

    #[test]
    fn random_seeding_respects_budget_and_zones() {
        let mut grid = grid(20, 20, true);
        grid.zone_manager_mut()
            .add_zone(Zone::of_kind(0, 0, 20, 10, ZoneKind::Void));
        let summary = grid
            .seed_species("settler", SpeciesTraits::default(), 50, SeedPattern::Random)
            .unwrap();
        assert_eq!(summary.placed, 50);
        for cell in grid.cells().iter().flatten() {
            assert!(cell.y >= 10, "cell seeded inside the void at ({}, {})", cell.x, cell.y);
        }
        grid.validate().unwrap();
    }

    #[test]
    fn overfull_seeding_reports_partial_placement() {
        let mut grid = grid(4, 4, true);
        let summary = grid
            .seed_species("crowd", SpeciesTraits::default(), 100, SeedPattern::Random)
            .unwrap();
        assert!(summary.placed <= 16);
        assert!(summary.placed > 0);
    }

    #[test]
    fn center_seeding_lands_near_the_middle() {
        let mut grid = grid(40, 40, true);
        let summary = grid
            .seed_species("core", SpeciesTraits::default(), 16, SeedPattern::Center)
            .unwrap();
        assert_eq!(summary.placed, 16);
        for cell in grid.cells().iter().flatten() {
            let dx = i32::from(cell.x) - 20;
            let dy = i32::from(cell.y) - 20;
            assert!(dx.abs() <= 12 && dy.abs() <= 12);
        }
    }

    #[test]
    fn edge_seeding_stays_on_the_perimeter() {
        let mut grid = grid(12, 12, true);
        let summary = grid
            .seed_species("rim", SpeciesTraits::default(), 20, SeedPattern::Edge)
            .unwrap();
        assert!(summary.placed > 0);
        for cell in grid.cells().iter().flatten() {
            assert!(
                cell.x == 0 || cell.x == 11 || cell.y == 0 || cell.y == 11,
                "cell off the rim at ({}, {})",
                cell.x,
                cell.y
            );
        }
    }

    #[test]
    fn spawn_cell_validates_inputs() {
        let mut grid = grid(8, 8, true);
        let id = grid.registry_mut().register("one", SpeciesTraits::default(), 0);
        assert!(matches!(
            grid.spawn_cell(20, 0, id, 50.0),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            grid.spawn_cell(1, 1, 999, 50.0),
            Err(SimError::UnknownSpecies(999))
        ));
        grid.spawn_cell(1, 1, id, 50.0).unwrap();
        assert!(matches!(
            grid.spawn_cell(1, 1, id, 50.0),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert_eq!(grid.cell_at(1, 1).unwrap().energy, 50.0);
        assert!(grid.cell_at(100, 100).is_none());
        grid.validate().unwrap();
    }

    #[test]
    fn native_zone_follows_majority_placement() {
        let mut grid = grid(30, 30, true);
        grid.zone_manager_mut()
            .add_zone(Zone::of_kind(0, 0, 30, 30, ZoneKind::Desert));
        let summary = grid
            .seed_species("dune", SpeciesTraits::default(), 40, SeedPattern::Random)
            .unwrap();
        let species = grid.registry().get(summary.species_id).unwrap();
        assert_eq!(species.traits.native_zone_type, ZoneKind::Desert);
    }
}
