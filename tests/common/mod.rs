use verdant::grid::Grid;
use verdant::rng;
use verdant::species::{SpeciesId, SpeciesTraits};
use verdant::zones::{Zone, ZoneKind, ZoneProperties};

/// Builder for test grids with a fixed seed and hand-placed zones.
#[allow(dead_code)]
pub struct GridBuilder {
    width: u16,
    height: u16,
    wrap: bool,
    seed: u64,
    zones: Vec<Zone>,
}

#[allow(dead_code)]
impl GridBuilder {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            wrap: true,
            seed: 42,
            zones: Vec::new(),
        }
    }

    pub fn no_wrap(mut self) -> Self {
        self.wrap = false;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_zone(mut self, x: i32, y: i32, width: i32, height: i32, kind: ZoneKind) -> Self {
        self.zones.push(Zone::of_kind(x, y, width, height, kind));
        self
    }

    pub fn with_custom_zone(
        mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        properties: ZoneProperties,
    ) -> Self {
        self.zones.push(Zone::new(x, y, width, height, properties));
        self
    }

    pub fn build(self) -> Grid {
        let mut grid =
            Grid::new(self.width, self.height, self.wrap, rng::stream(Some(self.seed)))
                .expect("failed to build test grid");
        for zone in self.zones {
            grid.zone_manager_mut().add_zone(zone);
        }
        grid
    }
}

/// A trait record with every dynamic knob turned off: no decay, no gain,
/// no lifespan cap, no mutation, no colony effects, and a reproduction
/// threshold that parks the seek gate (energy 100 sits inside the
/// stay-put window).
#[allow(dead_code)]
pub fn inert_traits() -> SpeciesTraits {
    SpeciesTraits {
        energy_decay: 0,
        photosynthesis_rate: 0,
        max_lifespan: 0,
        mutation_rate: 0.0,
        colonial_affinity: 1.0,
        cluster_reproduction_bonus: 1.0,
        starvation_threshold: 0,
        reproduction_threshold: 100,
        ..SpeciesTraits::default()
    }
}

/// Register a species without seeding any cells.
#[allow(dead_code)]
pub fn register(grid: &mut Grid, name: &str, traits: SpeciesTraits) -> SpeciesId {
    grid.registry_mut().register(name, traits, 0)
}

/// Living cells of one species, zero if it was never seen.
#[allow(dead_code)]
pub fn population_of(grid: &Grid, id: SpeciesId) -> u32 {
    grid.cells()
        .iter()
        .flatten()
        .filter(|c| c.species_id == id)
        .count() as u32
}
