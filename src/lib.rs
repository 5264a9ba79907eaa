//! # Verdant
//!
//! A cellular ecology simulation engine: an evolving population of
//! single-cell organisms on a two-dimensional toroidal lattice. Each site
//! holds at most one cell; cells belong to species whose heritable
//! numeric traits mutate on reproduction. Out of the tick rules emerge
//! colonization, competition, predation, extinction, speciation, and
//! habitat specialization.
//!
//! The core is the generation-step engine:
//! - **Energy metabolism** modulated by zones, colonies, and aging
//! - **Movement strategies** (seek / flee / hunt) derived from complexity
//! - **Predation** for complex organisms
//! - **Energy-coupled Conway rules** for births and deaths
//! - **Zones** with carrying capacities that feed population pressure
//!   back into every phase
//!
//! ## Architecture
//!
//! A [`grid::Grid`] owns the cell array, the species registry, the zone
//! manager, and one seeded RNG stream; [`grid::Grid::step`] runs the
//! synchronous five-phase pipeline (age, move, predate, reproduce,
//! bookkeeping). Per-tick caches (neighbor counts, zone lookup and
//! pressure) are rebuilt with rayon; apply loops stay sequential.
//! External collaborators only see [`snapshot::GridView`] and
//! [`snapshot::Stats`] between steps.
//!
//! ## Example
//!
//! ```no_run
//! use verdant::grid::{Grid, SeedPattern};
//! use verdant::species::SpeciesTraits;
//! use verdant::zones::ZoneLayout;
//!
//! let mut grid = Grid::new(120, 80, true, verdant::rng::stream(Some(42)))?;
//! grid.setup_zones(ZoneLayout::Quadrant);
//! grid.seed_species("algae", SpeciesTraits::default(), 200, SeedPattern::Random)?;
//! for _ in 0..100 {
//!     grid.step();
//! }
//! println!("{:?}", grid.stats());
//! # Ok::<(), verdant::error::SimError>(())
//! ```

/// Per-site cell state and metabolism.
pub mod cell;
/// Species color derivation from trait records.
pub mod color;
/// Simulation config (toml) and species replay files (JSON).
pub mod config;
/// Structured errors surfaced to callers.
pub mod error;
/// The lattice, caches, and the tick engine.
pub mod grid;
/// Phase timings and logging bootstrap.
pub mod metrics;
/// The seeded RNG stream.
pub mod rng;
/// Read-only views for rendering, export, and tests.
pub mod snapshot;
/// Trait records, the mutation operator, and the species registry.
pub mod species;
/// The per-phase tick systems.
pub mod systems;
/// Environmental zones, carrying capacity, and zone shifts.
pub mod zones;

pub use error::SimError;
pub use grid::{Grid, SeedPattern, SeedSummary};
pub use snapshot::{GridView, Stats};
pub use species::{EnergySource, Species, SpeciesId, SpeciesRegistry, SpeciesTraits, Strategy};
pub use zones::{Zone, ZoneKind, ZoneLayout, ZoneManager, ZoneProperties};
