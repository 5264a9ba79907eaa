use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use verdant::config::{self, SimConfig, SpeciesEntry, TraitOverrides};
use verdant::grid::{Grid, SeedPattern};
use verdant::species::{EnergySource, SpeciesTraits};
use verdant::zones::ZoneLayout;
use verdant::{metrics, rng};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless cellular ecology simulator", long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Species line-up replay file (JSON)
    #[arg(short, long)]
    species: Option<PathBuf>,

    /// Generations to simulate
    #[arg(short = 'n', long, default_value_t = 500)]
    generations: u64,

    /// Zone layout override
    #[arg(long, value_enum)]
    layout: Option<ZoneLayout>,

    /// Seeding pattern for the initial populations
    #[arg(long, value_enum, default_value = "random")]
    pattern: SeedPattern,

    /// RNG seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Write the effective species line-up back out for replay
    #[arg(long)]
    save_species: Option<PathBuf>,
}

fn main() -> Result<()> {
    metrics::init_logging();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(layout) = args.layout {
        config.zones.layout = layout;
    }
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }

    let mut grid = Grid::new(
        config.world.width,
        config.world.height,
        config.world.wrap,
        rng::stream(config.world.seed),
    )?;
    if config.zones.shifting {
        grid.zone_manager_mut()
            .enable_shifting(config.zones.shift_interval);
    }
    grid.setup_zones(config.zones.layout);

    let lineup = match &args.species {
        Some(path) => config::load_species(path)
            .with_context(|| format!("loading species from {}", path.display()))?,
        None => default_lineup(),
    };
    for entry in &lineup {
        grid.seed_species(&entry.name, entry.traits.resolve(), entry.population, args.pattern)?;
    }
    if let Some(path) = &args.save_species {
        config::save_species(path, &lineup)
            .with_context(|| format!("saving species to {}", path.display()))?;
    }

    for _ in 0..args.generations {
        let generation = grid.step();
        let stats = grid.stats();
        if generation % 50 == 0 {
            tracing::info!(
                generation,
                population = stats.population,
                species = stats.species_count,
                avg_species_age = stats.avg_species_age,
                dominant = ?stats.dominant_species_id,
                "progress"
            );
        }
        if stats.population == 0 {
            tracing::info!(generation, "the world is empty, stopping early");
            break;
        }
    }

    let stats = grid.stats();
    println!(
        "generation {}: population {}, {} living species ({} ever), dominant {:?}",
        stats.generation,
        stats.population,
        stats.species_count,
        grid.registry().total_count(),
        stats.dominant_species_id,
    );
    Ok(())
}

/// The stock line-up used when no replay file is given: a photosynthetic
/// base layer, a hardy colonist, a flexible forager, and a predator.
fn default_lineup() -> Vec<SpeciesEntry> {
    let entry = |name: &str, population: usize, traits: SpeciesTraits| SpeciesEntry {
        name: name.to_string(),
        population,
        traits: TraitOverrides::from_traits(&traits.sanitize()),
    };
    vec![
        entry(
            "Verdant",
            160,
            SpeciesTraits {
                base_energy: 100,
                energy_decay: 2,
                photosynthesis_rate: 3,
                complexity: 1,
                max_lifespan: 300,
                mutation_rate: 0.02,
                ..SpeciesTraits::default()
            },
        ),
        entry(
            "Tolerant",
            80,
            SpeciesTraits {
                base_energy: 150,
                energy_decay: 2,
                photosynthesis_rate: 2,
                complexity: 1,
                heat_tolerance: 0.8,
                cold_tolerance: 0.8,
                toxin_resistance: 0.7,
                max_lifespan: 500,
                colonial_affinity: 1.4,
                cluster_reproduction_bonus: 1.5,
                ..SpeciesTraits::default()
            },
        ),
        entry(
            "Forager",
            60,
            SpeciesTraits {
                base_energy: 100,
                energy_decay: 2,
                photosynthesis_rate: 2,
                complexity: 2,
                metabolic_efficiency: 1.1,
                energy_source: EnergySource::Hybrid,
                max_lifespan: 350,
                ..SpeciesTraits::default()
            },
        ),
        entry(
            "Stalker",
            20,
            SpeciesTraits {
                base_energy: 120,
                energy_decay: 4,
                photosynthesis_rate: 1,
                complexity: 3,
                metabolic_efficiency: 1.3,
                energy_source: EnergySource::Predation,
                can_be_consumed: false,
                starvation_threshold: 20,
                max_lifespan: 150,
                hunting_efficiency: 0.6,
                colonial_affinity: 1.0,
                cluster_reproduction_bonus: 1.1,
                ..SpeciesTraits::default()
            },
        ),
    ]
}
