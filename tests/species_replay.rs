//! Persisted species line-ups: save, load, and feed into a live grid.

mod common;

use common::GridBuilder;
use verdant::config::{self, SpeciesEntry, TraitOverrides};
use verdant::grid::SeedPattern;
use verdant::species::{EnergySource, SpeciesTraits};

#[test]
fn replay_file_roundtrips_and_seeds_a_grid() {
    let lineup = vec![
        SpeciesEntry {
            name: "Drifter".to_string(),
            population: 30,
            traits: TraitOverrides::from_traits(
                &SpeciesTraits {
                    complexity: 2,
                    energy_source: EnergySource::Hybrid,
                    ..SpeciesTraits::default()
                }
                .sanitize(),
            ),
        },
        SpeciesEntry {
            name: "Mat".to_string(),
            population: 50,
            traits: TraitOverrides::from_traits(
                &SpeciesTraits {
                    photosynthesis_rate: 8,
                    colonial_affinity: 1.4,
                    ..SpeciesTraits::default()
                }
                .sanitize(),
            ),
        },
    ];

    let path = std::env::temp_dir().join(format!("verdant_replay_{}.json", std::process::id()));
    config::save_species(&path, &lineup).unwrap();
    let loaded = config::load_species(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, lineup);

    let mut grid = GridBuilder::new(25, 25).build();
    for entry in &loaded {
        let summary = grid
            .seed_species(
                &entry.name,
                entry.traits.resolve(),
                entry.population,
                SeedPattern::Random,
            )
            .unwrap();
        assert_eq!(summary.placed, entry.population);
    }
    grid.step();
    grid.validate().unwrap();
}

#[test]
fn legacy_configs_seed_without_their_mobility_fields() {
    let json = r#"[{
        "name": "Heirloom",
        "population": 20,
        "traits": {
            "base_energy": 90,
            "energy_decay": 3,
            "photosynthesis_rate": 5,
            "complexity": 2,
            "can_move": true,
            "movement_strategy": "energy_seeking",
            "is_predator": false,
            "movement_cost": 7
        }
    }]"#;
    let entries: Vec<SpeciesEntry> = serde_json::from_str(json).unwrap();

    let mut grid = GridBuilder::new(20, 20).build();
    let summary = grid
        .seed_species(
            &entries[0].name,
            entries[0].traits.resolve(),
            entries[0].population,
            SeedPattern::Random,
        )
        .unwrap();
    let species = grid.registry().get(summary.species_id).unwrap();
    assert_eq!(species.traits.base_energy, 90);
    // Movement is derived from complexity, never read from disk.
    assert_eq!(species.traits.movement_cost, 2);
    grid.step();
    grid.validate().unwrap();
}
