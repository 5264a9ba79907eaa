//! Structural invariants that must hold after every step, plus
//! property tests over grid geometry and trait clamping.

mod common;

use common::GridBuilder;
use proptest::prelude::*;
use verdant::grid::{Grid, SeedPattern};
use verdant::rng;
use verdant::species::{EnergySource, SpeciesTraits};
use verdant::zones::{ZoneKind, ZoneLayout, ZoneProperties};

#[test]
fn invariants_hold_through_a_mixed_run() {
    let mut grid = GridBuilder::new(40, 40).seed(9).build();
    grid.setup_zones(ZoneLayout::Random);
    grid.seed_species(
        "algae",
        SpeciesTraits {
            photosynthesis_rate: 6,
            mutation_rate: 0.05,
            ..SpeciesTraits::default()
        },
        120,
        SeedPattern::Random,
    )
    .unwrap();
    grid.seed_species(
        "drifter",
        SpeciesTraits {
            complexity: 2,
            energy_source: EnergySource::Hybrid,
            mutation_rate: 0.05,
            ..SpeciesTraits::default()
        },
        60,
        SeedPattern::Center,
    )
    .unwrap();
    grid.seed_species(
        "apex",
        SpeciesTraits {
            complexity: 4,
            energy_source: EnergySource::Predation,
            can_be_consumed: false,
            ..SpeciesTraits::default()
        },
        15,
        SeedPattern::Edge,
    )
    .unwrap();

    let mut last_total_species = grid.registry().total_count();
    for step in 1..=80u64 {
        let generation = grid.step();
        assert_eq!(generation, step, "generation counter must advance by one");
        grid.validate().unwrap();

        let stats = grid.stats();
        assert!(stats.mutations <= stats.births);
        let living_sum: u32 = grid.registry().living().map(|s| s.population).sum();
        assert_eq!(living_sum, stats.population);

        // Species are never destroyed, only added.
        let total_species = grid.registry().total_count();
        assert!(total_species >= last_total_species);
        last_total_species = total_species;
    }
}

#[test]
fn zero_mutation_lineage_never_speciates() {
    let paradise = ZoneProperties {
        carrying_capacity: u32::MAX,
        ..ZoneProperties::from_kind(ZoneKind::Paradise)
    };
    let mut grid = GridBuilder::new(20, 20)
        .seed(13)
        .with_custom_zone(0, 0, 20, 20, paradise)
        .build();
    let traits = SpeciesTraits {
        mutation_rate: 0.0,
        sexual_reproduction: false,
        photosynthesis_rate: 8,
        ..SpeciesTraits::default()
    };
    grid.seed_species("pure", traits, 40, SeedPattern::Random)
        .unwrap();

    for _ in 0..120 {
        grid.step();
    }
    assert_eq!(
        grid.registry().total_count(),
        1,
        "a zero-mutation asexual lineage produced a second species id"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn empty_grids_step_safely(
        width in 1u16..40,
        height in 1u16..40,
        wrap: bool,
        seed: u64,
    ) {
        let mut grid = Grid::new(width, height, wrap, rng::stream(Some(seed))).unwrap();
        prop_assert_eq!(grid.step(), 1);
        prop_assert_eq!(grid.step(), 2);
        let stats = grid.stats();
        prop_assert_eq!(stats.population, 0);
        prop_assert_eq!(stats.births, 0);
        prop_assert_eq!(stats.deaths, 0);
        let view = grid.snapshot();
        prop_assert_eq!(view.generation, 2);
        prop_assert!(view.cells.iter().all(Option::is_none));
        prop_assert!(grid.validate().is_ok());
    }

    #[test]
    fn sanitize_lands_in_range_and_is_idempotent(
        base_energy in -500i32..500,
        energy_decay in -20i32..40,
        photosynthesis_rate in -10i32..60,
        complexity in -3i32..12,
        metabolic_efficiency in -1.0f64..4.0,
        mutation_rate in -1.0f64..2.0,
        heat_tolerance in -2.0f64..3.0,
        max_lifespan in -100i32..5000,
    ) {
        let traits = SpeciesTraits {
            base_energy,
            energy_decay,
            photosynthesis_rate,
            complexity,
            metabolic_efficiency,
            mutation_rate,
            heat_tolerance,
            max_lifespan,
            ..SpeciesTraits::default()
        }
        .sanitize();
        prop_assert!((1..=200).contains(&traits.base_energy));
        prop_assert!((0..=10).contains(&traits.energy_decay));
        prop_assert!((0..=20).contains(&traits.photosynthesis_rate));
        prop_assert!((1..=5).contains(&traits.complexity));
        prop_assert!((0.5..=2.0).contains(&traits.metabolic_efficiency));
        prop_assert!((0.0..=1.0).contains(&traits.mutation_rate));
        prop_assert!((0.0..=1.0).contains(&traits.heat_tolerance));
        prop_assert!((0..=1000).contains(&traits.max_lifespan));
        prop_assert_eq!(traits.movement_cost, 1 + traits.complexity / 2);
        // A second pass changes nothing.
        prop_assert_eq!(traits.sanitize(), traits);
    }
}
