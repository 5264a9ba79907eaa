//! Environmental zones: rectangular regions with their own energy rules.
//!
//! Zones modify metabolism, reproduction, and movement for every cell they
//! contain, carry a carrying capacity that feeds population pressure back
//! into the tick, and drift over time through periodic shift passes.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rng::SimRng;

/// Lower bound a shift pass clamps zone extents to.
const SHIFT_MIN_EXTENT: i32 = 15;
/// Upper bound a shift pass clamps zone extents to.
const SHIFT_MAX_EXTENT: i32 = 80;

/// The environmental classes a region can take.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Fertile,
    Desert,
    Toxic,
    #[default]
    Neutral,
    Paradise,
    Void,
}

impl ZoneKind {
    /// Kinds a random layout draws from (everything but plain neutral).
    pub const LAYOUT_POOL: [ZoneKind; 5] = [
        ZoneKind::Fertile,
        ZoneKind::Desert,
        ZoneKind::Toxic,
        ZoneKind::Paradise,
        ZoneKind::Void,
    ];

    /// Kinds a shift retype draws from.
    pub const SHIFT_POOL: [ZoneKind; 4] = [
        ZoneKind::Fertile,
        ZoneKind::Desert,
        ZoneKind::Toxic,
        ZoneKind::Paradise,
    ];

    /// Kinds a species can call home.
    pub const NATIVE_POOL: [ZoneKind; 5] = [
        ZoneKind::Fertile,
        ZoneKind::Desert,
        ZoneKind::Toxic,
        ZoneKind::Paradise,
        ZoneKind::Neutral,
    ];

    /// Environmentally adjacent kinds, used when a lineage's native habitat
    /// drifts: adaptation moves to a neighboring climate far more often than
    /// it jumps across the map.
    pub fn adjacent(self) -> &'static [ZoneKind] {
        match self {
            ZoneKind::Fertile => &[ZoneKind::Paradise, ZoneKind::Neutral],
            ZoneKind::Desert => &[ZoneKind::Neutral, ZoneKind::Toxic],
            ZoneKind::Toxic => &[ZoneKind::Desert, ZoneKind::Neutral],
            ZoneKind::Paradise => &[ZoneKind::Fertile, ZoneKind::Neutral],
            ZoneKind::Neutral => &[
                ZoneKind::Fertile,
                ZoneKind::Desert,
                ZoneKind::Toxic,
                ZoneKind::Paradise,
            ],
            ZoneKind::Void => &[ZoneKind::Neutral],
        }
    }
}

/// Stock zone layouts the engine can install.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ZoneLayout {
    /// No zones; the whole lattice stays neutral.
    Neutral,
    /// 3-7 zones of random kinds and sizes.
    #[default]
    Random,
    /// Four half-grid quadrants: fertile, desert, toxic, paradise.
    Quadrant,
    /// A central paradise square wrapped in a toxic ring.
    Ring,
}

/// Modifiers and limits a zone applies to the cells it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneProperties {
    pub name: String,
    pub kind: ZoneKind,
    /// Multiplies movement scoring quality (seek strategy, flee fallback).
    pub energy_generation_mult: f64,
    /// Multiplies per-tick energy decay, and deliberately the gain as well.
    pub energy_decay_mult: f64,
    pub reproduction_cost_mult: f64,
    pub mutation_rate_mult: f64,
    pub movement_cost_mult: f64,
    /// Barrier zones reject movement, births, and seeding.
    pub can_enter: bool,
    /// Population at which the zone gives neutral metabolic feedback.
    /// Zero marks the zone uninhabitable.
    pub carrying_capacity: u32,
    pub background_color: (u8, u8, u8),
}

impl ZoneProperties {
    pub fn from_kind(kind: ZoneKind) -> Self {
        let neutral = Self {
            name: "Neutral Ground".to_string(),
            kind: ZoneKind::Neutral,
            energy_generation_mult: 1.0,
            energy_decay_mult: 1.0,
            reproduction_cost_mult: 1.0,
            mutation_rate_mult: 1.0,
            movement_cost_mult: 1.0,
            can_enter: true,
            carrying_capacity: 100,
            background_color: (20, 20, 20),
        };
        match kind {
            ZoneKind::Fertile => Self {
                name: "Fertile Plains".to_string(),
                kind,
                energy_generation_mult: 1.5,
                energy_decay_mult: 0.8,
                carrying_capacity: 120,
                background_color: (30, 40, 25),
                ..neutral
            },
            ZoneKind::Desert => Self {
                name: "Desert Wastes".to_string(),
                kind,
                energy_generation_mult: 0.5,
                energy_decay_mult: 1.5,
                movement_cost_mult: 1.3,
                carrying_capacity: 60,
                background_color: (45, 40, 25),
                ..neutral
            },
            ZoneKind::Toxic => Self {
                name: "Toxic Zone".to_string(),
                kind,
                energy_decay_mult: 2.0,
                mutation_rate_mult: 3.0,
                reproduction_cost_mult: 1.5,
                carrying_capacity: 40,
                background_color: (25, 45, 25),
                ..neutral
            },
            ZoneKind::Paradise => Self {
                name: "Paradise".to_string(),
                kind,
                energy_generation_mult: 2.0,
                energy_decay_mult: 0.5,
                reproduction_cost_mult: 0.7,
                mutation_rate_mult: 0.5,
                carrying_capacity: 150,
                background_color: (25, 30, 40),
                ..neutral
            },
            ZoneKind::Void => Self {
                name: "The Void".to_string(),
                kind,
                can_enter: false,
                carrying_capacity: 0,
                background_color: (0, 0, 0),
                ..neutral
            },
            ZoneKind::Neutral => neutral,
        }
    }

    /// Piecewise-linear feedback from zone occupancy versus capacity:
    /// a bonus while underpopulated, sliding into a penalty past capacity.
    pub fn population_pressure(&self, count: usize) -> f64 {
        if self.carrying_capacity == 0 {
            return 0.0;
        }
        let n = count as f64;
        let c = f64::from(self.carrying_capacity);
        if n < 0.5 * c {
            1.3
        } else if n < c {
            1.3 - 0.3 * (n - 0.5 * c) / (0.5 * c)
        } else if n < 1.3 * c {
            1.0 - 0.3 * (n - c) / (0.3 * c)
        } else {
            0.6
        }
    }
}

/// An axis-aligned rectangle of the lattice with its own environment.
///
/// Rectangles may extend past the lattice edge (the ring layout does this
/// on small grids); containment is what matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub properties: ZoneProperties,
}

impl Zone {
    pub fn new(x: i32, y: i32, width: i32, height: i32, properties: ZoneProperties) -> Self {
        Self {
            x,
            y,
            width,
            height,
            properties,
        }
    }

    pub fn of_kind(x: i32, y: i32, width: i32, height: i32, kind: ZoneKind) -> Self {
        Self::new(x, y, width, height, ZoneProperties::from_kind(kind))
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Owns every configured zone plus the grid-wide neutral default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneManager {
    grid_width: i32,
    grid_height: i32,
    zones: Vec<Zone>,
    default_zone: Zone,
    shift_interval: Option<u64>,
}

impl ZoneManager {
    pub fn new(grid_width: u16, grid_height: u16) -> Self {
        let (w, h) = (i32::from(grid_width), i32::from(grid_height));
        Self {
            grid_width: w,
            grid_height: h,
            zones: Vec::new(),
            default_zone: Zone::of_kind(0, 0, w, h, ZoneKind::Neutral),
            shift_interval: None,
        }
    }

    /// Later zones override earlier ones where they overlap.
    pub fn add_zone(&mut self, zone: Zone) {
        self.zones.push(zone);
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn default_zone(&self) -> &Zone {
        &self.default_zone
    }

    /// The innermost zone containing a site, in reverse insertion order.
    pub fn zone_at(&self, x: i32, y: i32) -> &Zone {
        self.zones
            .iter()
            .rev()
            .find(|z| z.contains(x, y))
            .unwrap_or(&self.default_zone)
    }

    /// Index into [`Self::zones`] of the zone covering a site, or
    /// `u32::MAX` for the default zone.
    pub fn zone_index_at(&self, x: i32, y: i32) -> u32 {
        self.zones
            .iter()
            .rposition(|z| z.contains(x, y))
            .map_or(u32::MAX, |i| i as u32)
    }

    pub fn create_random_zones(&mut self, rng: &mut SimRng, count: usize) {
        for _ in 0..count {
            let width = rng.gen_range(20..=60);
            let height = rng.gen_range(20..=60);
            let x = rng.gen_range(0..=(self.grid_width - width).max(0));
            let y = rng.gen_range(0..=(self.grid_height - height).max(0));
            let kind = *ZoneKind::LAYOUT_POOL
                .choose(rng)
                .expect("layout pool is non-empty");
            self.add_zone(Zone::of_kind(x, y, width, height, kind));
        }
    }

    pub fn create_quadrant_zones(&mut self) {
        let hw = self.grid_width / 2;
        let hh = self.grid_height / 2;
        self.add_zone(Zone::of_kind(0, 0, hw, hh, ZoneKind::Fertile));
        self.add_zone(Zone::of_kind(hw, 0, hw, hh, ZoneKind::Desert));
        self.add_zone(Zone::of_kind(0, hh, hw, hh, ZoneKind::Toxic));
        self.add_zone(Zone::of_kind(hw, hh, hw, hh, ZoneKind::Paradise));
    }

    /// Central paradise square with a toxic ring approximated by four
    /// rectangles.
    pub fn create_ring_world(&mut self, center_radius: i32) {
        let cx = self.grid_width / 2;
        let cy = self.grid_height / 2;
        let r = center_radius;
        let ring = 40;

        self.add_zone(Zone::of_kind(cx - r, cy - r, r * 2, r * 2, ZoneKind::Paradise));
        // Top, bottom, left, right bands.
        self.add_zone(Zone::of_kind(
            cx - r - ring,
            cy - r - ring,
            r * 2 + ring * 2,
            ring,
            ZoneKind::Toxic,
        ));
        self.add_zone(Zone::of_kind(
            cx - r - ring,
            cy + r,
            r * 2 + ring * 2,
            ring,
            ZoneKind::Toxic,
        ));
        self.add_zone(Zone::of_kind(cx - r - ring, cy - r, ring, r * 2, ZoneKind::Toxic));
        self.add_zone(Zone::of_kind(cx + r, cy - r, ring, r * 2, ZoneKind::Toxic));
    }

    /// Turn on the extra shifting mode: a full shift pass every `interval`
    /// generations on top of the regular cycle.
    pub fn enable_shifting(&mut self, interval: u64) {
        self.shift_interval = Some(interval.max(1));
    }

    pub fn shift_interval(&self) -> Option<u64> {
        self.shift_interval
    }

    /// One shift pass: each zone either takes on a new kind or drifts,
    /// and may grow or shrink.
    pub fn shift_zones(&mut self, rng: &mut SimRng) {
        let (gw, gh) = (self.grid_width, self.grid_height);
        for zone in &mut self.zones {
            if rng.gen_bool(0.3) {
                let kind = *ZoneKind::SHIFT_POOL
                    .choose(rng)
                    .expect("shift pool is non-empty");
                zone.properties = ZoneProperties::from_kind(kind);
            } else {
                zone.x = (zone.x + rng.gen_range(-8..=8)).clamp(0, (gw - zone.width).max(0));
                zone.y = (zone.y + rng.gen_range(-8..=8)).clamp(0, (gh - zone.height).max(0));
            }
            if rng.gen_bool(0.6) {
                zone.width =
                    (zone.width + rng.gen_range(-8..=8)).clamp(SHIFT_MIN_EXTENT, SHIFT_MAX_EXTENT);
                zone.height =
                    (zone.height + rng.gen_range(-8..=8)).clamp(SHIFT_MIN_EXTENT, SHIFT_MAX_EXTENT);
                zone.x = zone.x.clamp(0, (gw - zone.width).max(0));
                zone.y = zone.y.clamp(0, (gh - zone.height).max(0));
            }
        }
    }
}
