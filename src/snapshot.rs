//! Read-only views handed to collaborators (rendering, export, tests).
//!
//! A [`GridView`] carries everything needed to draw one frame: per-site
//! cell state, the species color table, and zone geometry. A [`Stats`]
//! record summarizes one generation.

use serde::{Deserialize, Serialize};

use crate::species::SpeciesId;
use crate::zones::ZoneKind;

/// Aggregate statistics for the current generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub generation: u64,
    pub population: u32,
    pub species_count: u32,
    pub births: u32,
    pub deaths: u32,
    pub mutations: u32,
    /// Mean age in generations of the living species.
    pub avg_species_age: f64,
    pub dominant_species_id: Option<SpeciesId>,
}

/// One occupied site as the display layer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    pub species_id: SpeciesId,
    pub energy: f64,
    pub max_energy: f64,
    pub age: i32,
}

/// One row of the species color table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesView {
    pub id: SpeciesId,
    pub name: String,
    pub color: (u8, u8, u8),
    pub population: u32,
    pub extinct: bool,
}

/// Zone geometry for background rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneView {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub kind: ZoneKind,
    pub can_enter: bool,
    pub color: (u8, u8, u8),
}

/// A copy of the lattice sufficient to render, taken between steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridView {
    pub width: u16,
    pub height: u16,
    pub generation: u64,
    /// Row-major, `None` for empty sites.
    pub cells: Vec<Option<CellView>>,
    pub species: Vec<SpeciesView>,
    pub zones: Vec<ZoneView>,
}

impl GridView {
    pub fn cell(&self, x: u16, y: u16) -> Option<&CellView> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[usize::from(y) * usize::from(self.width) + usize::from(x)].as_ref()
    }

    pub fn population(&self) -> usize {
        self.cells.iter().flatten().count()
    }
}
