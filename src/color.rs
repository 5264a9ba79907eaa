//! Species color derivation.
//!
//! Colors are informative, not behavioral. Hue encodes complexity and
//! metabolic class, saturation encodes how specialized the species is for
//! any zone, and value encodes metabolic efficiency. The display layer can
//! additionally dim a cell by its energy reserve.

use crate::species::SpeciesTraits;
use crate::zones::ZoneKind;

/// Derive the display color for a trait record.
pub fn species_color(traits: &SpeciesTraits) -> (u8, u8, u8) {
    let base_hue: f64 = match traits.complexity {
        1 => 120.0,
        2 if traits.photosynthesis_rate > 5 => 180.0,
        2 => 60.0,
        3 => 30.0,
        _ => 0.0,
    };
    let zone_shift = match traits.native_zone_type {
        ZoneKind::Desert => -15.0,
        ZoneKind::Toxic => -30.0,
        _ => 0.0,
    };
    let hue = (base_hue + zone_shift).rem_euclid(360.0);

    let specialization = traits
        .heat_tolerance
        .max(traits.cold_tolerance)
        .max(traits.toxin_resistance);
    let saturation = 0.4 + specialization * 0.6;
    let value = (0.5 + traits.metabolic_efficiency * 0.3).clamp(0.5, 0.9);

    hsv_to_rgb(hue, saturation, value)
}

/// Dim a color toward 40% brightness as a cell's energy reserve empties.
pub fn energy_dimmed(color: (u8, u8, u8), energy_fraction: f64) -> (u8, u8, u8) {
    let brightness = 0.4 + 0.6 * energy_fraction.clamp(0.0, 1.0);
    (
        (f64::from(color.0) * brightness) as u8,
        (f64::from(color.1) * brightness) as u8,
        (f64::from(color.2) * brightness) as u8,
    )
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> (u8, u8, u8) {
    let c = value * saturation;
    let hp = hue / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as i32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::SpeciesTraits;

    #[test]
    fn simple_photosynthesizers_are_green() {
        let traits = SpeciesTraits::default().sanitize();
        let (r, g, b) = species_color(&traits);
        assert!(g > r && g > b, "expected green-dominant, got ({r},{g},{b})");
    }

    #[test]
    fn apex_predators_are_red() {
        let traits = SpeciesTraits {
            complexity: 4,
            ..SpeciesTraits::default()
        }
        .sanitize();
        let (r, g, b) = species_color(&traits);
        assert!(r > g && r > b, "expected red-dominant, got ({r},{g},{b})");
    }

    #[test]
    fn specialization_raises_saturation() {
        let generalist = SpeciesTraits {
            heat_tolerance: 0.0,
            cold_tolerance: 0.0,
            toxin_resistance: 0.0,
            ..SpeciesTraits::default()
        }
        .sanitize();
        let specialist = SpeciesTraits {
            heat_tolerance: 1.0,
            ..generalist
        }
        .sanitize();
        let (r1, g1, b1) = species_color(&generalist);
        let (r2, g2, b2) = species_color(&specialist);
        let spread1 = i32::from(r1.max(g1).max(b1)) - i32::from(r1.min(g1).min(b1));
        let spread2 = i32::from(r2.max(g2).max(b2)) - i32::from(r2.min(g2).min(b2));
        assert!(spread2 > spread1);
    }

    #[test]
    fn dimming_scales_toward_forty_percent() {
        let full = energy_dimmed((200, 100, 50), 1.0);
        let empty = energy_dimmed((200, 100, 50), 0.0);
        assert_eq!(full, (200, 100, 50));
        assert_eq!(empty, (80, 40, 20));
    }
}
