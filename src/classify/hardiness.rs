//! Plant hardiness zones from the expected annual minimum temperature.

/// Half-zone labels covering [-65, 65) °F in ascending 5 °F steps.
const HALF_ZONES: [&str; 26] = [
    "0b", "1a", "1b", "2a", "2b", "3a", "3b", "4a", "4b", "5a", "5b", "6a", "6b", "7a", "7b",
    "8a", "8b", "9a", "9b", "10a", "10b", "11a", "11b", "12a", "12b", "13a",
];

/// Maps an expected annual minimum (°F) to its USDA-style half zone.
///
/// Intervals are half-open on the right, scanning ascending: zone 0a is
/// everything below -65 °F, so exactly -65 lands in 0b, and 13b catches
/// everything from 65 °F up.
pub fn hardiness_zone(annual_min_f: f64) -> &'static str {
    if annual_min_f.is_nan() {
        return "Unknown";
    }
    if annual_min_f < -65.0 {
        return "0a";
    }
    let mut upper = -60.0;
    for zone in HALF_ZONES {
        if annual_min_f < upper {
            return zone;
        }
        upper += 5.0;
    }
    "13b"
}
