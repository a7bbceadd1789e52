//! Solar geometry from day-of-year and latitude.

/// Solar declination in degrees for a day of the year.
pub fn declination_deg(day_of_year: u32) -> f64 {
    23.45 * (std::f64::consts::TAU * (284.0 + day_of_year as f64) / 365.0).sin()
}

/// Noon sun elevation angle in degrees, clamped to [0, 90].
pub fn noon_sun_angle_deg(latitude: f64, declination_deg: f64) -> f64 {
    (90.0 - (latitude - declination_deg).abs()).clamp(0.0, 90.0)
}

/// Daylight duration in hours from the sunset hour angle.
///
/// Polar day and polar night clamp to 24 and 0 instead of producing NaN from
/// an out-of-range arccosine.
pub fn daylight_hours(latitude: f64, declination_deg: f64) -> f64 {
    let cos_hour_angle = -latitude.to_radians().tan() * declination_deg.to_radians().tan();
    if cos_hour_angle <= -1.0 {
        24.0
    } else if cos_hour_angle >= 1.0 {
        0.0
    } else {
        2.0 * cos_hour_angle.acos().to_degrees() / 15.0
    }
}
