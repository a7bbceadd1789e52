//! Köppen-Geiger classification over a monthly climatology.
//!
//! The decision tree follows the standard rule set, evaluated in the usual
//! polar, arid, tropical, temperate, continental order so that arid climates
//! are caught before the temperature groups claim them. Month indexing is
//! northern-hemisphere: April through September count as the warm half-year.
//! Inputs arrive in °F and inches and are converted internally.

/// Classification result, a short code plus a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KoppenClass {
    pub code: String,
    pub label: String,
}

impl KoppenClass {
    fn from_code(code: &str) -> Self {
        KoppenClass {
            code: code.to_string(),
            label: label_for(code).to_string(),
        }
    }

    fn unclassified() -> Self {
        KoppenClass {
            code: "Unclassified".to_string(),
            label: "Unclassified".to_string(),
        }
    }
}

/// 0-based indices of the northern-hemisphere warm half-year (Apr..Sep).
const WARM_MONTHS: std::ops::Range<usize> = 3..9;

/// Classifies twelve monthly mean temperatures (°F) and precipitation
/// totals (inches). Any missing or non-finite month yields `Unclassified`
/// instead of an error.
pub fn classify(
    mean_temp_f: &[Option<f64>; 12],
    precipitation_in: &[Option<f64>; 12],
) -> KoppenClass {
    let mut temps_c = [0.0; 12];
    let mut precip_mm = [0.0; 12];
    for month in 0..12 {
        match (mean_temp_f[month], precipitation_in[month]) {
            (Some(t), Some(p)) if t.is_finite() && p.is_finite() => {
                temps_c[month] = (t - 32.0) * 5.0 / 9.0;
                precip_mm[month] = p.max(0.0) * 25.4;
            }
            _ => return KoppenClass::unclassified(),
        }
    }

    let mat = temps_c.iter().sum::<f64>() / 12.0;
    let hottest = temps_c.iter().cloned().fold(f64::MIN, f64::max);
    let coldest = temps_c.iter().cloned().fold(f64::MAX, f64::min);
    let annual_mm = precip_mm.iter().sum::<f64>();
    let driest = precip_mm.iter().cloned().fold(f64::MAX, f64::min);

    // Polar first: no summer to speak of.
    if hottest < 10.0 {
        return KoppenClass::from_code(if hottest > 0.0 { "ET" } else { "EF" });
    }

    // Arid next, before the temperature groups can claim dry climates.
    let warm_mm: f64 = WARM_MONTHS.map(|m| precip_mm[m]).sum();
    let threshold = arid_threshold_mm(mat, warm_mm, annual_mm);
    if annual_mm < 10.0 * threshold {
        let wetness = if annual_mm < 5.0 * threshold { "BW" } else { "BS" };
        let heat = if mat >= 18.0 { "h" } else { "k" };
        return KoppenClass::from_code(&format!("{wetness}{heat}"));
    }

    // Tropical: every month warm.
    if coldest >= 18.0 {
        let code = if driest >= 60.0 {
            "Af"
        } else if driest >= 100.0 - annual_mm / 25.0 {
            "Am"
        } else {
            "Aw"
        };
        return KoppenClass::from_code(code);
    }

    let group = if coldest > 0.0 { 'C' } else { 'D' };
    let seasonality = seasonal_letter(&precip_mm);
    let warmth = warmth_letter(group, &temps_c, hottest, coldest);
    KoppenClass::from_code(&format!("{group}{seasonality}{warmth}"))
}

/// Arid-climate precipitation threshold in mm, shifted by which half-year
/// carries at least 70 % of the annual total.
fn arid_threshold_mm(mat: f64, warm_mm: f64, annual_mm: f64) -> f64 {
    if annual_mm <= 0.0 {
        return 2.0 * mat + 14.0;
    }
    let warm_share = warm_mm / annual_mm;
    if warm_share >= 0.7 {
        2.0 * mat + 28.0
    } else if warm_share <= 0.3 {
        2.0 * mat
    } else {
        2.0 * mat + 14.0
    }
}

/// Dry-summer / dry-winter / no-dry-season letter for C and D climates.
fn seasonal_letter(precip_mm: &[f64; 12]) -> char {
    let warm: Vec<f64> = WARM_MONTHS.map(|m| precip_mm[m]).collect();
    let cold: Vec<f64> = (0..12)
        .filter(|m| !WARM_MONTHS.contains(m))
        .map(|m| precip_mm[m])
        .collect();
    let warm_driest = warm.iter().cloned().fold(f64::MAX, f64::min);
    let warm_wettest = warm.iter().cloned().fold(f64::MIN, f64::max);
    let cold_driest = cold.iter().cloned().fold(f64::MAX, f64::min);
    let cold_wettest = cold.iter().cloned().fold(f64::MIN, f64::max);

    if warm_driest < 40.0 && warm_driest < cold_wettest / 3.0 {
        's'
    } else if cold_driest < warm_wettest / 10.0 {
        'w'
    } else {
        'f'
    }
}

/// Summer-warmth letter for C and D climates.
fn warmth_letter(group: char, temps_c: &[f64; 12], hottest: f64, coldest: f64) -> char {
    if hottest >= 22.0 {
        return 'a';
    }
    let warm_months = temps_c.iter().filter(|&&t| t >= 10.0).count();
    if warm_months >= 4 {
        'b'
    } else if group == 'D' && coldest < -38.0 {
        'd'
    } else {
        'c'
    }
}

fn label_for(code: &str) -> &'static str {
    match code {
        "Af" => "Tropical rainforest",
        "Am" => "Tropical monsoon",
        "Aw" => "Tropical savanna",
        "BWh" => "Hot desert",
        "BWk" => "Cold desert",
        "BSh" => "Hot semi-arid",
        "BSk" => "Cold semi-arid",
        "Csa" => "Hot-summer Mediterranean",
        "Csb" => "Warm-summer Mediterranean",
        "Csc" => "Cold-summer Mediterranean",
        "Cwa" => "Dry-winter humid subtropical",
        "Cwb" => "Dry-winter subtropical highland",
        "Cwc" => "Dry-winter cold oceanic",
        "Cfa" => "Humid subtropical",
        "Cfb" => "Oceanic",
        "Cfc" => "Subpolar oceanic",
        "Dsa" => "Dry-summer hot continental",
        "Dsb" => "Dry-summer warm continental",
        "Dsc" => "Dry-summer subarctic",
        "Dsd" => "Dry-summer severe subarctic",
        "Dwa" => "Dry-winter hot continental",
        "Dwb" => "Dry-winter warm continental",
        "Dwc" => "Dry-winter subarctic",
        "Dwd" => "Dry-winter severe subarctic",
        "Dfa" => "Hot-summer humid continental",
        "Dfb" => "Warm-summer humid continental",
        "Dfc" => "Subarctic",
        "Dfd" => "Severe subarctic",
        "ET" => "Tundra",
        "EF" => "Ice cap",
        _ => "Unclassified",
    }
}
