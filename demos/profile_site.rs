use spotclim::{Spotclim, SpotclimError, Variable};
use std::env;

#[tokio::main]
async fn main() -> Result<(), SpotclimError> {
    env_logger::init();

    let archive_dir = env::args()
        .nth(1)
        .unwrap_or_else(|| "./data/archive".to_string());
    let client = Spotclim::from_archive(&archive_dir).await?;

    // Red Rocks Amphitheatre, a ridge well above the nearby stations.
    let report = client
        .profile()
        .latitude(39.6654)
        .longitude(-105.2057)
        .elevation_ft(6450.0)
        .call()
        .await?;

    println!(
        "{} ({}), hardiness zone {}",
        report.location.koppen_code, report.location.koppen_label, report.location.hardiness_zone
    );

    for var in [Variable::HighTemp, Variable::LowTemp, Variable::Precipitation] {
        if let Some(summary) = report.variable(var) {
            println!("{var}: annual {:?}, monthly {:?}", summary.annual, summary.monthly);
        }
    }

    if let Some(lows) = report.variable(Variable::LowTemp) {
        println!(
            "record low {:?}, expected yearly low {:?}",
            lows.annual_min, lows.expected_annual_min
        );
    }

    Ok(())
}
