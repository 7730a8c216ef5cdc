use crate::error::Result;
use epipred::core::profiles::{PredictorProfile, predictor_profiles};

fn format_profile(profile: &PredictorProfile) -> String {
    format!(
        "{:<12} {:<22} {:<17} {}",
        profile.name,
        profile.score_key,
        profile.direction.to_string(),
        profile.simple_cutoff
    )
}

pub fn run() -> Result<()> {
    println!(
        "{:<12} {:<22} {:<17} {}",
        "predictor", "score column", "direction", "simple cutoff"
    );
    for profile in predictor_profiles() {
        println!("{}", format_profile(profile));
    }
    Ok(())
}
