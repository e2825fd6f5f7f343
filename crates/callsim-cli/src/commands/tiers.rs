//! Tiers command implementation
//!
//! Lists every phone-quality tier with its passband and artifact scaling.

use anyhow::Result;
use callsim_spec::{QualityTier, CANONICAL_SAMPLE_RATE};
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;

/// One row of the tier listing.
#[derive(Debug, Serialize)]
pub struct TierInfo {
    pub id: &'static str,
    pub description: String,
    /// `None` for the custom tier, whose band comes from the parameters.
    pub passband_hz: Option<(f64, f64)>,
    pub landline: bool,
    pub modern: bool,
    pub dropout_mult: Option<f64>,
    pub garble_mult: Option<f64>,
}

/// Builds the listing in presentation order.
pub fn tier_infos() -> Vec<TierInfo> {
    let nyquist = CANONICAL_SAMPLE_RATE as f64 / 2.0;
    QualityTier::ALL
        .iter()
        .map(|tier| {
            let profile = tier.profile();
            TierInfo {
                id: tier.as_str(),
                description: profile
                    .as_ref()
                    .map(|p| p.description.clone())
                    .unwrap_or_else(|| "Custom Quality (from parameters)".to_string()),
                passband_hz: profile
                    .as_ref()
                    .map(|p| (p.passband_low_hz, p.high_cut_or(nyquist))),
                landline: tier.is_landline(),
                modern: tier.is_modern(),
                dropout_mult: profile.as_ref().map(|p| p.dropout_mult),
                garble_mult: profile.as_ref().map(|p| p.garble_mult),
            }
        })
        .collect()
}

/// Run the tiers command
///
/// # Returns
/// Exit code: 0 on success
pub fn run(json_output: bool) -> Result<ExitCode> {
    let infos = tier_infos();
    if json_output {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Phone quality tiers:".cyan().bold());
    for info in &infos {
        let band = match info.passband_hz {
            Some((lo, hi)) => format!("{}–{} Hz", lo as i64, hi as i64),
            None => "custom_low_hz–custom_high_hz".to_string(),
        };
        let family = if info.landline {
            "landline"
        } else if info.modern {
            "modern"
        } else {
            "cellular"
        };
        println!(
            "  {:<14} {:<42} {:<16} {}",
            info.id.bold(),
            info.description,
            band,
            family.dimmed()
        );
    }
    Ok(ExitCode::SUCCESS)
}
