//! Render command implementation
//!
//! Renders one voice file and copies the result to the requested output path.

use anyhow::{Context, Result};
use callsim_backend_audio::RenderSession;
use callsim_spec::{EffectParameters, RenderStatus};
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

/// Machine-readable result of a render.
#[derive(Debug, Serialize)]
pub struct RenderReport {
    pub input: String,
    pub output: String,
    pub seed: u32,
    pub pcm_hash: String,
    pub duration_seconds: f64,
    /// One-line status string.
    pub summary: String,
    pub status: RenderStatus,
}

/// Run the render command
///
/// # Arguments
/// * `input` - Voice recording to render
/// * `output` - Destination WAV path
/// * `params_path` - Optional parameter JSON
/// * `seed` - Render seed; drawn from OS entropy when `None`
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(
    input: &str,
    output: &str,
    params_path: Option<&str>,
    seed: Option<u32>,
    json_output: bool,
) -> Result<ExitCode> {
    let params = match params_path {
        Some(path) => EffectParameters::from_file(Path::new(path))
            .with_context(|| format!("Failed to load parameters: {}", path))?,
        None => EffectParameters::default(),
    };
    let seed = seed.unwrap_or_else(rand::random);

    let report = render(input, output, &params, seed)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&report);
    }
    Ok(ExitCode::SUCCESS)
}

/// Renders `input` into `output` and returns the report.
pub fn render(input: &str, output: &str, params: &EffectParameters, seed: u32) -> Result<RenderReport> {
    let mut session = RenderSession::new().context("Failed to create render session")?;
    let out = session
        .render(Path::new(input), params, seed)
        .with_context(|| format!("Failed to render {}", input))?;

    if let Some(parent) = Path::new(output).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }
    }
    fs::copy(&out.path, output).with_context(|| format!("Failed to write output: {}", output))?;

    Ok(RenderReport {
        input: input.to_string(),
        output: output.to_string(),
        seed,
        pcm_hash: out.pcm_hash,
        duration_seconds: out.samples.len() as f64 / callsim_spec::CANONICAL_SAMPLE_RATE as f64,
        summary: out.status.to_string(),
        status: out.status,
    })
}

fn print_human(report: &RenderReport) {
    println!("{} {}", "Rendered".green().bold(), report.output);
    println!("  {} {}", "Input:".dimmed(), report.input);
    println!("  {} {}", "Seed:".dimmed(), report.seed);
    println!("  {} {:.2} s", "Duration:".dimmed(), report.duration_seconds);
    println!("  {} {}", "PCM hash:".dimmed(), report.pcm_hash);
    println!("  {} {}", "Status:".dimmed(), report.summary);
    if !report.status.fallbacks.is_empty() {
        println!(
            "  {} {} parameter(s) adjusted",
            "Warning:".yellow().bold(),
            report.status.fallbacks.len()
        );
    }
}
