//! callsim CLI - render clean voice recordings as phone calls
//!
//! Logging goes to stderr and is controlled by `CALLSIM_LOG` (default `warn`).

mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// callsim - phone-call degradation renderer
#[derive(Parser)]
#[command(name = "callsim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a voice file through the phone-call pipeline
    Render {
        /// Path to the clean voice recording
        #[arg(short, long)]
        input: String,

        /// Path of the rendered WAV
        #[arg(short, long)]
        output: String,

        /// Parameter record (JSON); missing fields use the defaults
        #[arg(short, long)]
        params: Option<String>,

        /// Render seed (default: drawn from OS entropy)
        #[arg(short, long)]
        seed: Option<u32>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// List the phone-quality tiers
    Tiers {
        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("CALLSIM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Render {
            input,
            output,
            params,
            seed,
            json,
        } => commands::render::run(&input, &output, params.as_deref(), seed, json),
        Commands::Tiers { json } => commands::tiers::run(json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from([
            "callsim",
            "render",
            "--input",
            "voice.wav",
            "--output",
            "call.wav",
            "--seed",
            "42",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                input,
                output,
                params,
                seed,
                json,
            } => {
                assert_eq!(input, "voice.wav");
                assert_eq!(output, "call.wav");
                assert_eq!(params, None);
                assert_eq!(seed, Some(42));
                assert!(!json);
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_cli_parses_render_with_params_and_json() {
        let cli = Cli::try_parse_from([
            "callsim", "render", "-i", "a.wav", "-o", "b.wav", "-p", "p.json", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Render { params, seed, json, .. } => {
                assert_eq!(params.as_deref(), Some("p.json"));
                assert_eq!(seed, None);
                assert!(json);
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_cli_requires_output() {
        assert!(Cli::try_parse_from(["callsim", "render", "--input", "voice.wav"]).is_err());
    }

    #[test]
    fn test_cli_parses_tiers() {
        let cli = Cli::try_parse_from(["callsim", "tiers", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Tiers { json: true }));
    }
}
