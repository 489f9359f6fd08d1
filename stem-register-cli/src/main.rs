//! CLI for registering two terrestrial laser-scan stem maps.
//!
//! Thin wrapper around the `stem_register` library: parses the stem-map file
//! format, builds a [`stem_register::RegistrationConfig`], calls
//! [`stem_register::register`], and reports the result. All of the actual
//! correspondence search and transform solving lives in the library crate.

mod io;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use stem_register::{register, RegistrationConfig, DIAMETER_ERROR_TOL, LINEARITY_TOL};

/// Register a source stem map onto a target stem map.
#[derive(Parser)]
#[command(name = "stem-register", about = "Rigid registration of two stem maps", version)]
struct Cli {
    /// Path to the target stem-map file.
    #[arg(long)]
    target: PathBuf,

    /// Path to the source stem-map file.
    #[arg(long)]
    source: PathBuf,

    /// Max Euclidean distance (meters) for the RANSAC growth loop to accept a match.
    #[arg(long)]
    ransac_tol: f64,

    /// Max relative diameter error to accept a correspondence.
    #[arg(long, default_value_t = DIAMETER_ERROR_TOL)]
    diam_tol: f64,

    /// Minimum diameter (exclusive) for a stem-map record to be kept.
    #[arg(long, default_value_t = 0.0)]
    min_diam: f64,

    /// Max lambda_max / (lambda_max + lambda_mid) for a usable triplet.
    #[arg(long, default_value_t = LINEARITY_TOL)]
    linearity_tol: f64,

    /// Keep near-colinear triplets instead of filtering them before pairing.
    #[arg(long)]
    keep_degenerate_triplets: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let target = io::load_stem_map(&cli.target, cli.min_diam)?;
    let source = io::load_stem_map(&cli.source, cli.min_diam)?;
    info!(
        "loaded {} target stem(s), {} source stem(s)",
        target.len(),
        source.len()
    );

    let config = RegistrationConfig::new(cli.ransac_tol)
        .with_diam_error_tol(cli.diam_tol)
        .with_linearity_tol(cli.linearity_tol)
        .with_filter_degenerate_triplets(!cli.keep_degenerate_triplets);

    let result = register(&target, &source, &config)?;

    println!("Best transform:");
    println!("{}", result.transform);
    println!("MSE: {:e}", result.mse);
    println!("Stems used: {}", result.consensus.len());
    println!("Lonely stems pruned: {}", result.lonely_stems_removed);
    println!(
        "Candidate pairs skipped for numeric instability: {}",
        result.unstable_pairs_skipped
    );
    for (i, (target_stem, source_stem)) in result.consensus.iter().enumerate() {
        println!(
            "  [{i}] target {:?} r={:.3}  <->  source {:?} r={:.3}",
            target_stem.position(),
            target_stem.radius(),
            source_stem.position(),
            source_stem.radius()
        );
    }

    Ok(())
}
