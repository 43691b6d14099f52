//! CUSTOS Healthcare Audit Trail — Demo CLI
//!
//! Runs one or all of the three healthcare demo scenarios.  Each scenario uses
//! real CUSTOS components (chain writer, RSA signer, AES-GCM cipher, integrity
//! verifier, compliance reporter) wired together with mock clinical activity.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- glucose-chain
//!   cargo run -p demo -- tamper-investigation
//!   cargo run -p demo -- --config custos.toml unauthorized-access

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use custos_config::ComplianceConfig;
use custos_contracts::error::CustosResult;
use custos_ref_healthcare::scenarios::{
    glucose_chain, healthcare_config, tamper_investigation, unauthorized_access,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// CUSTOS — Tamper-evident audit trail healthcare demo.
///
/// Each subcommand runs one or all of the three clinical audit scenarios,
/// demonstrating hash chaining, signing, encryption and compliance reporting.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "CUSTOS healthcare audit trail demo",
    long_about = "Runs CUSTOS healthcare demo scenarios showing sealed hash chains,\n\
                  tamper localization, per-tenant chains and compliance reports."
)]
struct Cli {
    /// Compliance configuration (TOML).  Defaults to the embedded
    /// healthcare profile.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three healthcare scenarios in sequence.
    RunAll,
    /// Scenario 1: Glucose Monitoring Chain (seal, correct, report).
    GlucoseChain,
    /// Scenario 2: Tamper Investigation (localize insider edits).
    TamperInvestigation,
    /// Scenario 3: Unauthorized Access Monitoring (per-tenant chains).
    UnauthorizedAccess,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = load_config(cli.config).and_then(|config| match cli.command {
        Command::RunAll => run_all(&config),
        Command::GlucoseChain => glucose_chain::run_scenario(&config),
        Command::TamperInvestigation => tamper_investigation::run_scenario(&config),
        Command::UnauthorizedAccess => unauthorized_access::run_scenario(&config),
    });

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn load_config(path: Option<PathBuf>) -> CustosResult<ComplianceConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading compliance configuration");
            ComplianceConfig::from_file(&path)
        }
        None => healthcare_config(),
    }
}

fn run_all(config: &ComplianceConfig) -> CustosResult<()> {
    glucose_chain::run_scenario(config)?;
    tamper_investigation::run_scenario(config)?;
    unauthorized_access::run_scenario(config)?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("CUSTOS — Tamper-evident Audit Trail");
    println!("Healthcare Reference Demo");
    println!("===================================");
    println!();
    println!("CUSTOS sealing pipeline per record:");
    println!("  [1] Record built from caller fields + trusted timestamp");
    println!("  [2] SHA-256 over canonical fields + previous hash → current hash");
    println!("  [3] RSA PKCS#1 v1.5 signature over the current hash");
    println!("  [4] AES-256-GCM encryption of the full record");
    println!("  [5] Compare-and-append to the chain tail");
    println!();
}
