//! # Main — CLI Entry Point
//!
//! Thin command-line front over the library: primality testing, primality
//! proving with certificate output, factoring, and certificate verification.
//! Verbosity flags map onto `tracing` level filters so the search progress
//! the library logs is visible on demand.

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use primacert::{cert, factor, is_prob_prime, is_provable_prime, parse_decimal, Primality};
use std::io::Read;
use std::path::PathBuf;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "primacert", about = "Prove primality and factor integers")]
struct Cli {
    /// Increase verbosity (-v progress, -vv detailed search tracing)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// BPSW probable-prime test plus extra Miller-Rabin rounds
    IsPrime {
        /// The number to test (decimal)
        n: String,
    },
    /// BPSW probable-prime test only
    ProbPrime {
        /// The number to test (decimal)
        n: String,
    },
    /// Prove primality via ECPP and print the certificate
    Prove {
        /// The number to prove (decimal)
        n: String,
        /// Write the certificate to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Full prime factorization
    Factor {
        /// The number to factor (decimal)
        n: String,
    },
    /// Verify an ECPP certificate (from a file, or stdin when omitted)
    Validate {
        /// The number the certificate claims prime (decimal)
        n: String,
        /// Certificate file (stdin when omitted)
        #[arg(long)]
        cert: Option<PathBuf>,
        /// Print the parsed certificate as JSON after verification
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::IsPrime { n } => {
            let n = parse_decimal(&n)?;
            let verdict = primacert::is_prime(&n);
            println!("{} ({})", verdict.code(), verdict);
            std::process::exit(if verdict == Primality::Composite { 1 } else { 0 });
        }
        Commands::ProbPrime { n } => {
            let n = parse_decimal(&n)?;
            let verdict = is_prob_prime(&n);
            println!("{} ({})", verdict.code(), verdict);
            std::process::exit(if verdict == Primality::Composite { 1 } else { 0 });
        }
        Commands::Prove { n, out } => {
            let n = parse_decimal(&n)?;
            let (verdict, proof) = is_provable_prime(&n, true);
            match verdict {
                Primality::Prime => {
                    let text = proof.unwrap_or_default();
                    eprintln!("{n} is prime");
                    match out {
                        Some(path) => std::fs::write(&path, &text)
                            .with_context(|| format!("writing {}", path.display()))?,
                        None => print!("{text}"),
                    }
                }
                Primality::Probable => {
                    bail!("{n} is probably prime but no proof was completed")
                }
                Primality::Composite => bail!("{n} is composite"),
            }
        }
        Commands::Factor { n } => {
            let n = parse_decimal(&n)?;
            let factors = factor(&n);
            let strs: Vec<String> = factors.iter().map(|f| f.to_string()).collect();
            println!("{}", strs.join(" "));
        }
        Commands::Validate { n, cert: path, json } => {
            let n = parse_decimal(&n)?;
            let text = match path {
                Some(p) => std::fs::read_to_string(&p)
                    .with_context(|| format!("reading {}", p.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            cert::verify_certificate(&n, &text)?;
            println!("certificate for {n} verifies");
            if json {
                let lines = cert::parse_certificate(&text)?;
                println!("{}", serde_json::to_string_pretty(&lines)?);
            }
        }
    }
    Ok(())
}
