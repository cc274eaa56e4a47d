//! evomsa - alignment processing and domain extraction.
//!
//! ## Usage
//!
//! ```bash
//! evomsa process in.aln out.phy -o phylip --rgoc --rem-red
//! evomsa d2f domains.txt proteins.fasta structures.txt -e 1e-5
//! evomsa extract Pkinase hmmscan.domtblout proteins.fasta kinases.fasta -e 0.1
//! ```
//!
//! Logging goes to stderr; the level comes from `RUST_LOG`, else
//! `EVOMSA_LOG`, else `info`.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use evomsa::cli::{self, Cli};
use evomsa::formats::{ParseError, WriteError};

fn init_logging() {
    let level = std::env::var("EVOMSA_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {:#}", e);
        let exit_code = if e.downcast_ref::<ParseError>().is_some() {
            4
        } else if e.downcast_ref::<WriteError>().is_some() || e.downcast_ref::<std::io::Error>().is_some() {
            3
        } else {
            1
        };
        process::exit(exit_code);
    }
}
