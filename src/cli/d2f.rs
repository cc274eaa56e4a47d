//! `d2f`: domain table to forester domain-structure lines.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::domains::structure::{domains_to_structures, to_forester_lines};
use crate::formats::{check_writable, create_new_file, parse_file_with_options, InputFormat};

#[derive(Args, Debug)]
pub struct D2fArgs {
    /// Table of `protein domain from to [E-value]` lines
    pub table: PathBuf,

    /// FASTA file with the full-length proteins
    pub proteins: PathBuf,

    /// Output file (must not exist)
    pub output: PathBuf,

    /// Keep only domains with an E-value at most this
    #[arg(short = 'e', long = "e-value", allow_negative_numbers = true, value_parser = parse_e_value)]
    pub e_value: Option<f64>,

    /// Keep only the best of several domains sharing one location
    #[arg(short = 'o', long)]
    pub overwrite: bool,
}

fn parse_e_value(text: &str) -> Result<f64, String> {
    let value: f64 = text.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if value < 0.0 {
        return Err("attempt to use a negative E-value threshold".to_string());
    }
    Ok(value)
}

pub fn run(args: D2fArgs) -> Result<()> {
    check_writable(&args.output)?;
    let proteins = parse_file_with_options(&args.proteins, Some(InputFormat::Fasta))
        .with_context(|| format!("could not read proteins from {}", args.proteins.display()))?;
    let table = std::fs::read_to_string(&args.table)
        .with_context(|| format!("could not read {}", args.table.display()))?;

    let structures = domains_to_structures(&table, &proteins, args.e_value, args.overwrite)
        .with_context(|| format!("could not convert {}", args.table.display()))?;

    let mut out = create_new_file(&args.output)?;
    out.write_all(to_forester_lines(&structures).as_bytes())?;
    info!("wrote {} domain structures to {}", structures.len(), args.output.display());
    Ok(())
}
