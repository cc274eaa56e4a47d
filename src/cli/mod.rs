//! Command line front-ends.

pub mod d2f;
pub mod extract;
pub mod process;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "evomsa",
    version,
    about = "Multiple sequence alignment processing and domain extraction",
    long_about = "evomsa filters, trims and converts multiple sequence alignments, \
                  turns domain tables into forester domain-structure lines, and extracts \
                  domain sequences from proteins annotated by hmmscan."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter, trim and convert an alignment
    Process(process::ProcessArgs),

    /// Convert a domain table into forester domain structures
    D2f(d2f::D2fArgs),

    /// Extract domain sequences using hmmscan per-domain output
    Extract(extract::ExtractArgs),
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Process(args) => process::run(args),
        Commands::D2f(args) => d2f::run(args),
        Commands::Extract(args) => extract::run(args),
    }
}

/// Plain text record of a run, echoed to the tracing log line by line and
/// saved next to the output.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text);
        self.lines.push(text);
    }

    /// Adds to the saved log only.
    pub fn quiet(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Appends the log to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("could not write log to {}", path.display()))?;
        for line in &self.lines {
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

/// Reads sequence names, one or more per line separated by `;`.
pub fn read_names(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read names from {}", path.display()))?;
    let names: Vec<String> = content
        .lines()
        .flat_map(|line| line.split(';'))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        anyhow::bail!("file \"{}\" appears empty", path.display());
    }
    Ok(names)
}

/// `path` with `suffix` appended to its file name.
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    name.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.txt");
        std::fs::write(&path, "  seq 1 \n\nseq2;seq3 ;\n   \n").unwrap();
        assert_eq!(read_names(&path).unwrap(), ["seq 1", "seq2", "seq3"]);

        std::fs::write(&path, "\n ; \n").unwrap();
        assert!(read_names(&path).is_err());
    }

    #[test]
    fn test_run_log_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let mut log = RunLog::new();
        log.line("first");
        log.quiet("second");
        log.save(&path).unwrap();
        log.save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\nfirst\nsecond\n");
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix(Path::new("dir/out.fasta"), "_1"), Path::new("dir/out.fasta_1"));
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["evomsa", "d2f", "table.txt", "seqs.fasta", "out.txt", "-e", "0.01"]).unwrap();
        assert!(matches!(cli.command, Commands::D2f(_)));
        assert!(Cli::try_parse_from(["evomsa", "unknown"]).is_err());
    }
}
