//! `process`: alignment filtering, trimming and format conversion.
//!
//! Steps run in a fixed order: name lists, column trimming, gap column
//! removal, sequence filters, name matching, then either splitting or
//! redundancy removal and output.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::warn;

use super::{read_names, with_suffix, RunLog};
use crate::formats::fasta::FastaWriter;
use crate::formats::nexus::NexusWriter;
use crate::formats::phylip::PhylipWriter;
use crate::formats::{check_writable, parse_file_with_options, InputFormat, MsaWriter, OutputFormat};
use crate::model::Msa;

const LOG_SUFFIX: &str = "_msa_pro.log";

/// Input format for the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InputFormatArg {
    /// Auto-detect from extension and content
    Auto,
    Fasta,
    /// Clustal, MUSCLE, PROBCONS and other columnar alignments
    General,
    /// NCBI TSeq XML
    Tseq,
}

impl From<InputFormatArg> for Option<InputFormat> {
    fn from(arg: InputFormatArg) -> Self {
        match arg {
            InputFormatArg::Auto => None,
            InputFormatArg::Fasta => Some(InputFormat::Fasta),
            InputFormatArg::General => Some(InputFormat::General),
            InputFormatArg::Tseq => Some(InputFormat::TSeq),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Fasta,
    /// PHYLIP sequential
    Phylip,
    Nexus,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Fasta => OutputFormat::Fasta,
            OutputFormatArg::Phylip => OutputFormat::Phylip,
            OutputFormatArg::Nexus => OutputFormat::Nexus,
        }
    }
}

/// 1-based inclusive column range, written `first-last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRange {
    pub first: usize,
    pub last: usize,
}

impl FromStr for ColumnRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (first, last) = s
            .split_once('-')
            .ok_or_else(|| format!("expected <first>-<last>, got \"{}\"", s))?;
        let parse = |value: &str| {
            value
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("\"{}\" is not a column number", value))
        };
        let range = ColumnRange {
            first: parse(first)?,
            last: parse(last)?,
        };
        if range.first < 1 || range.last < range.first {
            return Err(format!("illegal column range {}", s));
        }
        Ok(range)
    }
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Input alignment
    pub input: PathBuf,

    /// Output alignment (must not exist)
    pub output: PathBuf,

    /// Force an input format
    #[arg(long, value_enum, default_value = "auto")]
    pub input_format: InputFormatArg,

    #[arg(short = 'o', long, value_enum, default_value = "fasta")]
    pub output_format: OutputFormatArg,

    /// Maximal name length (default: 10 for PHYLIP and NEXUS, unlimited for FASTA)
    #[arg(short = 'n', long)]
    pub name_length: Option<usize>,

    /// Fail instead of truncating names longer than the maximal name length
    #[arg(long)]
    pub die_if_name_too_long: bool,

    /// FASTA line width
    #[arg(short = 'w', long, default_value_t = 60)]
    pub width: usize,

    /// Replace non-standard residues with X and gaps with -
    #[arg(short = 'c', long)]
    pub clean: bool,

    /// Remove redundant (identical) sequences
    #[arg(long)]
    pub rem_red: bool,

    /// Remove columns containing any gap
    #[arg(long)]
    pub rgc: bool,

    /// Remove columns made of gaps only
    #[arg(long)]
    pub rgoc: bool,

    /// Remove columns whose gap ratio exceeds this value
    #[arg(long, value_name = "RATIO")]
    pub rr: Option<f64>,

    /// Remove all gap characters from FASTA output (destroys the alignment)
    #[arg(long)]
    pub rg: bool,

    /// Remove the sequences listed in a file
    #[arg(short = 'r', long, value_name = "FILE", conflicts_with = "keep_listed")]
    pub remove_listed: Option<PathBuf>,

    /// Keep only the sequences listed in a file
    #[arg(short = 'k', long, value_name = "FILE")]
    pub keep_listed: Option<PathBuf>,

    /// Keep only sequences whose name contains this text (ignoring case)
    #[arg(long, value_name = "TEXT")]
    pub mk: Option<String>,

    /// Remove sequences whose name contains this text (ignoring case), then sort by name
    #[arg(long, value_name = "TEXT")]
    pub mr: Option<String>,

    /// Keep only columns first to last (1-based, inclusive)
    #[arg(short = 't', long, value_name = "FIRST-LAST")]
    pub trim: Option<ColumnRange>,

    /// Remove sequences whose gap ratio exceeds this value
    #[arg(long, value_name = "RATIO")]
    pub rsgr: Option<f64>,

    /// Remove sequences with fewer non-gap residues than this
    #[arg(long, value_name = "N")]
    pub rsl: Option<usize>,

    /// Split into this many alignments, written to <output>_1 .. <output>_n
    #[arg(long, value_name = "N")]
    pub split: Option<usize>,
}

impl ProcessArgs {
    fn output_format(&self) -> OutputFormat {
        self.output_format.into()
    }

    fn writer(&self) -> Box<dyn MsaWriter> {
        match self.output_format() {
            OutputFormat::Fasta => Box::new(FastaWriter {
                line_width: self.width,
                max_name_length: self.name_length.unwrap_or(0),
                remove_gap_chars: self.rg,
                clean: self.clean,
                fail_if_name_too_long: self.die_if_name_too_long,
            }),
            OutputFormat::Phylip => Box::new(PhylipWriter {
                max_name_length: self.name_length.unwrap_or(10),
                clean: self.clean,
                fail_if_name_too_long: self.die_if_name_too_long,
            }),
            OutputFormat::Nexus => Box::new(NexusWriter {
                max_name_length: self.name_length.unwrap_or(10),
                clean: self.clean,
                fail_if_name_too_long: self.die_if_name_too_long,
            }),
        }
    }

    fn log_settings(&self, log: &mut RunLog) {
        log.line(format!("Input alignment  : {}", self.input.display()));
        log.line(format!("Output alignment : {}", self.output.display()));
        if let Some(ratio) = self.rr {
            log.line(format!("Max col gap ratio: {}", ratio));
        } else if self.rgc {
            log.line("Remove gap columns");
        } else if self.rgoc {
            log.line("Remove gap only columns");
        }
        if self.clean {
            log.line("Clean up         : true");
        }
        log.line(format!("Output is        : {}", self.output_format()));
        if self.output_format() == OutputFormat::Fasta {
            log.line(format!("Width            : {}", self.width));
            if self.rg {
                log.line("Remove all gap characters (alignment is destroyed)");
            }
        }
        if let Some(length) = self.name_length {
            log.line(format!("Max name length  : {}", length));
        }
        if let Some(ratio) = self.rsgr {
            log.line(format!("Remove sequences for which the gap ratio > {}", ratio));
        }
        if let Some(length) = self.rsl {
            log.line(format!("Remove sequences with less than {} non-gap characters", length));
        }
        if let Some(path) = &self.remove_listed {
            log.line(format!("Remove sequences listed in: {}", path.display()));
        } else if let Some(path) = &self.keep_listed {
            log.line(format!("Keep only sequences listed in: {}", path.display()));
        }
        if let Some(range) = self.trim {
            log.line(format!("Keep only columns from: {} to {}", range.first, range.last));
        }
        if self.rem_red {
            log.line("Remove redundant sequences: true");
        }
        if let Some(parts) = self.split {
            log.line(format!("Split            : {}", parts));
        }
        log.blank();
    }
}

fn log_shape(msa: &Msa, which: &str, log: &mut RunLog) -> Result<()> {
    if msa.is_aligned() {
        log.line(format!("Length of {} alignment: {}", which, msa.length()?));
        log.line(format!("Gap-proportion of {} alignment: {}", which, msa.gap_proportion()?));
    } else if let Some(stats) = msa.length_stats() {
        log.line(format!("{} sequences are not aligned", which));
        log.line(format!("Shortest sequence: {}", stats.min));
        log.line(format!("Longest sequence : {}", stats.max));
        log.line(format!("Average length   : {:.1}", stats.mean));
    }
    Ok(())
}

fn log_removed(msa: &Msa, removed: &[String], log: &mut RunLog) {
    log.line(format!("Kept    {} sequences", msa.sequence_count()));
    log.line(format!("Removed {} sequences", removed.len()));
    for name in removed {
        log.quiet(format!("         {}", name));
    }
}

/// Applies every requested step to `msa`, in order, up to (not including)
/// splitting and redundancy removal.
fn filter(msa: &mut Msa, args: &ProcessArgs, log: &mut RunLog) -> Result<()> {
    if let Some(path) = &args.remove_listed {
        let names = read_names(path)?;
        let removed = msa.remove_by_names(&names)?;
        log.line(format!("Removed {} sequences", removed));
    } else if let Some(path) = &args.keep_listed {
        let names = read_names(path)?;
        let (kept, removed) = msa.retain_by_names(&names);
        log.line(format!("Kept    {} sequences", kept));
        log.line(format!("Removed {} sequences", removed));
    }

    if let Some(range) = args.trim {
        msa.trim(range.first - 1, range.last - 1)?;
    }
    if let Some(ratio) = args.rr {
        msa.remove_gap_columns_by_ratio(ratio)?;
    } else if args.rgc {
        msa.remove_gap_columns()?;
    } else if args.rgoc {
        msa.remove_gap_only_columns()?;
    }

    if let Some(ratio) = args.rsgr {
        let removed = msa.remove_sequences_by_gap_ratio(ratio)?;
        log_removed(msa, &removed, log);
    }
    if let Some(length) = args.rsl {
        let removed = msa.remove_sequences_by_non_gap_length(length)?;
        log_removed(msa, &removed, log);
    }

    if let Some(text) = &args.mk {
        let removed = msa.keep_matching(text);
        log_removed(msa, &removed, log);
    }
    if let Some(text) = &args.mr {
        let removed = msa.remove_matching(text);
        log_removed(msa, &removed, log);
        msa.sort_by_name();
    }
    Ok(())
}

/// `<out>_1` to `<out>_n`.
fn split_paths(output: &Path, parts: usize) -> Vec<PathBuf> {
    (1..=parts).map(|i| with_suffix(output, &format!("_{}", i))).collect()
}

fn write_split(msa: &Msa, parts: usize, args: &ProcessArgs, log: &mut RunLog) -> Result<()> {
    let writer = args.writer();
    let msas = msa.split(parts)?;
    for (part, path) in msas.iter().zip(split_paths(&args.output, parts)) {
        writer
            .write_file(part, &path)
            .with_context(|| format!("could not write {}", path.display()))?;
    }
    log.line(format!("wrote {} files", msas.len()));
    Ok(())
}

fn write_single(msa: &mut Msa, args: &ProcessArgs, log: &mut RunLog) -> Result<()> {
    if !args.rg {
        log_shape(msa, "processed", log)?;
    }
    if args.rem_red {
        let removed = msa.remove_redundant_sequences(true);
        if !removed.is_empty() {
            log.quiet(format!("the following {} sequences are identical:", msa.identical_pairs().len()));
            for pair in msa.identical_pairs() {
                log.quiet(pair.clone());
            }
            log.quiet(format!("ignoring the following {} redundant sequences:", removed.len()));
            for name in &removed {
                log.quiet(name.clone());
            }
            log.line(format!("will store {} non-redundant sequences", msa.sequence_count()));
        }
    }
    args.writer()
        .write_file(msa, &args.output)
        .with_context(|| format!("could not write {}", args.output.display()))?;
    log.line(format!("Number of sequences in output: {}", msa.sequence_count()));
    Ok(())
}

pub fn run(args: ProcessArgs) -> Result<()> {
    if args.rg && args.output_format() != OutputFormat::Fasta {
        anyhow::bail!("gap characters can only be removed from FASTA output");
    }
    match args.split {
        Some(parts) => {
            for path in split_paths(&args.output, parts) {
                check_writable(&path)?;
            }
        }
        None => check_writable(&args.output)?,
    }

    let mut log = RunLog::new();
    args.log_settings(&mut log);

    let mut msa = parse_file_with_options(&args.input, args.input_format.into())
        .with_context(|| format!("could not read {}", args.input.display()))?;
    log_shape(&msa, "original", &mut log)?;
    for name in msa.duplicate_names() {
        warn!("sequence name [{}] is not unique", name);
    }

    filter(&mut msa, &args, &mut log)?;

    match args.split {
        Some(parts) => write_split(&msa, parts, &args, &mut log)?,
        None => write_single(&mut msa, &args, &mut log)?,
    }
    log.save(&with_suffix(&args.output, LOG_SUFFIX))
}
