//! `extract`: domain sequence extraction from hmmscan per-domain output.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use super::{with_suffix, RunLog};
use crate::domains::extract::{extract_domains, DomainNumbering, Extraction, ExtractionSettings};
use crate::domains::hmmscan::parse_hmmscan_file;
use crate::formats::fasta::FastaWriter;
use crate::formats::{check_writable, parse_file_with_options, InputFormat, MsaWriter};
use crate::model::Msa;

const LOG_SUFFIX: &str = "_domain_seq_extr.log";
const PASSING_SUFFIX: &str = "_with_passing_domains.fasta";
const FAILING_SUFFIX: &str = "_with_no_passing_domains.fasta";
const SINGLES_SUFFIX: &str = "_singles.fasta";
const ISOLATED_SUFFIX: &str = "_isolated.fasta";

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NumberingArg {
    /// `~number-total`
    Tilde,
    /// number appended
    Digit,
    /// a, b, c, ...
    Letter,
}

impl From<NumberingArg> for DomainNumbering {
    fn from(arg: NumberingArg) -> Self {
        match arg {
            NumberingArg::Tilde => DomainNumbering::Tilde,
            NumberingArg::Digit => DomainNumbering::Digit,
            NumberingArg::Letter => DomainNumbering::Letter,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Model name of the domain to extract
    pub domain: String,

    /// hmmscan --domtblout output
    pub hmmscan: PathBuf,

    /// FASTA file with the full-length proteins
    pub proteins: PathBuf,

    /// Output file; a trailing .fasta or .fsa is replaced
    pub output: PathBuf,

    /// Maximal independent E-value (negative: no limit)
    #[arg(short = 'e', long = "e-value", allow_negative_numbers = true)]
    pub e_value: Option<f64>,

    /// Minimal envelope length (0: no limit)
    #[arg(short = 'l', long)]
    pub length: Option<usize>,

    /// Also sort domains into singles, close pairs and isolated copies, pairs
    /// being at most this far apart
    #[arg(long, allow_negative_numbers = true, value_parser = clap::value_parser!(i64).range(-100..=100))]
    pub min_linker: Option<i64>,

    /// Add `_from-to` to extracted names
    #[arg(long)]
    pub add_position: bool,

    /// Drop the last two characters of the protein name
    #[arg(long)]
    pub trim_name: bool,

    /// Number the copies of a domain found more than once on one protein
    #[arg(long)]
    pub add_domain_number: bool,

    /// Style of the copy numbers
    #[arg(long, value_enum, default_value = "tilde")]
    pub numbering: NumberingArg,

    /// Add the `[species]` of the protein name to extracted names
    #[arg(long)]
    pub add_species: bool,
}

impl ExtractArgs {
    fn settings(&self) -> ExtractionSettings {
        ExtractionSettings {
            domain_id: self.domain.clone(),
            e_value_threshold: self.e_value.filter(|e| *e >= 0.0),
            length_threshold: self.length.filter(|l| *l > 0),
            min_linker: self.min_linker,
            add_position: self.add_position,
            trim_name: self.trim_name,
            numbering: self.add_domain_number.then(|| self.numbering.into()),
            add_species: self.add_species,
        }
    }
}

/// Output prefix: the output path without a `.fasta` or `.fsa` extension.
fn output_base(output: &Path) -> PathBuf {
    let text = output.to_string_lossy();
    let base = text
        .strip_suffix(".fasta")
        .or_else(|| text.strip_suffix(".fsa"))
        .unwrap_or(text.as_ref());
    PathBuf::from(base)
}

struct Outputs {
    domains: PathBuf,
    passed: PathBuf,
    failed: PathBuf,
    singles: PathBuf,
    close_pairs: PathBuf,
    isolated: PathBuf,
    log: PathBuf,
}

impl Outputs {
    fn new(output: &Path, min_linker: Option<i64>) -> Self {
        let base = output_base(output);
        Self {
            domains: with_suffix(&base, ".fasta"),
            passed: with_suffix(&base, PASSING_SUFFIX),
            failed: with_suffix(&base, FAILING_SUFFIX),
            singles: with_suffix(&base, SINGLES_SUFFIX),
            close_pairs: with_suffix(&base, &format!("_pairs_{}.fasta", min_linker.unwrap_or(0))),
            isolated: with_suffix(&base, ISOLATED_SUFFIX),
            log: with_suffix(&base, LOG_SUFFIX),
        }
    }

    fn check(&self, with_classes: bool) -> Result<()> {
        check_writable(&self.domains)?;
        check_writable(&self.passed)?;
        check_writable(&self.failed)?;
        if with_classes {
            check_writable(&self.singles)?;
            check_writable(&self.close_pairs)?;
            check_writable(&self.isolated)?;
        }
        Ok(())
    }
}

fn write(msa: &Msa, path: &Path) -> Result<()> {
    let writer = FastaWriter {
        clean: true,
        ..FastaWriter::default()
    };
    writer
        .write_file(msa, path)
        .with_context(|| format!("could not write to \"{}\"", path.display()))
}

fn log_result(result: &Extraction, log: &mut RunLog) {
    for failure in &result.failures {
        log.quiet(failure.clone());
    }
    for protein in &result.lacking {
        log.quiet(format!("{}: lacks the domain", protein));
    }
    log.blank();
    log.line(format!("Max domain copy number per protein : {}", result.max_copy_number));
    if result.max_copy_number > 1 {
        log.line(format!("First protein with this copy number: {}", result.max_copy_protein));
    }
    log.blank();
    log.line(format!("passing domains              : {}", result.passing_domains));
    log.line(format!("failing domains              : {}", result.failing_domains));
    log.line(format!("proteins with passing domains: {}", result.passed.sequence_count()));
    log.line(format!("proteins with failing domains: {}", result.failed.sequence_count()));
    log.line(format!("proteins lacking the domain  : {}", result.lacking.len()));
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let settings = args.settings();
    let outputs = Outputs::new(&args.output, settings.min_linker);
    outputs.check(settings.min_linker.is_some())?;

    let mut log = RunLog::new();
    log.line(format!("Domain            : {}", settings.domain_id));
    log.line(format!("hmmscan output    : {}", args.hmmscan.display()));
    log.line(format!("Proteins          : {}", args.proteins.display()));
    log.line(format!("Output            : {}", outputs.domains.display()));
    if let Some(e) = settings.e_value_threshold {
        log.line(format!("iE-value threshold: {}", e));
    }
    if let Some(l) = settings.length_threshold {
        log.line(format!("Length threshold  : {}", l));
    }
    if let Some(min_linker) = settings.min_linker {
        log.line(format!("Min linker        : {}", min_linker));
    }
    log.blank();

    let proteins = parse_file_with_options(&args.proteins, Some(InputFormat::Fasta))
        .with_context(|| format!("could not find fasta sequences in {}", args.proteins.display()))?;
    let hits = parse_hmmscan_file(&args.hmmscan)
        .with_context(|| format!("could not parse {}", args.hmmscan.display()))?;
    let result = extract_domains(&hits, &proteins, &settings)?;
    log_result(&result, &mut log);

    write(&result.domains, &outputs.domains)?;
    write(&result.passed, &outputs.passed)?;
    write(&result.failed, &outputs.failed)?;
    if let Some(classes) = &result.linker_classes {
        write(&classes.singles, &outputs.singles)?;
        write(&classes.close_pairs, &outputs.close_pairs)?;
        write(&classes.isolated, &outputs.isolated)?;
    }
    log.line(format!("wrote {}", outputs.domains.display()));
    log.save(&outputs.log)
}
