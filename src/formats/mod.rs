//! Alignment file parsers and writers.
//!
//! Input formats, detected automatically unless forced:
//! - FASTA (.fasta, .fa, .fna, .faa, .fas)
//! - NCBI TSeq XML (.xml)
//! - general columnar alignments (Clustal, MUSCLE, PROBCONS, ...)
//!
//! Output formats: FASTA, PHYLIP sequential, NEXUS.
//!
//! Format detection priority:
//! 1. Explicit format specification
//! 2. File extension
//! 3. Content-based detection
//! 4. The general columnar parser

pub mod fasta;
pub mod general;
pub mod nexus;
pub mod phylip;
pub mod tseq;

use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::model::Msa;
use crate::residue::{normalize_name, underscore_name};

/// Input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Fasta,
    General,
    TSeq,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Fasta => write!(f, "FASTA"),
            InputFormat::General => write!(f, "general columnar"),
            InputFormat::TSeq => write!(f, "NCBI TSeq XML"),
        }
    }
}

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Fasta,
    Phylip,
    Nexus,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Fasta => write!(f, "FASTA"),
            OutputFormat::Phylip => write!(f, "PHYLIP sequential"),
            OutputFormat::Nexus => write!(f, "NEXUS"),
        }
    }
}

/// Errors that can occur during file parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty file")]
    EmptyFile,

    #[error("FASTA error: {0}")]
    FastaError(#[from] fasta::FastaError),

    #[error("Alignment format error: {0}")]
    GeneralError(#[from] general::GeneralError),

    #[error("TSeq XML error: {0}")]
    TSeqError(#[from] tseq::TSeqError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors that can occur while writing an alignment.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("file [{}] already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("file [{}] is an existing directory", .0.display())]
    IsDirectory(PathBuf),

    #[error("sequence name \"{name}\" is too long (>{max})")]
    NameTooLong { name: String, max: usize },

    #[error("attempt to write unaligned msa in {0} format")]
    Unaligned(&'static str),

    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// Serializes an alignment in one output format.
pub trait MsaWriter {
    /// Writes `msa` to `out`.
    fn write_to(&self, msa: &Msa, out: &mut dyn Write) -> WriteResult<()>;

    /// Writes `msa` to a new file at `path`; existing files are never
    /// overwritten. The output is rendered in memory first, so a failed
    /// write creates no file.
    fn write_file(&self, msa: &Msa, path: &Path) -> WriteResult<()> {
        check_writable(path)?;
        let mut rendered = Vec::new();
        self.write_to(msa, &mut rendered)?;
        let mut file = create_new_file(path)?;
        file.write_all(&rendered)?;
        file.flush()?;
        Ok(())
    }
}

/// Fails if `path` is an existing directory or file.
pub fn check_writable(path: &Path) -> WriteResult<()> {
    if path.is_dir() {
        return Err(WriteError::IsDirectory(path.to_path_buf()));
    }
    if path.exists() {
        return Err(WriteError::AlreadyExists(path.to_path_buf()));
    }
    Ok(())
}

/// Creates `path`, refusing to touch anything already there.
pub fn create_new_file(path: &Path) -> WriteResult<File> {
    check_writable(path)?;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => WriteError::AlreadyExists(path.to_path_buf()),
            _ => WriteError::Io(e),
        })
}

/// Name for fixed-width formats: blanks become `_`, then the name is padded
/// or truncated to `width`, or rejected when `strict`.
pub(crate) fn fixed_width_name(name: &str, width: usize, strict: bool) -> WriteResult<String> {
    let name = underscore_name(name);
    normalize_name(&name, width, strict).ok_or(WriteError::NameTooLong { name, max: width })
}

/// Detects format from file extension.
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> Option<InputFormat> {
    let ext = path.as_ref().extension().and_then(OsStr::to_str)?;
    match ext.to_lowercase().as_str() {
        "fa" | "fas" | "fasta" | "fna" | "faa" => Some(InputFormat::Fasta),
        "xml" => Some(InputFormat::TSeq),
        _ => None,
    }
}

/// Detects the file format from the first non-blank, non-comment line.
pub fn detect_format_from_content(content: &str) -> Option<InputFormat> {
    let first = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))?;

    if first.starts_with('>') {
        return Some(InputFormat::Fasta);
    }
    if first.starts_with("<?xml") || first.starts_with("<TSeqSet") || first.starts_with("<TSeq>") {
        return Some(InputFormat::TSeq);
    }
    None
}

/// Parses content with a specific format.
pub fn parse_content(content: &str, format: InputFormat) -> ParseResult<Msa> {
    match format {
        InputFormat::Fasta => Ok(fasta::parse_fasta_str(content)?),
        InputFormat::General => Ok(general::parse_general_str(content)?),
        InputFormat::TSeq => Ok(tseq::parse_tseq_str(content)?),
    }
}

fn read_content(path: &Path) -> ParseResult<String> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    if bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }
    // Invalid UTF-8 is replaced rather than rejected.
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parses an alignment file with optional format specification.
///
/// Detection priority:
/// 1. Explicit format (if provided)
/// 2. File extension, falling through when that parser fails
/// 3. Content-based detection
/// 4. The general columnar parser
pub fn parse_file_with_options<P: AsRef<Path>>(
    path: P,
    forced_format: Option<InputFormat>,
) -> ParseResult<Msa> {
    let path = path.as_ref();
    let content = read_content(path)?;

    if let Some(format) = forced_format {
        return parse_content(&content, format);
    }

    if let Some(format) = detect_format_from_extension(path) {
        match parse_content(&content, format) {
            Ok(msa) => return Ok(msa),
            Err(e) => debug!("{} parser failed on {}: {}", format, path.display(), e),
        }
    }

    let format = detect_format_from_content(&content).unwrap_or(InputFormat::General);
    debug!("parsing {} as {}", path.display(), format);
    parse_content(&content, format)
}

/// Parses an alignment file, automatically detecting the format.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<Msa> {
    parse_file_with_options(path, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::fasta::FastaWriter;
    use crate::formats::phylip::PhylipWriter;

    #[test]
    fn test_detect_fasta() {
        assert_eq!(detect_format_from_content(">seq1\nACGT\n"), Some(InputFormat::Fasta));
        assert_eq!(
            detect_format_from_content("\n\n  \n# header\n>seq1\nACGT\n"),
            Some(InputFormat::Fasta)
        );
    }

    #[test]
    fn test_detect_tseq() {
        assert_eq!(detect_format_from_content("<?xml version=\"1.0\"?>\n"), Some(InputFormat::TSeq));
        assert_eq!(detect_format_from_content("<TSeqSet>\n"), Some(InputFormat::TSeq));
        assert_eq!(detect_format_from_content("  <TSeq>\n"), Some(InputFormat::TSeq));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format_from_content("CLUSTAL W\n\nseq1 ACGT\n"), None);
        assert_eq!(detect_format_from_content(""), None);
    }

    #[test]
    fn test_detect_from_extension() {
        assert_eq!(detect_format_from_extension("test.fa"), Some(InputFormat::Fasta));
        assert_eq!(detect_format_from_extension("test.fas"), Some(InputFormat::Fasta));
        assert_eq!(detect_format_from_extension("test.FASTA"), Some(InputFormat::Fasta));
        assert_eq!(detect_format_from_extension("test.fna"), Some(InputFormat::Fasta));
        assert_eq!(detect_format_from_extension("test.faa"), Some(InputFormat::Fasta));
        assert_eq!(detect_format_from_extension("test.xml"), Some(InputFormat::TSeq));
        assert_eq!(detect_format_from_extension("test.aln"), None);
        assert_eq!(detect_format_from_extension("test"), None);
    }

    #[test]
    fn test_parse_file_detection() {
        let dir = tempfile::tempdir().unwrap();

        let aln = dir.path().join("input.aln");
        std::fs::write(&aln, "CLUSTAL W (1.83)\n\nseq1 AC-T\nseq2 ACGT\n").unwrap();
        let msa = parse_file(&aln).unwrap();
        assert_eq!(msa.sequence_count(), 2);
        assert_eq!(msa.get(0).unwrap().as_str(), "AC-T");

        // Extension says FASTA, content is columnar.
        let misnamed = dir.path().join("input.fa");
        std::fs::write(&misnamed, "seq1 AC-T\nseq2 ACGT\n").unwrap();
        assert_eq!(parse_file(&misnamed).unwrap().sequence_count(), 2);

        let forced = parse_file_with_options(&misnamed, Some(InputFormat::Fasta));
        assert!(matches!(forced, Err(ParseError::FastaError(_))));
    }

    #[test]
    fn test_empty_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.fasta");
        std::fs::write(&empty, "").unwrap();
        assert!(matches!(parse_file(&empty), Err(ParseError::EmptyFile)));
        assert!(matches!(
            parse_file(dir.path().join("missing.fasta")),
            Err(ParseError::IoError(_))
        ));
    }

    #[test]
    fn test_fasta_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut msa = Msa::new();
        msa.add("seq 1", "ACGT-ACGT");
        msa.add("seq 2", "ACGTTACG-");

        let path = dir.path().join("out.fasta");
        FastaWriter::default().write_file(&msa, &path).unwrap();
        let back = parse_file(&path).unwrap();
        assert_eq!(back.sequence_count(), 2);
        assert_eq!(back.get(1).unwrap().name, "seq 2");
        assert_eq!(back.get(1).unwrap().as_str(), "ACGTTACG-");
    }

    #[test]
    fn test_writer_refuses_existing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut msa = Msa::new();
        msa.add("s", "A");

        let path = dir.path().join("taken.fasta");
        std::fs::write(&path, "keep me").unwrap();
        assert!(matches!(
            FastaWriter::default().write_file(&msa, &path),
            Err(WriteError::AlreadyExists(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

        assert!(matches!(
            FastaWriter::default().write_file(&msa, dir.path()),
            Err(WriteError::IsDirectory(_))
        ));
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut msa = Msa::new();
        msa.add("a", "ACGT");
        msa.add("b", "AC");

        let path = dir.path().join("out.phy");
        let writer = PhylipWriter::default();
        assert!(matches!(writer.write_file(&msa, &path), Err(WriteError::Unaligned(_))));
        assert!(!path.exists());

        msa.get_mut(1).unwrap().append("GT");
        writer.write_file(&msa, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "2 4\na          ACGT\nb          ACGT\n");
    }
}
