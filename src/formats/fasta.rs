//! FASTA parser and writer.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```
//!
//! The whole header line (trimmed, without `>`) becomes the sequence name.
//! Lines before the first header, blank lines and `#` comment lines are
//! skipped.

use std::io::Write;

use thiserror::Error;

use super::{MsaWriter, WriteError, WriteResult};
use crate::model::{Msa, Sequence};
use crate::residue::{clean_residues, is_gap, normalize_name};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("No sequences found")]
    NoSequences,

    #[error("Empty sequence name at line {0}")]
    EmptyName(usize),
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

fn is_comment(line: &str) -> bool {
    line.starts_with('#')
}

/// Parses FASTA content from a string.
pub fn parse_fasta_str(content: &str) -> FastaResult<Msa> {
    let mut msa = Msa::new();
    let mut current_name: Option<&str> = None;
    let mut current_seq: Vec<u8> = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || is_comment(line) {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if let Some(name) = current_name.take() {
                msa.add_sequence(Sequence::from_bytes(name, std::mem::take(&mut current_seq)));
            }
            let name = header.trim();
            if name.is_empty() {
                return Err(FastaError::EmptyName(index + 1));
            }
            current_name = Some(name);
        } else if current_name.is_some() {
            current_seq.extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
        }
    }

    if let Some(name) = current_name {
        msa.add_sequence(Sequence::from_bytes(name, current_seq));
    }

    if msa.is_empty() {
        return Err(FastaError::NoSequences);
    }
    Ok(msa)
}

/// FASTA output settings.
#[derive(Debug, Clone)]
pub struct FastaWriter {
    /// Residues per line.
    pub line_width: usize,
    /// Names are padded/truncated to this length; 0 leaves them untouched.
    pub max_name_length: usize,
    /// Drop gap characters (the output is then in general unaligned).
    pub remove_gap_chars: bool,
    /// Write cleaned residues.
    pub clean: bool,
    /// Fail instead of truncating names longer than `max_name_length`.
    pub fail_if_name_too_long: bool,
}

impl Default for FastaWriter {
    fn default() -> Self {
        Self {
            line_width: 60,
            max_name_length: 0,
            remove_gap_chars: false,
            clean: false,
            fail_if_name_too_long: false,
        }
    }
}

impl MsaWriter for FastaWriter {
    fn write_to(&self, msa: &Msa, out: &mut dyn Write) -> WriteResult<()> {
        let width = self.line_width.max(1);
        for seq in msa {
            let name = if self.max_name_length > 0 {
                normalize_name(&seq.name, self.max_name_length, self.fail_if_name_too_long)
                    .ok_or_else(|| WriteError::NameTooLong {
                        name: seq.name.clone(),
                        max: self.max_name_length,
                    })?
            } else {
                seq.name.clone()
            };
            write!(out, ">{}", name)?;

            let kept: Vec<u8> = seq
                .as_bytes()
                .iter()
                .copied()
                .filter(|&b| !(self.remove_gap_chars && is_gap(b)))
                .collect();
            let residues = if self.clean {
                clean_residues(&String::from_utf8_lossy(&kept)).into_bytes()
            } else {
                kept
            };

            out.write_all(b"\n")?;
            for line in residues.chunks(width) {
                out.write_all(line)?;
                out.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(writer: &FastaWriter, msa: &Msa) -> String {
        let mut out = Vec::new();
        writer.write_to(msa, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_simple_fasta() {
        let content = ">seq1\nACGT\n>seq2\nTGCA\n";
        let msa = parse_fasta_str(content).unwrap();

        assert_eq!(msa.sequence_count(), 2);
        assert_eq!(msa.get(0).unwrap().name, "seq1");
        assert_eq!(msa.get(0).unwrap().as_str(), "ACGT");
        assert_eq!(msa.get(1).unwrap().name, "seq2");
        assert_eq!(msa.get(1).unwrap().as_str(), "TGCA");
    }

    #[test]
    fn test_parse_multiline_sequence() {
        let content = ">seq1\nACGT\nTG CA\nAAAA\n";
        let msa = parse_fasta_str(content).unwrap();

        assert_eq!(msa.sequence_count(), 1);
        assert_eq!(msa.get(0).unwrap().as_str(), "ACGTTGCAAAAA");
    }

    #[test]
    fn test_parse_keeps_description() {
        let content = ">seq1 This is a description  \nACGT\n";
        let msa = parse_fasta_str(content).unwrap();

        assert_eq!(msa.get(0).unwrap().name, "seq1 This is a description");
    }

    #[test]
    fn test_parse_skips_preamble_comments_and_blank_lines() {
        let content = "garbage\n# comment\n>seq1\nACGT\n\n# note\n>seq2\n\nTG-A\n";
        let msa = parse_fasta_str(content).unwrap();

        assert_eq!(msa.sequence_count(), 2);
        assert_eq!(msa.get(0).unwrap().as_str(), "ACGT");
        assert_eq!(msa.get(1).unwrap().as_str(), "TG-A");
        assert!(msa.is_aligned());
    }

    #[test]
    fn test_no_sequences() {
        assert!(matches!(parse_fasta_str(""), Err(FastaError::NoSequences)));
        assert!(matches!(parse_fasta_str("ACGT\n"), Err(FastaError::NoSequences)));
    }

    #[test]
    fn test_empty_name() {
        let result = parse_fasta_str(">seq1\nAC\n>  \nGT\n");
        assert!(matches!(result, Err(FastaError::EmptyName(3))));
    }

    #[test]
    fn test_uppercase_preservation() {
        let msa = parse_fasta_str(">seq1\nacgt\n").unwrap();
        assert_eq!(msa.get(0).unwrap().as_str(), "acgt");
    }

    #[test]
    fn test_write_wraps_lines() {
        let mut msa = Msa::new();
        msa.add("seq1", "ACGTACGTAC");
        msa.add("seq2", "");
        let writer = FastaWriter {
            line_width: 4,
            ..FastaWriter::default()
        };
        assert_eq!(render(&writer, &msa), ">seq1\nACGT\nACGT\nAC\n>seq2\n");
    }

    #[test]
    fn test_write_removes_gaps_and_cleans() {
        let mut msa = Msa::new();
        msa.add("seq1", "a-c.Bu*7x");
        let writer = FastaWriter {
            remove_gap_chars: true,
            clean: true,
            ..FastaWriter::default()
        };
        assert_eq!(render(&writer, &msa), ">seq1\nACXXX\n");

        let writer = FastaWriter {
            clean: true,
            ..FastaWriter::default()
        };
        assert_eq!(render(&writer, &msa), ">seq1\nA-C-XXX\n");
    }

    #[test]
    fn test_write_keeps_non_ascii_bytes() {
        let mut msa = Msa::new();
        msa.add_sequence(Sequence::new("s", "Aé-C"));
        assert_eq!(render(&FastaWriter::default(), &msa), ">s\nAé-C\n");
        let writer = FastaWriter {
            clean: true,
            ..FastaWriter::default()
        };
        assert_eq!(render(&writer, &msa), ">s\nA--C\n");
    }

    #[test]
    fn test_write_name_length() {
        let mut msa = Msa::new();
        msa.add("a_long_name", "AC");
        let writer = FastaWriter {
            max_name_length: 4,
            ..FastaWriter::default()
        };
        assert_eq!(render(&writer, &msa), ">a_lo\nAC\n");

        let strict = FastaWriter {
            max_name_length: 4,
            fail_if_name_too_long: true,
            ..FastaWriter::default()
        };
        let mut out = Vec::new();
        assert!(matches!(
            strict.write_to(&msa, &mut out),
            Err(WriteError::NameTooLong { max: 4, .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let content = ">s1 first\nAC-GT\n>s2\nAC*GT\n";
        let msa = parse_fasta_str(content).unwrap();
        let written = render(&FastaWriter::default(), &msa);
        assert_eq!(written, content);
    }
}
