//! Protein domain annotation.
//!
//! - `hmmscan`: per-domain hit table parser
//! - `structure`: domain architecture of one protein, domain table conversion
//! - `extract`: cutting domain sequences out of full-length proteins

pub mod extract;
pub mod hmmscan;
pub mod structure;

use thiserror::Error;

use crate::model::MsaError;

/// Errors raised while reading domain tables or extracting domains.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Msa(#[from] MsaError),

    #[error("species not found in \"{0}\"")]
    MissingSpecies(String),

    #[error("impossible domain coordinates {from}-{to} on \"{query}\"")]
    Coordinates { query: String, from: usize, to: usize },

    #[error("impossible domain number {number} out of {out_of} on \"{query}\"")]
    Numbering {
        query: String,
        number: usize,
        out_of: usize,
    },

    #[error("too many copies ({0}) to number domains with letters")]
    TooManyForLetters(usize),

    #[error("no domain sequences were extracted")]
    NothingExtracted,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        DomainError::Format {
            line,
            message: message.into(),
        }
    }
}

/// A domain table line to skip: no `[A-Za-z0-9-]` character, or a `#`
/// comment (after optional whitespace).
pub fn is_ignorable(line: &str) -> bool {
    !line.chars().any(|c| c.is_ascii_alphanumeric() || c == '-') || line.trim_start().starts_with('#')
}
