//! hmmscan `--domtblout` parser.
//!
//! One hit per line, 23 whitespace-delimited columns:
//!
//! ```text
//! target  acc  tlen  query  acc  qlen  E-value  score  bias  #  of  c-Evalue  i-Evalue
//! score  bias  hmm_from  hmm_to  ali_from  ali_to  env_from  env_to  acc  description
//! ```
//!
//! The description runs to the end of the line and may contain blanks.

use std::path::Path;
use std::str::FromStr;

use super::{is_ignorable, DomainError, DomainResult};

/// Minimum number of columns before the free-text description.
const MIN_COLUMNS: usize = 22;

/// One per-domain hit of a profile (`model`) on a protein (`query`).
#[derive(Debug, Clone, PartialEq)]
pub struct HmmscanHit {
    pub model: String,
    pub tlen: usize,
    pub query: String,
    pub qlen: usize,
    pub fs_e_value: f64,
    pub fs_score: f64,
    /// Rank of this domain among the hits of `model` on `query`.
    pub number: usize,
    pub out_of: usize,
    pub c_e_value: f64,
    pub i_e_value: f64,
    pub score: f64,
    pub hmm_from: usize,
    pub hmm_to: usize,
    pub ali_from: usize,
    pub ali_to: usize,
    pub env_from: usize,
    pub env_to: usize,
    pub description: String,
}

impl HmmscanHit {
    /// Envelope length, both ends included.
    pub fn env_length(&self) -> usize {
        self.env_to - self.env_from + 1
    }
}

fn field<T: FromStr>(fields: &[&str], column: usize, line: usize) -> DomainResult<T> {
    fields[column - 1].parse().map_err(|_| {
        DomainError::format(
            line,
            format!("column {} \"{}\" is not a valid number", column, fields[column - 1]),
        )
    })
}

/// Parses a single, non-ignorable table line.
pub fn parse_line(text: &str, line: usize) -> DomainResult<HmmscanHit> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < MIN_COLUMNS {
        return Err(DomainError::format(line, format!("illegal format: {}", text.trim())));
    }
    let hit = HmmscanHit {
        model: fields[0].to_string(),
        tlen: field(&fields, 3, line)?,
        query: fields[3].to_string(),
        qlen: field(&fields, 6, line)?,
        fs_e_value: field(&fields, 7, line)?,
        fs_score: field(&fields, 8, line)?,
        number: field(&fields, 10, line)?,
        out_of: field(&fields, 11, line)?,
        c_e_value: field(&fields, 12, line)?,
        i_e_value: field(&fields, 13, line)?,
        score: field(&fields, 14, line)?,
        hmm_from: field(&fields, 16, line)?,
        hmm_to: field(&fields, 17, line)?,
        ali_from: field(&fields, 18, line)?,
        ali_to: field(&fields, 19, line)?,
        env_from: field(&fields, 20, line)?,
        env_to: field(&fields, 21, line)?,
        description: fields[MIN_COLUMNS..].join(" "),
    };
    if hit.number > hit.out_of
        || hit.hmm_from > hit.hmm_to
        || hit.ali_from > hit.ali_to
        || hit.env_from > hit.env_to
    {
        return Err(DomainError::format(line, format!("illogical format: {}", text.trim())));
    }
    Ok(hit)
}

/// Parses a whole table, skipping ignorable lines.
pub fn parse_hmmscan_str(content: &str) -> DomainResult<Vec<HmmscanHit>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, text)| !is_ignorable(text))
        .map(|(index, text)| parse_line(text, index + 1))
        .collect()
}

pub fn parse_hmmscan_file<P: AsRef<Path>>(path: P) -> DomainResult<Vec<HmmscanHit>> {
    let content = std::fs::read_to_string(path)?;
    parse_hmmscan_str(&content)
}
