//! Data model for sequences and multiple sequence alignments.
//!
//! This module contains the data structures for representing:
//! - Sequences with their optional database metadata
//! - Taxonomy annotations
//! - The alignment container and its name lookups
//!
//! Column and sequence filtering, redundancy detection and overlap based
//! splitting live in the child modules and extend [`Msa`] directly.

mod columns;
mod overlap;
mod filters;

use std::borrow::Cow;
use std::fmt;

use regex::Regex;
use thiserror::Error;

use crate::residue::{is_gap, normalize_name};

pub use overlap::LengthStats;

/// Errors raised by sequence and alignment operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MsaError {
    #[error("position {pos} out of range for sequence of length {len}")]
    PositionOutOfRange { pos: usize, len: usize },

    #[error("residues {start}..{end} out of range for sequence of length {len}")]
    SliceOutOfRange { start: usize, end: usize, len: usize },

    #[error("attempt to access sequence {index} in alignment of {count} sequences")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("attempt to {0} of unaligned msa")]
    NotAligned(&'static str),

    #[error("\"{0}\" not found")]
    NotFound(String),

    #[error("\"{0}\" not unique")]
    NotUnique(String),
}

/// Result type for sequence and alignment operations.
pub type MsaResult<T> = Result<T, MsaError>;

/// Taxonomic annotation of a sequence.
///
/// Two taxonomies are equal iff name, id and id source all match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Taxonomy {
    pub name: String,
    pub id: String,
    pub id_source: String,
}

impl Taxonomy {
    /// Creates a taxonomy carrying only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a taxonomy with an identifier and the database it comes from.
    pub fn with_id(
        name: impl Into<String>,
        id: impl Into<String>,
        id_source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            id_source: id_source.into(),
        }
    }
}

/// A single sequence: a trimmed name, its residues (gaps included) and
/// optional database metadata.
///
/// Residues are stored as bytes; every position addresses one byte.
/// `Clone` is a deep copy, taxonomy included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub name: String,
    data: Vec<u8>,
    pub accession: String,
    pub accession_source: String,
    pub taxonomy: Option<Taxonomy>,
    pub symbol: String,
    pub secondary_accession: String,
    pub secondary_accession_source: String,
}

impl Sequence {
    /// Creates a new sequence. The name is trimmed.
    pub fn new(name: impl AsRef<str>, residues: impl Into<String>) -> Self {
        Self::from_bytes(name, residues.into().into_bytes())
    }

    /// Creates a new sequence from raw residue bytes.
    pub fn from_bytes(name: impl AsRef<str>, data: Vec<u8>) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            data,
            accession: String::new(),
            accession_source: String::new(),
            taxonomy: None,
            symbol: String::new(),
            secondary_accession: String::new(),
            secondary_accession_source: String::new(),
        }
    }

    pub fn with_accession(mut self, accession: &str, source: &str) -> Self {
        self.accession = accession.trim().to_string();
        self.accession_source = source.trim().to_string();
        self
    }

    pub fn with_secondary_accession(mut self, accession: &str, source: &str) -> Self {
        self.secondary_accession = accession.trim().to_string();
        self.secondary_accession_source = source.trim().to_string();
        self
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = symbol.trim().to_string();
        self
    }

    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.taxonomy = Some(taxonomy);
        self
    }

    /// Returns the number of residues, gaps included.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the sequence has no residues.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the residues as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the residues as text.
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Byte code of the residue at `pos`.
    pub fn character_code(&self, pos: usize) -> MsaResult<u8> {
        self.data
            .get(pos)
            .copied()
            .ok_or(MsaError::PositionOutOfRange { pos, len: self.len() })
    }

    /// Residue at `pos`.
    pub fn residue_at(&self, pos: usize) -> MsaResult<char> {
        self.character_code(pos).map(char::from)
    }

    fn check_slice(&self, start: usize, len: usize) -> MsaResult<usize> {
        match start.checked_add(len) {
            Some(end) if end <= self.len() => Ok(end),
            end => Err(MsaError::SliceOutOfRange {
                start,
                end: end.unwrap_or(usize::MAX),
                len: self.len(),
            }),
        }
    }

    /// Returns `len` residues starting at `start`.
    pub fn slice(&self, start: usize, len: usize) -> MsaResult<Cow<'_, str>> {
        let end = self.check_slice(start, len)?;
        Ok(String::from_utf8_lossy(&self.data[start..end]))
    }

    /// Removes `len` residues starting at `start` and returns them.
    pub fn take_slice(&mut self, start: usize, len: usize) -> MsaResult<String> {
        let end = self.check_slice(start, len)?;
        let taken: Vec<u8> = self.data.drain(start..end).collect();
        Ok(String::from_utf8_lossy(&taken).into_owned())
    }

    /// Number of gap positions.
    pub fn gap_length(&self) -> usize {
        self.data.iter().filter(|&&b| is_gap(b)).count()
    }

    /// Gap positions over total length; 0.0 for an empty sequence.
    pub fn gap_ratio(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.gap_length() as f64 / self.len() as f64
    }

    /// Deletes the residue at `pos` in place.
    pub fn delete_residue(&mut self, pos: usize) -> MsaResult<()> {
        if pos >= self.len() {
            return Err(MsaError::PositionOutOfRange { pos, len: self.len() });
        }
        self.data.remove(pos);
        Ok(())
    }

    /// Returns a new sequence (same name, no metadata) holding the residues
    /// from `first` to `last`, both inclusive.
    pub fn subsequence(&self, first: usize, last: usize) -> MsaResult<Sequence> {
        if last < first {
            return Err(MsaError::InvalidArgument(format!(
                "attempt to get subsequence from {} to {}",
                first, last
            )));
        }
        if last >= self.len() {
            return Err(MsaError::SliceOutOfRange {
                start: first,
                end: last + 1,
                len: self.len(),
            });
        }
        Ok(Sequence::from_bytes(
            &self.name,
            self.data[first..=last].to_vec(),
        ))
    }

    /// Appends residues.
    pub fn append(&mut self, residues: &str) {
        self.data.extend_from_slice(residues.as_bytes());
    }

    /// Drops every position flagged in `remove`; `remove` must be as long as
    /// the sequence.
    pub(crate) fn retain_positions(&mut self, remove: &[bool]) {
        let mut pos = 0;
        self.data.retain(|_| {
            let keep = !remove[pos];
            pos += 1;
            keep
        });
    }

    pub(crate) fn retain_residues(&mut self, keep: impl Fn(u8) -> bool) {
        self.data.retain(|&b| keep(b));
    }

    /// Name of the taxonomy, empty when none is attached.
    pub fn taxonomy_name(&self) -> &str {
        self.taxonomy.as_ref().map(|t| t.name.as_str()).unwrap_or("")
    }

    /// Returns the sequence as a two line FASTA record (no trailing newline).
    pub fn to_fasta(&self) -> String {
        format!(">{}\n{}", self.name, self.as_str())
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.name, self.as_str())
    }
}

/// An ordered collection of sequences with column-wise operations.
///
/// Whether the collection is aligned is derived, never stored: it is aligned
/// iff it is non-empty and all sequences share one length.
#[derive(Debug, Clone, Default)]
pub struct Msa {
    sequences: Vec<Sequence>,
    /// "A [tax] == B [tax]" for every duplicate found by the last redundancy pass
    identical_pairs: Vec<String>,
}

impl Msa {
    /// Creates an empty alignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an alignment from a vector of sequences.
    pub fn from_sequences(sequences: Vec<Sequence>) -> Self {
        Self {
            sequences,
            identical_pairs: Vec::new(),
        }
    }

    pub fn add_sequence(&mut self, sequence: Sequence) {
        self.sequences.push(sequence);
    }

    /// Creates a sequence from a name and residues and appends it.
    pub fn add(&mut self, name: &str, residues: &str) {
        self.add_sequence(Sequence::new(name, residues));
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Returns true if the alignment holds no sequences.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    pub fn into_sequences(self) -> Vec<Sequence> {
        self.sequences
    }

    fn check_index(&self, index: usize) -> MsaResult<()> {
        if index >= self.sequences.len() {
            return Err(MsaError::IndexOutOfRange {
                index,
                count: self.sequences.len(),
            });
        }
        Ok(())
    }

    /// Gets a sequence by index.
    pub fn get(&self, index: usize) -> MsaResult<&Sequence> {
        self.check_index(index)?;
        Ok(&self.sequences[index])
    }

    pub fn get_mut(&mut self, index: usize) -> MsaResult<&mut Sequence> {
        self.check_index(index)?;
        Ok(&mut self.sequences[index])
    }

    /// Removes and returns the sequence at `index`.
    pub fn remove(&mut self, index: usize) -> MsaResult<Sequence> {
        self.check_index(index)?;
        Ok(self.sequences.remove(index))
    }

    /// Duplicate pairs recorded by the last call to
    /// [`Msa::remove_redundant_sequences`].
    pub fn identical_pairs(&self) -> &[String] {
        &self.identical_pairs
    }

    /// True iff the alignment is non-empty and all sequences have the same length.
    pub fn is_aligned(&self) -> bool {
        match self.sequences.first() {
            None => false,
            Some(first) => self.sequences.iter().all(|s| s.len() == first.len()),
        }
    }

    /// Returns the shared length, failing for unaligned (or empty) alignments.
    pub fn length(&self) -> MsaResult<usize> {
        self.aligned_length("get length")
    }

    pub(crate) fn aligned_length(&self, action: &'static str) -> MsaResult<usize> {
        match self.sequences.first() {
            Some(first) if self.is_aligned() => Ok(first.len()),
            _ => Err(MsaError::NotAligned(action)),
        }
    }

    /// Returns the longest name length (in characters).
    pub fn max_name_length(&self) -> usize {
        self.sequences
            .iter()
            .map(|s| s.name.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Indices of sequences whose name equals `name`, or contains it when
    /// `partial_match` is set.
    pub fn find_by_name(&self, name: &str, case_sensitive: bool, partial_match: bool) -> Vec<usize> {
        let needle = fold_case(name, case_sensitive);
        self.positions(|seq| {
            let current = fold_case(&seq.name, case_sensitive);
            current == needle || (partial_match && current.contains(&*needle))
        })
    }

    /// Indices of sequences whose name matches `pattern`.
    ///
    /// With `avoid_similar_to`, a match preceded by "similar to " (any case)
    /// is rejected, so that annotations like "similar to P53" do not count
    /// as a hit for P53.
    pub fn find_by_name_pattern(&self, pattern: &Regex, avoid_similar_to: bool) -> Vec<usize> {
        self.positions(|seq| match pattern.find(&seq.name) {
            None => false,
            Some(m) => {
                !avoid_similar_to
                    || !seq.name[..m.start()].to_lowercase().contains("similar to ")
            }
        })
    }

    /// Indices of sequences whose first whitespace-delimited name token equals `name`.
    pub fn find_by_name_start(&self, name: &str, case_sensitive: bool) -> Vec<usize> {
        let needle = fold_case(name, case_sensitive);
        self.positions(|seq| {
            seq.name
                .split_whitespace()
                .next()
                .map(|token| fold_case(token, case_sensitive) == needle)
                .unwrap_or(false)
        })
    }

    /// Returns true if at least one sequence has the given name.
    pub fn has(&self, name: &str, case_sensitive: bool, partial_match: bool) -> bool {
        !self.find_by_name(name, case_sensitive, partial_match).is_empty()
    }

    /// Returns the single sequence found by [`Msa::find_by_name`].
    pub fn get_by_name(&self, name: &str, case_sensitive: bool, partial_match: bool) -> MsaResult<&Sequence> {
        let indices = self.find_by_name(name, case_sensitive, partial_match);
        self.unique(indices, name)
    }

    /// Returns the single sequence found by [`Msa::find_by_name_pattern`].
    pub fn get_by_name_pattern(&self, pattern: &Regex, avoid_similar_to: bool) -> MsaResult<&Sequence> {
        let indices = self.find_by_name_pattern(pattern, avoid_similar_to);
        self.unique(indices, pattern.as_str())
    }

    /// Returns the single sequence found by [`Msa::find_by_name_start`].
    pub fn get_by_name_start(&self, name: &str, case_sensitive: bool) -> MsaResult<&Sequence> {
        let indices = self.find_by_name_start(name, case_sensitive);
        self.unique(indices, name)
    }

    fn positions(&self, pred: impl Fn(&Sequence) -> bool) -> Vec<usize> {
        self.sequences
            .iter()
            .enumerate()
            .filter(|(_, seq)| pred(seq))
            .map(|(i, _)| i)
            .collect()
    }

    fn unique(&self, indices: Vec<usize>, query: &str) -> MsaResult<&Sequence> {
        match indices.as_slice() {
            [] => Err(MsaError::NotFound(query.to_string())),
            [index] => Ok(&self.sequences[*index]),
            _ => Err(MsaError::NotUnique(query.to_string())),
        }
    }

    /// Returns a new alignment holding copies of the sequences at `indices`.
    pub fn sub_alignment(&self, indices: &[usize]) -> MsaResult<Msa> {
        let mut msa = Msa::new();
        for &i in indices {
            msa.add_sequence(self.get(i)?.clone());
        }
        Ok(msa)
    }

    /// Names occurring more than once, in order of their second appearance.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.sequences
            .iter()
            .filter(|s| !seen.insert(s.name.as_str()))
            .map(|s| s.name.clone())
            .collect()
    }

    /// All sequences as FASTA records, one residue line each.
    pub fn to_fasta(&self) -> String {
        let mut out = String::new();
        for seq in &self.sequences {
            out.push_str(&seq.to_fasta());
            out.push('\n');
        }
        out
    }

    /// Pairwise overlap matrix as text: one line per sequence, its name
    /// padded to `max_name_length`, then `+` (overlap), `-` (none) or a
    /// blank on the diagonal.
    pub fn overlap_diagram(&self, min_overlap: usize, max_name_length: usize) -> MsaResult<String> {
        self.aligned_length("get overlap diagram")?;
        let n = self.sequence_count();
        let mut out = String::new();
        for i in 0..n {
            let name = normalize_name(&self.sequences[i].name, max_name_length, false)
                .unwrap_or_default();
            out.push_str(&name);
            for j in 0..n {
                let mark = if i == j {
                    ' '
                } else if self.has_overlap(i, j, min_overlap)? {
                    '+'
                } else {
                    '-'
                };
                out.push(mark);
            }
            out.push('\n');
        }
        Ok(out)
    }
}

impl<'a> IntoIterator for &'a Msa {
    type Item = &'a Sequence;
    type IntoIter = std::slice::Iter<'a, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

fn fold_case(s: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.to_lowercase())
    }
}
