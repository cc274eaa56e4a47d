//! Pairwise overlap and identity, and the ways of splitting an alignment.

use super::{Msa, MsaError, MsaResult, Sequence};
use crate::residue::{is_gap, UNKNOWN_RESIDUE};

/// Shortest, longest and mean sequence length of an alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthStats {
    pub min: usize,
    pub max: usize,
    pub mean: f64,
}

impl Msa {
    fn aligned_pair(&self, i: usize, j: usize, action: &'static str) -> MsaResult<(&Sequence, &Sequence)> {
        self.aligned_length(action)?;
        Ok((self.get(i)?, self.get(j)?))
    }

    /// True iff sequences `i` and `j` share at least `min_overlap` columns in
    /// which neither has a gap. Stops scanning once the threshold is reached.
    pub fn has_overlap(&self, i: usize, j: usize, min_overlap: usize) -> MsaResult<bool> {
        let (a, b) = self.aligned_pair(i, j, "get overlap")?;
        let mut count = 0;
        for (&x, &y) in a.as_bytes().iter().zip(b.as_bytes()) {
            if !is_gap(x) && !is_gap(y) {
                count += 1;
                if count >= min_overlap {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Number of columns in which neither `i` nor `j` has a gap.
    pub fn calculate_overlap(&self, i: usize, j: usize) -> MsaResult<usize> {
        let (a, b) = self.aligned_pair(i, j, "calculate overlap")?;
        Ok(a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .filter(|&(&x, &y)| !is_gap(x) && !is_gap(y))
            .count())
    }

    /// Number of overlapping columns with the same residue (ignoring case);
    /// `?` in the first sequence never counts.
    pub fn calculate_identities(&self, i: usize, j: usize) -> MsaResult<usize> {
        let (a, b) = self.aligned_pair(i, j, "calculate identities")?;
        Ok(a.as_bytes()
            .iter()
            .zip(b.as_bytes())
            .filter(|&(&x, &y)| {
                !is_gap(x) && !is_gap(y) && x != UNKNOWN_RESIDUE && x.eq_ignore_ascii_case(&y)
            })
            .count())
    }

    /// Splits the alignment into groups of mutually overlapping sequences.
    ///
    /// Sequences are visited in order; each joins the first existing group
    /// in which it overlaps (by at least `min_overlap` columns) with every
    /// member, otherwise it starts a new group.
    pub fn split_into_overlapping(&self, min_overlap: usize) -> MsaResult<Vec<Msa>> {
        self.aligned_length("split into overlapping msas")?;
        let mut bins: Vec<Vec<usize>> = Vec::new();
        for i in 0..self.sequence_count() {
            let mut target = None;
            for (b, bin) in bins.iter().enumerate() {
                let mut all_overlap = true;
                for &member in bin {
                    if !self.has_overlap(i, member, min_overlap)? {
                        all_overlap = false;
                        break;
                    }
                }
                if all_overlap {
                    target = Some(b);
                    break;
                }
            }
            match target {
                Some(b) => bins[b].push(i),
                None => bins.push(vec![i]),
            }
        }
        bins.iter().map(|bin| self.sub_alignment(bin)).collect()
    }

    /// Splits into `n` contiguous alignments of `count / n` sequences each,
    /// the remainder going to the last one.
    pub fn split(&self, n: usize) -> MsaResult<Vec<Msa>> {
        let count = self.sequence_count();
        if n < 2 || n > count {
            return Err(MsaError::InvalidArgument(format!(
                "attempt to split {} sequences into {} parts",
                count, n
            )));
        }
        let size = count / n;
        Ok((0..n)
            .map(|part| {
                let start = part * size;
                let end = if part == n - 1 { count } else { start + size };
                Msa::from_sequences(self.sequences[start..end].to_vec())
            })
            .collect())
    }

    /// Length statistics over all sequences, `None` when empty.
    pub fn length_stats(&self) -> Option<LengthStats> {
        let min = self.sequences.iter().map(Sequence::len).min()?;
        let max = self.sequences.iter().map(Sequence::len).max()?;
        let sum: usize = self.sequences.iter().map(Sequence::len).sum();
        Some(LengthStats {
            min,
            max,
            mean: sum as f64 / self.sequence_count() as f64,
        })
    }
}
