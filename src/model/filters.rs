//! Sequence-level filters: gap ratio, non-gap length, redundancy and names.

use std::collections::{BTreeSet, HashSet};

use rayon::prelude::*;
use tracing::debug;

use super::{Msa, MsaError, MsaResult};
use crate::residue::clean_residues;

impl Msa {
    /// Removes the sequences at `indices`, highest first, and returns their
    /// names in removal order.
    fn remove_indices(&mut self, indices: &BTreeSet<usize>) -> Vec<String> {
        indices
            .iter()
            .rev()
            .map(|&i| {
                let seq = self.sequences.remove(i);
                debug!("removed: {}", seq.name);
                seq.name
            })
            .collect()
    }

    fn indices_where(&self, pred: impl Fn(&super::Sequence) -> bool) -> BTreeSet<usize> {
        self.positions(pred).into_iter().collect()
    }

    /// Removes every sequence whose gap ratio is strictly greater than
    /// `gap_ratio`. Names are returned last to first.
    pub fn remove_sequences_by_gap_ratio(&mut self, gap_ratio: f64) -> MsaResult<Vec<String>> {
        self.aligned_length("remove sequences by gap ratio")?;
        let doomed = self.indices_where(|s| s.gap_ratio() > gap_ratio);
        Ok(self.remove_indices(&doomed))
    }

    /// Removes every sequence with fewer than `min_length` non-gap residues.
    /// Names are returned last to first.
    pub fn remove_sequences_by_non_gap_length(&mut self, min_length: usize) -> MsaResult<Vec<String>> {
        let len = self.aligned_length("remove sequences by non gap length")?;
        let doomed = self.indices_where(|s| len - s.gap_length() < min_length);
        Ok(self.remove_indices(&doomed))
    }

    /// Removes sequences whose cleaned residues equal those of a lower
    /// indexed sequence, so that the first member of each group survives.
    ///
    /// With `consider_taxonomy`, two sequences are only redundant when their
    /// taxonomies are equal (or both absent). Every detected pair is kept in
    /// [`Msa::identical_pairs`]. Returns the removed names, highest index
    /// first.
    pub fn remove_redundant_sequences(&mut self, consider_taxonomy: bool) -> Vec<String> {
        let cleaned: Vec<String> = self
            .sequences
            .par_iter()
            .map(|s| clean_residues(&s.as_str()))
            .collect();

        let n = self.sequence_count();
        let mut doomed = BTreeSet::new();
        let mut pairs = Vec::new();
        for i in 0..n {
            if doomed.contains(&i) {
                continue;
            }
            for j in (i + 1)..n {
                if doomed.contains(&j) {
                    continue;
                }
                let (a, b) = (&self.sequences[i], &self.sequences[j]);
                if consider_taxonomy && a.taxonomy != b.taxonomy {
                    continue;
                }
                if cleaned[i] == cleaned[j] {
                    doomed.insert(j);
                    let pair = format!(
                        "{} [{}] == {} [{}]",
                        a.name,
                        a.taxonomy_name(),
                        b.name,
                        b.taxonomy_name()
                    );
                    debug!("{}", pair);
                    pairs.push(pair);
                }
            }
        }
        self.identical_pairs = pairs;
        self.remove_indices(&doomed)
    }

    /// Keeps only the sequences whose name is listed (exact,
    /// case-sensitive). Returns (kept, removed) counts.
    pub fn retain_by_names<S: AsRef<str>>(&mut self, names: &[S]) -> (usize, usize) {
        let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        let before = self.sequence_count();
        self.sequences.retain(|s| wanted.contains(s.name.as_str()));
        let kept = self.sequence_count();
        (kept, before - kept)
    }

    /// Removes one sequence per listed name. Each name must match exactly one
    /// sequence (exact, case-sensitive); returns the number removed.
    pub fn remove_by_names<S: AsRef<str>>(&mut self, names: &[S]) -> MsaResult<usize> {
        let mut removed = 0;
        for name in names {
            let name = name.as_ref();
            match self.find_by_name(name, true, false).as_slice() {
                [] => return Err(MsaError::NotFound(name.to_string())),
                [index] => {
                    self.sequences.remove(*index);
                    removed += 1;
                }
                _ => return Err(MsaError::NotUnique(name.to_string())),
            }
        }
        Ok(removed)
    }

    /// Removes every sequence whose name does not contain `pattern`
    /// (ignoring case). Returns the removed names.
    pub fn keep_matching(&mut self, pattern: &str) -> Vec<String> {
        let needle = pattern.to_lowercase();
        let doomed = self.indices_where(|s| !s.name.to_lowercase().contains(&needle));
        self.remove_indices(&doomed)
    }

    /// Removes every sequence whose name contains `pattern` (ignoring case).
    /// Returns the removed names.
    pub fn remove_matching(&mut self, pattern: &str) -> Vec<String> {
        let needle = pattern.to_lowercase();
        let doomed = self.indices_where(|s| s.name.to_lowercase().contains(&needle));
        self.remove_indices(&doomed)
    }

    /// Orders sequences by name. Only the first sequence of each name is kept.
    pub fn sort_by_name(&mut self) {
        let mut seen = HashSet::new();
        let mut sequences = std::mem::take(&mut self.sequences);
        sequences.retain(|s| seen.insert(s.name.clone()));
        sequences.sort_by(|a, b| a.name.cmp(&b.name));
        self.sequences = sequences;
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Msa, MsaError, Sequence, Taxonomy};

    fn staircase() -> Msa {
        let mut msa = Msa::new();
        msa.add("seq0", "abcdefgh");
        msa.add("seq1", "a-cdefgh");
        msa.add("seq2", "a--defgh");
        msa.add("seq3", "a---efgh");
        msa.add("seq4", "a----fgh");
        msa
    }

    fn names(msa: &Msa) -> Vec<&str> {
        msa.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_remove_sequences_by_gap_ratio() {
        let mut msa = staircase();
        msa.add("seq5", "a");
        assert!(!msa.is_aligned());
        assert!(matches!(
            msa.remove_sequences_by_gap_ratio(0.5),
            Err(MsaError::NotAligned(_))
        ));
        msa.remove(5).unwrap();
        msa.remove_gap_only_columns().unwrap();
        assert_eq!(msa.length().unwrap(), 8);

        assert!(msa.remove_sequences_by_gap_ratio(4.0 / 8.0).unwrap().is_empty());
        assert_eq!(msa.sequence_count(), 5);
        assert_eq!(msa.remove_sequences_by_gap_ratio(3.0 / 8.0).unwrap(), vec!["seq4"]);
        assert_eq!(msa.sequence_count(), 4);
        assert_eq!(
            msa.remove_sequences_by_gap_ratio(1.0 / 8.0).unwrap(),
            vec!["seq3", "seq2"]
        );
        assert_eq!(msa.sequence_count(), 2);
        msa.remove_sequences_by_gap_ratio(0.0).unwrap();
        assert_eq!(names(&msa), vec!["seq0"]);
    }

    #[test]
    fn test_remove_sequences_by_non_gap_length() {
        let mut msa = staircase();
        assert!(msa.remove_sequences_by_non_gap_length(4).unwrap().is_empty());
        assert_eq!(msa.sequence_count(), 5);
        assert_eq!(msa.remove_sequences_by_non_gap_length(5).unwrap(), vec!["seq4"]);
        assert_eq!(msa.sequence_count(), 4);
        msa.remove_sequences_by_non_gap_length(8).unwrap();
        assert_eq!(names(&msa), vec!["seq0"]);
    }

    fn redundant_msa() -> Msa {
        let residues = [
            "ABCDED", "ABCDEE", "abcded", " ABCDEE", "ABCDEV", "ABCDED", "AB.DEI", "aB-DEi*",
            "ABCDED", "ABCDED", "ABCDED", "ABCDED",
        ];
        let mut msa = Msa::new();
        for (i, r) in residues.iter().enumerate() {
            msa.add_sequence(Sequence::new(format!("seq {}", i), *r));
        }
        msa
    }

    #[test]
    fn test_remove_redundant_sequences() {
        let mut msa = redundant_msa();
        let removed = msa.remove_redundant_sequences(false);
        assert_eq!(names(&msa), vec!["seq 0", "seq 1", "seq 4", "seq 6"]);
        assert_eq!(
            removed,
            vec!["seq 11", "seq 10", "seq 9", "seq 8", "seq 7", "seq 5", "seq 3", "seq 2"]
        );
        assert_eq!(msa.identical_pairs().len(), 8);
        assert_eq!(msa.identical_pairs()[0], "seq 0 [] == seq 2 []");
    }

    #[test]
    fn test_redundancy_respects_taxonomy() {
        let mut msa = redundant_msa();
        let seq5 = msa.get_mut(5).unwrap();
        seq5.taxonomy = Some(Taxonomy::new("dog"));
        msa.remove_redundant_sequences(true);
        assert_eq!(names(&msa), vec!["seq 0", "seq 1", "seq 4", "seq 5", "seq 6"]);

        let mut msa = redundant_msa();
        msa.get_mut(5).unwrap().taxonomy = Some(Taxonomy::new("dog"));
        msa.remove_redundant_sequences(false);
        assert_eq!(msa.sequence_count(), 4);
    }

    #[test]
    fn test_name_lists() {
        let mut msa = staircase();
        assert_eq!(msa.retain_by_names(&["seq0", "seq2", "seq4", "absent"]), (3, 2));
        assert_eq!(names(&msa), vec!["seq0", "seq2", "seq4"]);

        assert_eq!(msa.remove_by_names(&["seq2"]).unwrap(), 1);
        assert_eq!(names(&msa), vec!["seq0", "seq4"]);
        assert!(matches!(msa.remove_by_names(&["SEQ0"]), Err(MsaError::NotFound(_))));

        msa.add("seq0", "abcdefgh");
        assert!(matches!(msa.remove_by_names(&["seq0"]), Err(MsaError::NotUnique(_))));
    }

    #[test]
    fn test_matching_filters() {
        let mut msa = Msa::new();
        msa.add("Human p53", "A");
        msa.add("mouse P53", "A");
        msa.add("yeast rad9", "A");
        let removed = msa.keep_matching("p53");
        assert_eq!(removed, vec!["yeast rad9"]);
        assert_eq!(msa.remove_matching("HUMAN"), vec!["Human p53"]);
        assert_eq!(names(&msa), vec!["mouse P53"]);
    }

    #[test]
    fn test_sort_by_name() {
        let mut msa = Msa::new();
        msa.add("b", "A");
        msa.add("a", "C");
        msa.add("b", "G");
        msa.sort_by_name();
        assert_eq!(names(&msa), vec!["a", "b"]);
        assert_eq!(msa.get(1).unwrap().as_str(), "A");
    }
}
