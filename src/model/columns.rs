//! Column-wise operations: gap column detection, column removal and trimming.

use super::{Msa, MsaError, MsaResult};
use crate::residue::is_gap;

impl Msa {
    /// Number of gap characters in column `col`; `col` must be in range.
    fn gaps_in_column(&self, col: usize) -> usize {
        self.sequences
            .iter()
            .filter(|s| is_gap(s.as_bytes()[col]))
            .count()
    }

    /// Columns in which every sequence has a gap.
    pub fn gap_only_columns(&self) -> MsaResult<Vec<usize>> {
        let len = self.aligned_length("get gap only columns")?;
        let n = self.sequence_count();
        Ok((0..len).filter(|&c| self.gaps_in_column(c) == n).collect())
    }

    /// Columns in which at least one sequence has a gap.
    pub fn gap_columns(&self) -> MsaResult<Vec<usize>> {
        let len = self.aligned_length("get gap columns")?;
        Ok((0..len).filter(|&c| self.gaps_in_column(c) > 0).collect())
    }

    /// Columns for which (sequences with a gap) / (number of sequences) is
    /// strictly greater than `gap_ratio`.
    pub fn gap_columns_by_ratio(&self, gap_ratio: f64) -> MsaResult<Vec<usize>> {
        let len = self.aligned_length("get gap columns with gap ratio")?;
        if !(0.0..=1.0).contains(&gap_ratio) {
            return Err(MsaError::InvalidArgument(
                "gap ratio must be between 0 and 1 inclusive".to_string(),
            ));
        }
        let n = self.sequence_count() as f64;
        Ok((0..len)
            .filter(|&c| self.gaps_in_column(c) as f64 / n > gap_ratio)
            .collect())
    }

    /// Removes the given columns from every sequence.
    ///
    /// Indices may come in any order and may repeat; all are validated
    /// before anything is removed, and they are resolved against the
    /// original column numbering.
    pub fn remove_columns(&mut self, columns: &[usize]) -> MsaResult<()> {
        let len = self.aligned_length("remove columns")?;
        if let Some(&bad) = columns.iter().find(|&&c| c >= len) {
            return Err(MsaError::PositionOutOfRange { pos: bad, len });
        }
        if columns.is_empty() {
            return Ok(());
        }
        let mut doomed = vec![false; len];
        for &c in columns {
            doomed[c] = true;
        }
        for seq in &mut self.sequences {
            seq.retain_positions(&doomed);
        }
        Ok(())
    }

    pub fn remove_gap_only_columns(&mut self) -> MsaResult<()> {
        let columns = self.gap_only_columns()?;
        self.remove_columns(&columns)
    }

    pub fn remove_gap_columns(&mut self) -> MsaResult<()> {
        let columns = self.gap_columns()?;
        self.remove_columns(&columns)
    }

    /// Removes the columns returned by [`Msa::gap_columns_by_ratio`].
    pub fn remove_gap_columns_by_ratio(&mut self, gap_ratio: f64) -> MsaResult<()> {
        let columns = self.gap_columns_by_ratio(gap_ratio)?;
        self.remove_columns(&columns)
    }

    /// Keeps only columns `first..=last` (0-based).
    pub fn trim(&mut self, first: usize, last: usize) -> MsaResult<()> {
        let len = self.aligned_length("trim")?;
        if last < first {
            return Err(MsaError::InvalidArgument(format!(
                "attempt to trim from {} to {}",
                first, last
            )));
        }
        let outside: Vec<usize> = (0..len).filter(|&c| c < first || c > last).collect();
        self.remove_columns(&outside)
    }

    /// Total gap characters over total cells of the alignment.
    pub fn gap_proportion(&self) -> MsaResult<f64> {
        let len = self.aligned_length("get gap proportion")?;
        let total = len * self.sequence_count();
        if total == 0 {
            return Ok(0.0);
        }
        let gaps: usize = self.sequences.iter().map(|s| s.gap_length()).sum();
        Ok(gaps as f64 / total as f64)
    }

    /// Strips every gap character from every sequence. The result is in
    /// general no longer aligned.
    pub fn remove_all_gap_characters(&mut self) {
        for seq in &mut self.sequences {
            seq.retain_residues(|b| !is_gap(b));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Msa, MsaError, Sequence};

    fn example_msa() -> Msa {
        let mut msa = Msa::new();
        msa.add_sequence(Sequence::new("seq 0", "a-*-_ x-ijklmnopqrstuvwxyz"));
        msa.add_sequence(Sequence::new("seq 1", "ab--_ X-ijklmnopqrstuvwxyz"));
        msa.add_sequence(Sequence::new("seq 2", "abc-_?x-ijklmnopqrstuvwxyz"));
        msa.add_sequence(Sequence::new("seq 3", "abcd_?x-ijklmnopqrstuvwxyz"));
        msa.add_sequence(Sequence::new("seq 4", "abcde?x-ijklmnopqrstuvwxyz"));
        msa.add_sequence(Sequence::new("seq 5", "abcdefx-ijklmnopqrstuvwxyz"));
        msa.add("seq 6", "abcdefg-ijklmnopqrstuvwxyz");
        msa
    }

    fn seq0(msa: &Msa) -> String {
        msa.get_by_name("seq 0", true, false).unwrap().as_str().into_owned()
    }

    #[test]
    fn test_gap_column_series() {
        let mut msa = example_msa();
        assert!(msa.is_aligned());
        assert_eq!(msa.sequence_count(), 7);
        assert_eq!(msa.length().unwrap(), 26);

        msa.add("seq 7", "abcdefgqijklmnopqrstuvwxyz");
        assert_eq!(msa.sequence_count(), 8);
        msa.remove(7).unwrap();

        msa.remove_gap_only_columns().unwrap();
        assert_eq!(msa.length().unwrap(), 25);
        assert_eq!(seq0(&msa), "a-*-_ xijklmnopqrstuvwxyz");

        msa.remove_gap_columns_by_ratio(6.1 / 7.0).unwrap();
        assert_eq!(msa.length().unwrap(), 25);
        msa.remove_gap_columns_by_ratio(6.0 / 7.0).unwrap();
        assert_eq!(msa.length().unwrap(), 25);
        msa.remove_gap_columns_by_ratio(5.0 / 7.0).unwrap();
        assert_eq!(msa.length().unwrap(), 25);
        assert_eq!(seq0(&msa), "a-*-_ xijklmnopqrstuvwxyz");

        msa.remove_gap_columns_by_ratio(2.0 / 7.0).unwrap();
        assert_eq!(msa.length().unwrap(), 23);
        assert_eq!(seq0(&msa), "a-* xijklmnopqrstuvwxyz");

        msa.remove_gap_columns_by_ratio(1.0 / 7.0).unwrap();
        assert_eq!(msa.length().unwrap(), 21);
        assert_eq!(seq0(&msa), "a-xijklmnopqrstuvwxyz");
    }

    #[test]
    fn test_gap_ratio_removal_is_monotonic() {
        let msa = example_msa();
        let mut previous: Option<Vec<usize>> = None;
        for step in 0..=10 {
            let ratio = step as f64 / 10.0;
            let cols = msa.gap_columns_by_ratio(ratio).unwrap();
            if let Some(prev) = &previous {
                assert!(cols.iter().all(|c| prev.contains(c)));
            }
            previous = Some(cols);
        }
    }

    #[test]
    fn test_gap_columns() {
        let mut msa = Msa::new();
        msa.add("a", "A-C.");
        msa.add("b", "A-GT");
        assert_eq!(msa.gap_only_columns().unwrap(), vec![1]);
        assert_eq!(msa.gap_columns().unwrap(), vec![1, 3]);
        msa.remove_gap_columns().unwrap();
        assert_eq!(msa.get(0).unwrap().as_str(), "AC");
        assert_eq!(msa.get(1).unwrap().as_str(), "AG");
    }

    #[test]
    fn test_invalid_gap_ratio() {
        let msa = example_msa();
        assert!(matches!(msa.gap_columns_by_ratio(1.5), Err(MsaError::InvalidArgument(_))));
        assert!(matches!(msa.gap_columns_by_ratio(-0.1), Err(MsaError::InvalidArgument(_))));
    }

    #[test]
    fn test_unaligned_column_operations_fail() {
        let mut msa = Msa::new();
        msa.add("a", "ACGT");
        msa.add("b", "AC");
        assert!(matches!(msa.gap_only_columns(), Err(MsaError::NotAligned(_))));
        assert!(matches!(msa.remove_columns(&[0]), Err(MsaError::NotAligned(_))));
        assert!(matches!(msa.trim(0, 1), Err(MsaError::NotAligned(_))));
        assert!(matches!(msa.gap_proportion(), Err(MsaError::NotAligned(_))));
    }

    #[test]
    fn test_remove_columns_keeps_alignment() {
        let mut msa = example_msa();
        msa.remove_columns(&[25, 0, 3, 3, 10]).unwrap();
        assert!(msa.is_aligned());
        assert_eq!(msa.length().unwrap(), 22);
        assert_eq!(seq0(&msa), "-*_ x-ijlmnopqrstuvwxy");
        assert!(matches!(
            msa.remove_columns(&[22]),
            Err(MsaError::PositionOutOfRange { pos: 22, len: 22 })
        ));
        assert_eq!(msa.length().unwrap(), 22);
    }

    #[test]
    fn test_trim() {
        let mut msa = Msa::new();
        msa.add("seq0", "abcdefgh");
        msa.add("seq1", "a-cdefgh");
        msa.trim(0, 7).unwrap();
        assert_eq!(msa.get(0).unwrap().as_str(), "abcdefgh");
        msa.trim(3, 4).unwrap();
        assert_eq!(msa.get(0).unwrap().as_str(), "de");
        assert_eq!(msa.get(1).unwrap().as_str(), "de");
        assert!(msa.trim(1, 0).is_err());
    }

    #[test]
    fn test_gap_proportion() {
        let mut msa = Msa::new();
        msa.add("a", "AC--");
        msa.add("b", "ACGT");
        assert!((msa.gap_proportion().unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_remove_all_gap_characters() {
        let mut msa = Msa::new();
        msa.add("a", "A-C.G*");
        msa.add("b", "ACGT__");
        msa.remove_all_gap_characters();
        assert_eq!(msa.get(0).unwrap().as_str(), "ACG");
        assert_eq!(msa.get(1).unwrap().as_str(), "ACGT");
        assert!(!msa.is_aligned());
    }
}
