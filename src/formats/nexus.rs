//! NEXUS writer.
//!
//! Writes a single sequential protein `Data` block:
//!
//! ```text
//! Begin Data;
//!    Dimensions NTax=2 NChar=4;
//!    Format DataType=Protein Interleave=No gap=-;
//!    Matrix
//!       seq1       AC-T
//!       seq2       ACGT
//!    ;
//! End;
//! ```

use std::io::Write;

use super::{fixed_width_name, MsaWriter, WriteError, WriteResult};
use crate::model::Msa;
use crate::residue::clean_residues;

/// NEXUS output settings; names are formatted as for PHYLIP.
#[derive(Debug, Clone)]
pub struct NexusWriter {
    pub max_name_length: usize,
    pub clean: bool,
    pub fail_if_name_too_long: bool,
}

impl Default for NexusWriter {
    fn default() -> Self {
        Self {
            max_name_length: 10,
            clean: false,
            fail_if_name_too_long: false,
        }
    }
}

impl MsaWriter for NexusWriter {
    fn write_to(&self, msa: &Msa, out: &mut dyn Write) -> WriteResult<()> {
        let length = msa.length().map_err(|_| WriteError::Unaligned("nexus"))?;
        // Names are checked up front so that a failure leaves no partial block.
        let names = msa
            .iter()
            .map(|seq| fixed_width_name(&seq.name, self.max_name_length, self.fail_if_name_too_long))
            .collect::<WriteResult<Vec<_>>>()?;

        writeln!(out, "Begin Data;")?;
        writeln!(out, "   Dimensions NTax={} NChar={};", msa.sequence_count(), length)?;
        writeln!(out, "   Format DataType=Protein Interleave=No gap=-;")?;
        writeln!(out, "   Matrix")?;
        for (seq, name) in msa.iter().zip(&names) {
            let residues = seq.as_str();
            if self.clean {
                writeln!(out, "      {} {}", name, clean_residues(&residues))?;
            } else {
                writeln!(out, "      {} {}", name, residues)?;
            }
        }
        writeln!(out, "   ;")?;
        writeln!(out, "End;")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_nexus() {
        let mut msa = Msa::new();
        msa.add("seq1", "AC-T");
        msa.add("seq 2", "ACGT");
        let mut out = Vec::new();
        NexusWriter::default().write_to(&msa, &mut out).unwrap();
        let expected = "Begin Data;\n\
                        \x20  Dimensions NTax=2 NChar=4;\n\
                        \x20  Format DataType=Protein Interleave=No gap=-;\n\
                        \x20  Matrix\n\
                        \x20     seq1       AC-T\n\
                        \x20     seq_2      ACGT\n\
                        \x20  ;\n\
                        End;\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_strict_names_leave_no_output() {
        let mut msa = Msa::new();
        msa.add("ok", "ACGT");
        msa.add("much_too_long", "ACGT");
        let writer = NexusWriter {
            max_name_length: 5,
            fail_if_name_too_long: true,
            ..NexusWriter::default()
        };
        let mut out = Vec::new();
        assert!(matches!(
            writer.write_to(&msa, &mut out),
            Err(WriteError::NameTooLong { .. })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_unaligned_is_refused() {
        let mut msa = Msa::new();
        msa.add("s1", "ACGT");
        msa.add("s2", "A");
        let mut out = Vec::new();
        assert!(NexusWriter::default().write_to(&msa, &mut out).is_err());
    }
}
