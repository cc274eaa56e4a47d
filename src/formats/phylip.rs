//! PHYLIP sequential writer.
//!
//! ```text
//! 3 10
//! Seq1       ACGTACGTAC
//! Seq2       TGCATGCATG
//! Seq3       AAAACCCCGG
//! ```
//!
//! Names have blanks replaced by `_` and are padded or truncated to a fixed
//! width (10 by default), followed by one space and the residues.

use std::io::Write;

use super::{fixed_width_name, MsaWriter, WriteError, WriteResult};
use crate::model::Msa;
use crate::residue::clean_residues;

/// PHYLIP sequential output settings.
#[derive(Debug, Clone)]
pub struct PhylipWriter {
    pub max_name_length: usize,
    pub clean: bool,
    pub fail_if_name_too_long: bool,
}

impl Default for PhylipWriter {
    fn default() -> Self {
        Self {
            max_name_length: 10,
            clean: false,
            fail_if_name_too_long: false,
        }
    }
}

impl MsaWriter for PhylipWriter {
    fn write_to(&self, msa: &Msa, out: &mut dyn Write) -> WriteResult<()> {
        let length = msa
            .length()
            .map_err(|_| WriteError::Unaligned("phylip sequential"))?;
        writeln!(out, "{} {}", msa.sequence_count(), length)?;
        for seq in msa {
            let name = fixed_width_name(&seq.name, self.max_name_length, self.fail_if_name_too_long)?;
            let residues = seq.as_str();
            if self.clean {
                writeln!(out, "{} {}", name, clean_residues(&residues))?;
            } else {
                writeln!(out, "{} {}", name, residues)?;
            }
        }
        Ok(())
    }
}
