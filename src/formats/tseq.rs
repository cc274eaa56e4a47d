//! NCBI TSeq XML parser.
//!
//! This is a line scanner, not an XML parser: every element of a `<TSeq>`
//! record must sit on its own line.
//!
//! ```text
//! <TSeqSet>
//! <TSeq>
//!   <TSeq_seqtype value="protein"/>
//!   <TSeq_gi>29341016</TSeq_gi>
//!   <TSeq_accver>AAO78806.1</TSeq_accver>
//!   <TSeq_sid>gnl|mbpwusl|BT3701</TSeq_sid>
//!   <TSeq_taxid>226186</TSeq_taxid>
//!   <TSeq_orgname>Bacteroides thetaiotaomicron VPI-5482</TSeq_orgname>
//!   <TSeq_defline>SusD [Bacteroides thetaiotaomicron VPI-5482]</TSeq_defline>
//!   <TSeq_length>551</TSeq_length>
//!   <TSeq_sequence>MKTKYIKQLF...</TSeq_sequence>
//! </TSeq>
//! </TSeqSet>
//! ```

use thiserror::Error;

use crate::model::{Msa, Sequence, Taxonomy};

/// Errors that can occur during TSeq parsing.
#[derive(Error, Debug)]
pub enum TSeqError {
    #[error("Unexpected line format at line {line}: {text}")]
    UnexpectedLine { line: usize, text: String },

    #[error("Record ending at line {line} has no {field}")]
    MissingField { field: &'static str, line: usize },

    #[error("No sequences found")]
    NoSequences,
}

/// Result type for TSeq parsing.
pub type TSeqResult<T> = Result<T, TSeqError>;

/// Database name used for NCBI identifiers.
const NCBI: &str = "ncbi";

/// `<tag>value</tag>` on one line, yielding (tag, value). The value runs to
/// the last closing tag.
fn element(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix('<')?;
    let (tag, rest) = rest.split_once('>')?;
    if !tag.starts_with("TSeq_") {
        return None;
    }
    let end = rest.rfind(&format!("</{}>", tag))?;
    let value = &rest[..end];
    (!value.is_empty()).then_some((tag, value))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_record_start(line: &str) -> bool {
    line.trim_start().starts_with("<TSeq>")
}

fn is_record_end(line: &str) -> bool {
    line.trim_start().starts_with("</TSeq>")
}

/// Elements carrying nothing the model keeps.
fn is_skipped_element(line: &str) -> bool {
    let rest = line.trim_start();
    rest.starts_with("<TSeq_seqtype") || rest.starts_with("<TSeq_length")
}

#[derive(Default)]
struct Record {
    gi: Option<String>,
    accver: Option<String>,
    sid: Option<String>,
    taxid: Option<String>,
    orgname: Option<String>,
    defline: Option<String>,
    sequence: Option<String>,
}

impl Record {
    /// Builds the sequence. Accession preference: gi, then sid, then accver;
    /// the next available identifier becomes the symbol.
    fn into_sequence(self, line: usize) -> TSeqResult<Sequence> {
        let name = self.defline.ok_or(TSeqError::MissingField {
            field: "TSeq_defline",
            line,
        })?;
        let residues = self.sequence.ok_or(TSeqError::MissingField {
            field: "TSeq_sequence",
            line,
        })?;
        let mut seq = Sequence::new(name, residues);

        if self.taxid.is_some() || self.orgname.is_some() {
            let source = if self.taxid.is_some() { NCBI } else { "" };
            seq = seq.with_taxonomy(Taxonomy::with_id(
                self.orgname.unwrap_or_default(),
                self.taxid.unwrap_or_default(),
                source,
            ));
        }

        if let Some(gi) = &self.gi {
            seq = seq.with_accession(gi, "gi");
            if let Some(symbol) = self.sid.as_ref().or(self.accver.as_ref()) {
                seq = seq.with_symbol(symbol);
            }
        } else if let Some(sid) = &self.sid {
            seq = seq.with_accession(sid, NCBI);
            if let Some(accver) = &self.accver {
                seq = seq.with_symbol(accver);
            }
        } else if let Some(accver) = &self.accver {
            seq = seq.with_accession(accver, NCBI);
        }
        Ok(seq)
    }
}

/// Parses TSeq XML content from a string.
pub fn parse_tseq_str(content: &str) -> TSeqResult<Msa> {
    let mut msa = Msa::new();
    let mut record: Option<Record> = None;

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        if is_blank(line) {
            continue;
        }
        if record.is_none() {
            if is_record_start(line) {
                record = Some(Record::default());
            }
            continue;
        }

        if is_record_end(line) {
            if let Some(done) = record.take() {
                msa.add_sequence(done.into_sequence(line_number)?);
            }
            continue;
        }
        if is_skipped_element(line) {
            continue;
        }

        let unexpected = || TSeqError::UnexpectedLine {
            line: line_number,
            text: line.to_string(),
        };
        let (tag, value) = element(line).ok_or_else(unexpected)?;
        let Some(current) = record.as_mut() else {
            continue;
        };
        let numeric = || value.bytes().all(|b| b.is_ascii_digit());
        let slot = match tag {
            "TSeq_gi" if numeric() => &mut current.gi,
            "TSeq_taxid" if numeric() => &mut current.taxid,
            "TSeq_accver" => &mut current.accver,
            "TSeq_sid" => &mut current.sid,
            "TSeq_orgname" => &mut current.orgname,
            "TSeq_defline" => &mut current.defline,
            "TSeq_sequence" => &mut current.sequence,
            _ => return Err(unexpected()),
        };
        *slot = Some(value.to_string());
    }

    if msa.is_empty() {
        return Err(TSeqError::NoSequences);
    }
    Ok(msa)
}
