//! Parser for block-based columnar alignments (Clustal, MUSCLE, PROBCONS
//! and similar).
//!
//! ```text
//! CLUSTAL W (1.83) multiple sequence alignment
//!
//! seq1      ACGT-ACGT
//! seq2      ACGTTACG-
//!           ****.***
//!
//! seq1      TTGA
//! seq2      TTGC
//! ```
//!
//! Blocks are separated by ignorable lines. Within a block a line is one of:
//! - `name residues`: appended to the sequence of that name (matched
//!   case-insensitively), created on first sight;
//! - indented `residues`: appended to the sequence named on the previous line;
//! - a bare `residues` token: appended to the n-th sequence, n being the
//!   line's rank in its block (not allowed in the first block).

use thiserror::Error;

use crate::model::Msa;

/// Errors that can occur while parsing a columnar alignment.
#[derive(Error, Debug)]
pub enum GeneralError {
    #[error("Unexpected line {line}: {text}")]
    UnexpectedLine { line: usize, text: String },

    #[error("First block cannot contain unnamed sequences (line {0})")]
    UnnamedInFirstBlock(usize),

    #[error("No sequences found")]
    NoSequences,
}

/// Result type for columnar alignment parsing.
pub type GeneralResult<T> = Result<T, GeneralError>;

/// Residue-ish characters: `A-Z a-z - ? * _ .`
fn is_residue_char(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '-' | '?' | '*' | '_' | '.')
}

/// A line to skip, marking the end of a block. Matches lines that:
/// - contain no residue-ish character (see [`is_residue_char`]);
/// - start with whitespace followed by `*`, `.` or `:` (conservation lines);
/// - start, after optional whitespace, with `#`, `%`, `//` or `!!`.
pub fn can_ignore(line: &str) -> bool {
    if !line.chars().any(is_residue_char) {
        return true;
    }
    let rest = line.trim_start();
    if rest.len() < line.len() && rest.starts_with(['*', '.', ':']) {
        return true;
    }
    rest.starts_with('#') || rest.starts_with('%') || rest.starts_with("//") || rest.starts_with("!!")
}

/// Header line written by an aligner: `CLUSTAL<ws>`, `MUSCLE<ws>(` or
/// `PROBCONS<ws>`. Only checked on the first line of the input.
pub fn is_program_name_line(line: &str) -> bool {
    after_prefix_and_space(line, "CLUSTAL").is_some()
        || after_prefix_and_space(line, "PROBCONS").is_some()
        || after_prefix_and_space(line, "MUSCLE")
            .map(|rest| rest.starts_with('('))
            .unwrap_or(false)
}

/// What follows `prefix` and one whitespace character.
fn after_prefix_and_space<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(prefix)?;
    let c = rest.chars().next().filter(|c| c.is_whitespace())?;
    Some(&rest[c.len_utf8()..])
}

/// Residue field with every inner whitespace character replaced by `.`.
fn residue_field(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { '.' } else { c })
        .collect()
}

/// Parses a columnar alignment from a string.
pub fn parse_general_str(content: &str) -> GeneralResult<Msa> {
    let mut msa = Msa::new();
    let mut block: Option<usize> = None;
    let mut index_in_block: usize = 0;
    let mut saw_ignorable = true;
    let mut current_name: Option<String> = None;

    for (index, raw) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim_end();

        if can_ignore(line) {
            saw_ignorable = true;
            continue;
        }
        if index == 0 && is_program_name_line(line) {
            continue;
        }

        if saw_ignorable {
            block = Some(block.map_or(0, |b| b + 1));
            index_in_block = 0;
            saw_ignorable = false;
        } else {
            index_in_block += 1;
        }

        let unexpected = || GeneralError::UnexpectedLine {
            line: line_number,
            text: raw.to_string(),
        };

        if line.starts_with(char::is_whitespace) {
            let name = current_name.as_deref().ok_or_else(unexpected)?;
            match msa.find_by_name(name, false, false).as_slice() {
                [i] => msa
                    .get_mut(*i)
                    .map_err(|_| unexpected())?
                    .append(&residue_field(line.trim_start())),
                _ => return Err(unexpected()),
            }
            continue;
        }

        match line.split_once(char::is_whitespace) {
            Some((name, rest)) if !rest.trim_start().is_empty() => {
                let residues = residue_field(rest.trim_start());
                match msa.find_by_name(name, false, false).as_slice() {
                    [] => msa.add(name, &residues),
                    [i] => msa.get_mut(*i).map_err(|_| unexpected())?.append(&residues),
                    _ => return Err(unexpected()),
                }
                current_name = Some(name.to_string());
            }
            _ => {
                if block == Some(0) {
                    return Err(GeneralError::UnnamedInFirstBlock(line_number));
                }
                msa.get_mut(index_in_block)
                    .map_err(|_| unexpected())?
                    .append(line);
                current_name = None;
            }
        }
    }

    if msa.is_empty() {
        return Err(GeneralError::NoSequences);
    }
    Ok(msa)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_ignore() {
        assert!(can_ignore(""));
        assert!(can_ignore("   123  456"));
        assert!(can_ignore("          ****.***:"));
        assert!(can_ignore("# comment"));
        assert!(can_ignore("  % matlab style"));
        assert!(can_ignore("//"));
        assert!(can_ignore("!!AA_MULTIPLE_ALIGNMENT"));
        assert!(!can_ignore("seq1 ACGT"));
        assert!(!can_ignore("*seq ACGT"));
        assert!(!can_ignore("    ACGT"));
    }

    #[test]
    fn test_is_program_name_line() {
        assert!(is_program_name_line("CLUSTAL W (1.83) multiple sequence alignment"));
        assert!(is_program_name_line("MUSCLE (3.8) multiple sequence alignment"));
        assert!(is_program_name_line("PROBCONS version 1.12"));
        assert!(!is_program_name_line("MUSCLE alignment"));
        assert!(!is_program_name_line("CLUSTALX"));
        assert!(!is_program_name_line("seq1 ACGT"));
    }

    #[test]
    fn test_parse_clustal() {
        let content = "CLUSTAL W (1.83) multiple sequence alignment\n\
                       \n\
                       seq1      ACGT-ACGT\n\
                       seq2      ACGTTACG-\n\
                       \x20         ****.***\n\
                       \n\
                       seq1      TTGA\n\
                       SEQ2      TTGC\n";
        let msa = parse_general_str(content).unwrap();
        assert_eq!(msa.sequence_count(), 2);
        assert_eq!(msa.get(0).unwrap().as_str(), "ACGT-ACGTTTGA");
        assert_eq!(msa.get(1).unwrap().name, "seq2");
        assert_eq!(msa.get(1).unwrap().as_str(), "ACGTTACG-TTGC");
        assert!(msa.is_aligned());
    }

    #[test]
    fn test_inner_whitespace_becomes_dot() {
        let msa = parse_general_str("seq1 AC GT  A\n").unwrap();
        assert_eq!(msa.get(0).unwrap().as_str(), "AC.GT..A");
    }

    #[test]
    fn test_indented_continuation() {
        let content = "seq1 ACGT\n    TTTT\nseq2 GGGG\n    CCCC\n";
        let msa = parse_general_str(content).unwrap();
        assert_eq!(msa.get(0).unwrap().as_str(), "ACGTTTTT");
        assert_eq!(msa.get(1).unwrap().as_str(), "GGGGCCCC");
    }

    #[test]
    fn test_unnamed_lines_in_later_blocks() {
        let content = "seq1 ACGT\nseq2 GGGG\n\nTTTT\nCCCC\n";
        let msa = parse_general_str(content).unwrap();
        assert_eq!(msa.get(0).unwrap().as_str(), "ACGTTTTT");
        assert_eq!(msa.get(1).unwrap().as_str(), "GGGGCCCC");
    }

    #[test]
    fn test_unnamed_line_in_first_block() {
        let result = parse_general_str("seq1 ACGT\nTTTT\n");
        assert!(matches!(result, Err(GeneralError::UnnamedInFirstBlock(2))));
    }

    #[test]
    fn test_unnamed_line_beyond_block_size() {
        let result = parse_general_str("seq1 ACGT\n\nTTTT\nCCCC\n");
        assert!(matches!(result, Err(GeneralError::UnexpectedLine { line: 4, .. })));
    }

    #[test]
    fn test_indented_line_without_name() {
        let result = parse_general_str("   ACGT\n");
        assert!(matches!(result, Err(GeneralError::UnexpectedLine { line: 1, .. })));
    }

    #[test]
    fn test_no_sequences() {
        assert!(matches!(parse_general_str("# nothing\n\n"), Err(GeneralError::NoSequences)));
    }
}
