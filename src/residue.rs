//! Residue-level helpers shared by the model, the parsers and the writers.
//!
//! - gap-character classification
//! - residue cleaning (canonical form used for redundancy comparison)
//! - fixed-width name normalization for PHYLIP/NEXUS style output

/// Returns true if the byte is a gap character: any control/space byte
/// (code <= 32), `*`, `-`, `.` or `_`.
#[inline]
pub fn is_gap(code: u8) -> bool {
    code <= 32 || code == b'*' || code == b'-' || code == b'.' || code == b'_'
}

/// Byte code of the ambiguous residue `?`, never counted as an identity.
pub const UNKNOWN_RESIDUE: u8 = b'?';

/// Canonical form of a single residue, `None` when it is dropped.
///
/// Whitespace, digits and `*` are dropped, the ambiguity codes `B J O U Z ?`
/// become `X`, letters are uppercased and anything else becomes `-`.
pub fn clean_residue(c: char) -> Option<char> {
    if c.is_whitespace() || c.is_ascii_digit() || c == '*' {
        return None;
    }
    let upper = c.to_ascii_uppercase();
    Some(match upper {
        'B' | 'J' | 'O' | 'U' | 'Z' | '?' => 'X',
        'A'..='Z' | '-' => upper,
        _ => '-',
    })
}

/// Cleans a residue string into its canonical comparison form, applying
/// [`clean_residue`] to every character.
pub fn clean_residues(residues: &str) -> String {
    residues.chars().filter_map(clean_residue).collect()
}

/// Pads or truncates a name to exactly `width` characters.
///
/// Returns `None` when the name is longer than `width` and `strict` is set,
/// leaving the error reporting to the caller.
pub fn normalize_name(name: &str, width: usize, strict: bool) -> Option<String> {
    let count = name.chars().count();
    if count > width {
        if strict {
            return None;
        }
        Some(name.chars().take(width).collect())
    } else {
        let mut padded = String::with_capacity(width);
        padded.push_str(name);
        padded.extend(std::iter::repeat(' ').take(width - count));
        Some(padded)
    }
}

/// Prepares a name for formats that do not allow blanks: trailing whitespace
/// is dropped and inner whitespace runs become a single `_`.
pub fn underscore_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}
