//! Domain architecture of a protein and conversion of simple domain tables
//! into forester domain-structure lines.

use std::collections::BTreeMap;

use tracing::warn;

use super::{is_ignorable, DomainError, DomainResult};
use crate::model::Msa;

/// Start keys are stored in ten-thousandths of a position, so one key step
/// is the `0.0001` collision offset.
const KEY_SCALE: u64 = 10_000;

/// NHX field separator.
const SEPARATOR: char = '>';

#[derive(Debug, Clone, PartialEq)]
pub struct ProteinDomain {
    pub name: String,
    /// 1-based, inclusive.
    pub from: usize,
    pub to: usize,
    pub id: String,
    /// Lower is better (an E-value).
    pub confidence: f64,
}

impl ProteinDomain {
    pub fn new(name: impl Into<String>, from: usize, to: usize, confidence: f64) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            id: String::new(),
            confidence,
        }
    }
}

/// Domains of one protein, ordered by start position.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainStructure {
    total_length: usize,
    domains: BTreeMap<u64, ProteinDomain>,
}

impl DomainStructure {
    pub fn new(total_length: usize) -> Self {
        Self {
            total_length,
            domains: BTreeMap::new(),
        }
    }

    pub fn total_length(&self) -> usize {
        self.total_length
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// Domains in key order.
    pub fn domains(&self) -> impl Iterator<Item = &ProteinDomain> {
        self.domains.values()
    }

    /// Adds `domain` at its start position.
    ///
    /// A domain with the same start and end as the one already at that start
    /// triggers a warning; with `overwrite_if_same_range`, the lower
    /// confidence wins and nothing else is stored. In every other case the
    /// key is moved up one step at a time until it is free.
    pub fn add_domain(&mut self, domain: ProteinDomain, overwrite_if_same_range: bool) {
        let mut key = domain.from as u64 * KEY_SCALE;
        if let Some(previous) = self.domains.get(&key) {
            if previous.to == domain.to {
                warn!(
                    "more than one domain at {}-{}: \"{}\" and \"{}\"",
                    domain.from, domain.to, previous.name, domain.name
                );
                if overwrite_if_same_range {
                    if domain.confidence < previous.confidence {
                        self.domains.insert(key, domain);
                    }
                    return;
                }
            }
            while self.domains.contains_key(&key) {
                key += 1;
            }
        }
        self.domains.insert(key, domain);
    }

    /// `total_length>from>to>confidence>name...`, domains in key order.
    pub fn to_nhx(&self) -> String {
        let mut nhx = self.total_length.to_string();
        for domain in self.domains.values() {
            nhx.push_str(&format!(
                "{sep}{}{sep}{}{sep}{}{sep}{}",
                domain.from,
                domain.to,
                format_confidence(domain.confidence),
                domain.name,
                sep = SEPARATOR
            ));
        }
        nhx
    }
}

/// Float text as forester's table tools print it: always a fractional part,
/// and `m.me-XX` with a signed two-digit exponent outside `[1e-4, 1e16)`.
fn format_confidence(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || (1e-4..1e16).contains(&magnitude) {
        return format!("{:?}", value);
    }
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let dot = if mantissa.contains('.') { "" } else { ".0" };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}{}e{}{:02}", mantissa, dot, sign, exponent.abs())
}

/// Builds one domain structure per protein from a `protein domain from to
/// [evalue]` table.
///
/// Domains with an E-value above `e_value_threshold` are skipped; a missing
/// E-value counts as `-1`. Total lengths are read from `proteins`, matched on
/// the first word of their names.
pub fn domains_to_structures(
    table: &str,
    proteins: &Msa,
    e_value_threshold: Option<f64>,
    overwrite_if_same_range: bool,
) -> DomainResult<BTreeMap<String, DomainStructure>> {
    let mut structures: BTreeMap<String, DomainStructure> = BTreeMap::new();

    for (index, text) in table.lines().enumerate() {
        if is_ignorable(text) {
            continue;
        }
        let line = index + 1;
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() < 4 || (e_value_threshold.is_some() && fields.len() < 5) {
            return Err(DomainError::format(line, format!("unexpected format: {}", text.trim())));
        }
        let position = |column: usize| -> DomainResult<usize> {
            fields[column].parse().map_err(|_| {
                DomainError::format(line, format!("\"{}\" is not a valid position", fields[column]))
            })
        };
        let protein = fields[0];
        let from = position(2)?;
        let to = position(3)?;
        let e_value = match fields.get(4) {
            Some(value) => value.parse::<f64>().map_err(|_| {
                DomainError::format(line, format!("\"{}\" is not a valid E-value", value))
            })?,
            None => -1.0,
        };

        let total_length = proteins.get_by_name_start(protein, true)?.len();
        if e_value_threshold.map_or(true, |threshold| e_value <= threshold) {
            structures
                .entry(protein.to_string())
                .or_insert_with(|| DomainStructure::new(total_length))
                .add_domain(ProteinDomain::new(fields[1], from, to, e_value), overwrite_if_same_range);
        }
    }
    Ok(structures)
}

/// One `protein<TAB>nhx` line per protein, sorted by protein name.
pub fn to_forester_lines(structures: &BTreeMap<String, DomainStructure>) -> String {
    structures
        .iter()
        .map(|(protein, structure)| format!("{}\t{}\n", protein, structure.to_nhx()))
        .collect()
}
