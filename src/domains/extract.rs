//! Extraction of domain sequences from full-length proteins, driven by an
//! hmmscan domain table.
//!
//! Hits of one model are tested against an E-value and a length threshold;
//! passing envelopes are cut out of the protein they were found on. With a
//! linker length set, the passing domains of each protein are also sorted
//! into singles, close pairs and isolated copies.

use tracing::debug;

use super::hmmscan::HmmscanHit;
use super::{DomainError, DomainResult};
use crate::model::{Msa, Sequence};

/// How extracted names tell apart several copies of a domain on one protein.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomainNumbering {
    /// `~number-out_of`
    #[default]
    Tilde,
    /// The number appended directly.
    Digit,
    /// `a` for the first copy, `b` for the second, and so on.
    Letter,
}

impl DomainNumbering {
    fn suffix(self, number: usize, out_of: usize) -> DomainResult<String> {
        Ok(match self {
            DomainNumbering::Tilde => format!("~{}-{}", number, out_of),
            DomainNumbering::Digit => number.to_string(),
            DomainNumbering::Letter => {
                if number > 25 {
                    return Err(DomainError::TooManyForLetters(number));
                }
                char::from(b'a' + (number - 1) as u8).to_string()
            }
        })
    }
}

/// Characters removed from extracted names by `trim_name`.
pub const TRIM_BY: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct ExtractionSettings {
    /// Model (target) name of the domain to extract.
    pub domain_id: String,
    /// Maximal independent E-value.
    pub e_value_threshold: Option<f64>,
    /// Minimal envelope length.
    pub length_threshold: Option<usize>,
    /// Maximal linker length between two copies forming a close pair.
    pub min_linker: Option<i64>,
    pub add_position: bool,
    /// Drop the last [`TRIM_BY`] characters of the name, after the position.
    pub trim_name: bool,
    /// Numbering added when the model hits a protein more than once.
    pub numbering: Option<DomainNumbering>,
    pub add_species: bool,
}

impl ExtractionSettings {
    pub fn new(domain_id: impl Into<String>) -> Self {
        Self {
            domain_id: domain_id.into(),
            ..Self::default()
        }
    }

    fn passes(&self, hit: &HmmscanHit) -> bool {
        self.e_value_threshold.map_or(true, |e| hit.i_e_value <= e)
            && self.length_threshold.map_or(true, |l| hit.env_length() >= l)
    }

    /// Why `hit` failed, e.g. ` iE=0.5 l=12`.
    fn failure_details(&self, hit: &HmmscanHit) -> String {
        let mut details = String::new();
        if self.e_value_threshold.is_some_and(|e| hit.i_e_value > e) {
            details.push_str(&format!(" iE={}", hit.i_e_value));
        }
        if self.length_threshold.is_some_and(|l| hit.env_length() < l) {
            details.push_str(&format!(" l={}", hit.env_length()));
        }
        details
    }
}

/// Position of a passing domain relative to the other passing copies on its
/// protein.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkerClass {
    /// The only passing copy.
    Single,
    /// Within the linker length of at least one neighbour.
    ClosePair,
    /// Further than the linker length from both neighbours.
    Isolated,
}

/// Classifies the passing domains of one protein.
///
/// Domains are put in sequence order (by `ali_from`) first; the returned
/// classes follow that order, which is also the order of the returned hits.
pub fn classify<'a>(hits: &[&'a HmmscanHit], min_linker: i64) -> Vec<(&'a HmmscanHit, LinkerClass)> {
    let mut sorted = hits.to_vec();
    sorted.sort_by_key(|hit| hit.ali_from);
    if sorted.len() == 1 {
        return vec![(sorted[0], LinkerClass::Single)];
    }
    (0..sorted.len())
        .map(|k| {
            let close_to_previous = k > 0 && linker(sorted[k - 1], sorted[k]) <= min_linker;
            let close_to_next = k + 1 < sorted.len() && linker(sorted[k], sorted[k + 1]) <= min_linker;
            let class = if close_to_previous || close_to_next {
                LinkerClass::ClosePair
            } else {
                LinkerClass::Isolated
            };
            (sorted[k], class)
        })
        .collect()
}

/// Residues between two domains in sequence order, negative when they
/// overlap.
fn linker(previous: &HmmscanHit, next: &HmmscanHit) -> i64 {
    next.env_from as i64 - previous.env_to as i64
}

/// Domains sorted by linker class.
#[derive(Debug, Clone, Default)]
pub struct LinkerClasses {
    pub singles: Msa,
    /// Each close pair as one span, from the start of the first copy to the
    /// end of the second.
    pub close_pairs: Msa,
    pub isolated: Msa,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// One sequence per passing domain, in table order.
    pub domains: Msa,
    /// Full proteins with at least one passing domain.
    pub passed: Msa,
    /// Full proteins hit by the model where no domain passed.
    pub failed: Msa,
    /// Proteins of the table never hit by the model.
    pub lacking: Vec<String>,
    /// One line per failing domain.
    pub failures: Vec<String>,
    pub passing_domains: usize,
    pub failing_domains: usize,
    pub max_copy_number: usize,
    /// First protein reaching `max_copy_number`.
    pub max_copy_protein: String,
    pub linker_classes: Option<LinkerClasses>,
}

/// Splits the table into runs of consecutive hits on the same protein.
fn group_by_query(hits: &[HmmscanHit]) -> Vec<&[HmmscanHit]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=hits.len() {
        if i == hits.len() || hits[i].query != hits[start].query {
            groups.push(&hits[start..i]);
            start = i;
        }
    }
    groups
}

struct Extractor<'a> {
    settings: &'a ExtractionSettings,
    proteins: &'a Msa,
}

impl Extractor<'_> {
    fn protein(&self, query: &str) -> DomainResult<&Sequence> {
        Ok(self.proteins.get_by_name_start(query, true)?)
    }

    fn number_suffix(&self, hit: &HmmscanHit, numbering: Option<DomainNumbering>) -> DomainResult<String> {
        match numbering {
            Some(numbering) if hit.out_of != 1 => numbering.suffix(hit.number, hit.out_of),
            _ => Ok(String::new()),
        }
    }

    /// Cuts `from..=to` (1-based) out of the protein and names the piece.
    fn cut(&self, query: &str, from: usize, to: usize, add_position: bool, suffix: &str) -> DomainResult<Sequence> {
        if from < 1 || from >= to {
            return Err(DomainError::Coordinates {
                query: query.to_string(),
                from,
                to,
            });
        }
        let protein = self.protein(query)?;
        let mut piece = protein.subsequence(from - 1, to - 1)?;
        let original = &protein.name;

        let mut name = original.split_whitespace().next().unwrap_or_default().to_string();
        if add_position {
            name.push_str(&format!("_{}-{}", from, to));
        }
        if self.settings.trim_name {
            let keep = name.chars().count().saturating_sub(TRIM_BY);
            name = name.chars().take(keep).collect();
        }
        name.push_str(suffix);
        if self.settings.add_species {
            name.push(' ');
            name.push_str(species(original)?);
        }
        piece.name = name;
        Ok(piece)
    }

    fn cut_domain(&self, hit: &HmmscanHit, add_position: bool, numbering: Option<DomainNumbering>) -> DomainResult<Sequence> {
        if hit.number < 1 || hit.out_of < 1 || hit.number > hit.out_of {
            return Err(DomainError::Numbering {
                query: hit.query.clone(),
                number: hit.number,
                out_of: hit.out_of,
            });
        }
        let suffix = self.number_suffix(hit, numbering)?;
        self.cut(&hit.query, hit.env_from, hit.env_to, add_position, &suffix)
    }

    fn classify_into(&self, passing: &[&HmmscanHit], min_linker: i64, classes: &mut LinkerClasses) -> DomainResult<()> {
        let classified = classify(passing, min_linker);
        for (hit, class) in &classified {
            match class {
                LinkerClass::Single => classes
                    .singles
                    .add_sequence(self.cut_domain(hit, false, Some(DomainNumbering::Tilde))?),
                LinkerClass::Isolated => classes
                    .isolated
                    .add_sequence(self.cut_domain(hit, false, Some(DomainNumbering::Tilde))?),
                LinkerClass::ClosePair => {}
            }
        }
        for pair in classified.windows(2) {
            let (first, second) = (pair[0].0, pair[1].0);
            if linker(first, second) <= min_linker {
                let suffix = format!("~{}+{}-{}", first.number, second.number, second.out_of);
                classes
                    .close_pairs
                    .add_sequence(self.cut(&first.query, first.env_from, second.env_to, false, &suffix)?);
            }
        }
        Ok(())
    }
}

/// `[...]` taken from the last `[` to the last `]` of `name`.
fn species(name: &str) -> DomainResult<&str> {
    match (name.rfind('['), name.rfind(']')) {
        (Some(open), Some(close)) if open < close => Ok(&name[open..=close]),
        _ => Err(DomainError::MissingSpecies(name.to_string())),
    }
}

/// Extracts the domains of `settings.domain_id` listed in `hits` from
/// `proteins`.
///
/// Fails with [`DomainError::NothingExtracted`] when no domain passes.
pub fn extract_domains(hits: &[HmmscanHit], proteins: &Msa, settings: &ExtractionSettings) -> DomainResult<Extraction> {
    let extractor = Extractor { settings, proteins };
    let mut result = Extraction {
        linker_classes: settings.min_linker.map(|_| LinkerClasses::default()),
        ..Extraction::default()
    };

    for group in group_by_query(hits) {
        let query = &group[0].query;
        let target: Vec<&HmmscanHit> = group.iter().filter(|hit| hit.model == settings.domain_id).collect();
        if target.is_empty() {
            result.lacking.push(query.clone());
            continue;
        }

        let mut passing = Vec::new();
        for hit in target {
            if hit.number > result.max_copy_number {
                result.max_copy_number = hit.number;
                result.max_copy_protein = hit.query.clone();
            }
            if settings.passes(hit) {
                result
                    .domains
                    .add_sequence(extractor.cut_domain(hit, settings.add_position, settings.numbering)?);
                result.passing_domains += 1;
                passing.push(hit);
            } else {
                let failure = format!(
                    "{}: {} did not meet threshold(s){}",
                    result.failing_domains,
                    hit.query,
                    settings.failure_details(hit)
                );
                debug!("{}", failure);
                result.failures.push(failure);
                result.failing_domains += 1;
            }
        }

        let protein = extractor.protein(query)?.clone();
        if passing.is_empty() {
            result.failed.add_sequence(protein);
            continue;
        }
        result.passed.add_sequence(protein);

        if let (Some(min_linker), Some(classes)) = (settings.min_linker, result.linker_classes.as_mut()) {
            extractor.classify_into(&passing, min_linker, classes)?;
        }
    }

    if result.passing_domains == 0 {
        return Err(DomainError::NothingExtracted);
    }
    Ok(result)
}
