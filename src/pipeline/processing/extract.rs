//! Candidate extraction from free text.
//!
//! This is a best-effort heuristic, not a parser: an ordered list of surface
//! patterns is run over a text block and every match becomes a candidate.
//! Text that matches nothing simply yields no candidates.

use once_cell::sync::Lazy;
use regex::{CaptureMatches, Regex};
use std::collections::HashMap;

use crate::domain::{Candidate, Party};

/// `Jane Smith (D)` and `Jane Q Smith - R`, two or three capitalized words.
static DEFAULT_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"([A-Z][a-z]+ [A-Z][a-z]+(?: [A-Z][a-z]+)?)\s*\(([RDIG])\)",
        r"([A-Z][a-z]+ [A-Z][a-z]+(?: [A-Z][a-z]+)?)\s*-\s*([RDIG])",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Markers that flag every candidate in a block as an incumbent
const INCUMBENCY_MARKERS: [&str; 2] = ["incumbent", "re-election"];

/// Party-letter lookup. Codes missing from the table pass through verbatim.
#[derive(Debug, Clone)]
pub struct PartyTable {
    by_code: HashMap<String, Party>,
}

impl Default for PartyTable {
    fn default() -> Self {
        let by_code = [
            ("R", Party::Republican),
            ("D", Party::Democratic),
            ("I", Party::Independent),
            ("G", Party::Green),
        ]
        .into_iter()
        .map(|(code, party)| (code.to_string(), party))
        .collect();
        Self { by_code }
    }
}

impl PartyTable {
    pub fn party_for(&self, code: &str) -> Party {
        self.by_code
            .get(code)
            .cloned()
            .unwrap_or_else(|| Party::Other(code.to_string()))
    }
}

/// Turns text blocks into candidates using an ordered set of pattern rules.
///
/// Each rule must capture the name as group 1 and the party code as group 2.
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    rules: Vec<Regex>,
    parties: PartyTable,
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        Self::new(PartyTable::default())
    }
}

impl CandidateExtractor {
    pub fn new(parties: PartyTable) -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
            parties,
        }
    }

    pub fn with_rules(rules: Vec<Regex>, parties: PartyTable) -> Self {
        Self { rules, parties }
    }

    /// Scan `text` and lazily yield candidates in rule order, then match order.
    ///
    /// The incumbency flag is decided once for the whole block: if the block
    /// mentions "incumbent" or "re-election" anywhere, every candidate found
    /// in it is marked incumbent.
    pub fn extract<'e, 't>(&'e self, text: &'t str) -> Candidates<'e, 't> {
        let lowered = text.to_lowercase();
        let incumbent = INCUMBENCY_MARKERS.iter().any(|m| lowered.contains(m));

        Candidates {
            text,
            rules: self.rules.iter(),
            current: None,
            parties: &self.parties,
            incumbent,
        }
    }
}

/// Lazy, finite sequence of candidates found in one text block.
/// Once exhausted it stays exhausted; call `extract` again to rescan.
pub struct Candidates<'e, 't> {
    text: &'t str,
    rules: std::slice::Iter<'e, Regex>,
    current: Option<CaptureMatches<'e, 't>>,
    parties: &'e PartyTable,
    incumbent: bool,
}

impl<'e, 't> Iterator for Candidates<'e, 't> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            if let Some(matches) = self.current.as_mut() {
                for caps in matches.by_ref() {
                    let (Some(name), Some(code)) = (caps.get(1), caps.get(2)) else {
                        continue;
                    };
                    return Some(Candidate {
                        name: name.as_str().trim().to_string(),
                        party: self.parties.party_for(code.as_str()),
                        incumbent: self.incumbent,
                    });
                }
            }
            let rule = self.rules.next()?;
            self.current = Some(rule.captures_iter(self.text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_parenthesized_candidate_with_incumbency() {
        let extractor = CandidateExtractor::default();
        let found: Vec<_> = extractor
            .extract("Jane Smith (D), running for re-election")
            .collect();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Jane Smith");
        assert_eq!(found[0].party, Party::Democratic);
        assert!(found[0].incumbent);
    }

    #[test]
    fn test_no_matches_yields_empty_sequence() {
        let extractor = CandidateExtractor::default();
        assert_eq!(extractor.extract("no candidates announced yet").count(), 0);
        assert_eq!(extractor.extract("").count(), 0);
    }

    #[test]
    fn test_rules_apply_in_order() {
        let extractor = CandidateExtractor::default();
        let found: Vec<_> = extractor
            .extract("Mark Allen Brown - R and Lisa Ray (G) are on the ballot")
            .collect();

        // parenthesized rule runs first, dash rule second
        let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Lisa Ray", "Mark Allen Brown"]);
        assert_eq!(found[0].party, Party::Green);
        assert_eq!(found[1].party, Party::Republican);
        assert!(found.iter().all(|c| !c.incumbent));
    }

    #[test]
    fn test_incumbency_applies_to_whole_block() {
        let extractor = CandidateExtractor::default();
        let found: Vec<_> = extractor
            .extract("Jane Smith (D), Incumbent, faces John Doe (R)")
            .collect();

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.incumbent));
    }

    #[test]
    fn test_unknown_code_passes_through() {
        let parties = PartyTable::default();
        assert_eq!(parties.party_for("L"), Party::Other("L".to_string()));

        let rules = vec![Regex::new(r"([A-Z][a-z]+ [A-Z][a-z]+)\s*\(([A-Z])\)").unwrap()];
        let extractor = CandidateExtractor::with_rules(rules, parties);
        let found: Vec<_> = extractor.extract("Sam Lee (L)").collect();
        assert_eq!(found[0].party, Party::Other("L".to_string()));
    }

    #[test]
    fn test_sequence_is_not_restartable_but_rescan_is_fresh() {
        let extractor = CandidateExtractor::default();
        let text = "Ann Bell (I)";
        let mut first = extractor.extract(text);
        assert!(first.next().is_some());
        assert!(first.next().is_none());
        assert!(first.next().is_none());

        assert_eq!(extractor.extract(text).count(), 1);
    }
}
