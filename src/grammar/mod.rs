//! Site grammars: one implementation per hand history format, selected
//! through a [`GrammarRegistry`] once the site of a source is known.

pub mod pokerstars;
pub mod summary;

use std::fmt;

use log::{error, info};
use regex::Regex;
use serde::Serialize;

use crate::error::{ParseError, SegmentationError};
use crate::game::Street;
use crate::hand::{Hand, HandHeader};
use crate::source::{self, Segmented, SourceKind};

pub use pokerstars::PokerStars;
pub use summary::TourneySummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Site {
    PokerStars,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Site::PokerStars => f.write_str("PokerStars"),
        }
    }
}

/// Result of matching a source blob against a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identified {
    pub site: Site,
    pub kind: SourceKind,
    /// The source is an archive with `Hand #N` divider lines.
    pub archive: bool,
    /// First player dealt visible hole cards, if any.
    pub hero: Option<String>,
}

/// Text zones of one hand, borrowed from the hand text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreetZones<'a> {
    streets: [Option<&'a str>; 5],
    /// Between the last street and the summary, when the hand went to showdown.
    pub showdown: Option<&'a str>,
    pub summary: Option<&'a str>,
    /// Everything from the hole cards marker up to the summary.
    pub play: &'a str,
}

impl<'a> StreetZones<'a> {
    pub fn get(&self, street: Street) -> Option<&'a str> {
        self.streets[street.index()]
    }

    pub fn set(&mut self, street: Street, zone: &'a str) {
        self.streets[street.index()] = Some(zone);
    }

    pub fn present(&self) -> impl Iterator<Item = (Street, &'a str)> + '_ {
        Street::ALL
            .iter()
            .filter_map(|s| self.get(*s).map(|zone| (*s, zone)))
    }
}

/// Capabilities one hand history format has to provide.
pub trait Grammar: Send + Sync {
    fn site(&self) -> Site;

    fn identify(&self, text: &str) -> Option<Identified>;

    /// Pattern separating consecutive hands in a source.
    fn divider(&self) -> &Regex;

    /// Line an archive repeats in front of every hand, if the format has one.
    fn archive_marker(&self) -> Option<&Regex> {
        None
    }

    /// Splits `text[offset..]` into hands. With `archive` set, the archive
    /// marker lines are stripped and hands left empty are dropped.
    fn split_hands(
        &self,
        text: &str,
        offset: usize,
        archive: bool,
    ) -> Result<Segmented, SegmentationError> {
        let mut out = source::split_hands(text, offset, self.divider())?;
        if let Some(marker) = self.archive_marker().filter(|_| archive) {
            out.hands = out
                .hands
                .iter()
                .map(|h| marker.replace_all(h, "").trim().to_string())
                .filter(|h| !h.is_empty())
                .collect();
        }
        Ok(out)
    }

    /// Hand id, stakes, table, timestamp, tournament details, button and seats.
    fn extract_metadata(&self, text: &str) -> Result<HandHeader, ParseError>;

    fn segment_streets<'a>(
        &self,
        hand_no: u64,
        text: &'a str,
    ) -> Result<StreetZones<'a>, ParseError>;

    /// Antes, blinds, hero cards, board and every street's actions in text order.
    fn extract_actions(&self, zones: &StreetZones<'_>, hand: &mut Hand) -> Result<(), ParseError>;

    /// Shown cards, collected pots and bounty transfers.
    fn extract_showdown(&self, zones: &StreetZones<'_>, hand: &mut Hand) -> Result<(), ParseError>;

    fn extract_summary(&self, text: &str, hero: Option<&str>) -> Result<TourneySummary, ParseError>;
}

/// Runs one hand text through a grammar and returns the frozen hand.
pub fn parse_hand(grammar: &dyn Grammar, text: &str) -> Result<Hand, ParseError> {
    let header = grammar.extract_metadata(text)?;
    let mut hand = Hand::new(header, text)?;
    let zones = grammar.segment_streets(hand.hand_no(), text)?;
    grammar.extract_actions(&zones, &mut hand)?;
    grammar.extract_showdown(&zones, &mut hand)?;
    hand.set_positions()?;
    Ok(hand)
}

/// Hands parsed from one batch of hand texts.
#[derive(Debug, Default)]
pub struct Batch {
    pub hands: Vec<Hand>,
    pub errors: Vec<ParseError>,
}

impl Batch {
    pub fn total(&self) -> usize {
        self.hands.len() + self.errors.len()
    }
}

/// Parses every text in order; a failing hand is counted and skipped.
pub fn parse_batch<S: AsRef<str>>(grammar: &dyn Grammar, texts: &[S]) -> Batch {
    info!("Parsing {} hands", texts.len());
    let mut batch = Batch::default();
    for text in texts {
        match parse_hand(grammar, text.as_ref()) {
            Ok(hand) => batch.hands.push(hand),
            Err(e) => {
                error!("{} parse error: {}", grammar.site(), e);
                batch.errors.push(e);
            }
        }
    }
    info!(
        "Read {} hands ({} failed)",
        batch.total(),
        batch.errors.len()
    );
    batch
}

/// Grammars known to this build, looked up by site or by sniffing a source.
pub struct GrammarRegistry {
    grammars: Vec<Box<dyn Grammar>>,
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self {
            grammars: vec![Box::new(PokerStars::new())],
        }
    }
}

impl GrammarRegistry {
    pub fn empty() -> Self {
        Self {
            grammars: Vec::new(),
        }
    }

    pub fn register(&mut self, grammar: Box<dyn Grammar>) {
        self.grammars.retain(|g| g.site() != grammar.site());
        self.grammars.push(grammar);
    }

    pub fn get(&self, site: Site) -> Option<&dyn Grammar> {
        self.grammars
            .iter()
            .find(|g| g.site() == site)
            .map(|g| g.as_ref())
    }

    /// First grammar that recognizes the source, hand histories before summaries.
    pub fn identify(&self, text: &str) -> Option<(&dyn Grammar, Identified)> {
        self.grammars
            .iter()
            .find_map(|g| g.identify(text).map(|id| (g.as_ref(), id)))
    }
}

/// Longest prefix of `text` no longer than `max` bytes.
pub(crate) fn head(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let registry = GrammarRegistry::default();
        assert!(registry.get(Site::PokerStars).is_some());
        assert!(GrammarRegistry::empty().get(Site::PokerStars).is_none());
    }

    #[test]
    fn test_registry_identifies_hand_history() {
        let registry = GrammarRegistry::default();
        let text = "PokerStars Hand #1:  Hold'em No Limit ($0.01/$0.02 USD) - 2024/01/01 10:00:00 ET";
        let (grammar, id) = registry.identify(text).expect("hand history should be recognized");
        assert_eq!(grammar.site(), Site::PokerStars);
        assert_eq!(id.kind, SourceKind::HandHistory);
        assert!(registry.identify("random notes").is_none());
    }

    #[test]
    fn test_head_respects_char_boundaries() {
        assert_eq!(head("€€", 4), "€");
        assert_eq!(head("abc", 10), "abc");
    }
}
