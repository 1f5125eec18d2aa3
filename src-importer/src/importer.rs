use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hand_stats::grammar::TourneySummary;
use hand_stats::money::fmt_money;
use hand_stats::source::normalize;
use hand_stats::{
    parse_hand, store_hand, Grammar, GrammarRegistry, HandStats, MemoryCache, ParseError, Site,
    SourceKind, StatKind, StatValue,
};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{ImportConfig, SeatsStyle};

/// Counts of one import call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub stored: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub summaries: usize,
}

impl Tally {
    pub fn merge(&mut self, other: Tally) {
        self.stored += other.stored;
        self.duplicates += other.duplicates;
        self.errors += other.errors;
        self.summaries += other.summaries;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub player: String,
    pub stats: Vec<StatValue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub hero: Option<String>,
    pub players: Vec<PlayerReport>,
    pub summaries: Vec<TourneySummary>,
}

impl Report {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for p in &self.players {
            let marker = if self.hero.as_deref() == Some(p.player.as_str()) { "*" } else { " " };
            let _ = write!(out, "{}{:<20}", marker, p.player);
            for stat in &p.stats {
                let _ = write!(out, " {}", stat.labelled());
                let ratio = stat.ratio();
                if !ratio.is_empty() {
                    let _ = write!(out, " {}", ratio);
                }
            }
            out.push('\n');
        }
        for s in &self.summaries {
            let rank = s.rank.map_or_else(|| "-".to_string(), |r| r.to_string());
            let _ = writeln!(
                out,
                "Tournament #{}: finished {} of {}, won {} {} (prize pool {} {})",
                s.tour_no,
                rank,
                s.entries,
                fmt_money(s.winnings, 2, ""),
                s.currency,
                fmt_money(s.prize_pool, 2, ""),
                s.currency
            );
        }
        out
    }
}

/// Reads hand history files into a [`MemoryCache`], resuming each file where
/// the previous read stopped.
pub struct Importer {
    registry: GrammarRegistry,
    cache: MemoryCache,
    offsets: HashMap<PathBuf, usize>,
    seen: HashSet<(Site, u64)>,
    summaries: Vec<TourneySummary>,
    hero: Option<String>,
    /// Seat count of the hero's latest table.
    hero_seats: Option<u8>,
    parallel: bool,
}

impl Importer {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            registry: GrammarRegistry::default(),
            cache: MemoryCache::new(),
            offsets: HashMap::new(),
            seen: HashSet::new(),
            summaries: Vec::new(),
            hero: config.hero.clone(),
            hero_seats: None,
            parallel: config.parallel,
        }
    }

    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }

    pub fn hero(&self) -> Option<&str> {
        self.hero.as_deref()
    }

    pub fn offset(&self, path: &Path) -> Option<usize> {
        self.offsets.get(path).copied()
    }

    pub fn import_file(&mut self, path: &Path) -> Result<Tally> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let raw = String::from_utf8_lossy(&bytes);
        self.import_text(path, &raw)
    }

    /// Imports whatever `raw` holds past the offset recorded for `path`.
    pub fn import_text(&mut self, path: &Path, raw: &str) -> Result<Tally> {
        let text = normalize(raw);
        let mut tally = Tally::default();

        let Some((grammar, identified)) = self.registry.identify(&text) else {
            warn!("Skipping {}: no grammar recognizes it", path.display());
            return Ok(tally);
        };
        if self.hero.is_none() {
            self.hero = identified.hero.clone();
        }

        if identified.kind == SourceKind::TournamentSummary {
            let summary = grammar
                .extract_summary(&text, self.hero.as_deref())
                .with_context(|| format!("Bad tournament summary {}", path.display()))?;
            if self.summaries.iter().all(|s| s.tour_no != summary.tour_no) {
                info!("Read summary of tournament {}", summary.tour_no);
                self.summaries.push(summary);
                tally.summaries += 1;
            }
            return Ok(tally);
        }

        let offset = self.offsets.get(path).copied().unwrap_or_default();
        let segmented = grammar
            .split_hands(&text, offset, identified.archive)
            .with_context(|| format!("Failed to split {}", path.display()))?;
        self.offsets.insert(path.to_path_buf(), segmented.offset);
        debug!(
            "{}: {} hands past offset {}",
            path.display(),
            segmented.hands.len(),
            offset
        );

        let derive = |text: &String| -> Result<HandStats, ParseError> {
            parse_hand(grammar, text).map(|hand| HandStats::derive(&hand))
        };
        let results: Vec<Result<HandStats, ParseError>> = if self.parallel {
            segmented.hands.par_iter().map(derive).collect()
        } else {
            segmented.hands.iter().map(derive).collect()
        };

        let site = grammar.site();
        for result in results {
            let stats = match result {
                Ok(stats) => stats,
                Err(e) => {
                    error!("{} parse error in {}: {}", site, path.display(), e);
                    tally.errors += 1;
                    continue;
                }
            };
            if !self.seen.insert((site, stats.hand_no)) {
                debug!("Hand {} already imported", stats.hand_no);
                tally.duplicates += 1;
                continue;
            }
            store_hand(&self.cache, &stats)?;
            if let Some(hero) = self.hero.as_deref() {
                if stats.player(hero).is_some() {
                    self.hero_seats = u8::try_from(stats.seats()).ok();
                }
            }
            tally.stored += 1;
        }

        info!(
            "Imported {}: {} stored, {} duplicates, {} errors",
            path.display(),
            tally.stored,
            tally.duplicates,
            tally.errors
        );
        Ok(tally)
    }

    pub fn report(&self, kinds: &[StatKind], style: SeatsStyle) -> Result<Report> {
        let seats = match style {
            SeatsStyle::All => None,
            SeatsStyle::Exact => self.hero_seats,
        };
        let mut players = Vec::new();
        for (name, id) in self.cache.players()? {
            let row = self.cache.totals(id, seats)?;
            if row.n == 0 {
                continue;
            }
            players.push(PlayerReport {
                player: name,
                stats: kinds.iter().map(|k| k.compute(&row)).collect(),
            });
        }
        Ok(Report {
            hero: self.hero.clone(),
            players,
            summaries: self.summaries.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hand_stats::CacheStore;

    const HAND_ONE: &str = "PokerStars Hand #250000000101:  Hold'em No Limit ($0.05/$0.10 USD) - 2024/03/09 21:15:04 ET
Table 'Alcyone III' 6-max Seat #1 is the button
Seat 1: alice ($10.00 in chips)
Seat 2: bob ($10.00 in chips)
Seat 3: carol ($10.00 in chips)
bob: posts small blind $0.05
carol: posts big blind $0.10
*** HOLE CARDS ***
Dealt to alice [As 9s]
alice: raises $0.20 to $0.30
bob: folds
carol: folds
Uncalled bet ($0.20) returned to alice
alice collected $0.25 from pot
alice: doesn't show hand
*** SUMMARY ***
Total pot $0.25 | Rake $0
Seat 1: alice (button) collected ($0.25)
Seat 2: bob (small blind) folded before Flop
Seat 3: carol (big blind) folded before Flop";

    const HAND_TWO: &str = "PokerStars Hand #250000000102:  Hold'em No Limit ($0.05/$0.10 USD) - 2024/03/09 21:16:10 ET
Table 'Alcyone III' 6-max Seat #2 is the button
Seat 1: alice ($10.25 in chips)
Seat 2: bob ($9.95 in chips)
Seat 3: carol ($9.90 in chips)
carol: posts small blind $0.05
alice: posts big blind $0.10
*** HOLE CARDS ***
Dealt to alice [7h 2c]
bob: calls $0.10
carol: folds
alice: checks
*** FLOP *** [Kd 8c 3h]
alice: checks
bob: bets $0.20
alice: folds
Uncalled bet ($0.20) returned to bob
bob collected $0.25 from pot
bob: doesn't show hand
*** SUMMARY ***
Total pot $0.25 | Rake $0
Board [Kd 8c 3h]
Seat 1: alice (big blind) folded on the Flop
Seat 2: bob (button) collected ($0.25)
Seat 3: carol (small blind) folded before Flop";

    fn config() -> ImportConfig {
        ImportConfig {
            parallel: false,
            ..ImportConfig::default()
        }
    }

    #[test]
    fn test_import_resumes_at_offset() {
        let mut importer = Importer::new(&config());
        let path = Path::new("table.txt");

        let first = importer.import_text(path, HAND_ONE).unwrap();
        assert_eq!(first.stored, 1);
        assert_eq!(importer.offset(path), Some(normalize(HAND_ONE).len()));

        let grown = format!("{}\n\n\n{}\n", HAND_ONE, HAND_TWO);
        let second = importer.import_text(path, &grown).unwrap();
        assert_eq!(second.stored, 1, "only the appended hand is new");
        assert_eq!(second.duplicates, 0);
        assert_eq!(importer.hero(), Some("alice"));
    }

    #[test]
    fn test_duplicate_hands_are_counted_once() {
        let mut importer = Importer::new(&config());
        importer.import_text(Path::new("a.txt"), HAND_ONE).unwrap();
        let again = importer.import_text(Path::new("b.txt"), HAND_ONE).unwrap();

        assert_eq!(again.stored, 0);
        assert_eq!(again.duplicates, 1);
        let alice = importer.cache().player_id("alice").unwrap();
        assert_eq!(importer.cache().totals(alice, None).unwrap().n, 1);
    }

    #[test]
    fn test_bad_hand_does_not_stop_the_file() {
        let mut importer = Importer::new(&config());
        let broken = HAND_TWO.replace("*** HOLE CARDS ***\n", "");
        let text = format!("{}\n\n\n{}", broken, HAND_ONE);

        let tally = importer.import_text(Path::new("mixed.txt"), &text).unwrap();
        assert_eq!(tally.errors, 1);
        assert_eq!(tally.stored, 1);
    }

    #[test]
    fn test_malformed_card_does_not_stop_a_parallel_import() {
        let mut importer = Importer::new(&ImportConfig::default());
        let broken = HAND_ONE.replace("Dealt to alice [As 9s]", "Dealt to alice [Äs 9s]");
        let text = format!("{}\n\n\n{}", broken, HAND_TWO);

        let tally = importer.import_text(Path::new("mixed.txt"), &text).unwrap();
        assert_eq!(tally.errors, 1, "the bad card fails its own hand");
        assert_eq!(tally.stored, 1, "the other hand is still stored");
    }

    #[test]
    fn test_archive_markers_are_stripped() {
        let mut importer = Importer::new(&config());
        let text = format!("Hand #1\n{}\n\n\n\nHand #2\n{}\n", HAND_ONE, HAND_TWO);

        let tally = importer.import_text(Path::new("archive.txt"), &text).unwrap();
        assert_eq!(tally.stored, 2);
        assert_eq!(tally.errors, 0, "marker lines must not reach the parser");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let text = format!("{}\n\n\n{}", HAND_ONE, HAND_TWO);
        let kinds = StatKind::ALL.to_vec();

        let mut sequential = Importer::new(&config());
        sequential.import_text(Path::new("t.txt"), &text).unwrap();
        let mut parallel = Importer::new(&ImportConfig::default());
        parallel.import_text(Path::new("t.txt"), &text).unwrap();

        let a = serde_json::to_value(sequential.report(&kinds, SeatsStyle::All).unwrap()).unwrap();
        let b = serde_json::to_value(parallel.report(&kinds, SeatsStyle::All).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_report_stats() {
        let mut importer = Importer::new(&config());
        let text = format!("{}\n\n\n{}", HAND_ONE, HAND_TWO);
        importer.import_text(Path::new("t.txt"), &text).unwrap();

        let report = importer
            .report(&[StatKind::N, StatKind::Vpip, StatKind::Steal], SeatsStyle::Exact)
            .unwrap();
        let alice = report
            .players
            .iter()
            .find(|p| p.player == "alice")
            .expect("alice is reported");
        assert_eq!(alice.stats[0].to_string(), "2");
        assert_eq!(alice.stats[1].labelled(), "vpip=50.0");
        assert_eq!(alice.stats[2].ratio(), "(1/1)");

        let text = report.to_text();
        assert!(text.contains("*alice"), "hero is marked: {}", text);
        assert!(text.contains("steal=100.0 (1/1)"));
    }

    #[test]
    fn test_import_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hh.txt");
        fs::write(&path, HAND_ONE.replace('\n', "\r\n")).unwrap();

        let mut importer = Importer::new(&config());
        let tally = importer.import_file(&path).unwrap();
        assert_eq!(tally.stored, 1);
        assert!(importer.import_file(&dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_unknown_source_is_skipped() {
        let mut importer = Importer::new(&config());
        let tally = importer.import_text(Path::new("notes.txt"), "shopping list").unwrap();
        assert_eq!(tally, Tally::default());
        assert_eq!(importer.offset(Path::new("notes.txt")), None);
    }
}
