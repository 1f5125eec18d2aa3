use chrono::NaiveDateTime;
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{ParseError, ParseErrorKind};
use crate::money::{parse_amount, Amount};

use super::pokerstars::parse_start_time;

static RE_IDENTIFY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PokerStars\sTournament\s\#\d+").unwrap());
static RE_TOURNEY_INFO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xm)
        PokerStars\sTournament\s\#(?P<TOURNO>\d+),\sNo\sLimit\sHold'em\s+
        Buy-In:\s[$€£][.\d]+(?:/[$€£]?[.\d]+){1,2}\s(?:USD|EUR|GBP)\s+
        (?P<ENTRIES>\d+)\splayers\s+
        Total\sPrize\sPool:\s[$€£](?P<PRIZEPOOL>[.,\d]+)\s(?P<CURRENCY>USD|EUR|GBP)\s+
        Tournament\sstarted\s(?P<DATETIME>.*$)",
    )
    .unwrap()
});
static RE_PLAYER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?P<RANK>\d+):\s(?P<PNAME>.+?)(?:\s\[\d+\])?\s\([^)]*\),\s*(?:[$€£](?P<WINNINGS>[.,\d]+))?",
    )
    .unwrap()
});

/// Result of one tournament summary file, seen from the hero's seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TourneySummary {
    pub tour_no: u64,
    pub entries: u32,
    pub currency: String,
    /// In cents.
    pub prize_pool: Amount,
    pub start_time: NaiveDateTime,
    /// Finishing place; `None` when the hero is not listed.
    pub rank: Option<u32>,
    /// In cents.
    pub winnings: Amount,
}

pub(crate) fn is_summary(text: &str) -> bool {
    RE_IDENTIFY.is_match(text)
}

fn bad(kind: ParseErrorKind) -> ParseError {
    ParseError::anonymous(kind)
}

pub(crate) fn parse_summary(text: &str, hero: Option<&str>) -> Result<TourneySummary, ParseError> {
    let info = RE_TOURNEY_INFO.captures(text).ok_or_else(|| {
        error!("PokerStarsSummary.parse_summary: no tournament header");
        bad(ParseErrorKind::MissingAnchor("tournament info"))
    })?;

    let tour_no: u64 = info["TOURNO"]
        .parse()
        .map_err(|_| bad(ParseErrorKind::BadNumber(info["TOURNO"].to_string())))?;
    let entries: u32 = info["ENTRIES"].parse().map_err(|_| {
        ParseError::new(tour_no, ParseErrorKind::BadNumber(info["ENTRIES"].to_string()))
    })?;
    let prize_pool =
        parse_amount(&info["PRIZEPOOL"], 2).map_err(|kind| ParseError::new(tour_no, kind))?;
    let start_time = parse_start_time(&info["DATETIME"])
        .ok_or_else(|| ParseError::missing(tour_no, "start time"))?;

    let mut summary = TourneySummary {
        tour_no,
        entries,
        currency: info["CURRENCY"].to_string(),
        prize_pool,
        start_time,
        rank: None,
        winnings: 0,
    };

    let Some(hero) = hero else {
        return Ok(summary);
    };
    if let Some(m) = RE_PLAYER.captures_iter(text).find(|m| &m["PNAME"] == hero) {
        summary.rank = m["RANK"].parse().ok();
        if let Some(won) = m.name("WINNINGS") {
            summary.winnings = parse_amount(won.as_str(), 2)
                .map_err(|kind| ParseError::new(tour_no, kind))?;
        }
        debug!(
            "parse_summary: {} finished {:?} in tournament {}",
            hero, summary.rank, tour_no
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "PokerStars Tournament #3700000001, No Limit Hold'em
Buy-In: €0.41/€0.09 EUR
9 players
Total Prize Pool: €3.69 EUR
Tournament started 2024/03/09 22:00:00 CET [2024/03/09 16:00:00 ET]

  1: alice (Germany), €1.85 (50%)
  2: bob (Spain), €1.11 (30%)
  3: carol (France), €0.73 (20%)
  4: dan (Italy),

You finished in 2nd place.";

    #[test]
    fn test_summary_identified() {
        assert!(is_summary(SUMMARY));
        assert!(!is_summary("PokerStars Hand #1: Hold'em"));
    }

    #[test]
    fn test_summary_for_hero() {
        let s = parse_summary(SUMMARY, Some("bob")).unwrap();
        assert_eq!(s.tour_no, 3700000001);
        assert_eq!(s.entries, 9);
        assert_eq!(s.prize_pool, 369);
        assert_eq!(s.currency, "EUR");
        assert_eq!(s.start_time.to_string(), "2024-03-09 22:00:00");
        assert_eq!(s.rank, Some(2));
        assert_eq!(s.winnings, 111);
    }

    #[test]
    fn test_summary_out_of_the_money() {
        let s = parse_summary(SUMMARY, Some("dan")).unwrap();
        assert_eq!(s.rank, Some(4));
        assert_eq!(s.winnings, 0, "no prize line means nothing won");
    }

    #[test]
    fn test_summary_without_hero() {
        let s = parse_summary(SUMMARY, None).unwrap();
        assert_eq!(s.rank, None);
        assert!(parse_summary("nothing here", Some("bob")).is_err());
    }
}
