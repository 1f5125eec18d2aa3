use std::fmt;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::money::Amount;

/// Betting rounds of a flop game, in dealing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Street {
    Antes,
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    pub const ALL: [Street; 5] = [
        Street::Antes,
        Street::Preflop,
        Street::Flop,
        Street::Turn,
        Street::River,
    ];
    /// Streets with a community card reveal; also the streets numbered 1..=3 by the stats.
    pub const POSTFLOP: [Street; 3] = [Street::Flop, Street::Turn, Street::River];

    pub fn index(self) -> usize {
        self as usize
    }

    /// `street{n}` numbering used by the statistic columns: preflop is 0, river is 3.
    pub fn stat_index(self) -> Option<usize> {
        match self {
            Street::Antes => None,
            Street::Preflop => Some(0),
            Street::Flop => Some(1),
            Street::Turn => Some(2),
            Street::River => Some(3),
        }
    }

    pub fn previous(self) -> Option<Street> {
        match self {
            Street::Antes => None,
            Street::Preflop => Some(Street::Antes),
            Street::Flop => Some(Street::Preflop),
            Street::Turn => Some(Street::Flop),
            Street::River => Some(Street::Turn),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Street::Antes => "ANTES",
            Street::Preflop => "PREFLOP",
            Street::Flop => "FLOP",
            Street::Turn => "TURN",
            Street::River => "RIVER",
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Cash,
    #[serde(rename = "tour")]
    Tournament,
}

/// Game facts fixed when a hand's header is read.
///
/// The only field that may change afterwards is the ante, through
/// [`crate::hand::Hand::amend_ante`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameContext {
    pub kind: GameKind,
    pub currency: String,
    pub small_blind: Amount,
    pub big_blind: Amount,
    pub ante: Amount,
    pub max_seats: u8,
}

impl GameContext {
    /// Decimal places of the minor unit amounts are kept in.
    pub fn scale(&self) -> u32 {
        match self.kind {
            GameKind::Cash => 2,
            GameKind::Tournament => 0,
        }
    }

    pub fn key(&self) -> GameTypeKey {
        GameTypeKey {
            kind: self.kind,
            currency: self.currency.clone(),
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            max_seats: self.max_seats,
            ante: self.ante,
        }
    }
}

/// Identity of a game type in the aggregation cache.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GameTypeKey {
    pub kind: GameKind,
    pub currency: String,
    pub small_blind: Amount,
    pub big_blind: Amount,
    pub max_seats: u8,
    pub ante: Amount,
}

impl fmt::Display for GameTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            GameKind::Cash => "cash",
            GameKind::Tournament => "tour",
        };
        write!(
            f,
            "{} {} {}/{} ante {} {}-max",
            kind, self.currency, self.small_blind, self.big_blind, self.ante, self.max_seats
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Speed {
    Regular,
    Turbo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TourneyInfo {
    pub tour_no: u64,
    pub currency: String,
    /// Buy-in including the knockout bounty, in cents.
    pub buy_in: Amount,
    pub fee: Amount,
    pub ko_bounty: Amount,
    pub is_ko: bool,
    pub speed: Speed,
    pub is_private: bool,
    pub is_sng: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandInfo {
    pub hand_no: u64,
    pub table_name: String,
    pub start_time: NaiveDateTime,
    pub tourney: Option<TourneyInfo>,
}

/// Seat position relative to the button: 0 is the button, counting backwards,
/// with the blinds overriding the numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Seat(u8),
    SmallBlind,
    BigBlind,
}

impl Position {
    /// Cutoff, button or small blind.
    pub fn is_late(self) -> bool {
        matches!(
            self,
            Position::Seat(0) | Position::Seat(1) | Position::SmallBlind
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Position::Seat(n) => write!(f, "{}", n),
            Position::SmallBlind => f.write_str("S"),
            Position::BigBlind => f.write_str("B"),
        }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Position::Seat(n) => serializer.serialize_u8(*n),
            Position::SmallBlind => serializer.serialize_str("S"),
            Position::BigBlind => serializer.serialize_str("B"),
        }
    }
}
