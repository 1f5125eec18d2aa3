//! Per-player statistics derived from a parsed hand.

pub mod derived;
pub mod flags;
pub mod kind;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::game::{GameTypeKey, Position};
use crate::hand::Hand;
use crate::money::Amount;

pub use derived::DerivedPass;
pub use flags::{CacheRow, Columns, StatFlags, COLUMNS};
pub use kind::{StatKind, StatValue, UnknownStat};

/// Descriptive fields and chance/done flags of one player in one hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandPlayerStats {
    pub start_stack: Amount,
    pub start_bounty: Option<Amount>,
    pub end_bounty: Option<Amount>,
    pub position: Option<Position>,
    pub seat_no: Option<u8>,
    pub card1: Option<String>,
    pub card2: Option<String>,
    pub starting_hand: Option<String>,
    pub winnings: Amount,
    pub total_profit: Amount,
    #[serde(flatten)]
    pub flags: StatFlags,
}

impl Default for HandPlayerStats {
    fn default() -> Self {
        Self {
            start_stack: 0,
            start_bounty: None,
            end_bounty: None,
            position: None,
            seat_no: None,
            card1: None,
            card2: None,
            starting_hand: None,
            winnings: 0,
            total_profit: 0,
            flags: StatFlags::initial(),
        }
    }
}

/// Statistics of every seated player of one hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandStats {
    pub hand_no: u64,
    pub game: GameTypeKey,
    pub players: BTreeMap<String, HandPlayerStats>,
}

impl HandStats {
    /// Runs every [`DerivedPass`] in order over a parsed hand.
    pub fn derive(hand: &Hand) -> Self {
        let mut players: BTreeMap<String, HandPlayerStats> = hand
            .seats()
            .iter()
            .map(|s| (s.player.clone(), HandPlayerStats::default()))
            .collect();
        for pass in DerivedPass::ORDER {
            pass.run(hand, &mut players);
        }
        Self {
            hand_no: hand.hand_no(),
            game: hand.context().key(),
            players,
        }
    }

    pub fn player(&self, name: &str) -> Option<&HandPlayerStats> {
        self.players.get(name)
    }

    /// Seat count used as part of the cache key.
    pub fn seats(&self) -> usize {
        self.players.len()
    }
}
