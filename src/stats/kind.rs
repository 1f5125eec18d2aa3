use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use super::flags::CacheRow;

/// Ratio statistics computed from one aggregation cache row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Vpip,
    Pfr,
    N,
    Steal,
    FoldSbToSteal,
    FoldBbToSteal,
    ThreeBet,
    FourBet,
    RaiseToSteal,
    FoldTo3Bet,
    FoldTo4Bet,
    Cb1,
    Cb2,
    Cb3,
    FoldFreq1,
    FoldFreq2,
    FoldFreq3,
    FoldToCb1,
    FoldToCb2,
    FoldToCb3,
    CheckRaise1,
    CheckRaise2,
    CheckRaise3,
}

impl StatKind {
    pub const ALL: [StatKind; 23] = [
        StatKind::Vpip,
        StatKind::Pfr,
        StatKind::N,
        StatKind::Steal,
        StatKind::FoldSbToSteal,
        StatKind::FoldBbToSteal,
        StatKind::ThreeBet,
        StatKind::FourBet,
        StatKind::RaiseToSteal,
        StatKind::FoldTo3Bet,
        StatKind::FoldTo4Bet,
        StatKind::Cb1,
        StatKind::Cb2,
        StatKind::Cb3,
        StatKind::FoldFreq1,
        StatKind::FoldFreq2,
        StatKind::FoldFreq3,
        StatKind::FoldToCb1,
        StatKind::FoldToCb2,
        StatKind::FoldToCb3,
        StatKind::CheckRaise1,
        StatKind::CheckRaise2,
        StatKind::CheckRaise3,
    ];

    /// Name accepted by [`FromStr`] and used in stat lists.
    pub fn name(self) -> &'static str {
        match self {
            StatKind::Vpip => "vpip",
            StatKind::Pfr => "pfr",
            StatKind::N => "n",
            StatKind::Steal => "steal",
            StatKind::FoldSbToSteal => "f_SB_steal",
            StatKind::FoldBbToSteal => "f_BB_steal",
            StatKind::ThreeBet => "three_B",
            StatKind::FourBet => "four_B",
            StatKind::RaiseToSteal => "raiseToSteal",
            StatKind::FoldTo3Bet => "f_3bet",
            StatKind::FoldTo4Bet => "f_4bet",
            StatKind::Cb1 => "cb1",
            StatKind::Cb2 => "cb2",
            StatKind::Cb3 => "cb3",
            StatKind::FoldFreq1 => "ffreq1",
            StatKind::FoldFreq2 => "ffreq2",
            StatKind::FoldFreq3 => "ffreq3",
            StatKind::FoldToCb1 => "f_cb1",
            StatKind::FoldToCb2 => "f_cb2",
            StatKind::FoldToCb3 => "f_cb3",
            StatKind::CheckRaise1 => "cr1",
            StatKind::CheckRaise2 => "cr2",
            StatKind::CheckRaise3 => "cr3",
        }
    }

    /// Short label printed in front of the percentage.
    pub fn label(self) -> &'static str {
        match self {
            StatKind::ThreeBet => "3B_pf",
            StatKind::FourBet => "4B_pf",
            StatKind::RaiseToSteal => "rts",
            StatKind::FoldTo3Bet => "F3B_pf",
            StatKind::FoldTo4Bet => "F4B_pf",
            StatKind::Cb1 => "cb_1",
            StatKind::Cb2 => "cb_2",
            StatKind::Cb3 => "cb_3",
            StatKind::FoldFreq1 => "ff_1",
            StatKind::FoldFreq2 => "ff_2",
            StatKind::FoldFreq3 => "ff_3",
            StatKind::FoldToCb1 => "f_cb_1",
            StatKind::FoldToCb2 => "f_cb_2",
            StatKind::FoldToCb3 => "f_cb_3",
            StatKind::CheckRaise1 => "cr_1",
            StatKind::CheckRaise2 => "cr_2",
            StatKind::CheckRaise3 => "cr_3",
            other => other.name(),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StatKind::Vpip => "Voluntarily put in preflop %",
            StatKind::Pfr => "Preflop raise %",
            StatKind::N => "Number of hands seen",
            StatKind::Steal => "% steal attempted",
            StatKind::FoldSbToSteal => "% folded SB to steal",
            StatKind::FoldBbToSteal => "% folded BB to steal",
            StatKind::ThreeBet => "% 3 bet preflop",
            StatKind::FourBet => "% 4 bet preflop",
            StatKind::RaiseToSteal => "% raise to steal",
            StatKind::FoldTo3Bet => "% fold to 3 bet preflop",
            StatKind::FoldTo4Bet => "% fold to 4 bet preflop",
            StatKind::Cb1 => "% continuation bet flop",
            StatKind::Cb2 => "% continuation bet turn",
            StatKind::Cb3 => "% continuation bet river",
            StatKind::FoldFreq1 => "% fold frequency flop",
            StatKind::FoldFreq2 => "% fold frequency turn",
            StatKind::FoldFreq3 => "% fold frequency river",
            StatKind::FoldToCb1 => "% fold to continuation bet flop",
            StatKind::FoldToCb2 => "% fold to continuation bet turn",
            StatKind::FoldToCb3 => "% fold to continuation bet river",
            StatKind::CheckRaise1 => "% check-raise flop",
            StatKind::CheckRaise2 => "% check-raise turn",
            StatKind::CheckRaise3 => "% check-raise river",
        }
    }

    /// Cache columns of the (done, chance) pair; `n` counts hands.
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            StatKind::Vpip => ("street0VPI", "street0VPIChance"),
            StatKind::Pfr => ("street0Aggr", "street0AggrChance"),
            StatKind::N => ("n", "n"),
            StatKind::Steal => ("stealDone", "stealChance"),
            StatKind::FoldSbToSteal => ("foldedSBToSteal", "foldSBToStealChance"),
            StatKind::FoldBbToSteal => ("foldedBBToSteal", "foldBBToStealChance"),
            StatKind::ThreeBet => ("street0TBDone", "street0TBChance"),
            StatKind::FourBet => ("street0FBDone", "street0FBChance"),
            StatKind::RaiseToSteal => ("raiseToStealDone", "raiseToStealChance"),
            StatKind::FoldTo3Bet => ("street0FoldTo3BDone", "street0FoldTo3BChance"),
            StatKind::FoldTo4Bet => ("street0FoldTo4BDone", "street0FoldTo4BChance"),
            StatKind::Cb1 => ("street1CBDone", "street1CBChance"),
            StatKind::Cb2 => ("street2CBDone", "street2CBChance"),
            StatKind::Cb3 => ("street3CBDone", "street3CBChance"),
            StatKind::FoldFreq1 => ("foldToOtherRaisedStreet1", "otherRaisedStreet1"),
            StatKind::FoldFreq2 => ("foldToOtherRaisedStreet2", "otherRaisedStreet2"),
            StatKind::FoldFreq3 => ("foldToOtherRaisedStreet3", "otherRaisedStreet3"),
            StatKind::FoldToCb1 => ("foldToStreet1CBDone", "foldToStreet1CBChance"),
            StatKind::FoldToCb2 => ("foldToStreet2CBDone", "foldToStreet2CBChance"),
            StatKind::FoldToCb3 => ("foldToStreet3CBDone", "foldToStreet3CBChance"),
            StatKind::CheckRaise1 => ("street1CheckRaiseDone", "street1CheckRaiseChance"),
            StatKind::CheckRaise2 => ("street2CheckRaiseDone", "street2CheckRaiseChance"),
            StatKind::CheckRaise3 => ("street3CheckRaiseDone", "street3CheckRaiseChance"),
        }
    }

    /// Evaluates the statistic over one cache row.
    pub fn compute(self, row: &CacheRow) -> StatValue {
        let (done_col, chance_col) = self.columns();
        let done = row.get(done_col).unwrap_or_default();
        let chance = row.get(chance_col).unwrap_or_default();
        let value = match self {
            StatKind::N => Some(row.n as f64),
            _ if chance == 0 => None,
            _ => Some(done as f64 / chance as f64),
        };
        StatValue {
            kind: self,
            name: self.name(),
            value,
            done,
            chance,
            description: self.description(),
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stat '{0}'")]
pub struct UnknownStat(pub String);

impl FromStr for StatKind {
    type Err = UnknownStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| UnknownStat(s.to_string()))
    }
}

/// A computed statistic. `value` is a fraction in `0..=1`, or the hand count
/// for [`StatKind::N`]; `None` when there was no chance to do it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatValue {
    #[serde(skip)]
    pub kind: StatKind,
    pub name: &'static str,
    pub value: Option<f64>,
    pub done: u64,
    pub chance: u64,
    pub description: &'static str,
}

impl StatValue {
    /// `vpip=25.0`, `vpip=NA`, `n=12`.
    pub fn labelled(&self) -> String {
        match (self.kind, self.value) {
            (StatKind::N, _) => format!("n={}", self.done),
            (kind, Some(v)) => format!("{}={:3.1}", kind.label(), v * 100.0),
            (kind, None) => format!("{}=NA", kind.label()),
        }
    }

    /// `(3/12)`; `(0/0)` when not applicable, empty for the hand count.
    pub fn ratio(&self) -> String {
        match (self.kind, self.value) {
            (StatKind::N, _) => String::new(),
            (_, Some(_)) => format!("({}/{})", self.done, self.chance),
            (_, None) => "(0/0)".to_string(),
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.kind, self.value) {
            (StatKind::N, _) if self.done >= 10_000 => {
                write!(f, "{:.1}k", self.done as f64 / 1000.0)
            }
            (StatKind::N, _) => write!(f, "{}", self.done),
            (_, Some(v)) => write!(f, "{:3.1}", v * 100.0),
            (_, None) => f.write_str("NA"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatFlags;

    fn row(hands: &[StatFlags]) -> CacheRow {
        let mut total = CacheRow::default();
        for flags in hands {
            total.add(&CacheRow::seed(flags));
        }
        total
    }

    #[test]
    fn test_names_parse_back() {
        for kind in StatKind::ALL {
            assert_eq!(kind.name().parse::<StatKind>(), Ok(kind), "{} should parse", kind);
        }
        assert_eq!(
            "vpipp".parse::<StatKind>(),
            Err(UnknownStat("vpipp".to_string()))
        );
    }

    #[test]
    fn test_every_column_pair_exists() {
        let row = CacheRow::default();
        for kind in StatKind::ALL {
            let (done, chance) = kind.columns();
            assert!(row.get(done).is_some(), "{}: no column {}", kind, done);
            assert!(row.get(chance).is_some(), "{}: no column {}", kind, chance);
        }
    }

    #[test]
    fn test_ratio_of_done_over_chance() {
        let mut entered = StatFlags::initial();
        entered.street0_vpi = true;
        let row = row(&[entered, StatFlags::initial(), StatFlags::initial(), StatFlags::initial()]);

        let vpip = StatKind::Vpip.compute(&row);
        assert_eq!(vpip.value, Some(0.25));
        assert_eq!(vpip.to_string(), "25.0");
        assert_eq!(vpip.labelled(), "vpip=25.0");
        assert_eq!(vpip.ratio(), "(1/4)");
        assert_eq!(vpip.description, "Voluntarily put in preflop %");
    }

    #[test]
    fn test_zero_chance_is_not_applicable() {
        let row = row(&[StatFlags::initial()]);
        let cb = StatKind::Cb2.compute(&row);
        assert_eq!(cb.value, None);
        assert_eq!(cb.to_string(), "NA");
        assert_eq!(cb.labelled(), "cb_2=NA");
        assert_eq!(cb.ratio(), "(0/0)");
    }

    #[test]
    fn test_hand_count_is_never_na() {
        let empty = StatKind::N.compute(&CacheRow::default());
        assert_eq!(empty.to_string(), "0");
        assert_eq!(empty.labelled(), "n=0");
        assert_eq!(empty.ratio(), "");

        let big = CacheRow {
            n: 12_345,
            ..CacheRow::default()
        };
        assert_eq!(StatKind::N.compute(&big).to_string(), "12.3k");
    }
}
