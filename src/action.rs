use serde::Serialize;

use crate::money::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlindKind {
    Small,
    Big,
}

/// One entry of a street's timeline. Money-bearing variants carry `all_in`,
/// true when the action left the player's running stack at exactly zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRecord {
    Ante {
        player: String,
        amount: Amount,
        all_in: bool,
    },
    Blind {
        player: String,
        kind: BlindKind,
        amount: Amount,
        all_in: bool,
    },
    Call {
        player: String,
        amount: Amount,
        all_in: bool,
    },
    BetOpen {
        player: String,
        amount: Amount,
        all_in: bool,
    },
    RaiseTo {
        player: String,
        raise_increment: Amount,
        total_to: Amount,
        called: Amount,
        all_in: bool,
    },
    Fold {
        player: String,
    },
    Check {
        player: String,
    },
    UncalledReturn {
        player: String,
        amount: Amount,
        all_in: bool,
    },
}

impl ActionRecord {
    pub fn player(&self) -> &str {
        match self {
            ActionRecord::Ante { player, .. }
            | ActionRecord::Blind { player, .. }
            | ActionRecord::Call { player, .. }
            | ActionRecord::BetOpen { player, .. }
            | ActionRecord::RaiseTo { player, .. }
            | ActionRecord::Fold { player }
            | ActionRecord::Check { player }
            | ActionRecord::UncalledReturn { player, .. } => player,
        }
    }

    pub fn all_in(&self) -> bool {
        match self {
            ActionRecord::Ante { all_in, .. }
            | ActionRecord::Blind { all_in, .. }
            | ActionRecord::Call { all_in, .. }
            | ActionRecord::BetOpen { all_in, .. }
            | ActionRecord::RaiseTo { all_in, .. }
            | ActionRecord::UncalledReturn { all_in, .. } => *all_in,
            ActionRecord::Fold { .. } | ActionRecord::Check { .. } => false,
        }
    }

    /// Chips moved from the player's stack into the pot by this action.
    pub fn committed(&self) -> Amount {
        match self {
            ActionRecord::Ante { amount, .. }
            | ActionRecord::Blind { amount, .. }
            | ActionRecord::Call { amount, .. }
            | ActionRecord::BetOpen { amount, .. } => *amount,
            ActionRecord::RaiseTo {
                raise_increment,
                called,
                ..
            } => raise_increment + called,
            ActionRecord::Fold { .. }
            | ActionRecord::Check { .. }
            | ActionRecord::UncalledReturn { .. } => 0,
        }
    }

    pub fn returned(&self) -> Amount {
        match self {
            ActionRecord::UncalledReturn { amount, .. } => *amount,
            _ => 0,
        }
    }

    pub fn is_fold(&self) -> bool {
        matches!(self, ActionRecord::Fold { .. })
    }

    pub fn is_check(&self) -> bool {
        matches!(self, ActionRecord::Check { .. })
    }

    pub fn is_call(&self) -> bool {
        matches!(self, ActionRecord::Call { .. })
    }

    pub fn is_bet(&self) -> bool {
        matches!(self, ActionRecord::BetOpen { .. })
    }

    pub fn is_raise(&self) -> bool {
        matches!(self, ActionRecord::RaiseTo { .. })
    }

    /// Bet or raise.
    pub fn is_aggressive(&self) -> bool {
        self.is_bet() || self.is_raise()
    }

    pub fn is_blind(&self) -> bool {
        matches!(self, ActionRecord::Blind { .. })
    }

    pub fn blind_kind(&self) -> Option<BlindKind> {
        match self {
            ActionRecord::Blind { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Uncalled returns are bookkeeping, not a decision taken at the table.
    pub fn is_decision(&self) -> bool {
        !matches!(self, ActionRecord::UncalledReturn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_commits_call_and_increment() {
        let raise = ActionRecord::RaiseTo {
            player: "a".to_string(),
            raise_increment: 40,
            total_to: 60,
            called: 10,
            all_in: false,
        };
        assert_eq!(raise.committed(), 50);
        assert!(raise.is_aggressive());
        assert!(raise.is_decision());
    }

    #[test]
    fn test_uncalled_is_not_a_decision() {
        let ret = ActionRecord::UncalledReturn {
            player: "a".to_string(),
            amount: 40,
            all_in: false,
        };
        assert_eq!(ret.committed(), 0);
        assert_eq!(ret.returned(), 40);
        assert!(!ret.is_decision());
        assert_eq!(ret.player(), "a");
    }
}
