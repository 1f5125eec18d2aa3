use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use crate::action::{ActionRecord, BlindKind};
use crate::cards::starting_hand;
use crate::game::{Position, Street};
use crate::hand::Hand;

use super::HandPlayerStats;

type Players = BTreeMap<String, HandPlayerStats>;

/// The derivation passes, in the order [`DerivedPass::ORDER`] runs them.
/// Later passes read flags written by earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedPass {
    Vpip,
    Positions,
    Aggression,
    ContinuationBets,
    CheckRaise,
    ThreeAndFourBets,
    Steals,
    StreetsSeen,
    Winnings,
}

impl DerivedPass {
    pub const ORDER: [DerivedPass; 9] = [
        DerivedPass::Vpip,
        DerivedPass::Positions,
        DerivedPass::Aggression,
        DerivedPass::ContinuationBets,
        DerivedPass::CheckRaise,
        DerivedPass::ThreeAndFourBets,
        DerivedPass::Steals,
        DerivedPass::StreetsSeen,
        DerivedPass::Winnings,
    ];

    pub fn run(self, hand: &Hand, players: &mut Players) {
        debug!("hand {}: derived pass {:?}", hand.hand_no(), self);
        match self {
            DerivedPass::Vpip => vpip(hand, players),
            DerivedPass::Positions => positions(hand, players),
            DerivedPass::Aggression => {
                for street in [Street::Preflop, Street::Flop, Street::Turn, Street::River] {
                    aggression(hand, players, street);
                    folds(hand, players, street);
                }
            }
            DerivedPass::ContinuationBets => continuation_bets(hand, players),
            DerivedPass::CheckRaise => check_raise(hand, players),
            DerivedPass::ThreeAndFourBets => three_and_four_bets(hand, players),
            DerivedPass::Steals => steals(hand, players),
            DerivedPass::StreetsSeen => streets_seen(hand, players),
            DerivedPass::Winnings => winnings(hand, players),
        }
    }
}

fn preflop(hand: &Hand) -> Vec<&ActionRecord> {
    hand.timeline(Street::Preflop).collect()
}

/// Array slot of a postflop street column.
fn slot(street: Street) -> Option<usize> {
    street.stat_index().and_then(|i| i.checked_sub(1))
}

fn vpip(hand: &Hand, players: &mut Players) {
    let actions = preflop(hand);
    let vpipers: BTreeSet<&str> = actions
        .iter()
        .filter(|a| a.is_call() || a.is_raise())
        .map(|a| a.player())
        .collect();

    for name in &vpipers {
        if let Some(p) = players.get_mut(*name) {
            p.flags.street0_vpi = true;
        }
    }

    // a walk: the big blind had nothing to decide
    if vpipers.is_empty() {
        let big_blind = actions
            .iter()
            .find(|a| a.blind_kind() == Some(BlindKind::Big))
            .map(|a| a.player());
        if let Some(p) = big_blind.and_then(|bb| players.get_mut(bb)) {
            p.flags.street0_vpi_chance = false;
            p.flags.street0_aggr_chance = false;
        }
    }
}

fn positions(hand: &Hand, players: &mut Players) {
    for seat in hand.seats() {
        let Some(p) = players.get_mut(&seat.player) else {
            continue;
        };
        p.start_stack = seat.starting_stack;
        p.seat_no = Some(seat.seat);
        p.position = seat.position;
        p.start_bounty = seat.starting_bounty;
        p.end_bounty = seat
            .starting_bounty
            .map(|start| hand.end_bounty(&seat.player).unwrap_or(start));

        if let Some(cards) = hand.hole_cards(&seat.player) {
            p.card1 = cards.first().cloned();
            p.card2 = cards.get(1).cloned();
            p.starting_hand = starting_hand(cards);
        }
    }
}

/// Preflop aggressors; postflop, everyone acting after the first bet or raise
/// faced one (the first aggressor included when action returns to them).
fn aggression(hand: &Hand, players: &mut Players, street: Street) {
    let mut aggressors = BTreeSet::new();
    let mut others = BTreeSet::new();
    let mut first_aggression_made = false;

    for action in hand.timeline(street) {
        if first_aggression_made {
            others.insert(action.player());
        }
        if action.is_aggressive() {
            aggressors.insert(action.player());
            first_aggression_made = true;
        }
    }

    match slot(street) {
        None => {
            for name in aggressors {
                if let Some(p) = players.get_mut(name) {
                    p.flags.street0_aggr = true;
                }
            }
        }
        Some(i) => {
            if aggressors.is_empty() {
                return;
            }
            for name in others {
                if let Some(p) = players.get_mut(name) {
                    p.flags.other_raised[i] = true;
                }
            }
        }
    }
}

fn folds(hand: &Hand, players: &mut Players, street: Street) {
    let Some(i) = slot(street) else {
        return;
    };
    for action in hand.timeline(street).filter(|a| a.is_fold()) {
        if let Some(p) = players.get_mut(action.player()) {
            if p.flags.other_raised[i] {
                p.flags.fold_to_other_raised[i] = true;
            }
        }
    }
}

/// Player with the last bet or raise of a street.
fn last_aggressor(hand: &Hand, street: Street) -> Option<&str> {
    hand.timeline(street)
        .filter(|a| a.is_aggressive())
        .last()
        .map(|a| a.player())
}

/// Whether nobody bet or raised before `player` first acted on the street.
fn no_bets_before(hand: &Hand, street: Street, player: &str) -> bool {
    for action in hand.timeline(street) {
        if action.player() == player {
            return true;
        }
        if action.is_aggressive() {
            return false;
        }
    }
    false
}

/// Whether the first action of `player` on the street is a bet.
fn bet_street(hand: &Hand, street: Street, player: &str) -> bool {
    hand.timeline(street)
        .find(|a| a.player() == player)
        .map_or(false, ActionRecord::is_bet)
}

/// Players facing the aggressor's bet and whether their last answer before a
/// raise, or before the aggressor's second action, was a fold.
fn fold_to_aggressor<'a>(
    hand: &'a Hand,
    street: Street,
    aggressor: &str,
) -> BTreeMap<&'a str, bool> {
    let mut aggressor_actions = 0;
    let mut answers = BTreeMap::new();

    for action in hand.timeline(street) {
        if aggressor_actions > 1 {
            break;
        }
        if action.player() == aggressor {
            aggressor_actions += 1;
            continue;
        }
        answers.insert(action.player(), action.is_fold());
        if action.is_raise() {
            break;
        }
    }
    answers
}

fn continuation_bets(hand: &Hand, players: &mut Players) {
    for street in Street::POSTFLOP {
        let (Some(i), Some(previous)) = (slot(street), street.previous()) else {
            continue;
        };
        let Some(aggressor) = last_aggressor(hand, previous) else {
            continue;
        };
        if !no_bets_before(hand, street, aggressor) {
            continue;
        }

        let done = bet_street(hand, street, aggressor);
        if let Some(p) = players.get_mut(aggressor) {
            p.flags.cb_chance[i] = true;
            p.flags.cb_done[i] = done;
        }
        if !done {
            continue;
        }
        for (name, folded) in fold_to_aggressor(hand, street, aggressor) {
            if let Some(p) = players.get_mut(name) {
                p.flags.fold_to_cb_chance[i] = true;
                p.flags.fold_to_cb_done[i] = folded;
            }
        }
    }
}

/// A player who checked and then faced the street's first bet had the chance;
/// raising at that first answer is the check-raise.
fn check_raise(hand: &Hand, players: &mut Players) {
    for street in Street::POSTFLOP {
        let Some(i) = slot(street) else {
            continue;
        };
        let mut checkers = BTreeSet::new();
        let mut answered = BTreeSet::new();
        let mut initial_bettor: Option<&str> = None;

        for action in hand.timeline(street) {
            let name = action.player();
            if action.is_bet() && initial_bettor.is_none() {
                initial_bettor = Some(name);
            } else if action.is_check() && initial_bettor.is_none() {
                checkers.insert(name);
            } else if initial_bettor.is_some()
                && checkers.contains(name)
                && !answered.contains(name)
            {
                if let Some(p) = players.get_mut(name) {
                    p.flags.check_raise_chance[i] = true;
                    p.flags.check_raise_done[i] = action.is_raise();
                }
                answered.insert(name);
            }
        }
    }
}

/// Walks preflop raise levels: after the first raise everyone acting has a
/// 3-bet chance, after the 3-bet a 4-bet chance and a fold-to-3-bet chance,
/// after the 4-bet a fold-to-4-bet chance.
fn three_and_four_bets(hand: &Hand, players: &mut Players) {
    let actions = preflop(hand);
    let mut still_in: BTreeSet<&str> = actions.iter().map(|a| a.player()).collect();
    let mut action_count: HashMap<&str, usize> = HashMap::new();
    let mut bet_level = 1;

    for action in actions {
        let name = action.player();
        let count = action_count.entry(name).or_default();
        *count += 1;
        let first_action = *count == 1;

        let Some(p) = players.get_mut(name) else {
            continue;
        };
        if still_in.len() == 1 && first_action {
            p.flags.street0_aggr_chance = false;
        }
        if action.is_fold() || action.all_in() {
            still_in.remove(name);
        }

        let raised = action.is_raise();
        match bet_level {
            1 => {
                if raised {
                    bet_level += 1;
                }
            }
            2 => {
                p.flags.street0_tb_chance = true;
                if raised {
                    p.flags.street0_tb_done = true;
                    bet_level += 1;
                }
            }
            3 => {
                p.flags.street0_fb_chance = true;
                p.flags.street0_fold_to_3b_chance = true;
                if raised {
                    p.flags.street0_fb_done = true;
                    bet_level += 1;
                } else if action.is_fold() {
                    p.flags.street0_fold_to_3b_done = true;
                }
            }
            4 => {
                p.flags.street0_fold_to_4b_chance = true;
                if action.is_fold() {
                    p.flags.street0_fold_to_4b_done = true;
                }
            }
            _ => {}
        }
    }
}

/// Steal attempts are open raises from the cutoff, button or small blind.
/// Any call or raise from another position before the attempt ends the search,
/// so a limped pot never counts as a steal chance.
fn steals(hand: &Hand, players: &mut Players) {
    let mut steal_attempt = false;

    for action in preflop(hand) {
        let Some(p) = players.get_mut(action.player()) else {
            continue;
        };
        let position = p.position;

        if steal_attempt {
            match position {
                Some(Position::BigBlind) => {
                    p.flags.fold_bb_to_steal_chance = true;
                    p.flags.raise_to_steal_chance = true;
                    p.flags.folded_bb_to_steal = action.is_fold();
                    p.flags.raise_to_steal_done = action.is_raise();
                    break;
                }
                Some(Position::SmallBlind) => {
                    p.flags.fold_sb_to_steal_chance = true;
                    p.flags.raise_to_steal_chance = true;
                    p.flags.folded_sb_to_steal = action.is_fold();
                    p.flags.raise_to_steal_done = action.is_raise();
                    if action.is_call() {
                        break;
                    }
                }
                _ => {}
            }
        }

        let late = position.map_or(false, Position::is_late);
        if !late && (action.is_call() || action.is_raise()) {
            break;
        }
        if late && !steal_attempt && !action.is_blind() {
            p.flags.steal_chance = true;
            if action.is_call() {
                break;
            }
            if action.is_raise() {
                steal_attempt = true;
                p.flags.steal_done = true;
            }
        }
    }
}

/// A dealt street is seen by every player who had not folded before it.
/// Showdown is reached when two or more players never folded.
fn streets_seen(hand: &Hand, players: &mut Players) {
    let never_folded: Vec<&str> = hand
        .seats()
        .iter()
        .map(|s| s.player.as_str())
        .filter(|name| !hand.folded_by(Street::River, name))
        .collect();
    let showdown = never_folded.len() > 1;

    for (name, p) in players.iter_mut() {
        for street in Street::POSTFLOP {
            let (Some(i), Some(previous)) = (slot(street), street.previous()) else {
                continue;
            };
            p.flags.seen[i] = !hand.board(street).is_empty() && !hand.folded_by(previous, name);
        }
        p.flags.saw_showdown = showdown && never_folded.contains(&name.as_str());
        p.flags.won_when_seen_street1 = p.flags.seen[0] && hand.collected(name) > 0;
    }
}

/// Winnings are the pots collected; profit nets out everything put in and
/// every uncalled bet handed back.
fn winnings(hand: &Hand, players: &mut Players) {
    for (name, p) in players.iter_mut() {
        p.winnings = hand.collected(name);
        p.total_profit =
            hand.collected(name) - hand.total_committed(name) + hand.total_returned(name);
    }
}
