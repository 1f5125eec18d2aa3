use std::collections::BTreeMap;

use log::{debug, error};
use serde::Serialize;

use crate::action::{ActionRecord, BlindKind};
use crate::error::{ParseError, ParseErrorKind};
use crate::game::{GameContext, HandInfo, Position, Street};
use crate::money::Amount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seat {
    pub seat: u8,
    pub player: String,
    pub starting_stack: Amount,
    /// Filled by [`Hand::set_positions`], never by a grammar.
    pub position: Option<Position>,
    pub starting_bounty: Option<Amount>,
}

impl Seat {
    pub fn new(seat: u8, player: impl Into<String>, starting_stack: Amount) -> Self {
        Self {
            seat,
            player: player.into(),
            starting_stack,
            position: None,
            starting_bounty: None,
        }
    }

    pub fn with_bounty(mut self, bounty: Option<Amount>) -> Self {
        self.starting_bounty = bounty;
        self
    }
}

/// Everything a grammar reads from the header before any action is replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandHeader {
    pub context: GameContext,
    pub info: HandInfo,
    pub button: u8,
    pub seats: Vec<Seat>,
}

type Ledger = BTreeMap<String, Amount>;

/// One hand, built by grammar callbacks during a single parse pass and only
/// read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hand {
    context: GameContext,
    info: HandInfo,
    text: String,
    button: u8,
    seats: Vec<Seat>,
    stacks: Ledger,
    bets: [Ledger; 5],
    actions: [Vec<ActionRecord>; 5],
    board: [Vec<String>; 5],
    hole_cards: BTreeMap<String, Vec<String>>,
    hero: Option<String>,
    collected: Ledger,
    won_bounty: Ledger,
    end_bounty: Ledger,
    ante_amended: bool,
}

impl Hand {
    pub fn new(header: HandHeader, text: impl Into<String>) -> Result<Self, ParseError> {
        let HandHeader {
            context,
            info,
            button,
            seats,
        } = header;
        let mut hand = Self {
            context,
            info,
            text: text.into(),
            button,
            seats: Vec::with_capacity(seats.len()),
            stacks: Ledger::new(),
            bets: Default::default(),
            actions: Default::default(),
            board: Default::default(),
            hole_cards: BTreeMap::new(),
            hero: None,
            collected: Ledger::new(),
            won_bounty: Ledger::new(),
            end_bounty: Ledger::new(),
            ante_amended: false,
        };
        for seat in seats {
            hand.add_player(seat)?;
        }
        Ok(hand)
    }

    fn add_player(&mut self, seat: Seat) -> Result<(), ParseError> {
        debug!(
            "add_player: {} {} ({})",
            seat.seat, seat.player, seat.starting_stack
        );
        if self.stacks.contains_key(&seat.player) {
            return Err(self.violation(format!("player '{}' seated twice", seat.player)));
        }
        self.stacks.insert(seat.player.clone(), seat.starting_stack);
        self.seats.push(seat);
        Ok(())
    }

    fn violation(&self, reason: String) -> ParseError {
        ParseError::new(self.hand_no(), ParseErrorKind::InvariantViolation(reason))
    }

    fn check_player_exists(
        &self,
        player: &str,
        source_call: &'static str,
    ) -> Result<(), ParseError> {
        if self.stacks.contains_key(player) {
            return Ok(());
        }
        error!(
            "Hand.{}: '{}' unknown player: '{}'",
            source_call,
            self.hand_no(),
            player
        );
        Err(ParseError::new(
            self.hand_no(),
            ParseErrorKind::UnknownPlayer {
                player: player.to_string(),
                source_call,
            },
        ))
    }

    /// Takes `amount` from the player's stack and returns whether the stack is now empty.
    fn debit(&mut self, street: Street, player: &str, amount: Amount) -> Result<bool, ParseError> {
        let stack = self.stacks.get(player).copied().unwrap_or_default();
        if amount < 0 || stack - amount < 0 {
            return Err(self.violation(format!(
                "{} cannot put {} from a stack of {} on {}",
                player, amount, stack, street
            )));
        }
        let left = stack - amount;
        self.stacks.insert(player.to_string(), left);
        *self.bets[street.index()]
            .entry(player.to_string())
            .or_default() += amount;
        Ok(left == 0)
    }

    fn push(&mut self, street: Street, record: ActionRecord) {
        self.actions[street.index()].push(record);
    }

    pub fn add_ante(&mut self, player: &str, amount: Amount) -> Result<(), ParseError> {
        debug!("add_ante: {} antes {}", player, amount);
        self.check_player_exists(player, "add_ante")?;

        let all_in = self.debit(Street::Antes, player, amount)?;
        self.push(
            Street::Antes,
            ActionRecord::Ante {
                player: player.to_string(),
                amount,
                all_in,
            },
        );
        Ok(())
    }

    /// Overwrites the context ante with the one observed in the hand text.
    /// Applies at most once per hand; returns whether the context changed.
    pub fn amend_ante(&mut self, observed: Amount) -> bool {
        if self.ante_amended || self.context.ante == observed {
            return false;
        }
        debug!(
            "amend_ante: hand {} ante {} -> {}",
            self.hand_no(),
            self.context.ante,
            observed
        );
        self.context.ante = observed;
        self.ante_amended = true;
        true
    }

    pub fn add_blind(
        &mut self,
        player: &str,
        kind: BlindKind,
        amount: Amount,
    ) -> Result<(), ParseError> {
        debug!("add_blind: {} posts {:?} blind, {}", player, kind, amount);
        self.check_player_exists(player, "add_blind")?;

        let all_in = self.debit(Street::Preflop, player, amount)?;
        self.push(
            Street::Preflop,
            ActionRecord::Blind {
                player: player.to_string(),
                kind,
                amount,
                all_in,
            },
        );
        Ok(())
    }

    pub fn add_call(
        &mut self,
        street: Street,
        player: &str,
        amount: Amount,
    ) -> Result<(), ParseError> {
        debug!("add_call: {} {} calls {}", street, player, amount);
        self.check_player_exists(player, "add_call")?;

        let all_in = self.debit(street, player, amount)?;
        self.push(
            street,
            ActionRecord::Call {
                player: player.to_string(),
                amount,
                all_in,
            },
        );
        Ok(())
    }

    /// Records a raise reported as "raises `raise_increment` to `total_to`".
    ///
    /// The amount called is whatever the total leaves after the increment and
    /// the player's earlier commitments on this street (blinds included).
    pub fn add_raise_to(
        &mut self,
        street: Street,
        player: &str,
        raise_increment: Amount,
        total_to: Amount,
    ) -> Result<(), ParseError> {
        debug!(
            "add_raise_to: {} {} raises {} to {}",
            street, player, raise_increment, total_to
        );
        self.check_player_exists(player, "add_raise_to")?;

        let prior = self.committed(street, player);
        let called = total_to - raise_increment - prior;
        if called < 0 {
            return Err(self.violation(format!(
                "{} raises {} to {} with {} already in",
                player, raise_increment, total_to, prior
            )));
        }
        let all_in = self.debit(street, player, called + raise_increment)?;
        self.push(
            street,
            ActionRecord::RaiseTo {
                player: player.to_string(),
                raise_increment,
                total_to,
                called,
                all_in,
            },
        );
        Ok(())
    }

    pub fn add_bet(
        &mut self,
        street: Street,
        player: &str,
        amount: Amount,
    ) -> Result<(), ParseError> {
        debug!("add_bet: {} {} bets {}", street, player, amount);
        self.check_player_exists(player, "add_bet")?;

        let all_in = self.debit(street, player, amount)?;
        self.push(
            street,
            ActionRecord::BetOpen {
                player: player.to_string(),
                amount,
                all_in,
            },
        );
        Ok(())
    }

    pub fn add_fold(&mut self, street: Street, player: &str) -> Result<(), ParseError> {
        debug!("add_fold: {} {} folds", street, player);
        self.check_player_exists(player, "add_fold")?;
        self.push(
            street,
            ActionRecord::Fold {
                player: player.to_string(),
            },
        );
        Ok(())
    }

    pub fn add_check(&mut self, street: Street, player: &str) -> Result<(), ParseError> {
        debug!("add_check: {} {} checks", street, player);
        self.check_player_exists(player, "add_check")?;
        self.push(
            street,
            ActionRecord::Check {
                player: player.to_string(),
            },
        );
        Ok(())
    }

    /// The only credit to a stack before the pot is awarded.
    pub fn add_uncalled(
        &mut self,
        street: Street,
        player: &str,
        amount: Amount,
    ) -> Result<(), ParseError> {
        debug!("add_uncalled: {} {} uncalled {}", street, player, amount);
        self.check_player_exists(player, "add_uncalled")?;

        if amount < 0 || amount > self.committed(street, player) {
            return Err(self.violation(format!(
                "{} gets {} back on {} but only put in {}",
                player,
                amount,
                street,
                self.committed(street, player)
            )));
        }
        let stack = self.stacks.entry(player.to_string()).or_default();
        *stack += amount;
        let all_in = *stack == 0;
        self.push(
            street,
            ActionRecord::UncalledReturn {
                player: player.to_string(),
                amount,
                all_in,
            },
        );
        Ok(())
    }

    pub fn add_hole_cards(&mut self, player: &str, cards: Vec<String>) -> Result<(), ParseError> {
        debug!("add_hole_cards: {} {:?}", player, cards);
        self.check_player_exists(player, "add_hole_cards")?;
        self.hole_cards.insert(player.to_string(), cards);
        Ok(())
    }

    pub fn set_hero(&mut self, player: &str) -> Result<(), ParseError> {
        self.check_player_exists(player, "set_hero")?;
        self.hero = Some(player.to_string());
        Ok(())
    }

    pub fn set_community_cards(&mut self, street: Street, cards: Vec<String>) {
        debug!("set_community_cards: {} {:?}", street, cards);
        self.board[street.index()] = cards;
    }

    pub fn add_collected(&mut self, player: &str, amount: Amount) -> Result<(), ParseError> {
        debug!("add_collected: {} collected {}", player, amount);
        self.check_player_exists(player, "add_collected")?;
        *self.collected.entry(player.to_string()).or_default() += amount;
        Ok(())
    }

    /// Bounty won for an elimination and the winner's bounty afterwards.
    pub fn add_bounty(&mut self, player: &str, won: Amount, end: Amount) -> Result<(), ParseError> {
        debug!("add_bounty: {} wins {} (now {})", player, won, end);
        self.check_player_exists(player, "add_bounty")?;
        *self.won_bounty.entry(player.to_string()).or_default() += won;
        self.end_bounty.insert(player.to_string(), end);
        Ok(())
    }

    /// Numbers seats from the button (0) backwards through the seating order,
    /// then marks the first small and big blind posters as `S` and `B`.
    pub fn set_positions(&mut self) -> Result<(), ParseError> {
        let n = self.seats.len();
        let button_index = self
            .seats
            .iter()
            .position(|s| s.seat == self.button)
            .ok_or_else(|| self.violation(format!("button seat {} has no player", self.button)))?;

        self.seats[button_index].position = Some(Position::Seat(0));
        let mut index = (button_index + n - 1) % n;
        let mut position = 1u8;
        while index != button_index {
            self.seats[index].position = Some(Position::Seat(position));
            index = (index + n - 1) % n;
            position += 1;
        }

        let first_blind = |kind: BlindKind| {
            self.actions(Street::Preflop)
                .iter()
                .find(|a| a.blind_kind() == Some(kind))
                .map(|a| a.player().to_string())
        };
        let big = first_blind(BlindKind::Big);
        let small = first_blind(BlindKind::Small);

        for (blind, label) in [(big, Position::BigBlind), (small, Position::SmallBlind)] {
            if let Some(player) = blind {
                if let Some(seat) = self.seats.iter_mut().find(|s| s.player == player) {
                    seat.position = Some(label);
                }
            }
        }
        Ok(())
    }

    pub fn hand_no(&self) -> u64 {
        self.info.hand_no
    }

    pub fn context(&self) -> &GameContext {
        &self.context
    }

    pub fn info(&self) -> &HandInfo {
        &self.info
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn button(&self) -> u8 {
        self.button
    }

    /// Seats in the order the hand text lists them.
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, player: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player == player)
    }

    pub fn position(&self, player: &str) -> Option<Position> {
        self.seat(player).and_then(|s| s.position)
    }

    pub fn actions(&self, street: Street) -> &[ActionRecord] {
        &self.actions[street.index()]
    }

    /// Actions taken at the table on a street, without bookkeeping records.
    pub fn timeline(&self, street: Street) -> impl Iterator<Item = &ActionRecord> + '_ {
        self.actions(street).iter().filter(|a| a.is_decision())
    }

    pub fn board(&self, street: Street) -> &[String] {
        &self.board[street.index()]
    }

    pub fn full_board(&self) -> Vec<String> {
        Street::POSTFLOP
            .iter()
            .flat_map(|s| self.board(*s).iter().cloned())
            .collect()
    }

    pub fn hole_cards(&self, player: &str) -> Option<&[String]> {
        self.hole_cards.get(player).map(Vec::as_slice)
    }

    pub fn hero(&self) -> Option<&str> {
        self.hero.as_deref()
    }

    /// Running stack after every recorded action, before the pot is awarded.
    pub fn stack(&self, player: &str) -> Option<Amount> {
        self.stacks.get(player).copied()
    }

    /// Gross chips the player put in on one street.
    pub fn committed(&self, street: Street, player: &str) -> Amount {
        self.bets[street.index()]
            .get(player)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_committed(&self, player: &str) -> Amount {
        Street::ALL.iter().map(|s| self.committed(*s, player)).sum()
    }

    pub fn total_returned(&self, player: &str) -> Amount {
        Street::ALL
            .iter()
            .flat_map(|s| self.actions(*s))
            .filter(|a| a.player() == player)
            .map(ActionRecord::returned)
            .sum()
    }

    /// Chips a street added to the pot, net of uncalled returns.
    pub fn pot_contribution(&self, street: Street) -> Amount {
        self.actions(street)
            .iter()
            .map(|a| a.committed() - a.returned())
            .sum()
    }

    pub fn collected(&self, player: &str) -> Amount {
        self.collected.get(player).copied().unwrap_or_default()
    }

    pub fn final_stack(&self, player: &str) -> Option<Amount> {
        self.stack(player).map(|s| s + self.collected(player))
    }

    pub fn won_bounty(&self, player: &str) -> Option<Amount> {
        self.won_bounty.get(player).copied()
    }

    pub fn end_bounty(&self, player: &str) -> Option<Amount> {
        self.end_bounty.get(player).copied()
    }

    /// Whether a player folded on this street or any earlier one.
    pub fn folded_by(&self, street: Street, player: &str) -> bool {
        Street::ALL
            .iter()
            .take_while(|s| **s <= street)
            .flat_map(|s| self.actions(*s))
            .any(|a| a.is_fold() && a.player() == player)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::game::GameKind;
    use chrono::NaiveDate;

    pub(crate) fn header(seats: &[(u8, &str, Amount)], button: u8) -> HandHeader {
        HandHeader {
            context: GameContext {
                kind: GameKind::Cash,
                currency: "USD".to_string(),
                small_blind: 5,
                big_blind: 10,
                ante: 0,
                max_seats: 6,
            },
            info: HandInfo {
                hand_no: 7,
                table_name: "Test".to_string(),
                start_time: NaiveDate::from_ymd_opt(2024, 1, 2)
                    .and_then(|d| d.and_hms_opt(3, 4, 5))
                    .unwrap(),
                tourney: None,
            },
            button,
            seats: seats
                .iter()
                .map(|(seat, name, stack)| Seat::new(*seat, *name, *stack))
                .collect(),
        }
    }

    fn six_max() -> Hand {
        Hand::new(
            header(
                &[
                    (1, "p1", 1000),
                    (2, "p2", 1000),
                    (3, "p3", 1000),
                    (4, "p4", 1000),
                    (5, "p5", 1000),
                    (6, "p6", 1000),
                ],
                4,
            ),
            "",
        )
        .unwrap()
    }

    #[test]
    fn test_positions_count_back_from_button() {
        let mut hand = six_max();
        hand.add_blind("p5", BlindKind::Small, 5).unwrap();
        hand.add_blind("p6", BlindKind::Big, 10).unwrap();
        hand.set_positions().unwrap();

        assert_eq!(hand.position("p4"), Some(Position::Seat(0)));
        assert_eq!(hand.position("p3"), Some(Position::Seat(1)));
        assert_eq!(hand.position("p2"), Some(Position::Seat(2)));
        assert_eq!(hand.position("p1"), Some(Position::Seat(3)));
        assert_eq!(hand.position("p5"), Some(Position::SmallBlind));
        assert_eq!(hand.position("p6"), Some(Position::BigBlind));
    }

    #[test]
    fn test_positions_are_a_permutation() {
        let mut hand = six_max();
        hand.set_positions().unwrap();

        let mut numbers: Vec<u8> = hand
            .seats()
            .iter()
            .map(|s| match s.position {
                Some(Position::Seat(n)) => n,
                other => panic!("expected a numeric position, got {:?}", other),
            })
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unknown_button_is_fatal() {
        let mut hand = Hand::new(header(&[(1, "a", 100), (2, "b", 100)], 9), "").unwrap();
        let err = hand.set_positions().unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvariantViolation(_)));
    }

    #[test]
    fn test_raise_reconciles_prior_bets() {
        let mut hand = six_max();
        hand.add_blind("p6", BlindKind::Big, 10).unwrap();
        hand.add_raise_to(Street::Preflop, "p6", 30, 40).unwrap();

        match hand.actions(Street::Preflop).last() {
            Some(ActionRecord::RaiseTo { called, .. }) => assert_eq!(*called, 0),
            other => panic!("expected a raise, got {:?}", other),
        }
        assert_eq!(hand.committed(Street::Preflop, "p6"), 40);
        assert_eq!(hand.stack("p6"), Some(960));
    }

    #[test]
    fn test_all_in_flag_when_stack_hits_zero() {
        let mut hand = Hand::new(header(&[(1, "a", 50), (2, "b", 100)], 1), "").unwrap();
        hand.add_bet(Street::Flop, "a", 50).unwrap();
        assert!(hand.actions(Street::Flop)[0].all_in());
        hand.add_call(Street::Flop, "b", 50).unwrap();
        assert!(!hand.actions(Street::Flop)[1].all_in());
    }

    #[test]
    fn test_negative_stack_is_rejected() {
        let mut hand = Hand::new(header(&[(1, "a", 50), (2, "b", 100)], 1), "").unwrap();
        let err = hand.add_bet(Street::Flop, "a", 60).unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvariantViolation(_)));
    }

    #[test]
    fn test_unknown_player_is_rejected_not_inserted() {
        let mut hand = six_max();
        let err = hand.add_call(Street::Preflop, "ghost", 10).unwrap_err();
        assert!(err.is_unknown_player());
        assert!(hand.stack("ghost").is_none());
        assert!(hand.actions(Street::Preflop).is_empty());
    }

    #[test]
    fn test_uncalled_return_credits_stack() {
        let mut hand = six_max();
        hand.add_bet(Street::Flop, "p1", 100).unwrap();
        hand.add_fold(Street::Flop, "p2").unwrap();
        hand.add_uncalled(Street::Flop, "p1", 100).unwrap();

        assert_eq!(hand.stack("p1"), Some(1000));
        assert_eq!(hand.pot_contribution(Street::Flop), 0);
        assert_eq!(hand.timeline(Street::Flop).count(), 2);
    }

    #[test]
    fn test_ante_amended_once() {
        let mut hand = six_max();
        assert!(hand.amend_ante(25));
        assert!(!hand.amend_ante(50), "a second amendment must not apply");
        assert_eq!(hand.context().ante, 25);
    }
}
