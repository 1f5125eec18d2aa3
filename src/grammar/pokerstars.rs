use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::action::BlindKind;
use crate::cards::split_cards;
use crate::error::{ParseError, ParseErrorKind};
use crate::game::{GameContext, GameKind, HandInfo, Speed, Street, TourneyInfo};
use crate::hand::{Hand, HandHeader, Seat};
use crate::money::{parse_amount, Amount};
use crate::source::SourceKind;

use super::summary::{self, TourneySummary};
use super::{head, Grammar, Identified, Site, StreetZones};

/// Buy-in and fee in cents plus table size of the known sit & go structures.
const SNG_STRUCTURES: &[(Amount, Amount, u8, Speed)] = &[
    (41, 9, 9, Speed::Turbo),
    (41, 9, 6, Speed::Turbo),
    (82, 18, 9, Speed::Turbo),
    (84, 16, 6, Speed::Turbo),
    (260, 40, 9, Speed::Turbo),
    (260, 40, 6, Speed::Turbo),
    (446, 54, 9, Speed::Turbo),
    (446, 54, 6, Speed::Turbo),
    (892, 108, 9, Speed::Turbo),
    (892, 108, 6, Speed::Turbo),
    (1784, 216, 6, Speed::Turbo),
    (2240, 260, 9, Speed::Turbo),
    (4500, 500, 6, Speed::Turbo),
];

/// Buy-ins, bounties and prize money are always quoted in cents.
const CURRENCY_SCALE: u32 = 2;

const HOLE_CARDS: &str = "*** HOLE CARDS ***";
const FLOP: &str = "*** FLOP ***";
const TURN: &str = "*** TURN ***";
const RIVER: &str = "*** RIVER ***";
const SHOW_DOWN: &str = "*** SHOW DOWN ***";
const SUMMARY: &str = "*** SUMMARY ***";

static RE_SPLIT_HANDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\s?\n){2,}").unwrap());
static RE_IDENTIFY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PokerStars\s(?:Game|Hand)\s\#\d+:").unwrap());
static RE_ARCHIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Hand #\d+\s*$").unwrap());
static RE_HAND_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PokerStars\s(?:Game|Hand)\s\#(?P<HID>\d+):(?P<REST>.*)").unwrap());

static RE_GAME_INFO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xm)
        PokerStars\s(?:Game|Hand)\s\#(?P<HID>\d+):\s
        (?:Tournament\s\#(?P<TOURNO>\d+),\s
            (?P<BIAMT>[$€£][.\d]+)\+?(?P<FEE>[$€£]?[.\d]+)?\+?(?P<BOUNTY>[$€£]?[.\d]+)?
            \s(?P<BICURRENCY>USD|EUR|GBP))?
        \s(?P<GAME>Hold'em)\s(?P<LIMIT>No\sLimit)\s
        (?:-\sLevel\s[IVXLC]+\s)?
        \([$€£]?(?P<SB>[.\d]+)/[$€£]?(?P<BB>[.\d]+)\s?(?P<CASHCURRENCY>USD|EUR|GBP)?\)
        (?:\s(?P<ADM>\[(?:ADM|AAMS)\sID:\s[A-Z\d]+\]))?
        \s-\s(?P<DATETIME>.*$)",
    )
    .unwrap()
});
static RE_DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<Y>\d{4})/(?P<M>\d{2})/(?P<D>\d{2})[\- ]+(?P<H>\d{1,2}):(?P<MIN>\d{2}):(?P<S>\d{2})",
    )
    .unwrap()
});
static RE_HAND_INFO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Table\s'(?P<TABLE>.+?)'\s(?P<MAX>\d+)-max").unwrap());
static RE_BUTTON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Seat #(?P<BUTTON>\d+) is the button").unwrap());
static RE_PLAYER_INFO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^Seat\s(?P<SEAT>\d+):\s(?P<PNAME>.+?)\s\([$€£]?(?P<CASH>[.\d]+)\sin\schips(?:,\s[$€£](?P<BOUNTY>[.\d]+)\sbounty)?\)(?P<SITOUT>\sis\ssitting\sout)?",
    )
    .unwrap()
});

static RE_ANTES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?P<PNAME>.+?):\sposts\sthe\sante\s[$€£]?(?P<ANTE>[.\d]+)").unwrap()
});
static RE_POST_SB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?P<PNAME>.+?):\sposts\ssmall\sblind\s[$€£]?(?P<SB>[.\d]+)").unwrap()
});
static RE_POST_BB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?P<PNAME>.+?):\sposts\sbig\sblind\s[$€£]?(?P<BB>[.\d]+)").unwrap()
});
static RE_HERO_CARDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Dealt\sto\s(?P<PNAME>.+?)\s\[(?P<CARDS>.+?)\]").unwrap());
static RE_BOARD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(?P<CARDS>[^\]]+)\]").unwrap());
static RE_ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^(?P<PNAME>.+?):(?P<ATYPE>\sbets|\schecks|\sraises|\scalls|\sfolds)(?:\s[$€£]?(?P<BET>[.\d]+))?(?:\sto\s[$€£]?(?P<BETTO>[.\d]+))?",
    )
    .unwrap()
});
static RE_UNCALLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^Uncalled\sbet\s\([$€£]?(?P<BET>[.\d]+)\)\sreturned\sto\s(?P<PNAME>.+?)\s*$",
    )
    .unwrap()
});
static RE_COLLECTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^(?P<PNAME>.+?)\scollected\s[$€£]?(?P<POT>[.\d]+)\sfrom\s(?:side\s|main\s)?pot(?:-\d+)?\s*$",
    )
    .unwrap()
});
static RE_BOUNTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^(?P<PNAME>.+?)\swins\s[$€£](?P<BOUNTY>[.\d]+)\sfor\s(?:splitting\sthe\selimination\sof|eliminating)\s.+?\sand\stheir\sown\sbounty\sincreases\sby\s[$€£][.\d]+\sto\s[$€£](?P<ENDBOUNTY>[.\d]+)",
    )
    .unwrap()
});
static RE_SHOWN_CARDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^Seat\s\d+:\s(?P<PNAME>.+?)\s(?:(?:\(button\)\s\(small\sblind\)|\(button\)|\(small\sblind\)|\(big\sblind\))\s)?(?:showed|mucked)\s\[(?P<CARDS>[^\]]*)\]",
    )
    .unwrap()
});

/// Grammar for PokerStars No Limit Hold'em hand histories and tournament summaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct PokerStars;

impl PokerStars {
    pub fn new() -> Self {
        Self
    }
}

fn amount(hand_no: u64, text: &str, scale: u32) -> Result<Amount, ParseError> {
    parse_amount(text, scale).map_err(|kind| ParseError::new(hand_no, kind))
}

fn cards(hand_no: u64, text: &str) -> Result<Vec<String>, ParseError> {
    split_cards(text).map_err(|kind| ParseError::new(hand_no, kind))
}

fn number<T: FromStr>(hand_no: u64, text: &str) -> Result<T, ParseError> {
    text.parse()
        .map_err(|_| ParseError::new(hand_no, ParseErrorKind::BadNumber(text.to_string())))
}

/// First `YYYY/MM/DD HH:MM:SS` timestamp in `text`.
pub(crate) fn parse_start_time(text: &str) -> Option<NaiveDateTime> {
    let c = RE_DATE_TIME.captures(text)?;
    let date = NaiveDate::from_ymd_opt(
        c["Y"].parse().ok()?,
        c["M"].parse().ok()?,
        c["D"].parse().ok()?,
    )?;
    date.and_hms_opt(c["H"].parse().ok()?, c["MIN"].parse().ok()?, c["S"].parse().ok()?)
}

/// Explains why a hand text has no recognizable game line.
fn unmatched_game(text: &str) -> ParseError {
    match RE_HAND_ID.captures(text) {
        Some(c) => {
            let hand_no = c["HID"].parse().unwrap_or_default();
            let game = c["REST"].trim().to_string();
            error!("PokerStars.extract_metadata: unsupported game in hand {}: '{}'", hand_no, game);
            ParseError::new(hand_no, ParseErrorKind::UnsupportedGame(game))
        }
        None => {
            error!("PokerStars.extract_metadata: no game line");
            ParseError::anonymous(ParseErrorKind::MissingAnchor("game info"))
        }
    }
}

fn sng_speed(buy_in: Amount, fee: Amount, max_seats: u8) -> Option<Speed> {
    SNG_STRUCTURES
        .iter()
        .find(|(b, f, m, _)| *b == buy_in && *f == fee && *m == max_seats)
        .map(|(_, _, _, speed)| *speed)
}

fn read_tourney(
    hand_no: u64,
    game: &Captures,
    max_seats: u8,
) -> Result<Option<TourneyInfo>, ParseError> {
    let Some(tour_no) = game.name("TOURNO") else {
        return Ok(None);
    };
    let tour_no: u64 = number(hand_no, tour_no.as_str())?;
    let currency = game
        .name("BICURRENCY")
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ParseError::missing(hand_no, "buy-in currency"))?;
    let base = amount(hand_no, &game["BIAMT"], CURRENCY_SCALE)?;

    // with a bounty the middle amount is the bounty and the last one the fee
    let (fee, ko_bounty) = match (game.name("FEE"), game.name("BOUNTY")) {
        (Some(bounty), Some(fee)) => (
            amount(hand_no, fee.as_str(), CURRENCY_SCALE)?,
            Some(amount(hand_no, bounty.as_str(), CURRENCY_SCALE)?),
        ),
        (Some(fee), None) => (amount(hand_no, fee.as_str(), CURRENCY_SCALE)?, None),
        _ => (0, None),
    };
    let buy_in = base + ko_bounty.unwrap_or_default();

    let is_private = game.name("ADM").is_none();
    let mut speed = if is_private { Speed::Turbo } else { Speed::Regular };
    let mut is_sng = false;
    if let Some(known) = sng_speed(buy_in, fee, max_seats) {
        speed = known;
        is_sng = true;
    }

    Ok(Some(TourneyInfo {
        tour_no,
        currency,
        buy_in,
        fee,
        ko_bounty: ko_bounty.unwrap_or_default(),
        is_ko: ko_bounty.is_some(),
        speed,
        is_private,
        is_sng,
    }))
}

impl Grammar for PokerStars {
    fn site(&self) -> Site {
        Site::PokerStars
    }

    fn identify(&self, text: &str) -> Option<Identified> {
        let start = head(text, 5000);
        if RE_IDENTIFY.is_match(start) {
            let hero = RE_HERO_CARDS
                .captures(start)
                .map(|c| c["PNAME"].to_string());
            return Some(Identified {
                site: Site::PokerStars,
                kind: SourceKind::HandHistory,
                archive: RE_ARCHIVE.is_match(start),
                hero,
            });
        }
        if summary::is_summary(head(text, 10000)) {
            return Some(Identified {
                site: Site::PokerStars,
                kind: SourceKind::TournamentSummary,
                archive: false,
                hero: None,
            });
        }
        None
    }

    fn divider(&self) -> &Regex {
        &RE_SPLIT_HANDS
    }

    fn archive_marker(&self) -> Option<&Regex> {
        Some(&RE_ARCHIVE)
    }

    fn extract_metadata(&self, text: &str) -> Result<HandHeader, ParseError> {
        let game = RE_GAME_INFO.captures(text).ok_or_else(|| unmatched_game(text))?;
        let hand_no: u64 = number(0, &game["HID"])?;

        let (kind, currency) = match game.name("CASHCURRENCY") {
            Some(c) => (GameKind::Cash, c.as_str().to_string()),
            None => (GameKind::Tournament, "CHIP".to_string()),
        };
        let mut context = GameContext {
            kind,
            currency,
            small_blind: 0,
            big_blind: 0,
            ante: 0,
            max_seats: 0,
        };
        let scale = context.scale();
        context.small_blind = amount(hand_no, &game["SB"], scale)?;
        context.big_blind = amount(hand_no, &game["BB"], scale)?;

        let table = RE_HAND_INFO
            .captures(text)
            .ok_or_else(|| ParseError::missing(hand_no, "table"))?;
        context.max_seats = number(hand_no, &table["MAX"])?;

        let tourney = read_tourney(hand_no, &game, context.max_seats)?;
        let table_name = match &tourney {
            Some(t) => {
                let name = &table["TABLE"];
                let table_no = name.split(' ').nth(1).unwrap_or(name);
                format!("Tournament {} Table {}", t.tour_no, table_no)
            }
            None => table["TABLE"].to_string(),
        };

        let start_time = parse_start_time(&game["DATETIME"])
            .ok_or_else(|| ParseError::missing(hand_no, "start time"))?;

        let button = RE_BUTTON
            .captures(text)
            .ok_or_else(|| ParseError::missing(hand_no, "button"))?;
        let button: u8 = number(hand_no, &button["BUTTON"])?;

        let header_zone = text.find(HOLE_CARDS).map_or(text, |end| &text[..end]);
        let mut seats = Vec::new();
        for m in RE_PLAYER_INFO.captures_iter(header_zone) {
            if kind == GameKind::Cash && m.name("SITOUT").is_some() {
                debug!("extract_metadata: {} is sitting out", &m["PNAME"]);
                continue;
            }
            let bounty = match m.name("BOUNTY") {
                Some(b) => Some(amount(hand_no, b.as_str(), CURRENCY_SCALE)?),
                None => None,
            };
            seats.push(
                Seat::new(
                    number(hand_no, &m["SEAT"])?,
                    &m["PNAME"],
                    amount(hand_no, &m["CASH"], scale)?,
                )
                .with_bounty(bounty),
            );
        }
        if seats.is_empty() {
            return Err(ParseError::missing(hand_no, "seats"));
        }

        Ok(HandHeader {
            context,
            info: HandInfo {
                hand_no,
                table_name,
                start_time,
                tourney,
            },
            button,
            seats,
        })
    }

    fn segment_streets<'a>(
        &self,
        hand_no: u64,
        text: &'a str,
    ) -> Result<StreetZones<'a>, ParseError> {
        let hole = text
            .find(HOLE_CARDS)
            .ok_or_else(|| ParseError::missing(hand_no, "hole cards"))?;
        let after = |marker: &str| text[hole..].find(marker).map(|i| hole + i);

        let flop = after(FLOP);
        let turn = after(TURN);
        let river = after(RIVER);
        let show_down = after(SHOW_DOWN);
        let summary = after(SUMMARY);
        let markers = [Some(hole), flop, turn, river, show_down, summary];

        // a zone runs to the next marker present in the text
        let end_of = |i: usize| {
            markers[i + 1..]
                .iter()
                .flatten()
                .copied()
                .find(|m| *m > markers[i].unwrap_or_default())
                .unwrap_or(text.len())
        };

        let mut zones = StreetZones {
            play: &text[hole..summary.unwrap_or(text.len())],
            ..StreetZones::default()
        };
        zones.set(Street::Antes, &text[..hole]);
        for (i, street) in [Street::Preflop, Street::Flop, Street::Turn, Street::River]
            .into_iter()
            .enumerate()
        {
            if let Some(start) = markers[i] {
                zones.set(street, &text[start..end_of(i)]);
            }
        }
        zones.showdown = show_down.map(|start| &text[start..end_of(4)]);
        zones.summary = summary.map(|start| &text[start..]);
        Ok(zones)
    }

    fn extract_actions(&self, zones: &StreetZones<'_>, hand: &mut Hand) -> Result<(), ParseError> {
        let hand_no = hand.hand_no();
        let scale = hand.context().scale();
        let ante_zone = zones.get(Street::Antes).unwrap_or_default();

        let mut observed_ante = None;
        for m in RE_ANTES.captures_iter(ante_zone) {
            let ante = amount(hand_no, &m["ANTE"], scale)?;
            observed_ante.get_or_insert(ante);
            hand.add_ante(&m["PNAME"], ante)?;
        }
        if let Some(ante) = observed_ante {
            hand.amend_ante(ante);
        }

        // every post is kept, in the order it appears
        let mut blinds = Vec::new();
        for (re, kind, group) in [
            (&RE_POST_SB, BlindKind::Small, "SB"),
            (&RE_POST_BB, BlindKind::Big, "BB"),
        ] {
            for m in re.captures_iter(ante_zone) {
                let offset = m.get(0).map_or(0, |g| g.start());
                let posted = amount(hand_no, &m[group], scale)?;
                blinds.push((offset, m["PNAME"].to_string(), kind, posted));
            }
        }
        blinds.sort_by_key(|(offset, ..)| *offset);
        for (_, player, kind, posted) in blinds {
            hand.add_blind(&player, kind, posted)?;
        }

        if let Some(m) = zones.get(Street::Preflop).and_then(|z| RE_HERO_CARDS.captures(z)) {
            hand.set_hero(&m["PNAME"])?;
            hand.add_hole_cards(&m["PNAME"], cards(hand_no, &m["CARDS"])?)?;
        }

        for (street, zone) in zones.present() {
            if street == Street::Antes {
                continue;
            }
            if Street::POSTFLOP.contains(&street) {
                let marker_line = zone.lines().next().unwrap_or_default();
                match RE_BOARD.captures_iter(marker_line).last() {
                    Some(b) => hand.set_community_cards(street, cards(hand_no, &b["CARDS"])?),
                    None => warn!("hand {}: no board cards on the {} line", hand_no, street),
                }
            }
            read_street(hand, street, zone)?;
        }
        Ok(())
    }

    fn extract_showdown(&self, zones: &StreetZones<'_>, hand: &mut Hand) -> Result<(), ParseError> {
        let hand_no = hand.hand_no();
        let scale = hand.context().scale();

        if let Some(summary) = zones.summary {
            for m in RE_SHOWN_CARDS.captures_iter(summary) {
                hand.add_hole_cards(&m["PNAME"], cards(hand_no, &m["CARDS"])?)?;
            }
        }
        for m in RE_COLLECTED.captures_iter(zones.play) {
            hand.add_collected(&m["PNAME"], amount(hand_no, &m["POT"], scale)?)?;
        }
        for m in RE_BOUNTY.captures_iter(zones.play) {
            hand.add_bounty(
                &m["PNAME"],
                amount(hand_no, &m["BOUNTY"], CURRENCY_SCALE)?,
                amount(hand_no, &m["ENDBOUNTY"], CURRENCY_SCALE)?,
            )?;
        }
        Ok(())
    }

    fn extract_summary(
        &self,
        text: &str,
        hero: Option<&str>,
    ) -> Result<TourneySummary, ParseError> {
        summary::parse_summary(text, hero)
    }
}

/// Replays one street's actions in text order, then its uncalled bet return.
fn read_street(hand: &mut Hand, street: Street, zone: &str) -> Result<(), ParseError> {
    let hand_no = hand.hand_no();
    let scale = hand.context().scale();
    let bet = |m: &Captures, group: &'static str| match m.name(group) {
        Some(raw) => amount(hand_no, raw.as_str(), scale),
        None => Err(ParseError::missing(hand_no, "bet amount")),
    };

    for m in RE_ACTION.captures_iter(zone) {
        let player = &m["PNAME"];
        match &m["ATYPE"] {
            " folds" => hand.add_fold(street, player)?,
            " checks" => hand.add_check(street, player)?,
            " calls" => hand.add_call(street, player, bet(&m, "BET")?)?,
            " bets" => hand.add_bet(street, player, bet(&m, "BET")?)?,
            " raises" => hand.add_raise_to(street, player, bet(&m, "BET")?, bet(&m, "BETTO")?)?,
            other => {
                let message = format!("unknown action '{}'", other.trim());
                return Err(ParseError::new(
                    hand_no,
                    ParseErrorKind::InvariantViolation(message),
                ));
            }
        }
    }

    if let Some(m) = RE_UNCALLED.captures(zone) {
        hand.add_uncalled(street, &m["PNAME"], amount(hand_no, &m["BET"], scale)?)?;
    }
    Ok(())
}
