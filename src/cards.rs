use crate::error::ParseErrorKind;

const RANKS: &str = "23456789TJQKA";
const SUITS: &str = "cdhs";

/// Normalizes a rank-then-suit bigram such as `td` to `Td`.
pub fn card(c: &str) -> Result<String, ParseErrorKind> {
    let bad = || ParseErrorKind::BadCard(c.to_string());
    let mut chars = c.chars();
    let (Some(rank), Some(suit), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(bad());
    };
    let (rank, suit) = (rank.to_ascii_uppercase(), suit.to_ascii_lowercase());
    if !RANKS.contains(rank) || !SUITS.contains(suit) {
        return Err(bad());
    }
    Ok(format!("{}{}", rank, suit))
}

/// Splits a bracketed card list such as `Ah Kd 2c` into normalized bigrams.
pub fn split_cards(text: &str) -> Result<Vec<String>, ParseErrorKind> {
    text.split_whitespace().map(card).collect()
}

fn rank_index(c: &str) -> Option<usize> {
    c.chars().next().and_then(|r| RANKS.find(r))
}

/// Starting hand class of two hole cards, highest rank first: `AA`, `AKs`, `T9o`.
pub fn starting_hand(hole: &[String]) -> Option<String> {
    let [a, b] = hole else {
        return None;
    };
    let (ra, rb) = (rank_index(a)?, rank_index(b)?);
    let (hi, lo) = if ra >= rb { (a, b) } else { (b, a) };
    let hi_rank = hi.chars().next()?;
    let lo_rank = lo.chars().next()?;

    if ra == rb {
        return Some(format!("{}{}", hi_rank, lo_rank));
    }
    let suited = hi.chars().nth(1) == lo.chars().nth(1);
    Some(format!(
        "{}{}{}",
        hi_rank,
        lo_rank,
        if suited { "s" } else { "o" }
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card() {
        assert_eq!(card("Ah").unwrap(), "Ah");
        assert_eq!(card("td").unwrap(), "Td");
        assert_eq!(card("2C").unwrap(), "2c");
    }

    #[test]
    fn test_malformed_cards_are_rejected() {
        for text in ["Äh", "hÄ", "A", "Ahh", "Xh", "Az", ""] {
            assert_eq!(
                card(text),
                Err(ParseErrorKind::BadCard(text.to_string())),
                "'{}' is not a card",
                text
            );
        }
        assert!(split_cards("Ah Kd 2€").is_err());
    }

    #[test]
    fn test_starting_hand_classes() {
        let hand = |text: &str| starting_hand(&split_cards(text).unwrap());
        assert_eq!(hand("Ah Ad"), Some("AA".to_string()));
        assert_eq!(hand("Kh Ah"), Some("AKs".to_string()));
        assert_eq!(hand("9c Td"), Some("T9o".to_string()));
        assert_eq!(hand("Ah"), None, "one card is no starting hand");
    }
}
