use crate::error::ParseErrorKind;

/// Fixed-point money in the game's minor unit (cents for cash, chips for tournaments).
pub type Amount = i64;

const SYMBOLS: &[char] = &['$', '€', '£'];

/// Parses a money literal such as `€1,250.50` or `1500` into minor units,
/// where `scale` is the number of decimal places of the minor unit.
pub fn parse_amount(text: &str, scale: u32) -> Result<Amount, ParseErrorKind> {
    let bad = || ParseErrorKind::BadAmount(text.to_string());
    let cleaned: String = text
        .trim()
        .trim_start_matches(SYMBOLS)
        .chars()
        .filter(|c| *c != ',')
        .collect();

    let (whole, frac) = match cleaned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(bad());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad());
    }

    // digits beyond the minor unit are only tolerated when they are zero
    let scale = scale as usize;
    let (kept, dropped) = frac.split_at(frac.len().min(scale));
    if dropped.chars().any(|c| c != '0') {
        return Err(bad());
    }

    let mut minor = String::with_capacity(whole.len() + scale);
    minor.push_str(whole);
    minor.push_str(kept);
    for _ in kept.len()..scale {
        minor.push('0');
    }
    if minor.is_empty() {
        return Ok(0);
    }
    minor.parse::<Amount>().map_err(|_| bad())
}

pub fn fmt_money(x: Amount, scale: u32, symbol: &str) -> String {
    let unit = 10_i64.pow(scale);
    let abs_val = x.abs();
    let dollars = abs_val / unit;
    let cents = abs_val % unit;

    let dollars_str = if dollars >= 1000 {
        let mut result = String::new();
        let s = dollars.to_string();
        let len = s.len();
        for (i, c) in s.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                result.push(',');
            }
            result.push(c);
        }
        result
    } else {
        dollars.to_string()
    };

    let formatted = if scale == 0 {
        format!("{}{}", symbol, dollars_str)
    } else {
        format!(
            "{}{}.{:0width$}",
            symbol,
            dollars_str,
            cents,
            width = scale as usize
        )
    };
    if x < 0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_cash() {
        assert_eq!(parse_amount("0.05", 2), Ok(5));
        assert_eq!(parse_amount("€1,250.5", 2), Ok(125_050));
        assert_eq!(parse_amount("10", 2), Ok(1_000));
        assert_eq!(parse_amount(".25", 2), Ok(25));
    }

    #[test]
    fn test_parse_amount_chips() {
        assert_eq!(parse_amount("1500", 0), Ok(1_500));
        assert_eq!(parse_amount("1500.00", 0), Ok(1_500));
    }

    #[test]
    fn test_parse_amount_rejects_sub_unit_and_garbage() {
        assert!(parse_amount("0.125", 2).is_err(), "fraction of a cent must not parse");
        assert!(parse_amount("12.5", 0).is_err(), "fraction of a chip must not parse");
        assert!(parse_amount("abc", 2).is_err());
        assert!(parse_amount("", 2).is_err());
    }

    #[test]
    fn test_fmt_money() {
        assert_eq!(fmt_money(1050, 2, "$"), "$10.50");
        assert_eq!(fmt_money(100_000, 2, "$"), "$1,000.00");
        assert_eq!(fmt_money(5, 2, "€"), "€0.05");
        assert_eq!(fmt_money(-500, 2, "$"), "-$5.00");
        assert_eq!(fmt_money(12_500, 0, ""), "12,500");
    }
}
