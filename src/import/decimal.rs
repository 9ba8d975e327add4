//! Locale tolerant parsing of price cells into exact decimals.
//!
//! Three conventions are tried in a fixed order and the first that accepts the
//! text wins: invariant (`1,234.56`), Spanish (`1.234,56`) and a sanitized form
//! where spaces and periods are dropped and commas become the decimal point.
//! Each convention accepts surrounding whitespace, a leading or trailing sign,
//! parentheses for negatives, group separators in the integer part, an exponent
//! and the convention's currency symbol.

use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::LazyLock;

/// Most fractional digits kept, longer fractions are rounded.
const MAX_SCALE: i64 = 28;

/// Largest magnitude accepted, anything above is treated as unparseable.
static MAX_VALUE: LazyLock<BigDecimal> =
    LazyLock::new(|| BigDecimal::from_str("79228162514264337593543950335").expect("Hardcode decimal"));

/// Separators and currency symbol of a number format culture.
#[derive(Copy, Clone, Debug)]
pub(crate) struct NumberConvention {
    decimal_separator: char,
    group_separator: char,
    currency_symbol: &'static str,
}

pub(crate) const INVARIANT: NumberConvention = NumberConvention {
    decimal_separator: '.',
    group_separator: ',',
    currency_symbol: "¤",
};

pub(crate) const SPANISH: NumberConvention = NumberConvention {
    decimal_separator: ',',
    group_separator: '.',
    currency_symbol: "€",
};

type Strategy = fn(&str) -> Option<BigDecimal>;

const STRATEGIES: [Strategy; 3] = [parse_invariant, parse_spanish, parse_sanitized];

/// Parses cell text into an exact decimal, or `None` when no convention accepts it.
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    STRATEGIES.iter().find_map(|strategy| strategy(text))
}

fn parse_invariant(text: &str) -> Option<BigDecimal> {
    INVARIANT.parse(text)
}

fn parse_spanish(text: &str) -> Option<BigDecimal> {
    SPANISH.parse(text)
}

fn parse_sanitized(text: &str) -> Option<BigDecimal> {
    let sanitized = text.replace(' ', "").replace('.', "").replace(',', ".");
    INVARIANT.parse(&sanitized)
}

fn is_white(character: char) -> bool {
    matches!(character, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

impl NumberConvention {
    pub(crate) fn parse(&self, text: &str) -> Option<BigDecimal> {
        let mut rest = text.trim_matches(is_white);
        let mut negative = false;
        let mut signed = false;
        let mut parenthesized = false;
        let mut closed = false;
        let mut currency = false;

        loop {
            if !currency && rest.starts_with(self.currency_symbol) {
                currency = true;
                rest = &rest[self.currency_symbol.len()..];
            } else if !signed && !parenthesized && (rest.starts_with('-') || rest.starts_with('+')) {
                signed = true;
                negative = rest.starts_with('-');
                rest = &rest[1..];
            } else if !signed && !parenthesized && rest.starts_with('(') {
                parenthesized = true;
                negative = true;
                rest = &rest[1..];
            } else {
                break;
            }
            rest = rest.trim_start_matches(is_white);
        }

        loop {
            if !currency && rest.ends_with(self.currency_symbol) {
                currency = true;
                rest = &rest[..rest.len() - self.currency_symbol.len()];
            } else if !signed && !parenthesized && (rest.ends_with('-') || rest.ends_with('+')) {
                signed = true;
                negative = rest.ends_with('-');
                rest = &rest[..rest.len() - 1];
            } else if parenthesized && !closed && rest.ends_with(')') {
                closed = true;
                rest = &rest[..rest.len() - 1];
            } else {
                break;
            }
            rest = rest.trim_end_matches(is_white);
        }
        if parenthesized != closed {
            return None;
        }

        let mut integer = String::new();
        let mut fraction = String::new();
        let mut exponent = 0i64;
        let mut seen_decimal = false;
        for (index, character) in rest.char_indices() {
            match character {
                '0'..='9' if seen_decimal => fraction.push(character),
                '0'..='9' => integer.push(character),
                _ if character == self.decimal_separator && !seen_decimal => seen_decimal = true,
                _ if character == self.group_separator && !seen_decimal && !integer.is_empty() => (),
                'e' | 'E' if !integer.is_empty() || !fraction.is_empty() => {
                    exponent = parse_exponent(&rest[index + 1..])?;
                    break;
                }
                _ => return None,
            }
        }
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }

        let mut literal = String::with_capacity(integer.len() + fraction.len() + 8);
        if negative {
            literal.push('-');
        }
        literal.push_str(if integer.is_empty() { "0" } else { &integer });
        if !fraction.is_empty() {
            literal.push('.');
            literal.push_str(&fraction);
        }
        if exponent != 0 {
            literal.push_str(&format!("e{exponent}"));
        }

        let mut value = BigDecimal::from_str(&literal).ok()?;
        let (_, scale) = value.as_bigint_and_exponent();
        if scale > MAX_SCALE {
            value = value.round(MAX_SCALE);
        } else if scale < 0 {
            value = value.with_scale(0);
        }
        (value.abs() <= *MAX_VALUE).then_some(value)
    }
}

/// Exponent digits with an optional sign; the whole remainder must be consumed.
fn parse_exponent(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) || digits.len() > 4 {
        return None;
    }
    text.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    #[test]
    fn accepts_common_spellings_of_the_same_amount() {
        let expected = Some(decimal("1234.56"));
        assert_eq!(parse_decimal("1.234,56"), expected);
        assert_eq!(parse_decimal("1,234.56"), expected);
        assert_eq!(parse_decimal("1234.56"), expected);
        assert_eq!(parse_decimal(" 1.234,56 "), expected);
        assert_eq!(parse_decimal("1 234,56"), expected);
    }

    #[test]
    fn blank_and_garbage_are_absent() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("   "), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal("1e"), None);
        assert_eq!(parse_decimal("$ 10"), None);
        assert_eq!(parse_decimal("2024-01-01"), None);
        assert_eq!(parse_decimal("#N/A"), None);
    }

    #[test]
    fn invariant_convention_wins_over_spanish() {
        // Group separators are not checked for position, so this reads as 1250
        assert_eq!(parse_decimal("12,50"), Some(decimal("1250")));
        assert_eq!(parse_decimal("12.50"), Some(decimal("12.50")));
    }

    #[test]
    fn keeps_exact_scale() {
        let parsed = parse_decimal("10.00").unwrap();
        assert_eq!(parsed.to_string(), "10.00");
        assert_eq!(parse_decimal("0.1").unwrap() + parse_decimal("0.2").unwrap(), decimal("0.3"));
    }

    #[test]
    fn accepts_signs_parentheses_and_currency() {
        assert_eq!(parse_decimal("-15.5"), Some(decimal("-15.5")));
        assert_eq!(parse_decimal("15.5-"), Some(decimal("-15.5")));
        assert_eq!(parse_decimal("(15.5)"), Some(decimal("-15.5")));
        assert_eq!(parse_decimal("10 €"), Some(decimal("10")));
        assert_eq!(parse_decimal("€ 1.234,50"), Some(decimal("1234.50")));
        assert_eq!(parse_decimal("¤1,000"), Some(decimal("1000")));
        assert_eq!(parse_decimal("(15.5"), None);
        assert_eq!(parse_decimal("--5"), None);
    }

    #[test]
    fn accepts_exponents() {
        assert_eq!(parse_decimal("2.5e3"), Some(decimal("2500")));
        assert_eq!(parse_decimal("125E-2"), Some(decimal("1.25")));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(parse_decimal("1e40"), None);
    }

    #[test]
    fn conventions_are_independent() {
        assert_eq!(INVARIANT.parse("1.234,56"), None);
        assert_eq!(SPANISH.parse("1.234,56"), Some(decimal("1234.56")));
        assert_eq!(SPANISH.parse("1,234.56"), None);
        assert_eq!(parse_sanitized("1.234.567,8"), Some(decimal("1234567.8")));
    }
}
