//! Monetary amount extraction.
//!
//! Scans the message for a currency signal adjacent to a numeric token:
//! a symbol before the number ("₡5000", "$ 12.50", "Q300"), or a currency
//! word after it ("5000 colones"). A bare number or a bare `$` is
//! ambiguous and falls back to the configured default currency at low
//! confidence. Unparseable text yields `None`, never an error.

use nom::{
    character::complete::{char, digit1},
    combinator::{opt, recognize},
    multi::many0,
    sequence::{preceded, tuple},
    IResult,
};
use rust_decimal::Decimal;

use crate::lexicon::tables::{currency_for_symbol, currency_for_word};

/// Confidence of an amount with an explicit currency signal.
pub const EXPLICIT_CONFIDENCE: f32 = 0.9;
/// Confidence of a bare number or bare-`$` amount (default currency).
pub const AMBIGUOUS_CONFIDENCE: f32 = 0.4;

/// An extracted amount with its currency candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct AmountMatch {
    pub amount: Decimal,
    pub currency: String,
    /// True when a concrete symbol or currency word pinned the code.
    pub explicit: bool,
    pub confidence: f32,
}

/// Numeric token with optional thousands separators and decimal part:
/// `5000`, `1,000`, `1,000.50`, `12.75`.
fn number_token(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        digit1,
        many0(preceded(char(','), digit1)),
        opt(preceded(char('.'), digit1)),
    )))(input)
}

fn parse_decimal(token: &str) -> Option<Decimal> {
    let cleaned = token.replace(',', "");
    cleaned.parse::<Decimal>().ok().filter(|d| d > &Decimal::ZERO)
}

/// Extract the best amount candidate from the message.
///
/// Explicit-currency matches win over bare numbers; among bare numbers the
/// largest wins (matching how people mix amounts and quantities:
/// "compré 2 cafés por 3500").
pub fn extract_amount(text: &str, default_currency: &str) -> Option<AmountMatch> {
    let mut explicit: Option<AmountMatch> = None;
    let mut bare: Option<AmountMatch> = None;

    let mut idx = 0;
    while idx < text.len() {
        let rest = &text[idx..];
        let ch = match rest.chars().next() {
            Some(c) => c,
            None => break,
        };

        if let Some((m, consumed)) = match_symbol_amount(rest, default_currency) {
            if explicit.is_none() && m.explicit {
                explicit = Some(m);
            } else if !m.explicit {
                keep_max(&mut bare, m);
            }
            idx += consumed;
            continue;
        }

        if ch.is_ascii_digit() && starts_token(text, idx) {
            if let Ok((after, token)) = number_token(rest) {
                if let Some(amount) = parse_decimal(token) {
                    let m = match trailing_currency_word(after) {
                        Some(code) => AmountMatch {
                            amount,
                            currency: code.to_string(),
                            explicit: true,
                            confidence: EXPLICIT_CONFIDENCE,
                        },
                        None => AmountMatch {
                            amount,
                            currency: default_currency.to_string(),
                            explicit: false,
                            confidence: AMBIGUOUS_CONFIDENCE,
                        },
                    };
                    if m.explicit {
                        if explicit.is_none() {
                            explicit = Some(m);
                        }
                    } else {
                        keep_max(&mut bare, m);
                    }
                }
                idx += rest.len() - after.len();
                continue;
            }
        }

        idx += ch.len_utf8();
    }

    explicit.or(bare)
}

/// Try to read a currency symbol followed by a number at the head of `rest`.
/// Returns the match and how many bytes were consumed.
fn match_symbol_amount(rest: &str, default_currency: &str) -> Option<(AmountMatch, usize)> {
    let (symbol_len, currency, explicit) = symbol_at(rest, default_currency)?;

    let after_symbol = &rest[symbol_len..];
    let spaces = after_symbol.len() - after_symbol.trim_start().len();
    let numeric = &after_symbol[spaces..];

    let (after, token) = number_token(numeric).ok()?;
    let amount = parse_decimal(token)?;

    let confidence = if explicit { EXPLICIT_CONFIDENCE } else { AMBIGUOUS_CONFIDENCE };
    let consumed = symbol_len + spaces + (numeric.len() - after.len());
    Some((
        AmountMatch {
            amount,
            currency: currency.to_string(),
            explicit,
            confidence,
        },
        consumed,
    ))
}

/// Recognize a currency symbol at the head of `rest`.
fn symbol_at<'a>(rest: &str, default_currency: &'a str) -> Option<(usize, &'a str, bool)> {
    for (symbol, code) in [("₡", "CRC"), ("€", "EUR"), ("S/", "PEN"), ("s/", "PEN")] {
        if rest.starts_with(symbol) {
            debug_assert_eq!(currency_for_symbol(symbol), Some(code));
            return Some((symbol.len(), code, true));
        }
    }
    // Quetzal sign only counts when glued to a digit ("Q500"), otherwise
    // it is just a letter.
    if (rest.starts_with('Q') || rest.starts_with('q'))
        && rest[1..].chars().next().is_some_and(|c| c.is_ascii_digit())
    {
        return Some((1, "GTQ", true));
    }
    // Bare dollar sign is ambiguous (USD/MXN/COP): default currency,
    // low confidence.
    if rest.starts_with('$') {
        return Some((1, default_currency, false));
    }
    None
}

/// Currency word right after a number ("5000 colones").
fn trailing_currency_word(after: &str) -> Option<&'static str> {
    let trimmed = after.trim_start();
    let word: String = trimmed
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    if word.is_empty() {
        return None;
    }
    currency_for_word(&word)
}

/// A digit starts a fresh token only when not glued to a word, another
/// number, or a phone prefix (`+506...` must stay a phone, not an amount).
fn starts_token(text: &str, idx: usize) -> bool {
    match text[..idx].chars().next_back() {
        None => true,
        Some(prev) => !prev.is_alphanumeric() && !matches!(prev, '+' | '.' | ','),
    }
}

fn keep_max(best: &mut Option<AmountMatch>, candidate: AmountMatch) {
    match best {
        Some(current) if current.amount >= candidate.amount => {}
        _ => *best = Some(candidate),
    }
}
