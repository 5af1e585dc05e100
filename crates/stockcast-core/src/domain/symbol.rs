use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest ticker accepted, long enough for `BRK-B` or `EURUSD=X`.
pub const MAX_TICKER_LEN: usize = 10;

/// Uppercased exchange ticker.
///
/// A ticker starts with a letter, or `^` for an index such as `^GSPC`, and
/// continues with letters, digits, `.`, `-` or `=`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

fn allowed(position: usize, ch: char) -> bool {
    match position {
        0 => ch.is_ascii_alphabetic() || ch == '^',
        _ => ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '='),
    }
}

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim().to_ascii_uppercase();
        if ticker.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }
        if ticker.len() > MAX_TICKER_LEN {
            return Err(ValidationError::TickerTooLong {
                ticker,
                max: MAX_TICKER_LEN,
            });
        }
        if let Some(ch) = ticker
            .chars()
            .enumerate()
            .find_map(|(position, ch)| (!allowed(position, ch)).then_some(ch))
        {
            return Err(ValidationError::TickerCharacter { ticker, ch });
        }
        Ok(Self(ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_uppercases() {
        assert_eq!(Symbol::parse(" aapl ").expect("ticker").as_str(), "AAPL");
    }

    #[test]
    fn accepts_share_classes_indices_and_fx_pairs() {
        for (raw, expected) in [("brk-b", "BRK-B"), ("^gspc", "^GSPC"), ("eurusd=x", "EURUSD=X")] {
            assert_eq!(Symbol::parse(raw).expect("ticker").as_str(), expected);
        }
    }

    #[test]
    fn leading_digit_and_symbols_are_rejected() {
        let err = Symbol::parse("1AAPL").expect_err("digit first");
        assert!(matches!(err, ValidationError::TickerCharacter { ch: '1', .. }));

        let err = Symbol::parse("AAPL$").expect_err("dollar sign");
        assert!(matches!(err, ValidationError::TickerCharacter { ch: '$', .. }));

        assert_eq!(Symbol::parse("   "), Err(ValidationError::EmptyTicker));
    }

    #[test]
    fn overlong_ticker_is_rejected() {
        let err = Symbol::parse("ABCDEFGHIJK").expect_err("too long");
        assert!(matches!(err, ValidationError::TickerTooLong { max: 10, .. }));
    }
}
