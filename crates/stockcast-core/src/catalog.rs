//! Static catalog of widely followed tickers used for symbol search.

use crate::Symbol;

pub const POPULAR_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "JPM", "V", "JNJ", "WMT", "PG", "MA",
    "HD", "CVX", "MRK", "ABBV", "PEP", "KO", "COST", "TMO", "AVGO", "MCD", "CSCO", "ACN", "ABT",
    "LLY", "DHR", "TXN", "NEE",
];

/// Case-insensitive substring search over [`POPULAR_TICKERS`], in catalog order.
pub fn search_tickers(query: &str, limit: usize) -> Vec<Symbol> {
    let needle = query.trim().to_ascii_uppercase();
    POPULAR_TICKERS
        .iter()
        .filter(|ticker| ticker.contains(needle.as_str()))
        .filter_map(|ticker| Symbol::parse(ticker).ok())
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_substrings_case_insensitively() {
        let found = search_tickers("co", 10);
        let names: Vec<&str> = found.iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["COST", "CSCO"]);
    }

    #[test]
    fn respects_limit_and_empty_query() {
        assert_eq!(search_tickers("", 5).len(), 5);
        assert!(search_tickers("QQQQ", 5).is_empty());
    }
}
