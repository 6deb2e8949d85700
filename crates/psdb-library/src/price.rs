//! Locale-formatted price parsing
//!
//! Catalog prices use `.` for thousands and `,` for decimals (`1.749,00`),
//! and a word for free editions.

use crate::text::fold_case;
use psdb_config::DEFAULT_FREE_TOKEN;

/// Parses raw price tokens into comparable amounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceParser {
    /// Case-folded free-edition word
    free_token: String,
}

impl Default for PriceParser {
    fn default() -> Self {
        Self::new(DEFAULT_FREE_TOKEN)
    }
}

impl PriceParser {
    /// Create a parser recognising `free_token` (case-insensitive) as 0.0
    pub fn new(free_token: &str) -> Self {
        Self {
            free_token: fold_case(free_token.trim()),
        }
    }

    /// Parse a raw token.
    ///
    /// Returns `Some(0.0)` for the free word, `Some(amount)` for a finite
    /// non-negative number and `None` for anything else, including a missing
    /// or empty token. Unparseable prices are absent, never zero.
    pub fn parse(&self, raw: Option<&str>) -> Option<f64> {
        let trimmed = raw?.trim();
        if trimmed.is_empty() {
            return None;
        }

        if fold_case(trimmed) == self.free_token {
            return Some(0.0);
        }

        let cleaned = trimmed.replace('.', "").replace(',', ".");
        let value: f64 = cleaned.parse().ok()?;

        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

/// Parse with the default free-edition word
pub fn parse_price(raw: Option<&str>) -> Option<f64> {
    PriceParser::default().parse(raw)
}
