//! Exchange-rate mining over extracted text.
//!
//! Two strategies: ordered regex patterns that capture a number
//! ([`extract_fact`]), and a line heuristic that returns the first line that
//! looks like a quote ([`scan_rate_lines`]).

use gleaner_common::{GleanerError, Result};
use regex::Regex;

use crate::types::{Document, ExtractedFact};

/// One side of a currency pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    /// ISO code, e.g. `USD`.
    pub code: String,
    /// Full names accepted by the patterns next to the code.
    pub names: Vec<String>,
    /// Loose terms for the line heuristic next to the code.
    pub terms: Vec<String>,
}

impl Currency {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_ascii_uppercase(),
            names: Vec::new(),
            terms: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.names.push(name.to_lowercase());
        self
    }

    pub fn with_term(mut self, term: &str) -> Self {
        self.terms.push(term.to_lowercase());
        self
    }

    fn alternation(&self) -> String {
        std::iter::once(self.code.to_lowercase())
            .chain(self.names.iter().cloned())
            .map(|s| regex::escape(&s))
            .collect::<Vec<_>>()
            .join("|")
    }

    fn mentioned_in(&self, lower: &str) -> bool {
        lower.contains(&self.code.to_lowercase())
            || self.names.iter().any(|n| lower.contains(n.as_str()))
            || self.terms.iter().any(|t| lower.contains(t.as_str()))
    }
}

/// `1 base = rate quote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyPair {
    pub base: Currency,
    pub quote: Currency,
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self {
            base: Currency::new("USD").with_name("us dollar").with_term("dollar"),
            quote: Currency::new("IDR")
                .with_name("indonesian rupiah")
                .with_term("rupiah"),
        }
    }
}

impl CurrencyPair {
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Pair from two codes, keeping the well-known names for USD and IDR.
    pub fn from_codes(base: &str, quote: &str) -> Self {
        let known = Self::default();
        let pick = |code: &str| {
            let code = code.to_ascii_uppercase();
            if code == known.base.code {
                known.base.clone()
            } else if code == known.quote.code {
                known.quote.clone()
            } else {
                Currency::new(&code)
            }
        };
        Self::new(pick(base), pick(quote))
    }

    /// Patterns, most specific first: with the quote currency, then without.
    ///
    /// ```
    /// use gleaner_web::{CurrencyPair, extract_fact};
    ///
    /// let patterns = CurrencyPair::default().patterns().unwrap();
    /// assert_eq!(extract_fact("1 USD = 15,750.25 IDR", &patterns), Some(15750.25));
    /// assert_eq!(extract_fact("1.00 US Dollar = 15750.25", &patterns), Some(15750.25));
    /// assert_eq!(extract_fact("no rate here", &patterns), None);
    /// ```
    pub fn patterns(&self) -> Result<Vec<Regex>> {
        let base = self.base.alternation();
        let quote = self.quote.alternation();
        [
            format!(r"(?i)1(?:\.00)?\s*(?:{base})\s*=\s*([\d,.]+)\s*(?:{quote})"),
            format!(r"(?i)1(?:\.00)?\s*(?:{base})\s*=\s*([\d,.]+)"),
        ]
        .iter()
        .map(|p| Regex::new(p).map_err(|e| GleanerError::Internal(format!("bad rate pattern: {e}"))))
        .collect()
    }

    /// `1 USD = IDR 15,750.25`.
    pub fn format_rate(&self, rate: f64) -> String {
        format!("1 {} = {} {}", self.base.code, self.quote.code, group_thousands(rate))
    }

    /// Query used to look the rate up, e.g. `current USD to IDR exchange rate today`.
    pub fn search_query(&self) -> String {
        format!(
            "current {} to {} exchange rate today",
            self.base.code, self.quote.code
        )
    }
}

/// Evaluate `patterns` in order against the lower-cased text; the first
/// capture that parses as a number wins.
pub fn extract_fact(text: &str, patterns: &[Regex]) -> Option<f64> {
    let lower = text.to_lowercase();
    patterns.iter().find_map(|re| {
        let raw = re.captures(&lower)?.get(1)?.as_str();
        let value = raw.replace(',', "").parse::<f64>().ok()?;
        value.is_finite().then_some(value)
    })
}

/// First fact across `documents`, in order.
pub fn extract_fact_from(
    documents: &[Document],
    patterns: &[Regex],
    pair: &CurrencyPair,
) -> Option<ExtractedFact> {
    documents.iter().find_map(|doc| {
        let rate = extract_fact(&doc.text, patterns)?;
        tracing::debug!(target: "web.fact", url = %doc.url, rate, "fact.pattern_match");
        Some(ExtractedFact {
            value: pair.format_rate(rate),
            rate,
            source_url: doc.url.clone(),
        })
    })
}

/// First line mentioning both currencies and one of `=`, `rate`, `price`.
///
/// ```
/// use gleaner_web::{CurrencyPair, scan_rate_lines};
///
/// let text = "exchange info\nusd/idr rate: 15800\nother stuff";
/// assert_eq!(
///     scan_rate_lines(text, &CurrencyPair::default()).as_deref(),
///     Some("usd/idr rate: 15800")
/// );
/// ```
pub fn scan_rate_lines(text: &str, pair: &CurrencyPair) -> Option<String> {
    text.lines()
        .find(|line| {
            let lower = line.to_lowercase();
            pair.base.mentioned_in(&lower)
                && pair.quote.mentioned_in(&lower)
                && ["=", "rate", "price"].iter().any(|k| lower.contains(k))
        })
        .map(|line| line.trim().to_string())
}

/// Two decimals with `,` between thousands.
fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() && value != 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str, text: &str) -> Document {
        Document {
            title: "t".into(),
            text: text.into(),
            url: url.into(),
            authors: Vec::new(),
            publish_date: None,
            summary: None,
            keywords: None,
        }
    }

    #[test]
    fn formats_with_grouping() {
        let pair = CurrencyPair::default();
        assert_eq!(pair.format_rate(15750.25), "1 USD = IDR 15,750.25");
        assert_eq!(pair.format_rate(15800.0), "1 USD = IDR 15,800.00");
        assert_eq!(group_thousands(999.5), "999.50");
        assert_eq!(group_thousands(1234567.891), "1,234,567.89");
    }

    #[test]
    fn specific_pattern_wins_then_falls_back() {
        let patterns = CurrencyPair::default().patterns().unwrap();
        assert_eq!(extract_fact("Today 1 usd = 15,750.25 idr.", &patterns), Some(15750.25));
        assert_eq!(
            extract_fact("1 Indonesian Rupiah? no: 1 US Dollar = 16,001 Indonesian Rupiah", &patterns),
            Some(16001.0)
        );
        assert_eq!(extract_fact("1 USD=15800", &patterns), Some(15800.0));
    }

    #[test]
    fn unparseable_capture_moves_on() {
        let patterns = CurrencyPair::default().patterns().unwrap();
        assert_eq!(extract_fact("1 usd = ,,, idr", &patterns), None);
    }

    #[test]
    fn first_document_with_a_match_is_the_source() {
        let pair = CurrencyPair::default();
        let patterns = pair.patterns().unwrap();
        let docs = vec![
            doc("https://a.example", "nothing useful"),
            doc("https://b.example", "As of noon 1 USD = 15,750.25 IDR"),
            doc("https://c.example", "1 USD = 1 IDR"),
        ];
        let fact = extract_fact_from(&docs, &patterns, &pair).unwrap();
        assert_eq!(fact.value, "1 USD = IDR 15,750.25");
        assert_eq!(fact.source_url, "https://b.example");
        assert!(extract_fact_from(&docs[..1], &patterns, &pair).is_none());
    }

    #[test]
    fn line_scan_needs_both_currencies_and_a_cue() {
        let pair = CurrencyPair::default();
        assert_eq!(scan_rate_lines("usd idr", &pair), None);
        assert_eq!(scan_rate_lines("dollar price today", &pair), None);
        assert_eq!(
            scan_rate_lines("header\n  Dollar to Rupiah price: 15.800  \n", &pair).as_deref(),
            Some("Dollar to Rupiah price: 15.800")
        );
    }

    #[test]
    fn other_pairs_use_their_codes() {
        let pair = CurrencyPair::from_codes("eur", "idr");
        let patterns = pair.patterns().unwrap();
        assert_eq!(extract_fact("1 EUR = 17,100 IDR", &patterns), Some(17100.0));
        assert_eq!(pair.format_rate(17100.0), "1 EUR = IDR 17,100.00");
        assert_eq!(pair.search_query(), "current EUR to IDR exchange rate today");
    }
}
