//! Keyword ranking and extractive summaries for the summarize intent.

use std::collections::HashMap;

pub const MAX_KEYWORDS: usize = 10;
pub const MAX_SUMMARY_SENTENCES: usize = 5;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "may", "me", "might", "more", "most", "must", "my", "myself", "no", "nor",
    "not", "now", "of", "off", "on", "once", "one", "only", "or", "other", "our", "ours",
    "ourselves", "out", "over", "own", "said", "same", "says", "she", "should", "so", "some",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up", "us",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "would", "you", "your", "yours", "yourself", "yourselves",
];

/// Output of the summarize pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Digest {
    pub summary: String,
    pub keywords: Vec<String>,
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Lower-cased content words: alphanumeric runs, stop words and pure numbers dropped.
fn content_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() > 1)
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !is_stop_word(w))
}

/// Most frequent content words, ties broken by first appearance.
pub fn keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (pos, word) in content_words(text).enumerate() {
        counts.entry(word).or_insert((0, pos)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> =
        counts.into_iter().map(|(w, (n, first))| (w, n, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(limit).map(|(w, _, _)| w).collect()
}

/// Split prose into sentences on `.`, `!` or `?` followed by whitespace.
pub fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = matches!(c, '.' | '!' | '?')
            && chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if boundary {
            let end = i + c.len_utf8();
            let s = text[start..end].trim();
            if !s.is_empty() {
                out.push(s);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// Pick up to `limit` sentences by keyword density, title overlap and
/// position, returned in their original order.
pub fn summarize(title: &str, text: &str, keywords: &[String], limit: usize) -> String {
    let all = sentences(text);
    let total = all.len().max(1) as f64;
    let title_words: Vec<String> = content_words(title).collect();

    let mut scored: Vec<(usize, f64)> = all
        .iter()
        .enumerate()
        .filter_map(|(idx, sentence)| {
            let words: Vec<String> = content_words(sentence).collect();
            if words.len() < 3 {
                return None;
            }
            let density = words.iter().filter(|w| keywords.contains(w)).count() as f64
                / words.len() as f64;
            let overlap = if title_words.is_empty() {
                0.0
            } else {
                title_words.iter().filter(|t| words.contains(t)).count() as f64
                    / title_words.len() as f64
            };
            let position = 1.0 - idx as f64 / total;
            Some((idx, 2.0 * density + 1.5 * overlap + 0.5 * position))
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored.sort_by_key(|(idx, _)| *idx);

    scored
        .into_iter()
        .map(|(idx, _)| all[idx])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full summarize pass over an extracted article.
pub fn digest(title: &str, text: &str) -> Digest {
    let keywords = keywords(text, MAX_KEYWORDS);
    let summary = summarize(title, text, &keywords, MAX_SUMMARY_SENTENCES);
    Digest { summary, keywords }
}
