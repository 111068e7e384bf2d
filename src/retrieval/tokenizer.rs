//! Term extraction for lexical scoring

use ahash::AHashSet;
use regex::Regex;
use std::sync::LazyLock;

/// Common English function words that carry no lexical signal
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "do", "for", "from", "had", "has", "have", "he", "her", "his",
    "how", "if", "in", "into", "is", "it", "its", "just", "more", "no", "not", "of", "on", "or",
    "our", "she", "so", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "to", "was", "we", "were", "what", "when", "which", "who", "will", "with", "would",
    "you", "your",
];

static STOP_WORD_SET: LazyLock<AHashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

/// Split text into index terms
///
/// Lower-cases, replaces punctuation with whitespace, splits on whitespace and
/// drops single-character terms and stop words. Order and duplicates are
/// preserved; term frequencies are counted by the caller.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = PUNCTUATION.replace_all(&lowered, " ");

    cleaned
        .split_whitespace()
        .filter(|term| term.chars().count() > 1 && !is_stop_word(term))
        .map(str::to_string)
        .collect()
}

/// Check whether a lower-cased term is a stop word
pub fn is_stop_word(term: &str) -> bool {
    STOP_WORD_SET.contains(term)
}
