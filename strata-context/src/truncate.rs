//! Deterministic, token-budget-exact truncation.
//!
//! All strategies fit by measuring real token counts; prefix and suffix
//! fitting uses binary search over char boundaries rather than guessing
//! from byte lengths.

use serde::{Deserialize, Serialize};

use strata_core::constants::{DEFAULT_MIDDLE_HEAD_RATIO, TRUNCATION_ELLIPSIS, TRUNCATION_SUFFIX};
use strata_tokens::TokenCounter;

/// How to shorten content that exceeds a token ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationStrategy {
    /// Longest prefix plus a suffix marker.
    End,
    /// Whole sentences, greedily, until the next would overflow.
    Sentence,
    /// Whole paragraphs, greedily, until the next would overflow.
    Paragraph,
    /// A head and a tail joined by an ellipsis marker.
    Middle,
}

/// Shorten `text` so its measured token count fits `max_tokens`. Content
/// already within budget is returned unchanged, marker-free.
pub fn truncate_to_fit(
    text: &str,
    max_tokens: usize,
    strategy: TruncationStrategy,
    counter: &TokenCounter,
) -> String {
    if counter.count_cached(text) <= max_tokens {
        return text.to_string();
    }
    match strategy {
        TruncationStrategy::End => truncate_end(text, max_tokens, counter),
        TruncationStrategy::Sentence => truncate_units(text, max_tokens, counter, split_sentences),
        TruncationStrategy::Paragraph => {
            truncate_units(text, max_tokens, counter, split_paragraphs)
        }
        TruncationStrategy::Middle => {
            truncate_middle_with_ratio(text, max_tokens, DEFAULT_MIDDLE_HEAD_RATIO, counter)
        }
    }
}

fn truncate_end(text: &str, max_tokens: usize, counter: &TokenCounter) -> String {
    let marker_cost = counter.count_cached(TRUNCATION_SUFFIX);
    if max_tokens < marker_cost {
        return String::new();
    }
    let prefix = longest_prefix_within(text, max_tokens - marker_cost, counter);
    if prefix.is_empty() {
        return String::new();
    }
    let mut out = prefix;
    out.push_str(TRUNCATION_SUFFIX);
    // Tokens can merge across the marker seam; back off if they did not.
    while counter.count(&out) > max_tokens {
        let without = out.trim_end_matches(TRUNCATION_SUFFIX);
        let Some((idx, _)) = without.char_indices().last() else {
            return String::new();
        };
        out = format!("{}{}", &without[..idx], TRUNCATION_SUFFIX);
    }
    out
}

/// Middle truncation with an explicit head share of the budget.
pub fn truncate_middle_with_ratio(
    text: &str,
    max_tokens: usize,
    head_ratio: f64,
    counter: &TokenCounter,
) -> String {
    if counter.count_cached(text) <= max_tokens {
        return text.to_string();
    }
    let ellipsis_cost = counter.count_cached(TRUNCATION_ELLIPSIS);
    if max_tokens <= ellipsis_cost {
        return String::new();
    }
    let content_budget = max_tokens - ellipsis_cost;
    let head_budget = (content_budget as f64 * head_ratio).floor() as usize;
    let tail_budget = content_budget - head_budget;

    let head = longest_prefix_within(text, head_budget, counter);
    let tail = longest_suffix_within(text, tail_budget, counter);

    let mut out = format!("{head}{TRUNCATION_ELLIPSIS}{tail}");
    // Independent fits can still merge over the seams; shrink the head
    // until the assembled text measures within budget.
    let mut head_len = head.chars().count();
    while counter.count(&out) > max_tokens && head_len > 0 {
        head_len -= 1;
        let shorter: String = head.chars().take(head_len).collect();
        out = format!("{shorter}{TRUNCATION_ELLIPSIS}{tail}");
    }
    if counter.count(&out) > max_tokens {
        return truncate_end(text, max_tokens, counter);
    }
    out
}

/// Greedy whole-unit accumulation: keep appending units while the
/// accumulated text still measures within budget.
fn truncate_units(
    text: &str,
    max_tokens: usize,
    counter: &TokenCounter,
    split: fn(&str) -> Vec<&str>,
) -> String {
    let mut kept = String::new();
    for unit in split(text) {
        let candidate = if kept.is_empty() {
            unit.to_string()
        } else {
            format!("{kept}{unit}")
        };
        if counter.count(&candidate) > max_tokens {
            break;
        }
        kept = candidate;
    }
    kept.trim_end().to_string()
}

/// Sentence units, split after terminal punctuation, markers retained.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if matches!(ch, '.' | '!' | '?') {
            // Include any whitespace run after the terminator.
            let mut end = idx + ch.len_utf8();
            while let Some(&(next_idx, next_ch)) = chars.peek() {
                if next_ch.is_whitespace() {
                    end = next_idx + next_ch.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            units.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        units.push(&text[start..]);
    }
    units
}

/// Paragraph units, split on blank lines, separators retained.
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\n' && bytes[i + 1] == b'\n' {
            let mut end = i + 2;
            while end < bytes.len() && bytes[end] == b'\n' {
                end += 1;
            }
            units.push(&text[start..end]);
            start = end;
            i = end;
        } else {
            i += 1;
        }
    }
    if start < text.len() {
        units.push(&text[start..]);
    }
    units
}

/// Longest char-prefix of `text` measuring at most `budget` tokens,
/// found by binary search over the char count.
fn longest_prefix_within(text: &str, budget: usize, counter: &TokenCounter) -> String {
    if budget == 0 {
        return String::new();
    }
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let mut lo = 0usize; // chars kept, known to fit
    let mut hi = boundaries.len() - 1; // candidate upper bound
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if counter.count(&text[..boundaries[mid]]) <= budget {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    text[..boundaries[lo]].to_string()
}

/// Longest char-suffix of `text` measuring at most `budget` tokens.
fn longest_suffix_within(text: &str, budget: usize, counter: &TokenCounter) -> String {
    if budget == 0 {
        return String::new();
    }
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = boundaries.len() - 1;
    let mut lo = 0usize; // chars kept from the end, known to fit
    let mut hi = total;
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if counter.count(&text[boundaries[total - mid]..]) <= budget {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    text[boundaries[total - lo]..].to_string()
}
