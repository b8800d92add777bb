//! Persian text normalization and token counting.
//!
//! Pure functions: no I/O, no randomness. The counter preserves each
//! token's first-occurrence order so downstream ranking has a
//! deterministic tie-break.

use std::collections::{HashMap, HashSet};

/// Unicode blocks kept by the normalizer: Arabic, Arabic Supplement,
/// Arabic Extended-A and the two presentation-form blocks. Persian digits
/// (U+06F0-U+06F9) live inside the first block.
const PERSIAN_BLOCKS: [(u32, u32); 5] = [
    (0x0600, 0x06FF),
    (0x0750, 0x077F),
    (0x08A0, 0x08FF),
    (0xFB50, 0xFDFF),
    (0xFE70, 0xFEFF),
];

fn is_kept(c: char) -> bool {
    // Deliberately ASCII digits only, not all Unicode decimal digits;
    // Persian digits are already covered by the blocks below.
    if c.is_whitespace() || c.is_ascii_digit() {
        return true;
    }
    let cp = c as u32;
    PERSIAN_BLOCKS.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// Replace everything outside the Persian blocks, digits and whitespace
/// with a space.
pub fn clean_text(raw: &str) -> String {
    raw.chars().map(|c| if is_kept(c) { c } else { ' ' }).collect()
}

/// Join, clean, tokenize and count the input strings.
///
/// Tokens with a trimmed char-length of 1 or less, and tokens in the
/// stopword set, are dropped. The result is ordered by first occurrence.
/// When `collocations` is set, each adjacent pair of retained tokens is
/// also counted as a space-joined bigram.
pub fn count_tokens<S: AsRef<str>>(
    texts: &[S],
    stopwords: &HashSet<String>,
    collocations: bool,
) -> Vec<(String, u64)> {
    let joined = texts
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    let cleaned = clean_text(&joined);

    let tokens: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() > 1 && !stopwords.contains(*t))
        .collect();

    let mut counts: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut bump = |counts: &mut Vec<(String, u64)>, token: String| {
        if let Some(&i) = index.get(&token) {
            counts[i].1 += 1;
        } else {
            index.insert(token.clone(), counts.len());
            counts.push((token, 1));
        }
    };

    for token in &tokens {
        bump(&mut counts, (*token).to_string());
    }
    if collocations {
        for pair in tokens.windows(2) {
            bump(&mut counts, format!("{} {}", pair[0], pair[1]));
        }
    }
    counts
}
