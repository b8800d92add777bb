//! Smart sizing: inflate frequencies by rank tier so the layout spreads
//! font sizes further apart than skewed natural-language counts would.

use crate::config::SmartSizing;
use tracing::info;

/// Partition words into four tiers by descending frequency and multiply
/// each tier by its configured constant.
///
/// Ties keep the input order, which the normalizer guarantees to be first
/// occurrence, so tier assignment is deterministic. The tier index ranges
/// are extra-large `max(1, n/3)`, large `max(1, n/3)`, medium `max(1, n/4)`
/// and small for whatever remains.
pub fn smart_size(counts: &[(String, u64)], sizing: &SmartSizing) -> Vec<(String, f64)> {
    if counts.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(&str, u64)> = counts.iter().map(|(w, c)| (w.as_str(), *c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let n = ranked.len();
    let extra_large = (n / 3).max(1);
    let large = (n / 3).max(1);
    let medium = (n / 4).max(1);
    let t2 = extra_large + large;
    let t3 = t2 + medium;
    let small = n.saturating_sub(t3);
    info!(
        "smart sizing applied: {} extra-large, {} large, {} medium, {} small words",
        extra_large.min(n),
        large.min(n.saturating_sub(extra_large)),
        medium.min(n.saturating_sub(t2)),
        small
    );

    ranked
        .into_iter()
        .enumerate()
        .map(|(i, (word, count))| {
            let multiplier = if i < extra_large {
                sizing.extra_large_multiplier
            } else if i < t2 {
                sizing.large_multiplier
            } else if i < t3 {
                sizing.medium_multiplier
            } else {
                sizing.small_multiplier
            };
            (word.to_string(), count as f64 * multiplier)
        })
        .collect()
}
