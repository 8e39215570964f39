use std::collections::HashMap;
use std::sync::Mutex;

use strsim::{levenshtein, normalized_levenshtein};

use crate::utils::debug_log;

use super::types::{PricingDataset, PricingRecord};

/// Minimum full-string similarity (0-100) accepted by the ratio stage.
const RATIO_THRESHOLD: f64 = 79.0;
/// Minimum windowed similarity (0-100) accepted by the partial-ratio stage.
const PARTIAL_RATIO_THRESHOLD: f64 = 80.0;
/// Queries shorter than this get the looser edit-distance budget.
const SHORT_QUERY_LEN: usize = 15;
const SHORT_QUERY_FACTOR: f64 = 0.6;
const LONG_QUERY_FACTOR: f64 = 0.3;

/// Maps free-form model names onto canonical dataset keys.
///
/// Every outcome, including a miss, is memoized for the resolver's lifetime
/// keyed by the raw input string. The memo is best-effort under concurrency:
/// two callers racing on the same name may both run the match stages, but
/// resolution is pure in (query, dataset) so the duplicate work is harmless.
pub(crate) struct ModelResolver {
    memo: Mutex<HashMap<String, Option<String>>>,
}

impl ModelResolver {
    pub(crate) fn new() -> Self {
        Self {
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a raw model name to its pricing record, or `None` when no
    /// stage produces an acceptable match. A miss is not an error; callers
    /// degrade to zero-cost pricing.
    pub(crate) fn resolve(
        &self,
        raw_name: &str,
        dataset: &PricingDataset,
    ) -> Option<PricingRecord> {
        self.resolve_key(raw_name, dataset)
            .and_then(|key| dataset.get(&key))
            .cloned()
    }

    /// Resolve a raw model name to the canonical dataset key it matched.
    pub(crate) fn resolve_key(&self, raw_name: &str, dataset: &PricingDataset) -> Option<String> {
        if let Some(known) = self.memo_get(raw_name) {
            debug_log(format!("memoized match for '{raw_name}': {known:?}"));
            return known;
        }

        let best = find_best_match(raw_name, dataset);
        match &best {
            Some(key) => debug_log(format!("resolved '{raw_name}' to '{key}'")),
            None => debug_log(format!("no pricing match for '{raw_name}'")),
        }

        self.memo
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(raw_name.to_string(), best.clone());

        best
    }

    fn memo_get(&self, raw_name: &str) -> Option<Option<String>> {
        self.memo
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(raw_name)
            .cloned()
    }
}

impl Default for ModelResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Four-stage fallback pipeline, first acceptable stage wins:
/// exact match, full-string similarity ratio, Levenshtein distance with an
/// early exit below distance 2, then partial (windowed) ratio.
///
/// The early exit intentionally returns the first key seen at distance < 2
/// in key order, even when a later key sits at the same distance; dataset
/// keys iterate in sorted order so the choice is deterministic.
fn find_best_match(query: &str, dataset: &PricingDataset) -> Option<String> {
    let query_lower = query.to_lowercase();

    // Stage 1: exact match on lower-cased keys.
    if let Some(canonical) = dataset.canonical_for(&query_lower) {
        return Some(canonical.to_string());
    }

    // Stage 2: full-string similarity ratio.
    let mut best_ratio = f64::NEG_INFINITY;
    let mut best_key: Option<&str> = None;
    for (lower, canonical) in dataset.keys_lower() {
        let ratio = normalized_levenshtein(lower, &query_lower) * 100.0;
        if ratio > best_ratio {
            best_ratio = ratio;
            best_key = Some(canonical);
        }
    }
    if best_ratio >= RATIO_THRESHOLD {
        return best_key.map(str::to_string);
    }

    // Stage 3: minimum edit distance with a length-proportional budget.
    let query_len = query_lower.chars().count();
    let factor = if query_len < SHORT_QUERY_LEN {
        SHORT_QUERY_FACTOR
    } else {
        LONG_QUERY_FACTOR
    };
    let threshold = (query_len as f64 * factor).round() as usize;

    let mut min_distance = usize::MAX;
    let mut best_key: Option<&str> = None;
    for (lower, canonical) in dataset.keys_lower() {
        let distance = levenshtein(&query_lower, lower);
        if distance < min_distance {
            min_distance = distance;
            best_key = Some(canonical);
        }
        if distance < 2 {
            // Near-exact match; stop scanning the remaining keys.
            return Some(canonical.to_string());
        }
    }
    if min_distance <= threshold {
        return best_key.map(str::to_string);
    }

    // Stage 4: best window alignment, catches prefix/suffix drift the full
    // ratio under-scores.
    let mut best_partial = f64::NEG_INFINITY;
    let mut best_key: Option<&str> = None;
    for (lower, canonical) in dataset.keys_lower() {
        let score = partial_ratio(lower, &query_lower);
        if score > best_partial {
            best_partial = score;
            best_key = Some(canonical);
        }
    }
    if best_partial >= PARTIAL_RATIO_THRESHOLD {
        return best_key.map(str::to_string);
    }

    None
}

/// Similarity (0-100) of the shorter string against its best-aligned window
/// of the longer one.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (short, long) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let short_str: String = short.iter().collect();
    let mut best = 0.0_f64;
    for start in 0..=(long.len() - short.len()) {
        let window: String = long[start..start + short.len()].iter().collect();
        let score = normalized_levenshtein(&short_str, &window) * 100.0;
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record(input_micro: i64, output_micro: i64) -> PricingRecord {
        PricingRecord {
            input_cost_per_token: Some(Decimal::new(input_micro, 6)),
            output_cost_per_token: Some(Decimal::new(output_micro, 6)),
        }
    }

    fn dataset(names: &[&str]) -> PricingDataset {
        let entries: Vec<(&str, PricingRecord)> =
            names.iter().map(|n| (*n, record(3, 15))).collect();
        PricingDataset::from_entries(&entries)
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let ds = dataset(&["gpt-4o-mini", "claude-3-5-sonnet-20240620"]);
        let resolver = ModelResolver::new();
        let lower = resolver.resolve("gpt-4o-mini", &ds);
        let upper = resolver.resolve("GPT-4O-MINI", &ds);
        assert!(lower.is_some());
        assert_eq!(lower, upper);
    }

    #[test]
    fn ratio_stage_catches_truncated_date_suffix() {
        let ds = dataset(&["claude-3-5-sonnet-20240620"]);
        // Not exact; similarity 1 - 4/26 = 84.6 >= 79.
        let got = find_best_match("claude-3-5-sonnet-2024", &ds);
        assert_eq!(got.as_deref(), Some("claude-3-5-sonnet-20240620"));
    }

    #[test]
    fn distance_one_short_circuits() {
        let ds = dataset(&["gpt-4o-mini"]);
        let resolver = ModelResolver::new();
        assert!(resolver.resolve("gpt-4o-min", &ds).is_some());
    }

    #[test]
    fn garbage_query_misses_every_stage() {
        let ds = dataset(&["gpt-4o-mini"]);
        let resolver = ModelResolver::new();
        assert!(resolver.resolve("zzzzzzzzzz", &ds).is_none());
    }

    #[test]
    fn distance_within_length_budget_matches() {
        // 14-char query, budget round(14 * 0.6) = 8; distance to the key
        // is 4 and the full ratio (77.8) stays under the ratio threshold.
        let ds = dataset(&["claude-instant-1.2"]);
        let got = find_best_match("claude-instant", &ds);
        assert_eq!(got.as_deref(), Some("claude-instant-1.2"));
    }

    #[test]
    fn partial_ratio_catches_embedded_name() {
        let ds = dataset(&["some-vendor/gpt-3.5-turbo-0125-preview-long"]);
        // Too far for ratio (30) and distance (30 > 8), but the query
        // aligns exactly inside the key.
        let got = find_best_match("gpt-3.5-turbo", &ds);
        assert_eq!(
            got.as_deref(),
            Some("some-vendor/gpt-3.5-turbo-0125-preview-long")
        );
    }

    #[test]
    fn early_exit_takes_first_of_near_equal_keys() {
        // Both keys sit at distance 1 from the query and the short strings
        // keep the ratio stage (66.7) below its threshold. The scan stops at
        // the first key in sorted order.
        let ds = dataset(&["abd", "abc"]);
        let got = find_best_match("ab", &ds);
        assert_eq!(got.as_deref(), Some("abc"));
    }

    #[test]
    fn memo_skips_match_stages_on_second_call() {
        let resolver = ModelResolver::new();
        let first = dataset(&["gpt-4o-mini"]);
        assert!(resolver.resolve("gpt-4o-min", &first).is_some());

        // The second dataset has an exact key for the query; a fresh
        // resolution would prefer it. The memoized canonical key wins,
        // proving the stages were not re-run.
        let second = PricingDataset::from_entries(&[
            ("gpt-4o-mini", record(3, 15)),
            ("gpt-4o-min", record(99, 99)),
        ]);
        let got = resolver.resolve("gpt-4o-min", &second).unwrap();
        assert_eq!(got.input_cost_per_token, Some(Decimal::new(3, 6)));
    }

    #[test]
    fn miss_is_memoized_too() {
        let resolver = ModelResolver::new();
        let without_key = dataset(&["gpt-4o-mini"]);
        assert!(resolver.resolve("zzzzzzzzzz", &without_key).is_none());

        // Even a now-exact key does not bypass the negative memo.
        let with_key = dataset(&["zzzzzzzzzz"]);
        assert!(resolver.resolve("zzzzzzzzzz", &with_key).is_none());
    }

    #[test]
    fn memo_key_is_the_raw_unnormalized_name() {
        let resolver = ModelResolver::new();
        let ds = dataset(&["gpt-4o-mini"]);
        resolver.resolve("GPT-4O-MINI", &ds);
        // Different raw spelling, separate memo entry; both resolve.
        assert!(resolver.resolve("gpt-4o-mini", &ds).is_some());
    }

    #[test]
    fn empty_dataset_resolves_to_none() {
        let ds = PricingDataset::from_entries(&[]);
        let resolver = ModelResolver::new();
        assert!(resolver.resolve("gpt-4o", &ds).is_none());
    }

    #[test]
    fn partial_ratio_bounds() {
        assert_eq!(partial_ratio("abc", "abc"), 100.0);
        assert_eq!(partial_ratio("abc", "xxabcxx"), 100.0);
        assert_eq!(partial_ratio("", ""), 100.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
        assert!(partial_ratio("abc", "xyz") < 50.0);
    }
}
