//! Transform pipeline: raw (context, response) pairs in, scored and
//! categorized [`ConversationRecord`]s out.
//!
//! Stage order is fixed: clean, length filter, exact-duplicate drop, quality
//! filter, category detection, id assignment. Statistics are collected
//! alongside and reported by the `consilia-prepare` binary.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use consilia_core::defaults::{MIN_CONTEXT_CHARS, MIN_RESPONSE_CHARS, QUALITY_CUTOFF};
use consilia_core::{Category, ConversationRecord};

use crate::category::detect_category;
use crate::clean::TextCleaner;
use crate::quality::quality_score;

/// One unprocessed row from the source dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPair {
    #[serde(rename = "Context")]
    pub context: String,
    #[serde(rename = "Response")]
    pub response: String,
}

/// Counters and aggregates collected during a transform run.
#[derive(Debug, Clone, Serialize)]
pub struct TransformStats {
    pub initial_count: usize,
    pub final_count: usize,
    pub removed_count: usize,
    /// Share of input rows dropped, in percent. 0.0 for empty input.
    pub removal_percentage: f64,
    /// Category counts, descending; tied counts keep detection priority order.
    pub categories: Vec<(Category, usize)>,
    pub avg_quality_score: f64,
    pub avg_context_length: f64,
    pub avg_response_length: f64,
}

/// Run the full transform over raw pairs.
///
/// Rows survive only if, after cleaning, the context exceeds
/// [`MIN_CONTEXT_CHARS`] and the response exceeds [`MIN_RESPONSE_CHARS`], the
/// cleaned (context, response) pair has not been seen before (first occurrence
/// wins), and the quality score reaches [`QUALITY_CUTOFF`]. Surviving rows get
/// sequential 1-based ids.
pub fn transform_pairs(pairs: Vec<RawPair>) -> (Vec<ConversationRecord>, TransformStats) {
    let initial_count = pairs.len();
    let cleaner = TextCleaner::new();

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut records: Vec<ConversationRecord> = Vec::new();

    for pair in pairs {
        let context = cleaner.clean(&pair.context);
        let response = cleaner.clean(&pair.response);

        let context_length = context.chars().count();
        let response_length = response.chars().count();
        if context_length <= MIN_CONTEXT_CHARS || response_length <= MIN_RESPONSE_CHARS {
            continue;
        }

        if !seen.insert((context.clone(), response.clone())) {
            continue;
        }

        let score = quality_score(&context, &response);
        if score < QUALITY_CUTOFF {
            continue;
        }

        let category = detect_category(&context);
        records.push(ConversationRecord {
            id: records.len() as i64 + 1,
            context,
            response,
            category,
            quality_score: score,
            context_length: context_length as i32,
            response_length: response_length as i32,
        });
    }

    let stats = collect_stats(initial_count, &records);
    debug!(
        initial = stats.initial_count,
        kept = stats.final_count,
        removed = stats.removed_count,
        "Transformed conversation dataset"
    );

    (records, stats)
}

fn collect_stats(initial_count: usize, records: &[ConversationRecord]) -> TransformStats {
    let final_count = records.len();
    let removed_count = initial_count - final_count;
    let removal_percentage = if initial_count == 0 {
        0.0
    } else {
        removed_count as f64 / initial_count as f64 * 100.0
    };

    let mut counts: HashMap<Category, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.category).or_insert(0) += 1;
    }
    let mut categories: Vec<(Category, usize)> = Category::ALL
        .iter()
        .filter_map(|category| counts.get(category).map(|n| (*category, *n)))
        .collect();
    // Stable sort over the priority-ordered list, so ties stay in priority
    // order.
    categories.sort_by(|a, b| b.1.cmp(&a.1));

    TransformStats {
        initial_count,
        final_count,
        removed_count,
        removal_percentage,
        categories,
        avg_quality_score: mean(records.iter().map(|r| r.quality_score)),
        avg_context_length: mean(records.iter().map(|r| r.context_length as f64)),
        avg_response_length: mean(records.iter().map(|r| r.response_length as f64)),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
