//! Keyword-driven category detection for conversation contexts.

use consilia_core::Category;

/// Keyword table in fixed priority order.
///
/// Scoring scans the table top to bottom; on tied keyword counts the earlier
/// entry wins. The order is part of the contract, not an artifact of the
/// container.
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Depression,
        &["depress", "sad", "hopeless", "worthless", "empty"],
    ),
    (
        Category::Anxiety,
        &["anxious", "panic", "worry", "fear", "nervous"],
    ),
    (
        Category::Relationships,
        &["marriage", "relationship", "partner", "spouse", "family"],
    ),
    (Category::Trauma, &["abuse", "trauma", "ptsd", "assault"]),
    (
        Category::SelfEsteem,
        &["self-esteem", "confidence", "worth", "value"],
    ),
    (
        Category::Therapy,
        &["therapy", "counseling", "therapist", "counselor"],
    ),
];

/// Assign the category whose keywords appear most often in the context.
///
/// Case-insensitive substring matching; each keyword counts once no matter
/// how often it occurs. No keyword match at all yields [`Category::General`].
pub fn detect_category(context: &str) -> Category {
    let context_lower = context.to_lowercase();

    let mut best = Category::General;
    let mut best_score = 0usize;

    for (category, keywords) in KEYWORDS {
        let score = keywords
            .iter()
            .filter(|keyword| context_lower.contains(**keyword))
            .count();
        if score > best_score {
            best = *category;
            best_score = score;
        }
    }

    best
}
