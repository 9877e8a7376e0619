//! Deterministic guidance synthesis from retrieved cases.
//!
//! Everything here is a pure function of the retrieved cases and the patient
//! context; no model calls, no randomness. The composed text, warning
//! sentences, and recommendation lists are fixed wording that downstream
//! consumers display verbatim.

use consilia_core::defaults::{APPROACH_TAG_LIMIT, CONFIDENCE_CAP, CONFIDENCE_SATURATION_CASES};
use consilia_core::{Category, SearchHit};

/// Risk keywords scanned in the patient context, with the warning sentence
/// each produces. Scanned in table order.
const RISK_KEYWORDS: &[(&str, &str)] = &[
    (
        "suicide",
        "Suicide risk indicators detected - immediate assessment needed",
    ),
    (
        "self-harm",
        "Self-harm indicators present - safety assessment required",
    ),
    (
        "abuse",
        "Abuse indicators mentioned - consider safety and reporting requirements",
    ),
    (
        "crisis",
        "Crisis situation indicated - immediate intervention may be needed",
    ),
];

/// Distinct therapeutic approach tags found in case responses, in first-seen
/// order, at most [`APPROACH_TAG_LIMIT`].
///
/// "CBT" matches case-sensitively; the other signals are case-insensitive.
pub fn approach_tags(cases: &[SearchHit]) -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = Vec::new();
    let push_unique = |tags: &mut Vec<&'static str>, tag: &'static str| {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    };

    for case in cases {
        let response = &case.conversation.response;
        let lower = response.to_lowercase();

        if response.contains("CBT") || lower.contains("cognitive") {
            push_unique(&mut tags, "Cognitive Behavioral Therapy (CBT)");
        }
        if lower.contains("therapy") && lower.contains("recommend") {
            push_unique(&mut tags, "Professional therapy referral");
        }
        if lower.contains("support") {
            push_unique(&mut tags, "Support system engagement");
        }
    }

    tags.truncate(APPROACH_TAG_LIMIT);
    tags
}

/// Compose the guidance text for a set of retrieved cases.
pub fn compose_guidance(cases: &[SearchHit]) -> String {
    if cases.is_empty() {
        return "No similar cases found in the database. Consider consulting with \
                a supervisor or referring to established therapeutic frameworks \
                for this situation."
            .to_string();
    }

    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(
        "Based on {} similar cases in our database, here are some therapeutic considerations:",
        cases.len()
    ));

    let approaches = approach_tags(cases);
    if !approaches.is_empty() {
        parts.push(format!(
            "\nCommon approaches in similar cases: {}",
            approaches.join(", ")
        ));
    }

    parts.push("\nKey considerations:".to_string());

    if cases
        .iter()
        .any(|case| case.conversation.category == Category::Depression)
    {
        parts.push("• Assess for depression symptoms and consider screening tools".to_string());
    }
    if cases
        .iter()
        .any(|case| case.conversation.category == Category::Anxiety)
    {
        parts.push("• Evaluate anxiety levels and coping mechanisms".to_string());
    }

    parts.push("• Build therapeutic rapport and establish trust".to_string());
    parts.push("• Consider the client's readiness for change".to_string());
    parts.push("• Explore support systems and resources".to_string());

    parts.push(
        "\nRemember: This guidance is based on similar cases and should be \
         adapted to your specific client's needs. Always use your professional \
         judgment and consider consultation when needed."
            .to_string(),
    );

    parts.join("\n")
}

/// Scan the patient context for risk keywords.
///
/// Returns one warning sentence per matched keyword, in table order, each
/// prefixed with `WARNING:`. When nothing matches, a single `OK:` line is
/// returned instead, so the list is never empty.
pub fn extract_warnings(patient_context: &str) -> Vec<String> {
    let context_lower = patient_context.to_lowercase();

    let mut warnings: Vec<String> = RISK_KEYWORDS
        .iter()
        .filter(|(keyword, _)| context_lower.contains(keyword))
        .map(|(_, warning)| format!("WARNING: {}", warning))
        .collect();

    if warnings.is_empty() {
        warnings.push("OK: No immediate risk indicators detected in provided context".to_string());
    }

    warnings
}

/// Build the recommendation list: four fixed entries plus one extra per
/// at-risk category present among the retrieved cases.
pub fn build_recommendations(cases: &[SearchHit]) -> Vec<String> {
    let mut recommendations = vec![
        "Review similar cases for therapeutic approach patterns".to_string(),
        "Consider client's individual circumstances and preferences".to_string(),
        "Evaluate need for additional assessments or referrals".to_string(),
        "Plan follow-up and progress monitoring strategies".to_string(),
    ];

    let has_category =
        |category: Category| cases.iter().any(|case| case.conversation.category == category);

    if has_category(Category::Depression) {
        recommendations
            .push("Consider depression-specific interventions (CBT, behavioral activation)".to_string());
    }
    if has_category(Category::Anxiety) {
        recommendations
            .push("Explore anxiety management techniques (relaxation, exposure)".to_string());
    }
    if has_category(Category::Relationships) {
        recommendations
            .push("Consider couples/family therapy approaches if appropriate".to_string());
    }

    recommendations
}

/// Confidence in the synthesized guidance.
///
/// 0.0 with no cases; otherwise mean similarity scaled by a corroboration
/// factor that saturates at [`CONFIDENCE_SATURATION_CASES`] cases, capped at
/// [`CONFIDENCE_CAP`].
pub fn confidence(cases: &[SearchHit]) -> f64 {
    if cases.is_empty() {
        return 0.0;
    }

    let avg_similarity =
        cases.iter().map(|case| case.similarity).sum::<f64>() / cases.len() as f64;
    let count_factor = (cases.len() as f64 / CONFIDENCE_SATURATION_CASES).min(1.0);

    (avg_similarity * count_factor).min(CONFIDENCE_CAP)
}
