//! Heuristic quality scoring for conversation pairs.

/// Score a cleaned conversation pair's usefulness on a [0, 100] scale.
///
/// Starts at 100 and applies every matching rule additively, then clamps:
///
/// | rule | adjustment |
/// |------|-----------|
/// | context shorter than 50 chars | -30 |
/// | response shorter than 30 chars | -20 |
/// | context within 100..=2000 chars | +10 |
/// | response within 50..=1500 chars | +10 |
/// | context longer than 3000 chars | -20 |
/// | response longer than 2000 chars | -15 |
///
/// Lengths are Unicode scalar counts of the cleaned text.
pub fn quality_score(context: &str, response: &str) -> f64 {
    let context_len = context.chars().count();
    let response_len = response.chars().count();

    let mut score: f64 = 100.0;

    if context_len < 50 {
        score -= 30.0;
    }
    if response_len < 30 {
        score -= 20.0;
    }

    if (100..=2000).contains(&context_len) {
        score += 10.0;
    }
    if (50..=1500).contains(&response_len) {
        score += 10.0;
    }

    if context_len > 3000 {
        score -= 20.0;
    }
    if response_len > 2000 {
        score -= 15.0;
    }

    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of_len(len: usize) -> String {
        "x".repeat(len)
    }

    #[test]
    fn test_score_always_in_range() {
        let lengths = [0, 10, 29, 30, 49, 50, 99, 100, 1500, 2000, 2001, 3000, 3001];
        for &c in &lengths {
            for &r in &lengths {
                let score = quality_score(&text_of_len(c), &text_of_len(r));
                assert!((0.0..=100.0).contains(&score), "({}, {}) gave {}", c, r, score);
            }
        }
    }

    #[test]
    fn test_ideal_lengths_clamp_at_100() {
        // 100 + 10 + 10 clamps to 100.
        let score = quality_score(&text_of_len(500), &text_of_len(400));
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_short_context_penalty() {
        // 100 - 30 + 10 (response bonus) = 80.
        let score = quality_score(&text_of_len(49), &text_of_len(400));
        assert_eq!(score, 80.0);
    }

    #[test]
    fn test_short_response_penalty() {
        // 100 - 20 + 10 (context bonus) = 90.
        let score = quality_score(&text_of_len(500), &text_of_len(29));
        assert_eq!(score, 90.0);
    }

    #[test]
    fn test_both_short_penalties_stack() {
        // 100 - 30 - 20 = 50; no bonuses apply.
        let score = quality_score(&text_of_len(30), &text_of_len(20));
        assert_eq!(score, 50.0);
    }

    #[test]
    fn test_overlong_context_penalty() {
        // 100 - 20 (context > 3000) + 10 (response bonus) = 90.
        let score = quality_score(&text_of_len(3001), &text_of_len(400));
        assert_eq!(score, 90.0);
    }

    #[test]
    fn test_overlong_response_penalty() {
        // 100 - 15 (response > 2000) + 10 (context bonus) = 95.
        let score = quality_score(&text_of_len(500), &text_of_len(2001));
        assert_eq!(score, 95.0);
    }

    #[test]
    fn test_mid_range_context_no_bonus() {
        // Context in 50..100: no penalty, no bonus. 100 + 10 (response) = 100 clamp.
        let score = quality_score(&text_of_len(75), &text_of_len(400));
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_shortening_response_never_increases_score() {
        let context = text_of_len(500);
        let base = quality_score(&context, &text_of_len(30));
        for r in 0..30 {
            let shorter = quality_score(&context, &text_of_len(r));
            assert!(
                shorter <= base,
                "response length {} scored {} > {}",
                r,
                shorter,
                base
            );
        }
    }

    #[test]
    fn test_lengths_are_character_counts() {
        // 49 multi-byte characters still count as a short context.
        let context: String = "é".repeat(49);
        let score = quality_score(&context, &text_of_len(400));
        assert_eq!(score, 80.0);
    }
}
