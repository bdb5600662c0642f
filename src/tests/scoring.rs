// Unit tests for candidate scoring, context building, and consistency
// checks.

use super::helpers::{entry, pricing_entries};
use crate::scoring::{build_context, check_consistency, score_candidates, MAX_CONTEXT_CHARS};

#[test]
fn verbatim_japanese_query_scores_full_overlap() {
    let scored = score_candidates("料金プランについて教えてください", pricing_entries());
    assert!(scored[0].score >= 0.4, "top score {}", scored[0].score);
    assert_eq!(scored[0].entry.question_text, "料金プランについて教えてください");
}

#[test]
fn unrelated_query_scores_zero() {
    let scored = score_candidates("宇宙旅行の予約方法", pricing_entries());
    assert!(scored.iter().all(|s| s.score == 0.0));
}

#[test]
fn matching_is_case_insensitive() {
    let entries = vec![entry("How do I reset my PASSWORD?", "Use the reset link.")];
    let scored = score_candidates("reset password", entries);
    assert_eq!(scored[0].score, 1.0);
}

#[test]
fn short_terms_never_match_but_still_count_in_the_denominator() {
    let entries = vec![entry("ab cd", "ab cd")];
    // "ab" and "cd" appear verbatim but are too short to count as matches.
    let scored = score_candidates("ab cd", entries);
    assert_eq!(scored[0].score, 0.0);

    // One matching long term out of three total terms.
    let entries = vec![entry("reset instructions", "use the portal")];
    let scored = score_candidates("to do reset", entries);
    assert!((scored[0].score - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn sort_is_descending_and_stable_on_ties() {
    let entries = vec![
        entry("no overlap here", "none"),
        entry("password reset guide", "reset steps"),
        entry("nothing relevant", "nope"),
    ];
    let scored = score_candidates("password reset", entries);
    assert_eq!(scored[0].entry.question_text, "password reset guide");
    // The two zero-score entries keep their retrieval order.
    assert_eq!(scored[1].entry.question_text, "no overlap here");
    assert_eq!(scored[2].entry.question_text, "nothing relevant");
}

#[test]
fn empty_query_produces_zero_scores() {
    let scored = score_candidates("   ", pricing_entries());
    assert!(scored.iter().all(|s| s.score == 0.0));
}

#[test]
fn short_context_is_not_truncated() {
    let scored = score_candidates("解約", pricing_entries());
    let context = build_context(&scored);
    assert!(context.starts_with("Q: "));
    assert!(context.contains("\n\nQ: "));
    assert!(!context.ends_with("..."));
}

#[test]
fn long_context_is_cut_to_exactly_400_chars_with_ellipsis() {
    let long_answer = "あ".repeat(300);
    let entries = vec![
        entry("質問その一", &long_answer),
        entry("質問その二", &long_answer),
    ];
    let scored = score_candidates("質問", entries);
    let context = build_context(&scored);
    assert_eq!(context.chars().count(), MAX_CONTEXT_CHARS);
    assert!(context.ends_with("..."));
    assert_eq!(
        context.chars().take(MAX_CONTEXT_CHARS - 3).count(),
        397
    );
}

#[test]
fn empty_candidate_list_builds_empty_context() {
    assert_eq!(build_context(&[]), "");
}

#[test]
fn grounded_answer_passes_the_consistency_check() {
    let entries = pricing_entries();
    let answer = "スタンダードプランは月額980円、プレミアムプランは月額1980円です。";
    let report = check_consistency(answer, &entries);
    assert!(report.consistent, "score {}", report.score);
    assert_eq!(report.score, 1.0);
}

#[test]
fn fabricated_answer_fails_the_consistency_check() {
    let entries = pricing_entries();
    let answer = "エンタープライズプランは無料でご利用いただけます。年間契約で50%割引になります。";
    let report = check_consistency(answer, &entries);
    assert!(!report.consistent);
    assert_eq!(report.score, 0.0);
}

#[test]
fn empty_answer_is_inconsistent() {
    let report = check_consistency("", &pricing_entries());
    assert!(!report.consistent);
    assert_eq!(report.score, 0.0);
}
