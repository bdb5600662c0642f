//! Candidate scoring, context building, and answer consistency checks.
//!
//! Scoring is a simple term-overlap heuristic: the fraction of query terms
//! (longer than two characters) found in the candidate's concatenated
//! question and answer text. The concrete lexical backend that produced the
//! candidates is a collaborator concern; this module only ranks what it
//! returned.

use crate::provider::FaqEntry;
use std::cmp::Ordering;

/// Maximum characters of candidate context handed to the model.
pub const MAX_CONTEXT_CHARS: usize = 400;

const ELLIPSIS: &str = "...";

/// Minimum phrase length considered by the consistency check.
const MIN_PHRASE_CHARS: usize = 10;

/// A retrieval candidate with its match score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub entry: FaqEntry,
    pub score: f64,
}

/// Score candidates against the query and sort them best-first.
///
/// Terms are whitespace-separated, lowercased; only terms longer than two
/// characters can match, but the denominator is the total term count. The
/// sort is stable, so ties keep their original retrieval order.
pub fn score_candidates(query: &str, entries: Vec<FaqEntry>) -> Vec<ScoredEntry> {
    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower.split_whitespace().collect();

    let mut scored: Vec<ScoredEntry> = entries
        .into_iter()
        .map(|entry| {
            let combined =
                format!("{} {}", entry.question_text, entry.answer_text).to_lowercase();
            let matches = terms
                .iter()
                .filter(|term| term.chars().count() > 2 && combined.contains(**term))
                .count();
            let score = if terms.is_empty() {
                0.0
            } else {
                matches as f64 / terms.len() as f64
            };
            ScoredEntry { entry, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

/// Concatenate candidate Q/A pairs into a bounded model context.
///
/// Output longer than [`MAX_CONTEXT_CHARS`] is cut to 397 characters plus an
/// ellipsis marker, for exactly 400. Counting is per character, not per byte,
/// so multibyte text truncates cleanly.
pub fn build_context(scored: &[ScoredEntry]) -> String {
    let joined = scored
        .iter()
        .map(|s| format!("Q: {}\nA: {}", s.entry.question_text, s.entry.answer_text))
        .collect::<Vec<_>>()
        .join("\n\n");

    if joined.chars().count() > MAX_CONTEXT_CHARS {
        let mut truncated: String = joined
            .chars()
            .take(MAX_CONTEXT_CHARS - ELLIPSIS.len())
            .collect();
        truncated.push_str(ELLIPSIS);
        truncated
    } else {
        joined
    }
}

/// Result of checking a generated answer against its source entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyReport {
    pub consistent: bool,
    pub score: f64,
}

/// Check whether an answer is grounded in the given entries.
///
/// The answer is split into sentence-like phrases; a phrase longer than ten
/// characters counts as grounded when its ten-character prefix appears in the
/// concatenated answer text of the entries. The answer is considered
/// consistent when more than half of its phrases are grounded. Callers that
/// collect the model stream use a failing report to raise a
/// hallucination-detected error.
pub fn check_consistency(answer: &str, entries: &[FaqEntry]) -> ConsistencyReport {
    let corpus = entries
        .iter()
        .map(|e| e.answer_text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let phrases: Vec<&str> = answer
        .split(['。', '.'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if phrases.is_empty() {
        return ConsistencyReport {
            consistent: false,
            score: 0.0,
        };
    }

    let grounded = phrases
        .iter()
        .filter(|phrase| {
            if phrase.chars().count() <= MIN_PHRASE_CHARS {
                return false;
            }
            let prefix: String = phrase.chars().take(MIN_PHRASE_CHARS).collect();
            corpus.contains(&prefix)
        })
        .count();

    let score = grounded as f64 / phrases.len() as f64;
    ConsistencyReport {
        consistent: score > 0.5,
        score,
    }
}
