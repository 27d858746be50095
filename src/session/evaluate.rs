//! Free-text answer evaluation.
//!
//! Scoring is delegated to the generative service; the local logic is
//! extracting a 0-100 score from whatever prose comes back and degrading
//! to a harmless default when the service is unavailable. Evaluator
//! failure never blocks task completion — the engine records whatever
//! score resulted.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::llm::{prompts, ChatMessage, CompletionRequest, GenerativeProvider};

/// Score at or above which an answer counts as correct.
pub const PASS_THRESHOLD: u32 = 70;

/// Score assumed when the response contains no recognizable score.
const DEFAULT_SCORE: u32 = 50;

/// Outcome of evaluating a free-text answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub is_correct: bool,
    pub feedback: String,
    pub score: u32,
}

/// Extract a 0-100 score from evaluator prose.
///
/// Pattern priority, first match wins: `N/100`, then `N%`, then
/// `score: N`. Values above 100 are clamped.
pub fn extract_score(text: &str) -> Option<u32> {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(\d{1,3})\s*/\s*100").expect("static regex"),
            Regex::new(r"(\d{1,3})\s*%").expect("static regex"),
            Regex::new(r"(?i)score\s*[:=]?\s*(\d{1,3})").expect("static regex"),
        ]
    });
    patterns.iter().find_map(|re| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .map(|n| n.min(100))
    })
}

/// Score a free-text answer against the model answer.
pub async fn evaluate_free_text(
    provider: &dyn GenerativeProvider,
    question: &str,
    expected: &str,
    answer: &str,
) -> Evaluation {
    let prompt = prompts::evaluation_prompt(question, expected, answer);
    let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
        .with_max_tokens(200)
        .with_temperature(0.0);

    match provider.complete(request).await {
        Ok(response) => {
            let score = extract_score(&response.content).unwrap_or(DEFAULT_SCORE);
            Evaluation {
                is_correct: score >= PASS_THRESHOLD,
                feedback: response.content,
                score,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "free-text evaluation unavailable");
            Evaluation {
                is_correct: false,
                feedback: "The automated evaluator is unavailable right now; \
                           your answer was recorded."
                    .to_string(),
                score: 0,
            }
        }
    }
}
