//! Question derivation.
//!
//! The protocol announces questions through several overlapping events,
//! each carrying a different (and possibly incomplete) slice of data. All
//! of them funnel into the single [`derive_question`] decision function so
//! the priority order lives in one testable place.

use std::collections::HashMap;

use serde_json::Value;

use crate::quiz::{Answer, QuestionRecord, normalize_choices};

/// Placeholder answer text when upstream carried no choices.
const ANSWERS_PLACEHOLDER: &str = "Answers not yet available";

/// Derive the question record to emit for a question-class payload.
///
/// Priority order:
/// 1. a previously stored record for this index (content-API prefetch or
///    quiz-start block data),
/// 2. a record assembled from the payload's own non-empty choice list,
/// 3. a title-only record with a placeholder answer,
/// 4. a fully generic placeholder.
///
/// A record is always produced and its `answers` is never empty, so the
/// UI never stalls silently.
#[must_use]
pub fn derive_question(
    stored: &HashMap<u32, QuestionRecord>,
    payload: &Value,
) -> QuestionRecord {
    let index = question_index(payload);
    let time_left = payload.get("timeRemaining").and_then(Value::as_f64);

    if let Some(record) = stored.get(&index) {
        let mut record = record.clone();
        record.time_left = time_left.or(record.time_left);
        return record;
    }

    let answers = normalize_choices(payload.get("choices"));
    let title = payload
        .get("title")
        .or_else(|| payload.get("question"))
        .and_then(Value::as_str);

    if !answers.is_empty() {
        return QuestionRecord {
            question: title.unwrap_or("Question").to_string(),
            answers,
            question_index: index,
            time_left,
            time: None,
        };
    }

    let question = match title {
        Some(title) => title.to_string(),
        None => format!("Question {} - data not available", index + 1),
    };

    QuestionRecord {
        question,
        answers: vec![Answer {
            text: ANSWERS_PLACEHOLDER.to_string(),
            correct: None,
        }],
        question_index: index,
        time_left,
        time: None,
    }
}

/// Probe the payload for the question's zero-based index.
#[must_use]
pub fn question_index(payload: &Value) -> u32 {
    payload
        .get("gameBlockIndex")
        .or_else(|| payload.get("questionIndex"))
        .and_then(Value::as_u64)
        .map_or(0, |index| u32::try_from(index).unwrap_or(0))
}

/// Whether a quiz-start block payload carries a usable choice list.
#[must_use]
pub fn has_choices(payload: &Value) -> bool {
    payload
        .get("choices")
        .and_then(Value::as_array)
        .is_some_and(|choices| !choices.is_empty())
}
