//! Quiz-content fetcher.
//!
//! Given a quiz identifier, calls the external quiz-content REST API and
//! normalizes its JSON into [`QuestionRecord`]s. Stateless: no caching and
//! no retries. The HTTP round-trip lives in [`QuizFetcher::fetch`]; the
//! payload reshaping is the pure [`normalize_quiz`] so it can be tested
//! without a network.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single answer choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Display text of the choice.
    pub text: String,
    /// Whether this choice is correct. Only known when the record was
    /// sourced from the content API; the live protocol never carries it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
}

/// Normalized question record, the wire/UI shape shared by the content
/// fetcher and the live relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    /// Question text.
    pub question: String,
    /// Ordered answer choices. Never empty on the relay path (placeholders
    /// are substituted when upstream data is missing).
    pub answers: Vec<Answer>,
    /// Zero-based position of the question within the quiz.
    pub question_index: u32,
    /// Seconds remaining, when the live event carried it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_left: Option<f64>,
    /// Allotted time for the question, when the content API carried it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

/// Full question list for one quiz, as returned by the content endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizContent {
    /// Normalized questions in original order.
    pub questions: Vec<QuestionRecord>,
}

/// Errors from the quiz-content fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The content API answered with a non-success status.
    #[error("quiz lookup failed with status {0}")]
    Status(reqwest::StatusCode),

    /// The request itself failed (DNS, TLS, connect, ...).
    #[error("quiz request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the JSON shape we expect.
    #[error("malformed quiz payload: {0}")]
    Malformed(String),
}

/// Client for the external quiz-content REST API.
#[derive(Debug, Clone)]
pub struct QuizFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl QuizFetcher {
    /// Create a fetcher against the given API base URL
    /// (e.g. `https://create.kahoot.it/rest/kahoots`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch and normalize the question list for `quiz_id`.
    pub async fn fetch(&self, quiz_id: &str) -> Result<QuizContent, FetchError> {
        let url = format!("{}/{quiz_id}", self.base_url.trim_end_matches('/'));

        tracing::debug!(name: "quiz.fetch.requested", url = %url, "Fetching quiz content");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, "Mozilla/5.0")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let questions = normalize_quiz(&body);
        tracing::debug!(
            name: "quiz.fetch.completed",
            question_count = questions.len(),
            "Quiz content normalized"
        );

        Ok(QuizContent { questions })
    }
}

/// Normalize an upstream quiz payload into ordered [`QuestionRecord`]s.
///
/// Pure transformation: each upstream question object maps to
/// `{question, answers, questionIndex: position, time}`. Missing
/// `questions` or `choices` arrays normalize to empty collections.
#[must_use]
pub fn normalize_quiz(payload: &Value) -> Vec<QuestionRecord> {
    let Some(questions) = payload.get("questions").and_then(Value::as_array) else {
        return Vec::new();
    };

    questions
        .iter()
        .enumerate()
        .map(|(index, q)| QuestionRecord {
            question: q
                .get("question")
                .or_else(|| q.get("title"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            answers: normalize_choices(q.get("choices")),
            question_index: index as u32,
            time_left: None,
            time: q.get("time").and_then(Value::as_f64),
        })
        .collect()
}

/// Map an upstream `choices` array to [`Answer`]s, preserving `correct`
/// only where present upstream.
#[must_use]
pub fn normalize_choices(choices: Option<&Value>) -> Vec<Answer> {
    choices
        .and_then(Value::as_array)
        .map(|choices| {
            choices
                .iter()
                .filter_map(|choice| {
                    let text = choice
                        .get("answer")
                        .or_else(|| choice.get("text"))
                        .and_then(Value::as_str)?;
                    Some(Answer {
                        text: text.to_string(),
                        correct: choice.get("correct").and_then(Value::as_bool),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}
