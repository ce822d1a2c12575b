//! Style Grader client: qualitative tone/structure review of a trainee reply
//! over an OpenAI-compatible chat completions API.
//!
//! The wire contract is fixed: five structure checks with fixed labels plus
//! an overall structure percentage. Whatever the model returns is sanitized
//! onto that shape; callers degrade to [`unavailable_review`] on failure
//! instead of surfacing a fatal error.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::{GrammarChange, GrammarReview, StyleCheck, StyleReview};

pub const STRUCTURE_LABELS: [&str; 5] = ["Greeting", "Opener", "Solution", "Closer", "Sign-Off"];

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

const REQUEST_TIMEOUT_MS: u64 = 60_000;

const STYLE_GUIDE: &str = "\
Support Ticket Style Guide

1) Greeting: use the customer's first name; brief and warm; leave one blank \
line after the greeting.
2) Opener: one short, polite opening sentence; do not fail purely for length \
or a natural exclamation mark.
3) Solution: the most important part; a clear cause or explanation AND a \
specific, actionable step the customer can take now.
4) Closer: a single short professional line; an invitation to reach out \
again, an empathetic acknowledgement, or a brief thank-you all qualify.
5) Sign-Off: standard sign-off (e.g. \"Best regards,\") with the agent's \
first name on its own line.";

#[derive(Error, Debug)]
pub enum StyleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("style grader returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("style grader returned an empty completion")]
    EmptyCompletion,
}

/// Client for the remote style grading endpoint.
pub struct StyleClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawReview {
    checks: Vec<RawCheck>,
    structure_pct: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCheck {
    ok: Option<bool>,
    detail: Option<String>,
    score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGrammar {
    corrected: String,
    changes: Vec<RawChange>,
    warnings: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawChange {
    before: String,
    after: String,
    reason: String,
}

impl StyleClient {
    /// `base_url` should be like `https://api.openai.com/v1` (no trailing slash).
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Ask the remote grader for a structure/style review of one reply.
    pub async fn review(&self, reply: &str, rubric_notes: &str) -> Result<StyleReview, StyleError> {
        let system = "You are a strict, fair QA grader for support tickets. Judge ONLY by \
                      the style guide and the ticket-specific requirements. Be concise and \
                      deterministic.";
        let labels = STRUCTURE_LABELS.join(", ");
        let notes = if rubric_notes.trim().is_empty() {
            "None."
        } else {
            rubric_notes
        };
        let user = format!(
            "You are grading a customer support reply for structure and style.\n\n\
             Structure labels to check, in order: {labels}\n\n\
             STYLE GUIDE:\n{STYLE_GUIDE}\n\n\
             TICKET-SPECIFIC REQUIREMENTS (if any):\n{notes}\n\n\
             TRAINEE REPLY:\n\"\"\"{reply}\"\"\"\n\n\
             Return a JSON object with \"checks\": exactly these 5 items in order and \
             with these exact labels ({labels}), each {{label, ok, detail, score}} with \
             score 0-100, and \"structurePct\" (0-100) as your overall structure score."
        );

        let content = self.post_chat(system, &user).await?;
        let raw: RawReview = serde_json::from_str(&content)?;
        Ok(sanitize_review(raw))
    }

    /// Grammar/clarity pass over a draft reply. Meaning, facts, names and
    /// links must survive; only wording is corrected.
    pub async fn polish(&self, text: &str) -> Result<GrammarReview, StyleError> {
        let system = "You are a careful copy editor for customer support emails. Fix \
                      grammar, punctuation, capitalization, and clarity. Keep meaning, \
                      facts, names, links, and placeholders intact. Do not invent content.";
        let user = format!(
            "Original:\n\"\"\"{text}\"\"\"\n\n\
             Return a JSON object with:\n\
             - \"corrected\": the improved text (single complete suggestion).\n\
             - \"changes\": a few key before/after snippets with a short \"reason\".\n\
             - \"warnings\": optional general notes (e.g., tone)."
        );

        let content = self.post_chat(system, &user).await?;
        let raw: RawGrammar = serde_json::from_str(&content)?;
        Ok(sanitize_grammar(text, raw))
    }

    async fn post_chat(&self, system: &str, user: &str) -> Result<String, StyleError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        info!(url = %url, model = %self.model, "requesting style grader completion");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StyleError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = resp.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(StyleError::EmptyCompletion)
    }
}

/// Safe default when the remote grader is unreachable or unparseable.
pub fn unavailable_review() -> StyleReview {
    StyleReview {
        checks: STRUCTURE_LABELS
            .iter()
            .map(|label| StyleCheck {
                label: label.to_string(),
                ok: false,
                detail: "unavailable".to_string(),
                score: 0.0,
            })
            .collect(),
        structure_pct: 0.0,
    }
}

/// Safe default for the grammar pass: the draft comes back untouched.
pub fn unchanged_review(text: &str) -> GrammarReview {
    GrammarReview {
        corrected: text.to_string(),
        changes: Vec::new(),
        warnings: Vec::new(),
    }
}

fn sanitize_review(raw: RawReview) -> StyleReview {
    let checks = STRUCTURE_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| match raw.checks.get(i) {
            Some(check) => {
                let ok = check.ok.unwrap_or(false);
                let detail = match check.detail.as_deref() {
                    Some(detail) if !detail.is_empty() => detail.to_string(),
                    _ => "Not met".to_string(),
                };
                let score = clamp_score(check.score.unwrap_or(if ok { 100.0 } else { 0.0 }));
                StyleCheck {
                    label: label.to_string(),
                    ok,
                    detail,
                    score,
                }
            }
            None => StyleCheck {
                label: label.to_string(),
                ok: false,
                detail: "unavailable".to_string(),
                score: 0.0,
            },
        })
        .collect();

    StyleReview {
        checks,
        structure_pct: clamp_score(raw.structure_pct),
    }
}

fn sanitize_grammar(input: &str, raw: RawGrammar) -> GrammarReview {
    let corrected = raw.corrected.trim();
    GrammarReview {
        corrected: if corrected.is_empty() {
            input.to_string()
        } else {
            corrected.to_string()
        },
        changes: raw
            .changes
            .into_iter()
            .map(|change| GrammarChange {
                before: change.before,
                after: change.after,
                reason: change.reason,
            })
            .collect(),
        warnings: raw.warnings,
    }
}

fn clamp_score(n: f64) -> f64 {
    if !n.is_finite() {
        0.0
    } else {
        n.clamp(0.0, 100.0)
    }
}
