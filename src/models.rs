use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_KEYWORDS_WEIGHT: f64 = 40.0;
pub const DEFAULT_SECTIONS_WEIGHT: f64 = 20.0;
pub const DEFAULT_STATUS_WEIGHT: f64 = 25.0;
pub const DEFAULT_ASSIGNEE_WEIGHT: f64 = 15.0;
pub const DEFAULT_PASS_MARK: f64 = 80.0;

// Policy value: all sections present but misordered is a lesser defect than
// missing content, but must never score as fully correct.
pub const DEFAULT_ORDER_PENALTY: f64 = 0.8;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpectedRubric {
    pub required_status: String,
    pub required_assignee: String,
    pub keywords: Vec<String>,
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attempt {
    pub reply: String,
    pub status: String,
    pub assignee: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradeWeights {
    pub keywords: f64,
    pub sections: f64,
    pub status: f64,
    pub assignee: f64,
    pub pass: f64,
    pub order_penalty: f64,
}

impl Default for GradeWeights {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS_WEIGHT,
            sections: DEFAULT_SECTIONS_WEIGHT,
            status: DEFAULT_STATUS_WEIGHT,
            assignee: DEFAULT_ASSIGNEE_WEIGHT,
            pass: DEFAULT_PASS_MARK,
            order_penalty: DEFAULT_ORDER_PENALTY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckRecord {
    pub label: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeResult {
    pub checks: Vec<CheckRecord>,
    pub score: f64,
    pub pass: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub customer_name: String,
    pub message: String,
    pub expected: ExpectedRubric,
    pub style_notes: String,
    pub weights: Option<GradeWeights>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleCheck {
    pub label: String,
    pub ok: bool,
    pub detail: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleReview {
    pub checks: Vec<StyleCheck>,
    pub structure_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarChange {
    pub before: String,
    pub after: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarReview {
    pub corrected: String,
    pub changes: Vec<GrammarChange>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GradedAttempt {
    pub trainee: String,
    pub ticket_id: String,
    pub ticket_title: String,
    pub submitted_at: Option<NaiveDate>,
    pub result: GradeResult,
}

#[derive(Debug, Clone)]
pub struct TraineeSummary {
    pub trainee: String,
    pub attempts: usize,
    pub passed: usize,
    pub avg_score: f64,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub graded: Vec<GradedAttempt>,
    pub skipped_unknown: usize,
}
