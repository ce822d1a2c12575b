use crate::models::{Attempt, CheckRecord, ExpectedRubric, GradeResult, GradeWeights};

/// Grades one trainee attempt against the expected rubric.
///
/// Text checks are case-insensitive substring matches; status and assignee
/// are exact, case-sensitive equality. Empty rubric fields are treated as
/// "no constraint" and score as satisfied. The result always carries four
/// checks in fixed order: keywords, sections, status, assignee.
pub fn grade_attempt(
    expected: &ExpectedRubric,
    attempt: &Attempt,
    weights: &GradeWeights,
) -> GradeResult {
    let reply = attempt.reply.to_lowercase();
    let mut checks = Vec::with_capacity(4);

    // Keywords: existence-based coverage, order irrelevant
    let need: Vec<String> = expected.keywords.iter().map(|k| k.to_lowercase()).collect();
    let found = need.iter().filter(|k| reply.contains(k.as_str())).count();
    let kw_pct = if need.is_empty() {
        1.0
    } else {
        found as f64 / need.len() as f64
    };
    checks.push(CheckRecord {
        label: format!("Ticket response keywords ({found}/{})", need.len()),
        ok: kw_pct == 1.0,
        detail: need
            .iter()
            .map(|k| {
                let mark = if reply.contains(k.as_str()) { "✅" } else { "❌" };
                format!("{mark} {k}")
            })
            .collect::<Vec<_>>()
            .join(", "),
    });

    // Sections: presence plus narrative order
    let sections: Vec<String> = expected.sections.iter().map(|s| s.to_lowercase()).collect();
    let mut order_ok = true;
    let mut last_idx: Option<usize> = None;
    let mut missing: Vec<&str> = Vec::new();
    for sec in sections.iter() {
        match reply.find(sec.as_str()) {
            None => {
                missing.push(sec.as_str());
                order_ok = false;
            }
            Some(idx) => {
                if last_idx.is_some_and(|last| idx < last) {
                    order_ok = false;
                }
                last_idx = Some(idx);
            }
        }
    }
    let section_pct = if sections.is_empty() {
        1.0
    } else {
        let present = (sections.len() - missing.len()) as f64 / sections.len() as f64;
        present * if order_ok { 1.0 } else { weights.order_penalty }
    };
    checks.push(CheckRecord {
        label: "Response structure (sections)".to_string(),
        ok: section_pct == 1.0,
        detail: if sections.is_empty() {
            "Not required".to_string()
        } else if !missing.is_empty() {
            format!("Missing: {}", missing.join(", "))
        } else if order_ok {
            "OK".to_string()
        } else {
            "Out of order".to_string()
        },
    });

    // Submit As
    let status_ok = attempt.status == expected.required_status;
    checks.push(CheckRecord {
        label: format!("Submit As is \"{}\"", expected.required_status),
        ok: status_ok,
        detail: format!("Selected: {}", attempt.status),
    });

    // Assignee
    let assignee_ok = attempt.assignee == expected.required_assignee;
    checks.push(CheckRecord {
        label: format!("Assignee is \"{}\"", expected.required_assignee),
        ok: assignee_ok,
        detail: format!("Selected: {}", attempt.assignee),
    });

    // Weighted score, normalized; the floor of 1 keeps an all-zero weight
    // configuration defined instead of dividing by zero.
    let sum = (weights.keywords + weights.sections + weights.status + weights.assignee).max(1.0);
    let earned = kw_pct * weights.keywords
        + section_pct * weights.sections
        + if status_ok { weights.status } else { 0.0 }
        + if assignee_ok { weights.assignee } else { 0.0 };
    let score = 100.0 * earned / sum;

    GradeResult {
        checks,
        score,
        pass: score >= weights.pass,
    }
}
