use std::fmt::Write;

use chrono::NaiveDate;

use crate::batch;
use crate::models::{BatchOutcome, GradeResult, GradeWeights, Scenario, StyleReview};

pub fn build_report(
    scenario: &Scenario,
    result: &GradeResult,
    style: Option<&StyleReview>,
    weights: &GradeWeights,
    generated_on: NaiveDate,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Ticket Grading Report");
    let _ = writeln!(
        output,
        "{} ({}) - graded {}",
        scenario.title, scenario.id, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Rubric Checks");

    for check in result.checks.iter() {
        let mark = if check.ok { "x" } else { " " };
        let _ = writeln!(output, "- [{mark}] {}: {}", check.label, check.detail);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score");
    let _ = writeln!(
        output,
        "{:.1} / 100 - {} (threshold {:.0})",
        result.score,
        if result.pass { "PASS" } else { "FAIL" },
        weights.pass
    );

    if let Some(review) = style {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Style Review");
        for check in review.checks.iter() {
            let mark = if check.ok { "x" } else { " " };
            let _ = writeln!(
                output,
                "- [{mark}] {}: {} ({:.0})",
                check.label, check.detail, check.score
            );
        }
        let _ = writeln!(output, "Structure score: {:.0} / 100", review.structure_pct);
    }

    output
}

pub fn build_batch_report(outcome: &BatchOutcome, generated_on: NaiveDate) -> String {
    let summaries = batch::summarize_trainees(&outcome.graded);

    let mut output = String::new();
    let _ = writeln!(output, "# Training Batch Report");
    let _ = writeln!(output, "Run {} generated {}", outcome.run_id, generated_on);
    let _ = writeln!(
        output,
        "{} attempts graded, {} rows skipped (unknown ticket id)",
        outcome.graded.len(),
        outcome.skipped_unknown
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Trainees Needing Coaching");

    if summaries.is_empty() {
        let _ = writeln!(output, "No attempts graded in this batch.");
    } else {
        for summary in summaries.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} avg {:.1} across {} attempts ({} passed)",
                summary.trainee, summary.avg_score, summary.attempts, summary.passed
            );
        }
    }

    let mut recent = outcome.graded.clone();
    recent.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Attempts");

    if recent.is_empty() {
        let _ = writeln!(output, "No attempts graded in this batch.");
    } else {
        for attempt in recent.iter().take(5) {
            let when = attempt
                .submitted_at
                .map(|date| date.to_string())
                .unwrap_or_else(|| "undated".to_string());
            let _ = writeln!(
                output,
                "- {} on {} [{}] ({}): {:.1} {}",
                attempt.trainee,
                attempt.ticket_title,
                attempt.ticket_id,
                when,
                attempt.result.score,
                if attempt.result.pass { "PASS" } else { "FAIL" }
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attempt, ExpectedRubric};
    use crate::rubric;
    use uuid::Uuid;

    fn graded_sample() -> (Scenario, GradeResult, GradeWeights) {
        let scenario = Scenario {
            id: "refund-001".to_string(),
            title: "Refund after duplicate charge".to_string(),
            expected: ExpectedRubric {
                required_status: "Resolved".to_string(),
                required_assignee: "Billing".to_string(),
                keywords: vec!["refund".to_string()],
                sections: vec![],
            },
            ..Scenario::default()
        };
        let attempt = Attempt {
            reply: "Your refund is on the way.".to_string(),
            status: "Resolved".to_string(),
            assignee: "Billing".to_string(),
        };
        let weights = GradeWeights::default();
        let result = rubric::grade_attempt(&scenario.expected, &attempt, &weights);
        (scenario, result, weights)
    }

    #[test]
    fn report_carries_checks_and_verdict() {
        let (scenario, result, weights) = graded_sample();
        let date = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let report = build_report(&scenario, &result, None, &weights, date);

        assert!(report.contains("# Ticket Grading Report"));
        assert!(report.contains("Refund after duplicate charge (refund-001) - graded 2026-02-05"));
        assert!(report.contains("- [x] Ticket response keywords (1/1): ✅ refund"));
        assert!(report.contains("100.0 / 100 - PASS (threshold 80)"));
        assert!(!report.contains("## Style Review"));
    }

    #[test]
    fn report_includes_style_section_when_present() {
        let (scenario, result, weights) = graded_sample();
        let review = crate::style::unavailable_review();
        let date = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let report = build_report(&scenario, &result, Some(&review), &weights, date);

        assert!(report.contains("## Style Review"));
        assert!(report.contains("- [ ] Greeting: unavailable (0)"));
        assert!(report.contains("Structure score: 0 / 100"));
    }

    #[test]
    fn empty_batch_report_says_so() {
        let outcome = BatchOutcome {
            run_id: Uuid::new_v4(),
            graded: vec![],
            skipped_unknown: 2,
        };
        let date = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let report = build_batch_report(&outcome, date);

        assert!(report.contains("0 attempts graded, 2 rows skipped"));
        assert!(report.contains("No attempts graded in this batch."));
    }

    #[test]
    fn batch_report_lists_trainees_and_recent_attempts() {
        let (scenario, result, _) = graded_sample();
        let outcome = BatchOutcome {
            run_id: Uuid::new_v4(),
            graded: vec![crate::models::GradedAttempt {
                trainee: "Avery".to_string(),
                ticket_id: scenario.id.clone(),
                ticket_title: scenario.title.clone(),
                submitted_at: NaiveDate::from_ymd_opt(2026, 2, 2),
                result,
            }],
            skipped_unknown: 0,
        };
        let date = NaiveDate::from_ymd_opt(2026, 2, 5).unwrap();
        let report = build_batch_report(&outcome, date);

        assert!(report.contains("- Avery avg 100.0 across 1 attempts (1 passed)"));
        assert!(report.contains(
            "- Avery on Refund after duplicate charge [refund-001] (2026-02-02): 100.0 PASS"
        ));
    }
}
