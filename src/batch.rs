use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    Attempt, BatchOutcome, GradeWeights, GradedAttempt, Scenario, TraineeSummary,
};
use crate::{rubric, scenarios};

pub fn grade_csv(
    catalog: &[Scenario],
    csv_path: &Path,
    defaults: &GradeWeights,
) -> anyhow::Result<BatchOutcome> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open attempts CSV {}", csv_path.display()))?;
    grade_records(catalog, reader, defaults)
}

pub fn grade_records<R: std::io::Read>(
    catalog: &[Scenario],
    mut reader: csv::Reader<R>,
    defaults: &GradeWeights,
) -> anyhow::Result<BatchOutcome> {
    #[derive(serde::Deserialize)]
    struct AttemptRow {
        ticket_id: String,
        trainee: String,
        reply: String,
        status: String,
        assignee: String,
        submitted_at: Option<NaiveDate>,
    }

    let mut graded = Vec::new();
    let mut skipped_unknown = 0usize;

    for result in reader.deserialize::<AttemptRow>() {
        let row = result?;
        let Some(scenario) = scenarios::find(catalog, &row.ticket_id) else {
            skipped_unknown += 1;
            continue;
        };

        let attempt = Attempt {
            reply: row.reply,
            status: row.status,
            assignee: row.assignee,
        };
        let weights = scenario.weights.as_ref().unwrap_or(defaults);
        let outcome = rubric::grade_attempt(&scenario.expected, &attempt, weights);

        // Unnamed rows get a unique placeholder so they never merge into
        // one phantom trainee in the summaries.
        let trainee = if row.trainee.trim().is_empty() {
            format!("trainee-{}", Uuid::new_v4())
        } else {
            row.trainee
        };

        graded.push(GradedAttempt {
            trainee,
            ticket_id: scenario.id.clone(),
            ticket_title: scenario.title.clone(),
            submitted_at: row.submitted_at,
            result: outcome,
        });
    }

    Ok(BatchOutcome {
        run_id: Uuid::new_v4(),
        graded,
        skipped_unknown,
    })
}

pub fn summarize_trainees(graded: &[GradedAttempt]) -> Vec<TraineeSummary> {
    let mut totals: std::collections::HashMap<String, (usize, usize, f64)> =
        std::collections::HashMap::new();

    for attempt in graded {
        let entry = totals.entry(attempt.trainee.clone()).or_insert((0, 0, 0.0));
        entry.0 += 1;
        if attempt.result.pass {
            entry.1 += 1;
        }
        entry.2 += attempt.result.score;
    }

    let mut summaries: Vec<TraineeSummary> = totals
        .into_iter()
        .map(|(trainee, (attempts, passed, total_score))| TraineeSummary {
            trainee,
            attempts,
            passed,
            avg_score: if attempts == 0 {
                0.0
            } else {
                total_score / attempts as f64
            },
        })
        .collect();

    // lowest average first, so coaching attention lands where it is needed
    summaries.sort_by(|a, b| {
        a.avg_score
            .partial_cmp(&b.avg_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpectedRubric;

    fn sample_catalog() -> Vec<Scenario> {
        vec![Scenario {
            id: "refund-001".to_string(),
            title: "Refund after duplicate charge".to_string(),
            expected: ExpectedRubric {
                required_status: "Resolved".to_string(),
                required_assignee: "Billing".to_string(),
                keywords: vec!["refund".to_string()],
                sections: vec![],
            },
            ..Scenario::default()
        }]
    }

    fn reader_from(raw: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(raw.as_bytes())
    }

    #[test]
    fn grades_rows_and_skips_unknown_tickets() {
        let raw = "\
ticket_id,trainee,reply,status,assignee,submitted_at
refund-001,Avery,Your refund is on the way.,Resolved,Billing,2026-02-02
ghost-999,Jules,Hello.,Resolved,Billing,
refund-001,Jules,We cannot help.,Pending,Support,2026-02-03
";
        let outcome =
            grade_records(&sample_catalog(), reader_from(raw), &GradeWeights::default()).unwrap();

        assert_eq!(outcome.graded.len(), 2);
        assert_eq!(outcome.skipped_unknown, 1);

        let avery = &outcome.graded[0];
        assert_eq!(avery.ticket_title, "Refund after duplicate charge");
        assert_eq!(
            avery.submitted_at,
            chrono::NaiveDate::from_ymd_opt(2026, 2, 2)
        );
        assert!(avery.result.pass);

        let jules = &outcome.graded[1];
        assert!(!jules.result.pass);
    }

    #[test]
    fn per_scenario_weights_override_the_defaults() {
        let mut catalog = sample_catalog();
        catalog[0].weights = Some(GradeWeights {
            keywords: 100.0,
            sections: 0.0,
            status: 0.0,
            assignee: 0.0,
            pass: 50.0,
            ..GradeWeights::default()
        });
        let raw = "\
ticket_id,trainee,reply,status,assignee,submitted_at
refund-001,Avery,refund issued,Pending,Nobody,
";
        let outcome =
            grade_records(&catalog, reader_from(raw), &GradeWeights::default()).unwrap();

        // keyword-only weighting: wrong status and assignee cost nothing
        assert!((outcome.graded[0].result.score - 100.0).abs() < 0.001);
        assert!(outcome.graded[0].result.pass);
    }

    #[test]
    fn blank_trainee_names_stay_distinct() {
        let raw = "\
ticket_id,trainee,reply,status,assignee,submitted_at
refund-001,,refund,Resolved,Billing,
refund-001,,refund,Resolved,Billing,
";
        let outcome =
            grade_records(&sample_catalog(), reader_from(raw), &GradeWeights::default()).unwrap();
        let summaries = summarize_trainees(&outcome.graded);

        assert_eq!(summaries.len(), 2);
    }

    #[test]
    fn summaries_surface_lowest_scores_first() {
        let raw = "\
ticket_id,trainee,reply,status,assignee,submitted_at
refund-001,Avery,Your refund is on the way.,Resolved,Billing,
refund-001,Avery,No refund for you.,Pending,Support,
refund-001,Jules,Refund sent just now.,Resolved,Billing,
";
        let outcome =
            grade_records(&sample_catalog(), reader_from(raw), &GradeWeights::default()).unwrap();
        let summaries = summarize_trainees(&outcome.graded);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].trainee, "Avery");
        assert_eq!(summaries[0].attempts, 2);
        assert_eq!(summaries[0].passed, 1);
        assert!(summaries[0].avg_score < summaries[1].avg_score);
        assert_eq!(summaries[1].trainee, "Jules");
        assert_eq!(summaries[1].passed, 1);
    }
}
