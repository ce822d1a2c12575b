use std::path::Path;

use anyhow::Context;

use crate::models::{ExpectedRubric, GradeWeights, Scenario};

pub fn load(path: &Path) -> anyhow::Result<Vec<Scenario>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file {}", path.display()))?;
    parse(&raw).with_context(|| format!("invalid scenario JSON in {}", path.display()))
}

pub fn parse(raw: &str) -> anyhow::Result<Vec<Scenario>> {
    let scenarios: Vec<Scenario> = serde_json::from_str(raw)?;
    Ok(scenarios)
}

pub fn find<'a>(scenarios: &'a [Scenario], id: &str) -> Option<&'a Scenario> {
    scenarios.iter().find(|s| s.id == id)
}

/// Starter catalog written by `init`, mirroring the tickets used in live
/// training sessions.
pub fn seed_catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "refund-001".to_string(),
            title: "Refund after duplicate charge".to_string(),
            customer_name: "Sara".to_string(),
            message: "I was charged twice for my evaluation account this month. \
                      Please refund the second charge."
                .to_string(),
            expected: ExpectedRubric {
                required_status: "Resolved".to_string(),
                required_assignee: "Billing".to_string(),
                keywords: vec!["refund".to_string(), "5-7 business days".to_string()],
                sections: vec!["hello sara".to_string(), "best regards".to_string()],
            },
            style_notes: "Confirm the duplicate charge was found before promising the refund."
                .to_string(),
            weights: None,
        },
        Scenario {
            id: "login-002".to_string(),
            title: "Locked out after password reset".to_string(),
            customer_name: "John".to_string(),
            message: "I reset my password but the dashboard still says my credentials \
                      are invalid. I have a session starting in an hour."
                .to_string(),
            expected: ExpectedRubric {
                required_status: "Pending Customer".to_string(),
                required_assignee: "Support".to_string(),
                keywords: vec![
                    "clear your cache".to_string(),
                    "incognito".to_string(),
                    "reset link".to_string(),
                ],
                sections: vec!["hi john".to_string(), "kind regards".to_string()],
            },
            style_notes: "Acknowledge the time pressure; give the steps in order.".to_string(),
            weights: None,
        },
        Scenario {
            id: "dispute-003".to_string(),
            title: "Disputed evaluation failure".to_string(),
            customer_name: "Priya".to_string(),
            message: "My account was failed for breaking the daily loss limit but my own \
                      records show I stayed under it. I want this reviewed."
                .to_string(),
            expected: ExpectedRubric {
                required_status: "Escalated".to_string(),
                required_assignee: "Risk Review".to_string(),
                keywords: vec!["trade log".to_string(), "review".to_string()],
                sections: vec!["hello priya".to_string(), "best regards".to_string()],
            },
            style_notes: "No promises about the outcome; only that the review will happen."
                .to_string(),
            weights: Some(GradeWeights {
                keywords: 30.0,
                sections: 20.0,
                status: 30.0,
                assignee: 20.0,
                ..GradeWeights::default()
            }),
        },
    ]
}
