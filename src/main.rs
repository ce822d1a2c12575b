use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Args, Parser, Subcommand};

mod batch;
mod models;
mod report;
mod rubric;
mod scenarios;
mod style;

use models::Attempt;

#[derive(Parser)]
#[command(name = "ticket-grader")]
#[command(about = "Support ticket reply grader for trainee coaching", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WeightArgs {
    #[arg(long, default_value_t = models::DEFAULT_KEYWORDS_WEIGHT)]
    keywords_weight: f64,
    #[arg(long, default_value_t = models::DEFAULT_SECTIONS_WEIGHT)]
    sections_weight: f64,
    #[arg(long, default_value_t = models::DEFAULT_STATUS_WEIGHT)]
    status_weight: f64,
    #[arg(long, default_value_t = models::DEFAULT_ASSIGNEE_WEIGHT)]
    assignee_weight: f64,
    #[arg(long, default_value_t = models::DEFAULT_PASS_MARK)]
    pass_mark: f64,
}

impl WeightArgs {
    fn to_weights(&self) -> models::GradeWeights {
        models::GradeWeights {
            keywords: self.keywords_weight,
            sections: self.sections_weight,
            status: self.status_weight,
            assignee: self.assignee_weight,
            pass: self.pass_mark,
            ..models::GradeWeights::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter scenario catalog and attempts CSV template
    Init {
        #[arg(long, default_value = "data")]
        dir: PathBuf,
    },
    /// List the scenario catalog
    Scenarios {
        #[arg(long)]
        file: PathBuf,
    },
    /// Grade one reply against one ticket's rubric
    #[command(group(
        ArgGroup::new("reply_source")
            .args(["reply", "reply_file"])
            .required(true)
    ))]
    Grade {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        ticket: String,
        #[arg(long)]
        reply: Option<String>,
        #[arg(long)]
        reply_file: Option<PathBuf>,
        #[arg(long, default_value = "")]
        status: String,
        #[arg(long, default_value = "")]
        assignee: String,
        #[command(flatten)]
        weights: WeightArgs,
        /// Also request a style review from the remote grader
        #[arg(long)]
        style: bool,
        /// Emit the result as JSON instead of text
        #[arg(long)]
        json: bool,
        /// Write a markdown report to this path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Grade a CSV of trainee attempts
    Batch {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[command(flatten)]
        weights: WeightArgs,
    },
    /// Write a markdown report for a batch of attempts
    Report {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        csv: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[command(flatten)]
        weights: WeightArgs,
    },
    /// Grammar and clarity pass over a draft reply
    #[command(group(
        ArgGroup::new("draft_source")
            .args(["text", "text_file"])
            .required(true)
    ))]
    Polish {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        text_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { dir } => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;

            let catalog_path = dir.join("scenarios.json");
            let catalog = scenarios::seed_catalog();
            std::fs::write(&catalog_path, serde_json::to_string_pretty(&catalog)?)?;

            let csv_path = dir.join("attempts.csv");
            std::fs::write(
                &csv_path,
                "ticket_id,trainee,reply,status,assignee,submitted_at\n",
            )?;

            println!("Starter catalog written to {}.", catalog_path.display());
            println!("Attempts template written to {}.", csv_path.display());
        }
        Commands::Scenarios { file } => {
            let catalog = scenarios::load(&file)?;
            if catalog.is_empty() {
                println!("No scenarios in {}.", file.display());
                return Ok(());
            }
            for scenario in catalog.iter() {
                println!(
                    "- {}: {} (status {}, assignee {}, {} keywords, {} sections)",
                    scenario.id,
                    scenario.title,
                    scenario.expected.required_status,
                    scenario.expected.required_assignee,
                    scenario.expected.keywords.len(),
                    scenario.expected.sections.len()
                );
            }
        }
        Commands::Grade {
            file,
            ticket,
            reply,
            reply_file,
            status,
            assignee,
            weights,
            style: with_style,
            json,
            out,
        } => {
            let catalog = scenarios::load(&file)?;
            let scenario = scenarios::find(&catalog, &ticket)
                .with_context(|| format!("unknown ticket id {ticket}"))?;

            let reply_text = if let Some(text) = reply {
                text
            } else {
                let path = reply_file.context("either --reply or --reply-file is required")?;
                std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read reply file {}", path.display()))?
            };

            let attempt = Attempt {
                reply: reply_text,
                status,
                assignee,
            };
            let weights = scenario
                .weights
                .clone()
                .unwrap_or_else(|| weights.to_weights());
            let result = rubric::grade_attempt(&scenario.expected, &attempt, &weights);

            let style_review = if with_style {
                let client = style_client_from_env()?;
                match client.review(&attempt.reply, &scenario.style_notes).await {
                    Ok(review) => Some(review),
                    Err(err) => {
                        tracing::warn!(error = %err, "style grader unavailable, degrading");
                        Some(style::unavailable_review())
                    }
                }
            } else {
                None
            };

            if json {
                let payload = serde_json::json!({
                    "rubric": &result,
                    "style": &style_review,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} - {:.1} / 100 (pass mark {:.0})",
                    if result.pass { "PASS" } else { "FAIL" },
                    result.score,
                    weights.pass
                );
                for check in result.checks.iter() {
                    let mark = if check.ok { "x" } else { " " };
                    println!("- [{mark}] {}: {}", check.label, check.detail);
                }
                if let Some(review) = style_review.as_ref() {
                    println!("Style structure score: {:.0} / 100", review.structure_pct);
                    for check in review.checks.iter() {
                        let mark = if check.ok { "x" } else { " " };
                        println!("- [{mark}] {}: {}", check.label, check.detail);
                    }
                }
            }

            if let Some(out) = out {
                let rendered = report::build_report(
                    scenario,
                    &result,
                    style_review.as_ref(),
                    &weights,
                    Utc::now().date_naive(),
                );
                std::fs::write(&out, rendered)?;
                println!("Report written to {}.", out.display());
            }
        }
        Commands::Batch {
            file,
            csv,
            limit,
            weights,
        } => {
            let catalog = scenarios::load(&file)?;
            let outcome = batch::grade_csv(&catalog, &csv, &weights.to_weights())?;

            if outcome.graded.is_empty() {
                println!(
                    "No gradeable attempts found ({} rows skipped).",
                    outcome.skipped_unknown
                );
                return Ok(());
            }

            println!(
                "Batch run {} graded {} attempts ({} rows skipped).",
                outcome.run_id,
                outcome.graded.len(),
                outcome.skipped_unknown
            );
            println!("Trainees needing coaching:");
            for summary in batch::summarize_trainees(&outcome.graded).iter().take(limit) {
                println!(
                    "- {} avg {:.1} across {} attempts ({} passed)",
                    summary.trainee, summary.avg_score, summary.attempts, summary.passed
                );
            }
        }
        Commands::Report {
            file,
            csv,
            out,
            weights,
        } => {
            let catalog = scenarios::load(&file)?;
            let outcome = batch::grade_csv(&catalog, &csv, &weights.to_weights())?;
            let rendered = report::build_batch_report(&outcome, Utc::now().date_naive());
            std::fs::write(&out, rendered)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Polish { text, text_file } => {
            let draft = if let Some(text) = text {
                text
            } else {
                let path = text_file.context("either --text or --text-file is required")?;
                std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read draft file {}", path.display()))?
            };

            let client = style_client_from_env()?;
            let review = match client.polish(&draft).await {
                Ok(review) => review,
                Err(err) => {
                    tracing::warn!(error = %err, "grammar pass unavailable, returning draft");
                    style::unchanged_review(&draft)
                }
            };

            println!("{}", review.corrected);
            if !review.changes.is_empty() {
                println!();
                println!("Changes:");
                for change in review.changes.iter() {
                    println!(
                        "- \"{}\" -> \"{}\" ({})",
                        change.before, change.after, change.reason
                    );
                }
            }
            for warning in review.warnings.iter() {
                println!("Note: {warning}");
            }
        }
    }

    Ok(())
}

fn style_client_from_env() -> anyhow::Result<style::StyleClient> {
    let api_key = std::env::var("STYLE_API_KEY")
        .context("STYLE_API_KEY must be set to call the style grader")?;
    let api_url =
        std::env::var("STYLE_API_URL").unwrap_or_else(|_| style::DEFAULT_API_URL.to_string());
    let model = std::env::var("STYLE_MODEL").unwrap_or_else(|_| style::DEFAULT_MODEL.to_string());
    Ok(style::StyleClient::new(api_url, api_key, model))
}
