use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

mod data;
mod grade;
mod models;
mod report;

#[derive(Parser)]
#[command(name = "grade-rollup")]
#[command(about = "Weighted grade summaries per learner from course submission data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write sample fixture files to try the tool against
    Sample {
        #[arg(long, default_value = "sample-data")]
        out_dir: PathBuf,
    },
    /// Score learners and print their weighted averages
    Score {
        #[arg(long)]
        course: PathBuf,
        #[arg(long)]
        group: PathBuf,
        /// Submissions file, JSON array or CSV
        #[arg(long)]
        submissions: PathBuf,
        /// Evaluation instant (ISO-8601); defaults to now
        #[arg(long)]
        as_of: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print the full result array as JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        course: PathBuf,
        #[arg(long)]
        group: PathBuf,
        #[arg(long)]
        submissions: PathBuf,
        #[arg(long)]
        as_of: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample { out_dir } => {
            data::write_samples(&out_dir)?;
            println!("Sample fixtures written to {}.", out_dir.display());
        }
        Commands::Score {
            course,
            group,
            submissions,
            as_of,
            limit,
            json,
        } => {
            let course = data::load_course(&course)?;
            let group = data::load_group(&group)?;
            let (submissions, skipped) = data::load_submissions(&submissions)?;
            if skipped > 0 {
                eprintln!("Skipped {skipped} malformed submission rows.");
            }

            let as_of = resolve_as_of(as_of.as_deref())?;
            let records = grade::compute_learner_data(&course, &group, &submissions, as_of)?;

            if records.is_empty() {
                println!("No learners with scoreable submissions.");
                return Ok(());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }

            let mut ranked = records;
            ranked.sort_by(|a, b| {
                b.avg
                    .partial_cmp(&a.avg)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            println!("Top learners by weighted average:");
            for record in ranked.iter().take(limit) {
                println!(
                    "- learner {} avg {:.2}% across {} scored assignments",
                    record.id,
                    record.avg,
                    record.scores.len()
                );
            }
        }
        Commands::Report {
            course,
            group,
            submissions,
            as_of,
            out,
        } => {
            let course = data::load_course(&course)?;
            let group = data::load_group(&group)?;
            let (submissions, skipped) = data::load_submissions(&submissions)?;
            if skipped > 0 {
                eprintln!("Skipped {skipped} malformed submission rows.");
            }

            let as_of = resolve_as_of(as_of.as_deref())?;
            let records = grade::compute_learner_data(&course, &group, &submissions, as_of)?;
            let report = report::build_report(&course, &group, &submissions, &records, as_of);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn resolve_as_of(raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match raw {
        None => Ok(Utc::now()),
        Some(raw) => {
            models::parse_instant(raw).with_context(|| format!("invalid --as-of instant: {raw}"))
        }
    }
}
