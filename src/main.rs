use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use edusafe::models::{RiskProfile, RiskTier};
use edusafe::report;
use edusafe::risk::sort_by_score;
use edusafe::{get_risk_distribution, loader, EngineError, SourceSet};

#[derive(Parser)]
#[command(name = "edusafe")]
#[command(about = "Transparent dropout early-warning scores from attendance, assessment and attempts data", long_about = None)]
struct Cli {
    /// Number of At Risk students that triggers the alert banner
    #[arg(
        long,
        global = true,
        env = "EDUSAFE_ALERT_THRESHOLD",
        default_value_t = 1
    )]
    alert_threshold: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Datasets {
    /// CSV with StudentID,AttendancePercentage
    #[arg(long)]
    attendance: PathBuf,
    /// CSV with StudentID,TestScore1,TestScore2,TestScore3
    #[arg(long)]
    assessment: PathBuf,
    /// CSV with StudentID,AttemptsUsed
    #[arg(long)]
    attempts: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every student and print the ranked table
    Analyze {
        #[command(flatten)]
        datasets: Datasets,
        /// Maximum number of students listed, in text and JSON output
        #[arg(long, default_value_t = 25)]
        limit: usize,
        /// Only show students in this tier (safe, watchlist, at-risk)
        #[arg(long)]
        tier: Option<RiskTier>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        datasets: Datasets,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Explain one student's score
    Explain {
        #[command(flatten)]
        datasets: Datasets,
        #[arg(long)]
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            datasets,
            limit,
            tier,
            format,
        } => {
            let mut profiles = score(&datasets)?;
            sort_by_score(&mut profiles);
            let distribution = get_risk_distribution(&profiles);

            if let Some(tier) = tier {
                profiles.retain(|profile| profile.tier == tier);
            }

            match format {
                OutputFormat::Json => {
                    let shown = &profiles[..limit.min(profiles.len())];
                    let json = report::build_json(
                        shown,
                        &distribution,
                        cli.alert_threshold,
                        chrono::Utc::now(),
                    )?;
                    println!("{json}");
                }
                OutputFormat::Text => {
                    if distribution.needs_alert(cli.alert_threshold) {
                        println!("{}", report::alert_message(&distribution));
                        println!();
                    }

                    if profiles.is_empty() {
                        println!("No students to show.");
                    } else {
                        print!("{}", report::build_table(&profiles, limit));
                    }

                    println!();
                    println!("Risk distribution ({} students):", distribution.total());
                    print!("{}", report::build_distribution(&distribution));
                }
            }
        }
        Commands::Report { datasets, out } => {
            let mut profiles = score(&datasets)?;
            sort_by_score(&mut profiles);
            let distribution = get_risk_distribution(&profiles);
            let report = report::build_report(
                &profiles,
                &distribution,
                cli.alert_threshold,
                chrono::Utc::now(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Explain { datasets, id } => {
            let profiles = score(&datasets)?;
            let profile = profiles
                .into_iter()
                .find(|profile| profile.student_id == id.trim())
                .ok_or_else(|| EngineError::UnknownStudent(id.clone()))?;
            print_explanation(&profile);
        }
    }

    Ok(())
}

fn score(datasets: &Datasets) -> anyhow::Result<Vec<RiskProfile>> {
    let sources = SourceSet::new(
        loader::load_attendance(&datasets.attendance)?,
        loader::load_assessment(&datasets.assessment)?,
        loader::load_attempts(&datasets.attempts)?,
    );
    debug!("all three datasets loaded");

    let profiles = sources.analyze()?;
    info!(students = profiles.len(), "scored students");
    Ok(profiles)
}

fn print_explanation(profile: &RiskProfile) {
    let record = &profile.source_record;
    let scores = record
        .scores
        .iter()
        .map(|score| report::format_value(*score))
        .collect::<Vec<_>>()
        .join(" -> ");
    let attempts = record
        .attempts_used
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("{} scored {} ({})", profile.student_id, profile.score, profile.tier);
    println!(
        "  attendance {}%, scores {}, attempts {}",
        report::format_value(record.attendance_percentage),
        scores,
        attempts
    );

    if profile.triggered_factors.is_empty() {
        println!("  no risk factors triggered");
    } else {
        for factor in &profile.triggered_factors {
            println!("  +{:<3} {}", factor.points, factor.label);
        }
    }

    let missing = record.sources.missing();
    if !missing.is_empty() {
        let names = missing
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!("  not present in: {names}");
    }
}
