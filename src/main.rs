use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod client;
mod config;
mod error;
mod fetch;
mod models;
mod normalize;
mod priority;
mod report;
mod scene;

use client::UrbanWatchClient;
use error::ApiError;
use fetch::FetchState;
use models::{PriorityBand, ReportFilter, ReportStatus};
use scene::MapScene;

#[derive(Parser)]
#[command(name = "urbanwatch")]
#[command(about = "Operator dashboard for UrbanWatch civic issue reports", long_about = None)]
struct Cli {
    /// Backend base URL, overriding URBANWATCH_API_URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List priority reports ranked by criticality
    Priority {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List all reports with optional filters
    Reports {
        #[arg(long, value_enum)]
        status: Option<ReportStatus>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        /// Match title, location or report id
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one report in detail
    Show { id: String },
    /// Change a report's status
    SetStatus {
        id: String,
        #[arg(value_enum)]
        status: ReportStatus,
        #[arg(long)]
        note: Option<String>,
    },
    /// Show summary counts
    Summary,
    /// Priority list and summary side by side
    Dashboard {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Poll priority reports and print map marker changes
    Watch {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
        /// Stop after this many polls
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        rounds: Option<u32>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export normalized reports as CSV
    Export {
        #[arg(long, default_value = "issues.csv")]
        csv: PathBuf,
        #[arg(long, value_enum)]
        status: Option<ReportStatus>,
        #[arg(long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("urbanwatch_dashboard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = config::Config::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config = config.with_base_url(base_url)?;
    }
    tracing::info!(base_url = %config.base_url, "Using UrbanWatch backend");

    let client = UrbanWatchClient::new(&config).context("failed to build HTTP client")?;

    match cli.command {
        Commands::Priority { limit } => {
            let mut issues = client
                .priority_issues()
                .await
                .context("failed to fetch priority reports")?;
            priority::rank_issues(&mut issues);

            if issues.is_empty() {
                println!("No priority reports right now.");
                return Ok(());
            }

            println!("Priority reports:");
            for (index, issue) in issues.iter().take(limit).enumerate() {
                println!("{}", report::format_issue_line(index + 1, issue));
            }
        }
        Commands::Reports {
            status,
            category,
            limit,
            offset,
            search,
        } => {
            let filter = ReportFilter {
                status,
                category,
                limit,
                offset,
            };
            let (issues, pagination) = client
                .issues(&filter)
                .await
                .context("failed to fetch reports")?;
            let matches = report::search_issues(&issues, search.as_deref().unwrap_or_default());

            if matches.is_empty() {
                println!("No reports match.");
            }
            for (index, issue) in matches.iter().enumerate() {
                println!("{}", report::format_issue_line(index + 1, issue));
            }
            println!(
                "Showing {} of {} (limit {}, offset {}).",
                matches.len(),
                pagination.total,
                pagination.limit,
                pagination.offset
            );
        }
        Commands::Show { id } => match client.issue(&id).await {
            Ok(issue) => print!("{}", report::format_issue_detail(&issue)),
            Err(err) if err.status() == Some(404) || matches!(err, ApiError::NotFound(_)) => {
                println!("Report {id} not found.");
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to fetch report {id}"));
            }
        },
        Commands::SetStatus { id, status, note } => {
            let issue = client
                .set_issue_status(&id, status, note.as_deref())
                .await
                .with_context(|| format!("status of report {id} was not changed"))?;
            println!("Report {} is now {}.", issue.key, issue.status().unwrap_or("Unknown"));
            print!("{}", report::format_issue_detail(&issue));
        }
        Commands::Summary => {
            let summary = client.stats().await.context("failed to fetch summary")?;
            print!("{}", report::format_summary(&summary));
            if !summary.is_consistent() {
                tracing::warn!(
                    total = summary.total_reports,
                    band_total = ?summary.band_total(),
                    "Band counts do not add up to the total"
                );
            }
        }
        Commands::Dashboard { limit } => {
            let mut priority_fetch = fetch::spawn_fetch({
                let client = client.clone();
                async move { client.priority_issues().await }
            });
            let mut summary_fetch = fetch::spawn_fetch({
                let client = client.clone();
                async move { client.stats().await }
            });
            let (priority_state, summary_state) =
                tokio::join!(priority_fetch.settled(), summary_fetch.settled());

            match summary_state {
                FetchState::Loaded(summary) => print!("{}", report::format_summary(&summary)),
                FetchState::Failed(message) => println!("Summary unavailable: {message}"),
                FetchState::Loading => {}
            }
            println!();

            match priority_state {
                FetchState::Loaded(mut issues) => {
                    priority::rank_issues(&mut issues);
                    let scene = MapScene::from_issues(&issues);
                    if scene.is_empty() {
                        println!("Map: no markers");
                    } else {
                        println!(
                            "Map: {} markers ({} high, {} medium, {} low)",
                            scene.len(),
                            scene.count_by_band(PriorityBand::High),
                            scene.count_by_band(PriorityBand::Medium),
                            scene.count_by_band(PriorityBand::Low)
                        );
                    }
                    if let Some((south_west, north_east)) = scene.bounds() {
                        println!(
                            "Bounds: [{:.4}, {:.4}] to [{:.4}, {:.4}]",
                            south_west[0], south_west[1], north_east[0], north_east[1]
                        );
                    }
                    for (index, issue) in issues.iter().take(limit).enumerate() {
                        println!("{}", report::format_issue_line(index + 1, issue));
                    }
                }
                FetchState::Failed(message) => {
                    println!("Priority reports unavailable: {message}")
                }
                FetchState::Loading => {}
            }
        }
        Commands::Watch {
            interval_secs,
            rounds,
        } => {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            let mut scene = MapScene::default();
            let mut polls = 0u32;

            loop {
                ticker.tick().await;
                match client.priority_issues().await {
                    Ok(issues) => {
                        let next = MapScene::from_issues(&issues);
                        let diff = scene.diff(&next);
                        if diff.is_empty() {
                            println!("No marker changes.");
                        }
                        for marker in &diff.added {
                            println!("+ {} [{}] {}", marker.key, marker.band, marker.title);
                        }
                        for marker in &diff.updated {
                            println!("~ {} [{}] {}", marker.key, marker.band, marker.title);
                        }
                        for key in &diff.removed {
                            println!("- {key}");
                        }
                        scene = next;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Poll failed, keeping previous markers");
                    }
                }

                polls += 1;
                if rounds.is_some_and(|limit| polls >= limit) {
                    break;
                }
            }
        }
        Commands::Report { out } => {
            let mut priority_fetch = fetch::spawn_fetch({
                let client = client.clone();
                async move { client.priority_issues().await }
            });
            let mut summary_fetch = fetch::spawn_fetch({
                let client = client.clone();
                async move { client.stats().await }
            });
            let (priority_state, summary_state) =
                tokio::join!(priority_fetch.settled(), summary_fetch.settled());

            let mut issues = match priority_state {
                FetchState::Loaded(issues) => issues,
                FetchState::Failed(message) => {
                    anyhow::bail!("failed to fetch priority reports: {message}")
                }
                FetchState::Loading => Vec::new(),
            };
            priority::rank_issues(&mut issues);

            let generated_on = Utc::now().date_naive().to_string();
            let report = report::build_report(summary_state.data(), &issues, &generated_on);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            csv,
            status,
            category,
        } => {
            let filter = ReportFilter {
                status,
                category,
                ..ReportFilter::default()
            };
            let (mut issues, _) = client
                .issues(&filter)
                .await
                .context("failed to fetch reports")?;
            priority::rank_issues(&mut issues);

            let file = std::fs::File::create(&csv)
                .with_context(|| format!("failed to create {}", csv.display()))?;
            let written = report::write_csv(&issues, file)?;
            println!("Exported {written} reports to {}.", csv.display());
        }
    }

    Ok(())
}
