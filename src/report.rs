use std::fmt::Write;

use serde::Serialize;

use crate::models::{Issue, PriorityBand, Summary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandMix {
    pub band: PriorityBand,
    pub count: usize,
}

/// Case-insensitive match on title, address or report id.
pub fn search_issues<'a>(issues: &'a [Issue], term: &str) -> Vec<&'a Issue> {
    let needle = term.trim().to_lowercase();
    issues
        .iter()
        .filter(|issue| {
            needle.is_empty()
                || issue.title.to_lowercase().contains(&needle)
                || issue.location.to_lowercase().contains(&needle)
                || issue.key.0.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn summarize_by_band(issues: &[Issue]) -> Vec<BandMix> {
    [PriorityBand::High, PriorityBand::Medium, PriorityBand::Low]
        .into_iter()
        .map(|band| BandMix {
            band,
            count: issues.iter().filter(|issue| issue.priority() == band).count(),
        })
        .collect()
}

pub fn format_issue_line(rank: usize, issue: &Issue) -> String {
    let mut line = format!(
        "{rank}. [{}] {} ({}) score {} | {} reports | {}",
        issue.priority().label(),
        issue.title,
        issue.key,
        issue.score,
        issue.people_reported,
        issue.location
    );
    if let Some(status) = issue.status() {
        let _ = write!(line, " | {status}");
    }
    line
}

pub fn format_issue_detail(issue: &Issue) -> String {
    let mut output = String::new();
    let [lat, lon] = issue.coordinates;

    match issue.numeric_id {
        Some(number) => {
            let _ = writeln!(output, "{} (#{number})", issue.title);
        }
        None => {
            let _ = writeln!(output, "{} ({})", issue.title, issue.key);
        }
    }
    let _ = writeln!(output, "Priority: {} (score {})", issue.priority().label(), issue.score);
    let _ = writeln!(output, "Criticality: {}", issue.criticality);
    let _ = writeln!(output, "Location: {} [{lat:.5}, {lon:.5}]", issue.location);
    let _ = writeln!(
        output,
        "Reported: {} by {} people",
        issue.report_date.as_deref().unwrap_or("unknown date"),
        issue.people_reported
    );

    let Some(details) = &issue.details else {
        return output;
    };

    let _ = writeln!(output, "Status: {}", details.status);
    if let Some(updated_at) = &details.updated_at {
        let _ = writeln!(output, "Last updated: {updated_at}");
    }
    if !details.user_ids.is_empty() {
        let _ = writeln!(output, "Reporter accounts: {}", details.user_ids.len());
    }
    let _ = writeln!(
        output,
        "Category: {}",
        details.category.as_deref().unwrap_or("uncategorized")
    );
    if let Some(analysis) = &details.analysis {
        let _ = writeln!(output, "Analysis: {analysis}");
    }
    if let Some(score) = details.severity_score {
        let _ = writeln!(output, "Severity: {score}");
    }
    if let Some(analysis) = &details.severity_analysis {
        let _ = writeln!(output, "Severity analysis: {analysis}");
    }
    if let Some(score) = details.impact_score {
        let _ = writeln!(output, "Impact: {score}");
    }
    if let Some(analysis) = &details.impact_analysis {
        let _ = writeln!(output, "Impact analysis: {analysis}");
    }
    if let Some(population) = details.population_estimate {
        let _ = writeln!(output, "Population affected: {population}");
    }
    if let Some(vehicles) = details.vehicle_estimate {
        let _ = writeln!(output, "Vehicles affected: {vehicles}");
    }
    if let Some(notes) = &details.admin_notes {
        let _ = writeln!(output, "Admin notes: {notes}");
    }
    if !details.images.is_empty() {
        let _ = writeln!(output, "Images:");
        for image in &details.images {
            let _ = writeln!(output, "  - {image}");
        }
    }

    output
}

pub fn format_summary(summary: &Summary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Total active reports: {}", summary.total_reports);
    let _ = writeln!(output, "High priority: {}", summary.high_priority_count);
    let _ = writeln!(output, "Medium priority: {}", summary.medium_priority_count);
    let _ = writeln!(output, "Low priority: {}", summary.low_priority_count);

    if let Some(by_status) = summary.by_status {
        let _ = writeln!(
            output,
            "Unresolved: {} | In Progress: {} | Resolved: {}",
            by_status.awaiting_attention, by_status.acknowledged, by_status.resolved
        );
    }
    if let Some(by_category) = summary.by_category {
        let _ = writeln!(
            output,
            "Potholes: {} | Trash overflow: {}",
            by_category.potholes, by_category.trash_overflow
        );
    }
    output
}

/// Markdown dashboard report. `issues` are expected ranked.
pub fn build_report(summary: Option<&Summary>, issues: &[Issue], generated_on: &str) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# UrbanWatch Dashboard Report");
    let _ = writeln!(output, "Generated on {generated_on}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    match summary {
        Some(summary) => {
            for line in format_summary(summary).lines() {
                let _ = writeln!(output, "- {line}");
            }
            if !summary.is_consistent() {
                let band_total = summary
                    .band_total()
                    .map_or_else(|| "more than u64::MAX".to_string(), |total| total.to_string());
                let _ = writeln!(
                    output,
                    "- Note: band counts add up to {band_total}, not {}",
                    summary.total_reports
                );
            }
        }
        None => {
            let _ = writeln!(output, "Summary unavailable.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Priority Mix");

    if issues.is_empty() {
        let _ = writeln!(output, "No reports to rank.");
    } else {
        for mix in summarize_by_band(issues) {
            let _ = writeln!(output, "- {}: {} reports", mix.band.label(), mix.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Critical Reports");

    if issues.is_empty() {
        let _ = writeln!(output, "No reports to rank.");
    } else {
        for issue in issues.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) score {}: {}",
                issue.title, issue.location, issue.score, issue.criticality
            );
        }
    }

    output
}

#[derive(Debug, Serialize)]
struct IssueRow<'a> {
    report_id: &'a str,
    title: &'a str,
    priority: PriorityBand,
    score: f64,
    status: Option<&'a str>,
    category: Option<&'a str>,
    people_reported: u32,
    latitude: f64,
    longitude: f64,
    location: &'a str,
    report_date: Option<&'a str>,
    criticality: &'a str,
}

pub fn write_csv<W: std::io::Write>(issues: &[Issue], writer: W) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for issue in issues {
        let [latitude, longitude] = issue.coordinates;
        csv_writer.serialize(IssueRow {
            report_id: &issue.key.0,
            title: &issue.title,
            priority: issue.priority(),
            score: issue.score,
            status: issue.status(),
            category: issue.category(),
            people_reported: issue.people_reported,
            latitude,
            longitude,
            location: &issue.location,
            report_date: issue.report_date.as_deref(),
            criticality: &issue.criticality,
        })?;
    }
    csv_writer.flush()?;
    Ok(issues.len())
}
