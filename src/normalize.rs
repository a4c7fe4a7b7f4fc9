use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::{
    BackendPriorityReport, BackendReport, Issue, IssueDetails, IssueKey, Location,
    ReportsSummary, Summary,
};
use crate::priority;

const DISPLAY_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Category used for descriptions when the record carries none.
const UNKNOWN_CATEGORY: &str = "unknown";

pub fn normalize_report(report: BackendReport) -> Issue {
    let criticality = priority::describe_criticality(
        report.criticality_score,
        report.category.as_deref().unwrap_or(UNKNOWN_CATEGORY),
    );
    let details = IssueDetails {
        status: priority::format_status(&report.status).to_string(),
        category: report.category,
        analysis: report.ai_analysis,
        images: report.images,
        user_ids: report.user_ids,
        updated_at: report.updated_at,
        severity_score: report.severity_score,
        severity_analysis: report.severity_analysis,
        impact_score: report.impact_score,
        impact_analysis: report.impact_analysis,
        population_estimate: report.population_estimate,
        vehicle_estimate: report.vehicle_estimate,
        admin_notes: report.admin_notes,
    };

    let (location, coordinates) = split_location(report.location);
    Issue {
        numeric_id: parse_numeric_id(&report.report_id),
        key: IssueKey(report.report_id),
        title: report.title,
        location,
        coordinates,
        score: report.criticality_score,
        report_date: format_report_date(&report.created_at),
        criticality,
        people_reported: report.people_reported,
        details: Some(details),
    }
}

pub fn normalize_priority_report(report: BackendPriorityReport) -> Issue {
    let (location, coordinates) = split_location(report.location);
    Issue {
        numeric_id: parse_numeric_id(&report.report_id),
        key: IssueKey(report.report_id),
        title: report.title,
        location,
        coordinates,
        score: report.criticality_score,
        report_date: format_report_date(&report.created_at),
        criticality: priority::describe_criticality(report.criticality_score, UNKNOWN_CATEGORY),
        people_reported: report.people_reported,
        details: None,
    }
}

pub fn normalize_summary(summary: ReportsSummary) -> Summary {
    Summary {
        total_reports: summary.total_active,
        high_priority_count: summary.by_criticality.high,
        medium_priority_count: summary.by_criticality.medium,
        low_priority_count: summary.by_criticality.low,
        by_status: summary.by_status,
        by_category: summary.by_category,
    }
}

/// Renders a backend timestamp as a short `month/day/year` date.
///
/// Accepts RFC 3339, naive ISO date-times, and bare dates. Anything else
/// yields `None` so callers can show the date as missing.
pub fn format_report_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.date_naive())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|parsed| parsed.date())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|parsed| parsed.date())
        })
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => Some(date.format(DISPLAY_DATE_FORMAT).to_string()),
        Err(_) => {
            tracing::debug!(raw, "Unparsable report timestamp");
            None
        }
    }
}

fn parse_numeric_id(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

fn split_location(location: Location) -> (String, [f64; 2]) {
    (location.address, [location.lat, location.lon])
}
