use crate::models::{Issue, PriorityBand, ReportStatus};

pub const HIGH_THRESHOLD: f64 = 71.0;
pub const MEDIUM_THRESHOLD: f64 = 41.0;

/// Maps a criticality score to its priority band. Lower bounds are inclusive.
pub fn classify(score: f64) -> PriorityBand {
    if score >= HIGH_THRESHOLD {
        PriorityBand::High
    } else if score >= MEDIUM_THRESHOLD {
        PriorityBand::Medium
    } else {
        PriorityBand::Low
    }
}

pub fn format_status(status: &str) -> &'static str {
    ReportStatus::from_wire(status)
        .map(ReportStatus::label)
        .unwrap_or("Unknown")
}

pub fn category_noun(category: &str) -> &'static str {
    match category {
        "potholes" => "pothole",
        "trash_overflow" => "waste accumulation",
        _ => "issue",
    }
}

pub fn describe_criticality(score: f64, category: &str) -> String {
    let noun = category_noun(category);
    match classify(score) {
        PriorityBand::High => format!("High-priority {noun} requiring immediate attention"),
        PriorityBand::Medium => format!("Moderate {noun} that needs attention"),
        PriorityBand::Low => format!("Minor {noun} with low impact"),
    }
}

/// Orders issues by score, most critical first. Ties keep their backend order.
pub fn rank_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| b.score.total_cmp(&a.score));
}
