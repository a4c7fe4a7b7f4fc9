use std::fmt;

use serde::{Deserialize, Serialize};

use crate::priority;

// --- Backend wire records ---

/// Response wrapper every admin endpoint returns.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendReport {
    pub report_id: String,
    #[serde(default)]
    pub user_ids: Vec<String>,
    pub people_reported: u32,
    pub category: Option<String>,
    pub title: String,
    pub ai_analysis: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub location: Location,
    pub criticality_score: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub severity_score: Option<f64>,
    pub severity_analysis: Option<String>,
    pub impact_score: Option<f64>,
    pub impact_analysis: Option<String>,
    pub population_estimate: Option<u64>,
    pub vehicle_estimate: Option<u64>,
    pub admin_notes: Option<String>,
}

/// Reduced projection served by the ranked dashboard endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendPriorityReport {
    pub report_id: String,
    pub title: String,
    pub criticality_score: f64,
    pub people_reported: u32,
    pub location: Location,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriorityReportsData {
    pub priority_reports: Vec<BackendPriorityReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportsPage {
    pub reports: Vec<BackendReport>,
    pub pagination: Pagination,
}

/// `report` is nullable on the wire; a missing report is surfaced as not-found.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportData {
    #[serde(default)]
    pub report: Option<BackendReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct BandCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "awaiting-attention", alias = "waiting_for_attention", default)]
    pub awaiting_attention: u64,
    #[serde(alias = "got_the_attention", default)]
    pub acknowledged: u64,
    #[serde(default)]
    pub resolved: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct CategoryCounts {
    #[serde(default)]
    pub potholes: u64,
    #[serde(default)]
    pub trash_overflow: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportsSummary {
    pub total_active: u64,
    pub by_criticality: BandCounts,
    pub by_status: Option<StatusCounts>,
    pub by_category: Option<CategoryCounts>,
}

// --- Status ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum ReportStatus {
    #[serde(rename = "awaiting-attention")]
    #[value(name = "unresolved")]
    AwaitingAttention,
    #[serde(rename = "acknowledged")]
    #[value(name = "in-progress")]
    Acknowledged,
    #[serde(rename = "resolved")]
    #[value(name = "resolved")]
    Resolved,
}

impl ReportStatus {
    /// Parses a backend status value, including the legacy snake_case spellings.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "awaiting-attention" | "waiting_for_attention" => Some(Self::AwaitingAttention),
            "acknowledged" | "got_the_attention" => Some(Self::Acknowledged),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::AwaitingAttention => "awaiting-attention",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AwaitingAttention => "Unresolved",
            Self::Acknowledged => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

/// Body of `PUT /reports/{id}/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
}

/// Query filters for the all-reports listing. Values are passed through untouched.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub category: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ReportFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_wire().to_string()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

// --- Canonical records ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityBand {
    Low,
    Medium,
    High,
}

impl PriorityBand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Priority",
            Self::Medium => "Medium Priority",
            Self::High => "High Priority",
        }
    }
}

impl fmt::Display for PriorityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identity of an issue: the backend report id, never re-synthesized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IssueKey(pub String);

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub key: IssueKey,
    /// Set only when the backend id is a plain integer.
    pub numeric_id: Option<u64>,
    pub title: String,
    pub location: String,
    /// `[latitude, longitude]`
    pub coordinates: [f64; 2],
    pub score: f64,
    pub report_date: Option<String>,
    pub criticality: String,
    pub people_reported: u32,
    /// Present only for issues built from a full report.
    pub details: Option<IssueDetails>,
}

impl Issue {
    pub fn priority(&self) -> PriorityBand {
        priority::classify(self.score)
    }

    pub fn category(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|details| details.category.as_deref())
    }

    pub fn status(&self) -> Option<&str> {
        self.details.as_ref().map(|details| details.status.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IssueDetails {
    pub status: String,
    pub category: Option<String>,
    pub analysis: Option<String>,
    pub images: Vec<String>,
    pub user_ids: Vec<String>,
    pub updated_at: Option<String>,
    pub severity_score: Option<f64>,
    pub severity_analysis: Option<String>,
    pub impact_score: Option<f64>,
    pub impact_analysis: Option<String>,
    pub population_estimate: Option<u64>,
    pub vehicle_estimate: Option<u64>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total_reports: u64,
    pub high_priority_count: u64,
    pub medium_priority_count: u64,
    pub low_priority_count: u64,
    pub by_status: Option<StatusCounts>,
    pub by_category: Option<CategoryCounts>,
}

impl Summary {
    /// `None` when the counts overflow `u64`.
    pub fn band_total(&self) -> Option<u64> {
        self.high_priority_count
            .checked_add(self.medium_priority_count)?
            .checked_add(self.low_priority_count)
    }

    /// The backend does not guarantee that band counts add up to the total.
    pub fn is_consistent(&self) -> bool {
        self.band_total() == Some(self.total_reports)
    }
}
