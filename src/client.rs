use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    BackendPriorityReport, BackendReport, Envelope, Issue, Pagination, PriorityReportsData,
    ReportData, ReportFilter, ReportStatus, ReportsPage, ReportsSummary, StatusUpdate, Summary,
};
use crate::normalize;

const ADMIN_PREFIX: [&str; 3] = ["api", "v1", "admin"];

/// Client for the UrbanWatch admin API.
///
/// Holds no per-call state, so clones can issue requests concurrently.
#[derive(Debug, Clone)]
pub struct UrbanWatchClient {
    client: reqwest::Client,
    base_url: Url,
}

impl UrbanWatchClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }

    /// Ranked reports for the dashboard.
    pub async fn priority_reports(&self) -> Result<Vec<BackendPriorityReport>> {
        let data: PriorityReportsData = self
            .execute(Method::GET, &["priority-reports"], &[], None)
            .await?;
        Ok(data.priority_reports)
    }

    pub async fn reports(&self, filter: &ReportFilter) -> Result<ReportsPage> {
        self.execute(Method::GET, &["reports"], &filter.query_pairs(), None)
            .await
    }

    pub async fn report(&self, report_id: &str) -> Result<BackendReport> {
        let data: ReportData = self
            .execute(Method::GET, &["reports", report_id], &[], None)
            .await?;
        data.report
            .ok_or_else(|| ApiError::NotFound(report_id.to_string()))
    }

    pub async fn update_status(
        &self,
        report_id: &str,
        status: ReportStatus,
        admin_notes: Option<&str>,
    ) -> Result<BackendReport> {
        let body = StatusUpdate {
            status,
            admin_notes: admin_notes.map(String::from),
        };
        let data: ReportData = self
            .execute(
                Method::PUT,
                &["reports", report_id, "status"],
                &[],
                Some(&body),
            )
            .await?;
        data.report
            .ok_or_else(|| ApiError::NotFound(report_id.to_string()))
    }

    pub async fn summary(&self) -> Result<ReportsSummary> {
        self.execute(Method::GET, &["reports", "summary"], &[], None)
            .await
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Config rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(ADMIN_PREFIX).extend(segments);
        }
        url
    }

    /// Sends one request and unwraps the `{status, message, data}` envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&'static str, String)],
        body: Option<&StatusUpdate>,
    ) -> Result<T> {
        let url = self.endpoint(segments);
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!("api_call", %method, %url, %request_id);

        async move {
            let mut request = self
                .client
                .request(method, url)
                .header(CONTENT_TYPE, "application/json")
                .header("x-request-id", request_id.to_string());
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            tracing::debug!("Sending request");
            let resp = request.send().await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), "API request failed");
                return Err(ApiError::RequestFailed {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                    body,
                });
            }

            let bytes = resp.bytes().await?;
            let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
            tracing::debug!(
                envelope_status = %envelope.status,
                message = %envelope.message,
                "API request succeeded"
            );
            Ok(envelope.data)
        }
        .instrument(span)
        .await
    }
}

// --- Normalized views ---

impl UrbanWatchClient {
    pub async fn priority_issues(&self) -> Result<Vec<Issue>> {
        let reports = self.priority_reports().await?;
        Ok(reports
            .into_iter()
            .map(normalize::normalize_priority_report)
            .collect())
    }

    pub async fn issues(&self, filter: &ReportFilter) -> Result<(Vec<Issue>, Pagination)> {
        let page = self.reports(filter).await?;
        let issues = page
            .reports
            .into_iter()
            .map(normalize::normalize_report)
            .collect();
        Ok((issues, page.pagination))
    }

    pub async fn issue(&self, report_id: &str) -> Result<Issue> {
        Ok(normalize::normalize_report(self.report(report_id).await?))
    }

    pub async fn set_issue_status(
        &self,
        report_id: &str,
        status: ReportStatus,
        admin_notes: Option<&str>,
    ) -> Result<Issue> {
        let report = self.update_status(report_id, status, admin_notes).await?;
        Ok(normalize::normalize_report(report))
    }

    pub async fn stats(&self) -> Result<Summary> {
        Ok(normalize::normalize_summary(self.summary().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriorityBand;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    async fn spawn_backend(router: Router) -> UrbanWatchClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = Config {
            base_url: Url::parse(&format!("http://{addr}")).unwrap(),
            timeout: None,
        };
        UrbanWatchClient::new(&config).unwrap()
    }

    fn envelope(data: Value) -> Json<Value> {
        Json(json!({ "status": "success", "message": "ok", "data": data }))
    }

    fn report_json(report_id: &str, score: f64, category: &str, status: &str) -> Value {
        json!({
            "report_id": report_id,
            "user_ids": ["u-1"],
            "people_reported": 4,
            "category": category,
            "title": "Broken kerb",
            "ai_analysis": "Kerb collapse along the bus stop.",
            "images": [],
            "location": { "lat": 22.314, "lon": 87.31, "address": "Gate 2" },
            "criticality_score": score,
            "status": status,
            "created_at": "2024-01-10T09:00:00Z",
            "updated_at": "2024-01-11T09:00:00Z"
        })
    }

    #[tokio::test]
    async fn unwraps_priority_reports() {
        let router = Router::new().route(
            "/api/v1/admin/priority-reports",
            get(|| async {
                envelope(json!({
                    "priority_reports": [{
                        "report_id": "9",
                        "title": "Deep pothole",
                        "criticality_score": 82,
                        "people_reported": 15,
                        "location": { "lat": 22.3149, "lon": 87.3105, "address": "RK Hall" },
                        "created_at": "2024-01-15T10:30:00Z"
                    }]
                }))
            }),
        );
        let client = spawn_backend(router).await;

        let issues = client.priority_issues().await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].priority(), PriorityBand::High);
        assert_eq!(issues[0].location, "RK Hall");
    }

    #[tokio::test]
    async fn sends_filters_as_query_string() {
        let router = Router::new().route(
            "/api/v1/admin/reports",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let limit: u64 = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(99);
                let offset: u64 = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(99);
                let status = params.get("status").cloned().unwrap_or_default();
                let category = params.get("category").cloned().unwrap_or_default();
                envelope(json!({
                    "reports": [report_json("1", 65.0, &category, &status)],
                    "pagination": { "total": 1, "limit": limit, "offset": offset }
                }))
            }),
        );
        let client = spawn_backend(router).await;

        let filter = ReportFilter {
            status: Some(ReportStatus::Acknowledged),
            category: Some("trash_overflow".to_string()),
            limit: Some(20),
            offset: Some(40),
        };
        let (issues, pagination) = client.issues(&filter).await.unwrap();
        assert_eq!(pagination.limit, 20);
        assert_eq!(pagination.offset, 40);
        assert_eq!(issues[0].status(), Some("In Progress"));
        assert_eq!(issues[0].category(), Some("trash_overflow"));
    }

    #[tokio::test]
    async fn not_found_status_is_request_failure() {
        let router = Router::new().route(
            "/api/v1/admin/reports/{id}",
            get(|| async { (StatusCode::NOT_FOUND, "no such report") }),
        );
        let client = spawn_backend(router).await;

        let err = client.issue("404").await.unwrap_err();
        match err {
            ApiError::RequestFailed {
                status,
                reason,
                body,
            } => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Not Found");
                assert_eq!(body, "no such report");
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_report_is_not_found() {
        let router = Router::new().route(
            "/api/v1/admin/reports/{id}",
            get(|| async { envelope(json!({ "report": null })) }),
        );
        let client = spawn_backend(router).await;

        let err = client.report("77").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(id) if id == "77"));
    }

    #[tokio::test]
    async fn missing_location_is_decode_failure() {
        let router = Router::new().route(
            "/api/v1/admin/reports/{id}",
            get(|| async {
                let mut report = report_json("5", 50.0, "potholes", "resolved");
                report.as_object_mut().unwrap().remove("location");
                envelope(json!({ "report": report }))
            }),
        );
        let client = spawn_backend(router).await;

        let err = client.issue("5").await.unwrap_err();
        assert!(matches!(err, ApiError::DecodeFailed(_)));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn body_without_envelope_is_decode_failure() {
        let router = Router::new().route(
            "/api/v1/admin/reports/summary",
            get(|| async { Json(json!({ "total_active": 3 })) }),
        );
        let client = spawn_backend(router).await;

        let err = client.stats().await.unwrap_err();
        assert!(matches!(err, ApiError::DecodeFailed(_)));
    }

    #[tokio::test]
    async fn summary_route_is_not_shadowed_by_report_lookup() {
        let router = Router::new()
            .route(
                "/api/v1/admin/reports/summary",
                get(|| async {
                    envelope(json!({
                        "total_active": 10,
                        "by_criticality": { "low": 4, "medium": 3, "high": 3 }
                    }))
                }),
            )
            .route(
                "/api/v1/admin/reports/{id}",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "wrong route") }),
            );
        let client = spawn_backend(router).await;

        let stats = client.stats().await.unwrap();
        assert_eq!(stats.total_reports, 10);
        assert_eq!(stats.high_priority_count, 3);
        assert!(stats.is_consistent());
    }

    #[tokio::test]
    async fn status_update_sends_json_body_and_headers() {
        let router = Router::new().route(
            "/api/v1/admin/reports/{id}/status",
            put(
                |Path(id): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let has_request_id = headers.contains_key("x-request-id");
                    let json_content = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .is_some_and(|v| v.starts_with("application/json"));
                    if !has_request_id || !json_content {
                        return Err((StatusCode::BAD_REQUEST, "missing headers"));
                    }
                    let status = body["status"].as_str().unwrap_or_default().to_string();
                    let mut report = report_json(&id, 82.0, "potholes", &status);
                    report["admin_notes"] = body["admin_notes"].clone();
                    Ok(envelope(json!({ "report": report })))
                },
            ),
        );
        let client = spawn_backend(router).await;

        let issue = client
            .set_issue_status("31", ReportStatus::Resolved, Some("crew dispatched"))
            .await
            .unwrap();
        assert_eq!(issue.key.0, "31");
        assert_eq!(issue.status(), Some("Resolved"));
        let details = issue.details.unwrap();
        assert_eq!(details.admin_notes.as_deref(), Some("crew dispatched"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = Config {
            base_url: Url::parse(&format!("http://{addr}")).unwrap(),
            timeout: None,
        };
        let client = UrbanWatchClient::new(&config).unwrap();
        let err = client.summary().await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn endpoint_escapes_report_ids_and_keeps_base_path() {
        let config = Config {
            base_url: Url::parse("https://urbanwatch.tech/backend").unwrap(),
            timeout: None,
        };
        let client = UrbanWatchClient::new(&config).unwrap();
        let url = client.endpoint(&["reports", "a/b", "status"]);
        assert_eq!(
            url.as_str(),
            "https://urbanwatch.tech/backend/api/v1/admin/reports/a%2Fb/status"
        );
    }
}
