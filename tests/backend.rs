//! HTTP client and end-to-end tests against a fake backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pulseboard::api::{ApiError, DashboardApi, HttpApi};
use pulseboard::config::DashboardConfig;
use pulseboard::dashboard::Dashboard;
use pulseboard::render::{MemorySurface, View};
use pulseboard::report::{Severity, StyleClass};
use pulseboard::report::card::TimeWindow;
use pulseboard::trigger::{Notice, NoticeLevel, Notifier, TriggerOutcome};
use serde_json::json;

const GO_REPORTS: &str = r#"[
  {
    "id": 12,
    "metric_name": "node_cpu_seconds_total",
    "pattern_detected": "Sustained High CPU Load",
    "severity": "critical",
    "start_time": "2024-05-02T08:00:00Z",
    "end_time": "2024-05-02T08:30:00Z",
    "details": "Average CPU usage stayed above 85% for 30 minutes.",
    "created_at": "2024-05-02T08:31:12.5+00:00"
  },
  {
    "id": 11,
    "metric_name": "node_cpu_seconds_total",
    "pattern_detected": "Transient CPU Spike",
    "severity": "warning",
    "start_time": "2024-05-02T07:10:00Z",
    "end_time": "2024-05-02T07:10:00Z",
    "details": "CPU usage spiked to 97%.",
    "created_at": "2024-05-02T07:11:00Z"
  }
]"#;

#[derive(Clone)]
struct Backend {
    reports: Arc<Mutex<(StatusCode, String)>>,
    analyze_status: StatusCode,
    fetches: Arc<AtomicUsize>,
    starts: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    fn new(status: StatusCode, body: &str, analyze_status: StatusCode) -> Self {
        Self {
            reports: Arc::new(Mutex::new((status, body.to_string()))),
            analyze_status,
            fetches: Arc::new(AtomicUsize::new(0)),
            starts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

async fn reports(State(backend): State<Backend>) -> Response {
    backend.fetches.fetch_add(1, Ordering::SeqCst);
    let (status, body) = backend.reports.lock().unwrap().clone();
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn analyze(State(backend): State<Backend>, Path(kind): Path<String>) -> Response {
    backend.starts.lock().unwrap().push(kind.clone());
    let message = format!("{} analysis started.", kind);
    (backend.analyze_status, Json(json!({ "message": message }))).into_response()
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/reports", get(reports))
        .route("/api/analyze/{kind}", post(analyze))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

#[tokio::test]
async fn test_fetch_reports_decodes_backend_json() {
    let backend = Backend::new(StatusCode::OK, GO_REPORTS, StatusCode::ACCEPTED);
    let api = HttpApi::new(&spawn_backend(backend).await).unwrap();

    let reports = api.fetch_reports().await.unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].id, Some(12));
    assert_eq!(reports[0].severity, Severity::Critical);
    assert_eq!(reports[1].pattern_detected, "Transient CPU Spike");
    assert_eq!(reports[1].start_time, reports[1].end_time);
}

#[tokio::test]
async fn test_fetch_reports_null_is_empty() {
    let backend = Backend::new(StatusCode::OK, "null", StatusCode::ACCEPTED);
    let api = HttpApi::new(&spawn_backend(backend).await).unwrap();
    assert!(api.fetch_reports().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_reports_error_status() {
    let backend = Backend::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to fetch reports",
        StatusCode::ACCEPTED,
    );
    let api = HttpApi::new(&spawn_backend(backend).await).unwrap();
    let err = api.fetch_reports().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500 }));
}

#[tokio::test]
async fn test_fetch_reports_malformed_body() {
    let backend = Backend::new(StatusCode::OK, "{\"oops\": true}", StatusCode::ACCEPTED);
    let api = HttpApi::new(&spawn_backend(backend).await).unwrap();
    assert!(matches!(
        api.fetch_reports().await.unwrap_err(),
        ApiError::Decode(_)
    ));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind and release a port so nothing listens on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpApi::new(&format!("http://{}", addr)).unwrap();
    assert!(matches!(
        api.fetch_reports().await.unwrap_err(),
        ApiError::Transport(_)
    ));
    assert!(matches!(
        api.start_analysis("cpu").await.unwrap_err(),
        ApiError::Transport(_)
    ));
}

#[tokio::test]
async fn test_start_analysis_reports_status_and_message() {
    let backend = Backend::new(StatusCode::OK, "[]", StatusCode::ACCEPTED);
    let api = HttpApi::new(&spawn_backend(backend.clone()).await).unwrap();

    let resp = api.start_analysis("cpu-high-load").await.unwrap();
    assert!(resp.is_accepted());
    assert_eq!(resp.message.as_deref(), Some("cpu-high-load analysis started."));
    assert_eq!(*backend.starts.lock().unwrap(), ["cpu-high-load"]);
}

#[tokio::test]
async fn test_start_analysis_other_status_not_accepted() {
    let backend = Backend::new(StatusCode::OK, "[]", StatusCode::NOT_FOUND);
    let api = HttpApi::new(&spawn_backend(backend).await).unwrap();

    let resp = api.start_analysis("disk").await.unwrap();
    assert_eq!(resp.status, 404);
    assert!(!resp.is_accepted());
}

fn dashboard_for(base_url: &str, delay_secs: u64) -> (Dashboard, Arc<MemorySurface>, Arc<RecordingNotifier>) {
    let mut config = DashboardConfig::default();
    config.server.base_url = base_url.to_string();
    config.refresh.delay_secs = delay_secs;
    config.display.utc = true;

    let surface = Arc::new(MemorySurface::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let api = Arc::new(HttpApi::new(base_url).unwrap());
    let dashboard = Dashboard::new(api, surface.clone(), notifier.clone(), &config);
    (dashboard, surface, notifier)
}

#[tokio::test]
async fn test_spike_trigger_refreshes_once_after_delay() {
    let backend = Backend::new(StatusCode::OK, GO_REPORTS, StatusCode::ACCEPTED);
    let url = spawn_backend(backend.clone()).await;
    let (dashboard, surface, notifier) = dashboard_for(&url, 1);

    let outcome = dashboard.run_analysis("cpu-spike").await.unwrap();
    let TriggerOutcome::Accepted(refresh) = outcome else {
        panic!("expected the backend to accept the job");
    };

    let notices = notifier.notices.lock().unwrap().clone();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Acknowledged);
    assert_eq!(backend.fetches(), 0);
    assert_eq!(*backend.starts.lock().unwrap(), ["cpu-spike"]);

    refresh.wait().await;
    assert_eq!(backend.fetches(), 1);

    let view = surface.view();
    assert_eq!(view.cards().len(), 2);
    assert_eq!(view.cards()[0].style, StyleClass::Danger);
    assert_eq!(
        view.cards()[1].window,
        TimeWindow::Instant {
            at: "2024-05-02 07:10:00".to_string()
        }
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(backend.fetches(), 1);
}

#[tokio::test]
async fn test_rejected_trigger_never_refreshes() {
    let backend = Backend::new(StatusCode::OK, GO_REPORTS, StatusCode::SERVICE_UNAVAILABLE);
    let url = spawn_backend(backend.clone()).await;
    let (dashboard, surface, notifier) = dashboard_for(&url, 0);

    assert!(dashboard.run_analysis("2").await.is_err());
    assert_eq!(notifier.notices.lock().unwrap()[0].level, NoticeLevel::Failed);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(backend.fetches(), 0);
    assert_eq!(surface.view(), View::Loading);
    assert!(dashboard.trigger().control("cpu-high-load").unwrap().enabled);
}

#[tokio::test]
async fn test_unknown_kind_sends_nothing() {
    let backend = Backend::new(StatusCode::OK, "[]", StatusCode::ACCEPTED);
    let url = spawn_backend(backend.clone()).await;
    let (dashboard, _surface, notifier) = dashboard_for(&url, 0);

    assert!(dashboard.run_analysis("memory-leak").await.is_err());
    assert!(backend.starts.lock().unwrap().is_empty());
    assert!(notifier.notices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_replaces_cards_with_error() {
    let backend = Backend::new(StatusCode::OK, GO_REPORTS, StatusCode::ACCEPTED);
    let url = spawn_backend(backend.clone()).await;
    let (dashboard, surface, _notifier) = dashboard_for(&url, 0);

    dashboard.refresh().await.unwrap();
    assert_eq!(surface.view().cards().len(), 2);

    *backend.reports.lock().unwrap() = (StatusCode::BAD_GATEWAY, String::new());
    assert!(dashboard.refresh().await.is_err());
    assert_eq!(surface.view(), View::Error);
}

#[tokio::test]
async fn test_watch_reads_commands_until_quit() {
    let backend = Backend::new(StatusCode::OK, "[]", StatusCode::ACCEPTED);
    let url = spawn_backend(backend.clone()).await;
    let (dashboard, surface, _notifier) = dashboard_for(&url, 0);

    let input: &[u8] = b"r\n\nq\nr\n";
    dashboard.watch(input).await.unwrap();

    // Initial refresh plus one explicit refresh; the line after quit is unread.
    assert_eq!(backend.fetches(), 2);
    assert_eq!(surface.view(), View::Empty);
}

#[tokio::test]
async fn test_watch_keeps_reading_after_failed_refresh() {
    let backend = Backend::new(StatusCode::INTERNAL_SERVER_ERROR, "", StatusCode::ACCEPTED);
    let url = spawn_backend(backend.clone()).await;
    let (dashboard, surface, _notifier) = dashboard_for(&url, 0);

    let input: &[u8] = b"r\nr\nq\n";
    dashboard.watch(input).await.unwrap();

    assert_eq!(backend.fetches(), 3);
    assert_eq!(surface.view(), View::Error);
}
