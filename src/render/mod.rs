//! Report rendering -- fetch the report set and replace the display surface.

pub mod text;

use crate::api::DashboardApi;
use crate::report::card::{self, Card};
use crate::report::{Report, StyleClass};
use crate::DashboardError;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

pub const EMPTY_MESSAGE: &str = "No reports found yet.";
pub const ERROR_MESSAGE: &str = "Failed to load reports.";

/// Full content of the display area after a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum View {
    /// Nothing fetched yet.
    Loading,
    Cards { cards: Vec<Card> },
    Empty,
    Error,
}

/// A single-message card shown instead of reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder {
    pub style: StyleClass,
    pub message: &'static str,
}

impl View {
    pub fn placeholder(&self) -> Option<Placeholder> {
        match self {
            View::Empty => Some(Placeholder {
                style: StyleClass::Info,
                message: EMPTY_MESSAGE,
            }),
            View::Error => Some(Placeholder {
                style: StyleClass::Danger,
                message: ERROR_MESSAGE,
            }),
            View::Loading | View::Cards { .. } => None,
        }
    }

    pub fn cards(&self) -> &[Card] {
        match self {
            View::Cards { cards } => cards,
            _ => &[],
        }
    }
}

/// Display area written by the renderer. Each call replaces everything.
pub trait Surface: Send + Sync {
    fn replace(&self, view: View);
}

/// Surface that keeps the latest view in memory.
#[derive(Debug)]
pub struct MemorySurface {
    inner: Mutex<(View, usize)>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self {
            inner: Mutex::new((View::Loading, 0)),
        }
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).0.clone()
    }

    /// Number of times the surface has been replaced.
    pub fn replacements(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).1
    }
}

impl Surface for MemorySurface {
    fn replace(&self, view: View) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.0 = view;
        inner.1 += 1;
    }
}

/// Time zone cards are localized into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
}

/// What a successful refresh put on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered(usize),
    Empty,
}

pub struct ReportRenderer {
    api: Arc<dyn DashboardApi>,
    surface: Arc<dyn Surface>,
    zone: DisplayZone,
}

impl ReportRenderer {
    pub fn new(api: Arc<dyn DashboardApi>, surface: Arc<dyn Surface>, zone: DisplayZone) -> Self {
        Self { api, surface, zone }
    }

    /// Re-fetch every report and replace the surface with the result.
    ///
    /// The surface is updated on every path, errors included; the return
    /// value only reports what happened.
    pub async fn refresh(&self) -> Result<RefreshOutcome, DashboardError> {
        match self.api.fetch_reports().await {
            Ok(reports) if reports.is_empty() => {
                info!("no reports available");
                self.surface.replace(View::Empty);
                Ok(RefreshOutcome::Empty)
            }
            Ok(reports) => {
                let cards = self.project_all(&reports);
                let count = cards.len();
                info!(count, "rendered reports");
                self.surface.replace(View::Cards { cards });
                Ok(RefreshOutcome::Rendered(count))
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch reports");
                self.surface.replace(View::Error);
                Err(DashboardError::FetchFailed(e))
            }
        }
    }

    fn project_all(&self, reports: &[Report]) -> Vec<Card> {
        match self.zone {
            DisplayZone::Local => reports.iter().map(|r| card::project(r, &chrono::Local)).collect(),
            DisplayZone::Utc => reports.iter().map(|r| card::project(r, &chrono::Utc)).collect(),
        }
    }
}
