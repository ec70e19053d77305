//! Analysis triggers -- start a backend job and schedule a report refresh.

pub mod kind;
pub mod state;

use self::kind::{AnalysisKind, KindRegistry};
use self::state::{ControlView, InFlightGuard, TriggerStore};
use crate::api::{ApiError, DashboardApi};
use crate::render::ReportRenderer;
use crate::DashboardError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Acknowledged,
    Failed,
}

/// One-time message shown to the user after a trigger attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub slug: String,
    pub level: NoticeLevel,
    pub message: String,
}

/// Delivers notices to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Prints notices to stdout.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: &Notice) {
        let tag = match notice.level {
            NoticeLevel::Acknowledged => "ok",
            NoticeLevel::Failed => "failed",
        };
        println!("[{}] {}", tag, notice.message);
    }
}

/// Refresh scheduled by an accepted trigger.
///
/// Dropping it does not cancel the refresh.
#[derive(Debug)]
pub struct ScheduledRefresh {
    handle: JoinHandle<()>,
}

impl ScheduledRefresh {
    /// Wait until the refresh has run.
    pub async fn wait(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "scheduled refresh task failed");
        }
    }
}

#[derive(Debug)]
pub enum TriggerOutcome {
    /// The backend accepted the job; a refresh is pending.
    Accepted(ScheduledRefresh),
    /// The kind already had a request in flight. Nothing was sent.
    Ignored,
}

/// One trigger component serving every registered analysis kind.
pub struct AnalysisTrigger {
    api: Arc<dyn DashboardApi>,
    renderer: Arc<ReportRenderer>,
    notifier: Arc<dyn Notifier>,
    kinds: KindRegistry,
    store: Arc<TriggerStore>,
    refresh_delay: Duration,
}

impl AnalysisTrigger {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        renderer: Arc<ReportRenderer>,
        notifier: Arc<dyn Notifier>,
        kinds: KindRegistry,
        refresh_delay: Duration,
    ) -> Self {
        Self {
            api,
            renderer,
            notifier,
            kinds,
            store: TriggerStore::new(),
            refresh_delay,
        }
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    /// Current controls, in registry order.
    pub fn controls(&self) -> Vec<ControlView> {
        self.kinds
            .iter()
            .map(|k| ControlView::project(k, &self.store.state(&k.slug)))
            .collect()
    }

    pub fn control(&self, slug: &str) -> Option<ControlView> {
        self.kinds
            .get(slug)
            .map(|k| ControlView::project(k, &self.store.state(slug)))
    }

    /// Start the analysis for `kind`.
    ///
    /// A kind that is already in flight is ignored without contacting the
    /// backend. On 202 an acknowledgment is shown and one refresh is
    /// scheduled after the configured delay; any other reply is a
    /// `TriggerFailed`. The control is enabled again in every case.
    pub async fn trigger(&self, kind: &AnalysisKind) -> Result<TriggerOutcome, DashboardError> {
        match self.begin(kind) {
            Some(guard) => self.run(kind, guard).await.map(TriggerOutcome::Accepted),
            None => Ok(TriggerOutcome::Ignored),
        }
    }

    /// Disable the control for `kind`, or `None` if it is already in flight.
    ///
    /// Synchronous so callers can show the in-progress state before the
    /// request is even spawned.
    pub fn begin(&self, kind: &AnalysisKind) -> Option<InFlightGuard> {
        let guard = self.store.try_begin(&kind.slug);
        if guard.is_none() {
            debug!(kind = %kind.slug, "analysis already in flight, ignoring");
        }
        guard
    }

    /// Send the start request for an attempt opened by [`begin`](Self::begin).
    /// The control is released when `guard` drops at the end.
    pub async fn run(
        &self,
        kind: &AnalysisKind,
        mut guard: InFlightGuard,
    ) -> Result<ScheduledRefresh, DashboardError> {
        let span = info_span!("trigger", kind = %kind.slug, attempt = %Uuid::new_v4());
        async move {
            info!("starting analysis");
            let failure = match self.api.start_analysis(&kind.slug).await {
                Ok(resp) if resp.is_accepted() => {
                    info!(reply = resp.message.as_deref().unwrap_or(""), "analysis accepted");
                    self.notify(kind, NoticeLevel::Acknowledged, &kind.started_message);
                    return Ok(self.schedule_refresh());
                }
                Ok(resp) => ApiError::Status {
                    status: resp.status,
                },
                Err(e) => e,
            };

            warn!(error = %failure, "failed to start analysis");
            guard.fail(failure.to_string());
            self.notify(kind, NoticeLevel::Failed, &kind.failed_message);
            Err(DashboardError::TriggerFailed {
                kind: kind.slug.clone(),
                source: failure,
            })
        }
        .instrument(span)
        .await
    }

    fn notify(&self, kind: &AnalysisKind, level: NoticeLevel, message: &str) {
        self.notifier.notify(&Notice {
            slug: kind.slug.clone(),
            level,
            message: message.to_string(),
        });
    }

    fn schedule_refresh(&self) -> ScheduledRefresh {
        let renderer = Arc::clone(&self.renderer);
        let delay = self.refresh_delay;
        debug!(delay_secs = delay.as_secs_f64(), "scheduling report refresh");
        let handle = tokio::spawn(
            async move {
                tokio::time::sleep(delay).await;
                // The renderer has already drawn and logged any failure.
                if let Err(e) = renderer.refresh().await {
                    debug!(error = %e, "scheduled refresh failed");
                }
            }
            .in_current_span(),
        );
        ScheduledRefresh { handle }
    }
}
