//! Wiring of renderer and triggers, plus the interactive command loop.

use crate::api::DashboardApi;
use crate::config::DashboardConfig;
use crate::render::{RefreshOutcome, ReportRenderer, Surface};
use crate::trigger::state::ControlView;
use crate::trigger::{AnalysisTrigger, Notifier, TriggerOutcome};
use crate::DashboardError;
use anyhow::Result;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A parsed line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Quit,
    Help,
    Trigger(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "" => None,
            "r" | "refresh" => Some(Command::Refresh),
            "q" | "quit" | "exit" => Some(Command::Quit),
            "h" | "help" | "?" => Some(Command::Help),
            other => Some(Command::Trigger(other.to_string())),
        }
    }
}

pub struct Dashboard {
    renderer: Arc<ReportRenderer>,
    trigger: Arc<AnalysisTrigger>,
    /// Attempts started from `watch`, including their scheduled refresh.
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        surface: Arc<dyn Surface>,
        notifier: Arc<dyn Notifier>,
        config: &DashboardConfig,
    ) -> Self {
        let renderer = Arc::new(ReportRenderer::new(
            Arc::clone(&api),
            surface,
            config.display.zone(),
        ));
        let trigger = Arc::new(AnalysisTrigger::new(
            api,
            Arc::clone(&renderer),
            notifier,
            config.kinds(),
            config.refresh.delay(),
        ));
        Self {
            renderer,
            trigger,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn trigger(&self) -> &Arc<AnalysisTrigger> {
        &self.trigger
    }

    pub async fn refresh(&self) -> Result<RefreshOutcome, DashboardError> {
        self.renderer.refresh().await
    }

    /// Trigger the kind named by `input` (slug or list number).
    pub async fn run_analysis(&self, input: &str) -> Result<TriggerOutcome> {
        let kind = self
            .trigger
            .kinds()
            .resolve(input)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown analysis kind: {}", input))?;
        Ok(self.trigger.trigger(&kind).await?)
    }

    /// Initial refresh, then one command per input line until `quit` or EOF.
    ///
    /// Triggers run as background tasks so the loop keeps reading while a
    /// request is in flight; repeated commands for that kind are ignored.
    pub async fn watch<R>(&self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.refresh_logged().await;
        println!("{}", format_controls(&self.trigger.controls()));

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            match command {
                Command::Quit => break,
                Command::Help => println!("{}", HELP),
                Command::Refresh => self.refresh_logged().await,
                Command::Trigger(slug) => {
                    self.spawn_trigger(&slug);
                }
            }
            println!("{}", format_controls(&self.trigger.controls()));
        }

        let abandoned = self.unfinished();
        if abandoned > 0 {
            warn!(abandoned, "closing with analyses or refreshes still pending");
            println!(
                "{} pending analysis task(s) dropped; their reports will not be refreshed.",
                abandoned
            );
        }
        info!("dashboard closed");
        Ok(())
    }

    /// The surface already shows any failure.
    async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "refresh failed");
        }
    }

    /// Start the kind named by `input` in the background.
    ///
    /// The control is disabled before this returns, so a control bar printed
    /// right after already shows the attempt. Returns whether an attempt
    /// was started.
    pub fn spawn_trigger(&self, input: &str) -> bool {
        let Some(kind) = self.trigger.kinds().resolve(input).cloned() else {
            println!("Unknown analysis '{}'. Type 'h' for help.", input);
            return false;
        };
        let Some(guard) = self.trigger.begin(&kind) else {
            println!("'{}' is already running.", kind.label);
            return false;
        };

        let trigger = Arc::clone(&self.trigger);
        let handle = tokio::spawn(async move {
            let result = trigger.run(&kind, guard).await;
            println!("{}", format_controls(&trigger.controls()));
            match result {
                Ok(refresh) => refresh.wait().await,
                // Reported through the notifier already.
                Err(e) => debug!(error = %e, "trigger attempt failed"),
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
        true
    }

    /// Background attempts that have not completed yet.
    pub fn unfinished(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }
}

const HELP: &str = "Commands: <number|slug> run analysis, r refresh, q quit";

/// One line listing every control, numbered for input.
pub fn format_controls(controls: &[ControlView]) -> String {
    let mut out = String::new();
    for (i, control) in controls.iter().enumerate() {
        if i > 0 {
            out.push_str("   ");
        }
        if control.enabled {
            let _ = write!(out, "[{}] {}", i + 1, control.label);
        } else {
            let _ = write!(out, "[-] {}", control.label);
        }
        if control.last_error.is_some() {
            out.push_str(" (last attempt failed)");
        }
    }
    out
}
