//! Per-kind control state and its presentation.

use super::kind::AnalysisKind;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Idle,
    InFlight,
    /// Enabled again; keeps the reason of the last failed attempt.
    Error(String),
}

impl TriggerState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, TriggerState::InFlight)
    }
}

/// What a control looks like for a given state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlView {
    pub slug: String,
    pub label: String,
    pub enabled: bool,
    pub busy: bool,
    pub last_error: Option<String>,
}

impl ControlView {
    pub fn project(kind: &AnalysisKind, state: &TriggerState) -> Self {
        match state {
            TriggerState::Idle => Self {
                slug: kind.slug.clone(),
                label: kind.label.clone(),
                enabled: true,
                busy: false,
                last_error: None,
            },
            TriggerState::InFlight => Self {
                slug: kind.slug.clone(),
                label: kind.busy_label.clone(),
                enabled: false,
                busy: true,
                last_error: None,
            },
            TriggerState::Error(reason) => Self {
                slug: kind.slug.clone(),
                label: kind.label.clone(),
                enabled: true,
                busy: false,
                last_error: Some(reason.clone()),
            },
        }
    }
}

/// Control state for every kind. Kinds never seen are `Idle`.
///
/// The lock is only held for map reads and writes, never across an await.
#[derive(Debug, Default)]
pub struct TriggerStore {
    states: Mutex<HashMap<String, TriggerState>>,
}

impl TriggerStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self, slug: &str) -> TriggerState {
        self.lock().get(slug).cloned().unwrap_or_default()
    }

    /// Move `slug` to `InFlight` unless it already is.
    ///
    /// The returned guard puts the control back into an enabled state when
    /// dropped, whichever way the attempt ends.
    pub fn try_begin(self: &Arc<Self>, slug: &str) -> Option<InFlightGuard> {
        let mut states = self.lock();
        let state = states.entry(slug.to_string()).or_default();
        if state.is_in_flight() {
            return None;
        }
        *state = TriggerState::InFlight;
        Some(InFlightGuard {
            store: Arc::clone(self),
            slug: slug.to_string(),
            outcome: TriggerState::Idle,
        })
    }

    fn set(&self, slug: &str, state: TriggerState) {
        self.lock().insert(slug.to_string(), state);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, TriggerState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Held for the lifetime of one in-flight request.
#[derive(Debug)]
pub struct InFlightGuard {
    store: Arc<TriggerStore>,
    slug: String,
    outcome: TriggerState,
}

impl InFlightGuard {
    /// Leave the control in `Error` instead of `Idle` on release.
    pub fn fail(&mut self, reason: String) {
        self.outcome = TriggerState::Error(reason);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let outcome = std::mem::take(&mut self.outcome);
        self.store.set(&self.slug, outcome);
    }
}
