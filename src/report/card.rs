//! Pure projection of a report into the fields a card displays.

use super::{Report, Severity, StyleClass};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const INSTANT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Anomalous window as displayed, after localization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimeWindow {
    Instant { at: String },
    Range { start: String, end: String },
}

/// How a card lays out its time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindowStyle {
    /// One `Time:` line, either an instant or `A to B`.
    #[default]
    Combined,
    /// Separate `Start:` and `End:` lines.
    Labeled,
}

impl TimeWindow {
    /// `(label, value)` lines for the given layout.
    pub fn lines(&self, style: TimeWindowStyle) -> Vec<(&'static str, String)> {
        match (self, style) {
            (TimeWindow::Instant { at }, TimeWindowStyle::Combined) => vec![("Time", at.clone())],
            (TimeWindow::Range { start, end }, TimeWindowStyle::Combined) => {
                vec![("Time", format!("{} to {}", start, end))]
            }
            (TimeWindow::Instant { at }, TimeWindowStyle::Labeled) => {
                vec![("Start", at.clone()), ("End", at.clone())]
            }
            (TimeWindow::Range { start, end }, TimeWindowStyle::Labeled) => {
                vec![("Start", start.clone()), ("End", end.clone())]
            }
        }
    }
}

/// Everything a report card shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub metric: String,
    pub details: String,
    pub severity: String,
    pub style: StyleClass,
    pub window: TimeWindow,
    pub reported_on: String,
}

/// Project a report into a card, localizing timestamps into `tz`.
pub fn project<Tz>(report: &Report, tz: &Tz) -> Card
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let start = localize(&report.start_time, tz, INSTANT_FORMAT);
    let end = localize(&report.end_time, tz, INSTANT_FORMAT);
    // Equality is judged on the displayed strings, so sub-second
    // differences collapse into one instant.
    let window = if start == end {
        TimeWindow::Instant { at: start }
    } else {
        TimeWindow::Range { start, end }
    };

    Card {
        title: report.pattern_detected.clone(),
        metric: report.metric_name.clone(),
        details: report.details.clone(),
        severity: severity_label(&report.severity),
        style: report.severity.style(),
        window,
        reported_on: localize(&report.created_at, tz, DATE_FORMAT),
    }
}

fn severity_label(severity: &Severity) -> String {
    match severity {
        Severity::Unknown(raw) if raw.is_empty() => "unknown".to_string(),
        other => other.to_string(),
    }
}

fn localize<Tz>(at: &DateTime<Utc>, tz: &Tz, fmt: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format(fmt).to_string()
}
