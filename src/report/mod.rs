//! Report model -- the backend's anomaly records as the client sees them.

pub mod card;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Severity of a detected pattern.
///
/// Anything the backend sends outside the known set lands in `Unknown`
/// with the raw value kept for display. Decoding never fails on severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "String")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Unknown(String),
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Unknown(String::new())
    }
}

impl From<serde_json::Value> for Severity {
    fn from(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::String(s) => Severity::from(s.as_str()),
            serde_json::Value::Null => Severity::default(),
            other => Severity::Unknown(other.to_string()),
        }
    }
}

impl From<&str> for Severity {
    fn from(raw: &str) -> Self {
        match raw {
            "critical" => Severity::Critical,
            "warning" => Severity::Warning,
            "info" => Severity::Info,
            other => Severity::Unknown(other.to_string()),
        }
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Unknown(raw) => raw,
        }
    }

    /// Visual class of the severity badge.
    pub fn style(&self) -> StyleClass {
        match self {
            Severity::Critical => StyleClass::Danger,
            Severity::Warning => StyleClass::Warning,
            Severity::Info => StyleClass::Info,
            Severity::Unknown(_) => StyleClass::Secondary,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Presentation class shared by report badges and placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleClass {
    Danger,
    Warning,
    Info,
    Secondary,
}

impl std::fmt::Display for StyleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StyleClass::Danger => write!(f, "danger"),
            StyleClass::Warning => write!(f, "warning"),
            StyleClass::Info => write!(f, "info"),
            StyleClass::Secondary => write!(f, "secondary"),
        }
    }
}

/// A detected anomalous pattern over one metric and time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub metric_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub pattern_detected: String,
    #[serde(default)]
    pub severity: Severity,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub details: String,
    pub created_at: DateTime<Utc>,
}

/// Text field that tolerates `null` and non-string values.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::Value::deserialize(deserializer)?.as_i64())
}

/// Decode a `/api/reports` body. The backend encodes an empty set as `null`.
pub fn parse_reports(body: &str) -> Result<Vec<Report>, serde_json::Error> {
    let reports: Option<Vec<Report>> = serde_json::from_str(body)?;
    Ok(reports.unwrap_or_default())
}
