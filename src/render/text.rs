//! Plain-text formatting of views for the terminal front-end.

use super::{Surface, View};
use crate::report::card::{Card, TimeWindowStyle};
use std::fmt::Write as _;
use std::io::Write as _;
use tracing::debug;

/// Format a whole view as text.
pub fn format_view(view: &View, style: TimeWindowStyle) -> String {
    if let Some(placeholder) = view.placeholder() {
        return format!("[{}] {}\n", placeholder.style, placeholder.message);
    }
    match view {
        View::Loading => "Loading reports...\n".to_string(),
        _ => view
            .cards()
            .iter()
            .map(|card| format_card(card, style))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Format one card as a block of lines.
pub fn format_card(card: &Card, style: TimeWindowStyle) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ({})", card.title, card.metric);
    let _ = writeln!(out, "   {}", card.details);
    let _ = writeln!(out, "   Severity: {} [{}]", card.severity, card.style);
    for (label, value) in card.window.lines(style) {
        let _ = writeln!(out, "   {}: {}", label, value);
    }
    let _ = writeln!(out, "   Reported on {}", card.reported_on);
    out
}

/// Surface that prints every replacement to stdout.
pub struct TerminalSurface {
    style: TimeWindowStyle,
    json: bool,
}

impl TerminalSurface {
    pub fn new(style: TimeWindowStyle, json: bool) -> Self {
        Self { style, json }
    }
}

impl Surface for TerminalSurface {
    fn replace(&self, view: View) {
        let text = if self.json {
            match serde_json::to_string_pretty(&view) {
                Ok(s) => s + "\n",
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode view");
                    return;
                }
            }
        } else {
            format_view(&view, self.style)
        };
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "\n{}", text.trim_end()).and_then(|_| stdout.flush()) {
            debug!(error = %e, "failed to write view to stdout");
        }
    }
}
