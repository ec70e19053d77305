//! Analysis kinds and their registry.

use serde::{Deserialize, Serialize};

/// One backend analysis routine and the labels its control uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisKind {
    /// Path segment of `/api/analyze/<slug>`.
    pub slug: String,
    pub label: String,
    pub busy_label: String,
    pub started_message: String,
    pub failed_message: String,
}

impl AnalysisKind {
    /// A kind with generic messages.
    pub fn new(slug: &str, label: &str) -> Self {
        Self {
            slug: slug.to_string(),
            label: label.to_string(),
            busy_label: "Analyzing...".to_string(),
            started_message: format!("Analysis '{}' started! Reports will refresh soon.", slug),
            failed_message: format!("Failed to start analysis '{}'.", slug),
        }
    }

    fn builtin(slug: &str, label: &str, noun: &str) -> Self {
        Self {
            started_message: format!("{} analysis started! Reports will refresh soon.", noun),
            failed_message: format!("Failed to start {} analysis.", noun.to_lowercase()),
            ..Self::new(slug, label)
        }
    }
}

/// Ordered, open set of analysis kinds.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: Vec<AnalysisKind>,
}

impl KindRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the kinds the backend ships with.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(AnalysisKind::builtin("cpu-spike", "Run Spike Analysis", "Spike"));
        registry.register(AnalysisKind::builtin(
            "cpu-high-load",
            "Run High Load Analysis",
            "High load",
        ));
        registry.register(AnalysisKind::builtin("cpu", "Run CPU Analysis", "CPU"));
        registry
    }

    /// Add a kind, replacing any existing kind with the same slug in place.
    pub fn register(&mut self, kind: AnalysisKind) {
        match self.kinds.iter_mut().find(|k| k.slug == kind.slug) {
            Some(existing) => *existing = kind,
            None => self.kinds.push(kind),
        }
    }

    pub fn get(&self, slug: &str) -> Option<&AnalysisKind> {
        self.kinds.iter().find(|k| k.slug == slug)
    }

    /// Look up by slug, or by 1-based position in the list.
    pub fn resolve(&self, input: &str) -> Option<&AnalysisKind> {
        if let Some(kind) = self.get(input) {
            return Some(kind);
        }
        input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.kinds.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisKind> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
