//! Enrichment State
//!
//! Tagged-variant state machine tracking how far an admitted identity has
//! progressed through external record-store enrichment.

use serde::{Deserialize, Serialize};

/// The enrichment progress of a single registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentState {
    /// No remote record observed yet. Initial state.
    Pending,
    /// A remote record was observed but is not yet complete enough to use.
    Scraping,
    /// Enrichment succeeded.
    Completed {
        full_name: Option<String>,
        display_text: String,
        image_urls: Vec<String>,
    },
    /// Enrichment failed permanently.
    Error { reason: String },
}

impl EnrichmentState {
    /// Terminal states are never left once entered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrichmentState::Completed { .. } | EnrichmentState::Error { .. })
    }

    /// Whether `next` is a legal transition from `self`, per the allowed
    /// graph `Pending -> Scraping -> {Completed, Error}` (with `Pending ->
    /// {Completed, Error}` also permitted, since a poll may observe a fully
    /// formed record on its very first check).
    pub fn can_transition_to(&self, next: &EnrichmentState) -> bool {
        use EnrichmentState::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (Pending, Scraping) => true,
            (Pending, Completed { .. }) => true,
            (Pending, Error { .. }) => true,
            (Scraping, Scraping) => true,
            (Scraping, Completed { .. }) => true,
            (Scraping, Error { .. }) => true,
            _ => false,
        }
    }

    pub fn status_tag(&self) -> &'static str {
        match self {
            EnrichmentState::Pending => "pending",
            EnrichmentState::Scraping => "scraping",
            EnrichmentState::Completed { .. } => "completed",
            EnrichmentState::Error { .. } => "error",
        }
    }
}

impl Default for EnrichmentState {
    fn default() -> Self {
        EnrichmentState::Pending
    }
}

/// Derived, cached per-id summary read by the overlay path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonInfo {
    pub person_id: String,
    pub status: String,
    pub summary: String,
    pub full_name: Option<String>,
    pub image_urls: Vec<String>,
}

impl PersonInfo {
    pub fn from_state(person_id: impl Into<String>, state: &EnrichmentState) -> Self {
        match state {
            EnrichmentState::Pending | EnrichmentState::Scraping => Self {
                person_id: person_id.into(),
                status: state.status_tag().to_string(),
                summary: String::new(),
                full_name: None,
                image_urls: Vec::new(),
            },
            EnrichmentState::Completed {
                full_name,
                display_text,
                image_urls,
            } => Self {
                person_id: person_id.into(),
                status: state.status_tag().to_string(),
                summary: display_text.clone(),
                full_name: full_name.clone(),
                image_urls: image_urls.clone(),
            },
            EnrichmentState::Error { reason } => Self {
                person_id: person_id.into(),
                status: state.status_tag().to_string(),
                summary: reason.clone(),
                full_name: None,
                image_urls: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_transition_to_scraping() {
        assert!(EnrichmentState::Pending.can_transition_to(&EnrichmentState::Scraping));
    }

    #[test]
    fn completed_rejects_any_further_transition() {
        let completed = EnrichmentState::Completed {
            full_name: Some("Ada".into()),
            display_text: "hello".into(),
            image_urls: vec![],
        };
        assert!(!completed.can_transition_to(&EnrichmentState::Scraping));
        assert!(!completed.can_transition_to(&EnrichmentState::Pending));
    }

    #[test]
    fn error_rejects_any_further_transition() {
        let error = EnrichmentState::Error { reason: "boom".into() };
        assert!(!error.can_transition_to(&EnrichmentState::Scraping));
    }

    #[test]
    fn scraping_rejects_transition_back_to_pending() {
        assert!(!EnrichmentState::Scraping.can_transition_to(&EnrichmentState::Pending));
    }

    #[test]
    fn is_terminal_true_only_for_completed_and_error() {
        assert!(!EnrichmentState::Pending.is_terminal());
        assert!(!EnrichmentState::Scraping.is_terminal());
        assert!(EnrichmentState::Error { reason: "x".into() }.is_terminal());
    }
}
