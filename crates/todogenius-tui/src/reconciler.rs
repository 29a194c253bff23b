//! Decides when a task title should be sent for AI enhancement and which
//! responses are still allowed to land in the form.
//!
//! Every request is tagged with a generation number. A response is accepted
//! only when its generation is the newest one issued and the title it was
//! computed for still equals the live form title.

use todogenius_core::suggestion::{AiSuggestion, Enhancement};
use todogenius_service::ServiceError;
use tracing::{debug, warn};

pub const AI_ERROR_MESSAGE: &str = "Failed to get AI suggestions. Please try again.";

/// What the caller needs to issue `POST /ai/enhance-task/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhanceTicket {
    pub generation: u64,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The suggestion is now held and the panel shown.
    Stored,
    /// The request failed; the previous suggestion is untouched.
    Failed,
    /// The response was superseded or the title moved on. Nothing changed.
    Discarded,
}

#[derive(Debug, Default)]
pub struct SuggestionReconciler {
    generation: u64,
    in_flight: Option<EnhanceTicket>,
    suggestion: Option<AiSuggestion>,
    error: Option<String>,
    panel_visible: bool,
    /// Title of the task being edited. Never sent for enhancement.
    original_title: Option<String>,
}

impl SuggestionReconciler {
    pub fn new(original_title: Option<&str>) -> Self {
        Self {
            original_title: original_title.map(|t| t.trim().to_string()),
            ..Default::default()
        }
    }

    /// Called with each stabilized title. Returns a ticket when a new request
    /// should go out.
    pub fn consider(&mut self, title: &str) -> Option<EnhanceTicket> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        if self.suggestion.as_ref().is_some_and(|s| s.is_for(title)) {
            return None;
        }
        if self.original_title.as_deref() == Some(title) {
            return None;
        }
        if self.in_flight.as_ref().is_some_and(|t| t.title == title) {
            return None;
        }

        self.generation += 1;
        let ticket = EnhanceTicket {
            generation: self.generation,
            title: title.to_string(),
        };
        debug!(generation = ticket.generation, title, "requesting AI enhancement");
        self.in_flight = Some(ticket.clone());
        self.error = None;
        Some(ticket)
    }

    /// Settle the response for `generation` against the title currently in the form.
    pub fn resolve(
        &mut self,
        generation: u64,
        live_title: &str,
        result: Result<Enhancement, ServiceError>,
    ) -> Resolution {
        let ticket = match self.in_flight.take() {
            Some(t) if t.generation == generation => t,
            other => {
                self.in_flight = other;
                warn!(generation, "discarding superseded AI response");
                return Resolution::Discarded;
            }
        };

        if ticket.title != live_title.trim() {
            warn!(
                generation,
                requested = %ticket.title,
                "discarding AI response for a title that has since changed"
            );
            return Resolution::Discarded;
        }

        match result {
            Ok(enhancement) => {
                self.suggestion = Some(AiSuggestion::new(ticket.title, enhancement));
                self.panel_visible = true;
                self.error = None;
                Resolution::Stored
            }
            Err(e) => {
                warn!(error = %e, "AI enhancement failed");
                self.error = Some(AI_ERROR_MESSAGE.to_string());
                Resolution::Failed
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&EnhanceTicket> {
        self.in_flight.as_ref()
    }

    /// The held suggestion, whether or not it still matches the title.
    pub fn suggestion(&self) -> Option<&AiSuggestion> {
        self.suggestion.as_ref()
    }

    /// The held suggestion, only if it was computed for `live_title`.
    pub fn current(&self, live_title: &str) -> Option<&AiSuggestion> {
        self.suggestion
            .as_ref()
            .filter(|s| s.is_for(live_title.trim()))
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn panel_visible(&self) -> bool {
        self.panel_visible && self.suggestion.is_some()
    }

    pub fn toggle_panel(&mut self) {
        self.panel_visible = !self.panel_visible;
    }

    pub fn hide_panel(&mut self) {
        self.panel_visible = false;
    }
}
