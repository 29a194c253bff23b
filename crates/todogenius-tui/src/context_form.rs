use std::time::{Duration, Instant};

use chrono::{Duration as Days, NaiveDate};
use todogenius_core::context::{ContextEntry, CreateContext, SourceType};
use todogenius_core::TodoError;
use todogenius_service::ServiceError;

pub const CONTEXT_FAILED: &str = "Failed to add context. Please try again.";
pub const CONTEXT_ADDED: &str = "Context added successfully!";
const SUCCESS_VISIBLE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    Content,
    Source,
    Date,
}

impl ContextField {
    pub fn next(self) -> ContextField {
        match self {
            ContextField::Content => ContextField::Source,
            ContextField::Source => ContextField::Date,
            ContextField::Date => ContextField::Content,
        }
    }
}

/// Input form for a new context entry.
#[derive(Debug)]
pub struct ContextForm {
    content: String,
    source_type: SourceType,
    date: NaiveDate,
    focus: ContextField,
    saving: bool,
    error: Option<String>,
    success_until: Option<Instant>,
}

impl ContextForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            content: String::new(),
            source_type: SourceType::ALL[0],
            date: today,
            focus: ContextField::Content,
            saving: false,
            error: None,
            success_until: None,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn focus(&self) -> ContextField {
        self.focus
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success_visible(&self) -> bool {
        self.success_until.is_some()
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn insert_char(&mut self, c: char) {
        if self.focus == ContextField::Content {
            self.content.push(c);
        }
    }

    pub fn newline(&mut self) {
        if self.focus == ContextField::Content {
            self.content.push('\n');
        }
    }

    pub fn backspace(&mut self) {
        if self.focus == ContextField::Content {
            self.content.pop();
        }
    }

    pub fn cycle_source(&mut self) {
        self.source_type = self.source_type.next();
    }

    pub fn shift_date(&mut self, days: i64) {
        self.date += Days::days(days);
    }

    pub fn reset_date(&mut self, today: NaiveDate) {
        self.date = today;
    }

    pub fn begin_submit(&mut self) -> Result<CreateContext, TodoError> {
        let content = self.content.trim();
        if content.is_empty() {
            self.error = Some(TodoError::EmptyContent.to_string());
            return Err(TodoError::EmptyContent);
        }
        self.saving = true;
        self.error = None;
        Ok(CreateContext {
            content: content.to_string(),
            source_type: self.source_type,
            context_date: self.date,
        })
    }

    /// Returns true when the entry was stored and the list should reload.
    pub fn finish_submit(&mut self, result: Result<ContextEntry, ServiceError>, now: Instant) -> bool {
        self.saving = false;
        match result {
            Ok(_) => {
                self.content.clear();
                self.success_until = Some(now + SUCCESS_VISIBLE);
                true
            }
            Err(e) => {
                self.error = Some(e.user_message(CONTEXT_FAILED));
                false
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if self.success_until.is_some_and(|until| until <= now) {
            self.success_until = None;
        }
    }
}
