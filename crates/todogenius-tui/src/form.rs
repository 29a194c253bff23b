//! Editable state of the create/edit task form.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use todogenius_core::category::{Category, CategoryTag, DEFAULT_CATEGORY_COLOR};
use todogenius_core::priority::{clamp_priority, normalize_priority, DEFAULT_PRIORITY, PRIORITY_STEP};
use todogenius_core::suggestion::{AiSuggestion, Enhancement};
use todogenius_core::task::{Task, TaskPayload};
use todogenius_core::TodoError;
use todogenius_service::ServiceError;

use crate::debounce::Debounced;
use crate::reconciler::{EnhanceTicket, Resolution, SuggestionReconciler};

pub const CREATE_FAILED: &str = "Failed to create task. Please try again.";
pub const UPDATE_FAILED: &str = "Failed to update task. Please try again.";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Category,
    Priority,
    Deadline,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Title,
        FormField::Description,
        FormField::Category,
        FormField::Priority,
        FormField::Deadline,
    ];

    pub fn next(self) -> FormField {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> FormField {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Description => "Description",
            FormField::Category => "Category",
            FormField::Priority => "Priority",
            FormField::Deadline => "Deadline",
        }
    }
}

/// A single suggested value that can be copied into the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionField {
    Description,
    Category,
    Priority,
    Deadline,
}

/// Entry in the category picker. The AI shortcut, when present, comes first.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryOption {
    Suggested(CategoryTag),
    Existing(CategoryTag),
}

impl CategoryOption {
    pub fn tag(&self) -> &CategoryTag {
        match self {
            CategoryOption::Suggested(t) | CategoryOption::Existing(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create(TaskPayload),
    Update { id: String, payload: TaskPayload },
}

impl Submission {
    pub fn payload(&self) -> &TaskPayload {
        match self {
            Submission::Create(p) | Submission::Update { payload: p, .. } => p,
        }
    }
}

#[derive(Debug)]
pub struct TaskForm {
    title: String,
    description: String,
    category: Option<CategoryTag>,
    priority: f64,
    deadline: Option<NaiveDate>,
    deadline_input: String,
    original: Option<Task>,
    reconciler: SuggestionReconciler,
    title_watch: Debounced<String>,
    /// Deadline most recently copied from a suggestion.
    ai_deadline: Option<NaiveDate>,
    focus: FormField,
    saving: bool,
    error: Option<String>,
}

impl TaskForm {
    pub fn create(title_delay: Duration) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: None,
            priority: DEFAULT_PRIORITY,
            deadline: None,
            deadline_input: String::new(),
            original: None,
            reconciler: SuggestionReconciler::new(None),
            title_watch: Debounced::new(title_delay),
            ai_deadline: None,
            focus: FormField::Title,
            saving: false,
            error: None,
        }
    }

    pub fn edit(task: &Task, title_delay: Duration) -> Self {
        let deadline = task.deadline_date();
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            category: task.category(),
            priority: clamp_priority(task.priority_score),
            deadline,
            deadline_input: deadline.map(fmt_date).unwrap_or_default(),
            original: Some(task.clone()),
            reconciler: SuggestionReconciler::new(Some(&task.title)),
            title_watch: Debounced::new(title_delay),
            ai_deadline: if task.is_ai_suggested_deadline {
                deadline
            } else {
                None
            },
            focus: FormField::Title,
            saving: false,
            error: None,
        }
    }

    // -- Field access --

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Option<&CategoryTag> {
        self.category.as_ref()
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn deadline(&self) -> Option<NaiveDate> {
        self.deadline
    }

    pub fn deadline_input(&self) -> &str {
        &self.deadline_input
    }

    pub fn focus(&self) -> FormField {
        self.focus
    }

    pub fn is_edit(&self) -> bool {
        self.original.is_some()
    }

    pub fn original(&self) -> Option<&Task> {
        self.original.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn reconciler(&self) -> &SuggestionReconciler {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut SuggestionReconciler {
        &mut self.reconciler
    }

    /// Suggestion still valid for the live title.
    pub fn current_suggestion(&self) -> Option<&AiSuggestion> {
        self.reconciler.current(&self.title)
    }

    // -- Editing --

    pub fn set_focus(&mut self, field: FormField, today: NaiveDate) {
        if self.focus == FormField::Deadline && field != FormField::Deadline {
            if let Err(e) = self.commit_deadline_input(today) {
                self.error = Some(e.to_string());
                return;
            }
        }
        self.focus = field;
    }

    pub fn set_title(&mut self, title: impl Into<String>, now: Instant) {
        self.title = title.into();
        self.title_watch.set(self.title.clone(), now);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Type a character into the focused text field.
    pub fn insert_char(&mut self, c: char, now: Instant) {
        match self.focus {
            FormField::Title => {
                let mut title = self.title.clone();
                title.push(c);
                self.set_title(title, now);
            }
            FormField::Description => self.description.push(c),
            FormField::Deadline => self.deadline_input.push(c),
            FormField::Category | FormField::Priority => {}
        }
    }

    pub fn backspace(&mut self, now: Instant) {
        match self.focus {
            FormField::Title => {
                let mut title = self.title.clone();
                title.pop();
                self.set_title(title, now);
            }
            FormField::Description => {
                self.description.pop();
            }
            FormField::Deadline => {
                self.deadline_input.pop();
            }
            FormField::Category | FormField::Priority => {}
        }
    }

    pub fn select_category(&mut self, category: Option<CategoryTag>) {
        self.category = category;
    }

    pub fn set_priority(&mut self, score: f64) {
        self.priority = normalize_priority(score);
    }

    pub fn nudge_priority(&mut self, steps: i32) {
        self.set_priority(self.priority + f64::from(steps) * PRIORITY_STEP);
    }

    /// Set the deadline from user input; dates before `today` are rejected.
    pub fn set_deadline(&mut self, date: Option<NaiveDate>, today: NaiveDate) -> Result<(), TodoError> {
        if let Some(d) = date {
            if d < today {
                return Err(TodoError::DeadlineInPast(d));
            }
        }
        self.deadline = date;
        self.deadline_input = date.map(fmt_date).unwrap_or_default();
        Ok(())
    }

    /// Parse the typed deadline text into the deadline field.
    pub fn commit_deadline_input(&mut self, today: NaiveDate) -> Result<(), TodoError> {
        let text = self.deadline_input.trim().to_string();
        if self.deadline.map(fmt_date).unwrap_or_default() == text {
            return Ok(());
        }
        if text.is_empty() {
            return self.set_deadline(None, today);
        }
        let date = NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .map_err(|_| TodoError::InvalidDate(text.clone()))?;
        self.set_deadline(Some(date), today)
    }

    // -- AI suggestions --

    /// Advance the title debouncer. Returns a ticket when an enhancement
    /// request should be issued.
    pub fn tick(&mut self, now: Instant) -> Option<EnhanceTicket> {
        let stable = self.title_watch.poll(now)?;
        self.reconciler.consider(&stable)
    }

    pub fn title_pending(&self) -> bool {
        self.title_watch.is_pending()
    }

    pub fn resolve_enhancement(
        &mut self,
        generation: u64,
        result: Result<Enhancement, ServiceError>,
    ) -> Resolution {
        self.reconciler.resolve(generation, &self.title, result)
    }

    fn live_suggestion(&self) -> Result<AiSuggestion, TodoError> {
        let held = self.reconciler.suggestion().ok_or(TodoError::NoSuggestion)?;
        if !held.is_for(self.title.trim()) {
            return Err(TodoError::StaleSuggestion(held.source_title.clone()));
        }
        Ok(held.clone())
    }

    /// Copy one suggested value into its form field.
    pub fn apply(&mut self, field: SuggestionField) -> Result<(), TodoError> {
        let s = self.live_suggestion()?;
        self.apply_field(&s, field);
        Ok(())
    }

    /// Copy every suggested value in one step.
    pub fn apply_all(&mut self) -> Result<(), TodoError> {
        let s = self.live_suggestion()?;
        for field in [
            SuggestionField::Description,
            SuggestionField::Category,
            SuggestionField::Priority,
            SuggestionField::Deadline,
        ] {
            self.apply_field(&s, field);
        }
        Ok(())
    }

    fn apply_field(&mut self, s: &AiSuggestion, field: SuggestionField) {
        match field {
            SuggestionField::Description => self.description = s.description().to_string(),
            SuggestionField::Category => {
                if let Some(ref cat) = s.category {
                    self.category = Some(cat.clone());
                }
            }
            SuggestionField::Priority => {
                if let Some(score) = s.priority_score {
                    self.priority = clamp_priority(score);
                }
            }
            SuggestionField::Deadline => {
                self.deadline = s.deadline;
                self.deadline_input = s.deadline.map(fmt_date).unwrap_or_default();
                self.ai_deadline = s.deadline;
            }
        }
    }

    /// Picker entries: the suggested category first (unless it is already
    /// selected), then every known category.
    pub fn category_options(&self, categories: &[Category]) -> Vec<CategoryOption> {
        let mut options = Vec::with_capacity(categories.len() + 1);
        if let Some(suggested) = self.current_suggestion().and_then(|s| s.category.clone()) {
            let selected = self.category.as_ref().map(|c| c.name.as_str());
            if selected != Some(suggested.name.as_str()) {
                options.push(CategoryOption::Suggested(suggested));
            }
        }
        options.extend(
            categories
                .iter()
                .map(|c| CategoryOption::Existing(CategoryTag::from(c))),
        );
        options
    }

    // -- Submission --

    pub fn is_ai_enhanced(&self) -> bool {
        self.reconciler.suggestion().is_some()
            || self.original.as_ref().is_some_and(|t| t.is_ai_enhanced)
    }

    pub fn is_ai_suggested_deadline(&self) -> bool {
        self.deadline.is_some() && self.deadline == self.ai_deadline
    }

    pub fn payload(&self) -> TaskPayload {
        let category = self.category.clone();
        TaskPayload {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category_name: category.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
            category_color: category
                .map(|c| c.color)
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            priority_score: self.priority,
            deadline: self.deadline,
            is_ai_enhanced: self.is_ai_enhanced(),
            is_ai_suggested_deadline: self.is_ai_suggested_deadline(),
            status: self.original.as_ref().map(|t| t.status),
        }
    }

    /// Validate and mark the form as saving. Nothing is sent when this fails.
    pub fn begin_submit(&mut self, today: NaiveDate) -> Result<Submission, TodoError> {
        let result = self.validate(today);
        match result {
            Ok(ref _submission) => {
                self.saving = true;
                self.error = None;
            }
            Err(ref e) => self.error = Some(e.to_string()),
        }
        result
    }

    fn validate(&mut self, today: NaiveDate) -> Result<Submission, TodoError> {
        if self.title.trim().is_empty() {
            return Err(TodoError::EmptyTitle);
        }
        self.commit_deadline_input(today)?;
        let payload = self.payload();
        Ok(match self.original {
            Some(ref task) => Submission::Update {
                id: task.id.clone(),
                payload,
            },
            None => Submission::Create(payload),
        })
    }

    /// Record the server's answer. Returns true when the form can close.
    pub fn finish_submit(&mut self, result: Result<Task, ServiceError>) -> bool {
        self.saving = false;
        match result {
            Ok(_) => true,
            Err(e) => {
                let fallback = if self.is_edit() {
                    UPDATE_FAILED
                } else {
                    CREATE_FAILED
                };
                self.error = Some(e.user_message(fallback));
                false
            }
        }
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}
