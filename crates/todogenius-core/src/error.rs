use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TodoError {
    #[error("title is required")]
    EmptyTitle,

    #[error("content is required")]
    EmptyContent,

    #[error("deadline {0} is before today")]
    DeadlineInPast(NaiveDate),

    #[error("invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("suggestion was made for \"{0}\" and no longer matches the title")]
    StaleSuggestion(String),

    #[error("no AI suggestion available")]
    NoSuggestion,
}
