use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::wire;

/// Where a context entry came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Whatsapp,
    Email,
    Note,
    #[default]
    Other,
}

impl SourceType {
    pub const ALL: &[SourceType] = &[
        SourceType::Whatsapp,
        SourceType::Email,
        SourceType::Note,
        SourceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Whatsapp => "whatsapp",
            SourceType::Email => "email",
            SourceType::Note => "note",
            SourceType::Other => "other",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceType::Whatsapp => "WhatsApp",
            SourceType::Email => "Email",
            SourceType::Note => "Note",
            SourceType::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "whatsapp" => Some(SourceType::Whatsapp),
            "email" => Some(SourceType::Email),
            "note" => Some(SourceType::Note),
            "other" => Some(SourceType::Other),
            _ => None,
        }
    }

    pub fn next(&self) -> SourceType {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub is_processed: bool,
    #[serde(default, with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::opt_date")]
    pub context_date: Option<NaiveDate>,
}

impl ContextEntry {
    /// The journal date, falling back to the creation day.
    pub fn date(&self) -> Option<NaiveDate> {
        self.context_date
            .or_else(|| self.created_at.map(|dt| dt.date_naive()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateContext {
    pub content: String,
    pub source_type: SourceType,
    pub context_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextFilter {
    pub source_type: Option<SourceType>,
    pub is_processed: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: String,
}

impl ContextFilter {
    pub fn cycle_source(&mut self) {
        self.source_type = match self.source_type {
            None => Some(SourceType::ALL[0]),
            Some(s) if s == SourceType::ALL[SourceType::ALL.len() - 1] => None,
            Some(s) => Some(s.next()),
        };
    }

    pub fn cycle_processed(&mut self) {
        self.is_processed = match self.is_processed {
            None => Some(false),
            Some(false) => Some(true),
            Some(true) => None,
        };
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(source) = self.source_type {
            params.push(("source_type", source.as_str().to_string()));
        }
        if let Some(processed) = self.is_processed {
            params.push(("is_processed", processed.to_string()));
        }
        if let Some(start) = self.start_date {
            params.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        params
    }
}
