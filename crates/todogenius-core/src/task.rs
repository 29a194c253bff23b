use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::category::{CategoryTag, DEFAULT_CATEGORY_COLOR};
use crate::priority::{PriorityBand, DEFAULT_PRIORITY};
use crate::wire;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Status {
    pub const ALL: &[Status] = &[
        Status::Pending,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
            Status::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Status::Pending),
            "in_progress" => Some(Status::InProgress),
            "completed" => Some(Status::Completed),
            "cancelled" => Some(Status::Cancelled),
            _ => None,
        }
    }

    /// Status after the complete/reopen toggle.
    pub fn toggled(&self) -> Status {
        match self {
            Status::Completed => Status::Pending,
            _ => Status::Completed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

fn default_priority() -> f64 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub description: String,
    #[serde(default)]
    pub is_ai_enhanced: bool,
    /// Kept in the offset the server sent so the calendar day is stable.
    #[serde(default, with = "wire::opt_datetime_offset")]
    pub deadline: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub is_ai_suggested_deadline: bool,
    #[serde(default = "default_priority")]
    pub priority_score: f64,
    #[serde(default, rename = "category")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_color: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub is_overdue: bool,
    #[serde(default)]
    pub days_until_deadline: Option<i64>,
    #[serde(default, with = "wire::opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::opt_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "wire::opt_datetime")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    pub fn band(&self) -> PriorityBand {
        PriorityBand::classify(self.priority_score)
    }

    pub fn deadline_date(&self) -> Option<NaiveDate> {
        self.deadline.map(|dt| dt.date_naive())
    }

    /// The category attached to this task, if it has a name.
    pub fn category(&self) -> Option<CategoryTag> {
        let name = self.category_name.as_deref().filter(|n| !n.is_empty())?;
        Some(CategoryTag {
            name: name.to_string(),
            color: self
                .category_color
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
        })
    }
}

/// Body of a create or update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub category_color: String,
    pub priority_score: f64,
    #[serde(default, with = "wire::opt_date")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub is_ai_enhanced: bool,
    #[serde(default)]
    pub is_ai_suggested_deadline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl TaskPayload {
    /// Payload that reproduces the task exactly as last fetched.
    pub fn from_task(task: &Task) -> Self {
        let category = task.category();
        TaskPayload {
            title: task.title.clone(),
            description: task.description.clone(),
            category_name: category.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
            category_color: category.map(|c| c.color).unwrap_or_default(),
            priority_score: task.priority_score,
            deadline: task.deadline_date(),
            is_ai_enhanced: task.is_ai_enhanced,
            is_ai_suggested_deadline: task.is_ai_suggested_deadline,
            status: Some(task.status),
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }
}

/// Status choices offered by the filter bar. `Overdue` is not a stored
/// status; the server computes it from the deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    InProgress,
    Completed,
    Overdue,
}

impl StatusFilter {
    pub const ALL: &[StatusFilter] = &[
        StatusFilter::All,
        StatusFilter::Pending,
        StatusFilter::InProgress,
        StatusFilter::Completed,
        StatusFilter::Overdue,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            StatusFilter::All => "All Tasks",
            StatusFilter::Pending => "Pending",
            StatusFilter::InProgress => "In Progress",
            StatusFilter::Completed => "Completed",
            StatusFilter::Overdue => "Overdue",
        }
    }

    pub fn next(&self) -> StatusFilter {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub search: String,
    pub status: StatusFilter,
    pub priority: Option<PriorityBand>,
    pub category_id: Option<String>,
}

impl TaskFilter {
    /// Number of non-search filters that narrow the list.
    pub fn active_count(&self) -> usize {
        usize::from(self.status != StatusFilter::All)
            + usize::from(self.priority.is_some())
            + usize::from(self.category_id.is_some())
    }

    pub fn cycle_priority(&mut self) {
        self.priority = match self.priority {
            None => Some(PriorityBand::High),
            Some(PriorityBand::High) => Some(PriorityBand::Medium),
            Some(PriorityBand::Medium) => Some(PriorityBand::Low),
            Some(PriorityBand::Low) => None,
        };
    }

    /// Query parameters understood by the task list endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let search = self.search.trim();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        match self.status {
            StatusFilter::All => {}
            StatusFilter::Pending => params.push(("status", Status::Pending.as_str().into())),
            StatusFilter::InProgress => {
                params.push(("status", Status::InProgress.as_str().into()))
            }
            StatusFilter::Completed => {
                params.push(("status", Status::Completed.as_str().into()))
            }
            StatusFilter::Overdue => params.push(("overdue", "true".into())),
        }
        if let Some(band) = self.priority {
            let (min, max) = band.query_bounds();
            if let Some(min) = min {
                params.push(("min_priority", min.to_string()));
            }
            if let Some(max) = max {
                params.push(("max_priority", max.to_string()));
            }
        }
        if let Some(ref id) = self.category_id {
            params.push(("category", id.clone()));
        }
        params
    }
}
