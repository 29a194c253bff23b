use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::category::{CategoryTag, DEFAULT_CATEGORY_COLOR};
use crate::wire;

/// The enhancement endpoint returns either one description or several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Descriptions {
    One(String),
    Many(Vec<String>),
}

impl Default for Descriptions {
    fn default() -> Self {
        Descriptions::Many(Vec::new())
    }
}

impl Descriptions {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Descriptions::One(s) if s.is_empty() => Vec::new(),
            Descriptions::One(s) => vec![s],
            Descriptions::Many(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedCategory {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_new: bool,
}

/// Raw payload of `POST /ai/enhance-task/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enhancement {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub descriptions: Descriptions,
    #[serde(default)]
    pub category: Option<SuggestedCategory>,
    #[serde(default)]
    pub priority_score: Option<f64>,
    #[serde(default, with = "wire::lenient_opt_date")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub timeframe_days: Option<u32>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub reasoning: String,
}

/// An enhancement bound to the exact title it was computed for.
///
/// `source_title` is both the cache key that suppresses repeat requests and
/// the staleness check: once the form title moves away from it, the
/// suggestion must not be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AiSuggestion {
    pub source_title: String,
    pub reasoning: String,
    pub descriptions: Vec<String>,
    pub category: Option<CategoryTag>,
    pub priority_score: Option<f64>,
    pub deadline: Option<NaiveDate>,
    pub confidence: f64,
}

impl AiSuggestion {
    pub fn new(source_title: impl Into<String>, enhancement: Enhancement) -> Self {
        let category = enhancement
            .category
            .filter(|c| !c.name.trim().is_empty())
            .map(|c| CategoryTag {
                name: c.name,
                color: c
                    .color
                    .filter(|col| !col.is_empty())
                    .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
            });
        AiSuggestion {
            source_title: source_title.into(),
            reasoning: enhancement.reasoning,
            descriptions: enhancement.descriptions.into_vec(),
            category,
            priority_score: enhancement.priority_score,
            deadline: enhancement.deadline,
            confidence: enhancement.confidence.clamp(0.0, 1.0),
        }
    }

    /// The description that "apply" copies into the form.
    pub fn description(&self) -> &str {
        self.descriptions.first().map(String::as_str).unwrap_or("")
    }

    pub fn confidence_percent(&self) -> u8 {
        (self.confidence * 100.0).round() as u8
    }

    pub fn is_for(&self, title: &str) -> bool {
        self.source_title == title
    }
}
