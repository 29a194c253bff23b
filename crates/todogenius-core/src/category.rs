use serde::{Deserialize, Serialize};

/// Colour used when neither the user nor the AI picked one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#A78BFA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub usage_frequency: i64,
    #[serde(default)]
    pub task_count: i64,
}

/// A category as attached to a task or a suggestion: just the name and colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTag {
    pub name: String,
    pub color: String,
}

impl From<&Category> for CategoryTag {
    fn from(c: &Category) -> Self {
        CategoryTag {
            name: c.name.clone(),
            color: c.color.clone(),
        }
    }
}
