use std::fmt;

use serde::{Deserialize, Serialize};

/// Scores at or above this are at least medium priority.
pub const MEDIUM_THRESHOLD: f64 = 0.3;
/// Scores strictly above this are high priority.
pub const HIGH_THRESHOLD: f64 = 0.7;

pub const DEFAULT_PRIORITY: f64 = 0.5;
/// Granularity of the priority slider.
pub const PRIORITY_STEP: f64 = 0.1;

/// Coarse classification of a continuous priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityBand {
    Low,
    Medium,
    High,
}

impl PriorityBand {
    pub const ALL: &[PriorityBand] = &[PriorityBand::High, PriorityBand::Medium, PriorityBand::Low];

    pub fn classify(score: f64) -> Self {
        if score > HIGH_THRESHOLD {
            PriorityBand::High
        } else if score >= MEDIUM_THRESHOLD {
            PriorityBand::Medium
        } else {
            PriorityBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityBand::Low => "low",
            PriorityBand::Medium => "medium",
            PriorityBand::High => "high",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PriorityBand::Low => "Low",
            PriorityBand::Medium => "Medium",
            PriorityBand::High => "High",
        }
    }

    /// Label used by the filter picker.
    pub fn filter_label(&self) -> &'static str {
        match self {
            PriorityBand::Low => "Low (<0.3)",
            PriorityBand::Medium => "Medium (0.3-0.7)",
            PriorityBand::High => "High (>0.7)",
        }
    }

    /// `(min_priority, max_priority)` bounds sent to the list endpoint.
    pub fn query_bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            PriorityBand::Low => (None, Some(MEDIUM_THRESHOLD)),
            PriorityBand::Medium => (Some(MEDIUM_THRESHOLD), Some(HIGH_THRESHOLD)),
            PriorityBand::High => (Some(HIGH_THRESHOLD), None),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(PriorityBand::Low),
            "medium" => Some(PriorityBand::Medium),
            "high" => Some(PriorityBand::High),
            _ => None,
        }
    }
}

impl fmt::Display for PriorityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Clamp to [0, 1] without snapping. Used for scores that come from the
/// server or the model, which keep their exact value.
pub fn clamp_priority(score: f64) -> f64 {
    if !score.is_finite() {
        return DEFAULT_PRIORITY;
    }
    score.clamp(0.0, 1.0)
}

/// Clamp to [0, 1] and snap to the slider step.
pub fn normalize_priority(score: f64) -> f64 {
    if !score.is_finite() {
        return DEFAULT_PRIORITY;
    }
    let steps = (1.0 / PRIORITY_STEP).round();
    (score.clamp(0.0, 1.0) * steps).round() / steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_exact_scores() {
        assert_eq!(clamp_priority(0.72), 0.72);
        assert_eq!(clamp_priority(1.4), 1.0);
        assert_eq!(clamp_priority(-0.2), 0.0);
        assert_eq!(clamp_priority(f64::NAN), DEFAULT_PRIORITY);
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(PriorityBand::classify(0.0), PriorityBand::Low);
        assert_eq!(PriorityBand::classify(0.29), PriorityBand::Low);
        assert_eq!(PriorityBand::classify(0.3), PriorityBand::Medium);
        assert_eq!(PriorityBand::classify(0.7), PriorityBand::Medium);
        assert_eq!(PriorityBand::classify(0.71), PriorityBand::High);
        assert_eq!(PriorityBand::classify(1.0), PriorityBand::High);
    }

    #[test]
    fn normalize_clamps_and_snaps() {
        assert_eq!(normalize_priority(-3.0), 0.0);
        assert_eq!(normalize_priority(7.0), 1.0);
        assert!((normalize_priority(0.44) - 0.4).abs() < 1e-9);
        assert!((normalize_priority(0.46) - 0.5).abs() < 1e-9);
        assert_eq!(normalize_priority(f64::NAN), DEFAULT_PRIORITY);
    }

    #[test]
    fn query_bounds_per_band() {
        assert_eq!(PriorityBand::High.query_bounds(), (Some(0.7), None));
        assert_eq!(PriorityBand::Low.query_bounds(), (None, Some(0.3)));
    }
}
