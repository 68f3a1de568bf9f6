//! Turning a task's score distribution into faint/strong thresholds.

use serde::{Deserialize, Serialize};

use crate::error::StatsError;
use crate::snapshot::TaskStatisticsParameters;

/// Closed range a threshold is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelBounds {
    pub min: f64,
    pub max: f64,
}

impl LevelBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuspicionConfig {
    pub faint_coefficient: f64,
    pub strong_coefficient: f64,
    pub faint: LevelBounds,
    pub strong: LevelBounds,
}

impl Default for SuspicionConfig {
    fn default() -> Self {
        Self {
            faint_coefficient: 1.5,
            strong_coefficient: 3.0,
            faint: LevelBounds::new(4.0, 40.0),
            strong: LevelBounds::new(8.0, 80.0),
        }
    }
}

impl SuspicionConfig {
    /// Check the configuration and freeze it into a policy.
    ///
    /// A valid policy can never produce `faint > strong`.
    pub fn validate(&self) -> Result<SuspicionPolicy, StatsError> {
        let invalid = |msg: String| Err(StatsError::InvalidSuspicionConfig(msg));

        for (name, bounds) in [("faint", self.faint), ("strong", self.strong)] {
            if !bounds.min.is_finite() || !bounds.max.is_finite() {
                return invalid(format!("{name} bounds must be finite"));
            }
            if bounds.min > bounds.max {
                return invalid(format!(
                    "{name}.min ({}) is greater than {name}.max ({})",
                    bounds.min, bounds.max
                ));
            }
        }
        if !self.faint_coefficient.is_finite() || !self.strong_coefficient.is_finite() {
            return invalid("coefficients must be finite".into());
        }
        if self.faint_coefficient > self.strong_coefficient {
            return invalid(format!(
                "faint_coefficient ({}) is greater than strong_coefficient ({})",
                self.faint_coefficient, self.strong_coefficient
            ));
        }
        if self.faint.min > self.strong.min || self.faint.max > self.strong.max {
            return invalid("faint bounds must not exceed strong bounds".into());
        }
        Ok(SuspicionPolicy { config: *self })
    }
}

/// A validated [`SuspicionConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuspicionPolicy {
    config: SuspicionConfig,
}

impl Default for SuspicionPolicy {
    fn default() -> Self {
        Self {
            config: SuspicionConfig::default(),
        }
    }
}

impl SuspicionPolicy {
    pub fn config(&self) -> &SuspicionConfig {
        &self.config
    }

    /// Thresholds for a task, or `InsufficientData` before its first
    /// recalculation.
    pub fn levels(&self, params: Option<&TaskStatisticsParameters>) -> SuspicionOutcome {
        let Some(params) = params else {
            return SuspicionOutcome::InsufficientData;
        };
        let deviation = params.deviation.max(0.0);
        let cfg = &self.config;
        SuspicionOutcome::Levels(SuspicionLevels {
            faint: cfg.faint.clamp(params.mean + cfg.faint_coefficient * deviation),
            strong: cfg.strong.clamp(params.mean + cfg.strong_coefficient * deviation),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SuspicionOutcome {
    Levels(SuspicionLevels),
    InsufficientData,
}

impl SuspicionOutcome {
    pub fn levels(&self) -> Option<SuspicionLevels> {
        match self {
            SuspicionOutcome::Levels(levels) => Some(*levels),
            SuspicionOutcome::InsufficientData => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuspicionLevels {
    pub faint: f64,
    pub strong: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspicionLevel {
    None,
    Faint,
    Strong,
}

impl SuspicionLevels {
    pub fn classify(&self, weight: f64) -> SuspicionLevel {
        if weight >= self.strong {
            SuspicionLevel::Strong
        } else if weight >= self.faint {
            SuspicionLevel::Faint
        } else {
            SuspicionLevel::None
        }
    }
}
