//! Engine configuration.

use crate::telemetry::AnomalyThresholds;
use serde::Deserialize;
use std::time::Duration;

fn default_handler_timeout_ms() -> u64 {
    300_000
}

fn default_branch_risk_threshold() -> f64 {
    75.0
}

fn default_anomaly_window() -> usize {
    50
}

fn default_anomaly_min_samples() -> usize {
    10
}

fn default_anomaly_error_rate() -> f64 {
    0.15
}

/// Tunables of the event processor and its handlers.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on one handler invocation, in milliseconds. Zero disables it.
    /// Delay actions are not subject to it.
    #[serde(default = "default_handler_timeout_ms")]
    pub handler_timeout_ms: u64,
    /// Risk threshold used by branch nodes that do not set their own.
    #[serde(default = "default_branch_risk_threshold")]
    pub branch_risk_threshold: f64,
    #[serde(default = "default_anomaly_window")]
    pub anomaly_window: usize,
    #[serde(default = "default_anomaly_min_samples")]
    pub anomaly_min_samples: usize,
    #[serde(default = "default_anomaly_error_rate")]
    pub anomaly_error_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            handler_timeout_ms: default_handler_timeout_ms(),
            branch_risk_threshold: default_branch_risk_threshold(),
            anomaly_window: default_anomaly_window(),
            anomaly_min_samples: default_anomaly_min_samples(),
            anomaly_error_rate: default_anomaly_error_rate(),
        }
    }
}

impl EngineConfig {
    /// Returns the handler timeout, or `None` when disabled.
    #[must_use]
    pub fn handler_timeout(&self) -> Option<Duration> {
        (self.handler_timeout_ms > 0).then(|| Duration::from_millis(self.handler_timeout_ms))
    }

    /// Returns the anomaly monitor thresholds.
    #[must_use]
    pub fn anomaly_thresholds(&self) -> AnomalyThresholds {
        AnomalyThresholds {
            window: self.anomaly_window,
            min_samples: self.anomaly_min_samples,
            error_rate: self.anomaly_error_rate,
            ..AnomalyThresholds::default()
        }
    }
}
