//! Externally supplied health signal consumed by the evaluator.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthSignal {
    Healthy,
    Degraded { message: String },
    Critical { message: String },
}

impl HealthSignal {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthSignal::Healthy)
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthSignal::Healthy => "operational",
            HealthSignal::Degraded { .. } => "degraded",
            HealthSignal::Critical { .. } => "critical",
        }
    }
}

/// Source of the current health signal.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self) -> HealthSignal;
}

/// Probe returning a settable fixed signal.
#[derive(Debug)]
pub struct StaticHealthProbe {
    signal: Mutex<HealthSignal>,
}

impl StaticHealthProbe {
    pub fn new(signal: HealthSignal) -> Self {
        Self {
            signal: Mutex::new(signal),
        }
    }

    pub fn healthy() -> Self {
        Self::new(HealthSignal::Healthy)
    }

    pub fn set(&self, signal: HealthSignal) {
        if let Ok(mut current) = self.signal.lock() {
            *current = signal;
        }
    }
}

#[async_trait]
impl HealthProbe for StaticHealthProbe {
    async fn check(&self) -> HealthSignal {
        self.signal
            .lock()
            .map(|signal| signal.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_probe_set() {
        let probe = StaticHealthProbe::healthy();
        assert!(probe.check().await.is_healthy());

        probe.set(HealthSignal::Critical {
            message: "down".into(),
        });
        assert_eq!(probe.check().await.label(), "critical");
    }

    #[test]
    fn test_signal_serialization() {
        let json = serde_json::to_value(HealthSignal::Degraded {
            message: "slow".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["message"], "slow");
    }
}
