//! Database-backed health probe.

use async_trait::async_trait;
use domain::services::{HealthProbe, HealthSignal};
use sqlx::PgPool;
use std::time::Duration;
use tracing::warn;

use crate::db;
use crate::metrics::record_pool_metrics;

/// Reports `Degraded` when a ping is slower than the threshold and
/// `Critical` when the database cannot be reached.
#[derive(Clone)]
pub struct DatabaseHealthProbe {
    pool: PgPool,
    latency_warn: Duration,
}

impl DatabaseHealthProbe {
    pub fn new(pool: PgPool, latency_warn: Duration) -> Self {
        Self { pool, latency_warn }
    }
}

#[async_trait]
impl HealthProbe for DatabaseHealthProbe {
    async fn check(&self) -> HealthSignal {
        record_pool_metrics(&self.pool);
        match db::ping(&self.pool).await {
            Ok(latency) => classify_latency(latency, self.latency_warn),
            Err(err) => {
                warn!(error = %err, "Database health check failed");
                HealthSignal::Critical {
                    message: format!("Database unreachable: {}", err),
                }
            }
        }
    }
}

fn classify_latency(latency: Duration, threshold: Duration) -> HealthSignal {
    if latency > threshold {
        HealthSignal::Degraded {
            message: format!(
                "Database responding slowly ({}ms, threshold {}ms)",
                latency.as_millis(),
                threshold.as_millis()
            ),
        }
    } else {
        HealthSignal::Healthy
    }
}
