//! Storage metrics: query latency, pool gauges and deduplicated inserts.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Pool gauges, refreshed by every database health probe.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_total").set(size as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
}

/// Counts inserts that hit an existing dedup key and were dropped.
pub fn record_dedup_suppressed() {
    counter!("notifications_suppressed_total").increment(1);
}

/// Measures one repository call.
///
/// ```ignore
/// let timer = QueryTimer::new("list_notifications");
/// let rows = sqlx::query_as::<_, NotificationEntity>(...).fetch_all(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    operation: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        histogram!(
            "database_query_duration_seconds",
            "operation" => self.operation
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // With no recorder installed every macro is a no-op.
    #[test]
    fn test_metrics_without_recorder() {
        let timer = QueryTimer::new("count_unread_notifications");
        assert_eq!(timer.operation, "count_unread_notifications");
        timer.record();
        record_dedup_suppressed();
    }
}
