//! Administrative system status.
//!
//! This is a degraded-tolerant read path: any storage failure yields a
//! fallback body with zeroed metrics and `success: false` instead of an
//! error response.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use domain::services::HealthSignal;
use domain::DomainError;
use serde::Serialize;
use tracing::warn;

use crate::app::AppState;
use crate::extractors::AdminUser;
use crate::jobs::SchedulerSnapshot;

/// More transactions than this in the last hour is reported as a high trend.
const HIGH_TRANSACTION_TREND: i64 = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatusResponse {
    pub success: bool,
    pub system: SystemSection,
    pub database: DatabaseSection,
    pub metrics: MetricsSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSection {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSection {
    pub status: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSection {
    pub users: UserMetrics,
    pub transactions: TransactionMetrics,
    pub accounts: AccountMetrics,
}

#[derive(Debug, Default, Serialize)]
pub struct UserMetrics {
    pub total: i64,
    pub recent: i64,
    pub growth: String,
}

#[derive(Debug, Default, Serialize)]
pub struct TransactionMetrics {
    pub total: i64,
    pub recent: i64,
    pub trend: String,
}

#[derive(Debug, Default, Serialize)]
pub struct AccountMetrics {
    pub total: i64,
}

impl SystemStatusResponse {
    fn fallback(error: String) -> Self {
        Self {
            success: false,
            system: SystemSection {
                status: "degraded".to_string(),
                timestamp: Utc::now(),
            },
            database: DatabaseSection {
                status: "degraded".to_string(),
                latency_ms: 0,
                message: None,
            },
            metrics: MetricsSection {
                users: UserMetrics {
                    growth: "unknown".to_string(),
                    ..Default::default()
                },
                transactions: TransactionMetrics {
                    trend: "unknown".to_string(),
                    ..Default::default()
                },
                accounts: AccountMetrics::default(),
            },
            scheduler: None,
            error: Some(error),
        }
    }
}

fn growth_label(recent_users: i64) -> &'static str {
    if recent_users > 0 {
        "positive"
    } else {
        "stable"
    }
}

fn trend_label(recent_transactions: i64) -> &'static str {
    if recent_transactions > HIGH_TRANSACTION_TREND {
        "high"
    } else {
        "normal"
    }
}

async fn database_latency(state: &AppState) -> Result<std::time::Duration, DomainError> {
    match &state.pool {
        Some(pool) => persistence::db::ping(pool).await.map_err(DomainError::from),
        None => Ok(std::time::Duration::ZERO),
    }
}

async fn collect(state: &AppState) -> Result<SystemStatusResponse, DomainError> {
    let latency = database_latency(state).await?;
    let signal = state.health.check().await;

    let now = Utc::now();
    let last_hour = now - ChronoDuration::hours(1);
    let totals = state.stats.totals().await?;
    let recent_users = state.stats.users_created_since(last_hour).await?.len() as i64;
    let recent_transactions = state.stats.transactions_created_since(last_hour).await?;

    let message = match &signal {
        HealthSignal::Healthy => None,
        HealthSignal::Degraded { message } | HealthSignal::Critical { message } => {
            Some(message.clone())
        }
    };

    Ok(SystemStatusResponse {
        success: true,
        system: SystemSection {
            status: signal.label().to_string(),
            timestamp: now,
        },
        database: DatabaseSection {
            status: signal.label().to_string(),
            latency_ms: latency.as_millis() as u64,
            message,
        },
        metrics: MetricsSection {
            users: UserMetrics {
                total: totals.users,
                recent: recent_users,
                growth: growth_label(recent_users).to_string(),
            },
            transactions: TransactionMetrics {
                total: totals.transactions,
                recent: recent_transactions,
                trend: trend_label(recent_transactions).to_string(),
            },
            accounts: AccountMetrics {
                total: totals.accounts,
            },
        },
        scheduler: Some(state.scheduler.snapshot()),
        error: None,
    })
}

/// GET /api/v1/admin/system-status
pub async fn get_system_status(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> impl IntoResponse {
    match collect(&state).await {
        Ok(status) => (StatusCode::OK, Json(status)),
        Err(err) => {
            warn!(error = %err, "System status degraded");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(SystemStatusResponse::fallback(err.to_string())),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_and_trend_labels() {
        assert_eq!(growth_label(0), "stable");
        assert_eq!(growth_label(3), "positive");
        assert_eq!(trend_label(10), "normal");
        assert_eq!(trend_label(11), "high");
    }

    #[test]
    fn test_fallback_body() {
        let json = serde_json::to_value(SystemStatusResponse::fallback("down".into())).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["system"]["status"], "degraded");
        assert_eq!(json["database"]["latencyMs"], 0);
        assert_eq!(json["metrics"]["users"]["total"], 0);
        assert_eq!(json["metrics"]["users"]["growth"], "unknown");
        assert_eq!(json["metrics"]["transactions"]["trend"], "unknown");
        assert_eq!(json["error"], "down");
    }
}
