//! De-duplication of evaluator drafts.
//!
//! Every draft persisted by the poll job carries an idempotency key. The
//! store refuses a second notification with the same key, so repeated ticks
//! over unchanged state create nothing new.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{DraftOrigin, NotificationDraft};

/// How long a key stays unique for a given rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupWindow {
    /// Once ever per related entity.
    Event,
    /// Half-hour slots starting at :00 and :30.
    #[serde(rename = "half_hour")]
    HalfHour,
    Hour,
    Day,
}

impl FromStr for DedupWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "event" => Ok(DedupWindow::Event),
            "half_hour" => Ok(DedupWindow::HalfHour),
            "hour" => Ok(DedupWindow::Hour),
            "day" => Ok(DedupWindow::Day),
            _ => Err(format!("Unknown dedup window: {}", s)),
        }
    }
}

impl DedupWindow {
    fn bucket(&self, at: DateTime<Utc>) -> String {
        match self {
            DedupWindow::Event => "once".to_string(),
            DedupWindow::HalfHour => format!(
                "{}:{}",
                at.format("%Y-%m-%dT%H"),
                if at.minute() < 30 { "00" } else { "30" }
            ),
            DedupWindow::Hour => at.format("%Y-%m-%dT%H").to_string(),
            DedupWindow::Day => at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Window assigned to each evaluator rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupPolicy {
    pub new_user: DedupWindow,
    pub user_growth: DedupWindow,
    pub health: DedupWindow,
    pub metrics: DedupWindow,
    pub maintenance: DedupWindow,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            new_user: DedupWindow::Event,
            user_growth: DedupWindow::HalfHour,
            health: DedupWindow::Hour,
            metrics: DedupWindow::Hour,
            maintenance: DedupWindow::Day,
        }
    }
}

impl DedupPolicy {
    /// Window for a rule; `None` for explicit notifications, which are never
    /// de-duplicated.
    pub fn window_for(&self, origin: DraftOrigin) -> Option<DedupWindow> {
        match origin {
            DraftOrigin::NewUser => Some(self.new_user),
            DraftOrigin::UserGrowth => Some(self.user_growth),
            DraftOrigin::Health => Some(self.health),
            DraftOrigin::Metrics => Some(self.metrics),
            DraftOrigin::Maintenance => Some(self.maintenance),
            DraftOrigin::Manual => None,
        }
    }

    /// `<rule>:<type>:<relatedId|system>:<bucket>`
    pub fn key_for(&self, draft: &NotificationDraft, at: DateTime<Utc>) -> Option<String> {
        let window = self.window_for(draft.origin)?;
        let subject = draft.related_id.as_deref().unwrap_or("system");
        Some(format!(
            "{}:{}:{}:{}",
            draft.origin,
            draft.notification_type,
            subject,
            window.bucket(at)
        ))
    }
}
