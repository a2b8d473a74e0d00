//! Notification store: creation and read-state bookkeeping.
//!
//! All notification writes go through this type. Read state only ever moves
//! from unread to read.

use metrics::counter;
use shared::pagination::{clamp_limit, KeysetCursor};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{FeedPage, NewNotification, Notification, NotificationDraft, Viewer};
use crate::repositories::NotificationRepository;

pub const DEFAULT_FEED_LIMIT: i64 = 50;
pub const MAX_FEED_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct NotificationStore {
    repo: Arc<dyn NotificationRepository>,
    default_limit: i64,
    max_limit: i64,
}

impl NotificationStore {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self {
            repo,
            default_limit: DEFAULT_FEED_LIMIT,
            max_limit: MAX_FEED_LIMIT,
        }
    }

    pub fn with_limits(mut self, default_limit: i64, max_limit: i64) -> Self {
        self.default_limit = default_limit;
        self.max_limit = max_limit;
        self
    }

    /// Persist a draft unconditionally.
    pub async fn create(&self, draft: NotificationDraft) -> Result<Notification, DomainError> {
        let origin = draft.origin;
        let created = self
            .repo
            .insert(NewNotification {
                draft,
                dedup_key: None,
            })
            .await?
            .ok_or_else(|| DomainError::persistence("notification insert returned no row"))?;

        counter!("notifications_created_total", "origin" => origin.to_string()).increment(1);
        info!(notification_id = %created.id, %origin, "Notification created");
        Ok(created)
    }

    /// Persist a draft unless a notification with `dedup_key` already exists.
    pub async fn create_deduplicated(
        &self,
        draft: NotificationDraft,
        dedup_key: String,
    ) -> Result<Option<Notification>, DomainError> {
        let origin = draft.origin;
        let created = self
            .repo
            .insert(NewNotification {
                draft,
                dedup_key: Some(dedup_key.clone()),
            })
            .await?;

        match &created {
            Some(notification) => {
                counter!("notifications_created_total", "origin" => origin.to_string())
                    .increment(1);
                info!(notification_id = %notification.id, %origin, "Notification created");
            }
            None => debug!(%dedup_key, "Duplicate notification suppressed"),
        }
        Ok(created)
    }

    /// One page of the viewer's feed, newest first.
    pub async fn list_for(
        &self,
        viewer: Viewer,
        limit: Option<i64>,
        cursor: Option<&str>,
    ) -> Result<FeedPage, DomainError> {
        let limit = clamp_limit(limit, self.default_limit, self.max_limit);
        let cursor = cursor
            .map(KeysetCursor::decode)
            .transpose()
            .map_err(|e| DomainError::Validation(e.to_string()))?;

        // One extra row tells us whether another page exists.
        let mut notifications = self.repo.list(viewer.scope(), cursor, limit + 1).await?;

        let next_cursor = if notifications.len() as i64 > limit {
            notifications.truncate(limit as usize);
            notifications
                .last()
                .map(|last| KeysetCursor::new(last.created_at, last.id).encode())
        } else {
            None
        };

        Ok(FeedPage {
            notifications,
            next_cursor,
        })
    }

    pub async fn count_unread(&self, viewer: Viewer) -> Result<i64, DomainError> {
        self.repo.count_unread(viewer.scope()).await
    }

    /// Mark one notification read. Already-read notifications succeed
    /// silently; ids the viewer cannot see are `NotFound`.
    pub async fn mark_read(&self, viewer: Viewer, id: Uuid) -> Result<(), DomainError> {
        if self.repo.mark_read(viewer.scope(), id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound(format!("Notification {} not found", id)))
        }
    }

    /// Mark everything the viewer can see as read; returns rows changed.
    pub async fn mark_all_read(&self, viewer: Viewer) -> Result<u64, DomainError> {
        let changed = self.repo.mark_all_read(viewer.scope()).await?;
        debug!(changed, "Marked notifications read");
        Ok(changed)
    }
}
