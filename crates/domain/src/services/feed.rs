//! Feed formatting: display-ready notifications with relative time labels.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::{DisplayNotification, Notification};

/// Label used when a timestamp cannot be interpreted.
pub const FALLBACK_LABEL: &str = "Recently";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Render a notification for display at `now`.
pub fn format(notification: &Notification, now: DateTime<Utc>) -> DisplayNotification {
    DisplayNotification {
        id: notification.id,
        notification_type: notification.notification_type,
        title: notification.title.clone(),
        message: notification.message.clone(),
        priority: notification.priority,
        read: notification.read,
        created_at: notification
            .created_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        time: relative_time(notification.created_at, now),
    }
}

pub fn format_all(notifications: &[Notification], now: DateTime<Utc>) -> Vec<DisplayNotification> {
    notifications.iter().map(|n| format(n, now)).collect()
}

/// Human-relative label for the distance between `created_at` and `now`.
///
/// Timestamps in the future read as "Just now".
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(created_at).num_seconds();

    if seconds < MINUTE {
        "Just now".to_string()
    } else if seconds < HOUR {
        format!("{} minutes ago", seconds / MINUTE)
    } else if seconds < DAY {
        format!("{} hours ago", seconds / HOUR)
    } else {
        format!("{} days ago", seconds / DAY)
    }
}

/// Same as [`relative_time`] for an RFC 3339 string; never fails.
pub fn relative_time_from_str(raw: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(ts) => relative_time(ts.with_timezone(&Utc), now),
        Err(_) => FALLBACK_LABEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationPriority, NotificationType};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn ago(seconds: i64) -> String {
        relative_time(now() - Duration::seconds(seconds), now())
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(ago(0), "Just now");
        assert_eq!(ago(59), "Just now");
        assert_eq!(ago(60), "1 minutes ago");
        assert_eq!(ago(3599), "59 minutes ago");
        assert_eq!(ago(3600), "1 hours ago");
        assert_eq!(ago(86399), "23 hours ago");
        assert_eq!(ago(86400), "1 days ago");
        assert_eq!(ago(86400 * 400), "400 days ago");
    }

    #[test]
    fn test_future_timestamp_is_just_now() {
        assert_eq!(ago(-3600), "Just now");
        assert_eq!(ago(-86400 * 365 * 100), "Just now");
    }

    #[test]
    fn test_extreme_values_do_not_panic() {
        let far_past = DateTime::<Utc>::MIN_UTC;
        let far_future = DateTime::<Utc>::MAX_UTC;
        assert!(relative_time(far_past, now()).ends_with("days ago"));
        assert_eq!(relative_time(far_future, now()), "Just now");
        assert!(relative_time(far_past, far_future).ends_with("days ago"));
    }

    #[test]
    fn test_unparseable_input_yields_fallback() {
        for raw in ["", "yesterday", "2024-13-45T99:00:00Z", "\u{0}", "1710072000"] {
            assert_eq!(relative_time_from_str(raw, now()), FALLBACK_LABEL);
        }
        assert_eq!(
            relative_time_from_str("2024-03-10T11:30:00Z", now()),
            "30 minutes ago"
        );
    }

    #[test]
    fn test_format_copies_fields() {
        let notification = Notification {
            id: Uuid::new_v4(),
            notification_type: NotificationType::Warning,
            title: "Database Degraded".into(),
            message: "Slow queries".into(),
            priority: NotificationPriority::Medium,
            read: true,
            user_id: None,
            related_id: None,
            related_type: None,
            created_at: now() - Duration::hours(2),
        };

        let display = format(&notification, now());
        assert_eq!(display.id, notification.id);
        assert_eq!(display.notification_type, NotificationType::Warning);
        assert!(display.read);
        assert_eq!(display.created_at, "2024-03-10T10:00:00.000Z");
        assert_eq!(display.time, "2 hours ago");
    }
}
