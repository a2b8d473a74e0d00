//! Background job scheduler and job implementations.

mod notification_poll;
mod scheduler;

pub use notification_poll::NotificationPollJob;
pub use scheduler::{CycleOutcome, Job, PollScheduler, SchedulerSnapshot};
