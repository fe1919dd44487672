pub mod access;
pub mod admin;
pub mod analytics;
pub mod calendar;
pub mod clock;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod habits;
pub mod memory;
pub mod partners;
pub mod ports;
pub mod recurrence;
pub mod streak;
pub mod tasks;
pub mod work_session;

#[cfg(test)]
mod test_support;

pub use calendar::Calendar;
pub use domain::{
    Category, Comment, FocusInterval, Habit, Identity, NewTask, NewUser, Notification,
    PartnerRequest, PlatformCounts, Recurrence, RecurrenceKind, Subtask, Task, User,
    UserCredentials, WorkSession,
};
pub use error::{CoreError, CoreResult};
pub use ports::{
    CategoryClassifier, Clock, DatabaseService, NotificationService, PortError, PortResult,
};
