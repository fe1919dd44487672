//! crates/duotrack_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

//=========================================================================================
// Users & Identity
//=========================================================================================

/// Represents a user - used throughout the app.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub partner_id: Option<Uuid>,
    pub streak: u32,
    pub highest_streak: u32,
    pub last_streak_date: Option<DateTime<Utc>>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// Input for registering a new account. The email is expected lower-cased.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
}

/// The verified identity claim the auth layer hands to every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub is_admin: bool,
}

/// The streak fields of a user, written together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub streak: u32,
    pub highest_streak: u32,
    pub last_streak_date: DateTime<Utc>,
}

/// A pending request from one user to become another user's partner.
#[derive(Debug, Clone, PartialEq)]
pub struct PartnerRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Tasks
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Work,
    Personal,
    Workout,
    Study,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Work,
        Category::Personal,
        Category::Workout,
        Category::Study,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Workout => "Workout",
            Category::Study => "Study",
            Category::Other => "Other",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceKind {
    Daily,
    Weekly,
    Custom,
}

impl RecurrenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Custom => "custom",
        }
    }
}

/// A rule used to materialize several task instances from one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub kind: RecurrenceKind,
    /// Weekday indices, 0 = Sunday .. 6 = Saturday. Only used by `Custom`.
    pub days_of_week: Vec<u8>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub sender_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    pub id: Uuid,
    pub content: String,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub date: DateTime<Utc>,
    pub category: Category,
    pub is_completed: bool,
    pub position: Option<i32>,
    pub comments: Vec<Comment>,
    pub subtasks: Vec<Subtask>,
    pub is_recurring: bool,
    pub recurrence: Option<Recurrence>,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub user_id: Uuid,
    pub content: String,
    pub date: DateTime<Utc>,
    pub category: Category,
    pub is_recurring: bool,
    pub recurrence: Option<Recurrence>,
    pub is_shared: bool,
}

/// Ordering applied to a task query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrder {
    /// Explicit position ascending (unpositioned last), then newest first.
    PositionThenNewest,
    /// Scheduled date ascending, then position ascending.
    DateThenPosition,
    /// Newest first.
    Newest,
}

/// Row counts across the whole platform, for administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformCounts {
    pub users: u64,
    pub users_with_partners: u64,
    pub tasks: u64,
    pub habits: u64,
    pub work_sessions: u64,
}

/// A date-range query over tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskQuery {
    pub owners: Vec<Uuid>,
    /// `Some(flag)` restricts on the shared flag, `None` matches both.
    pub shared: Option<bool>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub order: TaskOrder,
}

//=========================================================================================
// Work Sessions
//=========================================================================================

/// A closed stretch of focus time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: i64,
}

/// The focus-time ledger of one user for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day: NaiveDate,
    /// Closed time only; the live addend since `last_start_time` is not included.
    pub total_seconds: i64,
    /// Set iff the timer is running.
    pub last_start_time: Option<DateTime<Utc>>,
    pub intervals: Vec<FocusInterval>,
}

impl WorkSession {
    pub fn new(user_id: Uuid, day: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            day,
            total_seconds: 0,
            last_start_time: None,
            intervals: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.last_start_time.is_some()
    }
}

//=========================================================================================
// Habits
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// Kept sorted ascending and free of duplicates.
    pub completed_dates: Vec<NaiveDate>,
    pub streak: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Notifications
//=========================================================================================

/// An outgoing message to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient_email: String,
    pub subject: String,
    pub html_body: String,
}
