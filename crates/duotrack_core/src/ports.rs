//! crates/duotrack_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    Category, Habit, NewTask, NewUser, Notification, PartnerRequest, PlatformCounts,
    StreakUpdate, Task, TaskQuery, User, UserCredentials, WorkSession,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn update_streak(&self, user_id: Uuid, update: StreakUpdate) -> PortResult<()>;

    /// Writes one side of a partner link. Callers update both users.
    async fn set_partner(&self, user_id: Uuid, partner_id: Option<Uuid>) -> PortResult<()>;

    async fn set_admin(&self, user_id: Uuid, is_admin: bool) -> PortResult<()>;

    /// Every account, newest first.
    async fn list_users(&self) -> PortResult<Vec<User>>;

    async fn platform_counts(&self) -> PortResult<PlatformCounts>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves an unexpired auth session to its user.
    async fn validate_auth_session(&self, session_id: &str, now: DateTime<Utc>)
        -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Partner Requests ---
    async fn create_partner_request(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> PortResult<PartnerRequest>;

    async fn get_partner_request(&self, request_id: Uuid) -> PortResult<PartnerRequest>;

    async fn find_pending_request(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> PortResult<Option<PartnerRequest>>;

    async fn list_requests_for_recipient(&self, recipient_id: Uuid)
        -> PortResult<Vec<PartnerRequest>>;

    async fn delete_partner_request(&self, request_id: Uuid) -> PortResult<()>;

    /// Deletes every request where any of `user_ids` is requester or recipient.
    async fn delete_requests_involving(&self, user_ids: &[Uuid]) -> PortResult<()>;

    // --- Tasks ---
    async fn insert_task(&self, task: NewTask) -> PortResult<Task>;

    /// Inserts the whole batch or nothing.
    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> PortResult<Vec<Task>>;

    async fn get_task(&self, task_id: Uuid) -> PortResult<Task>;

    async fn save_task(&self, task: &Task) -> PortResult<()>;

    async fn delete_task(&self, task_id: Uuid) -> PortResult<()>;

    async fn find_tasks(&self, query: &TaskQuery) -> PortResult<Vec<Task>>;

    /// Number of tasks per category over all of a user's tasks.
    async fn count_tasks_by_category(&self, user_id: Uuid) -> PortResult<Vec<(Category, u64)>>;

    /// Deletes recurring instances of `content` owned by `user_id` scheduled after `after`.
    async fn delete_future_recurring(
        &self,
        user_id: Uuid,
        content: &str,
        after: DateTime<Utc>,
    ) -> PortResult<u64>;

    // --- Work Sessions ---
    async fn find_running_session(&self, user_id: Uuid) -> PortResult<Option<WorkSession>>;

    async fn find_session(&self, user_id: Uuid, day: NaiveDate)
        -> PortResult<Option<WorkSession>>;

    /// Returns the ledger for `(user_id, day)`, creating an empty one if none exists.
    async fn get_or_create_session(&self, user_id: Uuid, day: NaiveDate)
        -> PortResult<WorkSession>;

    async fn save_session(&self, session: &WorkSession) -> PortResult<()>;

    /// Ledgers of any of `user_ids` for days in `from..=to`.
    async fn find_sessions(
        &self,
        user_ids: &[Uuid],
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<WorkSession>>;

    // --- Habits ---
    async fn create_habit(&self, user_id: Uuid, name: &str) -> PortResult<Habit>;

    async fn list_active_habits(&self, user_id: Uuid) -> PortResult<Vec<Habit>>;

    async fn get_habit(&self, habit_id: Uuid) -> PortResult<Habit>;

    async fn save_habit(&self, habit: &Habit) -> PortResult<()>;

    async fn delete_habit(&self, habit_id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Delivers a notification. Callers treat failures as non-fatal.
    async fn send(&self, notification: Notification) -> PortResult<()>;
}

#[async_trait]
pub trait CategoryClassifier: Send + Sync {
    /// Suggests a category for a piece of free text.
    async fn classify(&self, text: &str) -> PortResult<Category>;
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
