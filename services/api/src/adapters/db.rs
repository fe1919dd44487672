//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Nested task data (comments, subtasks, recurrence) and the focus intervals of a
//! work session are stored as JSONB and mapped through the record structs below.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use duotrack_core::domain::{
    Category, Comment, FocusInterval, Habit, NewTask, NewUser, PartnerRequest, PlatformCounts,
    Recurrence, RecurrenceKind, StreakUpdate, Subtask, Task, TaskOrder, TaskQuery, User, UserCredentials,
    WorkSession,
};
use duotrack_core::ports::{DatabaseService, PortError, PortResult};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found(what: &'static str) -> impl Fn(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what)),
        other => unexpected(other),
    }
}

fn count(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn column(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn total(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, name, email, partner_id, streak, highest_streak, \
                            last_streak_date, is_admin, created_at";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    partner_id: Option<Uuid>,
    streak: i32,
    highest_streak: i32,
    last_streak_date: Option<DateTime<Utc>>,
    is_admin: bool,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            partner_id: self.partner_id,
            streak: count(self.streak),
            highest_streak: count(self.highest_streak),
            last_streak_date: self.last_streak_date,
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct PartnerRequestRecord {
    id: Uuid,
    requester_id: Uuid,
    recipient_id: Uuid,
    created_at: DateTime<Utc>,
}
impl PartnerRequestRecord {
    fn to_domain(self) -> PartnerRequest {
        PartnerRequest {
            id: self.id,
            requester_id: self.requester_id,
            recipient_id: self.recipient_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CommentRecord {
    id: Uuid,
    text: String,
    sender_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct SubtaskRecord {
    id: Uuid,
    content: String,
    is_completed: bool,
}

#[derive(Serialize, Deserialize)]
struct RecurrenceRecord {
    kind: String,
    #[serde(default)]
    days_of_week: Vec<u8>,
    end_date: Option<DateTime<Utc>>,
}
impl RecurrenceRecord {
    fn from_domain(rule: &Recurrence) -> Self {
        Self {
            kind: rule.kind.as_str().to_string(),
            days_of_week: rule.days_of_week.clone(),
            end_date: rule.end_date,
        }
    }

    fn to_domain(self) -> Option<Recurrence> {
        let kind = match self.kind.as_str() {
            "daily" => RecurrenceKind::Daily,
            "weekly" => RecurrenceKind::Weekly,
            "custom" => RecurrenceKind::Custom,
            _ => return None,
        };
        Some(Recurrence {
            kind,
            days_of_week: self.days_of_week,
            end_date: self.end_date,
        })
    }
}

const TASK_COLUMNS: &str = "id, user_id, content, date, category, is_completed, position, \
                            comments, subtasks, is_recurring, recurrence, is_shared, \
                            created_at, updated_at";

#[derive(FromRow)]
struct TaskRecord {
    id: Uuid,
    user_id: Uuid,
    content: String,
    date: DateTime<Utc>,
    category: String,
    is_completed: bool,
    position: Option<i32>,
    comments: Json<Vec<CommentRecord>>,
    subtasks: Json<Vec<SubtaskRecord>>,
    is_recurring: bool,
    recurrence: Option<Json<RecurrenceRecord>>,
    is_shared: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl TaskRecord {
    fn to_domain(self) -> Task {
        Task {
            id: self.id,
            user_id: self.user_id,
            content: self.content,
            date: self.date,
            category: Category::parse(&self.category).unwrap_or_default(),
            is_completed: self.is_completed,
            position: self.position,
            comments: self
                .comments
                .0
                .into_iter()
                .map(|c| Comment {
                    id: c.id,
                    text: c.text,
                    sender_id: c.sender_id,
                    created_at: c.created_at,
                })
                .collect(),
            subtasks: self
                .subtasks
                .0
                .into_iter()
                .map(|s| Subtask {
                    id: s.id,
                    content: s.content,
                    is_completed: s.is_completed,
                })
                .collect(),
            is_recurring: self.is_recurring,
            recurrence: self.recurrence.and_then(|r| r.0.to_domain()),
            is_shared: self.is_shared,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn comment_records(comments: &[Comment]) -> Json<Vec<CommentRecord>> {
    Json(
        comments
            .iter()
            .map(|c| CommentRecord {
                id: c.id,
                text: c.text.clone(),
                sender_id: c.sender_id,
                created_at: c.created_at,
            })
            .collect(),
    )
}

fn subtask_records(subtasks: &[Subtask]) -> Json<Vec<SubtaskRecord>> {
    Json(
        subtasks
            .iter()
            .map(|s| SubtaskRecord {
                id: s.id,
                content: s.content.clone(),
                is_completed: s.is_completed,
            })
            .collect(),
    )
}

#[derive(Serialize, Deserialize)]
struct IntervalRecord {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    duration_seconds: i64,
}

#[derive(FromRow)]
struct WorkSessionRecord {
    id: Uuid,
    user_id: Uuid,
    day: NaiveDate,
    total_seconds: i64,
    last_start_time: Option<DateTime<Utc>>,
    intervals: Json<Vec<IntervalRecord>>,
}
impl WorkSessionRecord {
    fn to_domain(self) -> WorkSession {
        WorkSession {
            id: self.id,
            user_id: self.user_id,
            day: self.day,
            total_seconds: self.total_seconds,
            last_start_time: self.last_start_time,
            intervals: self
                .intervals
                .0
                .into_iter()
                .map(|i| FocusInterval {
                    start: i.start,
                    end: i.end,
                    duration_seconds: i.duration_seconds,
                })
                .collect(),
        }
    }
}

#[derive(FromRow)]
struct HabitRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    completed_dates: Vec<NaiveDate>,
    streak: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}
impl HabitRecord {
    fn to_domain(self) -> Habit {
        let mut completed_dates = self.completed_dates;
        completed_dates.sort_unstable();
        completed_dates.dedup();
        Habit {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            completed_dates,
            streak: count(self.streak),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

fn order_clause(order: TaskOrder) -> &'static str {
    match order {
        TaskOrder::PositionThenNewest => "ORDER BY position ASC NULLS LAST, created_at DESC",
        TaskOrder::DateThenPosition => "ORDER BY date ASC, position ASC NULLS LAST",
        TaskOrder::Newest => "ORDER BY created_at DESC",
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- User Management ---

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, hashed_password) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            USER_COLUMNS
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.hashed_password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .map_or(false, |db_err| db_err.is_unique_violation());
                if duplicate {
                    PortError::Conflict(format!(
                        "User with email {} already exists",
                        new_user.email
                    ))
                } else {
                    unexpected(e)
                }
            })?;

        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found("User"))?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("User"))?;

        Ok(UserCredentials {
            user_id: record.id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn update_streak(&self, user_id: Uuid, update: StreakUpdate) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET streak = $2, highest_streak = $3, last_streak_date = $4 WHERE id = $1",
        )
        .bind(user_id)
        .bind(column(update.streak))
        .bind(column(update.highest_streak))
        .bind(update.last_streak_date)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn set_partner(&self, user_id: Uuid, partner_id: Option<Uuid>) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET partner_id = $2 WHERE id = $1")
            .bind(user_id)
            .bind(partner_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn set_admin(&self, user_id: Uuid, is_admin: bool) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET is_admin = $2 WHERE id = $1")
            .bind(user_id)
            .bind(is_admin)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at DESC", USER_COLUMNS);
        let records = sqlx::query_as::<_, UserRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn platform_counts(&self) -> PortResult<PlatformCounts> {
        let (users, users_with_partners, tasks, habits, work_sessions) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                "SELECT (SELECT COUNT(*) FROM users), \
                 (SELECT COUNT(*) FROM users WHERE partner_id IS NOT NULL), \
                 (SELECT COUNT(*) FROM tasks), \
                 (SELECT COUNT(*) FROM habits), \
                 (SELECT COUNT(*) FROM work_sessions)",
            )
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(PlatformCounts {
            users: total(users),
            users_with_partners: total(users_with_partners),
            tasks: total(tasks),
            habits: total(habits),
            work_sessions: total(work_sessions),
        })
    }

    // --- Auth Sessions ---

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > $2",
        )
        .bind(session_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Partner Requests ---

    async fn create_partner_request(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> PortResult<PartnerRequest> {
        let record = sqlx::query_as::<_, PartnerRequestRecord>(
            "INSERT INTO partner_requests (id, requester_id, recipient_id) VALUES ($1, $2, $3) \
             RETURNING id, requester_id, recipient_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(requester_id)
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn get_partner_request(&self, request_id: Uuid) -> PortResult<PartnerRequest> {
        let record = sqlx::query_as::<_, PartnerRequestRecord>(
            "SELECT id, requester_id, recipient_id, created_at FROM partner_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Request"))?;

        Ok(record.to_domain())
    }

    async fn find_pending_request(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> PortResult<Option<PartnerRequest>> {
        let record = sqlx::query_as::<_, PartnerRequestRecord>(
            "SELECT id, requester_id, recipient_id, created_at FROM partner_requests \
             WHERE requester_id = $1 AND recipient_id = $2 LIMIT 1",
        )
        .bind(requester_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(PartnerRequestRecord::to_domain))
    }

    async fn list_requests_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> PortResult<Vec<PartnerRequest>> {
        let records = sqlx::query_as::<_, PartnerRequestRecord>(
            "SELECT id, requester_id, recipient_id, created_at FROM partner_requests \
             WHERE recipient_id = $1 ORDER BY created_at DESC",
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(PartnerRequestRecord::to_domain).collect())
    }

    async fn delete_partner_request(&self, request_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM partner_requests WHERE id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn delete_requests_involving(&self, user_ids: &[Uuid]) -> PortResult<()> {
        sqlx::query(
            "DELETE FROM partner_requests WHERE requester_id = ANY($1) OR recipient_id = ANY($1)",
        )
        .bind(user_ids.to_vec())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    // --- Tasks ---

    async fn insert_task(&self, task: NewTask) -> PortResult<Task> {
        let mut created = self.insert_tasks(vec![task]).await?;
        created
            .pop()
            .ok_or_else(|| PortError::Unexpected("Task insert returned no row".to_string()))
    }

    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> PortResult<Vec<Task>> {
        let sql = format!(
            "INSERT INTO tasks (id, user_id, content, date, category, is_recurring, recurrence, is_shared) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            TASK_COLUMNS
        );

        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let mut created = Vec::with_capacity(tasks.len());
        for task in tasks {
            let record = sqlx::query_as::<_, TaskRecord>(&sql)
                .bind(Uuid::new_v4())
                .bind(task.user_id)
                .bind(&task.content)
                .bind(task.date)
                .bind(task.category.as_str())
                .bind(task.is_recurring)
                .bind(task.recurrence.as_ref().map(|r| Json(RecurrenceRecord::from_domain(r))))
                .bind(task.is_shared)
                .fetch_one(&mut *tx)
                .await
                .map_err(unexpected)?;
            created.push(record.to_domain());
        }
        tx.commit().await.map_err(unexpected)?;

        Ok(created)
    }

    async fn get_task(&self, task_id: Uuid) -> PortResult<Task> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let record = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(task_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found("Task"))?;

        Ok(record.to_domain())
    }

    async fn save_task(&self, task: &Task) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE tasks SET content = $2, date = $3, category = $4, is_completed = $5, \
             position = $6, comments = $7, subtasks = $8, is_recurring = $9, recurrence = $10, \
             is_shared = $11, updated_at = NOW() WHERE id = $1",
        )
        .bind(task.id)
        .bind(&task.content)
        .bind(task.date)
        .bind(task.category.as_str())
        .bind(task.is_completed)
        .bind(task.position)
        .bind(comment_records(&task.comments))
        .bind(subtask_records(&task.subtasks))
        .bind(task.is_recurring)
        .bind(task.recurrence.as_ref().map(|r| Json(RecurrenceRecord::from_domain(r))))
        .bind(task.is_shared)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("Task not found".to_string()));
        }
        Ok(())
    }

    async fn delete_task(&self, task_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("Task not found".to_string()));
        }
        Ok(())
    }

    async fn find_tasks(&self, query: &TaskQuery) -> PortResult<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE user_id = ANY($1) \
             AND ($2::BOOLEAN IS NULL OR is_shared = $2) \
             AND date >= $3 AND date <= $4 {}",
            TASK_COLUMNS,
            order_clause(query.order)
        );
        let records = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(query.owners.clone())
            .bind(query.shared)
            .bind(query.from)
            .bind(query.to)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        Ok(records.into_iter().map(TaskRecord::to_domain).collect())
    }

    async fn count_tasks_by_category(&self, user_id: Uuid) -> PortResult<Vec<(Category, u64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT category, COUNT(*) FROM tasks WHERE user_id = $1 GROUP BY category",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows
            .into_iter()
            .map(|(category, count)| (Category::parse(&category).unwrap_or_default(), total(count)))
            .collect())
    }

    async fn delete_future_recurring(
        &self,
        user_id: Uuid,
        content: &str,
        after: DateTime<Utc>,
    ) -> PortResult<u64> {
        let result = sqlx::query(
            "DELETE FROM tasks WHERE user_id = $1 AND content = $2 AND is_recurring AND date > $3",
        )
        .bind(user_id)
        .bind(content)
        .bind(after)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(result.rows_affected())
    }

    // --- Work Sessions ---

    async fn find_running_session(&self, user_id: Uuid) -> PortResult<Option<WorkSession>> {
        let record = sqlx::query_as::<_, WorkSessionRecord>(
            "SELECT id, user_id, day, total_seconds, last_start_time, intervals FROM work_sessions \
             WHERE user_id = $1 AND last_start_time IS NOT NULL ORDER BY day ASC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(WorkSessionRecord::to_domain))
    }

    async fn find_session(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> PortResult<Option<WorkSession>> {
        let record = sqlx::query_as::<_, WorkSessionRecord>(
            "SELECT id, user_id, day, total_seconds, last_start_time, intervals FROM work_sessions \
             WHERE user_id = $1 AND day = $2",
        )
        .bind(user_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(WorkSessionRecord::to_domain))
    }

    async fn get_or_create_session(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> PortResult<WorkSession> {
        // Concurrent first accesses race on the unique (user_id, day) key; the loser reads.
        sqlx::query(
            "INSERT INTO work_sessions (id, user_id, day) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, day) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(day)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        self.find_session(user_id, day)
            .await?
            .ok_or_else(|| PortError::NotFound("Session not found".to_string()))
    }

    async fn save_session(&self, session: &WorkSession) -> PortResult<()> {
        let intervals: Vec<IntervalRecord> = session
            .intervals
            .iter()
            .map(|i| IntervalRecord {
                start: i.start,
                end: i.end,
                duration_seconds: i.duration_seconds,
            })
            .collect();

        sqlx::query(
            "INSERT INTO work_sessions (id, user_id, day, total_seconds, last_start_time, intervals) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET total_seconds = EXCLUDED.total_seconds, \
             last_start_time = EXCLUDED.last_start_time, intervals = EXCLUDED.intervals",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.day)
        .bind(session.total_seconds)
        .bind(session.last_start_time)
        .bind(Json(intervals))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn find_sessions(
        &self,
        user_ids: &[Uuid],
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<WorkSession>> {
        let records = sqlx::query_as::<_, WorkSessionRecord>(
            "SELECT id, user_id, day, total_seconds, last_start_time, intervals FROM work_sessions \
             WHERE user_id = ANY($1) AND day BETWEEN $2 AND $3 ORDER BY day ASC",
        )
        .bind(user_ids.to_vec())
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(WorkSessionRecord::to_domain).collect())
    }

    // --- Habits ---

    async fn create_habit(&self, user_id: Uuid, name: &str) -> PortResult<Habit> {
        let record = sqlx::query_as::<_, HabitRecord>(
            "INSERT INTO habits (id, user_id, name) VALUES ($1, $2, $3) \
             RETURNING id, user_id, name, completed_dates, streak, is_active, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn list_active_habits(&self, user_id: Uuid) -> PortResult<Vec<Habit>> {
        let records = sqlx::query_as::<_, HabitRecord>(
            "SELECT id, user_id, name, completed_dates, streak, is_active, created_at FROM habits \
             WHERE user_id = $1 AND is_active ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(HabitRecord::to_domain).collect())
    }

    async fn get_habit(&self, habit_id: Uuid) -> PortResult<Habit> {
        let record = sqlx::query_as::<_, HabitRecord>(
            "SELECT id, user_id, name, completed_dates, streak, is_active, created_at FROM habits \
             WHERE id = $1",
        )
        .bind(habit_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Habit"))?;

        Ok(record.to_domain())
    }

    async fn save_habit(&self, habit: &Habit) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE habits SET name = $2, completed_dates = $3, streak = $4, is_active = $5 \
             WHERE id = $1",
        )
        .bind(habit.id)
        .bind(&habit.name)
        .bind(habit.completed_dates.clone())
        .bind(column(habit.streak))
        .bind(habit.is_active)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("Habit not found".to_string()));
        }
        Ok(())
    }

    async fn delete_habit(&self, habit_id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM habits WHERE id = $1")
            .bind(habit_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
