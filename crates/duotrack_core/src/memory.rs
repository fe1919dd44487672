//! crates/duotrack_core/src/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. The server
//! falls back to it when no database is configured, and every core test runs
//! against it.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    Category, Habit, NewTask, NewUser, PartnerRequest, PlatformCounts, StreakUpdate, Task,
    TaskOrder, TaskQuery, User, UserCredentials, WorkSession,
};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    passwords: HashMap<Uuid, String>,
    auth_sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    partner_requests: HashMap<Uuid, PartnerRequest>,
    tasks: HashMap<Uuid, Task>,
    sessions: HashMap<Uuid, WorkSession>,
    habits: HashMap<Uuid, Habit>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn materialize(task: NewTask, now: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: task.user_id,
            content: task.content,
            date: task.date,
            category: task.category,
            is_completed: false,
            position: None,
            comments: Vec::new(),
            subtasks: Vec::new(),
            is_recurring: task.is_recurring,
            recurrence: task.recurrence,
            is_shared: task.is_shared,
            created_at: now,
            updated_at: now,
        }
    }
}

fn compare_position(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub(crate) fn sort_tasks(tasks: &mut [Task], order: TaskOrder) {
    match order {
        TaskOrder::PositionThenNewest => tasks.sort_by(|a, b| {
            compare_position(a.position, b.position).then(b.created_at.cmp(&a.created_at))
        }),
        TaskOrder::DateThenPosition => tasks.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(compare_position(a.position, b.position))
        }),
        TaskOrder::Newest => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

#[async_trait]
impl DatabaseService for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut inner = self.lock();
        if inner.users.values().any(|u| u.email == new_user.email) {
            return Err(PortError::Conflict(format!(
                "User with email {} already exists",
                new_user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            partner_id: None,
            streak: 0,
            highest_streak: 0,
            last_streak_date: None,
            is_admin: false,
            created_at: Utc::now(),
        };
        inner.passwords.insert(user.id, new_user.hashed_password);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.lock()
            .users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let inner = self.lock();
        let user = inner
            .users
            .values()
            .find(|u| u.email == email)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))?;
        let hashed_password = inner.passwords.get(&user.id).cloned().unwrap_or_default();
        Ok(UserCredentials {
            user_id: user.id,
            email: user.email.clone(),
            hashed_password,
        })
    }

    async fn update_streak(&self, user_id: Uuid, update: StreakUpdate) -> PortResult<()> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        user.streak = update.streak;
        user.highest_streak = update.highest_streak;
        user.last_streak_date = Some(update.last_streak_date);
        Ok(())
    }

    async fn set_partner(&self, user_id: Uuid, partner_id: Option<Uuid>) -> PortResult<()> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        user.partner_id = partner_id;
        Ok(())
    }

    async fn set_admin(&self, user_id: Uuid, is_admin: bool) -> PortResult<()> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        user.is_admin = is_admin;
        Ok(())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let mut users: Vec<User> = self.lock().users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn platform_counts(&self) -> PortResult<PlatformCounts> {
        let inner = self.lock();
        Ok(PlatformCounts {
            users: inner.users.len() as u64,
            users_with_partners: inner.users.values().filter(|u| u.partner_id.is_some()).count()
                as u64,
            tasks: inner.tasks.len() as u64,
            habits: inner.habits.len() as u64,
            work_sessions: inner.sessions.len() as u64,
        })
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.lock()
            .auth_sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> PortResult<Uuid> {
        match self.lock().auth_sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > now => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.lock().auth_sessions.remove(session_id);
        Ok(())
    }

    async fn create_partner_request(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> PortResult<PartnerRequest> {
        let request = PartnerRequest {
            id: Uuid::new_v4(),
            requester_id,
            recipient_id,
            created_at: Utc::now(),
        };
        self.lock()
            .partner_requests
            .insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_partner_request(&self, request_id: Uuid) -> PortResult<PartnerRequest> {
        self.lock()
            .partner_requests
            .get(&request_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Request not found".to_string()))
    }

    async fn find_pending_request(
        &self,
        requester_id: Uuid,
        recipient_id: Uuid,
    ) -> PortResult<Option<PartnerRequest>> {
        Ok(self
            .lock()
            .partner_requests
            .values()
            .find(|r| r.requester_id == requester_id && r.recipient_id == recipient_id)
            .cloned())
    }

    async fn list_requests_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> PortResult<Vec<PartnerRequest>> {
        let mut requests: Vec<PartnerRequest> = self
            .lock()
            .partner_requests
            .values()
            .filter(|r| r.recipient_id == recipient_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn delete_partner_request(&self, request_id: Uuid) -> PortResult<()> {
        self.lock().partner_requests.remove(&request_id);
        Ok(())
    }

    async fn delete_requests_involving(&self, user_ids: &[Uuid]) -> PortResult<()> {
        self.lock().partner_requests.retain(|_, r| {
            !user_ids.contains(&r.requester_id) && !user_ids.contains(&r.recipient_id)
        });
        Ok(())
    }

    async fn insert_task(&self, task: NewTask) -> PortResult<Task> {
        let task = Self::materialize(task, Utc::now());
        self.lock().tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> PortResult<Vec<Task>> {
        let now = Utc::now();
        let created: Vec<Task> = tasks
            .into_iter()
            .map(|t| Self::materialize(t, now))
            .collect();
        let mut inner = self.lock();
        for task in &created {
            inner.tasks.insert(task.id, task.clone());
        }
        Ok(created)
    }

    async fn get_task(&self, task_id: Uuid) -> PortResult<Task> {
        self.lock()
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Task not found".to_string()))
    }

    async fn save_task(&self, task: &Task) -> PortResult<()> {
        let mut inner = self.lock();
        match inner.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                stored.updated_at = Utc::now();
                Ok(())
            }
            None => Err(PortError::NotFound("Task not found".to_string())),
        }
    }

    async fn delete_task(&self, task_id: Uuid) -> PortResult<()> {
        self.lock()
            .tasks
            .remove(&task_id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound("Task not found".to_string()))
    }

    async fn find_tasks(&self, query: &TaskQuery) -> PortResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .lock()
            .tasks
            .values()
            .filter(|t| query.owners.contains(&t.user_id))
            .filter(|t| query.shared.map_or(true, |shared| t.is_shared == shared))
            .filter(|t| t.date >= query.from && t.date <= query.to)
            .cloned()
            .collect();
        sort_tasks(&mut tasks, query.order);
        Ok(tasks)
    }

    async fn count_tasks_by_category(&self, user_id: Uuid) -> PortResult<Vec<(Category, u64)>> {
        let mut counts: HashMap<Category, u64> = HashMap::new();
        for task in self.lock().tasks.values().filter(|t| t.user_id == user_id) {
            *counts.entry(task.category).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn delete_future_recurring(
        &self,
        user_id: Uuid,
        content: &str,
        after: DateTime<Utc>,
    ) -> PortResult<u64> {
        let mut inner = self.lock();
        let before = inner.tasks.len();
        inner.tasks.retain(|_, t| {
            !(t.user_id == user_id && t.content == content && t.is_recurring && t.date > after)
        });
        Ok((before - inner.tasks.len()) as u64)
    }

    async fn find_running_session(&self, user_id: Uuid) -> PortResult<Option<WorkSession>> {
        let inner = self.lock();
        let mut running: Vec<&WorkSession> = inner
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.is_running())
            .collect();
        running.sort_by_key(|s| s.day);
        Ok(running.first().map(|s| (*s).clone()))
    }

    async fn find_session(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> PortResult<Option<WorkSession>> {
        Ok(self
            .lock()
            .sessions
            .values()
            .find(|s| s.user_id == user_id && s.day == day)
            .cloned())
    }

    async fn get_or_create_session(
        &self,
        user_id: Uuid,
        day: NaiveDate,
    ) -> PortResult<WorkSession> {
        let mut inner = self.lock();
        if let Some(existing) = inner
            .sessions
            .values()
            .find(|s| s.user_id == user_id && s.day == day)
        {
            return Ok(existing.clone());
        }
        let session = WorkSession::new(user_id, day);
        inner.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn save_session(&self, session: &WorkSession) -> PortResult<()> {
        self.lock().sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_sessions(
        &self,
        user_ids: &[Uuid],
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<WorkSession>> {
        let mut sessions: Vec<WorkSession> = self
            .lock()
            .sessions
            .values()
            .filter(|s| user_ids.contains(&s.user_id) && s.day >= from && s.day <= to)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.day);
        Ok(sessions)
    }

    async fn create_habit(&self, user_id: Uuid, name: &str) -> PortResult<Habit> {
        let habit = Habit {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            completed_dates: Vec::new(),
            streak: 0,
            is_active: true,
            created_at: Utc::now(),
        };
        self.lock().habits.insert(habit.id, habit.clone());
        Ok(habit)
    }

    async fn list_active_habits(&self, user_id: Uuid) -> PortResult<Vec<Habit>> {
        let mut habits: Vec<Habit> = self
            .lock()
            .habits
            .values()
            .filter(|h| h.user_id == user_id && h.is_active)
            .cloned()
            .collect();
        habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(habits)
    }

    async fn get_habit(&self, habit_id: Uuid) -> PortResult<Habit> {
        self.lock()
            .habits
            .get(&habit_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Habit not found".to_string()))
    }

    async fn save_habit(&self, habit: &Habit) -> PortResult<()> {
        self.lock().habits.insert(habit.id, habit.clone());
        Ok(())
    }

    async fn delete_habit(&self, habit_id: Uuid) -> PortResult<()> {
        self.lock().habits.remove(&habit_id);
        Ok(())
    }
}
