//! crates/duotrack_core/src/streak.rs
//!
//! The user streak: consecutive calendar days on which every task scheduled
//! for the day was completed. Credit is anchored on `last_streak_date`, so
//! re-evaluating an already credited day changes nothing.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::calendar::Calendar;
use crate::domain::{StreakUpdate, TaskOrder, TaskQuery};
use crate::ports::{DatabaseService, PortError, PortResult};

/// What the engine decided for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakOutcome {
    /// Nothing was written.
    Unchanged(SkipReason),
    /// The streak was written with this value.
    Updated(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Backdated,
    NoTasks,
    Incomplete,
    AlreadyCredited,
    UnknownUser,
}

/// The pure accrual rule. Returns the new streak, or `None` when the day was
/// already credited.
pub fn next_streak(current: u32, last_credit: Option<NaiveDate>, task_day: NaiveDate) -> Option<u32> {
    let Some(last) = last_credit else {
        return Some(1);
    };
    match Calendar::days_between(last, task_day) {
        d if d <= 0 => None,
        1 => Some(current.saturating_add(1)),
        _ => Some(1),
    }
}

/// Re-evaluates the streak of `user_id` after a task dated `task_date` was completed.
pub async fn evaluate_streak(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    user_id: Uuid,
    task_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> PortResult<StreakOutcome> {
    let task_day = calendar.day_of(task_date);
    if task_day < calendar.day_of(now) {
        return Ok(StreakOutcome::Unchanged(SkipReason::Backdated));
    }

    let day_tasks = db
        .find_tasks(&TaskQuery {
            owners: vec![user_id],
            shared: None,
            from: calendar.start_of_day(task_day),
            to: calendar.end_of_day(task_day),
            order: TaskOrder::DateThenPosition,
        })
        .await?;
    if day_tasks.is_empty() {
        return Ok(StreakOutcome::Unchanged(SkipReason::NoTasks));
    }
    if day_tasks.iter().any(|t| !t.is_completed) {
        return Ok(StreakOutcome::Unchanged(SkipReason::Incomplete));
    }

    let user = match db.get_user(user_id).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            return Ok(StreakOutcome::Unchanged(SkipReason::UnknownUser))
        }
        Err(e) => return Err(e),
    };

    let last_credit = user.last_streak_date.map(|d| calendar.day_of(d));
    let Some(streak) = next_streak(user.streak, last_credit, task_day) else {
        return Ok(StreakOutcome::Unchanged(SkipReason::AlreadyCredited));
    };

    db.update_streak(
        user_id,
        StreakUpdate {
            streak,
            highest_streak: user.highest_streak.max(streak),
            last_streak_date: now,
        },
    )
    .await?;
    info!("Streak for user {} is now {}", user_id, streak);
    Ok(StreakOutcome::Updated(streak))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, NewTask};
    use crate::memory::MemoryStore;
    use crate::test_support::{at, register, ymd};
    use chrono::Duration;

    async fn add_task(db: &MemoryStore, user_id: Uuid, date: DateTime<Utc>, done: bool) {
        let mut task = db
            .insert_task(NewTask {
                user_id,
                content: "task".into(),
                date,
                category: Category::Work,
                is_recurring: false,
                recurrence: None,
                is_shared: false,
            })
            .await
            .unwrap();
        task.is_completed = done;
        db.save_task(&task).await.unwrap();
    }

    #[test]
    fn accrual_rule() {
        let today = ymd(2024, 5, 10);
        assert_eq!(next_streak(0, None, today), Some(1));
        assert_eq!(next_streak(4, Some(today), today), None);
        assert_eq!(next_streak(4, Some(ymd(2024, 5, 9)), today), Some(5));
        assert_eq!(next_streak(4, Some(ymd(2024, 5, 8)), today), Some(1));
        assert_eq!(next_streak(4, Some(ymd(2024, 5, 11)), today), None);
    }

    #[tokio::test]
    async fn first_full_day_starts_streak_at_one_and_is_idempotent() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;
        let now = at(2024, 5, 10, 18, 0);
        add_task(&db, user.id, at(2024, 5, 10, 9, 0), true).await;
        add_task(&db, user.id, at(2024, 5, 10, 12, 0), true).await;

        let first = evaluate_streak(&db, &calendar, user.id, at(2024, 5, 10, 9, 0), now)
            .await
            .unwrap();
        assert_eq!(first, StreakOutcome::Updated(1));

        let again = evaluate_streak(&db, &calendar, user.id, at(2024, 5, 10, 12, 0), now)
            .await
            .unwrap();
        assert_eq!(again, StreakOutcome::Unchanged(SkipReason::AlreadyCredited));

        let stored = db.get_user(user.id).await.unwrap();
        assert_eq!(stored.streak, 1);
        assert_eq!(stored.highest_streak, 1);
        assert_eq!(stored.last_streak_date, Some(now));
    }

    #[tokio::test]
    async fn partial_day_does_not_credit() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;
        add_task(&db, user.id, at(2024, 5, 10, 9, 0), true).await;
        add_task(&db, user.id, at(2024, 5, 10, 10, 0), false).await;

        let outcome = evaluate_streak(&db, &calendar, user.id, at(2024, 5, 10, 9, 0), at(2024, 5, 10, 20, 0))
            .await
            .unwrap();
        assert_eq!(outcome, StreakOutcome::Unchanged(SkipReason::Incomplete));
        assert_eq!(db.get_user(user.id).await.unwrap().streak, 0);
    }

    #[tokio::test]
    async fn backdated_completion_never_changes_streak() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;
        add_task(&db, user.id, at(2024, 5, 9, 9, 0), true).await;

        let outcome = evaluate_streak(&db, &calendar, user.id, at(2024, 5, 9, 9, 0), at(2024, 5, 10, 8, 0))
            .await
            .unwrap();
        assert_eq!(outcome, StreakOutcome::Unchanged(SkipReason::Backdated));
        assert_eq!(db.get_user(user.id).await.unwrap().last_streak_date, None);
    }

    #[tokio::test]
    async fn consecutive_days_increment_and_gaps_reset() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;

        for (day, expected) in [(10, 1), (11, 2), (12, 3), (15, 1)] {
            let date = at(2024, 5, day, 9, 0);
            add_task(&db, user.id, date, true).await;
            let outcome = evaluate_streak(&db, &calendar, user.id, date, date + Duration::hours(10))
                .await
                .unwrap();
            assert_eq!(outcome, StreakOutcome::Updated(expected), "day {}", day);
        }

        let stored = db.get_user(user.id).await.unwrap();
        assert_eq!(stored.streak, 1);
        assert_eq!(stored.highest_streak, 3);
    }
}
