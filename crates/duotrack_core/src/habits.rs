//! crates/duotrack_core/src/habits.rs
//!
//! Habit tracking. Unlike the user streak, the habit streak has no persisted
//! anchor: it is recomputed from the full set of completed dates on every toggle.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::domain::Habit;
use crate::error::{CoreError, CoreResult};
use crate::ports::DatabaseService;

/// Counts consecutive completed days ending today or yesterday.
pub fn habit_streak(completed: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = completed.to_vec();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let Some(&latest) = dates.first() else {
        return 0;
    };
    if latest != today && latest != today - Duration::days(1) {
        return 0;
    }

    let mut streak = 1;
    let mut expected = latest;
    for &date in &dates[1..] {
        expected -= Duration::days(1);
        if date != expected {
            break;
        }
        streak += 1;
    }
    streak
}

/// Parses the `YYYY-MM-DD` form habits are toggled with.
pub fn parse_habit_date(value: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::Validation("Date must be formatted as YYYY-MM-DD".to_string()))
}

pub async fn create_habit(db: &dyn DatabaseService, user_id: Uuid, name: &str) -> CoreResult<Habit> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Habit name is required".to_string()));
    }
    Ok(db.create_habit(user_id, name).await?)
}

pub async fn list_habits(db: &dyn DatabaseService, user_id: Uuid) -> CoreResult<Vec<Habit>> {
    Ok(db.list_active_habits(user_id).await?)
}

async fn owned_habit(db: &dyn DatabaseService, user_id: Uuid, habit_id: Uuid) -> CoreResult<Habit> {
    let habit = db.get_habit(habit_id).await?;
    if habit.user_id != user_id {
        return Err(CoreError::NotFound("Habit not found".to_string()));
    }
    Ok(habit)
}

/// Checks or unchecks `date` and recomputes the streak relative to `today`.
pub async fn toggle_habit_date(
    db: &dyn DatabaseService,
    user_id: Uuid,
    habit_id: Uuid,
    date: NaiveDate,
    today: NaiveDate,
) -> CoreResult<Habit> {
    let mut habit = owned_habit(db, user_id, habit_id).await?;

    match habit.completed_dates.binary_search(&date) {
        Ok(index) => {
            habit.completed_dates.remove(index);
        }
        Err(index) => habit.completed_dates.insert(index, date),
    }
    habit.streak = habit_streak(&habit.completed_dates, today);

    db.save_habit(&habit).await?;
    Ok(habit)
}

pub async fn delete_habit(db: &dyn DatabaseService, user_id: Uuid, habit_id: Uuid) -> CoreResult<()> {
    owned_habit(db, user_id, habit_id).await?;
    db.delete_habit(habit_id).await?;
    Ok(())
}
