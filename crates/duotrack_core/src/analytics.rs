//! crates/duotrack_core/src/analytics.rs
//!
//! Read-only statistics over tasks and focus ledgers. Completed tasks are
//! bucketed by the calendar day they were scheduled for, and windows always
//! end with today.

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use uuid::Uuid;

use crate::calendar::Calendar;
use crate::domain::{Category, TaskOrder, TaskQuery, User};
use crate::ports::{DatabaseService, PortResult};

pub const HEATMAP_DAYS: i64 = 365;
pub const COMPARISON_DAYS: i64 = 7;
pub const FOCUS_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    pub day: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryShare {
    pub category: Category,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayComparison {
    pub day: NaiveDate,
    pub mine: u32,
    pub partner: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerStats {
    pub days: Vec<DayComparison>,
    pub has_partner: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayFocus {
    pub day: NaiveDate,
    pub mine_seconds: i64,
    pub partner_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusStats {
    pub days: Vec<DayFocus>,
    pub mine_total_seconds: i64,
    pub partner_total_seconds: i64,
    pub has_partner: bool,
}

/// The `len` calendar days ending with `today`, oldest first.
fn window(today: NaiveDate, len: i64) -> Vec<NaiveDate> {
    (0..len)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

fn owners_of(user: &User) -> Vec<Uuid> {
    let mut owners = vec![user.id];
    owners.extend(user.partner_id);
    owners
}

/// Completed tasks per `(owner, day)` for days in `first..=today`.
async fn completed_per_day(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    owners: Vec<Uuid>,
    first: NaiveDate,
    today: NaiveDate,
) -> PortResult<HashMap<(Uuid, NaiveDate), u32>> {
    let tasks = db
        .find_tasks(&TaskQuery {
            owners,
            shared: None,
            from: calendar.start_of_day(first),
            to: calendar.end_of_day(today),
            order: TaskOrder::DateThenPosition,
        })
        .await?;

    let mut counts = HashMap::new();
    for task in tasks.iter().filter(|t| t.is_completed) {
        *counts
            .entry((task.user_id, calendar.day_of(task.date)))
            .or_insert(0) += 1;
    }
    Ok(counts)
}

/// Days of the last year with at least one completed task, oldest first.
pub async fn heatmap(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    user_id: Uuid,
    today: NaiveDate,
) -> PortResult<Vec<DayCount>> {
    let first = today - Duration::days(HEATMAP_DAYS - 1);
    let counts = completed_per_day(db, calendar, vec![user_id], first, today).await?;

    let mut days: Vec<DayCount> = counts
        .into_iter()
        .map(|((_, day), count)| DayCount { day, count })
        .collect();
    days.sort_by_key(|d| d.day);
    Ok(days)
}

/// All of a user's tasks per category, largest share first.
pub async fn category_distribution(
    db: &dyn DatabaseService,
    user_id: Uuid,
) -> PortResult<Vec<CategoryShare>> {
    let mut shares: Vec<CategoryShare> = db
        .count_tasks_by_category(user_id)
        .await?
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(category, count)| CategoryShare { category, count })
        .collect();
    shares.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    Ok(shares)
}

/// Completed tasks per day over the last week, side by side with the partner's.
pub async fn partner_stats(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    user_id: Uuid,
    today: NaiveDate,
) -> PortResult<PartnerStats> {
    let user = db.get_user(user_id).await?;
    let days = window(today, COMPARISON_DAYS);
    let counts = completed_per_day(db, calendar, owners_of(&user), days[0], today).await?;
    let count_for = |owner: Option<Uuid>, day: NaiveDate| {
        owner
            .and_then(|id| counts.get(&(id, day)).copied())
            .unwrap_or(0)
    };

    Ok(PartnerStats {
        days: days
            .into_iter()
            .map(|day| DayComparison {
                day,
                mine: count_for(Some(user.id), day),
                partner: count_for(user.partner_id, day),
            })
            .collect(),
        has_partner: user.partner_id.is_some(),
    })
}

/// Closed focus time per day over the last month for the user and the partner.
pub async fn focus_stats(
    db: &dyn DatabaseService,
    user_id: Uuid,
    today: NaiveDate,
) -> PortResult<FocusStats> {
    let user = db.get_user(user_id).await?;
    let days = window(today, FOCUS_DAYS);
    let sessions = db
        .find_sessions(&owners_of(&user), days[0], today)
        .await?;

    let mut seconds: HashMap<(Uuid, NaiveDate), i64> = HashMap::new();
    for session in &sessions {
        *seconds.entry((session.user_id, session.day)).or_insert(0) += session.total_seconds;
    }
    let seconds_for = |owner: Option<Uuid>, day: NaiveDate| {
        owner
            .and_then(|id| seconds.get(&(id, day)).copied())
            .unwrap_or(0)
    };

    let days: Vec<DayFocus> = days
        .into_iter()
        .map(|day| DayFocus {
            day,
            mine_seconds: seconds_for(Some(user.id), day),
            partner_seconds: seconds_for(user.partner_id, day),
        })
        .collect();

    Ok(FocusStats {
        mine_total_seconds: days.iter().map(|d| d.mine_seconds).sum(),
        partner_total_seconds: days.iter().map(|d| d.partner_seconds).sum(),
        days,
        has_partner: user.partner_id.is_some(),
    })
}
