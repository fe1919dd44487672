//! crates/duotrack_core/src/dashboard.rs
//!
//! Assembles a user's own tasks, their partner's tasks and the tasks the two
//! share into one view over a day, week or month.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::calendar::Calendar;
use crate::domain::{Task, TaskOrder, TaskQuery, User};
use crate::error::{CoreError, CoreResult};
use crate::ports::DatabaseService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl ViewMode {
    pub fn parse(value: &str) -> CoreResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "daily" => Ok(ViewMode::Daily),
            "weekly" => Ok(ViewMode::Weekly),
            "monthly" => Ok(ViewMode::Monthly),
            other => Err(CoreError::Validation(format!(
                "viewMode must be daily, weekly or monthly, got '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Daily => "daily",
            ViewMode::Weekly => "weekly",
            ViewMode::Monthly => "monthly",
        }
    }

    /// First and last calendar day covered by the view.
    pub fn day_span(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            ViewMode::Daily => (date, date),
            ViewMode::Weekly => {
                let sunday = date - Duration::days(i64::from(Calendar::weekday_index(date)));
                (sunday, sunday + Duration::days(6))
            }
            ViewMode::Monthly => {
                let first = date.with_day(1).unwrap_or(date);
                let next_month = if first.month() == 12 {
                    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
                };
                let last = next_month.map_or(date, |n| n - Duration::days(1));
                (first, last)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartnerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub streak: u32,
}

impl From<&User> for PartnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            streak: user.streak,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub my_tasks: Vec<Task>,
    pub partner_tasks: Vec<Task>,
    pub shared_tasks: Vec<Task>,
    pub partner: Option<PartnerSummary>,
    pub view_mode: ViewMode,
    pub date_range: DateRange,
}

pub fn resolve_range(calendar: &Calendar, date: NaiveDate, view_mode: ViewMode) -> DateRange {
    let (first, last) = view_mode.day_span(date);
    DateRange {
        start: calendar.start_of_day(first),
        end: calendar.end_of_day(last),
    }
}

pub async fn build_dashboard(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    user_id: Uuid,
    date: NaiveDate,
    view_mode: ViewMode,
) -> CoreResult<Dashboard> {
    let user = db.get_user(user_id).await?;

    // A dangling partner reference reads as no partner.
    let partner = match user.partner_id {
        Some(partner_id) => db.get_user(partner_id).await.ok(),
        None => None,
    };

    let range = resolve_range(calendar, date, view_mode);
    let order = match view_mode {
        ViewMode::Daily => TaskOrder::PositionThenNewest,
        ViewMode::Weekly | ViewMode::Monthly => TaskOrder::DateThenPosition,
    };
    let query = |owners: Vec<Uuid>, shared: bool, order: TaskOrder| TaskQuery {
        owners,
        shared: Some(shared),
        from: range.start,
        to: range.end,
        order,
    };

    let own_query = query(vec![user.id], false, order);
    let partner_query = partner.as_ref().map(|p| query(vec![p.id], false, order));
    let mut shared_owners = vec![user.id];
    shared_owners.extend(partner.as_ref().map(|p| p.id));
    let shared_query = query(shared_owners, true, TaskOrder::Newest);

    let (my_tasks, partner_tasks, shared_tasks) = futures::try_join!(
        db.find_tasks(&own_query),
        async {
            match &partner_query {
                Some(q) => db.find_tasks(q).await,
                None => Ok(Vec::new()),
            }
        },
        db.find_tasks(&shared_query),
    )?;

    Ok(Dashboard {
        my_tasks,
        partner_tasks,
        shared_tasks,
        partner: partner.as_ref().map(PartnerSummary::from),
        view_mode,
        date_range: range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, NewTask};
    use crate::memory::MemoryStore;
    use crate::tasks;
    use crate::test_support::{at, couple, register, ymd};

    async fn add(db: &MemoryStore, owner: Uuid, date: DateTime<Utc>, shared: bool, content: &str) -> Task {
        db.insert_task(NewTask {
            user_id: owner,
            content: content.into(),
            date,
            category: Category::Other,
            is_recurring: false,
            recurrence: None,
            is_shared: shared,
        })
        .await
        .unwrap()
    }

    #[test]
    fn ranges_cover_day_week_and_month() {
        // 2024-02-14 is a Wednesday in a leap-year February.
        let date = ymd(2024, 2, 14);
        assert_eq!(ViewMode::Daily.day_span(date), (date, date));
        assert_eq!(ViewMode::Weekly.day_span(date), (ymd(2024, 2, 11), ymd(2024, 2, 17)));
        assert_eq!(ViewMode::Monthly.day_span(date), (ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(
            ViewMode::Monthly.day_span(ymd(2024, 12, 31)),
            (ymd(2024, 12, 1), ymd(2024, 12, 31))
        );

        let range = resolve_range(&Calendar::utc(), date, ViewMode::Weekly);
        assert_eq!(range.start, at(2024, 2, 11, 0, 0));
        assert_eq!(range.end, at(2024, 2, 18, 0, 0) - Duration::milliseconds(1));
        assert!(ViewMode::parse("yearly").is_err());
    }

    #[tokio::test]
    async fn without_partner_the_partner_side_is_empty() {
        let db = MemoryStore::new();
        let user = register(&db, "solo").await;
        add(&db, user.id, at(2024, 5, 10, 9, 0), false, "mine").await;
        add(&db, user.id, at(2024, 5, 10, 10, 0), true, "goal").await;
        add(&db, user.id, at(2024, 5, 11, 9, 0), false, "tomorrow").await;

        let dash = build_dashboard(&db, &Calendar::utc(), user.id, ymd(2024, 5, 10), ViewMode::Daily)
            .await
            .unwrap();
        assert_eq!(dash.my_tasks.len(), 1);
        assert_eq!(dash.my_tasks[0].content, "mine");
        assert!(dash.partner_tasks.is_empty());
        assert!(dash.partner.is_none());
        assert_eq!(dash.shared_tasks.len(), 1);
    }

    #[tokio::test]
    async fn partner_view_splits_own_partner_and_shared() {
        let db = MemoryStore::new();
        let (a, b) = couple(&db).await;
        let day = at(2024, 5, 10, 9, 0);
        add(&db, a.id, day, false, "a private").await;
        add(&db, b.id, day, false, "b private").await;
        let goal = add(&db, b.id, day, true, "joint goal").await;

        tasks::set_status(&db, a.id, goal.id, true).await.unwrap();

        for (viewer, partner) in [(&a, &b), (&b, &a)] {
            let dash = build_dashboard(&db, &Calendar::utc(), viewer.id, ymd(2024, 5, 10), ViewMode::Weekly)
                .await
                .unwrap();
            assert_eq!(dash.my_tasks.len(), 1);
            assert_eq!(dash.partner_tasks.len(), 1);
            assert_eq!(dash.partner.as_ref().map(|p| p.id), Some(partner.id));
            assert_eq!(dash.shared_tasks.len(), 1);
            assert!(dash.shared_tasks[0].is_completed);
        }
    }

    #[tokio::test]
    async fn weekly_view_sorts_by_date_then_position() {
        let db = MemoryStore::new();
        let user = register(&db, "ana").await;
        let mut late = add(&db, user.id, at(2024, 5, 10, 9, 0), false, "friday").await;
        late.position = Some(0);
        db.save_task(&late).await.unwrap();
        add(&db, user.id, at(2024, 5, 6, 9, 0), false, "monday").await;

        let dash = build_dashboard(&db, &Calendar::utc(), user.id, ymd(2024, 5, 8), ViewMode::Weekly)
            .await
            .unwrap();
        let names: Vec<_> = dash.my_tasks.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(names, vec!["monday", "friday"]);
    }
}
