//! crates/duotrack_core/src/recurrence.rs
//!
//! Materializes a recurrence rule into concrete, independently completable
//! task instances over a bounded horizon.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::calendar::Calendar;
use crate::domain::{Category, NewTask, Recurrence, RecurrenceKind};
use crate::error::{CoreError, CoreResult};

/// Horizon used when the rule carries no end date.
pub const DEFAULT_HORIZON_DAYS: i64 = 90;
/// Longest horizon an explicit end date may request.
pub const MAX_HORIZON_DAYS: i64 = 366;

/// The parts shared by every instance of a recurring task.
#[derive(Debug, Clone)]
pub struct TaskTemplate {
    pub user_id: Uuid,
    pub content: String,
    pub category: Category,
    pub is_shared: bool,
}

/// Checks the rule on its own, independent of any start date.
pub fn validate(recurrence: &Recurrence) -> CoreResult<()> {
    if recurrence.kind != RecurrenceKind::Custom {
        return Ok(());
    }
    if recurrence.days_of_week.is_empty() {
        return Err(CoreError::Validation(
            "recurrence.daysOfWeek is required for custom recurrence".to_string(),
        ));
    }
    if recurrence.days_of_week.iter().any(|d| *d > 6) {
        return Err(CoreError::Validation(
            "recurrence.daysOfWeek entries must be between 0 and 6".to_string(),
        ));
    }
    Ok(())
}

/// Produces one task per matching calendar day from `start` to the horizon, inclusive.
pub fn expand(
    calendar: &Calendar,
    template: &TaskTemplate,
    recurrence: &Recurrence,
    start: DateTime<Utc>,
) -> CoreResult<Vec<NewTask>> {
    validate(recurrence)?;

    let start_day = calendar.day_of(start);
    let horizon_day = match recurrence.end_date {
        Some(end) => calendar.day_of(end),
        None => calendar.day_of(start + Duration::days(DEFAULT_HORIZON_DAYS)),
    };
    let span = Calendar::days_between(start_day, horizon_day);
    if span > MAX_HORIZON_DAYS {
        return Err(CoreError::Validation(format!(
            "recurrence.endDate may be at most {} days after the start date",
            MAX_HORIZON_DAYS
        )));
    }

    let start_weekday = Calendar::weekday_index(start_day);
    let instances: Vec<NewTask> = (0..=span.max(-1))
        .filter_map(|offset| {
            let day = start_day + Duration::days(offset);
            let weekday = Calendar::weekday_index(day);
            let matches = match recurrence.kind {
                RecurrenceKind::Daily => true,
                RecurrenceKind::Weekly => weekday == start_weekday,
                RecurrenceKind::Custom => recurrence.days_of_week.contains(&weekday),
            };
            matches.then(|| NewTask {
                user_id: template.user_id,
                content: template.content.clone(),
                date: start + Duration::days(offset),
                category: template.category,
                is_recurring: true,
                recurrence: Some(recurrence.clone()),
                is_shared: template.is_shared,
            })
        })
        .collect();

    if instances.is_empty() {
        return Err(CoreError::Validation(
            "recurrence does not match any day before its end date".to_string(),
        ));
    }
    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, ymd};

    fn template() -> TaskTemplate {
        TaskTemplate {
            user_id: Uuid::new_v4(),
            content: "Gym".to_string(),
            category: Category::Workout,
            is_shared: false,
        }
    }

    fn rule(kind: RecurrenceKind, days: Vec<u8>, end: Option<DateTime<Utc>>) -> Recurrence {
        Recurrence {
            kind,
            days_of_week: days,
            end_date: end,
        }
    }

    #[test]
    fn weekly_without_end_date_yields_every_monday_in_ninety_days() {
        let calendar = Calendar::utc();
        // 2024-01-01 is a Monday.
        let start = at(2024, 1, 1, 7, 30);
        let tasks = expand(&calendar, &template(), &rule(RecurrenceKind::Weekly, vec![], None), start)
            .unwrap();

        let expected: Vec<_> = (0..=90)
            .map(|d| ymd(2024, 1, 1) + Duration::days(d))
            .filter(|d| Calendar::weekday_index(*d) == 1)
            .collect();
        let days: Vec<_> = tasks.iter().map(|t| calendar.day_of(t.date)).collect();
        assert_eq!(days, expected);
        assert_eq!(days.len(), 13);
        assert!(tasks.iter().all(|t| t.is_recurring && t.date.time() == start.time()));
    }

    #[test]
    fn daily_includes_both_ends() {
        let calendar = Calendar::utc();
        let tasks = expand(
            &calendar,
            &template(),
            &rule(RecurrenceKind::Daily, vec![], Some(at(2024, 1, 5, 0, 0))),
            at(2024, 1, 1, 9, 0),
        )
        .unwrap();
        assert_eq!(tasks.len(), 5);
        assert_eq!(calendar.day_of(tasks[4].date), ymd(2024, 1, 5));
    }

    #[test]
    fn custom_matches_the_weekday_set() {
        let calendar = Calendar::utc();
        // Sunday 2024-03-10 through Saturday 2024-03-23.
        let tasks = expand(
            &calendar,
            &template(),
            &rule(RecurrenceKind::Custom, vec![2, 4], Some(at(2024, 3, 23, 12, 0))),
            at(2024, 3, 10, 8, 0),
        )
        .unwrap();
        let days: Vec<_> = tasks.iter().map(|t| calendar.day_of(t.date)).collect();
        assert_eq!(
            days,
            vec![ymd(2024, 3, 12), ymd(2024, 3, 14), ymd(2024, 3, 19), ymd(2024, 3, 21)]
        );
    }

    #[test]
    fn invalid_rules_are_rejected() {
        let calendar = Calendar::utc();
        let start = at(2024, 3, 10, 8, 0);
        let cases = [
            rule(RecurrenceKind::Custom, vec![], None),
            rule(RecurrenceKind::Custom, vec![7], None),
            rule(RecurrenceKind::Daily, vec![], Some(at(2024, 3, 1, 0, 0))),
            rule(RecurrenceKind::Daily, vec![], Some(at(2026, 3, 1, 0, 0))),
        ];
        for case in cases {
            assert!(
                matches!(expand(&calendar, &template(), &case, start), Err(CoreError::Validation(_))),
                "{:?}",
                case
            );
        }
    }
}
