//! crates/duotrack_core/src/work_session.rs
//!
//! The focus-time ledger: one `WorkSession` per user per calendar day.
//!
//! A running ledger stores only closed time in `total_seconds`; the time since
//! `last_start_time` is added on read and written only when an interval is
//! closed by a pause or a rollover.
//!
//! Rollover is lazy. Before any read, start or pause for a target day, a
//! ledger still running on an earlier day is closed at that day's end, and
//! when the target is today the new day is credited from midnight, or from
//! the anchor if that is later, and keeps running. Exactly one pending rollover is reconciled per access; days in
//! between two visits are not back-filled.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::calendar::Calendar;
use crate::domain::{FocusInterval, WorkSession};
use crate::error::{CoreError, CoreResult};
use crate::ports::{DatabaseService, PortResult};

/// A ledger as shown to a client.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub session: WorkSession,
    /// `total_seconds` plus the live addend when running. Display only.
    pub live_total_seconds: i64,
    /// `false` for the zero view handed out for a partner without a ledger.
    pub persisted: bool,
}

impl SessionView {
    fn of(session: WorkSession, now: DateTime<Utc>) -> Self {
        let live_total_seconds = live_total(&session, now);
        Self {
            session,
            live_total_seconds,
            persisted: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverReport {
    pub closed_day: NaiveDate,
    pub closed_seconds: i64,
    /// Seconds credited to today, when today was the target.
    pub carried_seconds: Option<i64>,
}

/// Whole seconds from `from` to `to`, never negative.
pub fn elapsed_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().max(0)
}

pub fn live_total(session: &WorkSession, now: DateTime<Utc>) -> i64 {
    match session.last_start_time {
        Some(anchor) => session.total_seconds + elapsed_seconds(anchor, now),
        None => session.total_seconds,
    }
}

fn close_interval(session: &mut WorkSession, start: DateTime<Utc>, end: DateTime<Utc>, seconds: i64) {
    session.total_seconds += seconds;
    session.intervals.push(FocusInterval {
        start,
        end,
        duration_seconds: seconds,
    });
}

/// Stops a running ledger at `now`. Returns the closed interval, if any.
pub fn pause_at(session: &mut WorkSession, now: DateTime<Utc>) -> Option<FocusInterval> {
    let anchor = session.last_start_time.take()?;
    let seconds = elapsed_seconds(anchor, now);
    close_interval(session, anchor, now, seconds);
    session.intervals.last().cloned()
}

/// Runs the ledger from `now`. An already running ledger only moves its anchor.
pub fn start_at(session: &mut WorkSession, now: DateTime<Utc>) {
    session.last_start_time = Some(now);
}

pub fn reset(session: &mut WorkSession) {
    session.total_seconds = 0;
    session.intervals.clear();
    session.last_start_time = None;
}

/// Closes a ledger left running on a day before today, then carries the
/// running timer into today when today is the target.
pub async fn rollover(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    user_id: Uuid,
    target_day: NaiveDate,
    now: DateTime<Utc>,
) -> PortResult<Option<RolloverReport>> {
    let Some(mut stale) = db.find_running_session(user_id).await? else {
        return Ok(None);
    };
    let today = calendar.day_of(now);
    if stale.day == target_day || stale.day >= today {
        return Ok(None);
    }
    let Some(anchor) = stale.last_start_time else {
        return Ok(None);
    };

    // A past ledger started after its own day ended only has time in today.
    let boundary = calendar.next_midnight(stale.day);
    if anchor >= boundary && target_day != today {
        return Ok(None);
    }

    stale.last_start_time = None;
    let mut closed_seconds = 0;
    if anchor < boundary {
        let end = calendar.end_of_day(stale.day);
        closed_seconds = elapsed_seconds(anchor, boundary);
        close_interval(&mut stale, anchor, end, closed_seconds);
    }
    db.save_session(&stale).await?;

    let mut carried_seconds = None;
    if target_day == today {
        let mut current = db.get_or_create_session(user_id, today).await?;
        if !current.is_running() {
            let from = anchor.max(calendar.start_of_day(today));
            let seconds = elapsed_seconds(from, now);
            close_interval(&mut current, from, now, seconds);
            current.last_start_time = Some(now);
            db.save_session(&current).await?;
            carried_seconds = Some(seconds);
        }
    }

    info!(
        "Rolled over work session of user {} from {}: {}s closed, {:?}s carried",
        user_id, stale.day, closed_seconds, carried_seconds
    );
    Ok(Some(RolloverReport {
        closed_day: stale.day,
        closed_seconds,
        carried_seconds,
    }))
}

/// Returns the ledger of `owner_id` for `day` as seen by `viewer_id`.
///
/// Viewers may read their own ledger, created on first access, or their
/// linked partner's, which is never created on their behalf.
pub async fn read(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    viewer_id: Uuid,
    owner_id: Uuid,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> CoreResult<SessionView> {
    if viewer_id != owner_id {
        let viewer = db.get_user(viewer_id).await?;
        if viewer.partner_id != Some(owner_id) {
            return Err(CoreError::Forbidden(
                "Not authorized to view this work session".to_string(),
            ));
        }
    }

    rollover(db, calendar, owner_id, day, now).await?;

    match db.find_session(owner_id, day).await? {
        Some(session) => Ok(SessionView::of(session, now)),
        None if viewer_id == owner_id => {
            let session = db.get_or_create_session(owner_id, day).await?;
            Ok(SessionView::of(session, now))
        }
        None => Ok(SessionView {
            session: WorkSession::new(owner_id, day),
            live_total_seconds: 0,
            persisted: false,
        }),
    }
}

pub async fn start(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    user_id: Uuid,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> CoreResult<SessionView> {
    rollover(db, calendar, user_id, day, now).await?;

    // Only one ledger runs at a time.
    if let Some(mut other) = db.find_running_session(user_id).await? {
        if other.day != day {
            pause_at(&mut other, now);
            db.save_session(&other).await?;
        }
    }

    let mut session = db.get_or_create_session(user_id, day).await?;
    start_at(&mut session, now);
    db.save_session(&session).await?;
    Ok(SessionView::of(session, now))
}

pub async fn pause(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    user_id: Uuid,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> CoreResult<SessionView> {
    rollover(db, calendar, user_id, day, now).await?;

    let mut session = db
        .find_session(user_id, day)
        .await?
        .ok_or_else(|| CoreError::NotFound("Session not found".to_string()))?;
    if pause_at(&mut session, now).is_some() {
        db.save_session(&session).await?;
    }
    Ok(SessionView::of(session, now))
}

pub async fn reset_day(
    db: &dyn DatabaseService,
    user_id: Uuid,
    day: NaiveDate,
    now: DateTime<Utc>,
) -> CoreResult<Option<SessionView>> {
    let Some(mut session) = db.find_session(user_id, day).await? else {
        return Ok(None);
    };
    reset(&mut session);
    db.save_session(&session).await?;
    Ok(Some(SessionView::of(session, now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::test_support::{at, couple, register, ymd};
    use chrono::Duration;

    #[tokio::test]
    async fn pause_records_the_elapsed_interval() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;
        let day = ymd(2024, 5, 10);
        let t0 = at(2024, 5, 10, 9, 0);
        let t1 = t0 + Duration::seconds(1_500);

        start(&db, &calendar, user.id, day, t0).await.unwrap();
        let paused = pause(&db, &calendar, user.id, day, t1).await.unwrap();

        assert_eq!(paused.session.total_seconds, 1_500);
        assert_eq!(paused.session.intervals.len(), 1);
        assert_eq!(paused.session.intervals[0].duration_seconds, 1_500);
        assert!(!paused.session.is_running());

        // Pausing a stopped ledger changes nothing.
        let again = pause(&db, &calendar, user.id, day, t1 + Duration::minutes(5)).await.unwrap();
        assert_eq!(again.session.total_seconds, 1_500);
        assert_eq!(again.session.intervals.len(), 1);
    }

    #[tokio::test]
    async fn read_adds_live_time_without_writing_it() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;
        let day = ymd(2024, 5, 10);
        let t0 = at(2024, 5, 10, 9, 0);

        start(&db, &calendar, user.id, day, t0).await.unwrap();
        let view = read(&db, &calendar, user.id, user.id, day, t0 + Duration::minutes(3)).await.unwrap();
        assert_eq!(view.live_total_seconds, 180);
        assert_eq!(view.session.total_seconds, 0);

        let stored = db.find_session(user.id, day).await.unwrap().unwrap();
        assert_eq!(stored.total_seconds, 0);
        assert!(stored.is_running());
    }

    #[tokio::test]
    async fn timer_left_running_over_midnight_is_split_between_days() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;
        let yesterday = ymd(2024, 5, 10);
        let today = ymd(2024, 5, 11);

        start(&db, &calendar, user.id, yesterday, at(2024, 5, 10, 23, 50)).await.unwrap();
        let view = read(&db, &calendar, user.id, user.id, today, at(2024, 5, 11, 0, 10)).await.unwrap();

        let closed = db.find_session(user.id, yesterday).await.unwrap().unwrap();
        assert!(!closed.is_running());
        assert_eq!(closed.total_seconds, 600);
        assert_eq!(closed.intervals[0].end, calendar.end_of_day(yesterday));

        assert!(view.session.is_running());
        assert_eq!(view.session.total_seconds, 600);
        assert_eq!(view.live_total_seconds, 600);
        assert_eq!(view.session.last_start_time, Some(at(2024, 5, 11, 0, 10)));
        assert_eq!(closed.total_seconds + view.live_total_seconds, 1_200);

        // Later reads keep counting from the new anchor only.
        let later = read(&db, &calendar, user.id, user.id, today, at(2024, 5, 11, 0, 15)).await.unwrap();
        assert_eq!(later.live_total_seconds, 900);
    }

    #[tokio::test]
    async fn past_ledger_started_today_carries_only_its_own_time() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;
        let yesterday = ymd(2024, 5, 10);
        let today = ymd(2024, 5, 11);

        start(&db, &calendar, user.id, yesterday, at(2024, 5, 11, 10, 0)).await.unwrap();
        let view = read(&db, &calendar, user.id, user.id, today, at(2024, 5, 11, 10, 5)).await.unwrap();

        let old = db.find_session(user.id, yesterday).await.unwrap().unwrap();
        assert!(!old.is_running());
        assert_eq!(old.total_seconds, 0);
        assert!(old.intervals.is_empty());
        assert_eq!(view.live_total_seconds, 300);
        assert_eq!(view.session.intervals[0].start, at(2024, 5, 11, 10, 0));
        assert_eq!(old.total_seconds + view.live_total_seconds, 300);
    }

    #[tokio::test]
    async fn past_ledger_started_today_is_left_alone_for_other_days() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;

        start(&db, &calendar, user.id, ymd(2024, 5, 10), at(2024, 5, 11, 10, 0)).await.unwrap();
        let report = rollover(&db, &calendar, user.id, ymd(2024, 5, 9), at(2024, 5, 11, 10, 5))
            .await
            .unwrap();
        assert_eq!(report, None);

        let paused = pause(&db, &calendar, user.id, ymd(2024, 5, 10), at(2024, 5, 11, 10, 5))
            .await
            .unwrap();
        assert_eq!(paused.session.total_seconds, 300);
    }

    #[tokio::test]
    async fn reading_a_past_day_closes_the_stale_ledger_without_carrying() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;

        start(&db, &calendar, user.id, ymd(2024, 5, 9), at(2024, 5, 9, 23, 0)).await.unwrap();
        let report = rollover(&db, &calendar, user.id, ymd(2024, 5, 8), at(2024, 5, 11, 9, 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.closed_seconds, 3_600);
        assert_eq!(report.carried_seconds, None);
        assert!(db.find_session(user.id, ymd(2024, 5, 11)).await.unwrap().is_none());
        assert!(db.find_running_session(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn starting_another_day_stops_the_running_one() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;
        let now = at(2024, 5, 10, 10, 0);

        start(&db, &calendar, user.id, ymd(2024, 5, 10), now).await.unwrap();
        start(&db, &calendar, user.id, ymd(2024, 5, 12), now + Duration::minutes(1)).await.unwrap();

        let first = db.find_session(user.id, ymd(2024, 5, 10)).await.unwrap().unwrap();
        assert!(!first.is_running());
        assert_eq!(first.total_seconds, 60);
    }

    #[tokio::test]
    async fn reset_zeroes_and_stops() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let user = register(&db, "ana").await;
        let day = ymd(2024, 5, 10);
        let t0 = at(2024, 5, 10, 9, 0);

        start(&db, &calendar, user.id, day, t0).await.unwrap();
        pause(&db, &calendar, user.id, day, t0 + Duration::minutes(10)).await.unwrap();
        start(&db, &calendar, user.id, day, t0 + Duration::minutes(20)).await.unwrap();

        let view = reset_day(&db, user.id, day, t0 + Duration::minutes(30)).await.unwrap().unwrap();
        assert_eq!(view.live_total_seconds, 0);
        assert!(view.session.intervals.is_empty());
        assert!(!view.session.is_running());

        assert!(reset_day(&db, user.id, ymd(2024, 1, 1), t0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partners_can_read_but_strangers_cannot() {
        let db = MemoryStore::new();
        let calendar = Calendar::utc();
        let (a, b) = couple(&db).await;
        let stranger = register(&db, "eve").await;
        let day = ymd(2024, 5, 10);
        let now = at(2024, 5, 10, 12, 0);

        let empty = read(&db, &calendar, a.id, b.id, day, now).await.unwrap();
        assert!(!empty.persisted);
        assert_eq!(empty.live_total_seconds, 0);
        assert!(db.find_session(b.id, day).await.unwrap().is_none());

        start(&db, &calendar, b.id, day, now).await.unwrap();
        let live = read(&db, &calendar, a.id, b.id, day, now + Duration::seconds(42)).await.unwrap();
        assert_eq!(live.live_total_seconds, 42);

        assert!(matches!(
            read(&db, &calendar, stranger.id, b.id, day, now).await,
            Err(CoreError::Forbidden(_))
        ));
    }
}
