//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST API, and their mapping to and
//! from the core domain. Field names are camelCase on the wire.

use chrono::{DateTime, NaiveDate, Utc};
use duotrack_core::admin::Overview;
use duotrack_core::analytics::{
    CategoryShare, DayComparison, DayCount, DayFocus, FocusStats, PartnerStats,
};
use duotrack_core::dashboard::{DateRange, Dashboard, PartnerSummary};
use duotrack_core::domain::{
    Category, Comment, FocusInterval, Habit, PlatformCounts, Recurrence, RecurrenceKind, Subtask,
    Task, User,
};
use duotrack_core::partners::IncomingRequest;
use duotrack_core::work_session::SessionView;
use duotrack_core::{Calendar, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Shared Parsing Helpers
//=========================================================================================

/// Resolves a `date` parameter to a calendar day. Accepts `YYYY-MM-DD` or an
/// RFC 3339 instant; a missing value means today.
pub fn parse_day(calendar: &Calendar, value: Option<&str>, now: DateTime<Utc>) -> CoreResult<NaiveDate> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(calendar.day_of(now));
    };
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|instant| calendar.day_of(instant.with_timezone(&Utc)))
        .map_err(|_| CoreError::Validation(format!("Invalid date '{}'", value)))
}

pub fn parse_category(value: Option<&str>) -> CoreResult<Option<Category>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(name) => Category::parse(name).map(Some).ok_or_else(|| {
            CoreError::Validation(format!(
                "category must be one of Work, Personal, Workout, Study, Other; got '{}'",
                name
            ))
        }),
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
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

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            partner_id: user.partner_id,
            streak: user.streak,
            highest_streak: user.highest_streak,
            last_streak_date: user.last_streak_date,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// The public face of another user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartnerDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub streak: u32,
}

impl From<PartnerSummary> for PartnerDto {
    fn from(summary: PartnerSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            email: summary.email,
            streak: summary.streak,
        }
    }
}

impl From<&User> for PartnerDto {
    fn from(user: &User) -> Self {
        PartnerSummary::from(user).into()
    }
}

//=========================================================================================
// Tasks
//=========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceDto {
    /// `daily`, `weekly` or `custom`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Weekday indices for `custom`, 0 = Sunday.
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    pub end_date: Option<DateTime<Utc>>,
}

impl RecurrenceDto {
    pub fn to_domain(&self) -> CoreResult<Recurrence> {
        let kind = match self.kind.to_ascii_lowercase().as_str() {
            "daily" => RecurrenceKind::Daily,
            "weekly" => RecurrenceKind::Weekly,
            "custom" => RecurrenceKind::Custom,
            other => {
                return Err(CoreError::Validation(format!(
                    "recurrence type must be daily, weekly or custom; got '{}'",
                    other
                )))
            }
        };
        Ok(Recurrence {
            kind,
            days_of_week: self.days_of_week.clone(),
            end_date: self.end_date,
        })
    }
}

impl From<Recurrence> for RecurrenceDto {
    fn from(rule: Recurrence) -> Self {
        Self {
            kind: rule.kind.as_str().to_string(),
            days_of_week: rule.days_of_week,
            end_date: rule.end_date,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: Uuid,
    pub text: String,
    pub sender_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentDto {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            text: c.text,
            sender_id: c.sender_id,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskDto {
    pub id: Uuid,
    pub content: String,
    pub is_completed: bool,
}

impl From<Subtask> for SubtaskDto {
    fn from(s: Subtask) -> Self {
        Self {
            id: s.id,
            content: s.content,
            is_completed: s.is_completed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub date: DateTime<Utc>,
    pub category: String,
    pub is_completed: bool,
    pub position: Option<i32>,
    pub comments: Vec<CommentDto>,
    pub subtasks: Vec<SubtaskDto>,
    pub is_recurring: bool,
    pub recurrence: Option<RecurrenceDto>,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskDto {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            user_id: task.user_id,
            content: task.content,
            date: task.date,
            category: task.category.as_str().to_string(),
            is_completed: task.is_completed,
            position: task.position,
            comments: task.comments.into_iter().map(CommentDto::from).collect(),
            subtasks: task.subtasks.into_iter().map(SubtaskDto::from).collect(),
            is_recurring: task.is_recurring,
            recurrence: task.recurrence.map(RecurrenceDto::from),
            is_shared: task.is_shared,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

pub fn tasks_dto(tasks: Vec<Task>) -> Vec<TaskDto> {
    tasks.into_iter().map(TaskDto::from).collect()
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub content: String,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence: Option<RecurrenceDto>,
    #[serde(default)]
    pub is_shared: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub content: Option<String>,
    pub category: Option<String>,
    pub position: Option<i32>,
    pub is_recurring: Option<bool>,
    pub recurrence: Option<RecurrenceDto>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub is_completed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubtaskRequest {
    pub content: String,
}

//=========================================================================================
// Dashboard
//=========================================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
    /// `daily` (default), `weekly` or `monthly`.
    pub view_mode: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DateRangeDto {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<DateRange> for DateRangeDto {
    fn from(range: DateRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub my_tasks: Vec<TaskDto>,
    pub partner_tasks: Vec<TaskDto>,
    pub shared_tasks: Vec<TaskDto>,
    pub partner: Option<PartnerDto>,
    pub view_mode: String,
    pub date_range: DateRangeDto,
}

impl From<Dashboard> for DashboardDto {
    fn from(dash: Dashboard) -> Self {
        Self {
            my_tasks: tasks_dto(dash.my_tasks),
            partner_tasks: tasks_dto(dash.partner_tasks),
            shared_tasks: tasks_dto(dash.shared_tasks),
            partner: dash.partner.map(PartnerDto::from),
            view_mode: dash.view_mode.as_str().to_string(),
            date_range: dash.date_range.into(),
        }
    }
}

//=========================================================================================
// Work Sessions
//=========================================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WorkSessionQuery {
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
    /// Read a linked partner's ledger instead of one's own.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct WorkSessionRequest {
    pub date: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntervalDto {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration: i64,
}

impl From<FocusInterval> for IntervalDto {
    fn from(i: FocusInterval) -> Self {
        Self {
            start: i.start,
            end: i.end,
            duration: i.duration_seconds,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkSessionDto {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub date: NaiveDate,
    /// Closed time only.
    pub total_seconds: i64,
    /// Closed time plus the running interval, as of the response.
    pub live_total_seconds: i64,
    pub is_running: bool,
    pub last_start_time: Option<DateTime<Utc>>,
    pub intervals: Vec<IntervalDto>,
}

impl From<SessionView> for WorkSessionDto {
    fn from(view: SessionView) -> Self {
        let session = view.session;
        Self {
            id: view.persisted.then_some(session.id),
            user_id: session.user_id,
            date: session.day,
            total_seconds: session.total_seconds,
            live_total_seconds: view.live_total_seconds,
            is_running: session.last_start_time.is_some(),
            last_start_time: session.last_start_time,
            intervals: session.intervals.into_iter().map(IntervalDto::from).collect(),
        }
    }
}

//=========================================================================================
// Habits
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct HabitRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleHabitRequest {
    /// `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HabitDto {
    pub id: Uuid,
    pub name: String,
    pub completed_dates: Vec<NaiveDate>,
    pub streak: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Habit> for HabitDto {
    fn from(habit: Habit) -> Self {
        Self {
            id: habit.id,
            name: habit.name,
            completed_dates: habit.completed_dates,
            streak: habit.streak,
            is_active: habit.is_active,
            created_at: habit.created_at,
        }
    }
}

//=========================================================================================
// Partners
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct PartnerInviteRequest {
    pub email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub request_id: Uuid,
    /// `accept` or `reject`.
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartnerRequestDto {
    pub id: Uuid,
    pub requester: PartnerDto,
    pub created_at: DateTime<Utc>,
}

impl From<IncomingRequest> for PartnerRequestDto {
    fn from(incoming: IncomingRequest) -> Self {
        Self {
            id: incoming.request.id,
            requester: PartnerDto::from(&incoming.requester),
            created_at: incoming.request.created_at,
        }
    }
}

//=========================================================================================
// AI
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategorizeRequest {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryDto {
    pub category: String,
}

//=========================================================================================
// Analytics
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct DayCountDto {
    pub date: NaiveDate,
    pub count: u32,
}

impl From<DayCount> for DayCountDto {
    fn from(day: DayCount) -> Self {
        Self {
            date: day.day,
            count: day.count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryShareDto {
    pub category: String,
    pub count: u64,
}

impl From<CategoryShare> for CategoryShareDto {
    fn from(share: CategoryShare) -> Self {
        Self {
            category: share.category.as_str().to_string(),
            count: share.count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DayComparisonDto {
    pub date: NaiveDate,
    /// Short weekday name, e.g. `Mon`.
    pub day: String,
    pub mine: u32,
    pub partner: u32,
}

impl From<DayComparison> for DayComparisonDto {
    fn from(day: DayComparison) -> Self {
        Self {
            date: day.day,
            day: day.day.format("%a").to_string(),
            mine: day.mine,
            partner: day.partner,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartnerStatsDto {
    pub days: Vec<DayComparisonDto>,
    pub has_partner: bool,
}

impl From<PartnerStats> for PartnerStatsDto {
    fn from(stats: PartnerStats) -> Self {
        Self {
            days: stats.days.into_iter().map(DayComparisonDto::from).collect(),
            has_partner: stats.has_partner,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayFocusDto {
    pub date: NaiveDate,
    pub mine_seconds: i64,
    pub partner_seconds: i64,
}

impl From<DayFocus> for DayFocusDto {
    fn from(day: DayFocus) -> Self {
        Self {
            date: day.day,
            mine_seconds: day.mine_seconds,
            partner_seconds: day.partner_seconds,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FocusStatsDto {
    pub days: Vec<DayFocusDto>,
    pub mine_total_seconds: i64,
    pub partner_total_seconds: i64,
    pub has_partner: bool,
}

impl From<FocusStats> for FocusStatsDto {
    fn from(stats: FocusStats) -> Self {
        Self {
            days: stats.days.into_iter().map(DayFocusDto::from).collect(),
            mine_total_seconds: stats.mine_total_seconds,
            partner_total_seconds: stats.partner_total_seconds,
            has_partner: stats.has_partner,
        }
    }
}

//=========================================================================================
// Admin
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCountsDto {
    pub users: u64,
    pub users_with_partners: u64,
    pub tasks: u64,
    pub habits: u64,
    pub work_sessions: u64,
}

impl From<PlatformCounts> for PlatformCountsDto {
    fn from(counts: PlatformCounts) -> Self {
        Self {
            users: counts.users,
            users_with_partners: counts.users_with_partners,
            tasks: counts.tasks,
            habits: counts.habits,
            work_sessions: counts.work_sessions,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewDto {
    pub counts: PlatformCountsDto,
    pub recent_users: Vec<UserDto>,
}

impl From<Overview> for OverviewDto {
    fn from(overview: Overview) -> Self {
        Self {
            counts: PlatformCountsDto::from(overview.counts),
            recent_users: overview.recent_users.into_iter().map(UserDto::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminFlagRequest {
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_parameter_accepts_plain_dates_and_instants() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 22, 30, 0).unwrap();
        let utc = Calendar::utc();
        let plus_two = Calendar::new(Calendar::parse_offset("+02:00").unwrap());

        assert_eq!(parse_day(&utc, None, now).unwrap(), NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        assert_eq!(parse_day(&plus_two, None, now).unwrap(), NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
        assert_eq!(
            parse_day(&utc, Some("2024-02-29"), now).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            parse_day(&plus_two, Some("2024-05-10T23:00:00Z"), now).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 11).unwrap()
        );
        assert!(parse_day(&utc, Some("next tuesday"), now).is_err());
    }

    #[test]
    fn recurrence_type_is_checked() {
        let dto = RecurrenceDto {
            kind: "Weekly".into(),
            days_of_week: vec![],
            end_date: None,
        };
        assert_eq!(dto.to_domain().unwrap().kind, RecurrenceKind::Weekly);

        let bad = RecurrenceDto {
            kind: "hourly".into(),
            ..dto
        };
        assert!(matches!(bad.to_domain(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert_eq!(parse_category(Some("study")).unwrap(), Some(Category::Study));
        assert_eq!(parse_category(None).unwrap(), None);
        assert!(parse_category(Some("Chores")).is_err());
    }

    #[test]
    fn comparison_day_carries_a_weekday_label() {
        let dto = DayComparisonDto::from(DayComparison {
            day: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            mine: 2,
            partner: 1,
        });
        assert_eq!(dto.day, "Fri");
        assert_eq!(serde_json::to_value(&dto).unwrap()["date"], "2024-05-10");
    }
}
