//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the router that
//! wires every REST handler behind the auth middleware.

use crate::web::{
    admin, ai, analytics, auth, dto, habits, middleware::require_auth, partners, state::AppState,
    tasks, work_session,
};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        tasks::create_task_handler,
        tasks::dashboard_handler,
        tasks::update_task_handler,
        tasks::delete_task_handler,
        tasks::update_status_handler,
        tasks::add_comment_handler,
        tasks::add_subtask_handler,
        tasks::toggle_subtask_handler,
        tasks::delete_subtask_handler,
        work_session::get_session_handler,
        work_session::start_session_handler,
        work_session::pause_session_handler,
        work_session::reset_session_handler,
        habits::create_habit_handler,
        habits::list_habits_handler,
        habits::toggle_habit_handler,
        habits::delete_habit_handler,
        partners::send_request_handler,
        partners::list_requests_handler,
        partners::respond_request_handler,
        partners::unlink_handler,
        ai::categorize_handler,
        analytics::heatmap_handler,
        analytics::categories_handler,
        analytics::partner_stats_handler,
        analytics::time_stats_handler,
        admin::stats_handler,
        admin::list_users_handler,
        admin::set_admin_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            dto::UserDto,
            dto::PartnerDto,
            dto::TaskDto,
            dto::CommentDto,
            dto::SubtaskDto,
            dto::RecurrenceDto,
            dto::CreateTaskRequest,
            dto::UpdateTaskRequest,
            dto::StatusRequest,
            dto::CommentRequest,
            dto::SubtaskRequest,
            dto::DashboardDto,
            dto::DateRangeDto,
            dto::WorkSessionRequest,
            dto::WorkSessionDto,
            dto::IntervalDto,
            dto::HabitRequest,
            dto::ToggleHabitRequest,
            dto::HabitDto,
            dto::PartnerInviteRequest,
            dto::RespondRequest,
            dto::PartnerRequestDto,
            dto::CategorizeRequest,
            dto::CategoryDto,
            dto::DayCountDto,
            dto::CategoryShareDto,
            dto::DayComparisonDto,
            dto::PartnerStatsDto,
            dto::DayFocusDto,
            dto::FocusStatsDto,
            dto::PlatformCountsDto,
            dto::OverviewDto,
            dto::AdminFlagRequest,
        )
    ),
    tags(
        (name = "DuoTrack API", description = "Tasks, streaks, focus sessions and habits for pairs of partners. Every response is wrapped in { success, message, data }.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the REST router. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/users/me", get(auth::me_handler))
        .route("/tasks", post(tasks::create_task_handler))
        .route("/tasks/dashboard", get(tasks::dashboard_handler))
        .route(
            "/tasks/{id}",
            patch(tasks::update_task_handler).delete(tasks::delete_task_handler),
        )
        .route("/tasks/{id}/status", patch(tasks::update_status_handler))
        .route("/tasks/{id}/comment", post(tasks::add_comment_handler))
        .route("/tasks/{id}/subtasks", post(tasks::add_subtask_handler))
        .route(
            "/tasks/{id}/subtasks/{subtask_id}",
            patch(tasks::toggle_subtask_handler).delete(tasks::delete_subtask_handler),
        )
        .route("/work-session", get(work_session::get_session_handler))
        .route("/work-session/start", post(work_session::start_session_handler))
        .route("/work-session/pause", post(work_session::pause_session_handler))
        .route("/work-session/reset", post(work_session::reset_session_handler))
        .route(
            "/habits",
            post(habits::create_habit_handler).get(habits::list_habits_handler),
        )
        .route("/habits/{id}/toggle", post(habits::toggle_habit_handler))
        .route("/habits/{id}", delete(habits::delete_habit_handler))
        .route(
            "/partners/requests",
            post(partners::send_request_handler).get(partners::list_requests_handler),
        )
        .route("/partners/requests/respond", post(partners::respond_request_handler))
        .route("/partners/unlink", post(partners::unlink_handler))
        .route("/ai/categorize", post(ai::categorize_handler))
        .route("/analytics/heatmap", get(analytics::heatmap_handler))
        .route("/analytics/categories", get(analytics::categories_handler))
        .route("/analytics/partner-stats", get(analytics::partner_stats_handler))
        .route("/analytics/time-stats", get(analytics::time_stats_handler))
        .route("/admin/stats", get(admin::stats_handler))
        .route("/admin/users", get(admin::list_users_handler))
        .route("/admin/users/{id}", patch(admin::set_admin_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
