//! services/api/src/web/tasks.rs
//!
//! Task endpoints: creation (with recurrence), the dashboard, owner edits, and
//! the collaborative operations a linked partner may perform on shared tasks.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use duotrack_core::dashboard::{self, ViewMode};
use duotrack_core::domain::Identity;
use duotrack_core::tasks::{self, CompletionChange, CreateTask, TaskUpdate};
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{
    parse_category, parse_day, tasks_dto, CommentRequest, CreateTaskRequest, DashboardDto,
    DashboardQuery, StatusRequest, SubtaskRequest, TaskDto, UpdateTaskRequest,
};
use crate::web::effects;
use crate::web::response::{respond, respond_empty, HttpError, HttpResult};
use crate::web::state::AppState;

/// Responds with the changed task and starts the completion effects if due.
fn completion_response(state: &Arc<AppState>, change: CompletionChange, message: &str) -> HttpResult {
    effects::on_completion(state, &change);
    Ok(respond(StatusCode::OK, message, TaskDto::from(change.task)))
}

/// Create a task, or every instance of a recurring one.
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task or recurring instances created", body = [TaskDto]),
        (status = 400, description = "Invalid content, category or recurrence rule"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateTaskRequest>,
) -> HttpResult {
    let recurrence = match (&req.recurrence, req.is_recurring) {
        (Some(rule), true) => Some(rule.to_domain()?),
        (None, true) => {
            return Err(HttpError::bad_request(
                "recurrence is required for a recurring task",
            ))
        }
        (_, false) => None,
    };
    let input = CreateTask {
        content: req.content,
        category: parse_category(req.category.as_deref())?,
        date: req.date,
        recurrence,
        is_shared: req.is_shared,
    };

    let created = tasks::create_task(
        state.db.as_ref(),
        &state.calendar,
        identity.user_id,
        input,
        state.now(),
    )
    .await?;

    let message = if created.len() > 1 {
        format!("{} recurring tasks created", created.len())
    } else {
        "Task created".to_string()
    };
    Ok(respond(StatusCode::CREATED, &message, tasks_dto(created)))
}

/// The caller's tasks, their partner's tasks and their shared tasks over a day, week or month.
#[utoipa::path(
    get,
    path = "/tasks/dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Dashboard assembled", body = DashboardDto),
        (status = 400, description = "Invalid date or view mode"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<DashboardQuery>,
) -> HttpResult {
    let day = parse_day(&state.calendar, query.date.as_deref(), state.now())?;
    let view_mode = match query.view_mode.as_deref() {
        Some(mode) => ViewMode::parse(mode)?,
        None => ViewMode::default(),
    };

    let dash = dashboard::build_dashboard(
        state.db.as_ref(),
        &state.calendar,
        identity.user_id,
        day,
        view_mode,
    )
    .await?;
    Ok(respond(StatusCode::OK, "Dashboard fetched", DashboardDto::from(dash)))
}

/// Owner edits. `isRecurring: false` also removes the later instances of the series.
#[utoipa::path(
    patch,
    path = "/tasks/{id}",
    request_body = UpdateTaskRequest,
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task updated", body = TaskDto),
        (status = 404, description = "Task not found or not owned by the caller")
    )
)]
pub async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> HttpResult {
    let recurrence = match &req.recurrence {
        Some(rule) => Some(Some(rule.to_domain()?)),
        None => None,
    };
    let update = TaskUpdate {
        content: req.content,
        category: parse_category(req.category.as_deref())?,
        position: req.position,
        is_recurring: req.is_recurring,
        recurrence,
    };

    let task = tasks::update_task(state.db.as_ref(), identity.user_id, task_id, update).await?;
    Ok(respond(StatusCode::OK, "Task updated", TaskDto::from(task)))
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 404, description = "Task not found or not owned by the caller")
    )
)]
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
) -> HttpResult {
    tasks::delete_task(state.db.as_ref(), identity.user_id, task_id).await?;
    Ok(respond_empty(StatusCode::OK, "Task deleted"))
}

/// Mark a task complete or incomplete. Allowed for the owner and, on shared
/// tasks, the owner's partner.
#[utoipa::path(
    patch,
    path = "/tasks/{id}/status",
    request_body = StatusRequest,
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Status updated", body = TaskDto),
        (status = 403, description = "Not authorized to update this task"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> HttpResult {
    let change =
        tasks::set_status(state.db.as_ref(), identity.user_id, task_id, req.is_completed).await?;
    completion_response(&state, change, "Task status updated")
}

#[utoipa::path(
    post,
    path = "/tasks/{id}/comment",
    request_body = CommentRequest,
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 201, description = "Comment added", body = TaskDto),
        (status = 400, description = "Empty comment"),
        (status = 403, description = "Not authorized to update this task")
    )
)]
pub async fn add_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> HttpResult {
    let added =
        tasks::add_comment(state.db.as_ref(), identity.user_id, task_id, &req.text, state.now())
            .await?;
    effects::on_comment(&state, &added, req.text.trim());
    Ok(respond(StatusCode::CREATED, "Comment added", TaskDto::from(added.task)))
}

#[utoipa::path(
    post,
    path = "/tasks/{id}/subtasks",
    request_body = SubtaskRequest,
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Subtask added", body = TaskDto),
        (status = 403, description = "Not authorized to update this task")
    )
)]
pub async fn add_subtask_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<SubtaskRequest>,
) -> HttpResult {
    let change =
        tasks::add_subtask(state.db.as_ref(), identity.user_id, task_id, &req.content).await?;
    completion_response(&state, change, "Subtask added")
}

/// Flip a subtask. Checking the last open one completes the parent task.
#[utoipa::path(
    patch,
    path = "/tasks/{id}/subtasks/{subtask_id}",
    params(
        ("id" = Uuid, Path, description = "Task id"),
        ("subtask_id" = Uuid, Path, description = "Subtask id")
    ),
    responses(
        (status = 200, description = "Subtask toggled", body = TaskDto),
        (status = 404, description = "Task or subtask not found")
    )
)]
pub async fn toggle_subtask_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
) -> HttpResult {
    let change =
        tasks::toggle_subtask(state.db.as_ref(), identity.user_id, task_id, subtask_id).await?;
    completion_response(&state, change, "Subtask updated")
}

#[utoipa::path(
    delete,
    path = "/tasks/{id}/subtasks/{subtask_id}",
    params(
        ("id" = Uuid, Path, description = "Task id"),
        ("subtask_id" = Uuid, Path, description = "Subtask id")
    ),
    responses(
        (status = 200, description = "Subtask deleted", body = TaskDto),
        (status = 404, description = "Task or subtask not found")
    )
)]
pub async fn delete_subtask_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((task_id, subtask_id)): Path<(Uuid, Uuid)>,
) -> HttpResult {
    let change =
        tasks::delete_subtask(state.db.as_ref(), identity.user_id, task_id, subtask_id).await?;
    completion_response(&state, change, "Subtask deleted")
}
