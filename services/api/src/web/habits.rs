//! services/api/src/web/habits.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use duotrack_core::domain::Identity;
use duotrack_core::habits;
use std::sync::Arc;
use uuid::Uuid;

use crate::web::dto::{HabitDto, HabitRequest, ToggleHabitRequest};
use crate::web::response::{respond, respond_empty, HttpResult};
use crate::web::state::AppState;

#[utoipa::path(
    post,
    path = "/habits",
    request_body = HabitRequest,
    responses(
        (status = 201, description = "Habit created", body = HabitDto),
        (status = 400, description = "Habit name is required")
    )
)]
pub async fn create_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<HabitRequest>,
) -> HttpResult {
    let habit = habits::create_habit(state.db.as_ref(), identity.user_id, &req.name).await?;
    Ok(respond(StatusCode::CREATED, "Habit created", HabitDto::from(habit)))
}

#[utoipa::path(
    get,
    path = "/habits",
    responses((status = 200, description = "Active habits, newest first", body = [HabitDto]))
)]
pub async fn list_habits_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    let habits: Vec<HabitDto> = habits::list_habits(state.db.as_ref(), identity.user_id)
        .await?
        .into_iter()
        .map(HabitDto::from)
        .collect();
    Ok(respond(StatusCode::OK, "Habits fetched", habits))
}

/// Check or uncheck a day and recompute the habit's streak.
#[utoipa::path(
    post,
    path = "/habits/{id}/toggle",
    request_body = ToggleHabitRequest,
    params(("id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 200, description = "Habit updated", body = HabitDto),
        (status = 400, description = "Date is not YYYY-MM-DD"),
        (status = 404, description = "Habit not found")
    )
)]
pub async fn toggle_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(habit_id): Path<Uuid>,
    Json(req): Json<ToggleHabitRequest>,
) -> HttpResult {
    let date = habits::parse_habit_date(&req.date)?;
    let habit = habits::toggle_habit_date(
        state.db.as_ref(),
        identity.user_id,
        habit_id,
        date,
        state.today(),
    )
    .await?;
    Ok(respond(StatusCode::OK, "Habit updated", HabitDto::from(habit)))
}

#[utoipa::path(
    delete,
    path = "/habits/{id}",
    params(("id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 200, description = "Habit deleted"),
        (status = 404, description = "Habit not found")
    )
)]
pub async fn delete_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(habit_id): Path<Uuid>,
) -> HttpResult {
    habits::delete_habit(state.db.as_ref(), identity.user_id, habit_id).await?;
    Ok(respond_empty(StatusCode::OK, "Habit deleted"))
}
