//! services/api/src/web/work_session.rs
//!
//! Focus-timer endpoints. The body of the write endpoints is optional; without
//! a date they act on today.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use duotrack_core::domain::Identity;
use duotrack_core::work_session;
use duotrack_core::CoreResult;
use std::sync::Arc;

use crate::web::dto::{parse_day, WorkSessionDto, WorkSessionQuery, WorkSessionRequest};
use crate::web::response::{respond, respond_empty, HttpResult};
use crate::web::state::AppState;

fn body_day(state: &AppState, body: Option<Json<WorkSessionRequest>>) -> CoreResult<NaiveDate> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    parse_day(&state.calendar, req.date.as_deref(), state.now())
}

/// Read one's own ledger for a day, or a linked partner's with `userId`.
#[utoipa::path(
    get,
    path = "/work-session",
    params(WorkSessionQuery),
    responses(
        (status = 200, description = "Ledger with its live total", body = WorkSessionDto),
        (status = 403, description = "userId is not the caller's partner")
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<WorkSessionQuery>,
) -> HttpResult {
    let now = state.now();
    let day = parse_day(&state.calendar, query.date.as_deref(), now)?;
    let owner_id = query.user_id.unwrap_or(identity.user_id);

    let view = work_session::read(
        state.db.as_ref(),
        &state.calendar,
        identity.user_id,
        owner_id,
        day,
        now,
    )
    .await?;
    Ok(respond(StatusCode::OK, "Session fetched", WorkSessionDto::from(view)))
}

#[utoipa::path(
    post,
    path = "/work-session/start",
    request_body(content = WorkSessionRequest, description = "Optional day, defaults to today"),
    responses((status = 200, description = "Timer running", body = WorkSessionDto))
)]
pub async fn start_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Option<Json<WorkSessionRequest>>,
) -> HttpResult {
    let day = body_day(&state, body)?;
    let view = work_session::start(
        state.db.as_ref(),
        &state.calendar,
        identity.user_id,
        day,
        state.now(),
    )
    .await?;
    Ok(respond(StatusCode::OK, "Session started", WorkSessionDto::from(view)))
}

#[utoipa::path(
    post,
    path = "/work-session/pause",
    request_body(content = WorkSessionRequest, description = "Optional day, defaults to today"),
    responses(
        (status = 200, description = "Timer stopped", body = WorkSessionDto),
        (status = 404, description = "No ledger for that day")
    )
)]
pub async fn pause_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Option<Json<WorkSessionRequest>>,
) -> HttpResult {
    let day = body_day(&state, body)?;
    let view = work_session::pause(
        state.db.as_ref(),
        &state.calendar,
        identity.user_id,
        day,
        state.now(),
    )
    .await?;
    Ok(respond(StatusCode::OK, "Session paused", WorkSessionDto::from(view)))
}

#[utoipa::path(
    post,
    path = "/work-session/reset",
    request_body(content = WorkSessionRequest, description = "Optional day, defaults to today"),
    responses((status = 200, description = "Ledger zeroed, or nothing to reset", body = WorkSessionDto))
)]
pub async fn reset_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Option<Json<WorkSessionRequest>>,
) -> HttpResult {
    let day = body_day(&state, body)?;
    match work_session::reset_day(state.db.as_ref(), identity.user_id, day, state.now()).await? {
        Some(view) => Ok(respond(StatusCode::OK, "Session reset", WorkSessionDto::from(view))),
        None => Ok(respond_empty(StatusCode::OK, "No session to reset")),
    }
}
