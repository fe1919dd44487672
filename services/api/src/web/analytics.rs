//! services/api/src/web/analytics.rs
//!
//! Charts for the caller: a yearly heatmap, category shares, a week against
//! the partner and a month of focus time.

use axum::{extract::State, http::StatusCode, Extension};
use duotrack_core::analytics;
use duotrack_core::domain::Identity;
use std::sync::Arc;

use crate::web::dto::{CategoryShareDto, DayCountDto, FocusStatsDto, PartnerStatsDto};
use crate::web::response::{respond, HttpResult};
use crate::web::state::AppState;

#[utoipa::path(
    get,
    path = "/analytics/heatmap",
    responses((status = 200, description = "Completed tasks per day over the last year", body = [DayCountDto]))
)]
pub async fn heatmap_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    let days: Vec<DayCountDto> =
        analytics::heatmap(state.db.as_ref(), &state.calendar, identity.user_id, state.today())
            .await?
            .into_iter()
            .map(DayCountDto::from)
            .collect();
    Ok(respond(StatusCode::OK, "Heatmap fetched", days))
}

#[utoipa::path(
    get,
    path = "/analytics/categories",
    responses((status = 200, description = "Tasks per category, largest first", body = [CategoryShareDto]))
)]
pub async fn categories_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    let shares: Vec<CategoryShareDto> =
        analytics::category_distribution(state.db.as_ref(), identity.user_id)
            .await?
            .into_iter()
            .map(CategoryShareDto::from)
            .collect();
    Ok(respond(StatusCode::OK, "Categories fetched", shares))
}

#[utoipa::path(
    get,
    path = "/analytics/partner-stats",
    responses((status = 200, description = "Completed tasks over the last 7 days for both partners", body = PartnerStatsDto))
)]
pub async fn partner_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    let stats = analytics::partner_stats(
        state.db.as_ref(),
        &state.calendar,
        identity.user_id,
        state.today(),
    )
    .await?;
    Ok(respond(StatusCode::OK, "Partner stats fetched", PartnerStatsDto::from(stats)))
}

#[utoipa::path(
    get,
    path = "/analytics/time-stats",
    responses((status = 200, description = "Focus seconds over the last 30 days for both partners", body = FocusStatsDto))
)]
pub async fn time_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    let stats = analytics::focus_stats(state.db.as_ref(), identity.user_id, state.today()).await?;
    Ok(respond(StatusCode::OK, "Time stats fetched", FocusStatsDto::from(stats)))
}
