//! services/api/src/web/ai.rs
//!
//! Category suggestions for free text. Answers are cached for an hour per
//! lower-cased text, and a failing classifier falls back to the keyword table.

use axum::{extract::State, http::StatusCode, Extension, Json};
use duotrack_core::domain::{Category, Identity};
use std::sync::Arc;
use tracing::warn;

use crate::adapters::classifier::keyword_category;
use crate::web::dto::{CategorizeRequest, CategoryDto};
use crate::web::response::{respond, HttpError, HttpResult};
use crate::web::state::AppState;

pub async fn suggest_category(state: &AppState, content: &str) -> Category {
    let key = content.trim().to_lowercase();
    let now = state.now();
    if let Some(category) = state.category_cache.get(&key, now) {
        return category;
    }

    let category = match state.classifier.classify(content).await {
        Ok(category) => category,
        Err(e) => {
            warn!("Category classifier failed, using keywords: {:?}", e);
            keyword_category(content)
        }
    };
    state.category_cache.insert(key, category, now);
    category
}

#[utoipa::path(
    post,
    path = "/ai/categorize",
    request_body = CategorizeRequest,
    responses(
        (status = 200, description = "Suggested category", body = CategoryDto),
        (status = 400, description = "Content is required")
    )
)]
pub async fn categorize_handler(
    State(state): State<Arc<AppState>>,
    Extension(_identity): Extension<Identity>,
    Json(req): Json<CategorizeRequest>,
) -> HttpResult {
    if req.content.trim().is_empty() {
        return Err(HttpError::bad_request("Content is required"));
    }
    let category = suggest_category(&state, &req.content).await;
    Ok(respond(
        StatusCode::OK,
        "Category suggested",
        CategoryDto {
            category: category.as_str().to_string(),
        },
    ))
}
