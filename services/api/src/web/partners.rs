//! services/api/src/web/partners.rs
//!
//! Partner request and link endpoints. The recipient of a request and the
//! requester of an accepted one are notified in the background.

use axum::{extract::State, http::StatusCode, Extension, Json};
use duotrack_core::domain::Identity;
use duotrack_core::partners::{self, RequestAction, Response};
use std::sync::Arc;
use tracing::info;

use crate::web::dto::{PartnerDto, PartnerInviteRequest, PartnerRequestDto, RespondRequest};
use crate::web::effects;
use crate::web::notifications;
use crate::web::response::{respond, respond_empty, HttpResult};
use crate::web::state::AppState;

#[utoipa::path(
    post,
    path = "/partners/requests",
    request_body = PartnerInviteRequest,
    responses(
        (status = 201, description = "Request sent"),
        (status = 400, description = "Email missing or the caller's own"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already partnered or already requested")
    )
)]
pub async fn send_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<PartnerInviteRequest>,
) -> HttpResult {
    let sent = partners::send_request(state.db.as_ref(), identity.user_id, &req.email).await?;
    info!("User {} asked {} to partner up", sent.requester.id, sent.recipient.id);

    let notification =
        notifications::partner_request(&sent.recipient, &sent.requester, &state.config.frontend_url);
    effects::spawn_notification(state.clone(), notification);
    Ok(respond_empty(StatusCode::CREATED, "Partner request sent"))
}

#[utoipa::path(
    get,
    path = "/partners/requests",
    responses((status = 200, description = "Pending requests addressed to the caller", body = [PartnerRequestDto]))
)]
pub async fn list_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    let requests: Vec<PartnerRequestDto> = partners::list_requests(state.db.as_ref(), identity.user_id)
        .await?
        .into_iter()
        .map(PartnerRequestDto::from)
        .collect();
    Ok(respond(StatusCode::OK, "Requests fetched", requests))
}

#[utoipa::path(
    post,
    path = "/partners/requests/respond",
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Linked (with the new partner) or rejected", body = PartnerDto),
        (status = 403, description = "The request is addressed to someone else"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "One side is already partnered")
    )
)]
pub async fn respond_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<RespondRequest>,
) -> HttpResult {
    let action = RequestAction::parse(&req.action)?;
    match partners::respond(state.db.as_ref(), identity.user_id, req.request_id, action).await? {
        Response::Linked {
            requester,
            recipient,
        } => {
            info!("Users {} and {} are now partners", requester.id, recipient.id);
            let notification =
                notifications::partner_accepted(&requester, &recipient, &state.config.frontend_url);
            effects::spawn_notification(state.clone(), notification);
            Ok(respond(
                StatusCode::OK,
                "Partner linked",
                PartnerDto::from(&requester),
            ))
        }
        Response::Rejected => Ok(respond_empty(StatusCode::OK, "Request rejected")),
    }
}

#[utoipa::path(
    post,
    path = "/partners/unlink",
    responses(
        (status = 200, description = "Partner unlinked"),
        (status = 400, description = "No partner linked")
    )
)]
pub async fn unlink_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> HttpResult {
    partners::unlink(state.db.as_ref(), identity.user_id).await?;
    Ok(respond_empty(StatusCode::OK, "Partner unlinked"))
}
