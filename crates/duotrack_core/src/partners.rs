//! crates/duotrack_core/src/partners.rs
//!
//! Partner requests and the symmetric partner link.
//!
//! Linking and unlinking write both users one after the other. A failure
//! between the two writes leaves a one-sided link, which shows up as two
//! users whose `partner_id` fields disagree.

use uuid::Uuid;

use crate::domain::{PartnerRequest, User};
use crate::error::{CoreError, CoreResult};
use crate::ports::{DatabaseService, PortError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestAction {
    Accept,
    Reject,
}

impl RequestAction {
    pub fn parse(value: &str) -> CoreResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "accept" => Ok(RequestAction::Accept),
            "reject" => Ok(RequestAction::Reject),
            _ => Err(CoreError::Validation("action must be accept or reject".to_string())),
        }
    }
}

/// A pending request together with the user who sent it.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub request: PartnerRequest,
    pub requester: User,
}

#[derive(Debug, Clone)]
pub struct SentRequest {
    pub request: PartnerRequest,
    pub requester: User,
    pub recipient: User,
}

#[derive(Debug, Clone)]
pub enum Response {
    Linked { requester: User, recipient: User },
    Rejected,
}

pub async fn send_request(
    db: &dyn DatabaseService,
    requester_id: Uuid,
    recipient_email: &str,
) -> CoreResult<SentRequest> {
    let email = recipient_email.trim().to_lowercase();
    if email.is_empty() {
        return Err(CoreError::Validation("Email is required".to_string()));
    }
    let credentials = db
        .get_user_by_email(&email)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => CoreError::NotFound("User not found".to_string()),
            other => other.into(),
        })?;
    if credentials.user_id == requester_id {
        return Err(CoreError::Validation("You cannot link with yourself".to_string()));
    }
    let recipient = db.get_user(credentials.user_id).await?;
    if recipient.partner_id.is_some() {
        return Err(CoreError::Conflict("User is already partnered".to_string()));
    }
    if db.find_pending_request(requester_id, recipient.id).await?.is_some() {
        return Err(CoreError::Conflict("Request already sent".to_string()));
    }

    let requester = db.get_user(requester_id).await?;
    let request = db.create_partner_request(requester_id, recipient.id).await?;
    Ok(SentRequest {
        request,
        requester,
        recipient,
    })
}

pub async fn list_requests(db: &dyn DatabaseService, user_id: Uuid) -> CoreResult<Vec<IncomingRequest>> {
    let mut incoming = Vec::new();
    for request in db.list_requests_for_recipient(user_id).await? {
        // Requests from deleted accounts are skipped.
        if let Ok(requester) = db.get_user(request.requester_id).await {
            incoming.push(IncomingRequest { request, requester });
        }
    }
    Ok(incoming)
}

pub async fn respond(
    db: &dyn DatabaseService,
    user_id: Uuid,
    request_id: Uuid,
    action: RequestAction,
) -> CoreResult<Response> {
    let request = db.get_partner_request(request_id).await?;
    if request.recipient_id != user_id {
        return Err(CoreError::Forbidden("Unauthorized".to_string()));
    }

    match action {
        RequestAction::Reject => {
            db.delete_partner_request(request.id).await?;
            Ok(Response::Rejected)
        }
        RequestAction::Accept => {
            let requester = db.get_user(request.requester_id).await?;
            let recipient = db.get_user(user_id).await?;
            if requester.partner_id.is_some() || recipient.partner_id.is_some() {
                db.delete_partner_request(request.id).await?;
                return Err(CoreError::Conflict("User is already partnered".to_string()));
            }
            db.set_partner(request.requester_id, Some(user_id)).await?;
            db.set_partner(user_id, Some(request.requester_id)).await?;
            db.delete_requests_involving(&[user_id, request.requester_id])
                .await?;
            Ok(Response::Linked {
                requester: db.get_user(request.requester_id).await?,
                recipient: db.get_user(user_id).await?,
            })
        }
    }
}

pub async fn unlink(db: &dyn DatabaseService, user_id: Uuid) -> CoreResult<()> {
    let user = db.get_user(user_id).await?;
    let partner_id = user
        .partner_id
        .ok_or_else(|| CoreError::Validation("No partner linked".to_string()))?;
    db.set_partner(user_id, None).await?;
    // The partner may already be gone; the local side is cleared regardless.
    match db.set_partner(partner_id, None).await {
        Ok(()) | Err(PortError::NotFound(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::test_support::{couple, register};

    #[tokio::test]
    async fn accept_links_both_sides_and_clears_requests() {
        let db = MemoryStore::new();
        let ana = register(&db, "ana").await;
        let ben = register(&db, "ben").await;
        let eve = register(&db, "eve").await;

        let sent = send_request(&db, ana.id, "BEN@example.com").await.unwrap();
        send_request(&db, eve.id, "ben@example.com").await.unwrap();
        assert_eq!(list_requests(&db, ben.id).await.unwrap().len(), 2);

        assert!(matches!(
            respond(&db, ana.id, sent.request.id, RequestAction::Accept).await,
            Err(CoreError::Forbidden(_))
        ));

        let response = respond(&db, ben.id, sent.request.id, RequestAction::Accept).await.unwrap();
        assert!(matches!(response, Response::Linked { .. }));
        assert_eq!(db.get_user(ana.id).await.unwrap().partner_id, Some(ben.id));
        assert_eq!(db.get_user(ben.id).await.unwrap().partner_id, Some(ana.id));
        assert!(list_requests(&db, ben.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn request_rules() {
        let db = MemoryStore::new();
        let (ana, _ben) = couple(&db).await;
        let eve = register(&db, "eve").await;
        let zed = register(&db, "zed").await;

        assert!(matches!(send_request(&db, eve.id, "nobody@example.com").await, Err(CoreError::NotFound(_))));
        assert!(matches!(send_request(&db, eve.id, "eve@example.com").await, Err(CoreError::Validation(_))));
        assert!(matches!(send_request(&db, eve.id, &ana.email).await, Err(CoreError::Conflict(_))));

        send_request(&db, eve.id, "zed@example.com").await.unwrap();
        assert!(matches!(send_request(&db, eve.id, "zed@example.com").await, Err(CoreError::Conflict(_))));

        let pending = list_requests(&db, zed.id).await.unwrap();
        respond(&db, zed.id, pending[0].request.id, RequestAction::Reject).await.unwrap();
        assert!(list_requests(&db, zed.id).await.unwrap().is_empty());
        assert_eq!(db.get_user(zed.id).await.unwrap().partner_id, None);
    }

    #[tokio::test]
    async fn unlink_clears_both_sides() {
        let db = MemoryStore::new();
        let (ana, ben) = couple(&db).await;
        unlink(&db, ben.id).await.unwrap();
        assert_eq!(db.get_user(ana.id).await.unwrap().partner_id, None);
        assert_eq!(db.get_user(ben.id).await.unwrap().partner_id, None);
        assert!(matches!(unlink(&db, ana.id).await, Err(CoreError::Validation(_))));
    }
}
