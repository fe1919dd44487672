//! services/api/src/web/effects.rs
//!
//! Side effects that run after a response has been decided: streak evaluation
//! and notifications. They are spawned onto the runtime, and their failures
//! are logged and never reach the client.

use crate::web::notifications;
use crate::web::state::AppState;
use duotrack_core::domain::{Notification, User};
use duotrack_core::streak::{self, StreakOutcome};
use duotrack_core::tasks::{CommentAdded, CompletionChange};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Delivers one notification, logging instead of failing.
pub async fn deliver(app_state: &AppState, notification: Notification) {
    let recipient = notification.recipient_email.clone();
    if let Err(e) = app_state.notifier.send(notification).await {
        error!("Failed to notify {}: {:?}", recipient, e);
    }
}

pub fn spawn_notification(app_state: Arc<AppState>, notification: Notification) {
    tokio::spawn(async move { deliver(&app_state, notification).await });
}

/// Starts the completion side effects when `change` moved a task into the
/// complete state. Returns whether anything was spawned.
pub fn on_completion(app_state: &Arc<AppState>, change: &CompletionChange) -> bool {
    if !change.became_complete {
        return false;
    }
    tokio::spawn(run_completion_effects(app_state.clone(), change.clone()));
    true
}

/// Streak evaluation for the acting user and notifications to the owner and
/// the owner's partner, concurrently and independently.
pub async fn run_completion_effects(app_state: Arc<AppState>, change: CompletionChange) {
    let streak_effect = async {
        let now = app_state.now();
        match streak::evaluate_streak(
            app_state.db.as_ref(),
            &app_state.calendar,
            change.actor.id,
            change.task.date,
            now,
        )
        .await
        {
            Ok(StreakOutcome::Updated(streak)) => {
                info!("Streak of user {} is now {}", change.actor.id, streak)
            }
            Ok(StreakOutcome::Unchanged(reason)) => {
                info!("Streak of user {} unchanged: {:?}", change.actor.id, reason)
            }
            Err(e) => error!("Streak evaluation for user {} failed: {:?}", change.actor.id, e),
        }
    };

    let notify_effect = async {
        let recipients = completion_recipients(&app_state, &change).await;
        let url = app_state.config.frontend_url.clone();
        futures::future::join_all(recipients.iter().map(|recipient| {
            let notification = notifications::task_completed(recipient, &change.actor, &change.task, &url);
            deliver(&app_state, notification)
        }))
        .await;
    };

    tokio::join!(streak_effect, notify_effect);
}

async fn completion_recipients(app_state: &AppState, change: &CompletionChange) -> Vec<User> {
    let owner = if change.task.user_id == change.actor.id {
        change.actor.clone()
    } else {
        match app_state.db.get_user(change.task.user_id).await {
            Ok(owner) => owner,
            Err(e) => {
                error!("Failed to load owner of task {}: {:?}", change.task.id, e);
                return Vec::new();
            }
        }
    };

    let partner = match owner.partner_id {
        Some(partner_id) => lookup(app_state, partner_id).await,
        None => None,
    };
    let mut recipients = vec![owner];
    recipients.extend(partner);
    recipients
}

async fn lookup(app_state: &AppState, user_id: Uuid) -> Option<User> {
    match app_state.db.get_user(user_id).await {
        Ok(user) => Some(user),
        Err(e) => {
            error!("Failed to load user {} for a notification: {:?}", user_id, e);
            None
        }
    }
}

/// Tells the other side of a shared task about a new comment.
pub fn on_comment(app_state: &Arc<AppState>, added: &CommentAdded, text: &str) {
    let Some(recipient_id) = added.notify else {
        return;
    };
    let app_state = app_state.clone();
    let sender = added.sender.clone();
    let task = added.task.clone();
    let text = text.to_string();
    tokio::spawn(async move {
        if let Some(recipient) = lookup(&app_state, recipient_id).await {
            let url = app_state.config.frontend_url.clone();
            let notification = notifications::comment_added(&recipient, &sender, &task, &text, &url);
            deliver(&app_state, notification).await;
        }
    });
}
