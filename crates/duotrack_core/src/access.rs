//! crates/duotrack_core/src/access.rs
//!
//! The single place that decides who may do what to a task.

use crate::domain::{Task, User};
use crate::error::CoreError;

/// The kinds of task mutation that carry different permission rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Content, category and recurrence changes.
    Edit,
    Delete,
    /// Completion status, comments and subtasks.
    Collaborate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessVerdict {
    Owner,
    /// The actor is the owner's linked partner and the task is shared.
    SharedPartner,
    Denied,
}

impl AccessVerdict {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, AccessVerdict::Denied)
    }
}

pub fn authorize(actor: &User, task: &Task, action: TaskAction) -> AccessVerdict {
    if task.user_id == actor.id {
        return AccessVerdict::Owner;
    }
    let is_partner = actor.partner_id == Some(task.user_id);
    match action {
        TaskAction::Collaborate if task.is_shared && is_partner => AccessVerdict::SharedPartner,
        _ => AccessVerdict::Denied,
    }
}

/// Runs [`authorize`] and maps a denial onto the error the caller should see.
///
/// Owner-only actions report a missing task so that other users' tasks stay
/// invisible; collaborative actions report a permission failure.
pub fn require(actor: &User, task: &Task, action: TaskAction) -> Result<AccessVerdict, CoreError> {
    let verdict = authorize(actor, task, action);
    if verdict.is_allowed() {
        return Ok(verdict);
    }
    Err(match action {
        TaskAction::Edit | TaskAction::Delete => {
            CoreError::NotFound("Task not found or unauthorized".to_string())
        }
        TaskAction::Collaborate => {
            CoreError::Forbidden("Not authorized to update this task".to_string())
        }
    })
}
