//! crates/duotrack_core/src/tasks.rs
//!
//! Task operations and the completion state machine.
//!
//! A task is either incomplete or complete. It becomes complete through a
//! direct status update or when its last open subtask is checked, and it
//! falls back to incomplete when a subtask is reopened or added. Every
//! transition into the complete state is reported to the caller through
//! [`CompletionChange::became_complete`] so that it can run the completion
//! side effects; falling back never undoes them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::access::{self, AccessVerdict, TaskAction};
use crate::calendar::Calendar;
use crate::domain::{Category, Comment, NewTask, Recurrence, Subtask, Task, User};
use crate::error::{CoreError, CoreResult};
use crate::ports::DatabaseService;
use crate::recurrence::{self, TaskTemplate};

//=========================================================================================
// Inputs & Outcomes
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    pub content: String,
    pub category: Option<Category>,
    /// Defaults to the current instant.
    pub date: Option<DateTime<Utc>>,
    /// A rule here turns the request into a recurrence expansion.
    pub recurrence: Option<Recurrence>,
    pub is_shared: bool,
}

/// Owner edits. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub content: Option<String>,
    pub category: Option<Category>,
    pub position: Option<i32>,
    pub is_recurring: Option<bool>,
    pub recurrence: Option<Option<Recurrence>>,
}

/// The result of an operation that may move a task into the complete state.
#[derive(Debug, Clone)]
pub struct CompletionChange {
    pub task: Task,
    /// The user the change was made by.
    pub actor: User,
    pub verdict: AccessVerdict,
    pub became_complete: bool,
}

#[derive(Debug, Clone)]
pub struct CommentAdded {
    pub task: Task,
    pub sender: User,
    /// Who should hear about the comment, if anyone.
    pub notify: Option<Uuid>,
}

//=========================================================================================
// Pure state rules
//=========================================================================================

/// Brings the parent flag in line with its subtasks. Returns `true` when the
/// parent moved into the complete state.
pub fn sync_parent(task: &mut Task) -> bool {
    if task.subtasks.is_empty() {
        return false;
    }
    let all_done = task.subtasks.iter().all(|s| s.is_completed);
    if all_done && !task.is_completed {
        task.is_completed = true;
        return true;
    }
    if !all_done && task.is_completed {
        task.is_completed = false;
    }
    false
}

/// Sets the completion flag directly. Completing a parent completes its subtasks.
pub fn apply_status(task: &mut Task, is_completed: bool) -> bool {
    let was_completed = task.is_completed;
    task.is_completed = is_completed;
    if is_completed {
        for subtask in &mut task.subtasks {
            subtask.is_completed = true;
        }
    }
    is_completed && !was_completed
}

//=========================================================================================
// Operations
//=========================================================================================

async fn load_for(
    db: &dyn DatabaseService,
    actor_id: Uuid,
    task_id: Uuid,
    action: TaskAction,
) -> CoreResult<(User, Task, AccessVerdict)> {
    let actor = db.get_user(actor_id).await?;
    let task = db.get_task(task_id).await?;
    let verdict = access::require(&actor, &task, action)?;
    Ok((actor, task, verdict))
}

/// Creates a single task, or every instance of a recurring one.
pub async fn create_task(
    db: &dyn DatabaseService,
    calendar: &Calendar,
    actor_id: Uuid,
    input: CreateTask,
    now: DateTime<Utc>,
) -> CoreResult<Vec<Task>> {
    let content = input.content.trim().to_string();
    if content.is_empty() {
        return Err(CoreError::Validation("Content is required".to_string()));
    }
    let date = input.date.unwrap_or(now);
    let category = input.category.unwrap_or_default();

    match input.recurrence {
        Some(rule) => {
            let template = TaskTemplate {
                user_id: actor_id,
                content,
                category,
                is_shared: input.is_shared,
            };
            let instances = recurrence::expand(calendar, &template, &rule, date)?;
            Ok(db.insert_tasks(instances).await?)
        }
        None => {
            let task = db
                .insert_task(NewTask {
                    user_id: actor_id,
                    content,
                    date,
                    category,
                    is_recurring: false,
                    recurrence: None,
                    is_shared: input.is_shared,
                })
                .await?;
            Ok(vec![task])
        }
    }
}

/// Applies owner edits. Switching recurrence off removes the later siblings
/// of this instance; earlier ones stay as history.
pub async fn update_task(
    db: &dyn DatabaseService,
    actor_id: Uuid,
    task_id: Uuid,
    update: TaskUpdate,
) -> CoreResult<Task> {
    let (_, mut task, _) = load_for(db, actor_id, task_id, TaskAction::Edit).await?;

    if let Some(content) = update.content.map(|c| c.trim().to_string()) {
        if !content.is_empty() {
            task.content = content;
        }
    }
    if let Some(category) = update.category {
        task.category = category;
    }
    if let Some(position) = update.position {
        task.position = Some(position);
    }
    if let Some(recurrence) = update.recurrence {
        if let Some(rule) = &recurrence {
            recurrence::validate(rule)?;
        }
        task.recurrence = recurrence;
    }
    if let Some(is_recurring) = update.is_recurring {
        task.is_recurring = is_recurring;
        if !is_recurring {
            let removed = db
                .delete_future_recurring(task.user_id, &task.content, task.date)
                .await?;
            tracing::info!("Recurrence of task {} cancelled, {} future instances removed", task.id, removed);
        }
    }

    db.save_task(&task).await?;
    Ok(task)
}

pub async fn delete_task(db: &dyn DatabaseService, actor_id: Uuid, task_id: Uuid) -> CoreResult<()> {
    load_for(db, actor_id, task_id, TaskAction::Delete).await?;
    db.delete_task(task_id).await?;
    Ok(())
}

pub async fn set_status(
    db: &dyn DatabaseService,
    actor_id: Uuid,
    task_id: Uuid,
    is_completed: bool,
) -> CoreResult<CompletionChange> {
    let (actor, mut task, verdict) = load_for(db, actor_id, task_id, TaskAction::Collaborate).await?;
    let became_complete = apply_status(&mut task, is_completed);
    db.save_task(&task).await?;
    Ok(CompletionChange {
        task,
        actor,
        verdict,
        became_complete,
    })
}

pub async fn add_subtask(
    db: &dyn DatabaseService,
    actor_id: Uuid,
    task_id: Uuid,
    content: &str,
) -> CoreResult<CompletionChange> {
    let content = content.trim();
    if content.is_empty() {
        return Err(CoreError::Validation("Content is required".to_string()));
    }
    let (actor, mut task, verdict) = load_for(db, actor_id, task_id, TaskAction::Collaborate).await?;
    task.subtasks.push(Subtask {
        id: Uuid::new_v4(),
        content: content.to_string(),
        is_completed: false,
    });
    let became_complete = sync_parent(&mut task);
    db.save_task(&task).await?;
    Ok(CompletionChange {
        task,
        actor,
        verdict,
        became_complete,
    })
}

pub async fn toggle_subtask(
    db: &dyn DatabaseService,
    actor_id: Uuid,
    task_id: Uuid,
    subtask_id: Uuid,
) -> CoreResult<CompletionChange> {
    let (actor, mut task, verdict) = load_for(db, actor_id, task_id, TaskAction::Collaborate).await?;
    let subtask = task
        .subtasks
        .iter_mut()
        .find(|s| s.id == subtask_id)
        .ok_or_else(|| CoreError::NotFound("Subtask not found".to_string()))?;
    subtask.is_completed = !subtask.is_completed;

    let became_complete = sync_parent(&mut task);
    db.save_task(&task).await?;
    Ok(CompletionChange {
        task,
        actor,
        verdict,
        became_complete,
    })
}

pub async fn delete_subtask(
    db: &dyn DatabaseService,
    actor_id: Uuid,
    task_id: Uuid,
    subtask_id: Uuid,
) -> CoreResult<CompletionChange> {
    let (actor, mut task, verdict) = load_for(db, actor_id, task_id, TaskAction::Collaborate).await?;
    let before = task.subtasks.len();
    task.subtasks.retain(|s| s.id != subtask_id);
    if task.subtasks.len() == before {
        return Err(CoreError::NotFound("Subtask not found".to_string()));
    }
    let became_complete = sync_parent(&mut task);
    db.save_task(&task).await?;
    Ok(CompletionChange {
        task,
        actor,
        verdict,
        became_complete,
    })
}

pub async fn add_comment(
    db: &dyn DatabaseService,
    actor_id: Uuid,
    task_id: Uuid,
    text: &str,
    now: DateTime<Utc>,
) -> CoreResult<CommentAdded> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CoreError::Validation("Comment text is required".to_string()));
    }
    let (sender, mut task, verdict) = load_for(db, actor_id, task_id, TaskAction::Collaborate).await?;
    task.comments.push(Comment {
        id: Uuid::new_v4(),
        text: text.to_string(),
        sender_id: sender.id,
        created_at: now,
    });
    db.save_task(&task).await?;

    let notify = match verdict {
        AccessVerdict::SharedPartner => Some(task.user_id),
        AccessVerdict::Owner if task.is_shared => sender.partner_id,
        _ => None,
    };
    Ok(CommentAdded {
        task,
        sender,
        notify,
    })
}
