//! crates/duotrack_core/src/admin.rs
//!
//! Platform-wide operations reserved for administrators.

use tracing::info;
use uuid::Uuid;

use crate::domain::{Identity, PlatformCounts, User};
use crate::error::{CoreError, CoreResult};
use crate::ports::DatabaseService;

/// How many of the newest accounts the overview lists.
pub const RECENT_USERS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub counts: PlatformCounts,
    pub recent_users: Vec<User>,
}

fn require_admin(identity: &Identity) -> CoreResult<()> {
    if identity.is_admin {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Admin access required".to_string()))
    }
}

pub async fn list_users(db: &dyn DatabaseService, identity: &Identity) -> CoreResult<Vec<User>> {
    require_admin(identity)?;
    Ok(db.list_users().await?)
}

pub async fn overview(db: &dyn DatabaseService, identity: &Identity) -> CoreResult<Overview> {
    require_admin(identity)?;
    let (counts, mut users) = futures::try_join!(db.platform_counts(), db.list_users())?;
    users.truncate(RECENT_USERS);
    Ok(Overview {
        counts,
        recent_users: users,
    })
}

/// Grants or revokes the admin flag. Admins cannot revoke their own.
pub async fn set_admin(
    db: &dyn DatabaseService,
    identity: &Identity,
    target_id: Uuid,
    is_admin: bool,
) -> CoreResult<User> {
    require_admin(identity)?;
    if target_id == identity.user_id && !is_admin {
        return Err(CoreError::Validation(
            "Admins cannot revoke their own access".to_string(),
        ));
    }
    db.set_admin(target_id, is_admin).await?;
    info!(
        "Admin {} set is_admin={} on user {}",
        identity.user_id, is_admin, target_id
    );
    Ok(db.get_user(target_id).await?)
}
