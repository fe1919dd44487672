//! Shared fixtures for the unit tests of this crate.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::domain::{NewUser, User};
use crate::memory::MemoryStore;
use crate::ports::DatabaseService;

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub async fn register(db: &MemoryStore, name: &str) -> User {
    db.create_user(NewUser {
        name: name.to_string(),
        email: format!("{}@example.com", name),
        hashed_password: "hash".to_string(),
    })
    .await
    .unwrap()
}

/// Registers two users and links them as partners.
pub async fn couple(db: &MemoryStore) -> (User, User) {
    let a = register(db, "ana").await;
    let b = register(db, "ben").await;
    db.set_partner(a.id, Some(b.id)).await.unwrap();
    db.set_partner(b.id, Some(a.id)).await.unwrap();
    (
        db.get_user(a.id).await.unwrap(),
        db.get_user(b.id).await.unwrap(),
    )
}
