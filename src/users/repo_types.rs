use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,              // assigned by the store at creation
    pub email: String,         // login key, unique, stored lowercased
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 hash, not exposed in JSON
    pub name: String,          // display name
    pub category: i32,         // integer classification
    pub date_of_birth: Date,
    pub bio: String,
    pub avatar: String,        // stored filename; empty means no avatar
}

/// Fields the store needs to create a user; id is generated server-side.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub category: i32,
    pub date_of_birth: Date,
    pub bio: String,
    pub avatar: String,
}
