use serde::Serialize;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::auth::dto::PublicUser;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,                    // store-assigned rowid
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    #[sqlx(rename = "password")]
    pub password_hash: String,      // Argon2 PHC string, not exposed in JSON
    pub full_name: String,
    pub created_at: PrimitiveDateTime, // column default, UTC
}

/// Fields needed to insert a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
        }
    }
}
