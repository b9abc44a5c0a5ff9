use serde::{Deserialize, Deserializer, Serialize};
use time::PrimitiveDateTime;

// SQLite CURRENT_TIMESTAMP text, UTC.
time::serde::format_description!(
    sqlite_timestamp,
    PrimitiveDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second]"
);

/// Missing and `null` form fields both read as empty strings.
fn nullable_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

/// Request body for user registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "nullable_string")]
    pub username: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub email: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub password: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub confirm_password: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub full_name: String,
}

/// Request body for login. `identifier` is a username or an email.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "nullable_string")]
    pub identifier: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
}

/// Entry of the `/users` listing. Keys follow the `users` columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(with = "sqlite_timestamp")]
    pub created_at: PrimitiveDateTime,
}

/// Response returned after register or login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserSummary>,
    pub count: usize,
}

/// One `{field, message}` pair in a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorItem {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorsResponse {
    pub success: bool,
    pub errors: Vec<ErrorItem>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_reads_camel_case_and_fills_gaps() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username":"bob","confirmPassword":"x","fullName":null}"#,
        )
        .unwrap();
        assert_eq!(req.username, "bob");
        assert_eq!(req.confirm_password, "x");
        assert_eq!(req.full_name, "");
        assert_eq!(req.email, "");
    }

    #[test]
    fn public_user_has_no_password_key() {
        let user = PublicUser {
            id: 1,
            username: "bob".into(),
            email: "bob@example.com".into(),
            full_name: "Bob B".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["fullName"], "Bob B");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn user_summary_uses_column_keys_and_sqlite_timestamp() {
        let summary = UserSummary {
            id: 1,
            username: "alice123".into(),
            email: "a@b.co".into(),
            full_name: "Alice A".into(),
            created_at: time::macros::datetime!(2026-10-18 04:37:22),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["full_name"], "Alice A");
        assert_eq!(json["created_at"], "2026-10-18 04:37:22");
        assert!(json.get("fullName").is_none());
    }
}
