use anyhow::Context;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use crate::auth::dto::{LoginRequest, PublicUser, RegisterRequest};
use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::auth::repo::UserStore;
use crate::auth::repo_types::NewUser;
use crate::auth::validation::{validate_login_form, validate_registration_form, Field};
use crate::error::AuthError;

/// Validate, check uniqueness, hash and insert a new user.
pub async fn register_user(
    store: &UserStore,
    form: &RegisterRequest,
) -> Result<PublicUser, AuthError> {
    validate_registration_form(form)
        .into_result()
        .map_err(AuthError::Validation)?;

    // Pre-checks only pick the error to report; the UNIQUE index is authoritative.
    if store.username_exists(&form.username).await? {
        warn!(username = %form.username, "username already registered");
        return Err(AuthError::Conflict(Field::Username));
    }
    if store.email_exists(&form.email).await? {
        warn!(email = %form.email, "email already registered");
        return Err(AuthError::Conflict(Field::Email));
    }

    // Argon2 is CPU bound; keep it off the async workers.
    let password = form.password.clone();
    let hash = spawn_blocking(move || hash_password(&password))
        .await
        .context("join password hashing task")??;
    let user = store
        .create_user(NewUser {
            username: &form.username,
            email: &form.email,
            password_hash: &hash,
            full_name: &form.full_name,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "create user failed");
            AuthError::from(e)
        })?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user.into())
}

/// Look up by username or email and check the password.
pub async fn authenticate(
    store: &UserStore,
    form: &LoginRequest,
) -> Result<PublicUser, AuthError> {
    validate_login_form(form)
        .into_result()
        .map_err(AuthError::Validation)?;

    let password = form.password.clone();
    let Some(user) = store.find_by_username_or_email(&form.identifier).await? else {
        spawn_blocking(move || verify_dummy(&password))
            .await
            .context("join password verification task")?;
        warn!("login unknown identifier");
        return Err(AuthError::InvalidCredentials);
    };

    let stored = user.password_hash.clone();
    let verified = spawn_blocking(move || verify_password(&password, &stored))
        .await
        .context("join password verification task")?;
    let ok = match verified {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, user_id = user.id, "stored password is not a valid hash");
            false
        }
    };
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    debug!(user_id = user.id, "credentials verified");
    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validation::ErrorKind;

    fn form(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "Abcdefg1".into(),
            confirm_password: "Abcdefg1".into(),
            full_name: "Test User".into(),
        }
    }

    fn login(identifier: &str, password: &str) -> LoginRequest {
        LoginRequest {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let store = UserStore::in_memory().await;
        let user = register_user(&store, &form("alice123", "a@b.co")).await.unwrap();
        assert_eq!(user.username, "alice123");
        assert_eq!(user.full_name, "Test User");

        let row = store.find_by_username_or_email("alice123").await.unwrap().unwrap();
        assert_ne!(row.password_hash, "Abcdefg1");
        assert!(row.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn invalid_form_touches_nothing() {
        let store = UserStore::in_memory().await;
        let mut bad = form("x", "a@b.co");
        bad.confirm_password = "nope".into();

        match register_user(&store, &bad).await {
            Err(AuthError::Validation(errors)) => {
                assert_eq!(errors[0].field, Field::Username);
                assert_eq!(errors[1].kind, ErrorKind::Mismatch);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(store.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn username_conflict_wins_over_email_conflict() {
        let store = UserStore::in_memory().await;
        register_user(&store, &form("bob", "bob@example.com")).await.unwrap();

        let err = register_user(&store, &form("bob", "bob@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(Field::Username)));

        let err = register_user(&store, &form("bobby", "bob@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(Field::Email)));

        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_registrations_yield_one_user() {
        let store = UserStore::in_memory().await;
        let a = form("racer", "r1@example.com");
        let b = form("racer", "r2@example.com");

        let (ra, rb) = tokio::join!(register_user(&store, &a), register_user(&store, &b));
        let outcomes = [ra, rb];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(AuthError::Conflict(Field::Username)))));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_by_username_or_email() {
        let store = UserStore::in_memory().await;
        let registered = register_user(&store, &form("alice123", "a@b.co")).await.unwrap();

        let by_name = authenticate(&store, &login("alice123", "Abcdefg1")).await.unwrap();
        let by_email = authenticate(&store, &login("a@b.co", "Abcdefg1")).await.unwrap();
        assert_eq!(by_name, registered);
        assert_eq!(by_email, registered);
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_look_the_same() {
        let store = UserStore::in_memory().await;
        register_user(&store, &form("alice123", "a@b.co")).await.unwrap();

        let unknown = authenticate(&store, &login("nouser", "whatever")).await.unwrap_err();
        let wrong = authenticate(&store, &login("alice123", "wrong")).await.unwrap_err();
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn parallel_logins_on_multi_thread_runtime() {
        let store = UserStore::in_memory().await;
        register_user(&store, &form("alice123", "a@b.co")).await.unwrap();

        let good = login("alice123", "Abcdefg1");
        let bad = login("alice123", "Abcdefg2");
        let (ok, rejected) = tokio::join!(authenticate(&store, &good), authenticate(&store, &bad));
        assert_eq!(ok.unwrap().username, "alice123");
        assert!(matches!(rejected, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_rejects_blank_fields() {
        let store = UserStore::in_memory().await;
        match authenticate(&store, &login(" ", "")).await {
            Err(AuthError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn legacy_plaintext_row_cannot_log_in() {
        let store = UserStore::in_memory().await;
        store
            .create_user(NewUser {
                username: "legacy",
                email: "legacy@example.com",
                password_hash: "Abcdefg1",
                full_name: "Old Timer",
            })
            .await
            .unwrap();

        let err = authenticate(&store, &login("legacy", "Abcdefg1")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
