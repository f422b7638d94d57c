use log::info;
use uuid::Uuid;
use crate::api::{ ApiError, ChatApi };
use crate::models::api::Credentials;
use crate::session::SessionError;
use crate::storage::{ LocalStore, StorageError, AUTH_TOKEN_KEY, USER_ID_KEY };

/// Human-readable text for a failed register/login call: the server's
/// `error` field when present, otherwise `fallback`.
pub fn failure_text(err: &ApiError, fallback: &str) -> String {
    err.server_message().map(str::to_string).unwrap_or_else(|| fallback.to_string())
}

pub async fn register(api: &dyn ChatApi, email: &str, password: &str) -> Result<String, String> {
    let credentials = Credentials {
        email: email.to_string(),
        password: password.to_string(),
    };
    api.register(&credentials).await.map_err(|e| failure_text(&e, "Registration failed."))
}

pub async fn login(
    api: &dyn ChatApi,
    store: &dyn LocalStore,
    email: &str,
    password: &str
) -> Result<(), String> {
    let credentials = Credentials {
        email: email.to_string(),
        password: password.to_string(),
    };
    let token = api.login(&credentials).await.map_err(|e| failure_text(&e, "Login failed."))?;
    store.set(AUTH_TOKEN_KEY, &token).map_err(|e| e.to_string())?;
    info!("Logged in as {}", email);
    Ok(())
}

pub fn logout(store: &dyn LocalStore) -> Result<(), StorageError> {
    store.remove(AUTH_TOKEN_KEY)
}

pub fn require_token(store: &dyn LocalStore) -> Result<String, SessionError> {
    match store.get(AUTH_TOKEN_KEY)? {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(SessionError::NotLoggedIn),
    }
}

/// Returns the persisted user id, generating and storing one on first use.
pub fn ensure_user_id(store: &dyn LocalStore) -> Result<String, StorageError> {
    if let Some(id) = store.get(USER_ID_KEY)?.filter(|id| !id.is_empty()) {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    store.set(USER_ID_KEY, &id)?;
    info!("Generated new user id {}", id);
    Ok(id)
}
