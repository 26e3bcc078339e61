//! The registration handler that creates new users.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error, PasswordHash, Username, ValidatedPassword, app_state::lock_connection,
    create_user, json::ApiJson,
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost for hashing new passwords.
    pub password_hash_cost: u32,
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for a new user.
#[derive(Clone, Debug, Deserialize)]
pub struct RegisterData {
    /// The name the user will log in with.
    pub username: String,
    /// The user's raw password.
    pub password: String,
}

/// Create a new user and respond with their ID and username.
///
/// # Errors
///
/// Returns an error if:
/// - the username is empty ([Error::EmptyUsername]) or taken ([Error::DuplicateUsername]),
/// - the password is too weak ([Error::TooWeak]),
/// - or the password could not be hashed or the user could not be stored.
pub async fn register_user(
    State(state): State<RegistrationState>,
    ApiJson(user_data): ApiJson<RegisterData>,
) -> Result<Response, Error> {
    let username = Username::new(&user_data.username)?;
    let password = ValidatedPassword::new(&user_data.password, &[username.as_ref()])?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let user = create_user(
        username,
        password_hash,
        &*lock_connection(&state.db_connection)?,
    )?;

    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        ApiJson(json!({ "id": user.id, "username": user.username })),
    )
        .into_response())
}
