//! This file defines the handler for log-in requests.
//! The cookie module handles the lower level authentication and cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Duration;

use crate::{
    AppState, Error, app_state::lock_connection, auth::set_auth_cookie, get_user_by_username,
    json::ApiJson,
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the client to log in.
#[derive(Clone, Debug, Deserialize)]
pub struct LogInData {
    /// The name the user registered with.
    pub username: String,
    /// The user's raw password.
    pub password: String,
    /// Whether to keep the user logged in for a week.
    #[serde(default)]
    pub remember_me: bool,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the user's ID
/// and username are returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username does not exist or the password is not correct ([Error::InvalidCredentials]).
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    ApiJson(user_data): ApiJson<LogInData>,
) -> Result<Response, Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_username(&user_data.username, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user
        .password_hash
        .verify(&user_data.password)
        .map_err(|error| {
            tracing::error!("Error verifying password: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if user_data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;

    tracing::info!("User {} logged in", user.id);

    Ok((
        StatusCode::OK,
        jar,
        ApiJson(json!({ "id": user.id, "username": user.username })),
    )
        .into_response())
}
