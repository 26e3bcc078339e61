//! A budget-tracking web service for families and households.
//!
//! Users keep lists of budgets, record income and expense operations against
//! each budget, and can share a list with other users. Each budget stores a
//! running balance that is kept equal to its initial balance plus the signed
//! sum of its operations.
//!
//! This library provides a JSON REST API backed by SQLite.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod access;
mod app_state;
mod auth;
mod budget;
mod budget_list;
mod category;
mod database_id;
mod db;
pub mod endpoints;
mod json;
mod logging;
mod money;
mod operation;
mod password;
mod routing;
mod share;
mod title;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use money::{Amount, Money};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, Username, create_user, get_user_by_username};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username or password given at log-in did not match a registered user.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The request did not carry a valid auth cookie.
    #[error("authentication credentials were not provided or have expired")]
    Unauthenticated,

    /// The authenticated user is not allowed to perform the requested action.
    #[error("you do not have permission to perform this action")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty string was used as a username.
    #[error("username cannot be empty")]
    EmptyUsername,

    /// The username is already taken by another user.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// An empty string was used as a title.
    #[error("title cannot be empty")]
    EmptyTitle,

    /// A title was longer than the allowed number of characters.
    #[error("title cannot be longer than {0} characters")]
    TitleTooLong(usize),

    /// A monetary value had more than two decimal places or did not fit in
    /// the range that can be stored.
    #[error("{0} is not a valid amount of money, use at most two decimal places")]
    InvalidAmount(String),

    /// An operation amount was zero or negative.
    #[error("the amount must be greater than zero")]
    NonPositiveAmount,

    /// Applying an operation would push a budget balance out of the range
    /// that can be stored.
    #[error("the operation would overflow the budget balance")]
    BalanceOverflow,

    /// The currency code is not one of the supported currencies.
    #[error("\"{0}\" is not a supported currency")]
    InvalidCurrency(String),

    /// The operation type is neither income nor expense.
    #[error("\"{0}\" is not a valid operation type")]
    InvalidOperationType(String),

    /// A category with the given title already exists.
    #[error("a category with the title \"{0}\" already exists")]
    DuplicateCategory(String),

    /// No category has the given title.
    #[error("there is no category with the title \"{0}\"")]
    UnknownCategory(String),

    /// No user has the given username.
    #[error("there is no user with the username \"{0}\"")]
    UnknownUser(String),

    /// A user tried to share a list with themselves.
    #[error("you cannot share access to yourself")]
    SelfShare,

    /// The list has already been shared with the user.
    #[error("the list has already been shared with this user")]
    DuplicateShare,

    /// The request body could not be parsed.
    #[error("invalid request body: {0}")]
    InvalidRequestBody(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// The auth cookie expiry could not be computed or formatted.
    #[error("could not set the auth cookie expiry")]
    CookieExpiryError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequestBody(rejection.body_text())
    }
}

impl Error {
    /// The HTTP status code that a client should receive for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials | Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::TooWeak(_)
            | Error::EmptyUsername
            | Error::DuplicateUsername(_)
            | Error::EmptyTitle
            | Error::TitleTooLong(_)
            | Error::InvalidAmount(_)
            | Error::NonPositiveAmount
            | Error::BalanceOverflow
            | Error::InvalidCurrency(_)
            | Error::InvalidOperationType(_)
            | Error::DuplicateCategory(_)
            | Error::UnknownCategory(_)
            | Error::UnknownUser(_)
            | Error::SelfShare
            | Error::DuplicateShare
            | Error::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Error::HashingError(_)
            | Error::JSONSerializationError(_)
            | Error::CookieExpiryError
            | Error::SqlError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
