//! Helpers shared by the unit tests.

use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, PasswordHash, User, Username, ValidatedPassword, app_state::lock_connection,
    auth::COOKIE_TOKEN, build_router, create_user, endpoints,
};

/// A password that passes the strength check.
pub const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// The lowest cost bcrypt accepts, used to keep the tests fast.
const TEST_HASH_COST: u32 = 4;

/// An initialized in-memory database.
pub fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    crate::initialize_db(&connection).expect("Could not initialize database");

    connection
}

/// App state backed by an in-memory database.
pub fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    let mut state = AppState::new(connection, "42").expect("Could not create app state");
    state.password_hash_cost = TEST_HASH_COST;

    state
}

/// Insert a user whose password is [TEST_PASSWORD].
pub fn insert_test_user(username: &str, state: &AppState) -> User {
    let connection = lock_connection(&state.db_connection).unwrap();

    create_test_user(username, &connection)
}

/// Insert a user whose password is [TEST_PASSWORD].
pub fn create_test_user(username: &str, connection: &Connection) -> User {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_HASH_COST,
    )
    .unwrap();

    create_user(Username::new_unchecked(username), password_hash, connection).unwrap()
}

/// A server running the full application router.
pub fn get_test_server() -> (TestServer, AppState) {
    let state = get_test_app_state();
    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    (server, state)
}

/// Register `username` and log them in, returning the auth cookie.
pub async fn sign_up(server: &TestServer, username: &str) -> Cookie<'static> {
    server
        .post(endpoints::USERS)
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    response.cookie(COOKIE_TOKEN)
}
