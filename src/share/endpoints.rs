//! Route handlers for sharing a list with other users.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserID,
    access::{AccessRequest, Action, Policy, authorize},
    app_state::lock_connection,
    budget_list::get_budget_list,
    database_id::{BudgetListId, ShareId},
    get_user_by_username,
    json::ApiJson,
    share::core::{Share, create_share, delete_share, get_share, get_shares},
};

/// The state needed for the share endpoints.
#[derive(Debug, Clone)]
pub struct ShareState {
    /// The database connection for managing shares.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ShareState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for sharing a list.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareData {
    /// The username of the user to share the list with.
    pub user: String,
}

/// List who a list has been shared with.
pub async fn get_shares_endpoint(
    State(state): State<ShareState>,
    Extension(user_id): Extension<UserID>,
    Path(list_id): Path<BudgetListId>,
) -> Result<ApiJson<Vec<Share>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let list = get_budget_list(list_id, &connection)?;
    authorize(
        &[Policy::AdmittedOrOwner],
        &AccessRequest {
            user: user_id,
            action: Action::Read,
            list: &list,
            resource_owner: None,
        },
        &connection,
    )?;

    get_shares(list.id, &connection).map(ApiJson)
}

/// Share a list with another user. Only the list's owner may do this.
pub async fn create_share_endpoint(
    State(state): State<ShareState>,
    Extension(user_id): Extension<UserID>,
    Path(list_id): Path<BudgetListId>,
    ApiJson(data): ApiJson<ShareData>,
) -> Result<(StatusCode, ApiJson<Share>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let list = get_budget_list(list_id, &connection)?;
    authorize(
        &[Policy::AdmittedOrOwner],
        &AccessRequest {
            user: user_id,
            action: Action::Write,
            list: &list,
            resource_owner: None,
        },
        &connection,
    )?;

    if list.owner != user_id {
        tracing::warn!("User {user_id} tried to share list {list_id} which they do not own");
        return Err(Error::Forbidden);
    }

    let grantee = match get_user_by_username(&data.user, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::UnknownUser(data.user)),
        Err(error) => return Err(error),
    };

    let share = create_share(&list, grantee.id, &connection)?;

    Ok((StatusCode::CREATED, ApiJson(share)))
}

/// Get a single share of a list.
pub async fn get_share_endpoint(
    State(state): State<ShareState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, share_id)): Path<(BudgetListId, ShareId)>,
) -> Result<ApiJson<Share>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let list = get_budget_list(list_id, &connection)?;
    let share = get_share(list.id, share_id, &connection)?;
    authorize(
        &[Policy::AdmittedOrOwner],
        &AccessRequest {
            user: user_id,
            action: Action::Read,
            list: &list,
            resource_owner: Some(share.owner),
        },
        &connection,
    )?;

    Ok(ApiJson(share))
}

/// Revoke a share. Only the owner who granted it may do this.
pub async fn delete_share_endpoint(
    State(state): State<ShareState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, share_id)): Path<(BudgetListId, ShareId)>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let list = get_budget_list(list_id, &connection)?;
    let share = get_share(list.id, share_id, &connection)?;
    authorize(
        &[Policy::AdmittedOrOwner, Policy::OnlyOwnerDelete],
        &AccessRequest {
            user: user_id,
            action: Action::Delete,
            list: &list,
            resource_owner: Some(share.owner),
        },
        &connection,
    )?;

    delete_share(list.id, share.id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod share_endpoint_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        Error,
        endpoints::{self, format_endpoint, format_nested_endpoint},
        test_utils::{get_test_server, sign_up},
    };

    async fn create_list(server: &TestServer, cookie: &Cookie<'static>) -> i64 {
        let response = server
            .post(endpoints::LISTS)
            .add_cookie(cookie.clone())
            .json(&json!({ "title": "Home" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn owner_can_share_and_revoke() {
        let (server, _) = get_test_server();
        let alice = sign_up(&server, "alice").await;
        let bob = sign_up(&server, "bob").await;
        let list_id = create_list(&server, &alice).await;
        let shares_path = format_endpoint(endpoints::SHARES, list_id);

        let response = server
            .post(&shares_path)
            .add_cookie(alice.clone())
            .json(&json!({ "user": "bob" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let share: Value = response.json();
        assert_eq!(share["user"], "bob");
        let share_id = share["id"].as_i64().unwrap();

        server
            .get(&shares_path)
            .add_cookie(bob.clone())
            .await
            .assert_json(&json!([{ "id": share_id, "user": "bob" }]));

        let share_path = format_nested_endpoint(endpoints::SHARE, &[list_id, share_id]);
        server
            .delete(&share_path)
            .add_cookie(bob.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .delete(&share_path)
            .add_cookie(alice)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format_endpoint(endpoints::LIST, list_id))
            .add_cookie(bob)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn self_share_is_rejected() {
        let (server, _) = get_test_server();
        let alice = sign_up(&server, "alice").await;
        let list_id = create_list(&server, &alice).await;

        let response = server
            .post(&format_endpoint(endpoints::SHARES, list_id))
            .add_cookie(alice)
            .json(&json!({ "user": "alice" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": Error::SelfShare.to_string() }));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let (server, _) = get_test_server();
        let alice = sign_up(&server, "alice").await;
        let list_id = create_list(&server, &alice).await;

        let response = server
            .post(&format_endpoint(endpoints::SHARES, list_id))
            .add_cookie(alice)
            .json(&json!({ "user": "nobody" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({
            "error": Error::UnknownUser("nobody".to_owned()).to_string()
        }));
    }

    #[tokio::test]
    async fn shared_user_cannot_share_further() {
        let (server, _) = get_test_server();
        let alice = sign_up(&server, "alice").await;
        let bob = sign_up(&server, "bob").await;
        sign_up(&server, "carol").await;
        let list_id = create_list(&server, &alice).await;
        let shares_path = format_endpoint(endpoints::SHARES, list_id);
        server
            .post(&shares_path)
            .add_cookie(alice)
            .json(&json!({ "user": "bob" }))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .post(&shares_path)
            .add_cookie(bob)
            .json(&json!({ "user": "carol" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn duplicate_share_is_rejected() {
        let (server, _) = get_test_server();
        let alice = sign_up(&server, "alice").await;
        sign_up(&server, "bob").await;
        let list_id = create_list(&server, &alice).await;
        let shares_path = format_endpoint(endpoints::SHARES, list_id);
        server
            .post(&shares_path)
            .add_cookie(alice.clone())
            .json(&json!({ "user": "bob" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(&shares_path)
            .add_cookie(alice)
            .json(&json!({ "user": "bob" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": Error::DuplicateShare.to_string() }));
    }
}
