//! Route handlers for lists of budgets.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, UserID, Username,
    access::{AccessRequest, Action, Policy, authorize},
    app_state::lock_connection,
    budget::{BudgetSummary, get_budgets},
    budget_list::core::{
        BUDGET_LIST_TITLE_MAX_LENGTH, BudgetList, create_budget_list, delete_budget_list,
        get_budget_list, get_visible_budget_lists, update_budget_list_title,
    },
    database_id::BudgetListId,
    json::ApiJson,
    title::Title,
    user::get_username,
};

/// The policies for a single list.
const LIST_POLICIES: [Policy; 2] = [Policy::AdmittedOrOwner, Policy::OnlyOwnerDelete];

/// The state needed for the list endpoints.
#[derive(Debug, Clone)]
pub struct BudgetListState {
    /// The database connection for managing lists.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating or renaming a list.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetListData {
    /// The new title.
    pub title: String,
}

/// A list as returned by the API, with its budgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetListView {
    id: BudgetListId,
    title: Title,
    owner: Username,
    budgets: Vec<BudgetSummary>,
}

fn build_view(list: BudgetList, connection: &Connection) -> Result<BudgetListView, Error> {
    let owner = get_username(list.owner, connection)?;
    let budgets = get_budgets(list.id, connection)?
        .iter()
        .map(BudgetSummary::from)
        .collect();

    Ok(BudgetListView {
        id: list.id,
        title: list.title,
        owner,
        budgets,
    })
}

fn get_authorized_list(
    list_id: BudgetListId,
    user_id: UserID,
    action: Action,
    connection: &Connection,
) -> Result<BudgetList, Error> {
    let list = get_budget_list(list_id, connection)?;
    authorize(
        &LIST_POLICIES,
        &AccessRequest {
            user: user_id,
            action,
            list: &list,
            resource_owner: None,
        },
        connection,
    )?;

    Ok(list)
}

/// List the lists the user owns or has been given access to.
pub async fn get_lists_endpoint(
    State(state): State<BudgetListState>,
    Extension(user_id): Extension<UserID>,
) -> Result<ApiJson<Vec<BudgetListView>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_visible_budget_lists(user_id, &connection)?
        .into_iter()
        .map(|list| build_view(list, &connection))
        .collect::<Result<_, _>>()
        .map(ApiJson)
}

/// Create a list owned by the user.
pub async fn create_list_endpoint(
    State(state): State<BudgetListState>,
    Extension(user_id): Extension<UserID>,
    ApiJson(data): ApiJson<BudgetListData>,
) -> Result<(StatusCode, ApiJson<BudgetListView>), Error> {
    let title = Title::new(&data.title, BUDGET_LIST_TITLE_MAX_LENGTH)?;
    let connection = lock_connection(&state.db_connection)?;

    let list = create_budget_list(title, user_id, &connection)?;
    tracing::debug!("User {user_id} created list {}", list.id);

    Ok((StatusCode::CREATED, ApiJson(build_view(list, &connection)?)))
}

/// Get a single list with its budgets.
pub async fn get_list_endpoint(
    State(state): State<BudgetListState>,
    Extension(user_id): Extension<UserID>,
    Path(list_id): Path<BudgetListId>,
) -> Result<ApiJson<BudgetListView>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let list = get_authorized_list(list_id, user_id, Action::Read, &connection)?;

    build_view(list, &connection).map(ApiJson)
}

/// Rename a list.
pub async fn update_list_endpoint(
    State(state): State<BudgetListState>,
    Extension(user_id): Extension<UserID>,
    Path(list_id): Path<BudgetListId>,
    ApiJson(data): ApiJson<BudgetListData>,
) -> Result<ApiJson<BudgetListView>, Error> {
    let title = Title::new(&data.title, BUDGET_LIST_TITLE_MAX_LENGTH)?;
    let connection = lock_connection(&state.db_connection)?;
    let list = get_authorized_list(list_id, user_id, Action::Write, &connection)?;

    let list = update_budget_list_title(list.id, title, &connection)?;

    build_view(list, &connection).map(ApiJson)
}

/// Delete a list with everything in it. Only the owner may do this.
pub async fn delete_list_endpoint(
    State(state): State<BudgetListState>,
    Extension(user_id): Extension<UserID>,
    Path(list_id): Path<BudgetListId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let list = get_authorized_list(list_id, user_id, Action::Delete, &connection)?;

    delete_budget_list(list.id, &connection)?;
    tracing::info!("User {user_id} deleted list {list_id}");

    Ok(StatusCode::NO_CONTENT)
}
