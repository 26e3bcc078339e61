//! Route handlers for the operations of a budget.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    Amount, AppState, Error, UserID,
    access::{AccessRequest, Action, Policy, authorize},
    app_state::lock_connection,
    budget::{Budget, resolve_budget},
    budget_list::BudgetList,
    category::get_category_id_by_title,
    database_id::{BudgetId, BudgetListId, OperationId},
    json::ApiJson,
    operation::{
        balance::{create_operation, delete_operation, update_operation},
        core::{NewOperation, Operation, get_operation},
        query::{OperationFilter, get_operations},
    },
};

/// The state needed for the operation endpoints.
#[derive(Debug, Clone)]
pub struct OperationState {
    /// The database connection for managing operations.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for OperationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating or updating an operation.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationData {
    /// `Income` or `Expense`.
    pub operation_type: String,
    /// A positive amount with at most two decimal places.
    pub amount: Decimal,
    /// The title of an existing category.
    #[serde(default)]
    pub category: Option<String>,
    /// Free-form text.
    #[serde(default)]
    pub note: Option<String>,
}

impl OperationData {
    fn validate(self, connection: &Connection) -> Result<NewOperation, Error> {
        let operation_type = self.operation_type.parse()?;
        let amount = Amount::new(self.amount)?;
        let category = self
            .category
            .map(|title| get_category_id_by_title(&title, connection))
            .transpose()?;

        Ok(NewOperation {
            operation_type,
            amount,
            category,
            note: self.note,
        })
    }
}

/// The query string for filtering operations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationQuery {
    /// Text that the category title must contain.
    pub category: Option<String>,
    /// `Income` or `Expense`.
    pub operation_type: Option<String>,
}

impl TryFrom<OperationQuery> for OperationFilter {
    type Error = Error;

    fn try_from(query: OperationQuery) -> Result<Self, Self::Error> {
        let operation_type = query
            .operation_type
            .filter(|value| !value.is_empty())
            .map(|value| value.parse())
            .transpose()?;

        Ok(Self {
            category: query.category.filter(|value| !value.is_empty()),
            operation_type,
        })
    }
}

fn authorize_operation(
    user_id: UserID,
    action: Action,
    list: &BudgetList,
    budget: &Budget,
    connection: &Connection,
) -> Result<(), Error> {
    authorize(
        &[Policy::AdmittedOrOwner, Policy::OnlyOwnerDelete],
        &AccessRequest {
            user: user_id,
            action,
            list,
            // Operations belong to the budget's owner, whoever recorded them.
            resource_owner: Some(budget.owner),
        },
        connection,
    )
}

/// List a budget's operations, optionally filtered by category and type.
pub async fn get_operations_endpoint(
    State(state): State<OperationState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, budget_id)): Path<(BudgetListId, BudgetId)>,
    Query(query): Query<OperationQuery>,
) -> Result<ApiJson<Vec<Operation>>, Error> {
    let filter = OperationFilter::try_from(query)?;

    let connection = lock_connection(&state.db_connection)?;
    let (list, budget) = resolve_budget(list_id, budget_id, &connection)?;
    authorize_operation(user_id, Action::Read, &list, &budget, &connection)?;

    get_operations(budget.id, &filter, &connection).map(ApiJson)
}

/// Record an operation and apply it to the budget's balance.
pub async fn create_operation_endpoint(
    State(state): State<OperationState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, budget_id)): Path<(BudgetListId, BudgetId)>,
    ApiJson(data): ApiJson<OperationData>,
) -> Result<(StatusCode, ApiJson<Operation>), Error> {
    let connection = lock_connection(&state.db_connection)?;
    let (list, budget) = resolve_budget(list_id, budget_id, &connection)?;
    authorize_operation(user_id, Action::Write, &list, &budget, &connection)?;

    let new_operation = data.validate(&connection)?;
    let operation = create_operation(&budget, new_operation, user_id, &connection)?;

    Ok((StatusCode::CREATED, ApiJson(operation)))
}

/// Get a single operation.
pub async fn get_operation_endpoint(
    State(state): State<OperationState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, budget_id, operation_id)): Path<(BudgetListId, BudgetId, OperationId)>,
) -> Result<ApiJson<Operation>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let (list, budget) = resolve_budget(list_id, budget_id, &connection)?;
    let operation = get_operation(budget.id, operation_id, &connection)?;
    authorize_operation(user_id, Action::Read, &list, &budget, &connection)?;

    Ok(ApiJson(operation))
}

/// Replace an operation and move the budget's balance accordingly.
pub async fn update_operation_endpoint(
    State(state): State<OperationState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, budget_id, operation_id)): Path<(BudgetListId, BudgetId, OperationId)>,
    ApiJson(data): ApiJson<OperationData>,
) -> Result<ApiJson<Operation>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let (list, budget) = resolve_budget(list_id, budget_id, &connection)?;
    get_operation(budget.id, operation_id, &connection)?;
    authorize_operation(user_id, Action::Write, &list, &budget, &connection)?;

    let changes = data.validate(&connection)?;

    update_operation(&budget, operation_id, changes, user_id, &connection).map(ApiJson)
}

/// Delete an operation and reverse its effect on the budget's balance.
pub async fn delete_operation_endpoint(
    State(state): State<OperationState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, budget_id, operation_id)): Path<(BudgetListId, BudgetId, OperationId)>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let (list, budget) = resolve_budget(list_id, budget_id, &connection)?;
    get_operation(budget.id, operation_id, &connection)?;
    authorize_operation(user_id, Action::Delete, &list, &budget, &connection)?;

    delete_operation(&budget, operation_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
