//! Route handlers for the budgets in a list.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error, Money, UserID,
    access::{AccessRequest, Action, Policy, authorize},
    app_state::lock_connection,
    budget::core::{
        BUDGET_TITLE_MAX_LENGTH, Budget, Currency, NewBudget, create_budget, delete_budget,
        get_budget, get_budgets, update_budget,
    },
    budget_list::{BudgetList, get_budget_list},
    database_id::{BudgetId, BudgetListId},
    json::ApiJson,
    operation::{Operation, OperationFilter, get_operations},
    title::Title,
};

/// The state needed for the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A budget as shown inside a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    id: BudgetId,
    title: Title,
    balance: Money,
    currency: Currency,
    #[serde(with = "time::serde::rfc3339")]
    create_date: OffsetDateTime,
}

impl From<&Budget> for BudgetSummary {
    fn from(budget: &Budget) -> Self {
        Self {
            id: budget.id,
            title: budget.title.clone(),
            balance: budget.balance,
            currency: budget.currency,
            create_date: budget.create_date,
        }
    }
}

/// The response to creating a budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedBudget {
    id: BudgetId,
    title: Title,
    currency: Currency,
    initial_balance: Money,
}

/// A budget with its operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetDetail {
    id: BudgetId,
    title: Title,
    balance: Money,
    currency: Currency,
    budget_operations: Vec<Operation>,
}

impl BudgetDetail {
    fn load(budget: Budget, connection: &Connection) -> Result<Self, Error> {
        let budget_operations =
            get_operations(budget.id, &OperationFilter::default(), connection)?;

        Ok(Self {
            id: budget.id,
            title: budget.title,
            balance: budget.balance,
            currency: budget.currency,
            budget_operations,
        })
    }
}

/// The request body for creating a budget.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBudgetData {
    /// The display name of the budget.
    pub title: String,
    /// One of `USD`, `EUR` or `PLN`.
    pub currency: String,
    /// The starting balance. Defaults to zero.
    #[serde(default)]
    pub initial_balance: Option<Decimal>,
}

/// The request body for updating a budget.
///
/// The initial balance cannot be changed, so it is ignored if sent.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBudgetData {
    /// The display name of the budget.
    pub title: String,
    /// One of `USD`, `EUR` or `PLN`.
    pub currency: String,
}

/// Look up a list and one of its budgets.
///
/// # Errors
///
/// Returns [Error::NotFound] if the list does not exist or the budget is not in it.
pub fn resolve_budget(
    list_id: BudgetListId,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<(BudgetList, Budget), Error> {
    let list = get_budget_list(list_id, connection)?;
    let budget = get_budget(list.id, budget_id, connection)?;

    Ok((list, budget))
}

fn authorize_list(
    user_id: UserID,
    action: Action,
    list: &BudgetList,
    resource_owner: Option<UserID>,
    connection: &Connection,
) -> Result<(), Error> {
    authorize(
        &[Policy::AdmittedOrOwner, Policy::OnlyOwnerDelete],
        &AccessRequest {
            user: user_id,
            action,
            list,
            resource_owner,
        },
        connection,
    )
}

/// List the budgets in a list.
pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(list_id): Path<BudgetListId>,
) -> Result<ApiJson<Vec<BudgetSummary>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let list = get_budget_list(list_id, &connection)?;
    authorize_list(user_id, Action::Read, &list, None, &connection)?;

    let budgets = get_budgets(list.id, &connection)?;

    Ok(ApiJson(budgets.iter().map(BudgetSummary::from).collect()))
}

/// Create a budget in a list.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(list_id): Path<BudgetListId>,
    ApiJson(data): ApiJson<CreateBudgetData>,
) -> Result<(StatusCode, ApiJson<CreatedBudget>), Error> {
    let new_budget = NewBudget {
        title: Title::new(&data.title, BUDGET_TITLE_MAX_LENGTH)?,
        currency: data.currency.parse()?,
        initial_balance: data
            .initial_balance
            .map(Money::from_decimal)
            .transpose()?
            .unwrap_or(Money::ZERO),
    };

    let connection = lock_connection(&state.db_connection)?;
    let list = get_budget_list(list_id, &connection)?;
    authorize_list(user_id, Action::Write, &list, None, &connection)?;

    let budget = create_budget(&list, new_budget, &connection)?;

    Ok((
        StatusCode::CREATED,
        ApiJson(CreatedBudget {
            id: budget.id,
            title: budget.title,
            currency: budget.currency,
            initial_balance: budget.initial_balance,
        }),
    ))
}

/// Get a budget with its operations.
pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, budget_id)): Path<(BudgetListId, BudgetId)>,
) -> Result<ApiJson<BudgetDetail>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let (list, budget) = resolve_budget(list_id, budget_id, &connection)?;
    authorize_list(user_id, Action::Read, &list, Some(budget.owner), &connection)?;

    BudgetDetail::load(budget, &connection).map(ApiJson)
}

/// Change the title and currency of a budget.
pub async fn update_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, budget_id)): Path<(BudgetListId, BudgetId)>,
    ApiJson(data): ApiJson<UpdateBudgetData>,
) -> Result<ApiJson<BudgetDetail>, Error> {
    let title = Title::new(&data.title, BUDGET_TITLE_MAX_LENGTH)?;
    let currency: Currency = data.currency.parse()?;

    let connection = lock_connection(&state.db_connection)?;
    let (list, budget) = resolve_budget(list_id, budget_id, &connection)?;
    authorize_list(user_id, Action::Write, &list, Some(budget.owner), &connection)?;

    let budget = update_budget(list.id, budget.id, title, currency, &connection)?;

    BudgetDetail::load(budget, &connection).map(ApiJson)
}

/// Delete a budget and its operations. Only the budget's owner may do this.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path((list_id, budget_id)): Path<(BudgetListId, BudgetId)>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let (list, budget) = resolve_budget(list_id, budget_id, &connection)?;
    authorize_list(user_id, Action::Delete, &list, Some(budget.owner), &connection)?;

    delete_budget(list.id, budget.id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
