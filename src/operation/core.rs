//! Income and expense operations recorded against a budget.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Amount, Error, Money, UserID,
    database_id::{BudgetId, CategoryId, OperationId},
};

/// Whether an operation adds money to a budget or takes it away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperationType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl OperationType {
    /// `1` for income and `-1` for expenses.
    pub const fn sign(&self) -> i64 {
        match self {
            OperationType::Income => 1,
            OperationType::Expense => -1,
        }
    }

    /// The change `amount` makes to a budget balance for this type of operation.
    pub const fn signed(&self, amount: Amount) -> Money {
        // Amounts are positive so negating them cannot overflow.
        Money::from_cents(self.sign() * amount.money().cents())
    }

    /// The name used in the API and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Income => "Income",
            OperationType::Expense => "Expense",
        }
    }
}

impl Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Income" => Ok(OperationType::Income),
            "Expense" => Ok(OperationType::Expense),
            other => Err(Error::InvalidOperationType(other.to_owned())),
        }
    }
}

impl ToSql for OperationType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for OperationType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An income or expense recorded against a budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    /// The ID of the operation.
    pub id: OperationId,
    /// The budget whose balance the operation changes.
    #[serde(skip)]
    pub budget_id: BudgetId,
    /// Whether the amount is added to or taken from the balance.
    pub operation_type: OperationType,
    /// The title of the operation's category, if it has one.
    pub category: Option<String>,
    /// How much money changed hands.
    pub amount: Amount,
    /// Free-form text from the user.
    pub note: Option<String>,
    /// The user who last wrote the operation.
    pub user: UserID,
    /// When the operation was last written.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// The client-settable fields of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOperation {
    /// Whether the amount is added to or taken from the balance.
    pub operation_type: OperationType,
    /// How much money changed hands.
    pub amount: Amount,
    /// The category to file the operation under.
    pub category: Option<CategoryId>,
    /// Free-form text from the user.
    pub note: Option<String>,
}

/// Create the operation table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_operation_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget_operation (
            id INTEGER PRIMARY KEY,
            budget_id INTEGER NOT NULL,
            operation_type TEXT NOT NULL CHECK(operation_type IN ('Income', 'Expense')),
            category_id INTEGER,
            amount INTEGER NOT NULL CHECK(amount > 0),
            note TEXT,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            FOREIGN KEY(budget_id) REFERENCES budget(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_operation_budget
        ON budget_operation(budget_id, date)",
        (),
    )?;

    Ok(())
}

/// Selects the columns read by [map_row_to_operation].
pub(super) const SELECT_OPERATION: &str = "SELECT budget_operation.id, \
    budget_operation.budget_id, budget_operation.operation_type, category.title, \
    budget_operation.amount, budget_operation.note, budget_operation.user_id, \
    budget_operation.date \
    FROM budget_operation LEFT JOIN category ON category.id = budget_operation.category_id";

pub(super) fn map_row_to_operation(row: &Row) -> Result<Operation, rusqlite::Error> {
    Ok(Operation {
        id: row.get(0)?,
        budget_id: row.get(1)?,
        operation_type: row.get(2)?,
        category: row.get(3)?,
        amount: row.get(4)?,
        note: row.get(5)?,
        user: row.get(6)?,
        date: row.get(7)?,
    })
}

/// Get the operation with `operation_id` belonging to the budget with `budget_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the budget has no such operation.
pub fn get_operation(
    budget_id: BudgetId,
    operation_id: OperationId,
    connection: &Connection,
) -> Result<Operation, Error> {
    connection
        .query_row(
            &format!(
                "{SELECT_OPERATION} WHERE budget_operation.id = ?1 \
                AND budget_operation.budget_id = ?2"
            ),
            (operation_id, budget_id),
            map_row_to_operation,
        )
        .map_err(Error::from)
}
