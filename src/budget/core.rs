//! Budgets hold a running balance in one currency.
//!
//! The balance column is seeded from the initial balance when a budget is
//! inserted and afterwards only changed by [crate::operation] when operations
//! are written.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, Transaction, TransactionBehavior,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error, Money, UserID,
    budget_list::BudgetList,
    database_id::{BudgetId, BudgetListId},
    title::Title,
};

/// The maximum number of characters in a budget title.
pub const BUDGET_TITLE_MAX_LENGTH: usize = 100;

/// The currencies a budget can be kept in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// United States dollar.
    Usd,
    /// Euro.
    Eur,
    /// Polish złoty.
    Pln,
}

impl Currency {
    /// The ISO 4217 code for the currency.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Pln => "PLN",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "PLN" => Ok(Currency::Pln),
            other => Err(Error::InvalidCurrency(other.to_owned())),
        }
    }
}

impl ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Currency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A budget in a list of budgets.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The list the budget belongs to.
    pub budget_list_id: BudgetListId,
    /// The owner of the list at the time the budget was created.
    pub owner: UserID,
    /// The display name of the budget.
    pub title: Title,
    /// The currency the balance is kept in.
    pub currency: Currency,
    /// The balance the budget started with.
    pub initial_balance: Money,
    /// The initial balance plus the signed amounts of all operations.
    pub balance: Money,
    /// When the budget was created.
    pub create_date: OffsetDateTime,
}

/// The client-settable fields of a new budget.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    /// The display name of the budget.
    pub title: Title,
    /// The currency the balance is kept in.
    pub currency: Currency,
    /// The balance to start with.
    pub initial_balance: Money,
}

/// Create the budget table.
///
/// The balance must stay an integer number of cents. SQLite turns integer
/// overflow into a float, which the check constraint rejects.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            budget_list_id INTEGER NOT NULL,
            owner_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            currency TEXT NOT NULL CHECK(currency IN ('USD', 'EUR', 'PLN')),
            initial_balance INTEGER NOT NULL,
            balance INTEGER NOT NULL CHECK(typeof(balance) = 'integer'),
            create_date TEXT NOT NULL,
            FOREIGN KEY(budget_list_id) REFERENCES budget_list(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_list ON budget(budget_list_id)",
        (),
    )?;

    Ok(())
}

const SELECT_BUDGET: &str = "SELECT id, budget_list_id, owner_id, title, currency, \
    initial_balance, balance, create_date FROM budget";

/// Map a row selected with the columns of `SELECT_BUDGET` to a [Budget].
pub fn map_row_to_budget(row: &Row) -> Result<Budget, rusqlite::Error> {
    let title: String = row.get(3)?;

    Ok(Budget {
        id: row.get(0)?,
        budget_list_id: row.get(1)?,
        owner: row.get(2)?,
        title: Title::new_unchecked(&title),
        currency: row.get(4)?,
        initial_balance: row.get(5)?,
        balance: row.get(6)?,
        create_date: row.get(7)?,
    })
}

/// Create a budget in `list`.
///
/// The budget's owner is the list's owner and its balance starts at the
/// initial balance.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the budget could not be inserted.
pub fn create_budget(
    list: &BudgetList,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    let create_date = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO budget
            (budget_list_id, owner_id, title, currency, initial_balance, balance, create_date)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6)",
        (
            list.id,
            list.owner,
            new_budget.title.as_ref(),
            new_budget.currency,
            new_budget.initial_balance,
            create_date,
        ),
    )?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        budget_list_id: list.id,
        owner: list.owner,
        title: new_budget.title,
        currency: new_budget.currency,
        initial_balance: new_budget.initial_balance,
        balance: new_budget.initial_balance,
        create_date,
    })
}

/// Get the budget with `budget_id` in the list with `list_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such budget in that list.
pub fn get_budget(
    list_id: BudgetListId,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .query_row(
            &format!("{SELECT_BUDGET} WHERE id = ?1 AND budget_list_id = ?2"),
            (budget_id, list_id),
            map_row_to_budget,
        )
        .map_err(Error::from)
}

/// Get the budgets in the list with `list_id`, oldest first.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_budgets(list_id: BudgetListId, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_BUDGET} WHERE budget_list_id = ?1 ORDER BY create_date, id"
        ))?
        .query_map([list_id], map_row_to_budget)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Change the title and currency of a budget.
///
/// The balances are left untouched.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such budget in that list.
pub fn update_budget(
    list_id: BudgetListId,
    budget_id: BudgetId,
    title: Title,
    currency: Currency,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .query_row(
            "UPDATE budget SET title = ?1, currency = ?2
            WHERE id = ?3 AND budget_list_id = ?4
            RETURNING id, budget_list_id, owner_id, title, currency,
                initial_balance, balance, create_date",
            (title.as_ref(), currency, budget_id, list_id),
            map_row_to_budget,
        )
        .map_err(Error::from)
}

/// Delete a budget and its operations in one transaction.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no such budget in that list.
pub fn delete_budget(
    list_id: BudgetListId,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "DELETE FROM budget_operation WHERE budget_id IN
            (SELECT id FROM budget WHERE id = ?1 AND budget_list_id = ?2)",
        (budget_id, list_id),
    )?;
    let rows_affected = transaction.execute(
        "DELETE FROM budget WHERE id = ?1 AND budget_list_id = ?2",
        (budget_id, list_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    Ok(())
}


#[cfg(test)]
mod budget_tests {
    use crate::{
        Error, Money,
        budget_list::{BudgetList, create_budget_list},
        share::create_share,
        test_utils::{create_test_user, get_test_connection},
        title::Title,
    };

    use super::{
        Currency, NewBudget, create_budget, delete_budget, get_budget, get_budgets,
        update_budget,
    };

    fn new_budget(title: &str, initial_cents: i64) -> NewBudget {
        NewBudget {
            title: Title::new_unchecked(title),
            currency: Currency::Usd,
            initial_balance: Money::from_cents(initial_cents),
        }
    }

    fn create_list(connection: &rusqlite::Connection) -> BudgetList {
        let alice = create_test_user("alice", connection);

        create_budget_list(Title::new_unchecked("Home"), alice.id, connection).unwrap()
    }

    #[test]
    fn balance_starts_at_initial_balance() {
        let connection = get_test_connection();
        let list = create_list(&connection);

        let budget = create_budget(&list, new_budget("Food", 500_000), &connection).unwrap();

        let stored = get_budget(list.id, budget.id, &connection).unwrap();
        assert_eq!(stored.balance, Money::from_cents(500_000));
        assert_eq!(stored.initial_balance, Money::from_cents(500_000));
        assert_eq!(stored, budget);
    }

    #[test]
    fn owner_is_copied_from_list_owner() {
        let connection = get_test_connection();
        let list = create_list(&connection);
        let bob = create_test_user("bob", &connection);
        create_share(&list, bob.id, &connection).unwrap();

        let budget = create_budget(&list, new_budget("Food", 0), &connection).unwrap();

        assert_eq!(budget.owner, list.owner);
    }

    #[test]
    fn budget_in_other_list_is_not_found() {
        let connection = get_test_connection();
        let list = create_list(&connection);
        let other_list =
            create_budget_list(Title::new_unchecked("Other"), list.owner, &connection).unwrap();
        let budget = create_budget(&list, new_budget("Food", 0), &connection).unwrap();

        assert_eq!(
            get_budget(other_list.id, budget.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_budgets_returns_only_budgets_in_list() {
        let connection = get_test_connection();
        let list = create_list(&connection);
        let other_list =
            create_budget_list(Title::new_unchecked("Other"), list.owner, &connection).unwrap();
        let food = create_budget(&list, new_budget("Food", 0), &connection).unwrap();
        let rent = create_budget(&list, new_budget("Rent", 0), &connection).unwrap();
        create_budget(&other_list, new_budget("Fun", 0), &connection).unwrap();

        assert_eq!(get_budgets(list.id, &connection), Ok(vec![food, rent]));
    }

    #[test]
    fn update_changes_title_and_currency_only() {
        let connection = get_test_connection();
        let list = create_list(&connection);
        let budget = create_budget(&list, new_budget("Food", 1234), &connection).unwrap();

        let updated = update_budget(
            list.id,
            budget.id,
            Title::new_unchecked("Groceries"),
            Currency::Eur,
            &connection,
        )
        .unwrap();

        assert_eq!(updated.title.as_ref(), "Groceries");
        assert_eq!(updated.currency, Currency::Eur);
        assert_eq!(updated.initial_balance, budget.initial_balance);
        assert_eq!(updated.balance, budget.balance);
        assert_eq!(updated.create_date, budget.create_date);
    }

    #[test]
    fn delete_removes_budget() {
        let connection = get_test_connection();
        let list = create_list(&connection);
        let budget = create_budget(&list, new_budget("Food", 0), &connection).unwrap();

        delete_budget(list.id, budget.id, &connection).unwrap();

        assert_eq!(get_budget(list.id, budget.id, &connection), Err(Error::NotFound));
        assert_eq!(
            delete_budget(list.id, budget.id, &connection),
            Err(Error::NotFound)
        );
    }
}
