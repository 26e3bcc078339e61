//! Database initialization.

use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, budget::create_budget_table, budget_list::create_budget_list_table,
    category::create_category_table, operation::create_operation_table,
    share::create_share_table, user::create_user_table,
};

/// How long a connection waits for another connection's write lock before
/// giving up with a busy error.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create all the application tables if they do not already exist.
///
/// Also enables foreign key enforcement, which SQLite leaves off by default
/// and which the cascade and set-null rules depend on.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;
    connection.busy_timeout(BUSY_TIMEOUT)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_budget_list_table(&transaction)?;
    create_category_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_operation_table(&transaction)?;
    create_share_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
