//! Writes operations and keeps the parent budget's balance in step.
//!
//! Every write runs in a single `IMMEDIATE` transaction so the balance
//! adjustment and the operation row are committed together, and concurrent
//! writers to the same budget are serialized. The balance is adjusted in SQL
//! with `balance = balance + delta` rather than by writing back a value read
//! earlier.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use time::OffsetDateTime;

use crate::{
    Amount, Error, Money, UserID,
    budget::Budget,
    database_id::{BudgetId, OperationId},
    operation::core::{NewOperation, Operation, OperationType, get_operation},
};

/// Add `delta` to the balance of the budget with `budget_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the budget does not exist and
/// [Error::BalanceOverflow] if the new balance cannot be stored.
fn adjust_balance(
    transaction: &Transaction,
    budget_id: BudgetId,
    delta: Money,
) -> Result<(), Error> {
    let rows_affected = transaction
        .execute(
            "UPDATE budget SET balance = balance + ?1 WHERE id = ?2",
            (delta, budget_id),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_CHECK,
                },
                _,
            ) => Error::BalanceOverflow,
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Read the type and amount of an operation as currently stored.
fn get_persisted_effect(
    transaction: &Transaction,
    budget_id: BudgetId,
    operation_id: OperationId,
) -> Result<(OperationType, Amount), Error> {
    transaction
        .query_row(
            "SELECT operation_type, amount FROM budget_operation
            WHERE id = ?1 AND budget_id = ?2",
            (operation_id, budget_id),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .map_err(Error::from)
}

fn reverse(operation_type: OperationType, amount: Amount) -> Result<Money, Error> {
    operation_type
        .signed(amount)
        .checked_neg()
        .ok_or(Error::BalanceOverflow)
}

fn map_category_error(error: rusqlite::Error, new_operation: &NewOperation) -> Error {
    match (error, new_operation.category) {
        (
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ),
            Some(category_id),
        ) => Error::UnknownCategory(category_id.to_string()),
        (error, _) => error.into(),
    }
}

/// Record a new operation against `budget` and apply it to the balance.
///
/// # Errors
///
/// Returns [Error::NotFound] if the budget no longer exists,
/// [Error::BalanceOverflow] if the balance would go out of range, and
/// [Error::UnknownCategory] if the category was deleted. Nothing is written
/// if an error is returned.
pub fn create_operation(
    budget: &Budget,
    new_operation: NewOperation,
    user: UserID,
    connection: &Connection,
) -> Result<Operation, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    adjust_balance(
        &transaction,
        budget.id,
        new_operation
            .operation_type
            .signed(new_operation.amount),
    )?;

    transaction
        .execute(
            "INSERT INTO budget_operation
                (budget_id, operation_type, category_id, amount, note, user_id, date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                budget.id,
                new_operation.operation_type,
                new_operation.category,
                new_operation.amount,
                &new_operation.note,
                user,
                OffsetDateTime::now_utc(),
            ),
        )
        .map_err(|error| map_category_error(error, &new_operation))?;

    let operation = get_operation(budget.id, transaction.last_insert_rowid(), &transaction)?;

    transaction.commit()?;

    Ok(operation)
}

/// Replace the client-settable fields of an operation and move the budget's
/// balance from the old effect to the new one.
///
/// The stored type and amount are read before anything is changed, then the
/// difference between the old and new signed amounts is applied at once.
/// Writing the same type and amount leaves the balance unchanged.
///
/// # Errors
///
/// Returns [Error::NotFound] if the budget has no such operation,
/// [Error::BalanceOverflow] if the balance would go out of range, and
/// [Error::UnknownCategory] if the category was deleted. Nothing is written
/// if an error is returned.
pub fn update_operation(
    budget: &Budget,
    operation_id: OperationId,
    changes: NewOperation,
    user: UserID,
    connection: &Connection,
) -> Result<Operation, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let (old_type, old_amount) = get_persisted_effect(&transaction, budget.id, operation_id)?;
    // Only the final balance has to be in range.
    let delta = changes
        .operation_type
        .signed(changes.amount)
        .checked_sub(old_type.signed(old_amount))
        .ok_or(Error::BalanceOverflow)?;
    adjust_balance(&transaction, budget.id, delta)?;

    transaction
        .execute(
            "UPDATE budget_operation
            SET operation_type = ?1, category_id = ?2, amount = ?3, note = ?4,
                user_id = ?5, date = ?6
            WHERE id = ?7 AND budget_id = ?8",
            (
                changes.operation_type,
                changes.category,
                changes.amount,
                &changes.note,
                user,
                OffsetDateTime::now_utc(),
                operation_id,
                budget.id,
            ),
        )
        .map_err(|error| map_category_error(error, &changes))?;

    let operation = get_operation(budget.id, operation_id, &transaction)?;

    transaction.commit()?;

    Ok(operation)
}

/// Delete an operation and reverse its effect on the budget's balance.
///
/// # Errors
///
/// Returns [Error::NotFound] if the budget has no such operation. Nothing is
/// written if an error is returned.
pub fn delete_operation(
    budget: &Budget,
    operation_id: OperationId,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let (old_type, old_amount) = get_persisted_effect(&transaction, budget.id, operation_id)?;
    adjust_balance(&transaction, budget.id, reverse(old_type, old_amount)?)?;

    transaction.execute(
        "DELETE FROM budget_operation WHERE id = ?1 AND budget_id = ?2",
        (operation_id, budget.id),
    )?;

    transaction.commit()?;

    Ok(())
}
