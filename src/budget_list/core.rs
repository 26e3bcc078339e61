//! Lists of budgets and the queries that create, fetch, rename and delete them.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior};

use crate::{Error, UserID, database_id::BudgetListId, title::Title};

/// The maximum number of characters in a list title.
pub const BUDGET_LIST_TITLE_MAX_LENGTH: usize = 100;

/// A titled collection of budgets owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetList {
    /// The ID of the list.
    pub id: BudgetListId,
    /// The display name of the list.
    pub title: Title,
    /// The user who created the list. Never changes.
    pub owner: UserID,
}

/// Create the budget list table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_budget_list_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget_list (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            owner_id INTEGER NOT NULL,
            FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_list_owner ON budget_list(owner_id)",
        (),
    )?;

    Ok(())
}

fn map_row_to_budget_list(row: &Row) -> Result<BudgetList, rusqlite::Error> {
    let id = row.get(0)?;
    let title: String = row.get(1)?;
    let owner = row.get(2)?;

    Ok(BudgetList {
        id,
        title: Title::new_unchecked(&title),
        owner,
    })
}

/// Create a new list owned by `owner`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the list could not be inserted.
pub fn create_budget_list(
    title: Title,
    owner: UserID,
    connection: &Connection,
) -> Result<BudgetList, Error> {
    connection.execute(
        "INSERT INTO budget_list (title, owner_id) VALUES (?1, ?2)",
        (title.as_ref(), owner),
    )?;

    Ok(BudgetList {
        id: connection.last_insert_rowid(),
        title,
        owner,
    })
}

/// Get the list with `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no list with `id`.
pub fn get_budget_list(id: BudgetListId, connection: &Connection) -> Result<BudgetList, Error> {
    connection
        .query_row(
            "SELECT id, title, owner_id FROM budget_list WHERE id = ?1",
            [id],
            map_row_to_budget_list,
        )
        .map_err(Error::from)
}

/// Get the lists that `user` owns or that have been shared with them,
/// ordered by ID.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_visible_budget_lists(
    user: UserID,
    connection: &Connection,
) -> Result<Vec<BudgetList>, Error> {
    connection
        .prepare(
            "SELECT DISTINCT budget_list.id, budget_list.title, budget_list.owner_id
            FROM budget_list
            LEFT JOIN share ON share.budget_list_id = budget_list.id
            WHERE budget_list.owner_id = ?1 OR share.user_id = ?1
            ORDER BY budget_list.id",
        )?
        .query_map([user], map_row_to_budget_list)?
        .map(|maybe_list| maybe_list.map_err(Error::from))
        .collect()
}

/// Change the title of the list with `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no list with `id`.
pub fn update_budget_list_title(
    id: BudgetListId,
    title: Title,
    connection: &Connection,
) -> Result<BudgetList, Error> {
    connection
        .query_row(
            "UPDATE budget_list SET title = ?1 WHERE id = ?2 RETURNING id, title, owner_id",
            (title.as_ref(), id),
            map_row_to_budget_list,
        )
        .map_err(Error::from)
}

/// Delete the list with `id` along with its operations, budgets and shares.
///
/// The dependent rows are deleted in that order within one transaction.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no list with `id`. Nothing is
/// deleted if an error is returned.
pub fn delete_budget_list(id: BudgetListId, connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "DELETE FROM budget_operation
        WHERE budget_id IN (SELECT id FROM budget WHERE budget_list_id = ?1)",
        [id],
    )?;
    transaction.execute("DELETE FROM budget WHERE budget_list_id = ?1", [id])?;
    transaction.execute("DELETE FROM share WHERE budget_list_id = ?1", [id])?;
    let rows_affected = transaction.execute("DELETE FROM budget_list WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod budget_list_tests {
    use crate::{
        Amount, Error, Money,
        budget::{Currency, NewBudget, create_budget, get_budget},
        operation::{NewOperation, OperationType, create_operation},
        share::{create_share, get_shares},
        test_utils::{create_test_user, get_test_connection},
        title::Title,
    };

    use super::{
        create_budget_list, delete_budget_list, get_budget_list, get_visible_budget_lists,
        update_budget_list_title,
    };

    #[test]
    fn create_and_get_list() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);

        let list =
            create_budget_list(Title::new_unchecked("Home"), alice.id, &connection).unwrap();

        assert_eq!(get_budget_list(list.id, &connection), Ok(list));
    }

    #[test]
    fn get_missing_list_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(get_budget_list(42, &connection), Err(Error::NotFound));
    }

    #[test]
    fn visible_lists_include_owned_and_shared_once() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let carol = create_test_user("carol", &connection);
        let alice_list =
            create_budget_list(Title::new_unchecked("Alice"), alice.id, &connection).unwrap();
        let bob_list =
            create_budget_list(Title::new_unchecked("Bob"), bob.id, &connection).unwrap();
        create_budget_list(Title::new_unchecked("Carol"), carol.id, &connection).unwrap();
        create_share(&bob_list, alice.id, &connection).unwrap();
        create_share(&alice_list, carol.id, &connection).unwrap();

        let lists = get_visible_budget_lists(alice.id, &connection).unwrap();

        assert_eq!(lists, vec![alice_list, bob_list]);
    }

    #[test]
    fn update_title() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let list =
            create_budget_list(Title::new_unchecked("Home"), alice.id, &connection).unwrap();

        let updated =
            update_budget_list_title(list.id, Title::new_unchecked("House"), &connection)
                .unwrap();

        assert_eq!(updated.title.as_ref(), "House");
        assert_eq!(updated.owner, alice.id);
    }

    #[test]
    fn update_missing_list_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(
            update_budget_list_title(42, Title::new_unchecked("House"), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_cascades_to_budgets_operations_and_shares() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let list =
            create_budget_list(Title::new_unchecked("Home"), alice.id, &connection).unwrap();
        let budget = create_budget(
            &list,
            NewBudget {
                title: Title::new_unchecked("Food"),
                currency: Currency::Usd,
                initial_balance: Money::ZERO,
            },
            &connection,
        )
        .unwrap();
        create_operation(
            &budget,
            NewOperation {
                operation_type: OperationType::Income,
                amount: Amount::new_unchecked(1000),
                category: None,
                note: None,
            },
            alice.id,
            &connection,
        )
        .unwrap();
        create_share(&list, bob.id, &connection).unwrap();

        delete_budget_list(list.id, &connection).unwrap();

        assert_eq!(get_budget_list(list.id, &connection), Err(Error::NotFound));
        assert_eq!(
            get_budget(list.id, budget.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(get_shares(list.id, &connection), Ok(vec![]));
        let operation_count: i64 = connection
            .query_row("SELECT COUNT(*) FROM budget_operation", [], |row| row.get(0))
            .unwrap();
        assert_eq!(operation_count, 0);
    }

    #[test]
    fn delete_missing_list_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(delete_budget_list(42, &connection), Err(Error::NotFound));
    }
}
