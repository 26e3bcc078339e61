//! Share permissions let the owner of a list give other users access to it.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{
    Error, UserID, Username,
    budget_list::BudgetList,
    database_id::{BudgetListId, ShareId},
};

/// Access to a list granted by its owner to another user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    /// The ID of the share.
    pub id: ShareId,
    /// The list being shared.
    #[serde(skip)]
    pub budget_list_id: BudgetListId,
    /// The owner of the list who granted access.
    #[serde(skip)]
    pub owner: UserID,
    /// The user who was granted access.
    #[serde(skip)]
    pub user: UserID,
    /// The name of the user who was granted access.
    #[serde(rename = "user")]
    pub username: Username,
}

/// Create the share table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_share_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS share (
            id INTEGER PRIMARY KEY,
            budget_list_id INTEGER NOT NULL,
            owner_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            UNIQUE(budget_list_id, user_id),
            CHECK(owner_id != user_id),
            FOREIGN KEY(budget_list_id) REFERENCES budget_list(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_share_user ON share(user_id)",
        (),
    )?;

    Ok(())
}

const SELECT_SHARE: &str = "SELECT share.id, share.budget_list_id, share.owner_id, \
    share.user_id, user.username FROM share INNER JOIN user ON user.id = share.user_id";

fn map_row_to_share(row: &Row) -> Result<Share, rusqlite::Error> {
    let username: String = row.get(4)?;

    Ok(Share {
        id: row.get(0)?,
        budget_list_id: row.get(1)?,
        owner: row.get(2)?,
        user: row.get(3)?,
        username: Username::new_unchecked(&username),
    })
}

/// Grant `user` access to `list` on behalf of the list's owner.
///
/// # Errors
///
/// This function will return a:
/// - [Error::SelfShare] if `user` owns the list,
/// - [Error::DuplicateShare] if the list is already shared with `user`,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_share(list: &BudgetList, user: UserID, connection: &Connection) -> Result<Share, Error> {
    if user == list.owner {
        return Err(Error::SelfShare);
    }

    connection
        .execute(
            "INSERT INTO share (budget_list_id, owner_id, user_id) VALUES (?1, ?2, ?3)",
            (list.id, list.owner, user),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateShare,
            error => error.into(),
        })?;

    get_share(list.id, connection.last_insert_rowid(), connection)
}

/// Get the share with `share_id` of the list with `list_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the list has no such share.
pub fn get_share(
    list_id: BudgetListId,
    share_id: ShareId,
    connection: &Connection,
) -> Result<Share, Error> {
    connection
        .query_row(
            &format!("{SELECT_SHARE} WHERE share.id = ?1 AND share.budget_list_id = ?2"),
            (share_id, list_id),
            map_row_to_share,
        )
        .map_err(Error::from)
}

/// Get the shares of the list with `list_id`, ordered by ID.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_shares(list_id: BudgetListId, connection: &Connection) -> Result<Vec<Share>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_SHARE} WHERE share.budget_list_id = ?1 ORDER BY share.id"
        ))?
        .query_map([list_id], map_row_to_share)?
        .map(|maybe_share| maybe_share.map_err(Error::from))
        .collect()
}

/// Whether the list with `list_id` has been shared with `user`.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn is_shared_with(
    list_id: BudgetListId,
    user: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM share WHERE budget_list_id = ?1 AND user_id = ?2)",
            (list_id, user),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Revoke a share.
///
/// # Errors
///
/// Returns [Error::NotFound] if the list has no such share.
pub fn delete_share(
    list_id: BudgetListId,
    share_id: ShareId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM share WHERE id = ?1 AND budget_list_id = ?2",
        (share_id, list_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod share_tests {
    use serde_json::json;

    use crate::{
        Error,
        budget_list::create_budget_list,
        test_utils::{create_test_user, get_test_connection},
        title::Title,
    };

    use super::{create_share, delete_share, get_share, get_shares, is_shared_with};

    #[test]
    fn create_share_grants_access() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let list =
            create_budget_list(Title::new_unchecked("Home"), alice.id, &connection).unwrap();

        let share = create_share(&list, bob.id, &connection).unwrap();

        assert_eq!(share.owner, alice.id);
        assert_eq!(share.username, bob.username);
        assert_eq!(is_shared_with(list.id, bob.id, &connection), Ok(true));
        assert_eq!(is_shared_with(list.id, alice.id, &connection), Ok(false));
        assert_eq!(get_shares(list.id, &connection), Ok(vec![share]));
    }

    #[test]
    fn self_share_is_rejected() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let list =
            create_budget_list(Title::new_unchecked("Home"), alice.id, &connection).unwrap();

        assert_eq!(
            create_share(&list, alice.id, &connection),
            Err(Error::SelfShare)
        );
    }

    #[test]
    fn duplicate_share_is_rejected() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let list =
            create_budget_list(Title::new_unchecked("Home"), alice.id, &connection).unwrap();
        create_share(&list, bob.id, &connection).unwrap();

        assert_eq!(
            create_share(&list, bob.id, &connection),
            Err(Error::DuplicateShare)
        );
    }

    #[test]
    fn serializes_with_username() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let list =
            create_budget_list(Title::new_unchecked("Home"), alice.id, &connection).unwrap();

        let share = create_share(&list, bob.id, &connection).unwrap();

        assert_eq!(
            serde_json::to_value(&share).unwrap(),
            json!({ "id": share.id, "user": "bob" })
        );
    }

    #[test]
    fn delete_revokes_access() {
        let connection = get_test_connection();
        let alice = create_test_user("alice", &connection);
        let bob = create_test_user("bob", &connection);
        let list =
            create_budget_list(Title::new_unchecked("Home"), alice.id, &connection).unwrap();
        let share = create_share(&list, bob.id, &connection).unwrap();

        delete_share(list.id, share.id, &connection).unwrap();

        assert_eq!(is_shared_with(list.id, bob.id, &connection), Ok(false));
        assert_eq!(get_share(list.id, share.id, &connection), Err(Error::NotFound));
        assert_eq!(
            delete_share(list.id, share.id, &connection),
            Err(Error::NotFound)
        );
    }
}
