//! Categories are global labels that operations can be tagged with.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, database_id::CategoryId, title::Title};

/// The maximum number of characters in a category title.
pub const CATEGORY_TITLE_MAX_LENGTH: usize = 50;

/// A label for grouping operations, e.g. "Groceries".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The unique title of the category.
    pub title: Title,
}

/// Create the category table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL UNIQUE
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let title: String = row.get(1)?;

    Ok(Category {
        id,
        title: Title::new_unchecked(&title),
    })
}

fn map_unique_violation(error: rusqlite::Error, title: &Title) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateCategory(title.to_string()),
        error => error.into(),
    }
}

/// Create a new category.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateCategory] if a category with `title` already exists,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_category(title: Title, connection: &Connection) -> Result<Category, Error> {
    connection
        .execute("INSERT INTO category (title) VALUES (?1)", [title.as_ref()])
        .map_err(|error| map_unique_violation(error, &title))?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        title,
    })
}

/// Get the category with `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no category with `id`.
pub fn get_category(id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .query_row(
            "SELECT id, title FROM category WHERE id = ?1",
            [id],
            map_row_to_category,
        )
        .map_err(Error::from)
}

/// Get all categories ordered by ID.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, title FROM category ORDER BY id")?
        .query_map([], map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Find the ID of the category titled exactly `title`.
///
/// # Errors
///
/// Returns [Error::UnknownCategory] if no category has that title.
pub fn get_category_id_by_title(title: &str, connection: &Connection) -> Result<CategoryId, Error> {
    connection
        .query_row("SELECT id FROM category WHERE title = ?1", [title], |row| {
            row.get(0)
        })
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::UnknownCategory(title.to_owned()),
            error => error,
        })
}

/// Rename the category with `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no category with `id` and
/// [Error::DuplicateCategory] if another category already has `title`.
pub fn update_category(
    id: CategoryId,
    title: Title,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET title = ?1 WHERE id = ?2",
            (title.as_ref(), id),
        )
        .map_err(|error| map_unique_violation(error, &title))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(Category { id, title })
}

/// Delete the category with `id`.
///
/// Operations tagged with the category are kept and become uncategorised.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no category with `id`.
pub fn delete_category(id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
