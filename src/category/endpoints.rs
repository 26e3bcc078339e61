//! Route handlers for the global categories.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    category::core::{
        CATEGORY_TITLE_MAX_LENGTH, Category, create_category, delete_category,
        get_all_categories, get_category, update_category,
    },
    database_id::CategoryId,
    json::ApiJson,
    title::Title,
};

/// The state needed for the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating or renaming a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryData {
    /// The new title.
    pub title: String,
}

/// List all categories.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
) -> Result<ApiJson<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_all_categories(&connection).map(ApiJson)
}

/// Create a category and respond with it.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    ApiJson(data): ApiJson<CategoryData>,
) -> Result<(StatusCode, ApiJson<Category>), Error> {
    let title = Title::new(&data.title, CATEGORY_TITLE_MAX_LENGTH)?;
    let connection = lock_connection(&state.db_connection)?;

    let category = create_category(title, &connection)?;

    Ok((StatusCode::CREATED, ApiJson(category)))
}

/// Get a single category.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Path(category_id): Path<CategoryId>,
) -> Result<ApiJson<Category>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_category(category_id, &connection).map(ApiJson)
}

/// Rename a category.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Path(category_id): Path<CategoryId>,
    ApiJson(data): ApiJson<CategoryData>,
) -> Result<ApiJson<Category>, Error> {
    let title = Title::new(&data.title, CATEGORY_TITLE_MAX_LENGTH)?;
    let connection = lock_connection(&state.db_connection)?;

    update_category(category_id, title, &connection).map(ApiJson)
}

/// Delete a category. Operations that used it become uncategorised.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_category(category_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
