//! Listing and filtering the operations of a budget.

use rusqlite::Connection;

use crate::{
    Error,
    database_id::BudgetId,
    operation::core::{Operation, OperationType, SELECT_OPERATION, map_row_to_operation},
};

/// Optional filters for listing operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationFilter {
    /// Only include operations whose category title contains this text.
    /// The match is case-sensitive and excludes uncategorised operations.
    pub category: Option<String>,
    /// Only include operations of this type.
    pub operation_type: Option<OperationType>,
}

/// Get the operations of the budget with `budget_id` that match `filter`,
/// ordered by date and then ID.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_operations(
    budget_id: BudgetId,
    filter: &OperationFilter,
    connection: &Connection,
) -> Result<Vec<Operation>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_OPERATION}
            WHERE budget_operation.budget_id = ?1
                AND (?2 IS NULL OR instr(category.title, ?2) > 0)
                AND (?3 IS NULL OR budget_operation.operation_type = ?3)
            ORDER BY budget_operation.date, budget_operation.id"
        ))?
        .query_map(
            (budget_id, &filter.category, filter.operation_type),
            map_row_to_operation,
        )?
        .map(|maybe_operation| maybe_operation.map_err(Error::from))
        .collect()
}
