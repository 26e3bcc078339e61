//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// Database identifier for a list of budgets.
pub type BudgetListId = DatabaseId;
/// Database identifier for a budget.
pub type BudgetId = DatabaseId;
/// Database identifier for a category.
pub type CategoryId = DatabaseId;
/// Database identifier for an income or expense operation.
pub type OperationId = DatabaseId;
/// Database identifier for a share permission.
pub type ShareId = DatabaseId;
