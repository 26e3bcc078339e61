mod core;
mod endpoints;

pub use core::{Budget, create_budget_table, get_budgets};
pub use endpoints::{
    BudgetSummary, create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint,
    get_budgets_endpoint, resolve_budget, update_budget_endpoint,
};

#[cfg(test)]
pub use core::{Currency, NewBudget, create_budget, get_budget};
