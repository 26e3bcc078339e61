mod core;
mod endpoints;

pub use core::{BudgetList, create_budget_list_table, get_budget_list};
pub use endpoints::{
    create_list_endpoint, delete_list_endpoint, get_list_endpoint, get_lists_endpoint,
    update_list_endpoint,
};

#[cfg(test)]
pub use core::create_budget_list;
