//! Income and expense operations, and the engine that keeps budget balances
//! consistent with them.

mod balance;
mod core;
mod endpoints;
mod query;

pub use core::{Operation, create_operation_table};
pub use endpoints::{
    create_operation_endpoint, delete_operation_endpoint, get_operation_endpoint,
    get_operations_endpoint, update_operation_endpoint,
};
pub use query::{OperationFilter, get_operations};

#[cfg(test)]
pub use balance::create_operation;
#[cfg(test)]
pub use core::{NewOperation, OperationType};
