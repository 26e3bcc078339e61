mod core;
mod endpoints;

pub use core::{create_share_table, is_shared_with};
pub use endpoints::{
    create_share_endpoint, delete_share_endpoint, get_share_endpoint, get_shares_endpoint,
};

#[cfg(test)]
pub use core::{create_share, get_shares};
