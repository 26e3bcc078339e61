mod core;
mod endpoints;

pub use core::{create_category_table, get_category_id_by_title};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, get_categories_endpoint,
    get_category_endpoint, update_category_endpoint,
};

#[cfg(test)]
pub use core::create_category;
