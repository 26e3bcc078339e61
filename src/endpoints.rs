//! The API endpoints URIs.
//!
//! For endpoints that take parameters, e.g., '/api/lists/{list_id}', use
//! [format_endpoint] or [format_nested_endpoint].

/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for logging in.
pub const LOG_IN: &str = "/api/log_in";
/// The route for logging out.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for listing and creating lists of budgets.
pub const LISTS: &str = "/api/lists";
/// The route for a single list of budgets.
pub const LIST: &str = "/api/lists/{list_id}";
/// The route for listing and creating the budgets in a list.
pub const BUDGETS: &str = "/api/lists/{list_id}/budgets";
/// The route for a single budget.
pub const BUDGET: &str = "/api/lists/{list_id}/budgets/{budget_id}";
/// The route for listing and creating the operations of a budget.
pub const OPERATIONS: &str = "/api/lists/{list_id}/budgets/{budget_id}/operations";
/// The route for a single operation.
pub const OPERATION: &str =
    "/api/lists/{list_id}/budgets/{budget_id}/operations/{operation_id}";
/// The route for listing and granting shares of a list.
pub const SHARES: &str = "/api/lists/{list_id}/share";
/// The route for a single share.
pub const SHARE: &str = "/api/lists/{list_id}/share/{share_id}";
/// The route for listing and creating categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route for a single category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// Parameters are delimited by curly braces, e.g. `{list_id}`.
/// If there is no parameter, the path is returned unchanged.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

/// Replace the parameters in `endpoint_path` with `ids`, in order.
pub fn format_nested_endpoint(endpoint_path: &str, ids: &[i64]) -> String {
    ids.iter()
        .fold(endpoint_path.to_string(), |path, &id| format_endpoint(&path, id))
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::{format_endpoint, format_nested_endpoint};

    #[track_caller]
    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok(), "{uri} is not a valid URI");
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::USERS);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::LISTS);
        assert_endpoint_is_valid_uri(endpoints::CATEGORIES);

        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::LIST, 1));
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::BUDGETS, 1));
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::SHARES, 1));
        assert_endpoint_is_valid_uri(&format_endpoint(endpoints::CATEGORY, 1));
        assert_endpoint_is_valid_uri(&format_nested_endpoint(endpoints::BUDGET, &[1, 2]));
        assert_endpoint_is_valid_uri(&format_nested_endpoint(endpoints::OPERATIONS, &[1, 2]));
        assert_endpoint_is_valid_uri(&format_nested_endpoint(
            endpoints::OPERATION,
            &[1, 2, 3],
        ));
        assert_endpoint_is_valid_uri(&format_nested_endpoint(endpoints::SHARE, &[1, 2]));
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
    }

    #[test]
    fn nested_parameters_are_filled_in_order() {
        let formatted_path = format_nested_endpoint(endpoints::OPERATION, &[1, 22, 333]);

        assert_eq!(
            formatted_path,
            "/api/lists/1/budgets/22/operations/333"
        );
    }
}
