//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, get_log_out, post_log_in, register_user},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint, get_budgets_endpoint,
        update_budget_endpoint,
    },
    budget_list::{
        create_list_endpoint, delete_list_endpoint, get_list_endpoint, get_lists_endpoint,
        update_list_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories_endpoint,
        get_category_endpoint, update_category_endpoint,
    },
    endpoints,
    operation::{
        create_operation_endpoint, delete_operation_endpoint, get_operation_endpoint,
        get_operations_endpoint, update_operation_endpoint,
    },
    share::{
        create_share_endpoint, delete_share_endpoint, get_share_endpoint, get_shares_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(
            endpoints::LISTS,
            get(get_lists_endpoint).post(create_list_endpoint),
        )
        .route(
            endpoints::LIST,
            get(get_list_endpoint)
                .put(update_list_endpoint)
                .delete(delete_list_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(
            endpoints::OPERATIONS,
            get(get_operations_endpoint).post(create_operation_endpoint),
        )
        .route(
            endpoints::OPERATION,
            get(get_operation_endpoint)
                .put(update_operation_endpoint)
                .delete(delete_operation_endpoint),
        )
        .route(
            endpoints::SHARES,
            get(get_shares_endpoint).post(create_share_endpoint),
        )
        .route(
            endpoints::SHARE,
            get(get_share_endpoint).delete(delete_share_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .put(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        Error,
        endpoints::{self, format_endpoint, format_nested_endpoint},
        test_utils::{get_test_server, sign_up},
    };

    #[tokio::test]
    async fn protected_routes_require_auth() {
        let (server, _) = get_test_server();

        for path in [
            endpoints::LISTS.to_owned(),
            format_endpoint(endpoints::LIST, 1),
            format_nested_endpoint(endpoints::BUDGET, &[1, 1]),
            format_nested_endpoint(endpoints::OPERATIONS, &[1, 1]),
            format_endpoint(endpoints::SHARES, 1),
            endpoints::CATEGORIES.to_owned(),
        ] {
            let response = server.get(&path).await;

            response.assert_status_unauthorized();
            response.assert_json(&json!({ "error": Error::Unauthenticated.to_string() }));
        }
    }

    #[tokio::test]
    async fn unknown_route_returns_json_not_found() {
        let (server, _) = get_test_server();

        let response = server.get("/api/does_not_exist").await;

        response.assert_status_not_found();
        response.assert_json(&json!({ "error": Error::NotFound.to_string() }));
    }

    #[tokio::test]
    async fn household_scenario() {
        let (server, _) = get_test_server();
        let alice = sign_up(&server, "alice").await;
        let bob = sign_up(&server, "bob").await;

        let list = server
            .post(endpoints::LISTS)
            .add_cookie(alice.clone())
            .json(&json!({ "title": "Household" }))
            .await
            .json::<Value>();
        let list_id = list["id"].as_i64().unwrap();
        let budget = server
            .post(&format_endpoint(endpoints::BUDGETS, list_id))
            .add_cookie(alice.clone())
            .json(&json!({ "title": "Groceries", "currency": "EUR", "initial_balance": "200.00" }))
            .await
            .json::<Value>();
        let budget_id = budget["id"].as_i64().unwrap();
        let operations_path = format_nested_endpoint(endpoints::OPERATIONS, &[list_id, budget_id]);

        // Bob cannot see the list until it is shared with him.
        server
            .get(&format_endpoint(endpoints::LIST, list_id))
            .add_cookie(bob.clone())
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let share = server
            .post(&format_endpoint(endpoints::SHARES, list_id))
            .add_cookie(alice.clone())
            .json(&json!({ "user": "bob" }))
            .await
            .json::<Value>();

        server
            .post(&operations_path)
            .add_cookie(bob.clone())
            .json(&json!({ "operation_type": "Expense", "amount": "45.50", "note": "weekly shop" }))
            .await
            .assert_status(StatusCode::CREATED);

        let lists = server
            .get(endpoints::LISTS)
            .add_cookie(bob.clone())
            .await
            .json::<Value>();
        assert_eq!(lists[0]["owner"], "alice");
        assert_eq!(lists[0]["budgets"][0]["balance"], "154.50");

        server
            .delete(&format_nested_endpoint(
                endpoints::SHARE,
                &[list_id, share["id"].as_i64().unwrap()],
            ))
            .add_cookie(alice.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&operations_path)
            .add_cookie(bob)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&format_endpoint(endpoints::LIST, list_id))
            .add_cookie(alice.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format_nested_endpoint(endpoints::BUDGET, &[list_id, budget_id]))
            .add_cookie(alice)
            .await
            .assert_status_not_found();
    }
}
