//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::AppState;

/// All routes mounted under `/api/v1`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/expenses", expense_routes())
        .nest("/ar", ar_routes())
        .nest("/sales", sale_routes())
        .nest("/purchases", purchase_routes())
        .nest("/purchase-items", purchase_item_routes())
        .nest("/deliveries", delivery_routes())
        .nest("/business-day-closing", closing_routes())
        .nest("/finance", finance_routes())
}

fn expense_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::expenses::list_expenses).post(handlers::expenses::create_expense),
        )
        .route(
            "/:expense_id",
            get(handlers::expenses::get_expense)
                .put(handlers::expenses::update_expense)
                .delete(handlers::expenses::delete_expense),
        )
}

fn ar_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::ar::list_ar))
}

fn sale_routes() -> Router<AppState> {
    Router::new().route(
        "/:sale_id",
        get(handlers::sales::get_sale)
            .patch(handlers::sales::update_sale_payment)
            .delete(handlers::sales::delete_sale),
    )
}

fn purchase_routes() -> Router<AppState> {
    Router::new().route(
        "/:purchase_id",
        get(handlers::purchases::get_purchase).delete(handlers::purchases::delete_purchase),
    )
}

fn purchase_item_routes() -> Router<AppState> {
    Router::new().route(
        "/:purchase_item_id/receive",
        post(handlers::purchases::receive_purchase_item),
    )
}

fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::deliveries::list_deliveries).post(handlers::deliveries::create_delivery),
        )
        .route(
            "/:delivery_id/confirm",
            post(handlers::deliveries::confirm_delivery),
        )
}

fn closing_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::closing::get_closing_preview).post(handlers::closing::close_business_day),
    )
}

fn finance_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(handlers::finance::get_finance_dashboard))
}
