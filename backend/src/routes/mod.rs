//! Route definitions for the Pharmacy Inventory Management System

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Protected routes - order entry
        .nest("/sales", sales_routes())
        .nest("/purchases", purchase_routes())
        // Protected routes - returns
        .nest("/returns", return_routes())
        // Protected routes - stocktakes
        .nest("/stocktakes", stocktake_routes())
        // Protected routes - financial aggregation
        .nest("/finance", finance_routes())
        // Protected routes - stock reporting
        .nest("/stock", stock_routes())
        // Protected routes - master data
        .nest("/products", product_routes())
        .nest("/customers", customer_routes())
        .nest("/suppliers", supplier_routes())
}

/// Sales order routes (protected)
fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_sale))
        .route("/:order_id", get(handlers::get_sale))
        .route("/:order_id/reverse", post(handlers::reverse_sale))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Purchase order routes (protected)
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_purchase))
        .route("/:order_id", get(handlers::get_purchase))
        .route("/:order_id/cancel", post(handlers::cancel_purchase))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Return routes (protected)
fn return_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", post(handlers::create_sales_return))
        .route("/purchases", post(handlers::create_purchase_return))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stocktake routes (protected)
fn stocktake_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_stocktake))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Financial aggregation routes (protected)
fn finance_routes() -> Router<AppState> {
    Router::new()
        .route("/settle", post(handlers::settle_day))
        .route("/daily", get(handlers::daily_aggregates))
        .route("/monthly", get(handlers::monthly_summary))
        .route("/annual", get(handlers::annual_summary))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Stock reporting routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/available/:product_id", get(handlers::available_stock))
        .route("/batches/:batch_id", get(handlers::batch_detail))
        .route("/overview", get(handlers::stock_overview))
        .route("/expiring", get(handlers::expiring_batches))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Product master data routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product).put(handlers::update_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Customer master data routes (protected)
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:customer_id",
            get(handlers::get_customer).put(handlers::update_customer),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Supplier master data routes (protected)
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier).put(handlers::update_supplier),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
