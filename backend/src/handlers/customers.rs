//! HTTP handlers for customer master data endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::models::Customer;
use shared::types::{PaginatedResponse, Pagination};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::customers::{CreateCustomerInput, CustomerService, UpdateCustomerInput};
use crate::AppState;

/// Query for listing customers
#[derive(Debug, Deserialize)]
pub struct ListCustomersQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

/// List customers with optional name search
pub async fn list_customers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListCustomersQuery>,
) -> AppResult<Json<PaginatedResponse<Customer>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let service = CustomerService::new(state.db);
    let page = service.list_customers(pagination, query.search).await?;
    Ok(Json(page))
}

/// Get a customer by ID
pub async fn get_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.db);
    let customer = service.get_customer(customer_id).await?;
    Ok(Json(customer))
}

/// Create a customer
pub async fn create_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.db);
    let customer = service.create_customer(input).await?;
    Ok(Json(customer))
}

/// Update a customer
pub async fn update_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.db);
    let customer = service.update_customer(customer_id, input).await?;
    Ok(Json(customer))
}
