//! HTTP handlers for supplier master data endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::models::Supplier;
use shared::types::{PaginatedResponse, Pagination};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::suppliers::{CreateSupplierInput, SupplierService, UpdateSupplierInput};
use crate::AppState;

/// Query for listing suppliers
#[derive(Debug, Deserialize)]
pub struct ListSuppliersQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
}

/// List suppliers with optional name search
pub async fn list_suppliers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListSuppliersQuery>,
) -> AppResult<Json<PaginatedResponse<Supplier>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let service = SupplierService::new(state.db);
    let page = service.list_suppliers(pagination, query.search).await?;
    Ok(Json(page))
}

/// Get a supplier by ID
pub async fn get_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.get_supplier(supplier_id).await?;
    Ok(Json(supplier))
}

/// Create a supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateSupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.create_supplier(input).await?;
    Ok(Json(supplier))
}

/// Update a supplier
pub async fn update_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.update_supplier(supplier_id, input).await?;
    Ok(Json(supplier))
}
