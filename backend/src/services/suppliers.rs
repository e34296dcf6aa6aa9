//! Supplier master data service

use serde::Deserialize;
use shared::models::Supplier;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_name, validate_phone};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Supplier service
#[derive(Clone)]
pub struct SupplierService {
    db: PgPool,
}

/// Input for creating a supplier
#[derive(Debug, Deserialize)]
pub struct CreateSupplierInput {
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for updating a supplier
#[derive(Debug, Deserialize)]
pub struct UpdateSupplierInput {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, FromRow)]
struct SupplierRow {
    id: Uuid,
    name: String,
    contact_name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            name: row.name,
            contact_name: row.contact_name,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SUPPLIER_COLUMNS: &str = "id, name, contact_name, phone, address, created_at, updated_at";

impl SupplierService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List suppliers, optionally filtered by a name substring
    pub async fn list_suppliers(
        &self,
        pagination: Pagination,
        search: Option<String>,
    ) -> AppResult<PaginatedResponse<Supplier>> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let total: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE name ILIKE $1")
                    .bind(p)
                    .fetch_one(&self.db)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
                    .fetch_one(&self.db)
                    .await?
            }
        };

        let rows = match &pattern {
            Some(p) => {
                sqlx::query_as::<_, SupplierRow>(&format!(
                    "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE name ILIKE $1 \
                     ORDER BY name ASC LIMIT $2 OFFSET $3"
                ))
                .bind(p)
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, SupplierRow>(&format!(
                    "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name ASC LIMIT $1 OFFSET $2"
                ))
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Into::into).collect(),
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    /// Get a supplier by ID
    pub async fn get_supplier(&self, supplier_id: Uuid) -> AppResult<Supplier> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"
        ))
        .bind(supplier_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;

        Ok(row.into())
    }

    /// Create a supplier
    pub async fn create_supplier(&self, input: CreateSupplierInput) -> AppResult<Supplier> {
        validate_name(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
        if let Some(ref phone) = input.phone {
            validate_phone(phone).map_err(|msg| AppError::Validation {
                field: "phone".to_string(),
                message: msg.to_string(),
            })?;
        }

        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            r#"
            INSERT INTO suppliers (name, contact_name, phone, address)
            VALUES ($1, $2, $3, $4)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(&input.contact_name)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Created supplier {} ({})", row.name, row.id);
        Ok(row.into())
    }

    /// Update a supplier's contact details
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> AppResult<Supplier> {
        let existing = self.get_supplier(supplier_id).await?;

        if let Some(ref name) = input.name {
            validate_name(name).map_err(|msg| AppError::Validation {
                field: "name".to_string(),
                message: msg.to_string(),
            })?;
        }
        if let Some(ref phone) = input.phone {
            validate_phone(phone).map_err(|msg| AppError::Validation {
                field: "phone".to_string(),
                message: msg.to_string(),
            })?;
        }

        let name = input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name);
        let contact_name = input.contact_name.or(existing.contact_name);
        let phone = input.phone.or(existing.phone);
        let address = input.address.or(existing.address);

        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            r#"
            UPDATE suppliers
            SET name = $1, contact_name = $2, phone = $3, address = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(&contact_name)
        .bind(&phone)
        .bind(&address)
        .bind(supplier_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}
