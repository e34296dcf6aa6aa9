//! Customer master data service
//!
//! `total_spend` is maintained by the sales and returns flows and is not
//! writable here.

use serde::Deserialize;
use shared::models::Customer;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_name, validate_phone};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// Input for creating a customer
#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub phone: Option<String>,
}

/// Input for updating a customer
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    phone: Option<String>,
    total_spend: rust_decimal::Decimal,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            total_spend: row.total_spend,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const CUSTOMER_COLUMNS: &str = "id, name, phone, total_spend, created_at, updated_at";

impl CustomerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List customers, optionally filtered by a name substring
    pub async fn list_customers(
        &self,
        pagination: Pagination,
        search: Option<String>,
    ) -> AppResult<PaginatedResponse<Customer>> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let total: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE name ILIKE $1")
                    .bind(p)
                    .fetch_one(&self.db)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM customers")
                    .fetch_one(&self.db)
                    .await?
            }
        };

        let rows = match &pattern {
            Some(p) => {
                sqlx::query_as::<_, CustomerRow>(&format!(
                    "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE name ILIKE $1 \
                     ORDER BY name ASC LIMIT $2 OFFSET $3"
                ))
                .bind(p)
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, CustomerRow>(&format!(
                    "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name ASC LIMIT $1 OFFSET $2"
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

    /// Get a customer by ID
    pub async fn get_customer(&self, customer_id: Uuid) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(row.into())
    }

    /// Create a customer
    pub async fn create_customer(&self, input: CreateCustomerInput) -> AppResult<Customer> {
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

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            INSERT INTO customers (name, phone, total_spend)
            VALUES ($1, $2, 0)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(&input.phone)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Created customer {} ({})", row.name, row.id);
        Ok(row.into())
    }

    /// Update a customer's name or phone
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<Customer> {
        let existing = self.get_customer(customer_id).await?;

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
        let phone = input.phone.or(existing.phone);

        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            UPDATE customers
            SET name = $1, phone = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(&phone)
        .bind(customer_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}
