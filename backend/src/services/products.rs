//! Product master data service
//!
//! Products are created with zero stock; `total_stock` is owned by the
//! batch ledger and is never writable through this service.

use serde::Deserialize;
use rust_decimal::Decimal;
use shared::models::Product;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
use shared::validation::{validate_name, validate_unit_price};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub unit: String,
    pub alert_quantity: i32,
    pub reference_buy_price: Decimal,
    pub reference_sell_price: Decimal,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub alert_quantity: Option<i32>,
    pub reference_buy_price: Option<Decimal>,
    pub reference_sell_price: Option<Decimal>,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    unit: String,
    alert_quantity: i32,
    reference_buy_price: Decimal,
    reference_sell_price: Decimal,
    total_stock: i32,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            unit: row.unit,
            alert_quantity: row.alert_quantity,
            reference_buy_price: row.reference_buy_price,
            reference_sell_price: row.reference_sell_price,
            total_stock: row.total_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, unit, alert_quantity, reference_buy_price, \
                               reference_sell_price, total_stock, created_at, updated_at";

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List products, optionally filtered by a name substring
    pub async fn list_products(
        &self,
        pagination: Pagination,
        search: Option<String>,
    ) -> AppResult<PaginatedResponse<Product>> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));

        let total: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE name ILIKE $1")
                    .bind(p)
                    .fetch_one(&self.db)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM products")
                    .fetch_one(&self.db)
                    .await?
            }
        };

        let rows = match &pattern {
            Some(p) => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE name ILIKE $1 \
                     ORDER BY name ASC LIMIT $2 OFFSET $3"
                ))
                .bind(p)
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, ProductRow>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC LIMIT $1 OFFSET $2"
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

    /// Get a product by ID
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// Create a product with zero stock
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        validate_create(&input)?;

        let duplicate: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE LOWER(name) = LOWER($1)")
                .bind(input.name.trim())
                .fetch_one(&self.db)
                .await?;
        if duplicate > 0 {
            return Err(AppError::Conflict(
                "A product with this name already exists".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (name, unit, alert_quantity, reference_buy_price, reference_sell_price, total_stock)
            VALUES ($1, $2, $3, $4, $5, 0)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.unit.trim())
        .bind(input.alert_quantity)
        .bind(input.reference_buy_price)
        .bind(input.reference_sell_price)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Created product {} ({})", row.name, row.id);
        Ok(row.into())
    }

    /// Update a product's descriptive fields and reference prices
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(product_id).await?;
        validate_update(&input)?;

        let name = input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name);
        let unit = input.unit.map(|u| u.trim().to_string()).unwrap_or(existing.unit);
        let alert_quantity = input.alert_quantity.unwrap_or(existing.alert_quantity);
        let reference_buy_price = input.reference_buy_price.unwrap_or(existing.reference_buy_price);
        let reference_sell_price = input
            .reference_sell_price
            .unwrap_or(existing.reference_sell_price);

        let duplicate: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE LOWER(name) = LOWER($1) AND id != $2",
        )
        .bind(&name)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;
        if duplicate > 0 {
            return Err(AppError::Conflict(
                "A product with this name already exists".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, unit = $2, alert_quantity = $3,
                reference_buy_price = $4, reference_sell_price = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(&unit)
        .bind(alert_quantity)
        .bind(reference_buy_price)
        .bind(reference_sell_price)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}

fn validate_create(input: &CreateProductInput) -> AppResult<()> {
    validate_name(&input.name).map_err(|msg| AppError::Validation {
        field: "name".to_string(),
        message: msg.to_string(),
    })?;
    validate_name(&input.unit).map_err(|msg| AppError::Validation {
        field: "unit".to_string(),
        message: msg.to_string(),
    })?;
    if input.alert_quantity < 0 {
        return Err(AppError::Validation {
            field: "alert_quantity".to_string(),
            message: "Alert quantity cannot be negative".to_string(),
        });
    }
    validate_unit_price(input.reference_buy_price).map_err(|msg| AppError::Validation {
        field: "reference_buy_price".to_string(),
        message: msg.to_string(),
    })?;
    validate_unit_price(input.reference_sell_price).map_err(|msg| AppError::Validation {
        field: "reference_sell_price".to_string(),
        message: msg.to_string(),
    })?;
    Ok(())
}

fn validate_update(input: &UpdateProductInput) -> AppResult<()> {
    if let Some(ref name) = input.name {
        validate_name(name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
    }
    if let Some(ref unit) = input.unit {
        validate_name(unit).map_err(|msg| AppError::Validation {
            field: "unit".to_string(),
            message: msg.to_string(),
        })?;
    }
    if let Some(alert) = input.alert_quantity {
        if alert < 0 {
            return Err(AppError::Validation {
                field: "alert_quantity".to_string(),
                message: "Alert quantity cannot be negative".to_string(),
            });
        }
    }
    if let Some(price) = input.reference_buy_price {
        validate_unit_price(price).map_err(|msg| AppError::Validation {
            field: "reference_buy_price".to_string(),
            message: msg.to_string(),
        })?;
    }
    if let Some(price) = input.reference_sell_price {
        validate_unit_price(price).map_err(|msg| AppError::Validation {
            field: "reference_sell_price".to_string(),
            message: msg.to_string(),
        })?;
    }
    Ok(())
}
