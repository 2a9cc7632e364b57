//! Product repository for database operations

use async_trait::async_trait;
use common::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::ProductStore;
use crate::models::{NewProduct, Product, ProductQuery, ProductUpdate};

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image, brand, category, in_stock, rating, created_at, updated_at";

/// Product repository
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn product_from_row(row: &PgRow) -> Product {
    Product {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        image: row.get("image"),
        brand: row.get("brand"),
        category: row.get("category"),
        in_stock: row.get("in_stock"),
        rating: row.get("rating"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Escape LIKE wildcards so the search term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl ProductStore for PgProductRepository {
    async fn list(&self, query: &ProductQuery) -> DatabaseResult<Vec<Product>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(brand) = &query.brand {
            builder.push(" AND brand = ").push_bind(brand.clone());
        }
        if let Some(category) = &query.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            builder
                .push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder.push(" ORDER BY created_at ASC, id ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn find(&self, id: Uuid) -> DatabaseResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    async fn create(&self, product: &NewProduct) -> DatabaseResult<Product> {
        info!("Creating product: {}", product.name);

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, description, price, image, brand, category, in_stock, rating)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image)
        .bind(&product.brand)
        .bind(&product.category)
        .bind(product.in_stock)
        .bind(product.rating)
        .fetch_one(&self.pool)
        .await?;

        Ok(product_from_row(&row))
    }

    async fn update(&self, id: Uuid, update: &ProductUpdate) -> DatabaseResult<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                image = COALESCE($5, image),
                brand = COALESCE($6, brand),
                category = COALESCE($7, category),
                in_stock = COALESCE($8, in_stock),
                rating = COALESCE($9, rating),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price)
        .bind(&update.image)
        .bind(&update.brand)
        .bind(&update.category)
        .bind(update.in_stock)
        .bind(update.rating)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(product_from_row))
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn existing_ids(&self, ids: &[Uuid]) -> DatabaseResult<Vec<Uuid>> {
        let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(found)
    }
}
