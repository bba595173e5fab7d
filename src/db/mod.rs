#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product};

/// Persistence gateway for products. Handlers and the scan job only see this trait.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert_product(&self, product: &NewProduct) -> AppResult<Product>;

    async fn fetch_product_by_id(&self, id: i32) -> AppResult<Product>;

    async fn update_stock(&self, id: i32, stock: i32) -> AppResult<Product>;

    /// Products with `stock < threshold`, ordered by stock ascending.
    async fn fetch_low_stock(&self, threshold: i32) -> AppResult<Vec<Product>>;
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Product with ID={} not found", id))
}

pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert_product(&self, product: &NewProduct) -> AppResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (name, stock) VALUES ($1, $2) RETURNING id, name, stock",
        )
        .bind(&product.name)
        .bind(product.stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn fetch_product_by_id(&self, id: i32) -> AppResult<Product> {
        sqlx::query_as::<_, Product>("SELECT id, name, stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn update_stock(&self, id: i32, stock: i32) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(
            "UPDATE products SET stock = $1 WHERE id = $2 RETURNING id, name, stock",
        )
        .bind(stock)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn fetch_low_stock(&self, threshold: i32) -> AppResult<Vec<Product>> {
        // Scoped session: the pooled connection goes back on drop, on every path.
        let mut conn = self.pool.acquire().await?;

        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, stock FROM products WHERE stock < $1 ORDER BY stock ASC, id ASC",
        )
        .bind(threshold)
        .fetch_all(&mut *conn)
        .await?;

        Ok(products)
    }
}
