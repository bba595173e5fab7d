//! In-memory `ProductStore` used by the test suites in place of PostgreSQL.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{not_found, ProductStore};
use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product};

#[derive(Default)]
pub struct MemoryProductStore {
    rows: RwLock<BTreeMap<i32, Product>>,
    /// When set, every call fails the way an unreachable database would.
    broken: AtomicBool,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn break_connection(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub async fn snapshot(&self) -> Vec<Product> {
        self.rows.read().await.values().cloned().collect()
    }

    fn check(&self) -> AppResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert_product(&self, product: &NewProduct) -> AppResult<Product> {
        self.check()?;
        let mut rows = self.rows.write().await;
        let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        let row = Product {
            id,
            name: product.name.clone(),
            stock: product.stock,
        };
        rows.insert(id, row.clone());
        Ok(row)
    }

    async fn fetch_product_by_id(&self, id: i32) -> AppResult<Product> {
        self.check()?;
        self.rows.read().await.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn update_stock(&self, id: i32, stock: i32) -> AppResult<Product> {
        self.check()?;
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or_else(|| not_found(id))?;
        row.stock = stock;
        Ok(row.clone())
    }

    async fn fetch_low_stock(&self, threshold: i32) -> AppResult<Vec<Product>> {
        self.check()?;
        let mut low: Vec<Product> = self
            .rows
            .read()
            .await
            .values()
            .filter(|p| p.stock < threshold)
            .cloned()
            .collect();
        low.sort_by_key(|p| (p.stock, p.id));
        Ok(low)
    }
}
