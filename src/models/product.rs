use serde::{Deserialize, Serialize};

/// Core product entity, one row of the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Assigned by the store on insert.
    pub id: i32,
    pub name: String,
    pub stock: i32,
}

// ── Request payloads ─────────────────────────────────────────────────────────

/// Body of `POST /products/`. Both fields are required; any `i32` stock is accepted.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub stock: i32,
}

/// Query string of `PUT /products/:id?stock=N`.
#[derive(Debug, Deserialize)]
pub struct StockUpdate {
    pub stock: i32,
}

/// A create request that has passed extraction. Only this type reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub stock: i32,
}

impl From<CreateProduct> for NewProduct {
    fn from(payload: CreateProduct) -> Self {
        Self {
            name: payload.name,
            stock: payload.stock,
        }
    }
}
