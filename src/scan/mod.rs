use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::db::ProductStore;
use crate::error::AppResult;
use crate::models::Product;

pub const NO_LOW_STOCK: &str = "No products below stock threshold.";

/// Warning line logged for one product under the threshold.
pub fn low_stock_alert(product: &Product) -> String {
    format!(
        "LOW STOCK ALERT! Product {} (ID={}) -> stock={}",
        product.name, product.id, product.stock
    )
}

/// One scan: logs every product whose stock is below `threshold` and returns how many there were.
pub async fn run_once(store: &dyn ProductStore, threshold: i32) -> AppResult<usize> {
    let low_stock = store.fetch_low_stock(threshold).await?;

    if low_stock.is_empty() {
        info!(threshold, "{}", NO_LOW_STOCK);
    }
    for product in &low_stock {
        warn!(
            id = product.id,
            name = %product.name,
            stock = product.stock,
            "{}",
            low_stock_alert(product)
        );
    }

    Ok(low_stock.len())
}

/// Spawns the periodic scan. The first run happens one full `every` after startup.
pub fn spawn(store: Arc<dyn ProductStore>, threshold: i32, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        info!(threshold, every_secs = every.as_secs(), "Low-stock scan scheduled");
        loop {
            ticker.tick().await;
            if let Err(e) = run_once(store.as_ref(), threshold).await {
                error!(error = %e, "Low-stock scan failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryProductStore;
    use crate::models::NewProduct;

    async fn store_with(stocks: &[(&str, i32)]) -> MemoryProductStore {
        let store = MemoryProductStore::new();
        for (name, stock) in stocks {
            store
                .insert_product(&NewProduct { name: name.to_string(), stock: *stock })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn counts_only_products_strictly_below_threshold() {
        let store = store_with(&[("Bolt", 2), ("Nut", 10), ("Gear", 9), ("Cog", 50)]).await;
        assert_eq!(run_once(&store, 10).await.unwrap(), 2);
    }

    #[test]
    fn alert_places_fields_by_name() {
        let product = Product { id: 7, name: "Hex Bolt".into(), stock: 3 };
        assert_eq!(
            low_stock_alert(&product),
            "LOW STOCK ALERT! Product Hex Bolt (ID=7) -> stock=3"
        );
    }

    #[tokio::test]
    async fn alerts_cover_each_low_product_in_stock_order() {
        let store = store_with(&[("Gear", 9), ("Cog", 50), ("Bolt", 2)]).await;
        let alerts: Vec<String> = store
            .fetch_low_stock(10)
            .await
            .unwrap()
            .iter()
            .map(low_stock_alert)
            .collect();
        assert_eq!(
            alerts,
            vec![
                "LOW STOCK ALERT! Product Bolt (ID=3) -> stock=2",
                "LOW STOCK ALERT! Product Gear (ID=1) -> stock=9",
            ]
        );
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let store = store_with(&[("Cog", 50)]).await;
        assert_eq!(run_once(&store, 10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = store_with(&[]).await;
        store.break_connection();
        assert!(run_once(&store, 10).await.is_err());
    }

    #[tokio::test]
    async fn spawned_scan_survives_failing_runs() {
        let store = Arc::new(MemoryProductStore::new());
        store.break_connection();
        let handle = spawn(store, 10, Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
