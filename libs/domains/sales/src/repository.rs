use async_trait::async_trait;
use uuid::Uuid;

use crate::error::SaleResult;
use crate::models::Sale;
use crate::query::SaleQuery;

/// Data access for sales and the product stock they consume.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SaleRepository: Send + Sync {
    async fn create(&self, sale: Sale) -> SaleResult<Sale>;

    /// Sale with this id owned by `user`
    async fn find_owned(&self, id: Uuid, user: Uuid) -> SaleResult<Option<Sale>>;

    /// Overwrite a sale owned by `sale.user`; false if it no longer exists
    async fn replace(&self, sale: Sale) -> SaleResult<bool>;

    async fn delete_many(&self, ids: Vec<Uuid>) -> SaleResult<u64>;

    async fn find_page(&self, query: SaleQuery, user: Uuid) -> SaleResult<Vec<Sale>>;

    async fn count_matching(&self, query: SaleQuery, user: Uuid) -> SaleResult<u64>;

    /// Whether `user` owns a product with this id
    async fn product_exists(&self, product: Uuid, user: Uuid) -> SaleResult<bool>;

    /// Atomically take `quantity` units if at least that many are in stock
    async fn decrement_stock_if_available(
        &self,
        product: Uuid,
        user: Uuid,
        quantity: i64,
    ) -> SaleResult<bool>;

    /// Give back units taken by a sale that could not be recorded
    async fn restore_stock(&self, product: Uuid, quantity: i64) -> SaleResult<bool>;
}
