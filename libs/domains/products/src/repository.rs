use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Product, ProductView, Purchase, SellerRef, StockTotal, UpdateProduct};
use crate::query::ProductQuery;

/// Data access for products, their purchase ledger and the reference
/// collections they point at.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a fully built product
    async fn create(&self, product: Product) -> ProductResult<Product>;

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// Whether any product has this id, regardless of owner
    async fn exists(&self, id: Uuid) -> ProductResult<bool>;

    /// Product with this id owned by `user`
    async fn find_owned(&self, id: Uuid, user: Uuid) -> ProductResult<Option<Product>>;

    /// Apply `changes` to the product owned by `user`, returning the new state
    async fn update(
        &self,
        id: Uuid,
        user: Uuid,
        changes: UpdateProduct,
    ) -> ProductResult<Option<Product>>;

    /// Atomically add `delta` (may be negative) to stock; false if no such product
    async fn increment_stock(&self, id: Uuid, delta: i64) -> ProductResult<bool>;

    async fn delete(&self, id: Uuid) -> ProductResult<bool>;

    /// Delete every product in `ids`, returning how many existed
    async fn delete_many(&self, ids: Vec<Uuid>) -> ProductResult<u64>;

    /// One page of the user's products matching `query`
    async fn find_page(&self, query: ProductQuery, user: Uuid) -> ProductResult<Vec<Product>>;

    /// Number of the user's products matching `query`
    async fn count_matching(&self, query: ProductQuery, user: Uuid) -> ProductResult<u64>;

    /// Sum of stock across the user's products; empty when they own none
    async fn stock_totals(&self, user: Uuid) -> ProductResult<Vec<StockTotal>>;

    /// Resolve category, brand and seller references
    async fn populate(&self, products: Vec<Product>) -> ProductResult<Vec<ProductView>>;

    async fn find_seller(&self, id: Uuid) -> ProductResult<Option<SellerRef>>;

    /// Append a ledger entry
    async fn create_purchase(&self, purchase: Purchase) -> ProductResult<Purchase>;
}
