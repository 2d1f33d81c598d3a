//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::{error, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::ids;
use crate::models::{AddStock, CreateProduct, Product, ProductPage, Purchase, StockTotal, UpdateProduct};
use crate::query::ProductQuery;
use crate::repository::ProductRepository;

/// Product operations and the stock ledger rules.
///
/// Every stock increase is paired with exactly one [`Purchase`] for the
/// added quantity. The pair is not transactional: when the ledger write
/// fails, the product write is undone before the error is returned.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a product owned by `user` and record its opening stock.
    #[instrument(skip(self, input), fields(product_name = %input.name))]
    pub async fn create(&self, input: CreateProduct, user: Uuid) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let seller_name = self.seller_name(input.seller).await;
        let product = self
            .repository
            .create(Product::new(input, user))
            .await
            .map_err(|e| {
                error!(error = %e, "Product insert failed");
                ProductError::CreateFailed
            })?;

        let purchase = Purchase::record(&product, user, product.seller, seller_name, product.stock);
        if let Err(e) = self.repository.create_purchase(purchase).await {
            error!(product_id = %product.id, error = %e, "Opening purchase failed, removing product");
            if let Err(rollback) = self.repository.delete(product.id).await {
                error!(product_id = %product.id, error = %rollback, "Could not remove product without purchase");
            }
            return Err(ProductError::CreateFailed);
        }

        Ok(product)
    }

    /// Total stock across the user's products; empty when they own none.
    #[instrument(skip(self))]
    pub async fn count_total_product(&self, user: Uuid) -> ProductResult<Vec<StockTotal>> {
        self.repository.stock_totals(user).await
    }

    /// One populated page of the user's products plus the total match count.
    #[instrument(skip(self, query))]
    pub async fn read_all(&self, query: ProductQuery, user: Uuid) -> ProductResult<ProductPage> {
        let (page, total_count) = tokio::try_join!(
            self.repository.find_page(query.clone(), user),
            self.repository.count_matching(query, user),
        )?;

        let data = self.repository.populate(page).await?;
        Ok(ProductPage { data, total_count })
    }

    /// `NotFound` if the id is unknown; `None` if it belongs to another user.
    #[instrument(skip(self))]
    pub async fn read(&self, id: Uuid, user: Uuid) -> ProductResult<Option<Product>> {
        if !self.repository.exists(id).await? {
            return Err(ProductError::NotFound(id));
        }

        self.repository.find_owned(id, user).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateProduct,
        user: Uuid,
    ) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository
            .update(id, user, input)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Delete the given products regardless of owner; returns how many existed.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn bulk_delete(&self, ids: &[String]) -> ProductResult<u64> {
        let ids = ids::parse_all(ids).map_err(ProductError::InvalidId)?;
        if ids.is_empty() {
            return Ok(0);
        }

        self.repository.delete_many(ids).await
    }

    /// Add stock bought from a seller; returns the product as it was before.
    #[instrument(skip(self, input), fields(added = input.stock))]
    pub async fn add_to_stock(
        &self,
        id: Uuid,
        input: AddStock,
        user: Uuid,
    ) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let product = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let seller_name = self.seller_name(input.seller).await;

        if !self.repository.increment_stock(id, input.stock).await? {
            return Err(ProductError::NotFound(id));
        }

        let purchase = Purchase::record(&product, user, input.seller, seller_name, input.stock);
        if let Err(e) = self.repository.create_purchase(purchase).await {
            error!(product_id = %id, error = %e, "Stock purchase failed, reverting increment");
            if let Err(rollback) = self.repository.increment_stock(id, -input.stock).await {
                error!(product_id = %id, error = %rollback, "Could not revert stock increment");
            }
            return Err(ProductError::StockAddFailed);
        }

        Ok(product)
    }

    /// Denormalized seller name; lookup failures degrade to an empty string.
    async fn seller_name(&self, seller: Option<Uuid>) -> String {
        let Some(id) = seller else {
            return String::new();
        };

        match self.repository.find_seller(id).await {
            Ok(Some(seller)) => seller.name,
            Ok(None) => String::new(),
            Err(e) => {
                warn!(seller_id = %id, error = %e, "Seller lookup failed");
                String::new()
            }
        }
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductView, SellerRef};
    use crate::repository::MockProductRepository;
    use chrono::Utc;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    fn create_input(stock: i64, seller: Option<Uuid>) -> CreateProduct {
        CreateProduct {
            name: "Desk lamp".to_string(),
            price: 12.5,
            stock,
            category: None,
            brand: None,
            seller,
            description: None,
            size: None,
        }
    }

    fn stored_product(user: Uuid, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::now_v7(),
            name: "Desk lamp".to_string(),
            price: 12.5,
            stock,
            category: None,
            brand: None,
            seller: None,
            user,
            description: None,
            size: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn seller(id: Uuid, name: &str) -> SellerRef {
        SellerRef {
            id,
            name: name.to_string(),
            email: None,
            contact_no: None,
        }
    }

    #[tokio::test]
    async fn test_create_sets_owner_and_records_opening_purchase() {
        let mut mock_repo = MockProductRepository::new();
        let user = Uuid::now_v7();
        let seller_id = Uuid::now_v7();
        let recorded: Arc<Mutex<Vec<Purchase>>> = Arc::default();
        let sink = recorded.clone();

        mock_repo
            .expect_find_seller()
            .with(eq(seller_id))
            .returning(move |id| Ok(Some(seller(id, "Acme Supplies"))));
        mock_repo
            .expect_create()
            .withf(move |p| p.user == user && p.stock == 8)
            .returning(|p| Ok(p));
        mock_repo.expect_create_purchase().times(1).returning(move |p| {
            sink.lock().unwrap().push(p.clone());
            Ok(p)
        });

        let service = ProductService::new(mock_repo);
        let product = service
            .create(create_input(8, Some(seller_id)), user)
            .await
            .unwrap();

        assert_eq!(product.user, user);

        let purchases = recorded.lock().unwrap();
        assert_eq!(purchases.len(), 1);
        let purchase = &purchases[0];
        assert_eq!(purchase.product, product.id);
        assert_eq!(purchase.quantity, 8);
        assert_eq!(purchase.unit_price, 12.5);
        assert_eq!(purchase.total_price, 100.0);
        assert_eq!(purchase.seller_name, "Acme Supplies");
        assert_eq!(purchase.seller, Some(seller_id));
    }

    #[tokio::test]
    async fn test_create_with_empty_optional_fields_persists_none() {
        let mut mock_repo = MockProductRepository::new();
        let user = Uuid::now_v7();
        let input: CreateProduct = serde_json::from_value(serde_json::json!({
            "name": "Notebook",
            "price": 3.0,
            "stock": 2,
            "category": "",
            "brand": "",
            "seller": "",
            "description": "",
            "size": "",
            "user": Uuid::now_v7().to_string()
        }))
        .unwrap();

        mock_repo
            .expect_create()
            .withf(move |p| {
                p.user == user
                    && p.category.is_none()
                    && p.brand.is_none()
                    && p.seller.is_none()
                    && p.description.is_none()
                    && p.size.is_none()
            })
            .returning(|p| Ok(p));
        mock_repo
            .expect_create_purchase()
            .withf(|p| p.seller_name.is_empty() && p.seller.is_none())
            .returning(|p| Ok(p));

        let service = ProductService::new(mock_repo);
        let product = service.create(input, user).await.unwrap();
        assert_eq!(product.user, user);
    }

    #[tokio::test]
    async fn test_create_tolerates_missing_seller() {
        let mut mock_repo = MockProductRepository::new();
        let user = Uuid::now_v7();

        mock_repo
            .expect_find_seller()
            .returning(|_| Err(ProductError::Database("timeout".to_string())));
        mock_repo.expect_create().returning(|p| Ok(p));
        mock_repo
            .expect_create_purchase()
            .withf(|p| p.seller_name.is_empty())
            .returning(|p| Ok(p));

        let service = ProductService::new(mock_repo);
        assert!(
            service
                .create(create_input(1, Some(Uuid::now_v7())), user)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_create_insert_failure_is_create_failed() {
        let mut mock_repo = MockProductRepository::new();

        mock_repo
            .expect_create()
            .returning(|_| Err(ProductError::Database("duplicate key".to_string())));
        mock_repo.expect_create_purchase().never();

        let service = ProductService::new(mock_repo);
        let err = service
            .create(create_input(1, None), Uuid::now_v7())
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::CreateFailed));
    }

    #[tokio::test]
    async fn test_create_removes_product_when_purchase_fails() {
        let mut mock_repo = MockProductRepository::new();
        let created_id: Arc<Mutex<Option<Uuid>>> = Arc::default();
        let seen = created_id.clone();

        mock_repo.expect_create().returning(move |p| {
            *seen.lock().unwrap() = Some(p.id);
            Ok(p)
        });
        mock_repo
            .expect_create_purchase()
            .returning(|_| Err(ProductError::Database("write concern".to_string())));
        let expected = created_id.clone();
        mock_repo
            .expect_delete()
            .withf(move |id| Some(*id) == *expected.lock().unwrap())
            .times(1)
            .returning(|_| Ok(true));

        let service = ProductService::new(mock_repo);
        let err = service
            .create(create_input(5, None), Uuid::now_v7())
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::CreateFailed));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payload() {
        let mock_repo = MockProductRepository::new();
        let service = ProductService::new(mock_repo);

        let err = service
            .create(create_input(-3, None), Uuid::now_v7())
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::Validation(_)));
    }

    #[tokio::test]
    async fn test_add_to_stock_increments_by_delta_and_returns_previous_state() {
        let mut mock_repo = MockProductRepository::new();
        let user = Uuid::now_v7();
        let product = stored_product(user, 10);
        let id = product.id;
        let seller_id = Uuid::now_v7();
        let snapshot = product.clone();

        mock_repo
            .expect_get_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(snapshot.clone())));
        mock_repo
            .expect_find_seller()
            .with(eq(seller_id))
            .returning(move |id| Ok(Some(seller(id, "Northwind"))));
        mock_repo
            .expect_increment_stock()
            .with(eq(id), eq(4))
            .times(1)
            .returning(|_, _| Ok(true));
        mock_repo
            .expect_create_purchase()
            .withf(move |p| {
                p.product == id
                    && p.quantity == 4
                    && p.total_price == 50.0
                    && p.seller == Some(seller_id)
                    && p.seller_name == "Northwind"
            })
            .times(1)
            .returning(|p| Ok(p));

        let service = ProductService::new(mock_repo);
        let returned = service
            .add_to_stock(
                id,
                AddStock {
                    seller: Some(seller_id),
                    stock: 4,
                },
                user,
            )
            .await
            .unwrap();

        assert_eq!(returned, product);
        assert_eq!(returned.stock, 10);
    }

    #[tokio::test]
    async fn test_add_to_stock_unknown_product_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        let id = Uuid::now_v7();

        mock_repo.expect_get_by_id().returning(|_| Ok(None));
        mock_repo.expect_increment_stock().never();

        let service = ProductService::new(mock_repo);
        let err = service
            .add_to_stock(
                id,
                AddStock {
                    seller: None,
                    stock: 1,
                },
                Uuid::now_v7(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_add_to_stock_reverts_increment_when_purchase_fails() {
        let mut mock_repo = MockProductRepository::new();
        let user = Uuid::now_v7();
        let product = stored_product(user, 2);
        let id = product.id;

        mock_repo
            .expect_get_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        mock_repo
            .expect_increment_stock()
            .with(eq(id), eq(6))
            .times(1)
            .returning(|_, _| Ok(true));
        mock_repo
            .expect_create_purchase()
            .returning(|_| Err(ProductError::Database("not primary".to_string())));
        mock_repo
            .expect_increment_stock()
            .with(eq(id), eq(-6))
            .times(1)
            .returning(|_, _| Ok(true));

        let service = ProductService::new(mock_repo);
        let err = service
            .add_to_stock(
                id,
                AddStock {
                    seller: None,
                    stock: 6,
                },
                user,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::StockAddFailed));
    }

    #[tokio::test]
    async fn test_read_other_users_product_is_empty() {
        let mut mock_repo = MockProductRepository::new();
        let id = Uuid::now_v7();
        let caller = Uuid::now_v7();

        mock_repo
            .expect_exists()
            .with(eq(id))
            .returning(|_| Ok(true));
        mock_repo
            .expect_find_owned()
            .with(eq(id), eq(caller))
            .returning(|_, _| Ok(None));

        let service = ProductService::new(mock_repo);
        assert_eq!(service.read(id, caller).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_unknown_id_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_exists().returning(|_| Ok(false));
        mock_repo.expect_find_owned().never();

        let service = ProductService::new(mock_repo);
        let err = service
            .read(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bulk_delete_returns_deleted_count() {
        let mut mock_repo = MockProductRepository::new();
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();

        mock_repo
            .expect_delete_many()
            .with(eq(vec![first, second]))
            .returning(|_| Ok(2));

        let service = ProductService::new(mock_repo);
        let deleted = service
            .bulk_delete(&[first.to_string(), second.to_string()])
            .await
            .unwrap();

        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_bulk_delete_counts_only_existing() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_delete_many().returning(|_| Ok(1));

        let service = ProductService::new(mock_repo);
        let deleted = service
            .bulk_delete(&[Uuid::now_v7().to_string(), Uuid::now_v7().to_string()])
            .await
            .unwrap();

        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_rejects_malformed_id() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_delete_many().never();

        let service = ProductService::new(mock_repo);
        let err = service
            .bulk_delete(&[Uuid::now_v7().to_string(), "42".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::InvalidId(raw) if raw == "42"));
    }

    #[tokio::test]
    async fn test_count_total_product_empty_for_user_without_products() {
        let mut mock_repo = MockProductRepository::new();
        let user = Uuid::now_v7();

        mock_repo
            .expect_stock_totals()
            .with(eq(user))
            .returning(|_| Ok(vec![]));

        let service = ProductService::new(mock_repo);
        assert!(service.count_total_product(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_all_populates_page_and_reports_total() {
        let mut mock_repo = MockProductRepository::new();
        let user = Uuid::now_v7();
        let product = stored_product(user, 3);
        let page = vec![product.clone()];

        mock_repo
            .expect_find_page()
            .withf(move |q, u| *u == user && q.page == Some(2))
            .returning(move |_, _| Ok(page.clone()));
        mock_repo
            .expect_count_matching()
            .withf(move |_, u| *u == user)
            .returning(|_, _| Ok(11));
        mock_repo.expect_populate().returning(|products| {
            Ok(products
                .into_iter()
                .map(|p| ProductView::from_product(p, None, None, None))
                .collect())
        });

        let service = ProductService::new(mock_repo);
        let query = ProductQuery {
            page: Some(2),
            ..Default::default()
        };
        let result = service.read_all(query, user).await.unwrap();

        assert_eq!(result.total_count, 11);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].id, product.id);
    }

    #[tokio::test]
    async fn test_update_unowned_product_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_update().returning(|_, _, _| Ok(None));

        let service = ProductService::new(mock_repo);
        let err = service
            .update(Uuid::now_v7(), UpdateProduct::default(), Uuid::now_v7())
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::NotFound(_)));
    }
}
