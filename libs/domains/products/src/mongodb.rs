//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc, from_document, to_bson},
    options::{IndexOptions, ReturnDocument},
};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    BrandRef, CategoryRef, Product, ProductView, Purchase, SellerRef, StockTotal, UpdateProduct,
};
use crate::query::{ProductQuery, count_stage, match_stage, sort_and_paginate_stages, total_from};
use crate::repository::ProductRepository;

pub const PRODUCTS: &str = "products";
pub const PURCHASES: &str = "purchases";
pub const SELLERS: &str = "sellers";
pub const CATEGORIES: &str = "categories";
pub const BRANDS: &str = "brands";

/// Bookkeeping fields never exposed on populated references.
fn reference_projection() -> Document {
    doc! { "__v": 0, "user": 0, "created_at": 0, "updated_at": 0 }
}

/// `$set` document for a partial update; stock is not updatable.
pub fn update_document(changes: &UpdateProduct) -> ProductResult<Document> {
    let mut set = doc! { "updated_at": to_bson(&Utc::now())? };

    if let Some(name) = &changes.name {
        set.insert("name", name.as_str());
    }
    if let Some(price) = changes.price {
        set.insert("price", price);
    }
    if let Some(category) = changes.category {
        set.insert("category", category.to_string());
    }
    if let Some(brand) = changes.brand {
        set.insert("brand", brand.to_string());
    }
    if let Some(seller) = changes.seller {
        set.insert("seller", seller.to_string());
    }
    if let Some(description) = &changes.description {
        set.insert("description", description.as_str());
    }
    if let Some(size) = &changes.size {
        set.insert("size", size.as_str());
    }

    Ok(doc! { "$set": set })
}

pub struct MongoProductRepository {
    products: Collection<Product>,
    purchases: Collection<Purchase>,
    sellers: Collection<SellerRef>,
    categories: Collection<CategoryRef>,
    brands: Collection<BrandRef>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            products: db.collection(PRODUCTS),
            purchases: db.collection(PURCHASES),
            sellers: db.collection(SELLERS),
            categories: db.collection(CATEGORIES),
            brands: db.collection(BRANDS),
        }
    }

    /// Indexes backing the per-user listings and the ledger lookups
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let product_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "user": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_user_created_at".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "user": 1, "name": 1 })
                .options(IndexOptions::builder().name("idx_user_name".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "user": 1, "price": 1 })
                .options(IndexOptions::builder().name("idx_user_price".to_string()).build())
                .build(),
        ];
        self.products.create_indexes(product_indexes).await?;

        let purchase_index = IndexModel::builder()
            .keys(doc! { "user": 1, "product": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("idx_user_product".to_string())
                    .build(),
            )
            .build();
        self.purchases.create_index(purchase_index).await?;

        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    async fn aggregate_products(&self, pipeline: Vec<Document>) -> ProductResult<Vec<Document>> {
        let cursor = self.products.aggregate(pipeline).await?;
        Ok(cursor.try_collect().await?)
    }
}

/// Fetch the referenced rows of one collection keyed by id.
async fn lookup<T>(
    collection: &Collection<T>,
    ids: HashSet<Uuid>,
    key: fn(&T) -> Uuid,
) -> ProductResult<HashMap<Uuid, T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
    let cursor = collection
        .find(doc! { "_id": { "$in": ids } })
        .projection(reference_projection())
        .await?;
    let rows: Vec<T> = cursor.try_collect().await?;

    Ok(rows.into_iter().map(|row| (key(&row), row)).collect())
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_id = %product.id, product_name = %product.name))]
    async fn create(&self, product: Product) -> ProductResult<Product> {
        self.products.insert_one(&product).await?;

        tracing::info!("Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        Ok(self
            .products
            .find_one(doc! { "_id": id.to_string() })
            .await?)
    }

    #[instrument(skip(self))]
    async fn exists(&self, id: Uuid) -> ProductResult<bool> {
        let count = self
            .products
            .count_documents(doc! { "_id": id.to_string() })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn find_owned(&self, id: Uuid, user: Uuid) -> ProductResult<Option<Product>> {
        Ok(self
            .products
            .find_one(doc! { "_id": id.to_string(), "user": user.to_string() })
            .await?)
    }

    #[instrument(skip(self, changes))]
    async fn update(
        &self,
        id: Uuid,
        user: Uuid,
        changes: UpdateProduct,
    ) -> ProductResult<Option<Product>> {
        let updated = self
            .products
            .find_one_and_update(
                doc! { "_id": id.to_string(), "user": user.to_string() },
                update_document(&changes)?,
            )
            .return_document(ReturnDocument::After)
            .await?;

        if updated.is_some() {
            tracing::info!("Product updated successfully");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn increment_stock(&self, id: Uuid, delta: i64) -> ProductResult<bool> {
        let result = self
            .products
            .update_one(
                doc! { "_id": id.to_string() },
                doc! {
                    "$inc": { "stock": delta },
                    "$set": { "updated_at": to_bson(&Utc::now())? }
                },
            )
            .await?;

        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let result = self
            .products
            .delete_one(doc! { "_id": id.to_string() })
            .await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn delete_many(&self, ids: Vec<Uuid>) -> ProductResult<u64> {
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let result = self
            .products
            .delete_many(doc! { "_id": { "$in": ids } })
            .await?;

        tracing::info!(deleted = result.deleted_count, "Products deleted");
        Ok(result.deleted_count)
    }

    #[instrument(skip(self, query))]
    async fn find_page(&self, query: ProductQuery, user: Uuid) -> ProductResult<Vec<Product>> {
        let mut pipeline = vec![match_stage(&query, user)];
        pipeline.extend(sort_and_paginate_stages(&query.sort(), &query.pagination()));

        self.aggregate_products(pipeline)
            .await?
            .into_iter()
            .map(|document| from_document::<Product>(document).map_err(ProductError::from))
            .collect()
    }

    #[instrument(skip(self, query))]
    async fn count_matching(&self, query: ProductQuery, user: Uuid) -> ProductResult<u64> {
        let pipeline = vec![match_stage(&query, user), count_stage()];
        let rows = self.aggregate_products(pipeline).await?;
        Ok(total_from(rows.into_iter().next()))
    }

    #[instrument(skip(self))]
    async fn stock_totals(&self, user: Uuid) -> ProductResult<Vec<StockTotal>> {
        let pipeline = vec![
            doc! { "$match": { "user": user.to_string() } },
            doc! { "$group": { "_id": null, "totalQuantity": { "$sum": "$stock" } } },
            doc! { "$project": { "_id": 0 } },
        ];

        self.aggregate_products(pipeline)
            .await?
            .into_iter()
            .map(|document| from_document::<StockTotal>(document).map_err(ProductError::from))
            .collect()
    }

    #[instrument(skip(self, products), fields(count = products.len()))]
    async fn populate(&self, products: Vec<Product>) -> ProductResult<Vec<ProductView>> {
        let category_ids = products.iter().filter_map(|p| p.category).collect();
        let brand_ids = products.iter().filter_map(|p| p.brand).collect();
        let seller_ids = products.iter().filter_map(|p| p.seller).collect();

        let (categories, brands, sellers) = tokio::try_join!(
            lookup(&self.categories, category_ids, |c: &CategoryRef| c.id),
            lookup(&self.brands, brand_ids, |b: &BrandRef| b.id),
            lookup(&self.sellers, seller_ids, |s: &SellerRef| s.id),
        )?;

        Ok(products
            .into_iter()
            .map(|product| {
                let category = product.category.and_then(|id| categories.get(&id).cloned());
                let brand = product.brand.and_then(|id| brands.get(&id).cloned());
                let seller = product.seller.and_then(|id| sellers.get(&id).cloned());
                ProductView::from_product(product, category, brand, seller)
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn find_seller(&self, id: Uuid) -> ProductResult<Option<SellerRef>> {
        Ok(self
            .sellers
            .find_one(doc! { "_id": id.to_string() })
            .projection(reference_projection())
            .await?)
    }

    #[instrument(skip(self, purchase), fields(product_id = %purchase.product, quantity = purchase.quantity))]
    async fn create_purchase(&self, purchase: Purchase) -> ProductResult<Purchase> {
        self.purchases.insert_one(&purchase).await?;

        tracing::info!(purchase_id = %purchase.id, "Purchase recorded");
        Ok(purchase)
    }
}
