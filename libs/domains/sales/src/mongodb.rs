//! MongoDB implementation of SaleRepository

use async_trait::async_trait;
use chrono::Utc;
use domain_products::mongodb::PRODUCTS;
use domain_products::query::{count_stage, sort_and_paginate_stages, total_from};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc, from_document, to_bson},
    options::IndexOptions,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{SaleError, SaleResult};
use crate::models::Sale;
use crate::query::{SaleQuery, match_stage};
use crate::repository::SaleRepository;

pub const SALES: &str = "sales";

pub struct MongoSaleRepository {
    sales: Collection<Sale>,
    /// Raw documents; only `stock` and `updated_at` are touched here
    products: Collection<Document>,
}

impl MongoSaleRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            sales: db.collection(SALES),
            products: db.collection(PRODUCTS),
        }
    }

    pub async fn init_indexes(&self) -> SaleResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "user": 1, "date": -1 })
                .options(IndexOptions::builder().name("idx_user_date".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "user": 1, "product": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_user_product".to_string())
                        .build(),
                )
                .build(),
        ];

        self.sales.create_indexes(indexes).await?;
        tracing::info!("Sale indexes created successfully");
        Ok(())
    }

    async fn aggregate_sales(&self, pipeline: Vec<Document>) -> SaleResult<Vec<Document>> {
        let cursor = self.sales.aggregate(pipeline).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl SaleRepository for MongoSaleRepository {
    #[instrument(skip(self, sale), fields(sale_id = %sale.id, product_id = %sale.product))]
    async fn create(&self, sale: Sale) -> SaleResult<Sale> {
        self.sales.insert_one(&sale).await?;

        tracing::info!(quantity = sale.quantity, "Sale recorded");
        Ok(sale)
    }

    #[instrument(skip(self))]
    async fn find_owned(&self, id: Uuid, user: Uuid) -> SaleResult<Option<Sale>> {
        Ok(self
            .sales
            .find_one(doc! { "_id": id.to_string(), "user": user.to_string() })
            .await?)
    }

    #[instrument(skip(self, sale), fields(sale_id = %sale.id))]
    async fn replace(&self, sale: Sale) -> SaleResult<bool> {
        let result = self
            .sales
            .replace_one(
                doc! { "_id": sale.id.to_string(), "user": sale.user.to_string() },
                &sale,
            )
            .await?;

        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn delete_many(&self, ids: Vec<Uuid>) -> SaleResult<u64> {
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let result = self
            .sales
            .delete_many(doc! { "_id": { "$in": ids } })
            .await?;

        tracing::info!(deleted = result.deleted_count, "Sales deleted");
        Ok(result.deleted_count)
    }

    #[instrument(skip(self, query))]
    async fn find_page(&self, query: SaleQuery, user: Uuid) -> SaleResult<Vec<Sale>> {
        let mut pipeline = vec![match_stage(&query, user)?];
        pipeline.extend(sort_and_paginate_stages(&query.sort(), &query.pagination()));

        self.aggregate_sales(pipeline)
            .await?
            .into_iter()
            .map(|document| from_document::<Sale>(document).map_err(SaleError::from))
            .collect()
    }

    #[instrument(skip(self, query))]
    async fn count_matching(&self, query: SaleQuery, user: Uuid) -> SaleResult<u64> {
        let pipeline = vec![match_stage(&query, user)?, count_stage()];
        let rows = self.aggregate_sales(pipeline).await?;
        Ok(total_from(rows.into_iter().next()))
    }

    #[instrument(skip(self))]
    async fn product_exists(&self, product: Uuid, user: Uuid) -> SaleResult<bool> {
        let count = self
            .products
            .count_documents(doc! { "_id": product.to_string(), "user": user.to_string() })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn decrement_stock_if_available(
        &self,
        product: Uuid,
        user: Uuid,
        quantity: i64,
    ) -> SaleResult<bool> {
        let result = self
            .products
            .update_one(
                doc! {
                    "_id": product.to_string(),
                    "user": user.to_string(),
                    "stock": { "$gte": quantity },
                },
                doc! {
                    "$inc": { "stock": -quantity },
                    "$set": { "updated_at": to_bson(&Utc::now())? },
                },
            )
            .await?;

        Ok(result.modified_count > 0)
    }

    #[instrument(skip(self))]
    async fn restore_stock(&self, product: Uuid, quantity: i64) -> SaleResult<bool> {
        let result = self
            .products
            .update_one(
                doc! { "_id": product.to_string() },
                doc! {
                    "$inc": { "stock": quantity },
                    "$set": { "updated_at": to_bson(&Utc::now())? },
                },
            )
            .await?;

        Ok(result.matched_count > 0)
    }
}
