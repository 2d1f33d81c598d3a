//! Sale Service - Business logic layer

use chrono::Utc;
use domain_products::ids;
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::error::{SaleError, SaleResult};
use crate::models::{CreateSale, Sale, SalePage, UpdateSale, parse_sale_date};
use crate::query::SaleQuery;
use crate::repository::SaleRepository;

/// Sales against the caller's own products.
///
/// Recording a sale takes the sold units out of the product's stock first.
/// The take is guarded so stock never goes negative; if the sale itself
/// cannot be stored, the units are put back.
pub struct SaleService<R: SaleRepository> {
    repository: Arc<R>,
}

impl<R: SaleRepository> SaleService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, input), fields(quantity = input.quantity))]
    pub async fn create(&self, input: CreateSale, user: Uuid) -> SaleResult<Sale> {
        input
            .validate()
            .map_err(|e| SaleError::Validation(e.to_string()))?;

        let product = parse_id(&input.product)?;
        let date = parse_date(&input.date)?;

        if !self.repository.product_exists(product, user).await? {
            return Err(SaleError::ProductNotFound(product));
        }

        if !self
            .repository
            .decrement_stock_if_available(product, user, input.quantity)
            .await?
        {
            return Err(SaleError::InsufficientStock {
                product,
                requested: input.quantity,
            });
        }

        let sale = Sale::new(
            user,
            product,
            input.quantity,
            input.product_price,
            input.buyer_name,
            date,
        );

        match self.repository.create(sale).await {
            Ok(sale) => Ok(sale),
            Err(e) => {
                error!(product_id = %product, error = %e, "Sale insert failed, restoring stock");
                if let Err(rollback) = self.repository.restore_stock(product, input.quantity).await {
                    error!(product_id = %product, error = %rollback, "Could not restore stock");
                }
                Err(SaleError::CreateFailed)
            }
        }
    }

    /// One page of the user's sales plus the total match count.
    #[instrument(skip(self, query))]
    pub async fn read_all(&self, query: SaleQuery, user: Uuid) -> SaleResult<SalePage> {
        query.date_range()?;

        let (data, total_count) = tokio::try_join!(
            self.repository.find_page(query.clone(), user),
            self.repository.count_matching(query, user),
        )?;

        Ok(SalePage { data, total_count })
    }

    #[instrument(skip(self))]
    pub async fn read(&self, id: Uuid, user: Uuid) -> SaleResult<Sale> {
        self.repository
            .find_owned(id, user)
            .await?
            .ok_or(SaleError::NotFound(id))
    }

    /// Apply the given fields and recompute the total. Stock is left as is.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateSale, user: Uuid) -> SaleResult<Sale> {
        input
            .validate()
            .map_err(|e| SaleError::Validation(e.to_string()))?;

        let mut sale = self
            .repository
            .find_owned(id, user)
            .await?
            .ok_or(SaleError::NotFound(id))?;

        if let Some(raw) = input.product.as_deref() {
            let product = parse_id(raw)?;
            if product != sale.product {
                if !self.repository.product_exists(product, user).await? {
                    return Err(SaleError::ProductNotFound(product));
                }
                sale.product = product;
            }
        }
        if let Some(quantity) = input.quantity {
            sale.quantity = quantity;
        }
        if let Some(price) = input.product_price {
            sale.product_price = price;
        }
        if let Some(buyer_name) = input.buyer_name {
            sale.buyer_name = buyer_name;
        }
        if let Some(raw) = input.date.as_deref() {
            sale.date = parse_date(raw)?;
        }

        sale.total_price = sale.quantity as f64 * sale.product_price;
        sale.updated_at = Utc::now();

        if !self.repository.replace(sale.clone()).await? {
            return Err(SaleError::NotFound(id));
        }

        Ok(sale)
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn bulk_delete(&self, ids: &[String]) -> SaleResult<u64> {
        let ids = ids::parse_all(ids).map_err(SaleError::InvalidId)?;
        if ids.is_empty() {
            return Ok(0);
        }

        self.repository.delete_many(ids).await
    }
}

impl<R: SaleRepository> Clone for SaleService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

fn parse_id(raw: &str) -> SaleResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| SaleError::InvalidId(raw.to_string()))
}

fn parse_date(raw: &str) -> SaleResult<chrono::DateTime<Utc>> {
    parse_sale_date(raw).ok_or_else(|| SaleError::Validation(format!("Invalid date: {raw}")))
}
