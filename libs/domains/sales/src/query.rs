//! Sale listing filters, built on the shared pagination helpers.

use chrono::{DateTime, Duration, Utc};
use domain_products::models::empty_string_as_none;
use domain_products::query::{Pagination, Sort, SortOrder, contains_ignore_case};
use mongodb::bson::{Document, doc};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::{SaleError, SaleResult};
use crate::models::{is_date_only, parse_sale_date, sale_date_key};

pub const SALE_SORT_FIELDS: &[&str] = &["date", "quantity", "total_price", "created_at"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SaleQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub product: Option<Uuid>,
    /// Case-insensitive substring of the buyer name
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub buyer_name: Option<String>,
    /// Earliest sale date, inclusive
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub from: Option<String>,
    /// Latest sale date, inclusive; a plain day covers the whole day
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub to: Option<String>,
    /// One of `date`, `quantity`, `total_price`, `created_at`
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<u64>,
}

/// Upper end of a sale date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpperBound {
    /// A full timestamp; sales at exactly this instant match
    Through(DateTime<Utc>),
    /// Next midnight after a plain `to` day
    Before(DateTime<Utc>),
}

/// Resolved `date` bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<UpperBound>,
}

impl SaleQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }

    pub fn sort(&self) -> Sort {
        Sort::resolve(self.sort_by.as_deref(), self.sort_order, SALE_SORT_FIELDS)
    }

    pub fn date_range(&self) -> SaleResult<DateRange> {
        let parse = |raw: &str| {
            parse_sale_date(raw).ok_or_else(|| SaleError::Validation(format!("Invalid date: {raw}")))
        };

        let from = self.from.as_deref().map(parse).transpose()?;
        let to = match self.to.as_deref() {
            Some(raw) if is_date_only(raw) => {
                Some(UpperBound::Before(parse(raw)? + Duration::days(1)))
            }
            Some(raw) => Some(UpperBound::Through(parse(raw)?)),
            None => None,
        };

        Ok(DateRange { from, to })
    }
}

/// `$match` stage scoping sales to `user` plus the optional filters.
pub fn match_stage(query: &SaleQuery, user: Uuid) -> SaleResult<Document> {
    let mut filter = doc! { "user": user.to_string() };

    if let Some(product) = query.product {
        filter.insert("product", product.to_string());
    }
    if let Some(buyer) = &query.buyer_name {
        filter.insert("buyer_name", contains_ignore_case(buyer));
    }

    let range = query.date_range()?;
    let mut date = Document::new();
    if let Some(from) = range.from {
        date.insert("$gte", sale_date_key(&from));
    }
    match range.to {
        Some(UpperBound::Through(to)) => {
            date.insert("$lte", sale_date_key(&to));
        }
        Some(UpperBound::Before(midnight)) => {
            date.insert("$lt", sale_date_key(&midnight));
        }
        None => {}
    }
    if !date.is_empty() {
        filter.insert("date", date);
    }

    Ok(doc! { "$match": filter })
}
