//! Aggregation pipeline builders for filtered, sorted and paginated listings.

use mongodb::bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::empty_string_as_none;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;
pub const DEFAULT_SORT_FIELD: &str = "created_at";

/// Sortable product fields; anything else falls back to `created_at`.
pub const PRODUCT_SORT_FIELDS: &[&str] = &["name", "price", "stock", "created_at"];

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Page defaults to 1, limit to 10 and is capped at 100.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Saturates instead of overflowing for absurd page numbers.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub order: SortOrder,
}

impl Sort {
    /// Resolve a client-supplied field against `allowed`.
    pub fn resolve(
        requested: Option<&str>,
        order: Option<SortOrder>,
        allowed: &[&'static str],
    ) -> Self {
        let field = requested
            .and_then(|name| allowed.iter().copied().find(|field| *field == name))
            .unwrap_or(DEFAULT_SORT_FIELD);

        Self {
            field,
            order: order.unwrap_or_default(),
        }
    }
}

/// `$sort`, `$skip`, `$limit`. `_id` breaks ties so pages are stable.
pub fn sort_and_paginate_stages(sort: &Sort, pagination: &Pagination) -> Vec<Document> {
    let direction = sort.order.direction();
    let mut sort_doc = Document::new();
    sort_doc.insert(sort.field, direction);
    if sort.field != "_id" {
        sort_doc.insert("_id", direction);
    }

    vec![
        doc! { "$sort": sort_doc },
        doc! { "$skip": i64::try_from(pagination.skip()).unwrap_or(i64::MAX) },
        doc! { "$limit": pagination.limit as i64 },
    ]
}

/// Emits a single `{ total: n }` document, or nothing when no rows match.
pub fn count_stage() -> Document {
    doc! { "$count": "total" }
}

/// Read the `$count` result; an empty pipeline result means zero.
pub fn total_from(document: Option<Document>) -> u64 {
    document
        .and_then(|d| match d.get("total") {
            Some(Bson::Int32(n)) => Some(*n as u64),
            Some(Bson::Int64(n)) => Some(*n as u64),
            _ => None,
        })
        .unwrap_or(0)
}

/// Case-insensitive literal substring match.
pub fn contains_ignore_case(needle: &str) -> Document {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if "\\^$.|?*+()[]{}/".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    doc! { "$regex": escaped, "$options": "i" }
}

/// Query string accepted by the product listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Substring of the product name
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub brand: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub seller: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<String>,
    /// One of `name`, `price`, `stock`, `created_at`
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_by: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub limit: Option<u64>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }

    pub fn sort(&self) -> Sort {
        Sort::resolve(self.sort_by.as_deref(), self.sort_order, PRODUCT_SORT_FIELDS)
    }
}

/// `$match` stage scoping products to `user` plus the optional filters.
pub fn match_stage(query: &ProductQuery, user: Uuid) -> Document {
    let mut filter = doc! { "user": user.to_string() };

    if let Some(search) = &query.search {
        filter.insert("name", contains_ignore_case(search));
    }
    if let Some(category) = query.category {
        filter.insert("category", category.to_string());
    }
    if let Some(brand) = query.brand {
        filter.insert("brand", brand.to_string());
    }
    if let Some(seller) = query.seller {
        filter.insert("seller", seller.to_string());
    }
    if let Some(size) = &query.size {
        filter.insert("size", size.as_str());
    }

    if query.min_price.is_some() || query.max_price.is_some() {
        let mut price = doc! {};
        if let Some(min) = query.min_price {
            price.insert("$gte", min);
        }
        if let Some(max) = query.max_price {
            price.insert("$lte", max);
        }
        filter.insert("price", price);
    }

    doc! { "$match": filter }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_bounds() {
        assert_eq!(Pagination::default(), Pagination { page: 1, limit: 10 });
        assert_eq!(Pagination::new(Some(0), Some(0)), Pagination { page: 1, limit: 1 });
        assert_eq!(Pagination::new(Some(3), Some(500)).limit, MAX_LIMIT);
        assert_eq!(Pagination::new(Some(3), Some(20)).skip(), 40);
    }

    #[test]
    fn test_huge_page_saturates_skip() {
        let pagination = Pagination::new(Some(u64::MAX / 50), Some(100));
        assert_eq!(pagination.skip(), u64::MAX);

        let sort = Sort::resolve(None, None, PRODUCT_SORT_FIELDS);
        let stages = sort_and_paginate_stages(&sort, &pagination);
        assert_eq!(stages[1], doc! { "$skip": i64::MAX });
        assert_eq!(stages[2], doc! { "$limit": 100_i64 });
    }

    #[test]
    fn test_sort_falls_back_to_created_at() {
        let sort = Sort::resolve(Some("password"), None, PRODUCT_SORT_FIELDS);
        assert_eq!(sort.field, "created_at");
        assert_eq!(sort.order, SortOrder::Desc);

        let sort = Sort::resolve(Some("price"), Some(SortOrder::Asc), PRODUCT_SORT_FIELDS);
        assert_eq!(sort.field, "price");
        assert_eq!(sort.order.direction(), 1);
    }

    #[test]
    fn test_sort_and_paginate_stages() {
        let sort = Sort::resolve(Some("name"), Some(SortOrder::Asc), PRODUCT_SORT_FIELDS);
        let stages = sort_and_paginate_stages(&sort, &Pagination::new(Some(2), Some(5)));

        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0], doc! { "$sort": { "name": 1, "_id": 1 } });
        assert_eq!(stages[1], doc! { "$skip": 5_i64 });
        assert_eq!(stages[2], doc! { "$limit": 5_i64 });
    }

    #[test]
    fn test_match_stage_scopes_to_user_and_filters() {
        let user = Uuid::now_v7();
        let brand = Uuid::now_v7();
        let query = ProductQuery {
            search: Some("usb-c (2m)".to_string()),
            brand: Some(brand),
            min_price: Some(5.0),
            max_price: Some(50.0),
            ..Default::default()
        };

        let stage = match_stage(&query, user);
        let filter = stage.get_document("$match").unwrap();

        assert_eq!(filter.get_str("user").unwrap(), user.to_string());
        assert_eq!(filter.get_str("brand").unwrap(), brand.to_string());
        assert_eq!(
            filter.get_document("price").unwrap(),
            &doc! { "$gte": 5.0, "$lte": 50.0 }
        );
        assert_eq!(
            filter.get_document("name").unwrap(),
            &doc! { "$regex": "usb-c \\(2m\\)", "$options": "i" }
        );
        assert!(!filter.contains_key("category"));
    }

    #[test]
    fn test_total_from_count_result() {
        assert_eq!(total_from(None), 0);
        assert_eq!(total_from(Some(doc! { "total": 7 })), 7);
        assert_eq!(total_from(Some(doc! { "total": 9_i64 })), 9);
    }

    #[test]
    fn test_count_stage() {
        assert_eq!(count_stage(), doc! { "$count": "total" });
    }
}
