use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::ids::{option_uuid_string, uuid_string};

/// Deserialize an optional value, treating `""` (and `null`) as absent.
///
/// Form-backed clients send blank inputs as empty strings; those must leave
/// the field unset instead of failing to parse or storing `""`.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Product entity stored in the `products` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    #[serde(rename = "_id", alias = "id", with = "uuid_string")]
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    /// Changes only through stock additions and sales
    pub stock: i64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_uuid_string"
    )]
    pub category: Option<Uuid>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_uuid_string"
    )]
    pub brand: Option<Uuid>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_uuid_string"
    )]
    pub seller: Option<Uuid>,
    /// Owning user, fixed at creation
    #[serde(with = "uuid_string")]
    pub user: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(input: CreateProduct, user: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            price: input.price,
            stock: input.stock,
            category: input.category,
            brand: input.brand,
            seller: input.seller,
            user,
            description: input.description,
            size: input.size,
            created_at: now,
            updated_at: now,
        }
    }
}

/// DTO for creating a product.
///
/// Any `user` key in the body is ignored; ownership comes from the caller.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than 0"))]
    pub price: f64,
    /// Opening stock, recorded as the first purchase
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub brand: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub seller: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<String>,
}

/// DTO for updating a product. Stock is deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "Price must be greater than 0"))]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub category: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub brand: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub seller: Option<Uuid>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<String>,
}

/// Stock addition request: `stock` units bought from `seller`.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
pub struct AddStock {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub seller: Option<Uuid>,
    #[validate(range(min = 1, message = "Must be equal or greater than 1"))]
    pub stock: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkDelete {
    #[validate(length(min = 1, message = "At least one id is required"))]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteResult {
    pub deleted_count: u64,
}

/// Ledger entry for one stock increase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Purchase {
    #[serde(rename = "_id", alias = "id", with = "uuid_string")]
    pub id: Uuid,
    #[serde(with = "uuid_string")]
    pub user: Uuid,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_uuid_string"
    )]
    pub seller: Option<Uuid>,
    #[serde(with = "uuid_string")]
    pub product: Uuid,
    /// Empty when the seller is unknown
    pub seller_name: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    /// Record `quantity` units of `product` at its current price.
    pub fn record(
        product: &Product,
        user: Uuid,
        seller: Option<Uuid>,
        seller_name: String,
        quantity: i64,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user,
            seller,
            product: product.id,
            seller_name,
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            total_price: quantity as f64 * product.price,
            created_at: Utc::now(),
        }
    }
}

/// Result row of the per-user stock sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StockTotal {
    #[serde(rename = "totalQuantity")]
    pub total_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryRef {
    #[serde(rename = "_id", alias = "id", with = "uuid_string")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BrandRef {
    #[serde(rename = "_id", alias = "id", with = "uuid_string")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SellerRef {
    #[serde(rename = "_id", alias = "id", with = "uuid_string")]
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_no: Option<String>,
}

/// Product with its references resolved, as returned by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    #[serde(rename = "_id", alias = "id", with = "uuid_string")]
    pub id: Uuid,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub category: Option<CategoryRef>,
    pub brand: Option<BrandRef>,
    pub seller: Option<SellerRef>,
    #[serde(with = "uuid_string")]
    pub user: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    /// Attach resolved references; unresolved ids become `None`.
    pub fn from_product(
        product: Product,
        category: Option<CategoryRef>,
        brand: Option<BrandRef>,
        seller: Option<SellerRef>,
    ) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            stock: product.stock,
            category,
            brand,
            seller,
            user: product.user,
            description: product.description,
            size: product.size,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductPage {
    pub data: Vec<ProductView>,
    pub total_count: u64,
}
