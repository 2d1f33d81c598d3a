use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use domain_products::ids::uuid_string;
use domain_products::models::empty_string_as_none;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Parse a sale date given as RFC 3339 or as a plain `YYYY-MM-DD` (midnight UTC).
pub fn parse_sale_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Stored form of a sale date: UTC, millisecond precision, `Z` suffix.
///
/// Every stored value has the same width, so MongoDB's string ordering on
/// `date` matches chronological ordering. Range bounds must use this too.
pub fn sale_date_key(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod sale_date {
    use super::sale_date_key;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&sale_date_key(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|date| date.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// True when `raw` is a calendar day without a time component.
pub fn is_date_only(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").is_ok()
}

fn validate_sale_date(raw: &str) -> Result<(), ValidationError> {
    match parse_sale_date(raw) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("date")
            .with_message(Cow::Borrowed("Must be a date (YYYY-MM-DD or RFC 3339)"))),
    }
}

/// A recorded sale of some units of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Sale {
    #[serde(rename = "_id", alias = "id", with = "uuid_string")]
    pub id: Uuid,
    #[serde(with = "uuid_string")]
    pub user: Uuid,
    #[serde(with = "uuid_string")]
    pub product: Uuid,
    pub quantity: i64,
    /// `quantity * product_price` at write time
    pub total_price: f64,
    pub product_price: f64,
    pub buyer_name: String,
    #[serde(with = "sale_date")]
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    pub fn new(
        user: Uuid,
        product: Uuid,
        quantity: i64,
        product_price: f64,
        buyer_name: String,
        date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user,
            product,
            quantity,
            total_price: quantity as f64 * product_price,
            product_price,
            buyer_name,
            date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// DTO for recording a sale.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
pub struct CreateSale {
    /// Id of the product sold
    pub product: String,
    #[validate(range(min = 1, message = "Must be equal or greater than 1"))]
    pub quantity: i64,
    #[serde(alias = "productPrice")]
    #[validate(range(min = 1.0, message = "Must be equal or greater than 1"))]
    pub product_price: f64,
    #[serde(default, alias = "buyerName")]
    #[validate(length(min = 1, message = "Buyer name is required"))]
    pub buyer_name: String,
    /// `YYYY-MM-DD` or RFC 3339
    #[validate(custom(function = "validate_sale_date"))]
    pub date: String,
}

/// DTO for changing a sale; `total_price` is recomputed from the result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
pub struct UpdateSale {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub product: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, message = "Must be equal or greater than 1"))]
    pub quantity: Option<i64>,
    #[serde(default, alias = "productPrice")]
    #[validate(range(min = 1.0, message = "Must be equal or greater than 1"))]
    pub product_price: Option<f64>,
    #[serde(default, alias = "buyerName", deserialize_with = "empty_string_as_none")]
    pub buyer_name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(custom(function = "validate_sale_date"))]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalePage {
    pub data: Vec<Sale>,
    pub total_count: u64,
}
