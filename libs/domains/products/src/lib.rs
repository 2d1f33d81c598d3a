//! Products Domain
//!
//! Products, the purchase ledger that records every stock increase, and
//! read-only lookups of the sellers, categories and brands products refer to.
//!
//! ```text
//! Handlers  →  ProductService  →  ProductRepository (trait)
//!                                   └─ MongoProductRepository
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{handlers, MongoProductRepository, ProductService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("inventory");
//!
//! let repository = MongoProductRepository::new(&db);
//! repository.init_indexes().await?;
//!
//! let router = handlers::router(ProductService::new(repository));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod ids;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod service;

pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use models::{
    AddStock, BulkDelete, BulkDeleteResult, CreateProduct, Product, ProductPage, ProductView,
    Purchase, StockTotal, UpdateProduct,
};
pub use mongodb::MongoProductRepository;
pub use query::{Pagination, ProductQuery, Sort, SortOrder};
pub use repository::ProductRepository;
pub use service::ProductService;
