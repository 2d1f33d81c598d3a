//! Sales Domain
//!
//! Sales recorded against the caller's products. Creating a sale takes
//! the sold quantity out of the product's stock; stock can never drop
//! below zero.
//!
//! ```text
//! Handlers  →  SaleService  →  SaleRepository (trait)
//!                                └─ MongoSaleRepository (sales + products)
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod query;
pub mod repository;
pub mod service;

pub use error::{SaleError, SaleResult};
pub use handlers::ApiDoc;
pub use models::{CreateSale, Sale, SalePage, UpdateSale};
pub use mongodb::MongoSaleRepository;
pub use query::SaleQuery;
pub use repository::SaleRepository;
pub use service::SaleService;
