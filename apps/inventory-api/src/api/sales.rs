//! Sales API routes

use axum::Router;
use domain_sales::{MongoSaleRepository, SaleService, handlers};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    let repository = MongoSaleRepository::new(&state.db);
    handlers::router(SaleService::new(repository))
}

pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    MongoSaleRepository::new(&state.db).init_indexes().await?;
    Ok(())
}
