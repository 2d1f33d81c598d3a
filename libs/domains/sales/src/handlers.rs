//! HTTP handlers for Sales API

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    CurrentUser, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use domain_products::models::{BulkDelete, BulkDeleteResult};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::SaleResult;
use crate::models::{CreateSale, Sale, SalePage, UpdateSale};
use crate::query::SaleQuery;
use crate::repository::SaleRepository;
use crate::service::SaleService;

#[derive(OpenApi)]
#[openapi(
    paths(create_sale, list_sales, get_sale, update_sale, bulk_delete_sales),
    components(
        schemas(Sale, CreateSale, UpdateSale, SalePage, BulkDelete, BulkDeleteResult),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Sales", description = "Sales recorded against product stock")
    )
)]
pub struct ApiDoc;

/// Sales router; mount it under `/sales`.
pub fn router<R: SaleRepository + 'static>(service: SaleService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/bulk-delete", post(bulk_delete_sales))
        .route("/{id}", get(get_sale).patch(update_sale))
        .with_state(shared_service)
}

/// Record a sale and take the sold units out of stock
#[utoipa::path(
    post,
    path = "",
    tag = "Sales",
    request_body = CreateSale,
    responses(
        (status = 201, description = "Sale recorded", body = Sale),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_sale<R: SaleRepository>(
    State(service): State<Arc<SaleService<R>>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateSale>,
) -> SaleResult<impl IntoResponse> {
    let sale = service.create(input, user).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// List the caller's sales
#[utoipa::path(
    get,
    path = "",
    tag = "Sales",
    params(SaleQuery),
    responses(
        (status = 200, description = "Page of sales", body = SalePage),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_sales<R: SaleRepository>(
    State(service): State<Arc<SaleService<R>>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<SaleQuery>,
) -> SaleResult<Json<SalePage>> {
    let page = service.read_all(query, user).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Sales",
    params(("id" = uuid::Uuid, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale", body = Sale),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_sale<R: SaleRepository>(
    State(service): State<Arc<SaleService<R>>>,
    CurrentUser(user): CurrentUser,
    UuidPath(id): UuidPath,
) -> SaleResult<Json<Sale>> {
    let sale = service.read(id, user).await?;
    Ok(Json(sale))
}

/// Update a sale; the total is recomputed and stock is not adjusted
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Sales",
    params(("id" = uuid::Uuid, Path, description = "Sale id")),
    request_body = UpdateSale,
    responses(
        (status = 200, description = "Updated sale", body = Sale),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_sale<R: SaleRepository>(
    State(service): State<Arc<SaleService<R>>>,
    CurrentUser(user): CurrentUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateSale>,
) -> SaleResult<Json<Sale>> {
    let sale = service.update(id, input, user).await?;
    Ok(Json(sale))
}

#[utoipa::path(
    post,
    path = "/bulk-delete",
    tag = "Sales",
    request_body = BulkDelete,
    responses(
        (status = 200, description = "Number of sales removed", body = BulkDeleteResult),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn bulk_delete_sales<R: SaleRepository>(
    State(service): State<Arc<SaleService<R>>>,
    CurrentUser(_user): CurrentUser,
    ValidatedJson(input): ValidatedJson<BulkDelete>,
) -> SaleResult<Json<BulkDeleteResult>> {
    let deleted_count = service.bulk_delete(&input.ids).await?;
    Ok(Json(BulkDeleteResult { deleted_count }))
}
