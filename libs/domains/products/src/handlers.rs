//! HTTP handlers for Products API

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_helpers::{
    CurrentUser, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{
    AddStock, BrandRef, BulkDelete, BulkDeleteResult, CategoryRef, CreateProduct, Product,
    ProductPage, ProductView, SellerRef, StockTotal, UpdateProduct,
};
use crate::query::{ProductQuery, SortOrder};
use crate::repository::ProductRepository;
use crate::service::ProductService;

#[derive(OpenApi)]
#[openapi(
    paths(
        create_product,
        list_products,
        total_stock,
        get_product,
        update_product,
        bulk_delete_products,
        add_to_stock,
    ),
    components(
        schemas(
            Product, CreateProduct, UpdateProduct, AddStock, BulkDelete, BulkDeleteResult,
            ProductPage, ProductView, CategoryRef, BrandRef, SellerRef, StockTotal, SortOrder
        ),
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
        (name = "Products", description = "Products, stock additions and the purchase ledger")
    )
)]
pub struct ApiDoc;

/// Products router; mount it under `/products`.
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/total", get(total_stock))
        .route("/bulk-delete", post(bulk_delete_products))
        .route("/{id}", get(get_product).patch(update_product))
        .route("/{id}/add-stock", patch(add_to_stock))
        .with_state(shared_service)
}

/// Create a product and record its opening stock as a purchase
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create(input, user).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// List the caller's products with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Page of products with references resolved", body = ProductPage),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ProductQuery>,
) -> ProductResult<Json<ProductPage>> {
    let page = service.read_all(query, user).await?;
    Ok(Json(page))
}

/// Total stock across the caller's products
#[utoipa::path(
    get,
    path = "/total",
    tag = "Products",
    responses(
        (status = 200, description = "Empty when the caller owns no products", body = Vec<StockTotal>),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn total_stock<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    CurrentUser(user): CurrentUser,
) -> ProductResult<Json<Vec<StockTotal>>> {
    let totals = service.count_total_product(user).await?;
    Ok(Json(totals))
}

/// Get a product; `null` when it belongs to another user
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(("id" = uuid::Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product, or null if owned by someone else", body = Option<Product>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    CurrentUser(user): CurrentUser,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<Option<Product>>> {
    let product = service.read(id, user).await?;
    Ok(Json(product))
}

/// Update a product's descriptive fields; stock cannot be set here
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Products",
    params(("id" = uuid::Uuid, Path, description = "Product id")),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Updated product", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    CurrentUser(user): CurrentUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> ProductResult<Json<Product>> {
    let product = service.update(id, input, user).await?;
    Ok(Json(product))
}

/// Delete several products at once
#[utoipa::path(
    post,
    path = "/bulk-delete",
    tag = "Products",
    request_body = BulkDelete,
    responses(
        (status = 200, description = "Number of products removed", body = BulkDeleteResult),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn bulk_delete_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    CurrentUser(_user): CurrentUser,
    ValidatedJson(input): ValidatedJson<BulkDelete>,
) -> ProductResult<Json<BulkDeleteResult>> {
    let deleted_count = service.bulk_delete(&input.ids).await?;
    Ok(Json(BulkDeleteResult { deleted_count }))
}

/// Add purchased stock; responds with the product as it was before
#[utoipa::path(
    patch,
    path = "/{id}/add-stock",
    tag = "Products",
    params(("id" = uuid::Uuid, Path, description = "Product id")),
    request_body = AddStock,
    responses(
        (status = 200, description = "Product before the increment", body = Product),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_to_stock<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    CurrentUser(user): CurrentUser,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<AddStock>,
) -> ProductResult<Json<Product>> {
    let product = service.add_to_stock(id, input, user).await?;
    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductRepository;
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use axum_helpers::USER_ID_HEADER;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app(mock_repo: MockProductRepository) -> Router {
        router(ProductService::new(mock_repo))
    }

    fn request(method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_product_returns_created() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_create().returning(|p| Ok(p));
        mock_repo.expect_create_purchase().returning(|p| Ok(p));
        let user = Uuid::now_v7();

        let response = app(mock_repo)
            .oneshot(request(
                Method::POST,
                "/",
                Some(user),
                Some(json!({ "name": "Mug", "price": 4.5, "stock": 12, "brand": "" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["user"], user.to_string());
        assert_eq!(body["stock"], 12);
        assert!(body.get("brand").is_none());
    }

    #[tokio::test]
    async fn test_create_product_without_user_is_unauthorized() {
        let response = app(MockProductRepository::new())
            .oneshot(request(
                Method::POST,
                "/",
                None,
                Some(json!({ "name": "Mug", "price": 4.5, "stock": 12 })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_product_validation_error() {
        let response = app(MockProductRepository::new())
            .oneshot(request(
                Method::POST,
                "/",
                Some(Uuid::now_v7()),
                Some(json!({ "name": "Mug", "price": 0, "stock": 12 })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["details"]["price"].is_array());
    }

    #[tokio::test]
    async fn test_get_product_of_other_user_is_null() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_exists().returning(|_| Ok(true));
        mock_repo.expect_find_owned().returning(|_, _| Ok(None));

        let uri = format!("/{}", Uuid::now_v7());
        let response = app(mock_repo)
            .oneshot(request(Method::GET, &uri, Some(Uuid::now_v7()), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, Value::Null);
    }

    #[tokio::test]
    async fn test_get_unknown_product_is_not_found() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_exists().returning(|_| Ok(false));

        let uri = format!("/{}", Uuid::now_v7());
        let response = app(mock_repo)
            .oneshot(request(Method::GET, &uri, Some(Uuid::now_v7()), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_product_with_malformed_id() {
        let response = app(MockProductRepository::new())
            .oneshot(request(Method::GET, "/abc", Some(Uuid::now_v7()), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "INVALID_UUID");
    }

    #[tokio::test]
    async fn test_total_stock_empty_array() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_stock_totals().returning(|_| Ok(vec![]));

        let response = app(mock_repo)
            .oneshot(request(Method::GET, "/total", Some(Uuid::now_v7()), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_add_stock_rejects_zero_quantity() {
        let uri = format!("/{}/add-stock", Uuid::now_v7());
        let response = app(MockProductRepository::new())
            .oneshot(request(
                Method::PATCH,
                &uri,
                Some(Uuid::now_v7()),
                Some(json!({ "stock": 0 })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_add_stock_returns_previous_snapshot() {
        let mut mock_repo = MockProductRepository::new();
        let user = Uuid::now_v7();
        let now = Utc::now();
        let product = Product {
            id: Uuid::now_v7(),
            name: "Mug".to_string(),
            price: 4.5,
            stock: 3,
            category: None,
            brand: None,
            seller: None,
            user,
            description: None,
            size: None,
            created_at: now,
            updated_at: now,
        };
        let uri = format!("/{}/add-stock", product.id);

        mock_repo
            .expect_get_by_id()
            .returning(move |_| Ok(Some(product.clone())));
        mock_repo.expect_increment_stock().returning(|_, _| Ok(true));
        mock_repo.expect_create_purchase().returning(|p| Ok(p));

        let response = app(mock_repo)
            .oneshot(request(Method::PATCH, &uri, Some(user), Some(json!({ "stock": 5 }))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["stock"], 3);
    }

    #[tokio::test]
    async fn test_bulk_delete_reports_count() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo.expect_delete_many().returning(|ids| Ok(ids.len() as u64));

        let ids = [Uuid::now_v7().to_string(), Uuid::now_v7().to_string()];
        let response = app(mock_repo)
            .oneshot(request(
                Method::POST,
                "/bulk-delete",
                Some(Uuid::now_v7()),
                Some(json!({ "ids": ids })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "deleted_count": 2 }));
    }

    #[tokio::test]
    async fn test_list_products_passes_query() {
        let mut mock_repo = MockProductRepository::new();
        mock_repo
            .expect_find_page()
            .withf(|q, _| q.limit == Some(5) && q.search.as_deref() == Some("mug"))
            .returning(|_, _| Ok(vec![]));
        mock_repo.expect_count_matching().returning(|_, _| Ok(0));
        mock_repo.expect_populate().returning(|_| Ok(vec![]));

        let response = app(mock_repo)
            .oneshot(request(
                Method::GET,
                "/?search=mug&limit=5&category=",
                Some(Uuid::now_v7()),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "data": [], "total_count": 0 })
        );
    }
}
