//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for Inventory API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "0.1.0",
        description = "Products, stock purchases and sales. Every request carries the caller's id in the `x-user-id` header.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/products", api = domain_products::ApiDoc),
        (path = "/api/sales", api = domain_sales::ApiDoc)
    ),
    tags(
        (name = "Products", description = "Product management and stock additions"),
        (name = "Sales", description = "Sales recorded against product stock")
    )
)]
pub struct ApiDoc;
