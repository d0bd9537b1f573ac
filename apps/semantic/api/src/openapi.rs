use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    components(
        schemas(axum_helpers::ErrorResponse)
    ),
    info(
        title = "Semantic Documents API",
        version = "0.1.0",
        description = "Store free-text documents with metadata and search them by meaning"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = domain_documents::handlers::URL, api = domain_documents::ApiDoc)
    )
)]
pub struct ApiDoc;
