use axum::Router;
use axum::routing::get;

pub mod health;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
///
/// Returns a stateless Router (all sub-routers have state already applied).
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new().nest(
        domain_documents::handlers::URL,
        domain_documents::handlers::router(state.documents.clone()),
    )
}

/// Routes served at the site root: the console page and `/metrics`.
pub fn site(state: &crate::state::AppState) -> Router {
    domain_documents::console::router(state.documents.clone(), state.renderer.clone())
        .route("/metrics", get(observability::metrics_handler))
}

/// Creates a router with the /ready endpoint that probes the vector store.
///
/// This router has state applied and can be merged with the stateless app router
/// from `create_router`.
pub fn ready_router(state: crate::state::AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment};
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use core_config::{app_info, server::ServerConfig};
    use domain_documents::{EmbeddingConfig, StoreConfig};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn memory_state(collection: &str) -> AppState {
        AppState::new(Config {
            app: app_info!(),
            server: ServerConfig::default(),
            environment: Environment::Development,
            store: StoreConfig::Memory,
            embedding: EmbeddingConfig::default(),
            collection_name: collection.to_string(),
        })
        .unwrap()
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ready_reports_store() {
        let app = ready_router(memory_state("ready_probe"));

        let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["vector_store"], "connected");
    }

    #[tokio::test]
    async fn test_collection_routes_are_mounted() {
        let app = routes(&memory_state("mounted_routes"));

        let request = Request::builder()
            .uri("/collection?query=anything")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response.into_body()).await;
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_site_serves_console() {
        let app = site(&memory_state("site_console"));

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("Semantic Documents"));
    }
}
