use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;
use service::catalog::ProductRepository;

use crate::openapi::ApiDoc;

pub mod products;

/// Shared handler state; the repository is built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
}

impl AppState {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_json));

    let catalog = Router::new()
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/:id",
            get(products::get).put(products::update).delete(products::delete),
        );

    public
        .merge(catalog)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use service::catalog::ProductStore;
    use tower::ServiceExt;

    #[tokio::test]
    async fn router_serves_health_and_catalog() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("routes_{}.json", uuid::Uuid::new_v4()));
        let store = ProductStore::open(&tmp).await;
        let app = build_router(AppState::new(store), CorsLayer::very_permissive());

        let res = app.clone().oneshot(Request::builder().uri("/health").body(Body::empty())?).await?;
        assert_eq!(res.status(), StatusCode::OK);

        let res = app.clone().oneshot(Request::builder().uri("/api/products").body(Body::empty())?).await?;
        assert_eq!(res.status(), StatusCode::OK);

        let res = app.clone().oneshot(Request::builder().uri("/api/products/7").body(Body::empty())?).await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        // listing reads the file, so a vanished file is reported as not found
        tokio::fs::remove_file(&tmp).await?;
        let res = app.oneshot(Request::builder().uri("/api/products").body(Body::empty())?).await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
