use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use common::types::Envelope;
use service::catalog::{NewProduct, Product, ProductPatch};

use crate::errors::JsonApiError;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
}

/// `limit` only applies when it is a positive integer; anything else is ignored.
fn parse_limit(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// Ids that do not parse can never match a product.
fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, JsonApiError> {
    body.map(|Json(v)| v)
        .map_err(|rejection| JsonApiError::new(rejection.status(), rejection.body_text()))
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    params(("limit" = Option<usize>, Query, description = "Return only the first N products")),
    responses((status = 200, description = "OK"), (status = 404, description = "Catalog file missing"))
)]
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Envelope<Vec<Product>>>, JsonApiError> {
    let mut products = state.products.list_all().await?;
    if let Some(limit) = q.limit.as_deref().and_then(parse_limit) {
        products.truncate(limit);
    }
    Ok(Json(Envelope::data(products)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = u64, Path, description = "Product id")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Product>>, JsonApiError> {
    let id = parse_id(&id).ok_or_else(JsonApiError::not_found)?;
    match state.products.find_by_id(id).await {
        Some(p) => Ok(Json(Envelope::data(p))),
        None => Err(JsonApiError::not_found()),
    }
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = crate::openapi::NewProductDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"))
)]
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Product>>), JsonApiError> {
    let candidate = NewProduct::from_json(&json_body(body)?)?;
    let created = state.products.create(candidate).await?;
    info!(id = created.id, code = %created.code, "product_create_request");
    Ok((StatusCode::CREATED, Json(Envelope::with_message("created", created))))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = u64, Path, description = "Product id")),
    request_body = crate::openapi::ProductPatchDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Envelope<Product>>, JsonApiError> {
    let patch = ProductPatch::from_json(&json_body(body)?)?;
    let id = parse_id(&id).ok_or_else(JsonApiError::not_found)?;
    match state.products.update(id, patch).await? {
        Some(p) => Ok(Json(Envelope::with_message("updated", p))),
        None => Err(JsonApiError::not_found()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = u64, Path, description = "Product id")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<()>>, JsonApiError> {
    let id = parse_id(&id).ok_or_else(JsonApiError::not_found)?;
    if state.products.delete(id).await? {
        Ok(Json(Envelope::message("deleted")))
    } else {
        Err(JsonApiError::not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_must_be_positive_integer() {
        assert_eq!(parse_limit("3"), Some(3));
        assert_eq!(parse_limit(" 2 "), Some(2));
        assert_eq!(parse_limit("0"), None);
        assert_eq!(parse_limit("-1"), None);
        assert_eq!(parse_limit("abc"), None);
    }

    #[test]
    fn id_parsing() {
        assert_eq!(parse_id("12"), Some(12));
        assert_eq!(parse_id("x12"), None);
    }
}
