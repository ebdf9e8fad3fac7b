//! Product catalog CRUD handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use electroworld_core::ProductId;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{Product, ProductDraft, ProductPatchDraft};
use crate::state::AppState;

/// List the full catalog.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list().await?;
    Ok(Json(products))
}

/// Fetch a single product by ID.
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    let id = parse_id(&id)?;
    let product = state.catalog().get(id).await?.ok_or_else(not_found)?;
    Ok(Json(product))
}

/// Create a product.
pub async fn create(
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = draft.validate()?;
    let product = state.catalog().create(input).await?;
    tracing::info!(id = %product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace every field of an existing product.
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>> {
    let id = parse_id(&id)?;
    let input = draft.validate()?;
    let product = state
        .catalog()
        .replace(id, input)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(product))
}

/// Update only the provided fields of an existing product.
pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProductPatchDraft>,
) -> Result<Json<Product>> {
    let id = parse_id(&id)?;
    let patch = draft.validate()?;
    let product = state
        .catalog()
        .patch(id, patch)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(product))
}

/// Delete a product.
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let id = parse_id(&id)?;
    if !state.catalog().delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(%id, "Product removed");
    Ok(Json(json!({ "message": "Product removed" })))
}

/// A path segment that is not a well-formed ID can never name a product,
/// so it gets the same 404 as a missing one.
fn parse_id(raw: &str) -> Result<ProductId> {
    raw.parse().map_err(|_| not_found())
}

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_owned())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use electroworld_core::Price;
    use tower::ServiceExt;

    use crate::db::InMemoryCatalogStore;
    use crate::models::{Category, Product};
    use crate::state::AppState;

    fn app(products: Vec<Product>) -> Router {
        let dir = std::env::temp_dir();
        let catalog = Arc::new(InMemoryCatalogStore::with_products(products));
        let state = AppState::for_tests(dir, catalog);
        crate::routes::routes().with_state(state)
    }

    fn sample() -> Product {
        Product {
            id: electroworld_core::ProductId::random(),
            name: "Samsung Galaxy A16".to_owned(),
            category: Category::Phones,
            price: Price::from_whole(21_000),
            image: "https://example.com/a16.jpg".to_owned(),
        }
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    #[tokio::test]
    async fn test_list_returns_catalog() {
        let app = app(vec![sample()]);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/products")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("handler runs");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["name"], "Samsung Galaxy A16");
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let app = app(vec![]);
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/products",
                serde_json::json!({
                    "name": "Nokia 105",
                    "category": "Phones",
                    "price": 1050,
                    "image": "https://example.com/nokia.jpg"
                }),
            ))
            .await
            .expect("handler runs");

        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_str().expect("id present").to_owned();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/products/{id}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("handler runs");
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched["name"], "Nokia 105");
        assert_eq!(fetched["category"], "Phones");
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields() {
        let app = app(vec![]);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/products",
                serde_json::json!({ "name": "Nokia 105" }),
            ))
            .await
            .expect("handler runs");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "All fields are required");
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category() {
        let app = app(vec![]);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/products",
                serde_json::json!({
                    "name": "Nokia 105",
                    "category": "Gadgets",
                    "price": 1050,
                    "image": "x"
                }),
            ))
            .await
            .expect("handler runs");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Invalid category");
    }

    #[tokio::test]
    async fn test_show_unknown_id_is_not_found() {
        let app = app(vec![]);
        for uri in [
            format!("/api/products/{}", electroworld_core::ProductId::random()),
            "/api/products/not-a-uuid".to_owned(),
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(uri)
                        .body(Body::empty())
                        .expect("request builds"),
                )
                .await
                .expect("handler runs");

            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let body = body_json(response).await;
            assert_eq!(body["message"], "Product not found");
        }
    }

    #[tokio::test]
    async fn test_patch_updates_price_only() {
        let product = sample();
        let id = product.id;
        let app = app(vec![product]);

        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/api/products/{id}"),
                serde_json::json!({ "price": 19_500 }),
            ))
            .await
            .expect("handler runs");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["price"], "19500");
        assert_eq!(body["name"], "Samsung Galaxy A16");
    }

    #[tokio::test]
    async fn test_remove_then_remove_again() {
        let product = sample();
        let id = product.id;
        let app = app(vec![product]);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/products/{id}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("handler runs");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Product removed");

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/products/{id}"))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("handler runs");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
