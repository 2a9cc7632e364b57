//! Catalog endpoints

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use tracing::info;

use auth::{JwtService, auth_middleware, require_admin};

use super::parse_id;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{ProductForm, ProductQuery},
    uploads::StoredImage,
};

/// Largest accepted product form, image included
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const PRODUCT_NOT_FOUND: &str = "Product not found";

pub fn router(jwt_service: JwtService) -> Router<AppState> {
    let admin = Router::new()
        .route("/api/products", post(create_product))
        .route(
            "/api/products/:id",
            put(update_product).delete(delete_product),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(jwt_service, auth_middleware));

    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/:id", get(get_product))
        .merge(admin)
}

/// Image part of a product form, held in memory until the form validates
struct Upload {
    file_name: Option<String>,
    bytes: Bytes,
}

/// Split a multipart body into text fields and the optional `image` file
async fn read_form(mut multipart: Multipart) -> ApiResult<(ProductForm, Option<Upload>)> {
    let mut form = ProductForm::default();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "image" {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                upload = Some(Upload { file_name, bytes });
            }
        } else {
            let value = field.text().await?;
            form.insert(name, value);
        }
    }

    Ok((form, upload))
}

async fn store_upload(state: &AppState, upload: Option<Upload>) -> ApiResult<Option<StoredImage>> {
    let Some(upload) = upload else {
        return Ok(None);
    };

    let stored = state
        .images
        .save(upload.file_name.as_deref(), &upload.bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to store upload: {}", e)))?;

    Ok(Some(stored))
}

async fn discard(state: &AppState, stored: &Option<StoredImage>) {
    if let Some(image) = stored {
        state.images.remove(image).await;
    }
}

/// List products with optional brand, category and search filters
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<impl IntoResponse> {
    let products = state.products.list(&query.normalized()).await?;
    Ok(Json(products))
}

/// Get a product by ID
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, PRODUCT_NOT_FOUND)?;
    let product = state
        .products
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

    Ok(Json(product))
}

/// Create a product from a multipart form
pub async fn create_product(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let (form, upload) = read_form(multipart).await?;
    let mut new_product = form.into_new_product(None)?;

    let stored = store_upload(&state, upload).await?;
    new_product.image = stored.as_ref().map(|s| s.url.clone());

    let product = match state.products.create(&new_product).await {
        Ok(product) => product,
        Err(e) => {
            discard(&state, &stored).await;
            return Err(e.into());
        }
    };

    info!("Created product {}", product.id);
    Ok((StatusCode::CREATED, Json(product)))
}

/// Partially update a product; absent fields keep their value
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, PRODUCT_NOT_FOUND)?;
    let (form, upload) = read_form(multipart).await?;
    let mut update = form.into_update(None)?;

    // Image the new upload replaces
    let previous_image = match &upload {
        Some(_) => state.products.find(id).await?.and_then(|p| p.image),
        None => None,
    };

    let stored = store_upload(&state, upload).await?;
    update.image = stored.as_ref().map(|s| s.url.clone());

    match state.products.update(id, &update).await {
        Ok(Some(product)) => {
            info!("Updated product {}", product.id);
            if let Some(previous) = previous_image.filter(|p| product.image.as_ref() != Some(p)) {
                state.images.remove_url(&previous).await;
            }
            Ok(Json(product))
        }
        Ok(None) => {
            discard(&state, &stored).await;
            Err(ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()))
        }
        Err(e) => {
            discard(&state, &stored).await;
            Err(e.into())
        }
    }
}

/// Delete a product; order lines keep their price snapshot
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, PRODUCT_NOT_FOUND)?;

    if !state.products.delete(id).await? {
        return Err(ApiError::NotFound(PRODUCT_NOT_FOUND.to_string()));
    }

    info!("Deleted product {}", id);
    Ok(Json(json!({"message": "Product deleted successfully"})))
}
