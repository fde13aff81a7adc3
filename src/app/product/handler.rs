//! 产品处理器

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use super::{
    dto::{ListProductsQuery, PageResponse, ProductRequest, ProductResponse},
    model::ProductId,
    repository::{PageRequest, SortKey},
    service::ProductService,
};
use crate::core::{
    context::RequestContext,
    error::CoreError,
    extract::{AppJson, AppQuery},
    response::ApiResponse,
};
use crate::infrastructure::config::PaginationConfig;

#[derive(Clone)]
pub struct AppState {
    pub product_service: ProductService,
    pub pagination: PaginationConfig,
}

pub async fn list_products(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppQuery(query): AppQuery<ListProductsQuery>,
) -> Result<Json<ApiResponse<PageResponse<ProductResponse>>>, CoreError> {
    let sort = query
        .sort
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<SortKey>)
        .transpose()?;

    let page = PageRequest::new(
        query.page.unwrap_or(0),
        query.size.unwrap_or(state.pagination.default_page_size),
        sort,
        state.pagination.max_page_size,
    )?;

    let products = state.product_service.find_all_products(&ctx, page).await?;
    let body = PageResponse::from(products.map(ProductResponse::from));
    Ok(Json(ApiResponse::success(body, &ctx)))
}

pub async fn get_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductResponse>>, CoreError> {
    let product = state
        .product_service
        .find_by_id(&ctx, &ProductId::from(id))
        .await?;
    Ok(Json(ApiResponse::success(product.into(), &ctx)))
}

pub async fn create_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    AppJson(payload): AppJson<ProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), CoreError> {
    let draft = payload.into_draft()?;
    let product = state.product_service.create_product(&ctx, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(product.into(), &ctx)),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, CoreError> {
    let draft = payload.into_draft()?;
    let product = state
        .product_service
        .update_product(&ctx, &ProductId::from(id), draft)
        .await?;
    Ok(Json(ApiResponse::success(product.into(), &ctx)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<String>,
) -> Result<StatusCode, CoreError> {
    state
        .product_service
        .delete_product(&ctx, &ProductId::from(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
