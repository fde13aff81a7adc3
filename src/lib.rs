//! # 产品目录服务
//!
//! 分层结构：
//! - `app`: 产品领域模型、仓储端口、用例服务与 HTTP 处理器
//! - `core`: 错误处理、响应封装、请求上下文与中间件
//! - `infrastructure`: 配置、日志、数据库与持久化适配器

pub mod app;
pub mod core;
pub mod infrastructure;

use axum::{
    http::HeaderName,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use app::product::handler::{self, AppState};

/// 健康检查
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// 创建路由
///
/// 关联 ID 中间件位于最外层，请求日志与处理器都运行在它打开的 span 内。
pub fn create_routes(state: AppState, correlation_header: HeaderName, timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/products",
            get(handler::list_products).post(handler::create_product),
        )
        .route(
            "/products/:id",
            get(handler::get_product)
                .put(handler::update_product)
                .delete(handler::delete_product),
        )
        .layer(middleware::from_fn(crate::core::middleware::request_logging_middleware))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn_with_state(
            correlation_header,
            crate::core::middleware::correlation_id_middleware,
        ))
        .with_state(state)
}
