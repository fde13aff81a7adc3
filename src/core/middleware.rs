//! 核心中间件模块

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

use super::context::RequestContext;

/// 关联 ID 中间件
///
/// 请求头中有非空值时沿用，否则生成新的 UUID；写入请求扩展供处理器提取，
/// 在 `request` span 中运行后续处理，并把同一个值回写到响应头。
pub async fn correlation_id_middleware(
    State(header): State<HeaderName>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_header(
        req.headers().get(&header).and_then(|h| h.to_str().ok()),
    );
    req.extensions_mut().insert(ctx.clone());

    let span = info_span!("request", correlation_id = %ctx.correlation_id);
    let mut response = next.run(req).instrument(span).await;

    match HeaderValue::from_str(&ctx.correlation_id) {
        Ok(value) => {
            response.headers_mut().insert(header, value);
        }
        Err(_) => warn!(correlation_id = %ctx.correlation_id, "Correlation id is not a valid header value"),
    }

    response
}

/// 请求日志中间件，在关联 ID span 内记录每个请求的结果
pub async fn request_logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;
    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), latency_ms, "request failed");
    } else {
        info!(%method, %path, status = status.as_u16(), latency_ms, "request completed");
    }

    response
}
