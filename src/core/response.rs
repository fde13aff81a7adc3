//! 核心响应处理模块

use serde::{Deserialize, Serialize};

use super::context::RequestContext;

/// API 响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    /// 当前请求的关联 ID
    pub request_id: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, ctx: &RequestContext) -> Self {
        Self {
            success: true,
            data,
            request_id: ctx.correlation_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
