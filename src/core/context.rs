//! 请求上下文

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use uuid::Uuid;

/// 单个请求的上下文，由关联 ID 中间件创建并显式传递给服务层
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: String,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
        }
    }

    /// 生成带有新关联 ID 的上下文
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// 采用请求头中的值，空白时生成新的
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self::new(v),
            _ => Self::generate(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // 中间件未运行时（如单独测试处理器）退化为新 ID
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(RequestContext::generate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_header() {
        assert_eq!(RequestContext::from_header(Some("abc-123")).correlation_id, "abc-123");

        let generated = RequestContext::from_header(Some("   "));
        assert!(Uuid::parse_str(&generated.correlation_id).is_ok());

        let generated = RequestContext::from_header(None);
        assert!(Uuid::parse_str(&generated.correlation_id).is_ok());
    }
}
