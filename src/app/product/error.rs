//! 产品领域错误

use super::model::ProductId;

/// 产品领域错误类型，每个变体都携带出错的标识或名称
#[derive(Debug, thiserror::Error)]
pub enum ProductError {
    #[error("product not found: {id}")]
    NotFound { id: ProductId },

    /// 名称唯一性由存储层保证，这里只负责表达冲突
    #[error("product already exists: {name}")]
    AlreadyExists { name: String },

    #[error("failed to map product {id}: {reason}")]
    Mapper { id: String, reason: String },

    #[error("invalid page request: {0}")]
    InvalidPage(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    pub fn not_found(id: &ProductId) -> Self {
        ProductError::NotFound { id: id.clone() }
    }

    pub fn mapper(id: impl Into<String>, reason: impl Into<String>) -> Self {
        ProductError::Mapper {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for ProductError {
    fn from(err: sqlx::Error) -> Self {
        ProductError::Storage(err.to_string())
    }
}
