//! 产品领域模型

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// 产品标识，创建时由存储层分配，之后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 生成新的产品标识 (UUID v4 文本)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// 产品规格：键 -> 值，每个键最多一个值
pub type Specifications = BTreeMap<String, String>;

/// 产品中可由客户端修改的部分
///
/// 创建和整体替换都使用草稿，标识与时间戳只由存储层赋值。
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub image_url: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub rating: f64,
    pub category: String,
    pub brand: Option<String>,
    pub specifications: Specifications,
}

/// 已持久化的产品
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub rating: f64,
    pub category: String,
    pub brand: Option<String>,
    pub specifications: Specifications,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// 由草稿和存储层分配的字段组装产品
    pub fn from_draft(
        id: ProductId,
        draft: ProductDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name,
            image_url: draft.image_url,
            description: draft.description,
            price: draft.price,
            currency: draft.currency,
            rating: draft.rating,
            category: draft.category,
            brand: draft.brand,
            specifications: draft.specifications,
            created_at,
            updated_at,
        }
    }

    /// 用草稿覆盖可变字段，保留标识与创建时间
    pub fn apply(&mut self, draft: ProductDraft) {
        self.name = draft.name;
        self.image_url = draft.image_url;
        self.description = draft.description;
        self.price = draft.price;
        self.currency = draft.currency;
        self.rating = draft.rating;
        self.category = draft.category;
        self.brand = draft.brand;
        self.specifications = draft.specifications;
    }

    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            image_url: self.image_url.clone(),
            description: self.description.clone(),
            price: self.price,
            currency: self.currency.clone(),
            rating: self.rating,
            category: self.category.clone(),
            brand: self.brand.clone(),
            specifications: self.specifications.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Widget".to_string(),
            image_url: None,
            description: "A widget".to_string(),
            price: dec!(9.99),
            currency: "USD".to_string(),
            rating: 4.5,
            category: "Tools".to_string(),
            brand: Some("Acme".to_string()),
            specifications: Specifications::from([("color".to_string(), "red".to_string())]),
        }
    }

    #[test]
    fn test_apply_keeps_identity_and_created_at() {
        let created = Utc::now();
        let mut product = Product::from_draft(ProductId::from("p-1"), draft(), created, created);

        let mut changed = draft();
        changed.price = dec!(12.50);
        changed.specifications.clear();
        product.apply(changed.clone());

        assert_eq!(product.id.as_str(), "p-1");
        assert_eq!(product.created_at, created);
        assert_eq!(product.to_draft(), changed);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ProductId::generate(), ProductId::generate());
    }
}
