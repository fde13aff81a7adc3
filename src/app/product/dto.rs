//! 产品请求/响应数据结构

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use super::model::{Product, ProductDraft, Specifications};
use super::repository::Page;
use crate::core::error::CoreError;

/// 单条规格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SpecificationDto {
    #[validate(length(min = 1, max = 50, message = "specification key must be between 1 and 50 characters"))]
    pub key: String,

    #[validate(length(max = 80, message = "specification value must be at most 80 characters"))]
    pub value: String,
}

/// 创建或整体替换产品的请求体
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 60, message = "name must be between 1 and 60 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "image_url must be at most 500 characters"))]
    pub image_url: Option<String>,

    #[serde(default)]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: String,

    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,

    #[validate(custom(function = "validate_currency"))]
    pub currency: String,

    pub rating: f64,

    #[validate(length(min = 1, max = 50, message = "category must be between 1 and 50 characters"))]
    pub category: String,

    #[validate(length(max = 50, message = "brand must be at most 50 characters"))]
    pub brand: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub specifications: Vec<SpecificationDto>,
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// 价格精度 10.2：非负，最多两位小数，整数部分最多 8 位
fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(validation_error("price", "price must not be negative"));
    }
    if price.normalize().scale() > 2 {
        return Err(validation_error("price", "price must have at most 2 decimal places"));
    }
    if *price >= Decimal::from(100_000_000u64) {
        return Err(validation_error("price", "price must have at most 8 integer digits"));
    }
    Ok(())
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(validation_error("currency", "currency must be a 3-letter upper-case code"))
    }
}

impl ProductRequest {
    /// 校验并转换为领域草稿
    pub fn into_draft(self) -> Result<ProductDraft, CoreError> {
        self.validate()?;

        let mut specifications = Specifications::new();
        for spec in self.specifications {
            if specifications.contains_key(&spec.key) {
                return Err(CoreError::BadRequest(format!(
                    "duplicate specification key: {}",
                    spec.key
                )));
            }
            specifications.insert(spec.key, spec.value);
        }

        let mut price = self.price;
        price.rescale(2);

        Ok(ProductDraft {
            name: self.name,
            image_url: self.image_url,
            description: self.description,
            price,
            currency: self.currency,
            rating: self.rating,
            category: self.category,
            brand: self.brand,
            specifications,
        })
    }
}

/// 产品响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub rating: f64,
    pub category: String,
    pub brand: Option<String>,
    pub specifications: Vec<SpecificationDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.into_inner(),
            name: product.name,
            image_url: product.image_url,
            description: product.description,
            price: product.price,
            currency: product.currency,
            rating: product.rating,
            category: product.category,
            brand: product.brand,
            specifications: product
                .specifications
                .into_iter()
                .map(|(key, value)| SpecificationDto { key, value })
                .collect(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// 分页响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub has_next: bool,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        let has_next = page.has_next();
        Self {
            items: page.items,
            page: page.page_index,
            size: page.page_size,
            total_elements: page.total_elements,
            total_pages,
            has_next,
        }
    }
}

/// 列表查询参数
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> ProductRequest {
        ProductRequest {
            name: "Widget".to_string(),
            image_url: None,
            description: "A widget".to_string(),
            price: dec!(12.5),
            currency: "USD".to_string(),
            rating: 4.5,
            category: "Tools".to_string(),
            brand: None,
            specifications: vec![SpecificationDto {
                key: "color".to_string(),
                value: "red".to_string(),
            }],
        }
    }

    #[test]
    fn test_into_draft_normalizes_price_scale() {
        let draft = request().into_draft().unwrap();
        assert_eq!(draft.price.to_string(), "12.50");
        assert_eq!(draft.specifications.get("color").map(String::as_str), Some("red"));
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        let mut bad = request();
        bad.currency = "usd".to_string();
        assert!(matches!(bad.into_draft(), Err(CoreError::BadRequest(_))));

        let mut bad = request();
        bad.price = dec!(1.999);
        assert!(bad.into_draft().is_err());

        let mut bad = request();
        bad.price = dec!(100000000);
        assert!(bad.into_draft().is_err());

        let mut bad = request();
        bad.name = "x".repeat(61);
        assert!(bad.into_draft().is_err());

        let mut bad = request();
        bad.specifications[0].value = "v".repeat(81);
        assert!(bad.into_draft().is_err());
    }

    #[test]
    fn test_duplicate_specification_keys_are_rejected() {
        let mut bad = request();
        bad.specifications.push(SpecificationDto {
            key: "color".to_string(),
            value: "blue".to_string(),
        });
        match bad.into_draft() {
            Err(CoreError::BadRequest(msg)) => assert!(msg.contains("color")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
