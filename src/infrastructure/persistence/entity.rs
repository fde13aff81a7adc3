//! 产品的存储行结构及其与领域模型之间的映射

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::app::product::error::{ProductError, ProductResult};
use crate::app::product::model::{Product, ProductId, Specifications};

/// `products` 表的一行
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub rating: f64,
    pub category: String,
    pub brand: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `product_specifications` 表的一行，主键为 (product_id, spec_key)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct SpecificationRow {
    pub product_id: String,
    pub spec_key: String,
    pub spec_value: String,
}

impl ProductRow {
    /// 领域模型 -> 存储行
    pub fn from_domain(product: &Product) -> (ProductRow, Vec<SpecificationRow>) {
        let row = ProductRow {
            id: product.id.to_string(),
            name: product.name.clone(),
            image_url: product.image_url.clone(),
            description: product.description.clone(),
            price: product.price,
            currency: product.currency.clone(),
            rating: product.rating,
            category: product.category.clone(),
            brand: product.brand.clone(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        };
        let specs = specification_rows(&product.id, &product.specifications);
        (row, specs)
    }

    /// 存储行 -> 领域模型
    ///
    /// 存储数据损坏（币种格式错误、规格归属错误、重复键）时返回 `Mapper` 错误。
    pub fn into_domain(self, specs: Vec<SpecificationRow>) -> ProductResult<Product> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ProductError::mapper(
                &self.id,
                format!("invalid currency code: {:?}", self.currency),
            ));
        }

        let mut specifications = Specifications::new();
        for spec in specs {
            if spec.product_id != self.id {
                return Err(ProductError::mapper(
                    &self.id,
                    format!("specification {} belongs to product {}", spec.spec_key, spec.product_id),
                ));
            }
            if specifications.insert(spec.spec_key.clone(), spec.spec_value).is_some() {
                return Err(ProductError::mapper(
                    &self.id,
                    format!("duplicate specification key: {}", spec.spec_key),
                ));
            }
        }

        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            image_url: self.image_url,
            description: self.description,
            price: self.price,
            currency: self.currency,
            rating: self.rating,
            category: self.category,
            brand: self.brand,
            specifications,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub fn specification_rows(id: &ProductId, specifications: &Specifications) -> Vec<SpecificationRow> {
    specifications
        .iter()
        .map(|(key, value)| SpecificationRow {
            product_id: id.to_string(),
            spec_key: key.clone(),
            spec_value: value.clone(),
        })
        .collect()
}
