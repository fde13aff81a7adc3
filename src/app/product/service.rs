//! 产品业务服务

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{ProductError, ProductResult};
use super::model::{Product, ProductDraft, ProductId};
use super::repository::{Page, PageRequest, ProductRepository};
use crate::core::context::RequestContext;

/// 产品管理用例
///
/// 只负责把"不存在"翻译成 `ProductError::NotFound`，其余操作直接转发给仓储。
#[derive(Clone)]
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    pub async fn find_by_id(&self, ctx: &RequestContext, id: &ProductId) -> ProductResult<Product> {
        debug!(correlation_id = %ctx.correlation_id, product_id = %id, "Finding product");
        match self.repository.find_by_id(id).await? {
            Some(product) => Ok(product),
            None => {
                warn!(correlation_id = %ctx.correlation_id, product_id = %id, "Product not found");
                Err(ProductError::not_found(id))
            }
        }
    }

    pub async fn find_all_products(
        &self,
        ctx: &RequestContext,
        page: PageRequest,
    ) -> ProductResult<Page<Product>> {
        debug!(
            correlation_id = %ctx.correlation_id,
            page_index = page.page_index,
            page_size = page.page_size,
            "Listing products"
        );
        self.repository.find_all(page).await
    }

    pub async fn create_product(
        &self,
        ctx: &RequestContext,
        draft: ProductDraft,
    ) -> ProductResult<Product> {
        let product = self.repository.save(draft).await?;
        info!(
            correlation_id = %ctx.correlation_id,
            product_id = %product.id,
            name = %product.name,
            "Created product"
        );
        Ok(product)
    }

    pub async fn update_product(
        &self,
        ctx: &RequestContext,
        id: &ProductId,
        draft: ProductDraft,
    ) -> ProductResult<Product> {
        let product = self.repository.update(id, draft).await?;
        info!(correlation_id = %ctx.correlation_id, product_id = %id, "Updated product");
        Ok(product)
    }

    pub async fn delete_product(&self, ctx: &RequestContext, id: &ProductId) -> ProductResult<()> {
        self.repository.delete_by_id(id).await?;
        info!(correlation_id = %ctx.correlation_id, product_id = %id, "Deleted product");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::product::model::Specifications;
    use crate::app::product::repository::MockProductRepository;
    use chrono::Utc;
    use mockall::predicate::eq;
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
            brand: None,
            specifications: Specifications::new(),
        }
    }

    fn stored(id: &str) -> Product {
        let now = Utc::now();
        Product::from_draft(ProductId::from(id), draft(), now, now)
    }

    #[tokio::test]
    async fn test_find_by_id_translates_absence() {
        let mut repository = MockProductRepository::new();
        repository
            .expect_find_by_id()
            .with(eq(ProductId::from("missing")))
            .times(1)
            .returning(|_| Ok(None));

        let service = ProductService::new(Arc::new(repository));
        let err = service
            .find_by_id(&RequestContext::generate(), &ProductId::from("missing"))
            .await
            .unwrap_err();

        match err {
            ProductError::NotFound { id } => assert_eq!(id.as_str(), "missing"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_product() {
        let mut repository = MockProductRepository::new();
        repository
            .expect_find_by_id()
            .returning(|id| Ok(Some(stored(id.as_str()))));

        let service = ProductService::new(Arc::new(repository));
        let product = service
            .find_by_id(&RequestContext::generate(), &ProductId::from("p-1"))
            .await
            .unwrap();
        assert_eq!(product.id.as_str(), "p-1");
    }

    #[tokio::test]
    async fn test_find_all_passes_page_through() {
        let request = PageRequest::of(2, 5).unwrap();
        let mut repository = MockProductRepository::new();
        repository
            .expect_find_all()
            .with(eq(request))
            .times(1)
            .returning(|page| Ok(Page::new(vec![], &page, 7)));

        let service = ProductService::new(Arc::new(repository));
        let page = service
            .find_all_products(&RequestContext::generate(), request)
            .await
            .unwrap();
        assert_eq!(page.page_index, 2);
        assert_eq!(page.total_elements, 7);
    }

    #[tokio::test]
    async fn test_mutations_are_forwarded() {
        let mut repository = MockProductRepository::new();
        repository
            .expect_save()
            .times(1)
            .returning(|_| Ok(stored("p-1")));
        repository
            .expect_update()
            .times(1)
            .returning(|id, _| Err(ProductError::not_found(id)));
        repository
            .expect_delete_by_id()
            .times(1)
            .returning(|_| Ok(()));

        let service = ProductService::new(Arc::new(repository));
        let ctx = RequestContext::generate();

        let created = service.create_product(&ctx, draft()).await.unwrap();
        assert_eq!(created.name, "Widget");

        let err = service
            .update_product(&ctx, &ProductId::from("gone"), draft())
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::NotFound { .. }));

        service.delete_product(&ctx, &created.id).await.unwrap();
    }
}
