//! 内存存储实现
//!
//! 按关系表的形状保存数据（产品表 + 规格表），并模拟数据库的
//! 名称唯一约束与级联删除，用于测试和无数据库运行。

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::debug;

use super::entity::{specification_rows, ProductRow, SpecificationRow};
use crate::app::product::error::{ProductError, ProductResult};
use crate::app::product::model::{Product, ProductDraft, ProductId};
use crate::app::product::repository::{
    Page, PageRequest, ProductRepository, SortDirection, SortField,
};

#[derive(Default)]
struct Tables {
    products: HashMap<String, ProductRow>,
    specifications: BTreeMap<(String, String), SpecificationRow>,
}

impl Tables {
    fn specs_of(&self, product_id: &str) -> Vec<SpecificationRow> {
        self.specifications
            .range((product_id.to_string(), String::new())..)
            .take_while(|((owner, _), _)| owner == product_id)
            .map(|(_, row)| row.clone())
            .collect()
    }

    fn remove_specs_of(&mut self, product_id: &str) {
        self.specifications.retain(|(owner, _), _| owner != product_id);
    }

    fn insert_specs(&mut self, rows: Vec<SpecificationRow>) {
        for row in rows {
            self.specifications
                .insert((row.product_id.clone(), row.spec_key.clone()), row);
        }
    }

    fn name_taken(&self, name: &str, except: Option<&str>) -> bool {
        self.products
            .values()
            .any(|row| row.name == name && Some(row.id.as_str()) != except)
    }

    fn load(&self, id: &str) -> ProductResult<Option<Product>> {
        match self.products.get(id) {
            Some(row) => row.clone().into_domain(self.specs_of(id)).map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ProductResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| ProductError::Storage("in-memory store lock poisoned".to_string()))
    }

    /// 规格表中的总行数
    #[cfg(test)]
    fn specification_count(&self) -> ProductResult<usize> {
        Ok(self.lock()?.specifications.len())
    }
}

fn compare(a: &ProductRow, b: &ProductRow, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Price => a.price.cmp(&b.price),
        SortField::Rating => a.rating.total_cmp(&b.rating),
        SortField::Category => a.category.cmp(&b.category),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

/// 更新时间必须严格前进
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> ProductResult<Option<Product>> {
        self.lock()?.load(id.as_str())
    }

    async fn find_all(&self, page: PageRequest) -> ProductResult<Page<Product>> {
        let tables = self.lock()?;

        let mut rows: Vec<&ProductRow> = tables.products.values().collect();
        rows.sort_by(|a, b| {
            let primary = match page.sort {
                Some(key) => {
                    let ord = compare(a, b, key.field);
                    match key.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                }
                None => a.created_at.cmp(&b.created_at),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.page_size as usize)
            .map(|row| row.clone().into_domain(tables.specs_of(&row.id)))
            .collect::<ProductResult<Vec<_>>>()?;

        Ok(Page::new(items, &page, total))
    }

    async fn save(&self, draft: ProductDraft) -> ProductResult<Product> {
        let mut tables = self.lock()?;
        if tables.name_taken(&draft.name, None) {
            return Err(ProductError::AlreadyExists { name: draft.name });
        }

        let now = Utc::now();
        let product = Product::from_draft(ProductId::generate(), draft, now, now);
        let (row, specs) = ProductRow::from_domain(&product);
        tables.products.insert(row.id.clone(), row);
        tables.insert_specs(specs);

        debug!(product_id = %product.id, "Inserted product row");
        Ok(product)
    }

    async fn update(&self, id: &ProductId, draft: ProductDraft) -> ProductResult<Product> {
        let mut tables = self.lock()?;
        let mut current = tables
            .load(id.as_str())?
            .ok_or_else(|| ProductError::not_found(id))?;

        if tables.name_taken(&draft.name, Some(id.as_str())) {
            return Err(ProductError::AlreadyExists { name: draft.name });
        }

        current.apply(draft);
        current.updated_at = next_timestamp(current.updated_at);

        let (row, _) = ProductRow::from_domain(&current);
        tables.products.insert(row.id.clone(), row);
        tables.remove_specs_of(id.as_str());
        tables.insert_specs(specification_rows(id, &current.specifications));

        debug!(product_id = %id, "Updated product row");
        Ok(current)
    }

    async fn delete_by_id(&self, id: &ProductId) -> ProductResult<()> {
        let mut tables = self.lock()?;
        if tables.products.remove(id.as_str()).is_none() {
            return Err(ProductError::not_found(id));
        }
        tables.remove_specs_of(id.as_str());

        debug!(product_id = %id, "Deleted product row");
        Ok(())
    }

    async fn exists_by_id(&self, id: &ProductId) -> ProductResult<bool> {
        Ok(self.lock()?.products.contains_key(id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::product::model::Specifications;
    use crate::app::product::repository::SortKey;
    use rust_decimal_macros::dec;

    fn draft(name: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            image_url: None,
            description: "A widget".to_string(),
            price: dec!(9.99),
            currency: "USD".to_string(),
            rating: 4.5,
            category: "Tools".to_string(),
            brand: None,
            specifications: Specifications::from([
                ("color".to_string(), "red".to_string()),
                ("size".to_string(), "M".to_string()),
            ]),
        }
    }

    #[tokio::test]
    async fn test_save_then_find() {
        let repo = InMemoryProductRepository::new();
        let saved = repo.save(draft("Widget")).await.unwrap();

        let found = repo.find_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert!(repo.exists_by_id(&saved.id).await.unwrap());
        assert!(repo.find_by_id(&ProductId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let repo = InMemoryProductRepository::new();
        repo.save(draft("Widget")).await.unwrap();
        let other = repo.save(draft("Gadget")).await.unwrap();

        let err = repo.save(draft("Widget")).await.unwrap_err();
        assert!(matches!(err, ProductError::AlreadyExists { ref name } if name == "Widget"));

        let err = repo.update(&other.id, draft("Widget")).await.unwrap_err();
        assert!(matches!(err, ProductError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_writes_nothing() {
        let repo = InMemoryProductRepository::new();
        let err = repo
            .update(&ProductId::from("ghost"), draft("Ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::NotFound { ref id } if id.as_str() == "ghost"));

        let page = repo.find_all(PageRequest::of(0, 10).unwrap()).await.unwrap();
        assert_eq!(page.total_elements, 0);
        assert_eq!(repo.specification_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_specifications() {
        let repo = InMemoryProductRepository::new();
        let saved = repo.save(draft("Widget")).await.unwrap();

        let mut changed = draft("Widget");
        changed.price = dec!(12.50);
        changed.specifications = Specifications::from([("material".to_string(), "steel".to_string())]);
        let updated = repo.update(&saved.id, changed).await.unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.price, dec!(12.50));
        assert_eq!(updated.created_at, saved.created_at);
        assert!(updated.updated_at > saved.updated_at);
        assert_eq!(updated.specifications.len(), 1);
        assert_eq!(repo.specification_count().unwrap(), 1);
        assert_eq!(repo.find_by_id(&saved.id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_delete_cascades_specifications() {
        let repo = InMemoryProductRepository::new();
        let keep = repo.save(draft("Keep")).await.unwrap();
        let gone = repo.save(draft("Gone")).await.unwrap();
        assert_eq!(repo.specification_count().unwrap(), 4);

        repo.delete_by_id(&gone.id).await.unwrap();
        assert!(repo.find_by_id(&gone.id).await.unwrap().is_none());
        assert_eq!(repo.specification_count().unwrap(), 2);
        assert!(repo.exists_by_id(&keep.id).await.unwrap());

        let err = repo.delete_by_id(&gone.id).await.unwrap_err();
        assert!(matches!(err, ProductError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_paging() {
        let repo = InMemoryProductRepository::new();
        let empty = repo.find_all(PageRequest::of(0, 10).unwrap()).await.unwrap();
        assert!(empty.items.is_empty());
        assert_eq!(empty.total_elements, 0);

        for i in 0..15 {
            repo.save(draft(&format!("Product {:02}", i))).await.unwrap();
        }

        let first = repo.find_all(PageRequest::of(0, 10).unwrap()).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_elements, 15);
        assert!(first.has_next());

        let second = repo.find_all(PageRequest::of(1, 10).unwrap()).await.unwrap();
        assert_eq!(second.items.len(), 5);
        assert!(!second.has_next());

        let beyond = repo.find_all(PageRequest::of(7, 10).unwrap()).await.unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_elements, 15);
    }

    #[tokio::test]
    async fn test_sorted_paging() {
        let repo = InMemoryProductRepository::new();
        for name in ["Banana", "Apple", "Cherry"] {
            repo.save(draft(name)).await.unwrap();
        }

        let sort: SortKey = "name,desc".parse().unwrap();
        let page = repo
            .find_all(PageRequest::new(0, 2, Some(sort), 100).unwrap())
            .await
            .unwrap();
        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Cherry", "Banana"]);
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_storage_error() {
        let repo = InMemoryProductRepository::new();
        let tables = repo.tables.clone();
        let _ = std::thread::spawn(move || {
            let _guard = tables.lock().unwrap();
            panic!("poison the store");
        })
        .join();

        assert!(matches!(repo.specification_count(), Err(ProductError::Storage(_))));
        let err = repo.exists_by_id(&ProductId::from("p-1")).await.unwrap_err();
        assert!(matches!(err, ProductError::Storage(_)));
    }
}
