//! PostgreSQL 存储实现

use async_trait::async_trait;
use sqlx::{postgres::PgPool, PgConnection};
use std::collections::HashMap;
use tracing::debug;

use super::entity::{specification_rows, ProductRow, SpecificationRow};
use crate::app::product::error::{ProductError, ProductResult};
use crate::app::product::model::{Product, ProductDraft, ProductId};
use crate::app::product::repository::{Page, PageRequest, ProductRepository};

const SELECT_PRODUCT: &str = "SELECT id, name, image_url, description, price, currency, rating, \
     category, brand, created_at, updated_at FROM products";

const RETURNING_PRODUCT: &str = "RETURNING id, name, image_url, description, price, currency, \
     rating, category, brand, created_at, updated_at";

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn specifications_for(
        &self,
        ids: &[String],
    ) -> ProductResult<HashMap<String, Vec<SpecificationRow>>> {
        let rows = sqlx::query_as::<_, SpecificationRow>(
            "SELECT product_id, spec_key, spec_value FROM product_specifications \
             WHERE product_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<String, Vec<SpecificationRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.product_id.clone()).or_default().push(row);
        }
        Ok(grouped)
    }
}

/// 名称唯一约束冲突翻译为 `AlreadyExists`
fn map_write_error(err: sqlx::Error, name: &str) -> ProductError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return ProductError::AlreadyExists {
                name: name.to_string(),
            };
        }
    }
    err.into()
}

async fn load_specifications(
    conn: &mut PgConnection,
    id: &ProductId,
) -> ProductResult<Vec<SpecificationRow>> {
    let rows = sqlx::query_as::<_, SpecificationRow>(
        "SELECT product_id, spec_key, spec_value FROM product_specifications WHERE product_id = $1",
    )
    .bind(id.as_str())
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

async fn insert_specifications(
    conn: &mut PgConnection,
    rows: &[SpecificationRow],
) -> ProductResult<()> {
    for row in rows {
        sqlx::query(
            "INSERT INTO product_specifications (product_id, spec_key, spec_value) \
             VALUES ($1, $2, $3)",
        )
        .bind(&row.product_id)
        .bind(&row.spec_key)
        .bind(&row.spec_value)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn delete_specifications(conn: &mut PgConnection, id: &ProductId) -> ProductResult<()> {
    sqlx::query("DELETE FROM product_specifications WHERE product_id = $1")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> ProductResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{} WHERE id = $1", SELECT_PRODUCT))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut specs = self.specifications_for(&[row.id.clone()]).await?;
        let specs = specs.remove(&row.id).unwrap_or_default();
        row.into_domain(specs).map(Some)
    }

    async fn find_all(&self, page: PageRequest) -> ProductResult<Page<Product>> {
        let order = match page.sort {
            Some(key) => format!("{} {}, id ASC", key.field.column(), key.direction.keyword()),
            None => "created_at ASC, id ASC".to_string(),
        };
        let offset = i64::try_from(page.offset())
            .map_err(|_| ProductError::InvalidPage(format!("offset {} too large", page.offset())))?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{} ORDER BY {} LIMIT $1 OFFSET $2",
            SELECT_PRODUCT, order
        ))
        .bind(page.page_size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();
        let mut specs = if ids.is_empty() {
            HashMap::new()
        } else {
            self.specifications_for(&ids).await?
        };

        let items = rows
            .into_iter()
            .map(|row| {
                let owned = specs.remove(&row.id).unwrap_or_default();
                row.into_domain(owned)
            })
            .collect::<ProductResult<Vec<_>>>()?;

        Ok(Page::new(items, &page, total.0.max(0) as u64))
    }

    async fn save(&self, draft: ProductDraft) -> ProductResult<Product> {
        let id = ProductId::generate();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (id, name, image_url, description, price, currency, rating, \
             category, brand) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) {}",
            RETURNING_PRODUCT
        ))
        .bind(id.as_str())
        .bind(&draft.name)
        .bind(&draft.image_url)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.currency)
        .bind(draft.rating)
        .bind(&draft.category)
        .bind(&draft.brand)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &draft.name))?;

        let specs = specification_rows(&id, &draft.specifications);
        insert_specifications(&mut *tx, &specs).await?;
        tx.commit().await?;

        debug!(product_id = %id, "Inserted product row");
        row.into_domain(specs)
    }

    async fn update(&self, id: &ProductId, draft: ProductDraft) -> ProductResult<Product> {
        if !self.exists_by_id(id).await? {
            return Err(ProductError::not_found(id));
        }

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, ProductRow>(&format!(
            "{} WHERE id = $1 FOR UPDATE",
            SELECT_PRODUCT
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ProductError::not_found(id))?;
        let current_specs = load_specifications(&mut *tx, id).await?;

        let mut product = current.into_domain(current_specs)?;
        product.apply(draft);
        let (row, specs) = ProductRow::from_domain(&product);

        // updated_at 由触发器刷新
        let stored = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET name = $2, image_url = $3, description = $4, price = $5, \
             currency = $6, rating = $7, category = $8, brand = $9 WHERE id = $1 {}",
            RETURNING_PRODUCT
        ))
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.image_url)
        .bind(&row.description)
        .bind(row.price)
        .bind(&row.currency)
        .bind(row.rating)
        .bind(&row.category)
        .bind(&row.brand)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &row.name))?;

        delete_specifications(&mut *tx, id).await?;
        insert_specifications(&mut *tx, &specs).await?;
        tx.commit().await?;

        debug!(product_id = %id, "Updated product row");
        stored.into_domain(specs)
    }

    async fn delete_by_id(&self, id: &ProductId) -> ProductResult<()> {
        if !self.exists_by_id(id).await? {
            return Err(ProductError::not_found(id));
        }

        let mut tx = self.pool.begin().await?;
        delete_specifications(&mut *tx, id).await?;
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(product_id = %id, "Deleted product row");
        Ok(())
    }

    async fn exists_by_id(&self, id: &ProductId) -> ProductResult<bool> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }
}
