//! 产品仓储端口与分页类型

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use super::error::{ProductError, ProductResult};
use super::model::{Product, ProductDraft, ProductId};

/// 可排序的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Price,
    Rating,
    Category,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// 对应的数据库列名
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::Rating => "rating",
            SortField::Category => "category",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for SortField {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "price" => Ok(SortField::Price),
            "rating" => Ok(SortField::Rating),
            "category" => Ok(SortField::Category),
            "created_at" | "createdat" => Ok(SortField::CreatedAt),
            "updated_at" | "updatedat" => Ok(SortField::UpdatedAt),
            other => Err(ProductError::InvalidPage(format!("unknown sort field: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// 排序键，格式为 `field` 或 `field,asc|desc`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl FromStr for SortKey {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ',');
        let field = parts.next().unwrap_or_default().parse()?;
        let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(d) => {
                return Err(ProductError::InvalidPage(format!("unknown sort direction: {}", d)))
            }
        };
        Ok(SortKey { field, direction })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field.column(), self.direction.keyword().to_ascii_lowercase())
    }
}

/// 分页请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_index: u32,
    pub page_size: u32,
    pub sort: Option<SortKey>,
}

impl PageRequest {
    /// 创建分页请求，`page_size` 必须在 `1..=max_page_size` 范围内
    pub fn new(
        page_index: u32,
        page_size: u32,
        sort: Option<SortKey>,
        max_page_size: u32,
    ) -> ProductResult<Self> {
        if page_size == 0 {
            return Err(ProductError::InvalidPage("page size must be positive".to_string()));
        }
        if page_size > max_page_size {
            return Err(ProductError::InvalidPage(format!(
                "page size {} exceeds maximum {}",
                page_size, max_page_size
            )));
        }
        Ok(Self {
            page_index,
            page_size,
            sort,
        })
    }

    pub fn of(page_index: u32, page_size: u32) -> ProductResult<Self> {
        Self::new(page_index, page_size, None, u32::MAX)
    }

    pub fn offset(&self) -> u64 {
        self.page_index as u64 * self.page_size as u64
    }
}

/// 一页结果及总数
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_index: u32,
    pub page_size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            items,
            page_index: request.page_index,
            page_size: request.page_size,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(self.page_size as u64)
    }

    pub fn has_next(&self) -> bool {
        (self.page_index as u64) + 1 < self.total_pages()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total_elements: self.total_elements,
        }
    }
}

/// 产品仓储端口
///
/// 用例层只依赖这个 trait，具体存储由基础设施层实现。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 按标识查找，不存在时返回 `None`
    async fn find_by_id(&self, id: &ProductId) -> ProductResult<Option<Product>>;

    /// 分页查询，超出范围的页返回空页
    async fn find_all(&self, page: PageRequest) -> ProductResult<Page<Product>>;

    /// 持久化新产品，返回带标识和时间戳的存储结果
    async fn save(&self, draft: ProductDraft) -> ProductResult<Product>;

    /// 整体替换已有产品，不存在时返回 `NotFound`
    async fn update(&self, id: &ProductId, draft: ProductDraft) -> ProductResult<Product>;

    /// 删除产品及其规格，不存在时返回 `NotFound`
    async fn delete_by_id(&self, id: &ProductId) -> ProductResult<()>;

    async fn exists_by_id(&self, id: &ProductId) -> ProductResult<bool>;
}
