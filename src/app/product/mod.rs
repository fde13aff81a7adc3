//! 产品管理

pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;

pub use error::{ProductError, ProductResult};
pub use model::{Product, ProductDraft, ProductId, Specifications};
pub use repository::{Page, PageRequest, ProductRepository, SortKey};
pub use service::ProductService;
