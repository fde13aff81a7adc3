//! 产品持久化适配器

pub mod entity;
pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;

pub use memory::InMemoryProductRepository;
#[cfg(feature = "database")]
pub use postgres::PgProductRepository;
