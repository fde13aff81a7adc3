//! 数据库基础设施

use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Error,
};
use std::time::Duration;
use tracing::info;

use super::config::DatabaseConfig;

pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    pub async fn new(database_url: &str, config: &DatabaseConfig) -> Result<Self, Error> {
        info!(
            "Connecting to database: {}",
            database_url.rsplit('@').next().unwrap_or("<unknown>")
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// 创建产品表与规格表（幂等）
    pub async fn create_tables(&self) -> Result<(), Error> {
        create_tables(&self.pool).await
    }
}

pub async fn create_tables(pool: &PgPool) -> Result<(), Error> {
    info!("Creating database tables...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id VARCHAR(36) PRIMARY KEY,
            name VARCHAR(60) NOT NULL UNIQUE,
            image_url VARCHAR(500),
            description VARCHAR(500) NOT NULL,
            price NUMERIC(10, 2) NOT NULL,
            currency CHAR(3) NOT NULL,
            rating DOUBLE PRECISION NOT NULL,
            category VARCHAR(50) NOT NULL,
            brand VARCHAR(50),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_specifications (
            product_id VARCHAR(36) NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            spec_key VARCHAR(50) NOT NULL,
            spec_value VARCHAR(80) NOT NULL,
            PRIMARY KEY (product_id, spec_key)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 更新时间触发器函数
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION update_updated_at_column()
        RETURNS TRIGGER AS $$
        BEGIN
            NEW.updated_at = clock_timestamp();
            RETURN NEW;
        END;
        $$ language 'plpgsql'
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("DROP TRIGGER IF EXISTS update_products_updated_at ON products")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER update_products_updated_at
            BEFORE UPDATE ON products
            FOR EACH ROW
            EXECUTE FUNCTION update_updated_at_column()
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database tables created successfully");
    Ok(())
}
