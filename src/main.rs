//! 产品目录服务入口

use anyhow::Context;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;

use product_catalog::{
    app::product::{handler::AppState, ProductRepository, ProductService},
    create_routes,
    infrastructure::{
        config::{load_config, AppConfig, StorageBackend},
        logger::Logger,
        persistence::InMemoryProductRepository,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("加载配置失败")?;
    let _guard = Logger::init(&config.logging)?;

    info!("Starting product catalog service...");

    let repository = build_repository(&config).await?;
    let state = AppState {
        product_service: ProductService::new(repository),
        pagination: config.pagination.clone(),
    };

    let app = create_routes(
        state,
        config.correlation.header()?,
        Duration::from_secs(config.server.timeout_seconds),
    );

    let listener = TcpListener::bind((config.server.bind_address.as_str(), config.server.port))
        .await
        .with_context(|| format!("无法绑定到端口 {}", config.server.port))?;
    let addr = listener.local_addr()?;

    info!("🚀 Product catalog running on http://{}", addr);
    info!("📖 API 端点:");
    info!("   GET    /health         - 健康检查");
    info!("   GET    /products       - 分页获取产品 (?page=0&size=20&sort=name,asc)");
    info!("   POST   /products       - 创建产品");
    info!("   GET    /products/:id   - 获取产品");
    info!("   PUT    /products/:id   - 替换产品");
    info!("   DELETE /products/:id   - 删除产品");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn ProductRepository>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory product storage");
            Ok(Arc::new(InMemoryProductRepository::new()))
        }
        StorageBackend::Postgres => postgres_repository(config).await,
    }
}

#[cfg(feature = "database")]
async fn postgres_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn ProductRepository>> {
    use product_catalog::infrastructure::{
        database::DatabaseManager, persistence::PgProductRepository,
    };

    let url = config
        .database
        .url
        .as_deref()
        .context("database.url 未配置")?;
    let manager = DatabaseManager::new(url, &config.database)
        .await
        .context("连接数据库失败")?;

    if config.database.auto_migrate {
        manager.create_tables().await.context("创建数据表失败")?;
    }

    Ok(Arc::new(PgProductRepository::new(manager.get_pool().clone())))
}

#[cfg(not(feature = "database"))]
async fn postgres_repository(_config: &AppConfig) -> anyhow::Result<Arc<dyn ProductRepository>> {
    anyhow::bail!("postgres 存储需要启用 `database` feature")
}
