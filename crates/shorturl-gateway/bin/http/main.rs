mod cli;
mod shutdown;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use shorturl_cache::{LayeredCache, MokaLinkCache, RedisCacheOptions, RedisLinkCache};
use shorturl_core::{LinkCache, LinkStore};
use shorturl_gateway::{App, AppState};
use shorturl_generator::NanoIdGenerator;
use shorturl_resolver::{CacheHealth, CacheHealthCheck, ResolutionEngine};
use shorturl_storage::{InMemoryStore, MySqlStore, MySqlStoreOptions};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::cli::{CacheBackend, Cli, StoreBackend};
use crate::shutdown::{serve_until_stopped, shutdown_signal, stopped, Teardown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_level, cli.log_format)?;

    info!(
        listen_addr = %cli.listen_addr,
        store = %cli.store,
        cache = %cli.cache,
        "starting shorturl gateway"
    );

    let store = connect_store(&cli).await?;
    let cache = build_cache(&cli).await?;
    let engine = ResolutionEngine::new(
        Arc::clone(&store),
        Arc::clone(&cache),
        NanoIdGenerator::with_size(usize::from(cli.id_size)),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let health = CacheHealth::new();
    let health_check = CacheHealthCheck::new(cache, cli.cache_ping_interval(), health.clone());
    let health_task = tokio::spawn(health_check.run(stopped(shutdown_rx.clone())));

    let state = AppState::new(Arc::new(engine), health, cli.request_timeout());
    let mut app = App::new(state);
    if let Some(dir) = &cli.static_dir {
        info!(dir = %dir.display(), "serving static files");
        app = app.with_static_dir(dir);
    }

    let listener = TcpListener::bind(cli.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen_addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    let router = app.router();
    let server_stop = stopped(shutdown_rx);
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(server_stop)
            .await
    });

    let teardown = Teardown {
        shutdown_tx,
        health_task,
        store,
    };
    serve_until_stopped(server, shutdown_signal(), cli.shutdown_timeout(), teardown).await
}

async fn connect_store(cli: &Cli) -> anyhow::Result<Arc<dyn LinkStore>> {
    match cli.store {
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
        StoreBackend::Mysql => {
            let dsn = cli
                .mysql_dsn
                .as_deref()
                .context("--mysql-dsn is required when --store is mysql")?;
            let options = MySqlStoreOptions::builder()
                .connect_timeout(cli.store_connect_timeout())
                .op_timeout(cli.store_op_timeout())
                .max_connections(cli.mysql_max_connections)
                .build();

            let store = MySqlStore::connect(dsn, options)
                .await
                .context("failed to connect to mysql")?;
            store
                .ensure_schema()
                .await
                .context("failed to create mysql schema")?;
            Ok(Arc::new(store))
        }
    }
}

async fn build_cache(cli: &Cli) -> anyhow::Result<Arc<dyn LinkCache>> {
    let local = || MokaLinkCache::with_capacity(cli.cache_capacity);

    Ok(match cli.cache {
        CacheBackend::Memory => Arc::new(local()),
        CacheBackend::Redis => Arc::new(connect_redis(cli).await?),
        CacheBackend::Layered => Arc::new(LayeredCache::new(local(), connect_redis(cli).await?)),
    })
}

async fn connect_redis(cli: &Cli) -> anyhow::Result<RedisLinkCache> {
    let url = cli
        .redis_url
        .as_deref()
        .context("--redis-url is required for the redis and layered caches")?;
    let options = RedisCacheOptions::builder()
        .timeout(cli.cache_timeout())
        .build();

    RedisLinkCache::connect(url, options)
        .await
        .context("failed to connect to redis")
}
