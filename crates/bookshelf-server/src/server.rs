use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::get,
};
use bookshelf_db_memory::create_book_storage;
use bookshelf_storage::{BookStorage, InstrumentedStorage};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    cache::{CacheBackend, PagedQueryCache},
    config::AppConfig,
    handlers,
    heartbeat::Heartbeat,
    seed,
    service::BookService,
};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BookService>,
    /// Same store the service reads, kept typed for its counters.
    pub storage: Arc<InstrumentedStorage<Arc<dyn BookStorage>>>,
}

pub struct BookshelfServer {
    addr: SocketAddr,
    app: Router,
    service: Arc<BookService>,
    heartbeat_interval: Option<Duration>,
}

/// Wire the in-memory store, the cache and the service.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    build_state_with(cfg, create_book_storage()).await
}

/// Same as [`build_state`] over any backend, seeding the demo catalog if configured.
pub async fn build_state_with(
    cfg: &AppConfig,
    backend: Arc<dyn BookStorage>,
) -> anyhow::Result<AppState> {
    let storage = Arc::new(InstrumentedStorage::new(backend));
    if cfg.storage.seed_demo_data {
        seed::seed(storage.as_ref()).await?;
    }

    let cache = PagedQueryCache::new(CacheBackend::new(), cfg.paged_ttl());
    let service = Arc::new(BookService::new(storage.clone(), cache));
    tracing::info!(
        backend = service.backend_name(),
        paged_ttl_secs = cfg.cache.paged_ttl_secs,
        "book service initialized"
    );

    Ok(AppState { service, storage })
}

pub fn router(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/v1/books",
            get(handlers::list_books).post(handlers::create_book),
        )
        .route(
            "/api/v1/books/{id}",
            get(handlers::get_book)
                .put(handlers::update_book)
                .delete(handlers::delete_book),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = tracing::field::Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    Ok(router(state, cfg))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<BookshelfServer> {
        let state = build_state(&self.config).await?;
        let service = state.service.clone();
        let app = router(state, &self.config);
        let heartbeat_interval = self
            .config
            .heartbeat
            .enabled
            .then(|| self.config.heartbeat_interval());

        Ok(BookshelfServer {
            addr: self.addr,
            app,
            service,
            heartbeat_interval,
        })
    }
}

impl BookshelfServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);

        let heartbeat = self
            .heartbeat_interval
            .map(|period| Heartbeat::spawn(self.service.clone(), period));

        let served = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        if let Some(heartbeat) = heartbeat {
            heartbeat.shutdown().await;
        }
        served?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
