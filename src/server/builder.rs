//! ApiBuilder for assembling a CRUD API with a fluent API

use super::crud::{CrudState, crudl};
use super::middleware::{SecurityGuard, request_scope, security_token_middleware};
use crate::config::CrudConfig;
use crate::core::events::Listener;
use crate::core::resource::Resource;
use crate::core::service::{DataAccess, DataAccessRegistry};
use anyhow::{Result, anyhow};
use axum::Router;
use axum::middleware::from_fn_with_state;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

type RegistrationCheck = fn(&DataAccessRegistry) -> bool;

/// Builder for a CRUD API
///
/// ```rust,ignore
/// let app = ApiBuilder::new()
///     .with_config(CrudConfig::from_env()?)
///     .with_data_access::<Author>(Arc::new(InMemoryDataAccess::new()))
///     .with_data_access::<Book>(Arc::new(InMemoryDataAccess::new()))
///     .with_listener(Listener::new(PRE_CREATE, 10, audit))
///     .resource::<Author>("/authors", "")
///     .protected_resource::<Book>("/books", "CRUD")
///     .build()?;
/// ```
pub struct ApiBuilder {
    config: CrudConfig,
    registry: DataAccessRegistry,
    listeners: Vec<Listener>,
    public: Router<CrudState>,
    protected: Router<CrudState>,
    has_protected: bool,
    mounted: Vec<(&'static str, RegistrationCheck)>,
    custom_routes: Vec<Router>,
}

impl ApiBuilder {
    /// Create a new builder with the default configuration
    pub fn new() -> Self {
        Self {
            config: CrudConfig::default(),
            registry: DataAccessRegistry::new(),
            listeners: Vec::new(),
            public: Router::new(),
            protected: Router::new(),
            has_protected: false,
            mounted: Vec::new(),
            custom_routes: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: CrudConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the data access of a resource type
    pub fn with_data_access<T: Resource>(mut self, data_access: Arc<dyn DataAccess<T>>) -> Self {
        self.registry.register(data_access);
        self
    }

    /// Add a listener installed on every request
    pub fn with_listener(mut self, listener: Listener) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Mount CRUD routes for a resource
    ///
    /// `methods` selects the handlers (`C R U D L`, empty for all).
    pub fn resource<T: Resource>(mut self, path: &str, methods: &str) -> Self {
        self.public = self.public.merge(crudl::<T>(path, methods));
        self.mounted.push((T::resource_name(), |r: &DataAccessRegistry| r.contains::<T>()));
        self
    }

    /// Mount CRUD routes for a resource behind the token middleware
    pub fn protected_resource<T: Resource>(mut self, path: &str, methods: &str) -> Self {
        self.protected = self.protected.merge(crudl::<T>(path, methods));
        self.has_protected = true;
        self.mounted.push((T::resource_name(), |r: &DataAccessRegistry| r.contains::<T>()));
        self
    }

    /// Merge routes that do not go through the CRUD handlers
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the router
    ///
    /// Fails when a mounted resource has no registered data access.
    pub fn build(self) -> Result<Router> {
        for (name, registered) in &self.mounted {
            if !registered(&self.registry) {
                return Err(anyhow!(
                    "no data access registered for resource '{}'. Call .with_data_access()",
                    name
                ));
            }
        }

        let guard = SecurityGuard::from_config(&self.config);
        let mut routes = self.public;
        if self.has_protected {
            routes = routes.merge(
                self.protected
                    .route_layer(from_fn_with_state(guard, security_token_middleware)),
            );
        }

        let state = CrudState::new(self.registry, self.config);
        let mut app = routes.with_state(state);
        for custom in self.custom_routes {
            app = app.merge(custom);
        }

        let listeners = Arc::new(self.listeners);
        Ok(app
            .layer(from_fn_with_state(listeners, request_scope))
            .layer(TraceLayer::new_for_http()))
    }

    /// Build the router and serve it until Ctrl+C or SIGTERM
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a `tracing` subscriber reading `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
