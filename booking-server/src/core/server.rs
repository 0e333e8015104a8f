//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::core::{Config, Result, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (tests / embedding)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        // Create application state if not provided
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await,
        };

        // Start background tasks
        let mut tasks = BackgroundTasks::new();
        let reconciler = state.reconciler.clone();
        let shutdown_token = tasks.shutdown_token();
        tasks.spawn(
            "reconciler",
            TaskKind::Periodic,
            reconciler.run(shutdown_token),
        );
        tracing::info!("Background tasks registered: {}", tasks.len());

        let app = crate::api::router(state.clone());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            "Booking server listening on {} (env: {}, tz: {})",
            addr,
            self.config.environment,
            self.config.timezone
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await?;

        // 等待后台任务完成当前工作单元，超时则放弃
        let timeout = std::time::Duration::from_millis(self.config.shutdown_timeout_ms);
        if tokio::time::timeout(timeout, tasks.shutdown()).await.is_err() {
            tracing::warn!("Background tasks did not stop within {:?}", timeout);
        }

        Ok(())
    }
}
