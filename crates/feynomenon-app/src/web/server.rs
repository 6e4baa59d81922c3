use anyhow::Result;
use axum::Router;
use colored::Colorize;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use feynomenon_tutor::TutorService;

use crate::web::routes::{self, AppState};

/// Web server configuration
pub struct WebServerConfig {
    pub bind_addr: SocketAddr,
    /// Sweep idle sessions on this period; disabled when `None`.
    pub idle_timeout: Option<Duration>,
}

/// Web server instance
pub struct WebServer {
    config: WebServerConfig,
    tutor: TutorService,
}

impl WebServer {
    pub fn new(config: WebServerConfig, tutor: TutorService) -> Self {
        Self { config, tutor }
    }

    /// Router with CORS applied, ready to serve.
    pub fn router(&self) -> Router {
        let app_state = AppState {
            tutor: self.tutor.clone(),
        };

        // Any origin, like the browser front ends expect
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        routes::create_router(app_state).layer(cors)
    }

    /// Start the web server
    pub async fn start(self) -> Result<()> {
        let app = self.router();

        if let Some(timeout) = self.config.idle_timeout {
            spawn_idle_sweeper(self.tutor.clone(), timeout);
        }

        println!("🌐 Web server starting on http://{}", self.config.bind_addr);
        println!("   Chat endpoint: http://{}/chat", self.config.bind_addr);
        println!("   WebSocket endpoint: ws://{}/ws/{{session_id}}", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Periodically evict sessions the idle policy rejects.
fn spawn_idle_sweeper(tutor: TutorService, timeout: Duration) {
    let period = (timeout / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            for session_id in tutor.sweep_idle().await {
                println!("{} Session {} evicted after being idle", "🧹".bright_yellow(), session_id);
            }
        }
    });
}
