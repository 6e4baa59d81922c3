use anyhow::Result;
use colored::Colorize;
use std::net::SocketAddr;
use std::sync::Arc;

use feynomenon_llm_api::LlmClient;
use feynomenon_tutor::{EvictAfter, TutorService};

use crate::app::setup::AppConfig;
use crate::cli::Cli;
use crate::web::server::{WebServer, WebServerConfig};

/// Run the web server
pub async fn run_web_server(cli: &Cli, config: &AppConfig, client: Arc<dyn LlmClient>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", cli.web_bind, cli.web_port).parse()?;

    println!("{} Starting Feynomenon web server...", "🌐".bright_cyan());
    println!("   Address: {}", addr);
    println!("   Model: {} ({})", client.model(), config.client_settings.backend);
    if let Some(dir) = &config.transcripts_dir {
        println!("   Transcripts: {}", dir.display());
    }

    let mut tutor = TutorService::new(client).with_transcripts(config.transcripts_dir.clone());
    if let Some(timeout) = config.idle_timeout {
        println!("   Idle timeout: {}s", timeout.as_secs());
        tutor = tutor.with_idle_policy(Arc::new(EvictAfter(timeout)));
    }

    let server = WebServer::new(
        WebServerConfig {
            bind_addr: addr,
            idle_timeout: config.idle_timeout,
        },
        tutor,
    );
    server.start().await
}
