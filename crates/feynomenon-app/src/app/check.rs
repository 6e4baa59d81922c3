use anyhow::Result;
use colored::Colorize;
use std::env;
use std::sync::Arc;

use feynomenon_llm_api::{ChatMessage, LlmClient};
use feynomenon_logging::safe_truncate;

use crate::app::setup::AppConfig;

/// Verify the credential and the model connection with a single request.
pub async fn run_check(config: &AppConfig, client: Arc<dyn LlmClient>) -> Result<()> {
    let settings = &config.client_settings;
    println!("{} Feynomenon setup check", "🔧".bright_cyan());
    println!("   Backend: {}", settings.backend);
    println!("   Model:   {}", client.model());

    let key = settings.api_key.clone().or_else(|| {
        settings
            .backend
            .key_env_var()
            .and_then(|var| env::var(var).ok())
    });
    match &key {
        Some(key) => println!("{} API key present ({} characters)", "✅".green(), key.chars().count()),
        None => println!("{} No API key configured", "ℹ️".bright_blue()),
    }

    match client.chat_completion(&[ChatMessage::user("Hello")]).await {
        Ok(reply) => {
            println!("{} Model connection works", "✅".green());
            println!("   Response: {}", safe_truncate(&reply, 53));
            Ok(())
        }
        Err(e) => {
            eprintln!("{} Model call failed: {}", "❌".bright_red(), e);
            std::process::exit(1);
        }
    }
}
