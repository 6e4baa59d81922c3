use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;

use feynomenon::{run_check, run_repl_mode, run_web_server, setup_from_cli, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Some(shell) = cli.generate {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "feynomenon", &mut std::io::stdout());
        return Ok(());
    }

    // Configuration problems are fatal before any session starts.
    let app_config = match setup_from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration error:".bright_red().bold(), e);
            std::process::exit(1);
        }
    };
    let client = match app_config.create_client() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration error:".bright_red().bold(), e);
            std::process::exit(1);
        }
    };

    if cli.check {
        return run_check(&app_config, client).await;
    }

    if cli.web {
        return run_web_server(&cli, &app_config, client).await;
    }

    run_repl_mode(&app_config, client).await
}
