//! Feynomenon application library
//!
//! Command-line parsing, configuration resolution and the console, HTTP and
//! WebSocket front ends for the tutor.

pub use feynomenon_llm_api as llm_api;
pub use feynomenon_tutor as tutor;
pub use feynomenon_types as types;

pub mod app;
pub mod cli;
pub mod web;

pub use app::{run_check, run_repl_mode, run_web_server, setup_from_cli, AppConfig};
pub use cli::Cli;
