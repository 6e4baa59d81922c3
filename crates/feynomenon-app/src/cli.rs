use clap::Parser;
use clap_complete::Shell;

/// CLI arguments for feynomenon
#[derive(Parser, Debug)]
#[command(name = "feynomenon")]
#[command(about = "Feynomenon - learn any topic with a Feynman-technique AI tutor")]
#[command(version)]
pub struct Cli {
    /// Backend for the tutor model (gemini, openai, groq, llama)
    /// Can also be set via FEYNOMENON_BACKEND. Default: gemini
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Model name. Also accepts "model@backend" and "model@backend(url)"
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// API URL (required for llama.cpp, e.g. http://localhost:8080)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// API key; falls back to FEYNOMENON_API_KEY, then the backend's own
    /// variable (GEMINI_API_KEY, OPENAI_API_KEY, GROQ_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Sampling temperature (default 0.7)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens per reply (default 1000)
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Serve the HTTP and WebSocket API instead of the console tutor
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub web: bool,

    /// Web server port
    #[arg(long, default_value = "8000", env = "FEYNOMENON_WEB_PORT")]
    pub web_port: u16,

    /// Web server bind address
    #[arg(long, default_value = "127.0.0.1", env = "FEYNOMENON_WEB_BIND")]
    pub web_bind: String,

    /// Evict web sessions idle for this many seconds (default: never)
    #[arg(long, value_name = "SECS", env = "FEYNOMENON_IDLE_TIMEOUT_SECS")]
    pub idle_timeout_secs: Option<u64>,

    /// Write a JSONL transcript of every session
    #[arg(long)]
    pub transcripts: bool,

    /// Write every model request and response to files
    #[arg(long)]
    pub log_requests: bool,

    /// Directory for transcripts and request logs (default: ~/.feynomenon/logs)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<String>,

    /// Verify the API key and model connection, then exit
    #[arg(long)]
    pub check: bool,

    /// Enable verbose debug output (shows HTTP requests and responses)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Generate shell completions
    #[arg(long, value_enum)]
    pub generate: Option<Shell>,
}
