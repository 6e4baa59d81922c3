use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{mask_key, safe_truncate};

const CONSOLE_BODY_LIMIT: usize = 5000;

fn describe_url(url: &str) -> Vec<(&'static str, String)> {
    match reqwest::Url::parse(url) {
        Ok(parsed_url) => vec![
            ("URL", url.to_string()),
            ("Host", parsed_url.host_str().unwrap_or("unknown").to_string()),
            ("Port", parsed_url.port().map(|p| p.to_string()).unwrap_or_else(||
                if parsed_url.scheme() == "https" { "443 (default)".to_string() } else { "80 (default)".to_string() }
            )),
            ("Scheme", parsed_url.scheme().to_string()),
        ],
        Err(_) => vec![("URL", url.to_string())],
    }
}

fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string())
}

fn print_truncated(text: &str) {
    if text.chars().count() > CONSOLE_BODY_LIMIT {
        println!("{}", safe_truncate(text, CONSOLE_BODY_LIMIT));
        println!("\n{}", format!("... (truncated, total {} bytes)", text.len()).bright_black());
    } else {
        println!("{}", text);
    }
}

/// Log HTTP request details for debugging (console output)
pub fn log_request(url: &str, request: &serde_json::Value, api_key: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_cyan());
    println!("{}", "🔍 HTTP REQUEST DEBUG".bright_cyan().bold());
    println!("{}", "═".repeat(80).bright_cyan());

    for (label, value) in describe_url(url) {
        println!("{}: {}", label.bright_yellow(), value);
    }

    println!("\n{}", "Headers:".bright_yellow());
    println!("  Content-Type: application/json");
    if !api_key.is_empty() {
        println!("  Credential: {}", mask_key(api_key));
    }

    println!("\n{}", "Request Body:".bright_yellow());
    match serde_json::to_string_pretty(request) {
        Ok(json) => print_truncated(&json),
        Err(e) => println!("{}", format!("Error serializing request: {}", e).red()),
    }

    println!("{}", "═".repeat(80).bright_cyan());
    println!();
}

/// Log HTTP response details for debugging (console output)
pub fn log_response(status: &reqwest::StatusCode, body: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_green());
    println!("{}", "📥 HTTP RESPONSE DEBUG".bright_green().bold());
    println!("{}", "═".repeat(80).bright_green());

    println!("{}: {} {}",
        "Status".bright_yellow(),
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );

    println!("\n{}", "Response Body:".bright_yellow());
    print_truncated(&pretty_body(body));

    println!("{}", "═".repeat(80).bright_green());
    println!();
}

/// Log HTTP request to a file under `logs_dir`.
///
/// Returns the timestamp used in the file name so the matching response log
/// can share it.
pub fn log_request_to_file(
    logs_dir: &Path,
    url: &str,
    request: &serde_json::Value,
    model: &str,
    api_key: &str,
) -> Result<u128> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create logs directory {}", logs_dir.display()))?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let model_name = model.replace('/', "-");
    let file_path = logs_dir.join(format!("req-{}-{}.txt", timestamp, model_name));

    let mut log_content = String::new();
    log_content.push_str("HTTP REQUEST LOG\n");
    log_content.push_str("================\n\n");
    log_content.push_str(&format!("Timestamp: {}\n", timestamp));
    log_content.push_str(&format!("Model: {}\n\n", model));

    for (label, value) in describe_url(url) {
        log_content.push_str(&format!("{}: {}\n", label, value));
    }
    log_content.push('\n');

    log_content.push_str("Headers:\n");
    log_content.push_str("  Content-Type: application/json\n");
    if !api_key.is_empty() {
        log_content.push_str(&format!("  Credential: {}\n", mask_key(api_key)));
    }
    log_content.push('\n');

    log_content.push_str("Request Body:\n");
    match serde_json::to_string_pretty(request) {
        Ok(json) => {
            log_content.push_str(&json);
            log_content.push('\n');
        }
        Err(e) => {
            log_content.push_str(&format!("Error serializing request: {}\n", e));
        }
    }

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write request log to {}", file_path.display()))?;

    Ok(timestamp)
}

/// Log HTTP response to a file under `logs_dir`, paired with its request by
/// `request_timestamp`.
pub fn log_response_to_file(
    logs_dir: &Path,
    status: &reqwest::StatusCode,
    body: &str,
    request_timestamp: u128,
    model: &str,
) -> Result<()> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create logs directory {}", logs_dir.display()))?;

    let model_name = model.replace('/', "-");
    let file_path = logs_dir.join(format!("resp-{}-{}.txt", request_timestamp, model_name));

    let mut log_content = String::new();
    log_content.push_str("HTTP RESPONSE LOG\n");
    log_content.push_str("=================\n\n");
    log_content.push_str(&format!("Timestamp: {}\n", request_timestamp));
    log_content.push_str(&format!("Model: {}\n\n", model));
    log_content.push_str(&format!("Status: {} {}\n\n",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    ));

    log_content.push_str("Response Body:\n");
    log_content.push_str(&pretty_body(body));
    log_content.push('\n');

    log_content.push_str("\n---\n");
    log_content.push_str(&format!("Response Size: {} bytes\n", body.len()));

    fs::write(&file_path, log_content)
        .with_context(|| format!("Failed to write response log to {}", file_path.display()))?;

    Ok(())
}
