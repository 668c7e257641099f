use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use loadline_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |field: &str, env_var: &str| {
        field_source(field, env_var, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", "LOADLINE_DATABASE_URL"),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", "LOADLINE_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", "LOADLINE_DATABASE_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "LOADLINE_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "LOADLINE_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", "LOADLINE_SERVER_GRACEFUL_SHUTDOWN_SECS"),
    ));

    lines.push(render_line(
        "auth.api_key",
        &redact_secret(config.auth.api_key.expose_secret()),
        source("auth.api_key", "LOADLINE_API_KEY"),
    ));

    lines.push(render_line(
        "negotiation.acceptance_threshold",
        &config.negotiation.acceptance_threshold.to_string(),
        source(
            "negotiation.acceptance_threshold",
            "LOADLINE_NEGOTIATION_ACCEPTANCE_THRESHOLD",
        ),
    ));
    lines.push(render_line(
        "negotiation.max_rounds",
        &config.negotiation.max_rounds.to_string(),
        source("negotiation.max_rounds", "LOADLINE_NEGOTIATION_MAX_ROUNDS"),
    ));
    lines.push(render_line(
        "negotiation.repository_attempts",
        &config.negotiation.repository_attempts.to_string(),
        source(
            "negotiation.repository_attempts",
            "LOADLINE_NEGOTIATION_REPOSITORY_ATTEMPTS",
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "LOADLINE_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        source("logging.format", "LOADLINE_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn render_line(field: &str, value: &str, source: &'static str) -> String {
    format!("- {field} = {value} (source: {source})")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("loadline.toml"), PathBuf::from("config/loadline.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &str,
    env_var: &str,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> &'static str {
    if env::var(env_var).map(|value| !value.trim().is_empty()).unwrap_or(false) {
        return "env";
    }

    if file_path.is_some() && file_contains_field(field, file_doc) {
        return "file";
    }

    "default"
}

fn file_contains_field(field: &str, file_doc: Option<&Value>) -> bool {
    let Some(mut node) = file_doc else {
        return false;
    };
    for segment in field.split('.') {
        match node.get(segment) {
            Some(next) => node = next,
            None => return false,
        }
    }
    true
}

fn redact_secret(value: &str) -> String {
    if value.is_empty() {
        return "(unset)".to_string();
    }
    let visible: String = value.chars().take(4).collect();
    format!("{visible}… (redacted)")
}
