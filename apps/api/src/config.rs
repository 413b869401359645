use anyhow::{Context, Result};

const DEFAULT_VERTEX_PROJECT: &str = "aerobic-layout-442814-a3";
const DEFAULT_VERTEX_LOCATION: &str = "global";
const DEFAULT_MODEL_NAME: &str = "gemini-2.5-flash";

/// Application configuration loaded from environment variables.
/// Every Vertex setting has a hardcoded default; only a malformed `PORT` fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub vertex_project: String,
    pub vertex_location: String,
    pub model_name: String,
    /// Static bearer token. When unset the client falls back to Application Default Credentials.
    pub vertex_access_token: Option<String>,
    /// Overrides the Vertex endpoint host (local proxies, tests).
    pub vertex_base_url: Option<String>,
    /// Shared access key checked by the request validator. Unset means the gate is open.
    pub access_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            vertex_project: env_or("CVTAILOR_VERTEX_PROJECT", DEFAULT_VERTEX_PROJECT),
            vertex_location: env_or("CVTAILOR_VERTEX_LOCATION", DEFAULT_VERTEX_LOCATION),
            model_name: env_or("CVTAILOR_MODEL_NAME", DEFAULT_MODEL_NAME),
            vertex_access_token: optional_env("CVTAILOR_VERTEX_ACCESS_TOKEN"),
            vertex_base_url: optional_env("CVTAILOR_VERTEX_BASE_URL"),
            access_key: optional_env("CVTAILOR_ACCESS_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Treats empty values the same as unset ones.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
impl Config {
    /// Fixed configuration for handler and router tests; never reads the environment.
    pub fn for_tests() -> Self {
        Config {
            vertex_project: DEFAULT_VERTEX_PROJECT.to_string(),
            vertex_location: DEFAULT_VERTEX_LOCATION.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            vertex_access_token: None,
            vertex_base_url: None,
            access_key: None,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}
