use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Read timeout for the whole request in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Maximum number of retry attempts for failed requests
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial retry delay in milliseconds
    #[serde(default = "default_initial_retry_delay")]
    pub initial_retry_delay_ms: u64,

    /// Maximum retry delay in milliseconds
    #[serde(default = "default_max_retry_delay")]
    pub max_retry_delay_ms: u64,

    /// Enable the shared cookie jar
    #[serde(default = "default_true")]
    pub enable_cookies: bool,

    /// Enable gzip/brotli compression
    #[serde(default = "default_true")]
    pub enable_compression: bool,
}

fn default_true() -> bool {
    true
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_read_timeout() -> u64 {
    30
}
fn default_max_retries() -> usize {
    4
}
fn default_initial_retry_delay() -> u64 {
    500
}
fn default_max_retry_delay() -> u64 {
    8000
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
            max_retries: 4,
            initial_retry_delay_ms: 500,
            max_retry_delay_ms: 8000,
            enable_cookies: true,
            enable_compression: true,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                if let Ok(cfg) = toml::from_str::<Config>(&content) {
                    return cfg;
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_split_connect_and_read_timeouts() {
        let cfg = HttpConfig::default();
        assert_eq!(cfg.connect_timeout_secs, 10);
        assert_eq!(cfg.read_timeout_secs, 30);
        assert!(cfg.enable_cookies);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [http]
            max_retries = 1
            enable_compression = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.http.max_retries, 1);
        assert!(!cfg.http.enable_compression);
        assert_eq!(cfg.http.connect_timeout_secs, 10);
        assert_eq!(cfg.http.read_timeout_secs, 30);
    }

    #[test]
    fn empty_toml_is_the_default_config() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.http.max_retries, HttpConfig::default().max_retries);
    }
}
