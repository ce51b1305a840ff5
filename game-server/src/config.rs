use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Optional directory of tier word lists; the built-in corpus is used
    /// when unset.
    pub words_directory: Option<String>,
    pub cleanup_interval_seconds: u64,
    pub presence_interval_seconds: u64,
    pub connection_timeout_seconds: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            words_directory: env::var("WORDS_DIRECTORY").ok(),
            cleanup_interval_seconds: env::var("CLEANUP_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("Invalid CLEANUP_INTERVAL_SECONDS"),
            presence_interval_seconds: env::var("PRESENCE_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .expect("Invalid PRESENCE_INTERVAL_SECONDS"),
            connection_timeout_seconds: env::var("CONNECTION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("Invalid CONNECTION_TIMEOUT_SECONDS"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
