use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub data: DataConfig,
    pub crawler: CrawlerConfig,
    pub model: ModelConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub debug: bool,
    pub secret_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Log every SQL statement at info level.
    pub echo: bool,
    pub pool_size: u32,
    pub pool_recycle_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Spreadsheet imported at startup and by `POST /api/reload`.
    pub file_path: String,
}

/// Declared for deployment compatibility; nothing in the service crawls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    pub interval_secs: u64,
    pub max_concurrent: u32,
    pub timeout_secs: u64,
}

/// Declared for deployment compatibility; sentiment is never inferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub timeout_secs: u64,
    pub max_request_size: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            app: AppConfig {
                name: env::var("APP_NAME").unwrap_or(defaults.app.name),
                debug: env_flag("DEBUG"),
                secret_key: env::var("SECRET_KEY").unwrap_or(defaults.app.secret_key),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                echo: env_flag("SQLALCHEMY_ECHO") || env_flag("DATABASE_ECHO"),
                pool_size: env_parse("DATABASE_POOL_SIZE", defaults.database.pool_size),
                pool_recycle_secs: env_parse(
                    "DATABASE_POOL_RECYCLE",
                    defaults.database.pool_recycle_secs,
                ),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env_parse("SERVER_PORT", defaults.server.port),
            },
            data: DataConfig {
                file_path: env::var("DATA_FILE_PATH").unwrap_or(defaults.data.file_path),
            },
            crawler: CrawlerConfig {
                interval_secs: env_parse("CRAWLER_INTERVAL", defaults.crawler.interval_secs),
                max_concurrent: env_parse(
                    "MAX_CONCURRENT_CRAWLERS",
                    defaults.crawler.max_concurrent,
                ),
                timeout_secs: defaults.crawler.timeout_secs,
            },
            model: ModelConfig {
                name: env::var("SENTIMENT_MODEL_NAME").unwrap_or(defaults.model.name),
                path: env::var("MODEL_PATH").unwrap_or(defaults.model.path),
            },
            api: ApiConfig {
                timeout_secs: env_parse("API_TIMEOUT", defaults.api.timeout_secs),
                max_request_size: env_parse("MAX_REQUEST_SIZE", defaults.api.max_request_size),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig {
                name: "Weibo Sentiment Analysis System".to_string(),
                debug: false,
                secret_key: "secret-key-change-in-production".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite:weibo_sentiment.db".to_string(),
                echo: false,
                pool_size: 10,
                pool_recycle_secs: 3600,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            data: DataConfig {
                file_path: "data/comments.xlsx".to_string(),
            },
            crawler: CrawlerConfig {
                interval_secs: 3600,
                max_concurrent: 3,
                timeout_secs: 30,
            },
            model: ModelConfig {
                name: "bert-base-chinese".to_string(),
                path: "./models/sentiment_model".to_string(),
            },
            api: ApiConfig {
                timeout_secs: 30,
                max_request_size: 10_485_760,
            },
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_address(), "0.0.0.0:8000");
        assert_eq!(config.database.pool_size, 10);
        assert_eq!(config.api.max_request_size, 10 * 1024 * 1024);
        assert!(!config.app.debug);
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("WEIBO_SENTIMENT_TEST_PORT", "not-a-port");
        assert_eq!(env_parse("WEIBO_SENTIMENT_TEST_PORT", 8000u16), 8000);
        std::env::set_var("WEIBO_SENTIMENT_TEST_PORT", " 9000 ");
        assert_eq!(env_parse("WEIBO_SENTIMENT_TEST_PORT", 8000u16), 9000);
        std::env::remove_var("WEIBO_SENTIMENT_TEST_PORT");
    }

    #[test]
    fn test_env_flag_is_case_insensitive() {
        std::env::set_var("WEIBO_SENTIMENT_TEST_FLAG", "TRUE");
        assert!(env_flag("WEIBO_SENTIMENT_TEST_FLAG"));
        std::env::set_var("WEIBO_SENTIMENT_TEST_FLAG", "yes");
        assert!(!env_flag("WEIBO_SENTIMENT_TEST_FLAG"));
        std::env::remove_var("WEIBO_SENTIMENT_TEST_FLAG");
        assert!(!env_flag("WEIBO_SENTIMENT_TEST_FLAG"));
    }
}
