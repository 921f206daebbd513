use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the sourcing service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub groq: GroqConfig,
    pub scraper: ScraperConfig,
    pub sourcing: SourcingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub database: u8,
    pub pool: PoolConfig,
    pub session_ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_size: usize,
    pub timeout_seconds: u64,
    pub create_timeout_seconds: u64,
    pub recycle_timeout_seconds: u64,
}

/// Settings for the hosted language model used by the field extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: i32,
}

/// Settings for the external scraper subprocess
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub scripts_dir: String,
    pub python_cmd: String,
    pub script_name: String,
}

/// Endpoints and headers for the third-party sourcing services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcingConfig {
    pub notify_url: String,
    pub quotations_url: String,
    pub platform: String,
    pub api_version: String,
    pub device_id: String,
    pub location: String,
    pub app_version: String,
    pub language: String,
}

impl Config {
    /// Load configuration from file with environment variable overrides.
    /// ALWAYS returns a valid config - never fails.
    pub fn load() -> Self {
        // Load environment variables from .env files
        let env_paths = ["../.env", ".env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::warn!(
                "No .env file found in any expected location - continuing with env vars only"
            );
        }

        let config_path =
            env::var("SOURCING_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        // Load config from file if it exists
        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to parse config file {}: {} - using defaults",
                            config_path,
                            e
                        );
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::warn!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();

        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(name) = env::var("SOURCING_SERVER_NAME") {
            self.server.name = name;
        }
        if let Ok(bind) = env::var("SOURCING_HTTP_BIND") {
            self.server.bind = bind;
        }

        if let Ok(host) = env::var("REDIS_HOST") {
            self.redis.host = host;
        }
        if let Ok(port) = env::var("REDIS_PORT") {
            if let Ok(port_num) = port.parse() {
                self.redis.port = port_num;
            }
        }
        if let Ok(db) = env::var("REDIS_DB") {
            if let Ok(db_num) = db.parse() {
                self.redis.database = db_num;
            }
        }

        if let Ok(key) = env::var("GROQ_API_KEY") {
            self.groq.api_key = key;
        }
        if let Ok(model) = env::var("GROQ_MODEL") {
            self.groq.model = model;
        }

        if let Ok(dir) = env::var("SCRAPER_SCRIPTS_DIR") {
            self.scraper.scripts_dir = dir;
        }
        if let Ok(cmd) = env::var("PYTHON_CMD") {
            self.scraper.python_cmd = cmd;
        }

        if let Ok(url) = env::var("SOURCING_NOTIFY_URL") {
            self.sourcing.notify_url = url;
        }
        if let Ok(url) = env::var("SOURCING_QUOTATIONS_URL") {
            self.sourcing.quotations_url = url;
        }
    }

    /// Validate configuration values, returning a combined warning string
    fn validate(&self) -> Result<(), String> {
        let mut warnings = Vec::new();

        if self.groq.api_key.is_empty() {
            warnings.push("groq.api_key is empty - extraction calls will fail".to_string());
        }
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            warnings.push(format!(
                "server.bind '{}' is not host:port",
                self.server.bind
            ));
        }
        if self.redis.pool.max_size == 0 {
            warnings.push("redis.pool.max_size is 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.groq.temperature) {
            warnings.push(format!(
                "groq.temperature {} outside expected range",
                self.groq.temperature
            ));
        }

        if warnings.is_empty() {
            Ok(())
        } else {
            Err(warnings.join("; "))
        }
    }

    pub fn get_redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis.host, self.redis.port, self.redis.database
        )
    }

    pub fn get_pool_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.timeout_seconds)
    }

    pub fn get_pool_create_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.create_timeout_seconds)
    }

    pub fn get_pool_recycle_timeout(&self) -> Duration {
        Duration::from_secs(self.redis.pool.recycle_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "sourceit".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                bind: "127.0.0.1:8788".to_string(),
            },
            redis: RedisConfig {
                host: "127.0.0.1".to_string(),
                port: 6379,
                database: 0,
                pool: PoolConfig {
                    max_size: 16,
                    timeout_seconds: 5,
                    create_timeout_seconds: 5,
                    recycle_timeout_seconds: 5,
                },
                session_ttl_seconds: 604800,
            },
            groq: GroqConfig {
                api_key: String::new(),
                model: "llama-3.3-70b-versatile".to_string(),
                temperature: 0.7,
                max_tokens: 1024,
            },
            scraper: ScraperConfig {
                scripts_dir: "scripts".to_string(),
                python_cmd: "python3".to_string(),
                script_name: "scrape_indiamart.py".to_string(),
            },
            sourcing: SourcingConfig {
                notify_url: "https://uat-loan.pice.one/rrr/notify-suppliers".to_string(),
                quotations_url: "https://uat-loan.pice.one/rrr/quotations".to_string(),
                platform: "WEB".to_string(),
                api_version: "2".to_string(),
                device_id: "6E7EVEBBE".to_string(),
                location: "76.4567,78.5678".to_string(),
                app_version: "79".to_string(),
                language: "en".to_string(),
            },
        }
    }
}
