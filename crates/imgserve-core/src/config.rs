//! Configuration module
//!
//! Settings come from environment variables (a `.env` file is honored in development).
//! [`Config::from_lookup`] takes any key lookup so tests never touch the process environment.

use std::env;
use std::str::FromStr;

const SERVER_HOST: &str = "0.0.0.0";
const SERVER_PORT: u16 = 8088;
const MAX_BODY_SIZE_MB: usize = 20;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const HTTP_CONCURRENCY_LIMIT: usize = 1024;
const ENGINE_MAX_DIMENSION: u32 = 16_384;
const ENGINE_MAX_ALLOC_MB: u64 = 512;
const DEFAULT_QUALITY: u8 = 80;

/// How Extract treats a region that extends past the source edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractBounds {
    /// Shrink the region to the part that lies inside the source.
    #[default]
    Clip,
    /// Reject any region that is not fully inside the source.
    Strict,
}

impl FromStr for ExtractBounds {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clip" => Ok(ExtractBounds::Clip),
            "strict" => Ok(ExtractBounds::Strict),
            other => Err(anyhow::anyhow!(
                "EXTRACT_BOUNDS must be 'clip' or 'strict', got '{}'",
                other
            )),
        }
    }
}

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_body_size_bytes: usize,
    pub request_timeout_secs: u64,
    pub http_concurrency_limit: usize,
}

/// Image engine settings, applied once when the engine runtime is initialized
#[derive(Clone, Debug)]
pub struct EngineSettings {
    pub max_concurrency: usize,
    pub max_dimension: u32,
    pub max_alloc_bytes: u64,
    pub extract_bounds: ExtractBounds,
    pub default_quality: u8,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_concurrency(),
            max_dimension: ENGINE_MAX_DIMENSION,
            max_alloc_bytes: ENGINE_MAX_ALLOC_MB * 1024 * 1024,
            extract_bounds: ExtractBounds::default(),
            default_quality: DEFAULT_QUALITY,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineSettings,
    pub environment: String,
    pub log_format: String,
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_body_size_mb = parse_or(lookup("MAX_BODY_SIZE_MB"), MAX_BODY_SIZE_MB);
        let max_alloc_mb = parse_or(lookup("ENGINE_MAX_ALLOC_MB"), ENGINE_MAX_ALLOC_MB);
        let max_body_size_bytes = max_body_size_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            anyhow::anyhow!("MAX_BODY_SIZE_MB is too large: {}", max_body_size_mb)
        })?;
        let max_alloc_bytes = max_alloc_mb.checked_mul(1024 * 1024).ok_or_else(|| {
            anyhow::anyhow!("ENGINE_MAX_ALLOC_MB is too large: {}", max_alloc_mb)
        })?;

        let extract_bounds = match lookup("EXTRACT_BOUNDS") {
            Some(value) => value.parse()?,
            None => ExtractBounds::default(),
        };

        let config = Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| SERVER_HOST.to_string()),
                port: parse_or(lookup("SERVER_PORT"), SERVER_PORT),
                cors_origins,
                max_body_size_bytes,
                request_timeout_secs: parse_or(lookup("REQUEST_TIMEOUT_SECS"), REQUEST_TIMEOUT_SECS)
                    .max(1),
                http_concurrency_limit: parse_or(
                    lookup("HTTP_CONCURRENCY_LIMIT"),
                    HTTP_CONCURRENCY_LIMIT,
                )
                .max(1),
            },
            engine: EngineSettings {
                max_concurrency: parse_or(lookup("ENGINE_MAX_CONCURRENCY"), default_concurrency())
                    .max(1),
                max_dimension: parse_or(lookup("ENGINE_MAX_DIMENSION"), ENGINE_MAX_DIMENSION),
                max_alloc_bytes,
                extract_bounds,
                default_quality: parse_or(lookup("DEFAULT_QUALITY"), DEFAULT_QUALITY),
            },
            environment,
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.server.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.server.max_body_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_BODY_SIZE_MB must be greater than 0"));
        }

        if self.engine.max_alloc_bytes == 0 {
            return Err(anyhow::anyhow!("ENGINE_MAX_ALLOC_MB must be greater than 0"));
        }

        if self.engine.max_dimension == 0 {
            return Err(anyhow::anyhow!("ENGINE_MAX_DIMENSION must be greater than 0"));
        }

        if !(1..=100).contains(&self.engine.default_quality) {
            return Err(anyhow::anyhow!(
                "DEFAULT_QUALITY must be between 1 and 100, got {}",
                self.engine.default_quality
            ));
        }

        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            return Err(anyhow::anyhow!(
                "LOG_FORMAT must be 'pretty' or 'json', got '{}'",
                self.log_format
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    // Convenience getters for common fields
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn server_port(&self) -> u16 {
        self.server.port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.server.cors_origins
    }

    pub fn max_body_size_bytes(&self) -> usize {
        self.server.max_body_size_bytes
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.server.request_timeout_secs
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.server.http_concurrency_limit
    }

    pub fn json_logs(&self) -> bool {
        self.log_format == "json"
    }
}
