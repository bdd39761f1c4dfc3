use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = WorkflowConfig::default();
        let site_name = env::var("APP_SITE_NAME").unwrap_or(defaults.site_name);
        let site_url = env::var("APP_SITE_URL").unwrap_or(defaults.site_url);

        let deletion_chunk_size = match env::var("APP_DELETION_CHUNK_SIZE") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidChunkSize)?,
            Err(_) => defaults.deletion_chunk_size,
        };

        let expiry_warning_days = match env::var("APP_EXPIRY_WARNING_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days >= 0)
                .ok_or(ConfigError::InvalidExpiryWindow)?,
            Err(_) => defaults.expiry_warning_days,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            workflow: WorkflowConfig {
                site_name,
                site_url: site_url.trim_end_matches('/').to_string(),
                deletion_chunk_size,
                expiry_warning_days,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs shared by the workflow services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Signature used in volunteer-facing mail.
    pub site_name: String,
    /// Absolute base URL used when linking to roles from mail.
    pub site_url: String,
    /// Items processed per step of an account deletion batch.
    pub deletion_chunk_size: usize,
    /// Days before the advert end date at which a role counts as expiring.
    pub expiry_warning_days: i64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            site_name: "Team London".to_string(),
            site_url: "http://localhost:3000".to_string(),
            deletion_chunk_size: 5,
            expiry_warning_days: 14,
        }
    }
}

impl WorkflowConfig {
    pub fn role_url(&self, role: impl fmt::Display) -> String {
        format!("{}/roles/{}", self.site_url, role)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidChunkSize,
    InvalidExpiryWindow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidChunkSize => {
                write!(f, "APP_DELETION_CHUNK_SIZE must be a positive integer")
            }
            ConfigError::InvalidExpiryWindow => {
                write!(f, "APP_EXPIRY_WARNING_DAYS must be zero or a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidChunkSize
            | ConfigError::InvalidExpiryWindow => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_SITE_NAME",
            "APP_SITE_URL",
            "APP_DELETION_CHUNK_SIZE",
            "APP_EXPIRY_WARNING_DAYS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.workflow, WorkflowConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn workflow_settings_read_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SITE_URL", "https://volunteer.example.org/");
        env::set_var("APP_DELETION_CHUNK_SIZE", "10");
        env::set_var("APP_EXPIRY_WARNING_DAYS", "7");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.workflow.site_url, "https://volunteer.example.org");
        assert_eq!(config.workflow.deletion_chunk_size, 10);
        assert_eq!(config.workflow.expiry_warning_days, 7);
        assert_eq!(
            config.workflow.role_url(42),
            "https://volunteer.example.org/roles/42"
        );
        reset_env();
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_DELETION_CHUNK_SIZE", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidChunkSize)
        ));
        reset_env();
    }
}
