use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the crawler.
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
    pub webdriver: WebDriverConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
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

        Ok(Self {
            environment,
            webdriver: WebDriverConfig::from_env()?,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where the chromedriver endpoint lives and where Chrome drops downloads.
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    pub url: String,
    pub headless: bool,
    pub download_dir: PathBuf,
}

impl WebDriverConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = non_empty_var("WEBDRIVER_URL")
            .unwrap_or_else(|| "http://localhost:9515".to_string());

        let headless = match non_empty_var("BROWSER_HEADLESS") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                var: "BROWSER_HEADLESS",
            })?,
            None => false,
        };

        let cwd =
            env::current_dir().map_err(|source| ConfigError::WorkingDirectory { source })?;
        // Chrome ignores relative download directories.
        let download_dir = match non_empty_var("DOWNLOAD_DIR") {
            Some(dir) => cwd.join(dir),
            None => cwd,
        };

        Ok(Self {
            url,
            headless,
            download_dir,
        })
    }
}

/// Portal address and login. Only the crawl needs these, so they load separately.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub domain_url: String,
    pub reports_url: String,
    pub email: String,
    pub password: Secret,
}

impl PortalConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            domain_url: required_var("PORTAL_DOMAIN_URL", "DOMAIN_URL")?,
            reports_url: required_var("PORTAL_REPORTS_URL", "REPORTS_URL")?,
            email: required_var("PORTAL_EMAIL", "EMAIL")?,
            password: Secret::new(required_var("PORTAL_PASSWORD", "PASS")?),
        })
    }
}

/// String that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { var: &'static str },
    Missing { var: &'static str },
    WorkingDirectory { source: std::io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { var } => {
                write!(f, "{var} must be one of true/false, yes/no, on/off, 1/0")
            }
            ConfigError::Missing { var } => write!(f, "{var} must be set"),
            ConfigError::WorkingDirectory { .. } => {
                write!(f, "unable to resolve the current working directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::WorkingDirectory { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::Missing { .. } => None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required_var(name: &'static str, legacy: &str) -> Result<String, ConfigError> {
    non_empty_var(name)
        .or_else(|| non_empty_var(legacy))
        .ok_or(ConfigError::Missing { var: name })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
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
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "WEBDRIVER_URL",
            "BROWSER_HEADLESS",
            "DOWNLOAD_DIR",
            "PORTAL_DOMAIN_URL",
            "PORTAL_REPORTS_URL",
            "PORTAL_EMAIL",
            "PORTAL_PASSWORD",
            "DOMAIN_URL",
            "REPORTS_URL",
            "EMAIL",
            "PASS",
        ] {
            env::remove_var(var);
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
        assert_eq!(config.webdriver.url, "http://localhost:9515");
        assert!(!config.webdriver.headless);
        assert_eq!(
            config.webdriver.download_dir,
            env::current_dir().expect("cwd")
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn rejects_unparseable_headless_flag() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BROWSER_HEADLESS", "sometimes");
        let error = AppConfig::load().expect_err("flag must be boolean");
        assert!(matches!(
            error,
            ConfigError::InvalidFlag {
                var: "BROWSER_HEADLESS"
            }
        ));
    }

    #[test]
    fn relative_download_dir_is_anchored_to_cwd() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DOWNLOAD_DIR", "downloads");
        env::set_var("BROWSER_HEADLESS", "yes");
        let config = AppConfig::load().expect("config loads");
        assert!(config.webdriver.headless);
        assert!(config.webdriver.download_dir.is_absolute());
        assert!(config.webdriver.download_dir.ends_with("downloads"));
    }

    #[test]
    fn portal_falls_back_to_legacy_names() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DOMAIN_URL", "https://portal.example");
        env::set_var("REPORTS_URL", "https://portal.example/reports");
        env::set_var("PORTAL_EMAIL", "ops@example.com");
        env::set_var("PASS", "hunter2");

        let portal = PortalConfig::load().expect("portal config loads");
        assert_eq!(portal.domain_url, "https://portal.example");
        assert_eq!(portal.reports_url, "https://portal.example/reports");
        assert_eq!(portal.email, "ops@example.com");
        assert_eq!(portal.password.expose(), "hunter2");
        assert!(!format!("{portal:?}").contains("hunter2"));
    }

    #[test]
    fn portal_reports_first_missing_variable() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PORTAL_DOMAIN_URL", "https://portal.example");
        let error = PortalConfig::load().expect_err("reports url missing");
        assert!(matches!(
            error,
            ConfigError::Missing {
                var: "PORTAL_REPORTS_URL"
            }
        ));
    }
}
