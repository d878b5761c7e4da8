use serde::Deserialize;
use std::net::SocketAddr;

use domain::models::company::CompanyProfile;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    /// Company profile used for rendering and email templating.
    pub company: CompanyProfile,
    /// Email delivery configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// External PDF renderer configuration.
    #[serde(default)]
    pub pdf: PdfConfig,
    /// Billing engine configuration.
    #[serde(default)]
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether email sending is enabled.
    #[serde(default)]
    pub enabled: bool,

    /// Email provider: `console` (development) or `sendgrid`.
    #[serde(default = "default_email_provider")]
    pub provider: String,

    #[serde(default)]
    pub sendgrid_api_key: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            sendgrid_api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    /// PDF provider: `disabled` (send without attachment) or `http`.
    #[serde(default = "default_pdf_provider")]
    pub provider: String,

    /// Renderer service URL (required for the `http` provider).
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_pdf_timeout")]
    pub timeout_secs: u64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            provider: default_pdf_provider(),
            url: String::new(),
            timeout_secs: default_pdf_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// First invoice number of the series, used until the counter row exists.
    #[serde(default = "default_counter_start")]
    pub counter_start: i64,

    /// UTC hour (0-23) at which the daily recurring-billing run fires.
    #[serde(default = "default_run_hour")]
    pub run_hour_utc: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            counter_start: default_counter_start(),
            run_hour_utc: default_run_hour(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. `config/default.toml`
    /// 2. `config/local.toml` (optional)
    /// 3. Environment variables prefixed `BO__` (e.g. `BO__DATABASE__URL`)
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("BO").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Socket address the server binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .expect("invalid server host/port configuration")
    }

    /// Database configuration in the persistence layer's form.
    pub fn db_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            min_connections: self.database.min_connections,
            connect_timeout_secs: self.database.connect_timeout_secs,
            idle_timeout_secs: self.database.idle_timeout_secs,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_email_provider() -> String {
    "console".to_string()
}

fn default_pdf_provider() -> String {
    "disabled".to_string()
}

fn default_pdf_timeout() -> u64 {
    30
}

fn default_counter_start() -> i64 {
    1
}

fn default_run_hour() -> u32 {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> &'static str {
        r#"
        [server]
        host = "127.0.0.1"
        port = 8081

        [database]
        url = "postgres://localhost/backoffice"

        [logging]
        level = "debug"
        format = "pretty"

        [company]
        name = "Estudio Norte"
        email = "hola@estudionorte.example"
        "#
    }

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_minimal_config_applies_defaults() {
        let cfg = parse(minimal_toml());
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.database.max_connections, 20);
        assert!(!cfg.email.enabled);
        assert_eq!(cfg.email.provider, "console");
        assert_eq!(cfg.pdf.provider, "disabled");
        assert_eq!(cfg.billing.counter_start, 1);
        assert_eq!(cfg.billing.run_hour_utc, 8);
        assert_eq!(cfg.company.vat_default, 21.0);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = parse(minimal_toml());
        assert_eq!(cfg.socket_addr().to_string(), "127.0.0.1:8081");
    }

    #[test]
    fn test_billing_section_overrides() {
        let toml = format!(
            "{}\n[billing]\ncounter_start = 260001\nrun_hour_utc = 6\n",
            minimal_toml()
        );
        let cfg = parse(&toml);
        assert_eq!(cfg.billing.counter_start, 260001);
        assert_eq!(cfg.billing.run_hour_utc, 6);
    }
}
