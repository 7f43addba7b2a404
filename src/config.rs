//! Report configuration loaded from environment variables.
//!
//! Credentials are seeds only: once a refresh has succeeded, the token file
//! takes precedence over `EVENTIX_ACCESS_TOKEN`/`EVENTIX_REFRESH_TOKEN`.

use chrono::NaiveDate;
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;

/// Default Eventix/OpenTicket API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.openticket.tech";
/// Default OAuth2 token endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://auth.openticket.tech/tokens";
/// Default Brevo API base URL.
pub const DEFAULT_BREVO_URL: &str = "https://api.brevo.com/v3";
/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Which upstream endpoint supplies the orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointVariant {
    /// `GET /orders` listing with a `created_at` range filter.
    Orders,
    /// `POST /admin/sales/statistics/{company}` with `start`/`end` body fields.
    Statistics,
}

/// How the refresh request body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEncoding {
    Form,
    Json,
}

/// OAuth client and seed credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Seed access token, used when no fresh token is stored
    pub access_token: String,
    /// Seed refresh token, used when the store holds none
    pub refresh_token: String,
}

/// SMTP transport settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Outbound mail settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Sender address
    pub from: String,
    /// Recipient addresses
    pub to: Vec<String>,
    /// Brevo API key; selects the Brevo transport when set
    pub brevo_api_key: Option<String>,
    pub brevo_api_url: String,
    /// SMTP settings; used when no Brevo key is set
    pub smtp: Option<SmtpConfig>,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Eventix API base URL
    pub api_base: String,
    /// OAuth2 token endpoint
    pub auth_url: String,
    /// Tenant identifier sent as the `Company` header
    pub company_guid: String,
    pub credentials: Credentials,
    /// Where refreshed tokens are persisted
    pub token_file: PathBuf,
    pub token_encoding: TokenEncoding,
    pub endpoint: EndpointVariant,
    pub per_page: u32,
    /// Per-request timeout in seconds
    pub http_timeout_secs: u64,
    /// Zone that defines "yesterday"
    pub timezone: Tz,
    /// Explicit report date (re-runs); yesterday when unset
    pub report_date: Option<NaiveDate>,
    pub output_dir: PathBuf,
    pub mail: MailConfig,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            api_base: "http://localhost:1234".to_string(),
            auth_url: "http://localhost:1234/tokens".to_string(),
            company_guid: "test-company".to_string(),
            credentials: Credentials {
                client_id: "test_client_id".to_string(),
                client_secret: "test_secret".to_string(),
                access_token: "seed_access".to_string(),
                refresh_token: "seed_refresh".to_string(),
            },
            token_file: PathBuf::from("eventix_tokens.json"),
            token_encoding: TokenEncoding::Form,
            endpoint: EndpointVariant::Orders,
            per_page: 100,
            http_timeout_secs: 60,
            timezone: chrono_tz::Europe::Amsterdam,
            report_date: None,
            output_dir: PathBuf::from("output"),
            mail: MailConfig {
                from: "report@example.com".to_string(),
                to: vec!["ops@example.com".to_string()],
                brevo_api_key: None,
                brevo_api_url: DEFAULT_BREVO_URL.to_string(),
                smtp: None,
            },
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let endpoint = match env::var("EVENTIX_ENDPOINT")
            .unwrap_or_else(|_| "orders".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "orders" => EndpointVariant::Orders,
            "statistics" => EndpointVariant::Statistics,
            other => {
                return Err(ConfigError::Invalid {
                    name: "EVENTIX_ENDPOINT",
                    value: other.to_string(),
                })
            }
        };

        let token_encoding = match env::var("EVENTIX_TOKEN_ENCODING")
            .unwrap_or_else(|_| "form".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "form" => TokenEncoding::Form,
            "json" => TokenEncoding::Json,
            other => {
                return Err(ConfigError::Invalid {
                    name: "EVENTIX_TOKEN_ENCODING",
                    value: other.to_string(),
                })
            }
        };

        let timezone_name =
            env::var("REPORT_TIMEZONE").unwrap_or_else(|_| "Europe/Amsterdam".to_string());
        let timezone: Tz = timezone_name.parse().map_err(|_| ConfigError::Invalid {
            name: "REPORT_TIMEZONE",
            value: timezone_name.clone(),
        })?;

        let report_date = match env::var("REPORT_DATE") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
                    ConfigError::Invalid {
                        name: "REPORT_DATE",
                        value: raw.clone(),
                    }
                })?,
            ),
            _ => None,
        };

        let per_page = parse_or("EVENTIX_PER_PAGE", 100u32)?;
        if per_page == 0 {
            return Err(ConfigError::Invalid {
                name: "EVENTIX_PER_PAGE",
                value: "0".to_string(),
            });
        }

        let mail_to: Vec<String> = required("MAIL_TO")?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host: host.trim().to_string(),
                port: parse_or("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                user: env::var("SMTP_USER").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
            }),
            _ => None,
        };

        Ok(Self {
            api_base: env::var("EVENTIX_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            auth_url: env::var("EVENTIX_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            company_guid: required("EVENTIX_COMPANY_GUID")?,
            credentials: Credentials {
                client_id: required("EVENTIX_CLIENT_ID")?,
                client_secret: required("EVENTIX_CLIENT_SECRET")?,
                access_token: required("EVENTIX_ACCESS_TOKEN")?,
                refresh_token: required("EVENTIX_REFRESH_TOKEN")?,
            },
            token_file: env::var("EVENTIX_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("eventix_tokens.json")),
            token_encoding,
            endpoint,
            per_page,
            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", 60u64)?,
            timezone,
            report_date,
            output_dir: env::var("REPORT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("output")),
            mail: MailConfig {
                from: required("MAIL_FROM")?,
                to: mail_to,
                brevo_api_key: env::var("BREVO_API_KEY")
                    .ok()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
                brevo_api_url: env::var("BREVO_API_URL")
                    .unwrap_or_else(|_| DEFAULT_BREVO_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                smtp,
            },
        })
    }
}

/// Read a required variable, trimming surrounding whitespace.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
