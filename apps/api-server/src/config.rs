//! Application configuration loaded from environment variables.

use std::env;

use studyhall_infra::database::DatabaseConfig;
use studyhall_infra::mail::SmtpConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub smtp: Option<SmtpConfig>,
    pub settings: AppSettings,
}

/// Domain-level deployment settings.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Institutional email domain required at registration.
    pub email_domain: String,
    /// Email of the pre-seeded sentinel deleted-account user.
    pub sentinel_email: String,
    /// Display name used in outgoing email subjects.
    pub site_name: String,
    /// Base URL of the frontend, for links in emails.
    pub base_url: String,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(100),
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database,
            smtp: SmtpConfig::from_env(),
            settings: AppSettings {
                email_domain: env::var("EMAIL_DOMAIN")
                    .unwrap_or_else(|_| "example.edu".to_string()),
                sentinel_email: env::var("SENTINEL_EMAIL")
                    .unwrap_or_else(|_| "deletedaccount".to_string()),
                site_name: env::var("SITE_NAME").unwrap_or_else(|_| "Studyhall".to_string()),
                base_url: env::var("FRONTEND_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            },
        }
    }
}
