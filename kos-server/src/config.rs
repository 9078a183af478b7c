//! Server configuration (environment variables, `.env` supported)

use crate::error::BoxError;

/// Minimum JWT secret length outside development
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    /// development | staging | production
    pub environment: String,
    pub http_port: u16,
    /// SQLite database file
    pub database_path: String,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// CORS origins
    pub allowed_origins: Vec<String>,
    /// Directory uploaded files are written to and served from
    pub upload_dir: String,
    /// Base URL used in links sent by email (reset password, etc.)
    pub public_base_url: String,
    /// Transactional email HTTP API; emails are only logged when no key is set
    pub email_api_url: String,
    pub email_api_key: Option<String>,
    pub email_from: String,
    pub admin_email: String,
    pub midtrans_server_key: Option<String>,
    pub midtrans_is_production: bool,
    pub google_client_id: Option<String>,
    /// Initial admin account, created when no admin exists
    pub admin_username: String,
    pub admin_password: String,
    /// `json` for JSON log lines
    pub log_format: Option<String>,
    /// Daily rolling log files are written here when set
    pub log_dir: Option<String>,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    pub fn from_env() -> Result<Self, BoxError> {
        let environment = env_or("ENVIRONMENT", "development");

        let jwt_secret = Self::require_secret("JWT_SECRET", &environment)?;
        if environment != "development" && jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(format!(
                "JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} characters in {environment} environment"
            )
            .into());
        }

        let admin_password = Self::require_secret("ADMIN_PASSWORD", &environment)?;

        let http_port = env_or("HTTP_PORT", "8080")
            .parse()
            .map_err(|e| format!("HTTP_PORT is not a valid port: {e}"))?;

        Ok(Self {
            http_port,
            database_path: env_or("DATABASE_PATH", "data/kos.db"),
            jwt_secret,
            jwt_issuer: env_or("JWT_ISSUER", "kos-server"),
            allowed_origins: parse_origins(&env_or("ALLOWED_ORIGINS", "http://localhost:3000")),
            upload_dir: env_or("UPLOAD_DIR", "uploads"),
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:3000"),
            email_api_url: env_or("EMAIL_API_URL", "https://api.brevo.com/v3/smtp/email"),
            email_api_key: env_opt("EMAIL_API_KEY"),
            email_from: env_or("EMAIL_FROM", "noreply@kos.local"),
            admin_email: env_or("ADMIN_EMAIL", "admin@kos.local"),
            midtrans_server_key: env_opt("MIDTRANS_SERVER_KEY"),
            midtrans_is_production: env_or("MIDTRANS_IS_PRODUCTION", "false")
                .eq_ignore_ascii_case("true"),
            google_client_id: env_opt("GOOGLE_CLIENT_ID"),
            admin_username: env_or("ADMIN_USERNAME", "admin"),
            admin_password,
            log_format: env_opt("LOG_FORMAT"),
            log_dir: env_opt("LOG_DIR"),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    /// Development settings (no external services)
    fn default() -> Self {
        Self {
            environment: "development".into(),
            http_port: 8080,
            database_path: "data/kos.db".into(),
            jwt_secret: "dev-JWT_SECRET-not-for-production".into(),
            jwt_issuer: "kos-server".into(),
            allowed_origins: vec!["http://localhost:3000".into()],
            upload_dir: "uploads".into(),
            public_base_url: "http://localhost:3000".into(),
            email_api_url: "https://api.brevo.com/v3/smtp/email".into(),
            email_api_key: None,
            email_from: "noreply@kos.local".into(),
            admin_email: "admin@kos.local".into(),
            midtrans_server_key: None,
            midtrans_is_production: false,
            google_client_id: None,
            admin_username: "admin".into(),
            admin_password: "dev-ADMIN_PASSWORD-not-for-production".into(),
            log_format: None,
            log_dir: None,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a.test/, https://b.test ,,"),
            vec!["http://a.test".to_string(), "https://b.test".to_string()]
        );
    }
}
