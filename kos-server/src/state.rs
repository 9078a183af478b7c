//! Shared application state

use std::sync::Arc;

use crate::auth::{JwtConfig, JwtService, RateLimiter};
use crate::config::Config;
use crate::db::DbService;
use crate::email::{HttpMailer, LogMailer, SharedMailer};
use crate::error::BoxError;
use crate::midtrans::MidtransClient;
use crate::notify::NotificationHub;
use crate::uploads::UploadStore;

const HTTP_CLIENT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DbService,
    pub jwt: JwtService,
    pub rate_limiter: RateLimiter,
    pub notifier: NotificationHub,
    pub mailer: SharedMailer,
    pub uploads: UploadStore,
    /// `None` when no server key is configured
    pub midtrans: Option<MidtransClient>,
    /// Outbound HTTP (Google tokeninfo, email API, Midtrans)
    pub http: reqwest::Client,
}

impl AppState {
    /// Open the database and wire external clients from config
    pub async fn new(config: Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_path).await?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_CLIENT_TIMEOUT_SECS))
            .build()?;

        let mailer: SharedMailer = match &config.email_api_key {
            Some(key) => Arc::new(HttpMailer::new(
                http.clone(),
                config.email_api_url.clone(),
                key.clone(),
                config.email_from.clone(),
            )),
            None => {
                tracing::warn!("EMAIL_API_KEY not set, emails will only be logged");
                Arc::new(LogMailer::new())
            }
        };

        Ok(Self::from_parts(config, db, mailer, http))
    }

    /// Assemble state from already-built parts (tests use an in-memory DB)
    pub fn from_parts(config: Config, db: DbService, mailer: SharedMailer, http: reqwest::Client) -> Self {
        let jwt = JwtService::with_config(JwtConfig::new(&config.jwt_secret, &config.jwt_issuer));
        let midtrans = config
            .midtrans_server_key
            .as_ref()
            .map(|key| MidtransClient::new(http.clone(), key.clone(), config.midtrans_is_production));
        if midtrans.is_none() {
            tracing::info!("MIDTRANS_SERVER_KEY not set, Snap payments disabled");
        }

        Self {
            uploads: UploadStore::new(&config.upload_dir),
            config: Arc::new(config),
            db,
            jwt,
            rate_limiter: RateLimiter::new(),
            notifier: NotificationHub::new(),
            mailer,
            midtrans,
            http,
        }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.db.pool
    }
}
