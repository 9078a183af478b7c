//! Shared fixtures: in-memory database, log-only mailer, temp upload dir

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use kos_server::auth::{CurrentUser, hash_password};
use kos_server::db::{self, DbService};
use kos_server::email::LogMailer;
use kos_server::uploads::UploadedFile;
use kos_server::{AppState, Config};
use shared::models::{RoomCreate, RoomType, UserRole};
use tempfile::TempDir;

pub const PASSWORD: &str = "rahasia123";

pub struct TestApp {
    pub state: AppState,
    pub mailer: LogMailer,
    /// Keeps the upload dir alive for the test
    _uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Same fixtures over a custom config; the upload dir is always a temp dir
    pub async fn with_config(config: Config) -> Self {
        let uploads = TempDir::new().unwrap();
        let config = Config {
            upload_dir: uploads.path().to_string_lossy().into_owned(),
            ..config
        };
        let db = DbService::in_memory().await.unwrap();
        let mailer = LogMailer::new();
        let state = AppState::from_parts(config, db, Arc::new(mailer.clone()), reqwest::Client::new());
        Self {
            state,
            mailer,
            _uploads: uploads,
        }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.state.pool()
    }

    pub async fn create_user(&self, username: &str, role: UserRole) -> CurrentUser {
        let hash = hash_password(PASSWORD).unwrap();
        let mut tx = self.pool().begin().await.unwrap();
        let id = db::users::create(&mut tx, username, &hash, role).await.unwrap();
        let email = format!("{username}@example.com");
        db::tenants::create(&mut tx, id, Some(username), Some(&email))
            .await
            .unwrap();
        tx.commit().await.unwrap();
        CurrentUser {
            id,
            username: username.to_string(),
            role,
        }
    }

    pub async fn tenant(&self, username: &str) -> CurrentUser {
        self.create_user(username, UserRole::Tenant).await
    }

    pub async fn admin(&self) -> CurrentUser {
        self.create_user("pengelola", UserRole::Admin).await
    }

    pub async fn create_room(&self, name: &str, price: f64) -> i64 {
        db::rooms::create(self.pool(), &room(name, price)).await.unwrap()
    }

    /// Files stored under one upload category
    pub fn stored_files(&self, category: &str) -> usize {
        std::fs::read_dir(self.state.uploads.dir().join(category))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub fn access_token(&self, user: &CurrentUser) -> String {
        self.state
            .jwt
            .generate_access_token(user.id, &user.username, user.role)
            .unwrap()
    }
}

pub fn room(name: &str, price: f64) -> RoomCreate {
    RoomCreate {
        name: name.to_string(),
        room_type: RoomType::Standard,
        price,
        capacity: 1,
        floor: 1,
        size: "3x4".to_string(),
        bedrooms: 1,
        bathrooms: 1,
        facilities: vec!["AC".to_string(), "WiFi".to_string()],
        description: "Kamar nyaman dekat kampus".to_string(),
        image_url: None,
    }
}

/// A 2x2 PNG transfer receipt
pub fn receipt() -> UploadedFile {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::new(2, 2)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    UploadedFile {
        filename: "bukti.png".to_string(),
        data: out.into_inner(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A fixed "today" far enough ahead that start dates are never in the past
pub fn today() -> NaiveDate {
    date(2030, 1, 10)
}

pub fn days_after(day: NaiveDate, n: u64) -> NaiveDate {
    day + Days::new(n)
}
