//! Client against a real kos-server bound on a loopback port

use std::net::SocketAddr;
use std::sync::Arc;

use kos_client::{AppStore, ClientConfig, ClientError, ErrorCode, KosClient, LocalStorage};
use kos_server::auth::hash_password;
use kos_server::db::{self, DbService};
use kos_server::email::LogMailer;
use kos_server::services::room;
use kos_server::{AppState, Config, api};
use shared::models::{
    BookingCreate, BookingStatus, RegisterRequest, RoomCreate, RoomStatus, RoomType, UserRole,
};

struct Server {
    base_url: String,
    state: AppState,
    _uploads: tempfile::TempDir,
}

async fn spawn_server() -> Server {
    let uploads = tempfile::tempdir().unwrap();
    let config = Config {
        upload_dir: uploads.path().to_string_lossy().into_owned(),
        ..Config::default()
    };
    let db = DbService::in_memory().await.unwrap();
    let state = AppState::from_parts(config, db, Arc::new(LogMailer::new()), reqwest::Client::new());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = api::build_app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    Server {
        base_url: format!("http://{addr}"),
        state,
        _uploads: uploads,
    }
}

fn client(server: &Server) -> KosClient {
    KosClient::new(&ClientConfig::new(&server.base_url)).unwrap()
}

async fn create_room(server: &Server, name: &str, price: f64) -> i64 {
    let created = room::create_room(
        server.state.pool(),
        &RoomCreate {
            name: name.to_string(),
            room_type: RoomType::Deluxe,
            price,
            capacity: 1,
            floor: 1,
            size: "3x4m".into(),
            bedrooms: 1,
            bathrooms: 1,
            facilities: vec!["AC".into(), "WiFi".into()],
            description: String::new(),
            image_url: None,
        },
    )
    .await
    .unwrap();
    created.room.id
}

async fn seed_admin(server: &Server) -> KosClient {
    let hash = hash_password("rahasia-admin").unwrap();
    db::users::seed_admin(server.state.pool(), "pengelola", &hash)
        .await
        .unwrap();
    let mut admin = client(server);
    admin.login("pengelola", "rahasia-admin").await.unwrap();
    admin
}

#[tokio::test]
async fn test_booking_flow_and_store_sync() {
    let server = spawn_server().await;
    let room_id = create_room(&server, "B2", 1_500_000.0).await;
    let admin = seed_admin(&server).await;

    let mut tenant = client(&server);
    let user = tenant
        .register(&RegisterRequest {
            username: "sari".into(),
            password: "rahasia123".into(),
            full_name: Some("Sari Lestari".into()),
            email: Some("sari@example.com".into()),
        })
        .await
        .unwrap();
    assert_eq!(user.role, UserRole::Tenant);

    let login = tenant.login("sari", "rahasia123").await.unwrap();
    assert_eq!(tenant.token(), Some(login.access_token.as_str()));

    let booking = tenant
        .create_booking(&BookingCreate {
            room_id,
            start_date: "2099-01-01".into(),
            duration_months: 3,
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(
        tenant.get_room(room_id).await.unwrap().room.status,
        RoomStatus::Reserved
    );

    let payment = tenant.create_payment(booking.id, "full").await.unwrap();
    assert_eq!(payment.amount, 4_500_000.0);
    admin.confirm_payment(payment.id).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = AppStore::from_config(&ClientConfig::new(&server.base_url).with_storage_path(&path)).unwrap();
    store.sync_from_server(&tenant).await.unwrap();
    store.set_current_user(Some(login.user.clone())).unwrap();

    let mine = store.get_bookings_by_user_id(user.id);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].room_name, "B2");
    assert_eq!(mine[0].status, BookingStatus::Confirmed);
    assert_eq!(store.get_total_revenue(), 4_500_000.0);
    assert_eq!(store.get_active_bookings(), 1);
    assert_eq!(store.get_occupied_rooms(), 1);

    // state survives a restart
    let reopened = AppStore::open(LocalStorage::new(&path)).unwrap();
    assert_eq!(reopened.get_all_bookings(), store.get_all_bookings());
    assert_eq!(reopened.current_user().map(|u| u.username), Some("sari".to_string()));
    assert_eq!(reopened.get_room_by_id(room_id).map(|r| r.status), Some(RoomStatus::Occupied));

    let stats = admin.dashboard().await.unwrap();
    assert_eq!(stats.total_rooms, 1);
    assert_eq!(stats.total_revenue, 4_500_000.0);
}

#[tokio::test]
async fn test_error_mapping() {
    let server = spawn_server().await;
    let anonymous = client(&server);

    assert!(matches!(
        anonymous.my_bookings().await,
        Err(ClientError::Unauthorized(_))
    ));

    let err = anonymous.get_room(404).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::RoomNotFound));
    assert!(matches!(err, ClientError::Api { status: 404, .. }));

    let mut tenant = client(&server);
    tenant
        .register(&RegisterRequest {
            username: "bayu".into(),
            password: "rahasia123".into(),
            full_name: None,
            email: None,
        })
        .await
        .unwrap();
    tenant.login("bayu", "rahasia123").await.unwrap();

    let err = tenant.dashboard().await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::AdminRequired));

    tenant.refresh().await.unwrap();
    assert!(tenant.profile().await.is_ok());

    tenant.logout().await.unwrap();
    assert!(tenant.token().is_none());
}

#[tokio::test]
async fn test_sync_without_token_keeps_bookings() {
    let server = spawn_server().await;
    create_room(&server, "C1", 900_000.0).await;
    create_room(&server, "C2", 950_000.0).await;

    let store = AppStore::in_memory();
    store.sync_from_server(&client(&server)).await.unwrap();
    assert_eq!(store.get_all_rooms().len(), 2);
    assert_eq!(store.get_total_bookings(), 0);
}
