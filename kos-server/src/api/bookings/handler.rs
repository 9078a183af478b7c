//! Booking API Handlers

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Booking, BookingCreate, BookingDetail, BookingQuery, BookingStats, BookingSummary,
    BookingUpdate, ExtendBookingRequest, Payment, PaymentMethod, PaymentType,
};
use shared::util::today;
use validator::Validate;

use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::services::booking as service;
use crate::state::AppState;
use crate::uploads::MultipartForm;

/// GET /api/bookings - the caller's bookings
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<BookingDetail>> {
    ok(service::list_user_bookings(state.pool(), user.id).await?)
}

/// POST /api/bookings
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<BookingCreate>,
) -> ApiResult<Booking> {
    payload.validate().map_err(AppError::from)?;
    let booking = service::create_booking(state.pool(), &user, &payload, today()).await?;
    ok_with_message("Booking created", booking)
}

#[derive(Serialize)]
pub struct BookingWithPayment {
    pub booking: Booking,
    pub payment: Payment,
}

fn parse_field<T: std::str::FromStr>(form: &MultipartForm, name: &str) -> Result<T, AppError> {
    form.require_field(name)?
        .trim()
        .parse()
        .map_err(|_| AppError::with_message(ErrorCode::InvalidFormat, format!("{name} is invalid")))
}

/// POST /api/bookings/with-proof (multipart)
///
/// Fields: `room_id`, `start_date`, `duration_months`, `payment_type`
/// (`full` | `dp`), optional `method` and `notes`, plus the proof image.
pub async fn create_with_proof(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    multipart: Multipart,
) -> ApiResult<BookingWithPayment> {
    let mut form = MultipartForm::read(multipart).await?;

    let payload = BookingCreate {
        room_id: parse_field(&form, "room_id")?,
        start_date: form.require_field("start_date")?.to_string(),
        duration_months: parse_field(&form, "duration_months")?,
        notes: form.field("notes").map(str::to_string),
    };
    payload.validate().map_err(AppError::from)?;

    let payment_type: PaymentType = form
        .require_field("payment_type")?
        .parse()
        .map_err(|_| AppError::new(ErrorCode::InvalidPaymentType))?;
    let method = match form.field("method") {
        Some(raw) => raw
            .parse::<PaymentMethod>()
            .map_err(|_| AppError::with_message(ErrorCode::InvalidFormat, "method is invalid"))?,
        None => PaymentMethod::Manual,
    };
    let proof = form.take_file()?;

    let (booking, payment) =
        service::create_booking_with_proof(&state, &user, &payload, payment_type, method, &proof, today())
            .await?;
    ok_with_message("Booking created", BookingWithPayment { booking, payment })
}

/// GET /api/bookings/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<BookingDetail> {
    ok(service::get_booking(state.pool(), &user, id).await?)
}

/// POST /api/bookings/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Booking> {
    ok_with_message("Booking cancelled", service::cancel_booking(&state, &user, id).await?)
}

/// POST /api/bookings/{id}/extend
pub async fn extend(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<ExtendBookingRequest>,
) -> ApiResult<Payment> {
    let payment = service::extend_booking(&state, &user, id, payload.months, today()).await?;
    ok_with_message("Extension payment created", payment)
}

/// GET /api/bookings/all?status=&user_id=
pub async fn list_all(
    State(state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> ApiResult<Vec<BookingSummary>> {
    ok(service::list_bookings(state.pool(), query.status, query.user_id).await?)
}

/// GET /api/bookings/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<BookingStats> {
    ok(service::booking_stats(state.pool()).await?)
}

/// PUT /api/bookings/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookingUpdate>,
) -> ApiResult<Booking> {
    ok(service::update_booking(state.pool(), id, &payload).await?)
}
