//! Payment API Handlers

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Payment, PaymentCreate, PaymentQuery, PaymentSummary, ReminderDetail, SnapSession};
use shared::util::today;

use crate::api::{ApiResult, ok, ok_with_message};
use crate::auth::CurrentUser;
use crate::midtrans::MidtransNotification;
use crate::services::payment as service;
use crate::state::AppState;
use crate::uploads::MultipartForm;

/// GET /api/payments?status=
pub async fn list(State(state): State<AppState>, Query(query): Query<PaymentQuery>) -> ApiResult<Vec<PaymentSummary>> {
    ok(service::list_payments(state.pool(), query.status).await?)
}

/// POST /api/payments
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PaymentCreate>,
) -> ApiResult<Payment> {
    let payment = service::create_payment_session(state.pool(), &user, &payload, today()).await?;
    ok_with_message("Payment created", payment)
}

/// POST /api/payments/{id}/proof (multipart)
pub async fn upload_proof(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Payment> {
    let file = MultipartForm::read(multipart).await?.take_file()?;
    ok_with_message("Proof uploaded", service::upload_proof(&state, &user, id, &file).await?)
}

/// POST /api/payments/{id}/snap
pub async fn create_snap(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<SnapSession> {
    ok(service::create_snap(&state, &user, id).await?)
}

/// GET /api/payments/reminders
pub async fn list_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Vec<ReminderDetail>> {
    ok(service::list_reminders(state.pool(), user.id).await?)
}

/// PUT /api/payments/{id}/confirm
pub async fn confirm(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Payment> {
    ok_with_message("Payment confirmed", service::confirm_payment(&state, id).await?)
}

/// PUT /api/payments/{id}/reject
pub async fn reject(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Payment> {
    ok_with_message("Payment rejected", service::reject_payment(&state, id).await?)
}

/// POST /api/payments/confirm-cash/{id}
///
/// Body is optional; a multipart body may carry a receipt photo.
pub async fn confirm_cash(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    request: Request,
) -> ApiResult<Payment> {
    let is_multipart = request
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));
    let proof = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::with_message(ErrorCode::InvalidRequest, e.body_text()))?;
        MultipartForm::read(multipart).await?.file
    } else {
        None
    };
    let payment = service::confirm_cash_payment(&state, id, proof.as_ref()).await?;
    ok_with_message("Cash payment confirmed", payment)
}

/// POST /api/payments/notification (Midtrans)
///
/// Raw body so a malformed payload gets a logged 400 instead of a
/// generic rejection.
pub async fn midtrans_notification(State(state): State<AppState>, body: Bytes) -> ApiResult<()> {
    let notification: MidtransNotification = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Unreadable Midtrans notification");
        AppError::with_message(ErrorCode::InvalidFormat, "Invalid notification body")
    })?;
    tracing::info!(
        order_id = %notification.order_id,
        status = %notification.transaction_status,
        "Midtrans notification received"
    );
    service::handle_notification(&state, &notification).await?;
    Ok(Json(ApiResponse::ok()))
}
