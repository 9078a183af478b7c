//! HTTP client for the kos-server REST API

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::{ApiResponse, ErrorCode};
use shared::models::{
    Booking, BookingCreate, BookingDetail, DashboardStats, ExtendBookingRequest, LoginRequest,
    LoginResponse, Payment, PaymentCreate, PaymentSummary, ProfileResponse, RefreshRequest,
    RegisterRequest, ReminderDetail, RoomListing, RoomStatus, RoomStatusUpdate, UserInfo,
};

use crate::{ClientConfig, ClientError, ClientResult};

/// HTTP client for kos-server
#[derive(Debug, Clone)]
pub struct KosClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    refresh_token: Option<String>,
}

impl KosClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            refresh_token: None,
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.request(Method::GET, path).send().await?;
        Self::into_data(Self::handle_response(response).await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        Self::into_data(Self::handle_response(response).await?)
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        Self::into_data(Self::handle_response(response).await?)
    }

    /// Make a request without body
    pub async fn send_empty<T: DeserializeOwned>(&self, method: Method, path: &str) -> ClientResult<T> {
        let response = self.request(method, path).send().await?;
        Self::into_data(Self::handle_response(response).await?)
    }

    /// Decode the envelope; non-2xx answers become [`ClientError`]s
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> ClientResult<ApiResponse<T>> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let envelope = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text).ok();
            let message = envelope
                .as_ref()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| text.clone());
            if status == StatusCode::UNAUTHORIZED {
                return Err(ClientError::Unauthorized(message));
            }
            let code = envelope
                .and_then(|e| e.code)
                .and_then(|c| ErrorCode::try_from(c).ok())
                .unwrap_or(ErrorCode::Unknown);
            return Err(ClientError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    fn into_data<T>(envelope: ApiResponse<T>) -> ClientResult<T> {
        envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse(format!("Missing data: {}", envelope.message)))
    }

    async fn send_unit(&self, builder: RequestBuilder) -> ClientResult<()> {
        let response = builder.send().await?;
        Self::handle_response::<serde_json::Value>(response).await?;
        Ok(())
    }

    // ========== Auth API ==========

    /// Login and keep the issued tokens for later calls
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let login: LoginResponse = self.post("/api/auth/login", &request).await?;
        self.token = Some(login.access_token.clone());
        self.refresh_token = Some(login.refresh_token.clone());
        Ok(login)
    }

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<UserInfo> {
        self.post("/api/auth/register", request).await
    }

    /// Exchange the stored refresh token for a new access token
    pub async fn refresh(&mut self) -> ClientResult<LoginResponse> {
        let refresh_token = self
            .refresh_token
            .clone()
            .ok_or_else(|| ClientError::Unauthorized("No refresh token".to_string()))?;
        let login: LoginResponse = self
            .post("/api/auth/refresh", &RefreshRequest { refresh_token })
            .await?;
        self.token = Some(login.access_token.clone());
        self.refresh_token = Some(login.refresh_token.clone());
        Ok(login)
    }

    /// Logout
    pub async fn logout(&mut self) -> ClientResult<()> {
        self.send_unit(self.request(Method::POST, "/api/auth/logout")).await?;
        self.token = None;
        self.refresh_token = None;
        Ok(())
    }

    pub async fn profile(&self) -> ClientResult<ProfileResponse> {
        self.get("/api/profile").await
    }

    // ========== Rooms ==========

    pub async fn list_rooms(&self, status: Option<RoomStatus>) -> ClientResult<Vec<RoomListing>> {
        match status {
            Some(status) => self.get(&format!("/api/kamar?status={}", status.as_str())).await,
            None => self.get("/api/kamar").await,
        }
    }

    pub async fn get_room(&self, id: i64) -> ClientResult<RoomListing> {
        self.get(&format!("/api/kamar/{id}")).await
    }

    /// Admin only
    pub async fn update_room_status(&self, id: i64, status: RoomStatus) -> ClientResult<RoomListing> {
        self.put(&format!("/api/kamar/{id}/status"), &RoomStatusUpdate { status })
            .await
    }

    // ========== Bookings ==========

    pub async fn create_booking(&self, request: &BookingCreate) -> ClientResult<Booking> {
        self.post("/api/bookings", request).await
    }

    /// Bookings of the signed-in tenant, with room and payments
    pub async fn my_bookings(&self) -> ClientResult<Vec<BookingDetail>> {
        self.get("/api/bookings").await
    }

    pub async fn get_booking(&self, id: i64) -> ClientResult<BookingDetail> {
        self.get(&format!("/api/bookings/{id}")).await
    }

    pub async fn cancel_booking(&self, id: i64) -> ClientResult<Booking> {
        self.send_empty(Method::POST, &format!("/api/bookings/{id}/cancel"))
            .await
    }

    /// Request an extension; returns the pending extension payment
    pub async fn extend_booking(&self, id: i64, months: i64) -> ClientResult<Payment> {
        self.post(
            &format!("/api/bookings/{id}/extend"),
            &ExtendBookingRequest { months },
        )
        .await
    }

    // ========== Payments ==========

    pub async fn create_payment(&self, booking_id: i64, payment_type: &str) -> ClientResult<Payment> {
        let request = PaymentCreate {
            booking_id,
            payment_type: payment_type.to_string(),
        };
        self.post("/api/payments", &request).await
    }

    pub async fn reminders(&self) -> ClientResult<Vec<ReminderDetail>> {
        self.get("/api/payments/reminders").await
    }

    /// Admin only
    pub async fn list_payments(&self) -> ClientResult<Vec<PaymentSummary>> {
        self.get("/api/payments").await
    }

    /// Admin only
    pub async fn confirm_payment(&self, id: i64) -> ClientResult<Payment> {
        self.send_empty(Method::PUT, &format!("/api/payments/{id}/confirm"))
            .await
    }

    /// Admin only
    pub async fn dashboard(&self) -> ClientResult<DashboardStats> {
        self.get("/api/admin/dashboard").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = KosClient::new(&ClientConfig::new("http://localhost:8080/")).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
        assert!(client.token().is_none());

        let client = client.with_token("abc");
        assert_eq!(client.token(), Some("abc"));
    }

    #[test]
    fn test_missing_data_is_invalid_response() {
        let envelope: ApiResponse<i64> = ApiResponse {
            code: Some(0),
            message: "OK".into(),
            data: None,
            details: None,
        };
        assert!(matches!(
            KosClient::into_data(envelope),
            Err(ClientError::InvalidResponse(_))
        ));
    }
}
