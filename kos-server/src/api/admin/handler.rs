//! Admin API Handlers

use axum::extract::{Query, State};
use shared::models::{DashboardStats, TenantQuery, TenantSummary};
use shared::response::Paginated;
use shared::util::today;

use crate::api::{ApiResult, ok};
use crate::services::{dashboard, tenant};
use crate::state::AppState;

/// GET /api/dashboard
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    ok(dashboard::get_stats(state.pool(), today()).await?)
}

/// GET /api/tenants?search=&level=&page=&limit=
pub async fn list_tenants(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> ApiResult<Paginated<TenantSummary>> {
    ok(tenant::list_tenants(state.pool(), &query).await?)
}
