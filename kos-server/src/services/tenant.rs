//! Admin tenant directory

use shared::models::{TenantQuery, TenantSummary};
use shared::response::{PageQuery, Paginated};
use sqlx::SqlitePool;

use crate::db;
use crate::error::ServiceResult;

pub async fn list_tenants(pool: &SqlitePool, query: &TenantQuery) -> ServiceResult<Paginated<TenantSummary>> {
    let page = PageQuery {
        page: query.page.unwrap_or(shared::response::DEFAULT_PAGE),
        limit: query.limit.unwrap_or(shared::response::DEFAULT_LIMIT),
    }
    .normalized();
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let (items, total) =
        db::tenants::search(pool, search, query.level, i64::from(page.limit), page.offset()).await?;
    Ok(Paginated::new(items, page, total.max(0) as u64))
}
