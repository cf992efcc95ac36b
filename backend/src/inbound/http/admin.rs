//! Administrator moderation handlers.
//!
//! ```text
//! GET    /api/v1/admin/items/pending
//! PUT    /api/v1/admin/items/{id}/approve
//! PUT    /api/v1/admin/items/{id}/reject
//! DELETE /api/v1/admin/items/{id}
//! GET    /api/v1/admin/stats
//! GET    /api/v1/admin/users
//! PUT    /api/v1/admin/users/{id}/role {"role":"admin"}
//! GET    /api/v1/admin/activity
//! ```
//!
//! The moderation service checks the admin role; these handlers only resolve
//! the session and shape payloads.

use actix_web::{HttpResponse, delete, get, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::PlatformStats;
use crate::domain::{Error, ItemId, Role, SwapRequest, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{AccountResponse, ItemResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_value, require};

const ID: FieldName = FieldName::new("id");
const ROLE: FieldName = FieldName::new("role");

/// Platform counters for the dashboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: u64,
    pub total_items: u64,
    pub pending_items: u64,
    pub approved_items: u64,
    pub total_swaps: u64,
    pub completed_swaps: u64,
    /// Approved share of all items, as a percentage with one decimal.
    #[schema(example = 66.7)]
    pub approval_rate: f64,
    /// Accepted share of all swaps, as a percentage with one decimal.
    #[schema(example = 25.0)]
    pub swap_success_rate: f64,
}

impl From<PlatformStats> for StatsResponse {
    fn from(value: PlatformStats) -> Self {
        Self {
            total_users: value.total_users,
            total_items: value.total_items,
            pending_items: value.pending_items,
            approved_items: value.approved_items,
            total_swaps: value.total_swaps,
            completed_swaps: value.completed_swaps,
            approval_rate: value.approval_rate,
            swap_success_rate: value.swap_success_rate,
        }
    }
}

/// Bare swap record listed in the activity feed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwapRecordResponse {
    pub id: String,
    pub requester_id: String,
    pub item_requested_id: String,
    pub item_offered_id: Option<String>,
    pub swap_type: String,
    pub points_offered: Option<u32>,
    pub status: String,
    pub created_at: String,
}

impl From<SwapRequest> for SwapRecordResponse {
    fn from(value: SwapRequest) -> Self {
        Self {
            id: value.id.to_string(),
            requester_id: value.requester_id.to_string(),
            item_requested_id: value.item_requested_id.to_string(),
            item_offered_id: value.offer.item_offered().map(|id| id.to_string()),
            swap_type: value.offer.swap_type().as_str().to_owned(),
            points_offered: value.offer.points_offered(),
            status: value.status.as_str().to_owned(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// Newest listings, swaps and accounts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub items: Vec<ItemResponse>,
    pub swaps: Vec<SwapRecordResponse>,
    pub users: Vec<AccountResponse>,
}

/// Request body for `PUT /api/v1/admin/users/{id}/role`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RoleRequest {
    #[schema(example = "admin")]
    pub role: Option<String>,
}

fn item_id(raw: &str) -> Result<ItemId, Error> {
    parse_id(raw, ID, ItemId::from_uuid)
}

/// Listings awaiting moderation, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/items/pending",
    responses(
        (status = 200, description = "Pending listings", body = [ItemResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "pendingItems"
)]
#[get("/admin/items/pending")]
pub async fn pending_items(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ItemResponse>>> {
    let actor = session.require_user_id()?;
    let items = state.moderation_query.pending_items(&actor).await?;
    Ok(web::Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// Approve a pending listing so it appears in the catalogue.
#[utoipa::path(
    put,
    path = "/api/v1/admin/items/{id}/approve",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Listing approved", body = ItemResponse),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema),
        (status = 409, description = "Listing is not pending", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "approveItem"
)]
#[put("/admin/items/{id}/approve")]
pub async fn approve_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ItemResponse>> {
    let actor = session.require_user_id()?;
    let id = item_id(&path)?;
    let item = state.moderation.approve_item(&actor, &id).await?;
    Ok(web::Json(ItemResponse::from(item)))
}

/// Reject a pending listing.
#[utoipa::path(
    put,
    path = "/api/v1/admin/items/{id}/reject",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Listing rejected", body = ItemResponse),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema),
        (status = 409, description = "Listing is not pending", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "rejectItem"
)]
#[put("/admin/items/{id}/reject")]
pub async fn reject_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ItemResponse>> {
    let actor = session.require_user_id()?;
    let id = item_id(&path)?;
    let item = state.moderation.reject_item(&actor, &id).await?;
    Ok(web::Json(ItemResponse::from(item)))
}

/// Remove any listing together with the swaps that reference it.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/items/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 204, description = "Listing removed"),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "removeItem"
)]
#[delete("/admin/items/{id}")]
pub async fn remove_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let id = item_id(&path)?;
    state.moderation.remove_item(&actor, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Platform counters.
#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    responses(
        (status = 200, description = "Platform statistics", body = StatsResponse),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "platformStats"
)]
#[get("/admin/stats")]
pub async fn stats(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StatsResponse>> {
    let actor = session.require_user_id()?;
    let stats = state.moderation_query.stats(&actor).await?;
    Ok(web::Json(StatsResponse::from(stats)))
}

/// Every account, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses(
        (status = 200, description = "Accounts", body = [AccountResponse]),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "listUsers"
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<AccountResponse>>> {
    let actor = session.require_user_id()?;
    let users = state.moderation_query.users(&actor).await?;
    Ok(web::Json(users.into_iter().map(AccountResponse::from).collect()))
}

/// Grant or revoke the admin role.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    params(("id" = String, Path, description = "User identifier")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Role updated", body = AccountResponse),
        (status = 400, description = "Unknown role or self-demotion", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "setUserRole"
)]
#[put("/admin/users/{id}/role")]
pub async fn set_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<RoleRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let actor = session.require_user_id()?;
    let user_id = parse_id(&path, ID, UserId::from_uuid)?;
    let role: Role = parse_value(&require(payload.into_inner().role, ROLE)?, ROLE)?;
    let account = state.moderation.set_role(&actor, &user_id, role).await?;
    Ok(web::Json(AccountResponse::from(account)))
}

/// The newest listings, swaps and accounts.
#[utoipa::path(
    get,
    path = "/api/v1/admin/activity",
    responses(
        (status = 200, description = "Recent activity", body = ActivityResponse),
        (status = 403, description = "Admin role required", body = ErrorSchema)
    ),
    tags = ["admin"],
    operation_id = "recentActivity"
)]
#[get("/admin/activity")]
pub async fn activity(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ActivityResponse>> {
    let actor = session.require_user_id()?;
    let activity = state.moderation_query.activity(&actor).await?;
    Ok(web::Json(ActivityResponse {
        items: activity.items.into_iter().map(ItemResponse::from).collect(),
        swaps: activity
            .swaps
            .into_iter()
            .map(SwapRecordResponse::from)
            .collect(),
        users: activity.users.into_iter().map(AccountResponse::from).collect(),
    }))
}

#[cfg(test)]
#[path = "admin_tests.rs"]
mod tests;
