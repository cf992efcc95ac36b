//! Swap lifecycle HTTP handlers.
//!
//! ```text
//! POST /api/v1/swaps {"itemRequestedId":"…","swapType":"points","pointsOffered":150}
//! GET  /api/v1/swaps?role=owner
//! GET  /api/v1/swaps/{id}
//! PUT  /api/v1/swaps/{id}/accept
//! PUT  /api/v1/swaps/{id}/reject
//! PUT  /api/v1/swaps/{id}/cancel
//! ```
//!
//! Every route needs a session. Failures carry `details.code` naming the swap
//! condition, for example `insufficient_balance` or `invalid_state`.

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::NewSwapRequest;
use crate::domain::{Error, ItemId, SwapId, SwapRole, SwapType, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::SwapResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_id, parse_optional_value, parse_value, require,
};

const SWAP_ID: FieldName = FieldName::new("id");
const ITEM_REQUESTED_ID: FieldName = FieldName::new("itemRequestedId");
const ITEM_OFFERED_ID: FieldName = FieldName::new("itemOfferedId");
const SWAP_TYPE: FieldName = FieldName::new("swapType");
const ROLE: FieldName = FieldName::new("role");

/// Request body for `POST /api/v1/swaps`.
///
/// Direct swaps name `itemOfferedId`; points swaps name `pointsOffered`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapRequest {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub item_requested_id: Option<String>,
    #[schema(example = "points")]
    pub swap_type: Option<String>,
    pub item_offered_id: Option<String>,
    #[schema(example = 150)]
    pub points_offered: Option<u32>,
    #[schema(example = "Would love this for the winter")]
    pub message: Option<String>,
}

impl CreateSwapRequest {
    fn into_command(self, requester_id: UserId) -> Result<NewSwapRequest, Error> {
        let item_requested_id = parse_id(
            &require(self.item_requested_id, ITEM_REQUESTED_ID)?,
            ITEM_REQUESTED_ID,
            ItemId::from_uuid,
        )?;
        let swap_type: SwapType = parse_value(&require(self.swap_type, SWAP_TYPE)?, SWAP_TYPE)?;
        let item_offered_id = self
            .item_offered_id
            .map(|raw| parse_id(&raw, ITEM_OFFERED_ID, ItemId::from_uuid))
            .transpose()?;
        Ok(NewSwapRequest {
            requester_id,
            item_requested_id,
            swap_type,
            item_offered_id,
            points_offered: self.points_offered,
            message: self.message,
        })
    }
}

/// Filter for `GET /api/v1/swaps`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SwapListParams {
    /// `requester` (default) for swaps you asked for, `owner` for swaps on
    /// your items.
    pub role: Option<String>,
}

fn swap_id(raw: &str) -> Result<SwapId, Error> {
    parse_id(raw, SWAP_ID, SwapId::from_uuid)
}

/// Request an item in exchange for one of your own or for points.
#[utoipa::path(
    post,
    path = "/api/v1/swaps",
    request_body = CreateSwapRequest,
    responses(
        (status = 201, description = "Swap requested", body = SwapResponse),
        (status = 400, description = "Invalid offer", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema),
        (status = 409, description = "Item unavailable or duplicate request", body = ErrorSchema)
    ),
    tags = ["swaps"],
    operation_id = "createSwap"
)]
#[post("/swaps")]
pub async fn create_swap(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateSwapRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let command = payload.into_inner().into_command(user_id)?;
    let swap = state.swaps.create(command).await?;
    Ok(HttpResponse::Created().json(SwapResponse::from(swap)))
}

/// Swaps you requested, or swaps targeting your items.
#[utoipa::path(
    get,
    path = "/api/v1/swaps",
    params(SwapListParams),
    responses(
        (status = 200, description = "Swaps, newest first", body = [SwapResponse]),
        (status = 400, description = "Unknown role", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["swaps"],
    operation_id = "listSwaps"
)]
#[get("/swaps")]
pub async fn list_swaps(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<SwapListParams>,
) -> ApiResult<web::Json<Vec<SwapResponse>>> {
    let user_id = session.require_user_id()?;
    let role: SwapRole = parse_optional_value(params.role.as_deref(), ROLE)?.unwrap_or_default();
    let swaps = state.swap_query.list(&user_id, role).await?;
    Ok(web::Json(swaps.into_iter().map(SwapResponse::from).collect()))
}

/// One swap, visible to its requester and the requested item's owner.
#[utoipa::path(
    get,
    path = "/api/v1/swaps/{id}",
    params(("id" = String, Path, description = "Swap identifier")),
    responses(
        (status = 200, description = "Swap", body = SwapResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not a participant", body = ErrorSchema),
        (status = 404, description = "Unknown swap", body = ErrorSchema)
    ),
    tags = ["swaps"],
    operation_id = "getSwap"
)]
#[get("/swaps/{id}")]
pub async fn get_swap(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<SwapResponse>> {
    let user_id = session.require_user_id()?;
    let id = swap_id(&path)?;
    let swap = state.swap_query.get(&user_id, &id).await?;
    Ok(web::Json(SwapResponse::from(swap)))
}

/// Accept a pending swap on your item and settle it.
///
/// Settlement marks the items swapped, moves points for points swaps and
/// rejects competing pending requests, all or nothing.
#[utoipa::path(
    put,
    path = "/api/v1/swaps/{id}/accept",
    params(("id" = String, Path, description = "Swap identifier")),
    responses(
        (status = 200, description = "Swap accepted", body = SwapResponse),
        (status = 400, description = "Requester can no longer pay", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the item owner", body = ErrorSchema),
        (status = 404, description = "Unknown swap", body = ErrorSchema),
        (status = 409, description = "Swap no longer pending or item taken", body = ErrorSchema),
        (status = 503, description = "Store unavailable, retry", body = ErrorSchema)
    ),
    tags = ["swaps"],
    operation_id = "acceptSwap"
)]
#[put("/swaps/{id}/accept")]
pub async fn accept_swap(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<SwapResponse>> {
    let user_id = session.require_user_id()?;
    let id = swap_id(&path)?;
    let swap = state.swaps.accept(&user_id, &id).await?;
    Ok(web::Json(SwapResponse::from(swap)))
}

/// Reject a pending swap on your item.
#[utoipa::path(
    put,
    path = "/api/v1/swaps/{id}/reject",
    params(("id" = String, Path, description = "Swap identifier")),
    responses(
        (status = 200, description = "Swap rejected", body = SwapResponse),
        (status = 403, description = "Not the item owner", body = ErrorSchema),
        (status = 404, description = "Unknown swap", body = ErrorSchema),
        (status = 409, description = "Swap no longer pending", body = ErrorSchema)
    ),
    tags = ["swaps"],
    operation_id = "rejectSwap"
)]
#[put("/swaps/{id}/reject")]
pub async fn reject_swap(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<SwapResponse>> {
    let user_id = session.require_user_id()?;
    let id = swap_id(&path)?;
    let swap = state.swaps.reject(&user_id, &id).await?;
    Ok(web::Json(SwapResponse::from(swap)))
}

/// Withdraw your own pending swap.
#[utoipa::path(
    put,
    path = "/api/v1/swaps/{id}/cancel",
    params(("id" = String, Path, description = "Swap identifier")),
    responses(
        (status = 200, description = "Swap cancelled", body = SwapResponse),
        (status = 403, description = "Not the requester", body = ErrorSchema),
        (status = 404, description = "Unknown swap", body = ErrorSchema),
        (status = 409, description = "Swap no longer pending", body = ErrorSchema)
    ),
    tags = ["swaps"],
    operation_id = "cancelSwap"
)]
#[put("/swaps/{id}/cancel")]
pub async fn cancel_swap(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<SwapResponse>> {
    let user_id = session.require_user_id()?;
    let id = swap_id(&path)?;
    let swap = state.swaps.cancel(&user_id, &id).await?;
    Ok(web::Json(SwapResponse::from(swap)))
}

#[cfg(test)]
#[path = "swaps_tests.rs"]
mod tests;
