//! Listing catalogue HTTP handlers.
//!
//! ```text
//! GET    /api/v1/items?category=tops&type=casual&size=M&search=denim&page=1&limit=12
//! GET    /api/v1/items/featured
//! GET    /api/v1/items/mine
//! GET    /api/v1/items/{id}
//! POST   /api/v1/items
//! PUT    /api/v1/items/{id}
//! DELETE /api/v1/items/{id}
//! ```
//!
//! Browsing and item detail are public; everything else needs a session.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::BrowseItemsRequest;
use crate::domain::{
    Error, ItemAttributes, ItemDescription, ItemDraft, ItemId, ItemTitle, PointsValue, Tags,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::ItemResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, parse_id, parse_optional_value, parse_value, require,
};

const ITEM_ID: FieldName = FieldName::new("id");

/// Catalogue filters for `GET /api/v1/items`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BrowseParams {
    /// Category such as `tops` or `outerwear`.
    pub category: Option<String>,
    /// Garment style such as `casual` or `vintage`.
    #[serde(rename = "type")]
    #[param(rename = "type")]
    pub garment_type: Option<String>,
    /// Labelled size such as `M` or `One Size`.
    pub size: Option<String>,
    /// Case-insensitive title/description match or exact tag match.
    pub search: Option<String>,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size, at most 50.
    pub limit: Option<u32>,
}

impl BrowseParams {
    fn into_request(self) -> Result<BrowseItemsRequest, Error> {
        Ok(BrowseItemsRequest {
            category: parse_optional_value(self.category.as_deref(), FieldName::new("category"))?,
            garment_type: parse_optional_value(
                self.garment_type.as_deref(),
                FieldName::new("type"),
            )?,
            size: parse_optional_value(self.size.as_deref(), FieldName::new("size"))?,
            search: self.search,
            page: self.page,
            limit: self.limit,
        })
    }
}

/// One catalogue page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemPageResponse {
    pub items: Vec<ItemResponse>,
    pub total: u64,
    pub current_page: u32,
    pub total_pages: u64,
}

/// Listing content for create and update.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    #[schema(example = "Wool coat")]
    pub title: Option<String>,
    #[schema(example = "Warm charcoal coat, worn one winter.")]
    pub description: Option<String>,
    #[schema(example = "outerwear")]
    pub category: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "casual")]
    pub garment_type: Option<String>,
    #[schema(example = "M")]
    pub size: Option<String>,
    #[schema(example = "like-new")]
    pub condition: Option<String>,
    #[schema(example = 150)]
    pub points_value: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub brand: Option<String>,
    pub colour: Option<String>,
    pub material: Option<String>,
    pub location: Option<String>,
}

impl TryFrom<ItemRequest> for ItemDraft {
    type Error = Error;

    fn try_from(value: ItemRequest) -> Result<Self, Self::Error> {
        let title_field = FieldName::new("title");
        let description_field = FieldName::new("description");
        let category_field = FieldName::new("category");
        let type_field = FieldName::new("type");
        let size_field = FieldName::new("size");
        let condition_field = FieldName::new("condition");
        let points_field = FieldName::new("pointsValue");
        let tags_field = FieldName::new("tags");

        Ok(Self {
            title: ItemTitle::new(require(value.title, title_field)?)
                .map_err(|err| invalid_value_error(title_field, err))?,
            description: ItemDescription::new(require(value.description, description_field)?)
                .map_err(|err| invalid_value_error(description_field, err))?,
            category: parse_value(&require(value.category, category_field)?, category_field)?,
            garment_type: parse_value(&require(value.garment_type, type_field)?, type_field)?,
            size: parse_value(&require(value.size, size_field)?, size_field)?,
            condition: parse_value(&require(value.condition, condition_field)?, condition_field)?,
            points_value: PointsValue::new(require(value.points_value, points_field)?)
                .map_err(|err| invalid_value_error(points_field, err))?,
            tags: Tags::new(&value.tags).map_err(|err| invalid_value_error(tags_field, err))?,
            attributes: ItemAttributes::new(
                value.brand,
                value.colour,
                value.material,
                value.location,
            )
            .map_err(|err| invalid_value_error(FieldName::new("attributes"), err))?,
        })
    }
}

fn item_id(raw: &str) -> Result<ItemId, Error> {
    parse_id(raw, ITEM_ID, ItemId::from_uuid)
}

/// Browse approved, available listings, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(BrowseParams),
    responses(
        (status = 200, description = "Catalogue page", body = ItemPageResponse),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "browseItems",
    security([])
)]
#[get("/items")]
pub async fn browse_items(
    state: web::Data<HttpState>,
    params: web::Query<BrowseParams>,
) -> ApiResult<web::Json<ItemPageResponse>> {
    let request = params.into_inner().into_request()?;
    let page = state.item_query.browse(request).await?;
    Ok(web::Json(ItemPageResponse {
        items: page.items.into_iter().map(ItemResponse::from).collect(),
        total: page.total,
        current_page: page.current_page,
        total_pages: page.total_pages,
    }))
}

/// The newest listings for the landing page.
#[utoipa::path(
    get,
    path = "/api/v1/items/featured",
    responses(
        (status = 200, description = "Featured listings", body = [ItemResponse]),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "featuredItems",
    security([])
)]
#[get("/items/featured")]
pub async fn featured_items(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<ItemResponse>>> {
    let items = state.item_query.featured().await?;
    Ok(web::Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// Every listing owned by the caller, in any status.
#[utoipa::path(
    get,
    path = "/api/v1/items/mine",
    responses(
        (status = 200, description = "Own listings", body = [ItemResponse]),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "myItems"
)]
#[get("/items/mine")]
pub async fn my_items(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ItemResponse>>> {
    let user_id = session.require_user_id()?;
    let items = state.item_query.mine(&user_id).await?;
    Ok(web::Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// A single listing.
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Listing", body = ItemResponse),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "getItem",
    security([])
)]
#[get("/items/{id}")]
pub async fn get_item(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ItemResponse>> {
    let id = item_id(&path)?;
    let item = state.item_query.get(&id).await?;
    Ok(web::Json(ItemResponse::from(item)))
}

/// List a garment; it waits in `pending` until an administrator approves it.
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = ItemRequest,
    responses(
        (status = 201, description = "Listing created", body = ItemResponse),
        (status = 400, description = "Invalid listing", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "createItem"
)]
#[post("/items")]
pub async fn create_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ItemRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let draft = ItemDraft::try_from(payload.into_inner())?;
    let item = state.items.create(&user_id, draft).await?;
    Ok(HttpResponse::Created().json(ItemResponse::from(item)))
}

/// Replace a listing's content.
#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    request_body = ItemRequest,
    responses(
        (status = 200, description = "Listing updated", body = ItemResponse),
        (status = 400, description = "Invalid listing", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema),
        (status = 409, description = "Listing already settled", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "updateItem"
)]
#[put("/items/{id}")]
pub async fn update_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ItemRequest>,
) -> ApiResult<web::Json<ItemResponse>> {
    let user_id = session.require_user_id()?;
    let id = item_id(&path)?;
    let draft = ItemDraft::try_from(payload.into_inner())?;
    let item = state.items.update(&user_id, &id, draft).await?;
    Ok(web::Json(ItemResponse::from(item)))
}

/// Delete a listing together with the swap requests that reference it.
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown item", body = ErrorSchema)
    ),
    tags = ["items"],
    operation_id = "deleteItem"
)]
#[delete("/items/{id}")]
pub async fn delete_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let id = item_id(&path)?;
    state.items.delete(&user_id, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
#[path = "items_tests.rs"]
mod tests;
