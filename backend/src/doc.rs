//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST endpoint, the response and request shapes
//! from the inbound adapter, the error schema wrappers and the session cookie
//! security scheme. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` prints it for external tooling.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::admin::{ActivityResponse, RoleRequest, StatsResponse, SwapRecordResponse};
use crate::inbound::http::dto::{
    AccountResponse, ItemResponse, ItemSummaryResponse, SwapResponse, UserSummaryResponse,
};
use crate::inbound::http::items::{ItemPageResponse, ItemRequest};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::swaps::CreateSwapRequest;
use crate::inbound::http::users::{LoginRequest, RegisterRequest};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login or POST /api/v1/users.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "ReWear backend API",
        description = "Clothing swap marketplace: listings, moderation, swap requests and points settlement."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::register,
        crate::inbound::http::users::current_user,
        crate::inbound::http::items::browse_items,
        crate::inbound::http::items::featured_items,
        crate::inbound::http::items::my_items,
        crate::inbound::http::items::get_item,
        crate::inbound::http::items::create_item,
        crate::inbound::http::items::update_item,
        crate::inbound::http::items::delete_item,
        crate::inbound::http::swaps::create_swap,
        crate::inbound::http::swaps::list_swaps,
        crate::inbound::http::swaps::get_swap,
        crate::inbound::http::swaps::accept_swap,
        crate::inbound::http::swaps::reject_swap,
        crate::inbound::http::swaps::cancel_swap,
        crate::inbound::http::admin::pending_items,
        crate::inbound::http::admin::approve_item,
        crate::inbound::http::admin::reject_item,
        crate::inbound::http::admin::remove_item,
        crate::inbound::http::admin::stats,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::set_role,
        crate::inbound::http::admin::activity,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        RegisterRequest,
        AccountResponse,
        UserSummaryResponse,
        ItemRequest,
        ItemResponse,
        ItemSummaryResponse,
        ItemPageResponse,
        CreateSwapRequest,
        SwapResponse,
        RoleRequest,
        StatsResponse,
        SwapRecordResponse,
        ActivityResponse,
    )),
    tags(
        (name = "users", description = "Registration, login and the current account"),
        (name = "items", description = "Listing catalogue"),
        (name = "swaps", description = "Swap requests and settlement"),
        (name = "admin", description = "Moderation and platform statistics"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
