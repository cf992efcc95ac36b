//! HTTP inbound adapter exposing the REST API.
//!
//! [`api_routes`] registers every handler relative to the `/api/v1` scope;
//! health probes are mounted separately by the server.

use actix_web::web;

pub mod admin;
pub mod dto;
pub mod error;
pub mod health;
pub mod items;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
pub mod swaps;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

/// Register the API handlers on a scope.
///
/// Literal item paths (`featured`, `mine`) are registered before
/// `/items/{id}` so they are not captured as identifiers.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use rewear_backend::inbound::http::api_routes;
///
/// let app = App::new().service(web::scope("/api/v1").configure(api_routes));
/// ```
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(users::login)
        .service(users::register)
        .service(users::current_user)
        .service(items::browse_items)
        .service(items::featured_items)
        .service(items::my_items)
        .service(items::get_item)
        .service(items::create_item)
        .service(items::update_item)
        .service(items::delete_item)
        .service(swaps::create_swap)
        .service(swaps::list_swaps)
        .service(swaps::get_swap)
        .service(swaps::accept_swap)
        .service(swaps::reject_swap)
        .service(swaps::cancel_swap)
        .service(admin::pending_items)
        .service(admin::approve_item)
        .service(admin::reject_item)
        .service(admin::remove_item)
        .service(admin::stats)
        .service(admin::list_users)
        .service(admin::set_role)
        .service(admin::activity);
}
