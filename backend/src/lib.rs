//! ReWear backend library.
//!
//! The swap lifecycle and points settlement engine lives in [`domain`];
//! [`inbound::http`] exposes it over REST and [`outbound`] persists it in
//! PostgreSQL or in memory.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
