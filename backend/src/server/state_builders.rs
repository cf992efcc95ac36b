//! Builders for the HTTP state from the configured storage backend.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use rewear_backend::inbound::http::state::HttpState;
use rewear_backend::outbound::memory::{DemoDataError, InMemoryStore};
use rewear_backend::outbound::persistence::{
    DbPool, DieselItemRepository, DieselSwapRepository, DieselUserAccountRepository,
};

use super::ServerConfig;

fn build_db_state(pool: &DbPool, clock: Arc<dyn Clock>, login_password: &str) -> HttpState {
    HttpState::from_repositories(
        Arc::new(DieselItemRepository::new(pool.clone())),
        Arc::new(DieselUserAccountRepository::new(pool.clone())),
        Arc::new(DieselSwapRepository::new(pool.clone())),
        clock,
        login_password,
    )
}

fn build_memory_state(
    clock: Arc<dyn Clock>,
    login_password: &str,
    seed_demo_data: bool,
) -> Result<HttpState, DemoDataError> {
    let store = Arc::new(InMemoryStore::new());
    if seed_demo_data {
        store.seed_demo_data(clock.utc())?;
    }
    Ok(HttpState::from_repositories(
        store.clone(),
        store.clone(),
        store,
        clock,
        login_password,
    ))
}

/// Build the shared HTTP state.
///
/// PostgreSQL repositories are used when the configuration carries a pool;
/// otherwise every port is served by one [`InMemoryStore`], optionally seeded
/// with demo accounts and listings.
///
/// # Errors
///
/// Returns [`DemoDataError`] when demo seeding fails.
pub fn build_http_state(config: &ServerConfig) -> Result<web::Data<HttpState>, DemoDataError> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let state = match &config.db_pool {
        Some(pool) => {
            info!("serving from PostgreSQL");
            build_db_state(pool, clock, &config.login_password)
        }
        None => {
            info!(
                demo_data = config.seed_demo_data,
                "serving from the in-memory store"
            );
            build_memory_state(clock, &config.login_password, config.seed_demo_data)?
        }
    };
    Ok(web::Data::new(state))
}

#[cfg(test)]
mod tests {
    //! Unit tests for storage selection.

    use super::*;
    use actix_web::cookie::{Key, SameSite};
    use rstest::rstest;
    use rewear_backend::domain::ports::BrowseItemsRequest;

    fn memory_config(seed: bool) -> ServerConfig {
        ServerConfig::new(
            Key::generate(),
            false,
            SameSite::Lax,
            "127.0.0.1:0".parse().expect("socket addr"),
        )
        .with_demo_data(seed)
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    #[actix_web::test]
    async fn memory_state_honours_the_demo_flag(#[case] seed: bool) {
        let state = build_http_state(&memory_config(seed)).expect("state builds");

        let page = state
            .item_query
            .browse(BrowseItemsRequest::default())
            .await
            .expect("browse succeeds");

        assert_eq!(page.total > 0, seed);
    }
}
