//! Backend entry-point: loads settings, prepares storage and serves the REST API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use rewear_backend::inbound::http::health::HealthState;
use rewear_backend::inbound::http::session_config::{
    BuildMode, SessionSettings, session_settings_from_env,
};
use rewear_backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use server::{AppSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        AppSettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let session = load_session_settings(BuildMode::from_debug_assertions())?;
    let bind_addr = settings.bind_addr()?;

    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    )
    .with_login_password(settings.login_password())
    .with_demo_data(settings.seed_demo_data);

    if let Some(database_url) = settings.database_url() {
        config = config.with_db_pool(connect_database(database_url, settings.pool_size()?).await?);
    } else if !settings.seed_demo_data {
        warn!("no database configured; data is lost on restart");
    }

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(server::build_prometheus());

    info!(addr = %config.bind_addr(), "starting server");
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)
        .wrap_err("failed to start server")?
        .await
        .wrap_err("server terminated with an error")
}

/// Read session cookie settings from the process environment.
fn load_session_settings(mode: BuildMode) -> Result<SessionSettings> {
    session_settings_from_env(&DefaultEnv::new(), mode).wrap_err("invalid session configuration")
}

/// Apply migrations and open a verified connection pool.
async fn connect_database(database_url: &str, pool_size: u32) -> Result<DbPool> {
    let applied = run_migrations(database_url)
        .await
        .wrap_err("failed to apply database migrations")?;
    info!(applied, "database schema up to date");

    let pool_config = PoolConfig::new(database_url)
        .with_max_size(pool_size)
        .with_min_idle(Some(pool_size.min(2)));
    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("failed to build database pool")?;
    pool.ping().await.wrap_err("database is unreachable")?;
    Ok(pool)
}
