//! Shared helpers for integration suites that need embedded PostgreSQL.
//!
//! The cluster is opt-in: suites run against it only when `RUN_PG_EMBEDDED=1`
//! and otherwise print a `SKIP-TEST-CLUSTER` marker and return early. Once
//! opted in, setup failures panic unless `SKIP_TEST_CLUSTER` is truthy, so CI
//! breakage is not masked.

use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use rewear_backend::outbound::persistence::run_migrations_blocking;
use uuid::Uuid;

/// Returns true when the embedded cluster suites were requested.
pub fn cluster_requested() -> bool {
    std::env::var("RUN_PG_EMBEDDED").as_deref() == Ok("1")
}

/// Returns true when `SKIP_TEST_CLUSTER` is set to "1", "true" or "yes".
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Prints a skip marker and returns `None` when skipping is allowed, and
/// panics otherwise.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// Create a fresh, migrated database on the shared cluster and return its URL.
pub fn migrated_database_url() -> Result<String, String> {
    let cluster = shared_cluster_handle().map_err(|err| format!("start cluster: {err:?}"))?;
    let name = format!("rewear_test_{}", Uuid::new_v4().simple());
    cluster
        .create_database(name.as_str())
        .map_err(|err| format!("create database {name}: {err:?}"))?;
    let url = cluster.connection().database_url(&name);
    run_migrations_blocking(&url).map_err(|err| err.to_string())?;
    Ok(url)
}

/// Resolve a migrated database URL, or `None` when the suite should skip.
pub fn database_or_skip() -> Option<String> {
    if !cluster_requested() {
        eprintln!("SKIP-TEST-CLUSTER: set RUN_PG_EMBEDDED=1 to run");
        return None;
    }
    match migrated_database_url() {
        Ok(url) => Some(url),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}
