//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the item, account and swap repository ports,
//! backed by PostgreSQL via `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Guards that must hold under concurrency are expressed as
//!   conditional writes, not read-then-write sequences.
//! - **Internal models**: row structs (`models.rs`) and the schema
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: every database failure maps onto the port's
//!   error type.
//!
//! # Example
//!
//! ```ignore
//! use rewear_backend::outbound::persistence::{DbPool, DieselSwapRepository, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/rewear");
//! let pool = DbPool::new(config).await?;
//! let swaps = DieselSwapRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_item_repository;
mod diesel_swap_repository;
mod diesel_user_account_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_item_repository::DieselItemRepository;
pub use diesel_swap_repository::DieselSwapRepository;
pub use diesel_user_account_repository::DieselUserAccountRepository;
pub use migrations::{MigrationError, run_migrations, run_migrations_blocking};
pub use pool::{DbPool, PoolConfig, PoolError};
