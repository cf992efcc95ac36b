//! Outbound adapters implementing the domain repository ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel and `diesel-async`.
//! - **memory**: a mutex-guarded in-process store for local runs and tests.
//!
//! Adapters translate between domain types and storage representations and
//! enforce settlement guards atomically; business rules stay in the domain.

pub mod memory;
pub mod persistence;
