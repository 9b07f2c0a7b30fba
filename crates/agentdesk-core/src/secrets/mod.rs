//! Secrets resolution — MyVault client, TTL cache and the manager that ties
//! them to the environment fallback.
//!
//! ```text
//! caller ──► SecretsManager ──► SecretCache (project → key → entry)
//!                 │
//!                 ├──────────► SecretStore (VaultClient, HTTP)
//!                 │
//!                 └──────────► SecretFallbacks (environment)
//! ```

pub mod cache;
pub mod manager;
pub mod store;

pub use cache::SecretCache;
pub use manager::SecretsManager;
pub use store::{SecretStore, VaultClient};
