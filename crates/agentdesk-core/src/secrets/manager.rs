//! Secrets manager — vault first, environment fallback, TTL cache in between.
//!
//! ```text
//! get_secret(key, project?)
//!   ├─ cache hit (fresh)           → value
//!   ├─ vault fetch ok              → write-through, value
//!   ├─ vault miss / unreachable    → fall through
//!   ├─ fallback configured         → value (never cached)
//!   └─ otherwise                   → SecretError::NotFound
//! ```
//!
//! Fallback values are never cached.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::cache::SecretCache;
use super::store::{SecretStore, VaultClient};
use crate::config::{SecretFallbacks, SecretsConfig, DEFAULT_PROJECT_NAME};
use crate::error::SecretError;

pub struct SecretsManager {
    /// `None` when the vault integration is disabled.
    store: Option<Arc<dyn SecretStore>>,
    cache: SecretCache,
    fallbacks: SecretFallbacks,
    configured_project: Option<String>,
    resolved_project: OnceCell<String>,
}

impl SecretsManager {
    /// Build from configuration. A vault client that cannot be constructed
    /// disables vault mode instead of failing startup.
    pub fn from_config(config: &SecretsConfig) -> Self {
        let store: Option<Arc<dyn SecretStore>> = if config.vault_enabled {
            match VaultClient::new(
                &config.vault_base_url,
                &config.service_name,
                &config.service_token,
            ) {
                Ok(client) => {
                    tracing::info!("[Secrets] MyVault client initialized: {}", client.base_url());
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!("[Secrets] Failed to initialize MyVault client: {}", e);
                    None
                }
            }
        } else {
            tracing::info!("[Secrets] MyVault disabled, using environment fallbacks only");
            None
        };

        Self::with_store(store, config)
    }

    /// Build around an explicit store (or none, for disabled mode).
    pub fn with_store(store: Option<Arc<dyn SecretStore>>, config: &SecretsConfig) -> Self {
        Self {
            store,
            cache: SecretCache::new(config.cache_ttl),
            fallbacks: config.fallbacks.clone(),
            configured_project: config.default_project.clone(),
            resolved_project: OnceCell::new(),
        }
    }

    pub fn vault_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Resolve a secret for `project` (or the default project).
    pub async fn get_secret(
        &self,
        key: &str,
        project: Option<&str>,
    ) -> Result<String, SecretError> {
        if let Some(store) = &self.store {
            let project = self.effective_project(project).await;
            match self.fetch_from_vault(store.as_ref(), &project, key).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!("[Secrets] MyVault retrieval failed for '{}': {}", key, e);
                }
            }
        }

        if let Some(value) = self.fallbacks.get(key) {
            tracing::info!("[Secrets] Secret '{}' retrieved from environment (fallback)", key);
            return Ok(value.to_string());
        }

        Err(SecretError::NotFound {
            key: key.to_string(),
        })
    }

    async fn fetch_from_vault(
        &self,
        store: &dyn SecretStore,
        project: &str,
        key: &str,
    ) -> Result<String, SecretError> {
        if let Some(value) = self.cache.get(project, key) {
            tracing::debug!("[Secrets] Cache hit for '{}' in project '{}'", key, project);
            return Ok(value);
        }

        let value = store.get_secret(project, key).await?;
        self.cache.insert(project, key, value.clone());
        tracing::info!("[Secrets] Secret '{}' retrieved from MyVault (project: {})", key, project);
        Ok(value)
    }

    /// All secrets of a project. Falls back to the environment map when the
    /// vault is disabled or the bulk fetch fails.
    pub async fn get_secrets_for_project(&self, project: Option<&str>) -> BTreeMap<String, String> {
        let Some(store) = &self.store else {
            return self.fallbacks.all();
        };

        let project = self.effective_project(project).await;
        match store.get_secrets(&project).await {
            Ok(secrets) => {
                self.cache.insert_all(&project, &secrets);
                secrets
            }
            Err(e) => {
                tracing::warn!(
                    "[Secrets] Failed to get secrets for '{}' from MyVault, using env vars: {}",
                    project,
                    e
                );
                self.fallbacks.all()
            }
        }
    }

    /// Invalidate one project's cached entries, or the whole cache.
    pub fn clear_cache(&self, project: Option<&str>) {
        self.cache.clear(project);
        match project {
            Some(project) => tracing::info!("[Secrets] Cache cleared for project: {}", project),
            None => tracing::info!("[Secrets] All cache cleared"),
        }
    }

    /// The project used when a caller does not name one: the configured
    /// default, else the vault's default project, else `default_project`.
    /// Only a successful vault lookup is memoised.
    pub async fn default_project(&self) -> String {
        if let Some(project) = &self.configured_project {
            return project.clone();
        }
        let Some(store) = &self.store else {
            return DEFAULT_PROJECT_NAME.to_string();
        };

        let resolved = self
            .resolved_project
            .get_or_try_init(|| store.get_default_project())
            .await;
        match resolved {
            Ok(name) => name.clone(),
            Err(e) => {
                tracing::warn!("[Secrets] Could not resolve default project from MyVault: {}", e);
                DEFAULT_PROJECT_NAME.to_string()
            }
        }
    }

    async fn effective_project(&self, project: Option<&str>) -> String {
        match project.filter(|p| !p.is_empty()) {
            Some(project) => project.to_string(),
            None => self.default_project().await,
        }
    }
}
