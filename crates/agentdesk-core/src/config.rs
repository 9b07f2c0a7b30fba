//! Process configuration loaded from the environment.
//!
//! `.env` is read first (via `dotenvy`) without overriding variables that are
//! already set. Every option is parsed and validated here, at load time;
//! the rest of the crate only sees typed values.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ConfigError;

/// Secret keys that may be supplied through the environment as a fallback
/// for the vault.
pub const KNOWN_SECRET_KEYS: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GOOGLE_API_KEY",
    "GROQ_API_KEY",
];

/// `${NAME}` placeholders recognised in graph documents, with their defaults.
pub const BASE_URL_PLACEHOLDERS: &[(&str, &str)] = &[
    ("EXPERTAGENT_BASE_URL", "http://localhost:8104/aiagent-api"),
    ("GRAPHAISERVER_BASE_URL", "http://localhost:8105/api"),
    ("JOBQUEUE_BASE_URL", "http://localhost:8101"),
    ("MYSCHEDULER_BASE_URL", "http://localhost:8102"),
    ("MYVAULT_BASE_URL", DEFAULT_VAULT_BASE_URL),
];

pub const DEFAULT_VAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_SERVICE_NAME: &str = "graphaiserver-service";
pub const DEFAULT_PROJECT_NAME: &str = "default_project";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_AGENT_API_BASE: &str = "http://localhost:8104/aiagent-api/v1";
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8106";

/// Fallback values for the known secret keys.
///
/// Lookups by a key outside [`KNOWN_SECRET_KEYS`] always miss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretFallbacks {
    values: BTreeMap<&'static str, String>,
}

impl SecretFallbacks {
    /// Build from any lookup function (the environment, a test map, ...).
    /// Empty values are treated as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let values = KNOWN_SECRET_KEYS
            .iter()
            .filter_map(|key| {
                lookup(key)
                    .filter(|v| !v.is_empty())
                    .map(|v| (*key, v))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Every known key that has a value.
    pub fn all(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Values substituted for `${NAME}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    values: BTreeMap<&'static str, String>,
}

impl BaseUrls {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let values = BASE_URL_PLACEHOLDERS
            .iter()
            .map(|(name, default)| {
                let value = lookup(name)
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| default.to_string());
                (*name, value)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Vault integration and cache settings.
#[derive(Debug, Clone)]
pub struct SecretsConfig {
    pub vault_enabled: bool,
    pub vault_base_url: String,
    pub service_name: String,
    pub service_token: String,
    /// `None` means "ask the vault, then fall back to `default_project`".
    pub default_project: Option<String>,
    pub cache_ttl: Duration,
    pub fallbacks: SecretFallbacks,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            vault_enabled: false,
            vault_base_url: DEFAULT_VAULT_BASE_URL.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_token: String::new(),
            default_project: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            fallbacks: SecretFallbacks::default(),
        }
    }
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Directory holding `<category>/<model>.yml` graph definitions.
    pub model_base_path: String,
    pub admin_token: String,
    pub engine_url: String,
    pub agent_api_base: String,
    pub secrets: SecretsConfig,
    pub base_urls: BaseUrls,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            model_base_path: "./config/graphai/".to_string(),
            admin_token: String::new(),
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            agent_api_base: DEFAULT_AGENT_API_BASE.to_string(),
            secrets: SecretsConfig::default(),
            base_urls: BaseUrls::default(),
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::info!("[Config] Loaded environment from '{}'", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.port,
        };

        let cache_ttl = match var("SECRETS_CACHE_TTL") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    name: "SECRETS_CACHE_TTL",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => defaults.secrets.cache_ttl,
        };

        let vault_base_url =
            var("MYVAULT_BASE_URL").unwrap_or(defaults.secrets.vault_base_url);

        let secrets = SecretsConfig {
            vault_enabled: var("MYVAULT_ENABLED").as_deref() == Some("true"),
            vault_base_url,
            service_name: var("MYVAULT_SERVICE_NAME").unwrap_or(defaults.secrets.service_name),
            service_token: var("MYVAULT_SERVICE_TOKEN").unwrap_or_default(),
            default_project: var("MYVAULT_DEFAULT_PROJECT"),
            cache_ttl,
            fallbacks: SecretFallbacks::from_lookup(&lookup),
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port,
            model_base_path: var("MODEL_BASE_PATH").unwrap_or(defaults.model_base_path),
            admin_token: var("ADMIN_TOKEN").unwrap_or_default(),
            engine_url: var("GRAPHAI_ENGINE_URL").unwrap_or(defaults.engine_url),
            agent_api_base: var("AGENT_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.agent_api_base),
            secrets,
            base_urls: BaseUrls::from_lookup(&lookup),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.port, 8000);
        assert!(!settings.secrets.vault_enabled);
        assert_eq!(settings.secrets.cache_ttl, Duration::from_secs(300));
        assert_eq!(settings.secrets.default_project, None);
        assert_eq!(
            settings.base_urls.get("EXPERTAGENT_BASE_URL"),
            Some("http://localhost:8104/aiagent-api")
        );
    }

    #[test]
    fn test_vault_enabled_only_for_literal_true() {
        let s = Settings::from_lookup(lookup(&[("MYVAULT_ENABLED", "TRUE")])).unwrap();
        assert!(!s.secrets.vault_enabled);
        let s = Settings::from_lookup(lookup(&[("MYVAULT_ENABLED", "true")])).unwrap();
        assert!(s.secrets.vault_enabled);
    }

    #[test]
    fn test_invalid_ttl_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("SECRETS_CACHE_TTL", "five")])).unwrap_err();
        assert!(err.to_string().contains("SECRETS_CACHE_TTL"));
    }

    #[test]
    fn test_fallbacks_only_known_keys() {
        let fallbacks = SecretFallbacks::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-env"),
            ("GROQ_API_KEY", ""),
            ("SOMETHING_ELSE", "x"),
        ]));
        assert_eq!(fallbacks.get("OPENAI_API_KEY"), Some("sk-env"));
        assert_eq!(fallbacks.get("GROQ_API_KEY"), None);
        assert_eq!(fallbacks.get("SOMETHING_ELSE"), None);
        assert_eq!(fallbacks.all().len(), 1);
    }

    #[test]
    fn test_agent_api_base_strips_trailing_slash() {
        let s = Settings::from_lookup(lookup(&[("AGENT_API_BASE", "http://chat:9000/v1/")]))
            .unwrap();
        assert_eq!(s.agent_api_base, "http://chat:9000/v1");
    }

    #[test]
    fn test_base_url_override() {
        let urls = BaseUrls::from_lookup(lookup(&[("JOBQUEUE_BASE_URL", "http://jq:1")]));
        assert_eq!(urls.get("JOBQUEUE_BASE_URL"), Some("http://jq:1"));
        assert_eq!(urls.get("UNKNOWN"), None);
    }
}
