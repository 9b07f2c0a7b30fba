//! Per-project TTL cache for vault secrets.
//!
//! Two-level map `project -> key -> entry`. An entry is served only while
//! `now - fetched_at < ttl`; an expired entry is replaced by the next
//! write-through, never merged. Timestamps use `tokio::time::Instant` so the
//! clock can be paused in tests.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// Process-wide secret cache. Each operation takes the lock once, so a reader
/// never observes a half-written entry.
pub struct SecretCache {
    ttl: Duration,
    projects: RwLock<HashMap<String, HashMap<String, CacheEntry>>>,
}

impl SecretCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            projects: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `(project, key)`, if any.
    pub fn get(&self, project: &str, key: &str) -> Option<String> {
        let now = Instant::now();
        self.projects
            .read()
            .ok()?
            .get(project)?
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl, now))
            .map(|entry| entry.value.clone())
    }

    /// Write-through insert stamped with the current time.
    pub fn insert(&self, project: &str, key: &str, value: String) {
        let entry = CacheEntry {
            value,
            fetched_at: Instant::now(),
        };
        if let Ok(mut projects) = self.projects.write() {
            projects
                .entry(project.to_string())
                .or_default()
                .insert(key.to_string(), entry);
        }
    }

    /// Insert a whole batch for one project under a single lock.
    pub fn insert_all<'a>(
        &self,
        project: &str,
        values: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) {
        let now = Instant::now();
        if let Ok(mut projects) = self.projects.write() {
            let submap = projects.entry(project.to_string()).or_default();
            for (key, value) in values {
                submap.insert(
                    key.clone(),
                    CacheEntry {
                        value: value.clone(),
                        fetched_at: now,
                    },
                );
            }
        }
    }

    /// Drop one project's entries, or everything when `project` is `None`.
    pub fn clear(&self, project: Option<&str>) {
        if let Ok(mut projects) = self.projects.write() {
            match project {
                Some(project) => {
                    projects.remove(project);
                }
                None => projects.clear(),
            }
        }
    }

    pub fn project_count(&self) -> usize {
        self.projects.read().map(|p| p.len()).unwrap_or(0)
    }
}
