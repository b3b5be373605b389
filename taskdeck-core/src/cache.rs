use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;

/// Identifies one cached server collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    ProjectsPage(u32),
    AllProjects,
    Project(i64),
    ProjectTasks(i64),
}

impl CacheKey {
    pub fn is_project_listing(&self) -> bool {
        matches!(self, CacheKey::ProjectsPage(_) | CacheKey::AllProjects)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::ProjectsPage(page) => write!(f, "projects/page/{}", page),
            CacheKey::AllProjects => write!(f, "projects/all"),
            CacheKey::Project(id) => write!(f, "project/{}", id),
            CacheKey::ProjectTasks(id) => write!(f, "tasks/{}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: Vec<T>,
    pub fetched_at: DateTime<Utc>,
    invalidated: bool,
}

impl<T> CacheEntry<T> {
    pub fn is_stale(&self, now: DateTime<Utc>, stale_after: Duration) -> bool {
        self.invalidated || now - self.fetched_at >= stale_after
    }
}

/// Client-side mirror of server collections, one entry per `CacheKey`.
#[derive(Debug, Clone)]
pub struct QueryCache<T> {
    entries: HashMap<CacheKey, CacheEntry<T>>,
    stale_after: Duration,
}

impl<T: Clone> QueryCache<T> {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stale_after,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&[T]> {
        self.entries.get(key).map(|entry| entry.data.as_slice())
    }

    pub fn entry(&self, key: &CacheKey) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    /// Data for `key` if present and still fresh.
    pub fn fresh(&self, key: &CacheKey) -> Option<&[T]> {
        let now = Utc::now();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_stale(now, self.stale_after))
            .map(|entry| entry.data.as_slice())
    }

    /// Store a server response, resetting the entry's age.
    pub fn insert(&mut self, key: CacheKey, data: Vec<T>) {
        self.entries.insert(
            key,
            CacheEntry {
                data,
                fetched_at: Utc::now(),
                invalidated: false,
            },
        );
    }

    /// Overwrite local data for `key` without touching its freshness.
    pub fn set_local(&mut self, key: CacheKey, data: Vec<T>) {
        match self.entries.get_mut(&key) {
            Some(entry) => entry.data = data,
            None => {
                self.entries.insert(
                    key,
                    CacheEntry {
                        data,
                        fetched_at: Utc::now(),
                        invalidated: false,
                    },
                );
            }
        }
    }

    pub fn is_stale(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .map_or(true, |entry| entry.is_stale(Utc::now(), self.stale_after))
    }

    pub fn invalidate(&mut self, key: &CacheKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.invalidated = true;
        }
    }

    pub fn invalidate_where(&mut self, predicate: impl Fn(&CacheKey) -> bool) {
        for (key, entry) in self.entries.iter_mut() {
            if predicate(key) {
                entry.invalidated = true;
            }
        }
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<Vec<T>> {
        self.entries.remove(key).map(|entry| entry.data)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
