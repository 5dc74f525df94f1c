//! Cache module for incremental generation
//!
//! Tracks each post's last publication date and output path so that posts
//! the CMS has not republished are not fetched and rendered again.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::config::BlogConfig;

/// Cache directory, relative to the site root
pub const CACHE_DIR: &str = ".cms-blog-cache";

/// Cache file name inside [`CACHE_DIR`]
const CACHE_FILE: &str = "db.json";

/// Represents a cached entry for a generated post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// `last_publication_date` as reported by the CMS
    pub last_publication_date: Option<String>,
    /// Output path relative to public dir
    pub output_path: String,
}

/// Cache database for tracking CMS changes
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    /// Hash of the blog config and generator version (changes trigger full rebuild)
    pub config_hash: u64,
    /// Cached entries keyed by post uid
    pub posts: HashMap<String, CacheEntry>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_DIR).join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            if let Ok(cache) = serde_json::from_str::<CacheDb>(&content) {
                if cache.version == Self::VERSION {
                    return cache;
                }
                tracing::info!("Cache version mismatch, rebuilding cache");
            }
        }
        Self::default()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_dir.join(CACHE_FILE), content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new(config_hash: u64) -> Self {
        Self {
            version: Self::VERSION,
            config_hash,
            posts: HashMap::new(),
        }
    }

    /// Record a generated post
    pub fn insert(&mut self, uid: &str, entry: CacheEntry) {
        self.posts.insert(uid.to_string(), entry);
    }
}

/// A post as currently published in the CMS
#[derive(Debug, Clone)]
pub struct CurrentPost {
    pub uid: String,
    pub last_publication_date: Option<String>,
}

/// Change detection result
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Posts that need (re)generation
    pub changed_posts: Vec<String>,
    /// Posts whose output is still current
    pub unchanged_posts: Vec<String>,
    /// Posts gone from the CMS: (uid, output path)
    pub deleted_posts: Vec<(String, String)>,
    /// Whether everything is regenerated
    pub full_rebuild: bool,
}

impl ChangeSet {
    /// Get summary of changes for logging
    pub fn summary(&self) -> String {
        if self.full_rebuild {
            return format!("full rebuild of {} posts", self.changed_posts.len());
        }

        let mut parts = Vec::new();
        if !self.changed_posts.is_empty() {
            parts.push(format!("{} posts changed", self.changed_posts.len()));
        }
        if !self.unchanged_posts.is_empty() {
            parts.push(format!("{} unchanged", self.unchanged_posts.len()));
        }
        if !self.deleted_posts.is_empty() {
            parts.push(format!("{} posts deleted", self.deleted_posts.len()));
        }

        if parts.is_empty() {
            "no posts".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Calculate a hash for content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Hash of everything besides CMS content that shapes the output
pub fn hash_config(config: &BlogConfig) -> Result<u64> {
    let yaml = serde_yaml::to_string(config)?;
    Ok(hash_content(&format!(
        "{}\n{}",
        env!("CARGO_PKG_VERSION"),
        yaml
    )))
}

/// Detect changes between the CMS and the cached state
pub fn detect_changes(
    cache: &CacheDb,
    config_hash: u64,
    current_posts: &[CurrentPost],
    public_dir: &Path,
    force: bool,
) -> ChangeSet {
    let mut changeset = ChangeSet {
        full_rebuild: force || cache.config_hash != config_hash || cache.posts.is_empty(),
        ..ChangeSet::default()
    };

    for post in current_posts {
        let fresh = !changeset.full_rebuild
            && cache.posts.get(&post.uid).is_some_and(|entry| {
                post.last_publication_date.is_some()
                    && entry.last_publication_date == post.last_publication_date
                    && public_dir.join(&entry.output_path).exists()
            });

        if fresh {
            changeset.unchanged_posts.push(post.uid.clone());
        } else {
            changeset.changed_posts.push(post.uid.clone());
        }
    }

    let current: HashSet<&str> = current_posts.iter().map(|p| p.uid.as_str()).collect();
    let mut deleted: Vec<_> = cache
        .posts
        .iter()
        .filter(|(uid, _)| !current.contains(uid.as_str()))
        .map(|(uid, entry)| (uid.clone(), entry.output_path.clone()))
        .collect();
    deleted.sort();
    changeset.deleted_posts = deleted;

    changeset
}
