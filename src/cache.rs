//! Disk-backed memoization of chat parsing, keyed on file content.

use crate::error::{ChatAnalyzerError, Result};
use crate::models::ChatMessage;
use crate::parser::ChatParser;
use crate::record_set::RecordSet;
use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    messages: Vec<ChatMessage>,
    skipped_lines: usize,
    cached_at: DateTime<Utc>,
}

/// Parsed messages of previously seen exports
pub struct ChatCache {
    db: sled::Db,
}

/// Parsed messages of a previously seen export
#[derive(Debug, Clone)]
pub struct CachedChat {
    pub messages: Vec<ChatMessage>,
    pub skipped_lines: usize,
    pub cached_at: DateTime<Utc>,
}

impl ChatCache {
    /// Open (or create) the cache in `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let db = sled::open(dir)?;
        Ok(Self { db })
    }

    /// Cache key for an export: content hash plus the parser settings that
    /// influence the result
    #[must_use]
    pub fn make_key(content: &[u8], parser: &ChatParser) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hasher.update([0u8]);
        hasher.update(parser.date_order().as_str().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Result<Option<CachedChat>> {
        let Some(data) = self.db.get(key)? else {
            return Ok(None);
        };

        // Same wire format as `bincode::serialize`, but no allocation may
        // exceed the stored entry's own size.
        let decoder = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(data.len() as u64);
        match decoder.deserialize::<CacheEntry>(&data) {
            Ok(entry) => Ok(Some(CachedChat {
                messages: entry.messages,
                skipped_lines: entry.skipped_lines,
                cached_at: entry.cached_at,
            })),
            Err(e) => {
                warn!(key, error = %e, "Dropping unreadable cache entry");
                self.db.remove(key)?;
                Ok(None)
            }
        }
    }

    pub fn put(&self, key: &str, messages: &[ChatMessage], skipped_lines: usize) -> Result<()> {
        let entry = CacheEntry {
            messages: messages.to_vec(),
            skipped_lines,
            cached_at: Utc::now(),
        };

        let data = bincode::serialize(&entry)?;
        self.db.insert(key, data)?;
        self.db.flush()?;

        Ok(())
    }

    /// Number of cached exports
    #[must_use]
    pub fn len(&self) -> usize {
        self.db.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    pub fn clear(&self) -> Result<()> {
        self.db.clear()?;
        self.db.flush()?;
        Ok(())
    }
}

/// A loaded export ready for analysis
#[derive(Debug, Clone)]
pub struct LoadedChat {
    pub records: RecordSet,
    pub skipped_lines: usize,
    pub from_cache: bool,
}

/// Decode and parse an uploaded export, memoized through `cache` when given
pub fn load_chat(content: &[u8], parser: &ChatParser, cache: Option<&ChatCache>) -> Result<LoadedChat> {
    let key = cache.map(|_| ChatCache::make_key(content, parser));

    if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
        if let Some(hit) = cache.get(key)? {
            debug!(key, cached_at = %hit.cached_at, "Cache hit for chat export");
            return Ok(LoadedChat {
                records: RecordSet::new(hit.messages),
                skipped_lines: hit.skipped_lines,
                from_cache: true,
            });
        }
    }

    let text = String::from_utf8(content.to_vec()).map_err(ChatAnalyzerError::from)?;
    let parsed = parser.parse(&text)?;
    info!(
        messages = parsed.messages.len(),
        skipped_lines = parsed.skipped_lines,
        layout = ?parsed.layout,
        "Parsed chat export"
    );

    if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
        cache.put(key, &parsed.messages, parsed.skipped_lines)?;
    }

    Ok(LoadedChat {
        records: RecordSet::new(parsed.messages),
        skipped_lines: parsed.skipped_lines,
        from_cache: false,
    })
}
