//! Cache for built indexes.
//!
//! Building an index over a long horizon is the expensive part of a run, so
//! front-ends can memoize it. The cache is a keyed store ([`IndexCache`]) plus
//! an injected invalidation predicate ([`Freshness`]); [`load_or_build`] glues
//! them together.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{IndexFile, Observation, PriceIndex};
use crate::error::Result;
use crate::io::{read_index_json, write_index_file};

/// Keyed store of index files.
pub trait IndexCache {
    fn load(&self, key: &str) -> Result<Option<IndexFile>>;
    fn store(&self, key: &str, file: &IndexFile) -> Result<()>;
}

/// Decides whether a cached index can still be served.
pub trait Freshness {
    fn is_fresh(&self, cached: &IndexFile, today: NaiveDate) -> bool;
}

/// Cached indexes are valid only on the day they were built.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltToday;

impl Freshness for BuiltToday {
    fn is_fresh(&self, cached: &IndexFile, today: NaiveDate) -> bool {
        cached.built_on == today
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl IndexCache for JsonFileCache {
    fn load(&self, key: &str) -> Result<Option<IndexFile>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        match read_index_json(&path) {
            Ok(file) => Ok(Some(file)),
            Err(e) => {
                // A corrupt entry is treated as a miss and overwritten.
                warn!(path = %path.display(), error = %e, "ignoring unreadable cache entry");
                Ok(None)
            }
        }
    }

    fn store(&self, key: &str, file: &IndexFile) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        write_index_file(&self.path_for(key), file)
    }
}

/// How [`load_or_build`] obtained its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Stale,
    /// Rebuilt on request without looking at the cache.
    Refreshed,
}

/// Index settings as requested by the caller, before defaults are resolved.
///
/// Keys are built from these rather than from the resolved horizon: default
/// dates move with the calendar, and [`Freshness`] decides when that matters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexRequest {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub outliers_percentile: f64,
}

/// Key identifying an index built from `observations` for `request`.
///
/// `label` (typically the input file name) keeps keys readable; the hash makes
/// different data or explicit horizons land in different entries.
pub fn cache_key(label: &str, request: &IndexRequest, observations: &[Observation]) -> String {
    let mut hasher = DefaultHasher::new();
    request.min_date.hash(&mut hasher);
    request.max_date.hash(&mut hasher);
    request.outliers_percentile.to_bits().hash(&mut hasher);
    for o in observations {
        o.item_id.hash(&mut hasher);
        o.date.hash(&mut hasher);
        o.price.to_bits().hash(&mut hasher);
    }
    let label: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{label}-{:016x}", hasher.finish())
}

/// Serve a fresh cached index or build, store and return a new one.
///
/// With `refresh` the cache is not read; the entry is rebuilt and overwritten.
pub fn load_or_build<C, F, B>(
    cache: &C,
    freshness: &F,
    key: &str,
    today: NaiveDate,
    refresh: bool,
    build: B,
) -> Result<(PriceIndex, CacheStatus)>
where
    C: IndexCache + ?Sized,
    F: Freshness + ?Sized,
    B: FnOnce() -> Result<PriceIndex>,
{
    let status = if refresh {
        CacheStatus::Refreshed
    } else {
        match cache.load(key)? {
            Some(cached) if freshness.is_fresh(&cached, today) => match cached.into_index() {
                Ok(index) => {
                    debug!(key, "index cache hit");
                    return Ok((index, CacheStatus::Hit));
                }
                Err(e) => {
                    warn!(key, error = %e, "cached index is invalid; rebuilding");
                    CacheStatus::Stale
                }
            },
            Some(_) => CacheStatus::Stale,
            None => CacheStatus::Miss,
        }
    };

    let index = build()?;
    cache.store(key, &IndexFile::from_index(&index, today))?;
    info!(key, ?status, "stored rebuilt index");
    Ok((index, status))
}
