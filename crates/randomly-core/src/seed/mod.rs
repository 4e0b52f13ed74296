//! Run-level seed resolution.
//!
//! One seed per run, resolved exactly once on the coordinating process.
//! Workers in a distributed run never resolve independently; they adopt the
//! coordinator's value (see [`resolve`]'s `adopted` argument).

use crate::errors::SeedError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

/// Cache key under which the resolved seed is persisted for `--seed last`.
pub const SEED_CACHE_KEY: &str = "randomly_seed";

/// What the user asked for on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedSeed {
    /// Fresh high-entropy seed, different every run.
    Auto,
    /// Reuse the previous run's seed if a cache is available.
    Last,
    /// Verbatim literal, negatives included.
    Literal(i64),
}

impl FromStr for RequestedSeed {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" | "default" => Ok(Self::Auto),
            "last" => Ok(Self::Last),
            _ => s
                .parse::<i64>()
                .map(Self::Literal)
                .map_err(|_| SeedError::InvalidSeed {
                    input: s.to_owned(),
                }),
        }
    }
}

/// Fresh 32-bit seed. Wide enough to be memorable on a failure report,
/// narrow enough to fit every downstream generator's seed range.
pub fn make_seed() -> i64 {
    i64::from(rand::random::<u32>())
}

/// Key-value collaborator used only for "reuse last seed". Implementations
/// must never fail loudly; a broken store is the same as no store.
pub trait SeedCache {
    fn get(&self, key: &str) -> Option<i64>;
    fn set(&self, key: &str, value: i64);
}

/// JSON-file cache, one small map per cache directory.
pub struct FileSeedCache {
    path: PathBuf,
}

impl FileSeedCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join("randomly.json"),
        }
    }

    fn read_map(&self) -> HashMap<String, i64> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

impl SeedCache for FileSeedCache {
    fn get(&self, key: &str) -> Option<i64> {
        self.read_map().get(key).copied()
    }

    fn set(&self, key: &str, value: i64) {
        let mut map = self.read_map();
        map.insert(key.to_owned(), value);
        let write = self
            .path
            .parent()
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|()| {
                let raw = serde_json::to_string(&map).unwrap_or_else(|_| "{}".to_owned());
                fs::write(&self.path, raw)
            });
        if let Err(e) = write {
            warn!(path = %self.path.display(), error = %e, "seed cache write failed; 'last' will not see this run");
        }
    }
}

/// Resolve the run seed.
///
/// - `Literal(n)` is returned verbatim.
/// - `Last` reads the cache; a missing cache or empty entry degrades to the
///   `Auto` path with a warning, never an error.
/// - `Auto` yields a fresh seed, unless `adopted` carries a coordinator's
///   value, which always wins (distributed workers must share one seed).
///
/// Side effect: the resolved value is persisted to the cache when one is
/// available, so the next run can ask for `last`.
pub fn resolve(
    requested: RequestedSeed,
    adopted: Option<i64>,
    cache: Option<&dyn SeedCache>,
) -> i64 {
    let seed = match requested {
        RequestedSeed::Literal(n) => n,
        RequestedSeed::Last => match cache {
            Some(c) => c.get(SEED_CACHE_KEY).unwrap_or_else(|| {
                debug!("no persisted seed; falling back to a fresh one");
                make_seed()
            }),
            None => {
                warn!("seed cache unavailable; 'last' degrades to a fresh seed");
                make_seed()
            }
        },
        RequestedSeed::Auto => match adopted {
            Some(s) => s,
            None => make_seed(),
        },
    };
    if let Some(c) = cache {
        c.set(SEED_CACHE_KEY, seed);
    }
    debug!(seed, "resolved run seed");
    seed
}
