//! Deterministic keying: strings to stable, well-distributed integers.
//!
//! Ordering and per-test offsets must be identical across processes and
//! platforms, so keys come from CRC32 over UTF-8 bytes, never from the
//! standard library's per-process randomized hasher.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;

lazy_static! {
    static ref KEY_CACHE: Mutex<HashMap<String, u32>> = Mutex::new(HashMap::new());
}

/// CRC32 of the string's UTF-8 bytes. Pure and memoized; the cache is
/// process-global and unbounded (inputs are test identifiers, bounded by
/// collection size).
pub fn key(s: &str) -> u32 {
    let mut cache = KEY_CACHE.lock().unwrap();
    if let Some(v) = cache.get(s) {
        return *v;
    }
    let v = crc32fast::hash(s.as_bytes());
    cache.insert(s.to_owned(), v);
    v
}

/// Key material combining the run seed with an identifier.
pub fn seed_string(seed: i64, ident: &str) -> String {
    format!("{seed}::{ident}")
}

/// Clear the memo. Test-isolation hook only; keys are pure so a cleared
/// cache never changes results.
pub fn reset_key_cache() {
    KEY_CACHE.lock().unwrap().clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_matches_zlib_crc32() {
        // zlib.crc32(b"test_a") etc.
        assert_eq!(key("test_a"), 1_564_985_826);
        assert_eq!(key("test_b"), 3_293_485_144);
        assert_eq!(key(""), 0);
    }

    #[test]
    fn key_is_stable_across_calls_and_resets() {
        let first = key("15::mod_a");
        reset_key_cache();
        assert_eq!(key("15::mod_a"), first);
        assert_eq!(first, 4_046_677_233);
    }

    #[test]
    fn seed_string_composes_seed_and_identifier() {
        assert_eq!(seed_string(15, "mod_a"), "15::mod_a");
        assert_eq!(seed_string(-3, "None"), "-3::None");
    }

    #[test]
    fn nearby_inputs_get_uncorrelated_keys() {
        // Sequential identifiers under the same seed must not sort in input
        // order; CRC32's avalanche is what the shuffle leans on.
        let keys: Vec<u32> = (0..8).map(|i| key(&seed_string(2, &format!("t{i}")))).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_ne!(keys, sorted);
    }
}
