//! Reseed coordination: reset every known pseudo-random source to a state
//! that is a pure function of `base_seed + offset`.
//!
//! Sources are capability objects behind [`RandomSource`]; the process-wide
//! standard generator is an explicit [`GlobalRng`] handle rather than a
//! hidden global, so the coordinator can be tested against a private handle.
//! Optional third-party generators are bound into the registry at startup
//! (cargo features, the moral equivalent of import probing) and never
//! re-probed per call. Extension callbacks are discovered lazily on first
//! reseed and cached for the process.

use crate::errors::ReseedError;
use crate::keying::key;
use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Seed range mask for sources restricted to 32-bit seeds.
const MASK_32: i64 = 1 << 32;

/// Explicit handle to a seedable generator whose state is fully replaced on
/// every reseed (never "folded in").
pub struct GlobalRng {
    inner: Mutex<StdRng>,
}

impl GlobalRng {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the entire internal state from `state`.
    pub fn reseed(&self, state: u64) {
        *self.inner.lock().unwrap() = StdRng::seed_from_u64(state);
    }

    pub fn next_u64(&self) -> u64 {
        self.inner.lock().unwrap().gen()
    }

    pub fn next_f64(&self) -> f64 {
        self.inner.lock().unwrap().gen()
    }
}

impl Default for GlobalRng {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// The one true process-wide generator uninstrumented test bodies read.
    pub static ref STD_RNG: GlobalRng = GlobalRng::new();
}

/// A reseedable pseudo-random source.
pub trait RandomSource: Send + Sync {
    fn name(&self) -> &'static str;
    /// Reset internal state as a pure function of `effective_seed`, masking
    /// into the source's valid seed range where needed.
    fn reseed(&self, effective_seed: i64);
}

/// The standard generator, behind a shared [`GlobalRng`] handle.
pub struct StdSource {
    handle: Arc<GlobalRng>,
}

impl StdSource {
    pub fn new(handle: Arc<GlobalRng>) -> Self {
        Self { handle }
    }
}

impl RandomSource for StdSource {
    fn name(&self) -> &'static str {
        "std"
    }

    fn reseed(&self, effective_seed: i64) {
        // Two's-complement cast keeps negative seeds deterministic.
        self.handle.reseed(effective_seed as u64);
    }
}

/// `fastrand`'s process-global generator, seeded in its 32-bit range the way
/// 32-bit-restricted sources are.
#[cfg(feature = "fastrand")]
pub struct FastrandSource;

#[cfg(feature = "fastrand")]
impl RandomSource for FastrandSource {
    fn name(&self) -> &'static str {
        "fastrand"
    }

    fn reseed(&self, effective_seed: i64) {
        fastrand::seed(effective_seed.rem_euclid(MASK_32) as u64);
    }
}

/// The set of sources known to this process. Populated once at startup;
/// presence of each optional source is a build-time fact, never re-checked
/// per reseed call.
pub struct SourceRegistry {
    sources: Vec<Box<dyn RandomSource>>,
}

impl SourceRegistry {
    /// Empty registry, for tests that want full control.
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Probe for every source this build knows about. The standard
    /// generator is always present; optional sources ride on their cargo
    /// features.
    pub fn probe() -> Self {
        let mut registry = Self::empty();
        registry.push(Box::new(SharedStdSource));
        #[cfg(feature = "fastrand")]
        registry.push(Box::new(FastrandSource));
        registry
    }

    pub fn push(&mut self, source: Box<dyn RandomSource>) {
        debug!(source = source.name(), "registered random source");
        self.sources.push(source);
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn RandomSource> {
        self.sources.iter().map(AsRef::as_ref)
    }
}

/// [`StdSource`] over the process-wide [`STD_RNG`].
struct SharedStdSource;

impl RandomSource for SharedStdSource {
    fn name(&self) -> &'static str {
        "std"
    }

    fn reseed(&self, effective_seed: i64) {
        STD_RNG.reseed(effective_seed as u64);
    }
}

type CallbackFn = Arc<dyn Fn(i64) -> Result<(), String> + Send + Sync>;

#[derive(Default)]
struct CallbackRegistry {
    registered: Vec<(String, CallbackFn)>,
    /// Snapshot taken on first reseed; later registrations are invisible
    /// until an explicit reset, mirroring one-shot entrypoint discovery.
    resolved: Option<Vec<(String, CallbackFn)>>,
}

lazy_static! {
    static ref CALLBACKS: Mutex<CallbackRegistry> = Mutex::new(CallbackRegistry::default());
}

/// Register an extension reseed callback. Callbacks run on every reseed, in
/// registration order, with the effective seed.
pub fn register_reseed_callback(
    name: impl Into<String>,
    callback: impl Fn(i64) -> Result<(), String> + Send + Sync + 'static,
) {
    let mut registry = CALLBACKS.lock().unwrap();
    registry.registered.push((name.into(), Arc::new(callback)));
}

fn resolved_callbacks() -> Vec<(String, CallbackFn)> {
    let mut registry = CALLBACKS.lock().unwrap();
    if registry.resolved.is_none() {
        let snapshot = registry.registered.clone();
        debug!(count = snapshot.len(), "resolved reseed callbacks");
        registry.resolved = Some(snapshot);
    }
    registry.resolved.clone().unwrap_or_default()
}

/// Drop all registered callbacks and the resolved snapshot. Test-isolation
/// hook only.
pub fn reset_reseed_callbacks() {
    let mut registry = CALLBACKS.lock().unwrap();
    registry.registered.clear();
    registry.resolved = None;
}

/// Which phase of a test is about to run (or just ran).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Call,
    Teardown,
}

/// Coordinates reseeding across the source registry and extension callbacks.
pub struct Reseeder {
    registry: SourceRegistry,
}

impl Reseeder {
    pub fn new() -> Self {
        Self {
            registry: SourceRegistry::probe(),
        }
    }

    pub fn with_registry(registry: SourceRegistry) -> Self {
        Self { registry }
    }

    /// Reset every source and invoke every callback from
    /// `base_seed + offset`. Returns the effective seed.
    ///
    /// Callback failures propagate: once a registered seeder has errored the
    /// process-global randomness state is unverifiable, so the run aborts.
    pub fn reseed(&self, base_seed: i64, offset: u32) -> Result<i64, ReseedError> {
        let effective = base_seed.wrapping_add(i64::from(offset));
        for source in self.registry.sources() {
            source.reseed(effective);
        }
        for (name, callback) in resolved_callbacks() {
            callback(effective).map_err(|message| ReseedError::Callback { name, message })?;
        }
        Ok(effective)
    }

    /// Phase-scoped reseed, keyed by the test's own stable identifier so the
    /// observed streams are independent of what ran before.
    pub fn reseed_phase(
        &self,
        base_seed: i64,
        node_id: &str,
        phase: Phase,
    ) -> Result<i64, ReseedError> {
        let k = key(node_id);
        let offset = match phase {
            Phase::Setup => k.wrapping_sub(1),
            Phase::Call => k,
            Phase::Teardown => k.wrapping_add(1),
        };
        self.reseed(base_seed, offset)
    }
}

impl Default for Reseeder {
    fn default() -> Self {
        Self::new()
    }
}
