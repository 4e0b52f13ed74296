//! Plugin facade: the lifecycle surface a host test runner wires its hooks
//! to. Each method maps to one hook; the host owns registration, option
//! parsing, and worker transport, and calls in here with plain values.

use crate::errors::ReseedError;
use crate::keying::key;
use crate::reseed::{Phase, Reseeder};
use crate::seed::{resolve, RequestedSeed, SeedCache};
use crate::shuffle::{shuffle, CollectedItem};

/// Parsed plugin options, the host runner's CLI surface.
#[derive(Debug, Clone, Copy)]
pub struct RandomlyConfig {
    pub requested: RequestedSeed,
    /// `--dont-reset-seed` clears this.
    pub reset_seed: bool,
    /// `--dont-reorganize` clears this.
    pub reorganize: bool,
}

impl Default for RandomlyConfig {
    fn default() -> Self {
        Self {
            requested: RequestedSeed::Auto,
            reset_seed: true,
            reorganize: true,
        }
    }
}

/// One configured run: resolved seed plus the reseed coordinator.
pub struct RandomlyPlugin {
    seed: i64,
    reset_seed: bool,
    reorganize: bool,
    reseeder: Reseeder,
}

impl RandomlyPlugin {
    /// Resolve the run seed and build the coordinator. `adopted` carries a
    /// coordinator's seed on distributed workers; `cache` is the optional
    /// "last seed" collaborator.
    pub fn configure(
        config: RandomlyConfig,
        adopted: Option<i64>,
        cache: Option<&dyn SeedCache>,
    ) -> Self {
        Self {
            seed: resolve(config.requested, adopted, cache),
            reset_seed: config.reset_seed,
            reorganize: config.reorganize,
            reseeder: Reseeder::new(),
        }
    }

    /// The resolved run seed. Also the value a coordinator hands to its
    /// workers before any worker collects.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Report line emitted once per run. Reseeds at offset 0 first, so
    /// collection-time consumers of randomness start deterministic.
    pub fn report_header(&self) -> Result<String, ReseedError> {
        self.reseeder.reseed(self.seed, 0)?;
        Ok(format!("Using --randomly-seed={}", self.seed))
    }

    /// Before fixtures/setup run. Returns the effective seed, or `None`
    /// when per-phase reseeding is disabled.
    pub fn runtest_setup(&self, node_id: &str) -> Result<Option<i64>, ReseedError> {
        self.reseed_phase(node_id, Phase::Setup)
    }

    /// Before the test body runs.
    pub fn runtest_call(&self, node_id: &str) -> Result<Option<i64>, ReseedError> {
        self.reseed_phase(node_id, Phase::Call)
    }

    /// After teardown finished.
    pub fn runtest_teardown(&self, node_id: &str) -> Result<Option<i64>, ReseedError> {
        self.reseed_phase(node_id, Phase::Teardown)
    }

    fn reseed_phase(&self, node_id: &str, phase: Phase) -> Result<Option<i64>, ReseedError> {
        if !self.reset_seed {
            return Ok(None);
        }
        self.reseeder.reseed_phase(self.seed, node_id, phase).map(Some)
    }

    /// Reorder the collected items, unless reorganizing is disabled.
    pub fn collection_modifyitems<T: CollectedItem>(
        &self,
        items: Vec<T>,
    ) -> Result<Vec<T>, ReseedError> {
        if !self.reorganize {
            return Ok(items);
        }
        let seed = self.reseeder.reseed(self.seed, 0)?;
        Ok(shuffle(seed, items))
    }

    /// Per-test derived seed for fixture/data-generation libraries that want
    /// their own deterministic stream.
    pub fn fixture_seed(&self, node_id: &str) -> i64 {
        self.seed.wrapping_add(i64::from(key(node_id)))
    }
}
