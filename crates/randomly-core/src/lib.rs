//! Deterministic random seeding and test-order shuffling.
//!
//! The core is four small pieces:
//! - [`seed`]: turn a requested seed (`auto` / `last` / literal) into the
//!   concrete integer used for the whole run.
//! - [`keying`]: map strings to stable CRC32 keys, the only hash this crate
//!   ever orders by (process hash randomization must not leak into ordering).
//! - [`reseed`]: reset every known pseudo-random source to a state derived
//!   from seed + offset, around each test phase.
//! - [`shuffle`]: reorder collected tests by module and class, as a pure
//!   function of the seed and the test identifiers.
//!
//! [`plugin::RandomlyPlugin`] ties them together the way a host test runner's
//! lifecycle hooks would call them.

pub mod errors;
pub mod keying;
pub mod plugin;
pub mod reseed;
pub mod seed;
pub mod shuffle;

pub use errors::{GroupError, ReseedError, SeedError};
pub use plugin::{RandomlyConfig, RandomlyPlugin};
pub use seed::{resolve, FileSeedCache, RequestedSeed, SeedCache};
pub use shuffle::{shuffle, CollectedItem, TestItem};
