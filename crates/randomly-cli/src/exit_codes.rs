//! Unified exit codes for the randomly CLI.
//! These codes are part of the public contract.

pub const SUCCESS: i32 = 0;
pub const RUN_FAILED: i32 = 1; // A reseed callback failed mid-run
pub const CONFIG_ERROR: i32 = 2; // Bad usage, invalid seed, unreadable manifest
