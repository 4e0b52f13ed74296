use thiserror::Error;

/// Seed resolution errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeedError {
    /// The requested seed was neither an integer nor a recognized keyword.
    /// Fatal before any tests run.
    #[error("{input:?} is not an integer or the string 'last'")]
    InvalidSeed { input: String },
}

/// Reseed coordination errors.
///
/// Missing optional sources are not errors (they degrade silently at
/// startup); a failing extension callback is, because the process-global
/// randomness state is unverifiable once a registered seeder has bailed.
#[derive(Debug, Error)]
pub enum ReseedError {
    #[error("reseed callback {name:?} failed: {message}")]
    Callback { name: String, message: String },
}

/// A collaborator failed to resolve the module identity of a collected item.
///
/// The shuffler catches this locally and files the item under the "no
/// module" sentinel group; it is never fatal to shuffling.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not resolve module for {node_id}: {message}")]
pub struct GroupError {
    pub node_id: String,
    pub message: String,
}

impl GroupError {
    pub fn new(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            message: message.into(),
        }
    }
}
