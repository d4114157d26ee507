use faststr::FastStr;
use thiserror::Error;

/// Every failure a cache stream can terminate with.
///
/// Cloneable so a cold stream that fails fast can hand the same error to each
/// of its subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("cache operation failed: {0}")]
    Collaborator(FastStr),

    #[error("caller-supplied function failed: {0}")]
    Function(FastStr),

    #[error("contract violation: {0}")]
    ContractViolation(FastStr),

    #[error("no tokio runtime available to activate the stream")]
    NoRuntime,

    #[error("cache task failed: {0}")]
    TaskFailed(FastStr),

    #[error("invalid config {0}: {1}")]
    InvalidConfig(&'static str, FastStr),
}

impl Error {
    pub fn collaborator(msg: impl Into<FastStr>) -> Self {
        Self::Collaborator(msg.into())
    }

    pub fn function(msg: impl Into<FastStr>) -> Self {
        Self::Function(msg.into())
    }

    pub fn contract(msg: impl Into<FastStr>) -> Self {
        Self::ContractViolation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
