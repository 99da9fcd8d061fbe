use thiserror::Error;

/// Failure of a `BatchFunction` to produce any result for a batch.
///
/// A single fetch failure is delivered to every request of the batch that triggered it, so the
/// error has to be cheaply cloneable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("data store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed batch query: {0}")]
    MalformedQuery(String),
}

/// Error returned to a caller of [`crate::Loader::load`] or [`crate::Loader::load_many`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The `BatchFunction` returned successfully but left out a key it was asked for.
    #[error("batch function returned no value for key {0}")]
    MissingKey(String),

    #[error("loader worker is no longer running")]
    WorkerStopped,
}
