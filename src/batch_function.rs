use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::FetchError;

/// A `BatchFunction` defines the method through which some `Loader` fetches batched data from
/// some resource. It receives the distinct keys requested during the `Loader`'s most recent
/// execution frame, and some user defined context struct.
///
/// Like the reference facebook dataloader, the BatchFunction must return a value for every key it
/// was given, in any order. A key left out of the returned map is reported to its requesters as
/// [`LoadError::MissingKey`](crate::LoadError::MissingKey). Returning an `Err` fails every
/// request of the frame with that same error.
///
/// Multiple `BatchFunctions` (and therefore loaders) can share the same context (likely through an
/// `Arc`).
#[async_trait]
pub trait BatchFunction<K, V> {
    type Context;
    async fn load(keys: &[K], context: &Self::Context) -> Result<HashMap<K, V>, FetchError>;
}
