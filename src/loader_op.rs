use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::slice;

use tokio::sync::oneshot;

use crate::error::{FetchError, LoadError};

/// Messages sent from a [`Loader`](crate::Loader) to its worker.
#[derive(Debug)]
pub enum LoaderOp<K, V> {
    /// Stage a request in the current execution frame.
    Load(LoadRequest<K, V>),
    /// Sent by a load handle the first time it is polled. Its issuer has reached an await point,
    /// so everything it registered so far may be flushed.
    Dispatch,
}

/// A pending load registered with the [`LoaderWorker`](crate::loader_worker::LoaderWorker).
///
/// Every call to `load` or `load_many` produces its own request, duplicate keys included. The
/// request is resolved exactly once, when the execution frame it was collected in is flushed.
#[derive(Debug)]
pub enum LoadRequest<K, V> {
    One(K, oneshot::Sender<Result<V, LoadError>>),
    Many(Vec<K>, oneshot::Sender<Result<Vec<V>, LoadError>>),
}

impl<K, V> LoadRequest<K, V>
where
    K: Eq + Hash + Debug,
    V: Clone,
{
    pub fn keys(&self) -> &[K] {
        match self {
            LoadRequest::One(ref key, _) => slice::from_ref(key),
            LoadRequest::Many(ref keys, _) => keys,
        }
    }

    /// Answers the request from the values loaded for its frame.
    pub fn send_response(self, values: &HashMap<K, V>) {
        match self {
            LoadRequest::One(key, response_tx) => {
                let response = lookup(values, &key);
                if response_tx.send(response).is_err() {
                    tracing::error!(?key, "receiver dropped");
                }
            }
            LoadRequest::Many(keys, response_tx) => {
                let response =
                    keys.iter().map(|key| lookup(values, key)).collect::<Result<Vec<_>, _>>();
                if response_tx.send(response).is_err() {
                    tracing::error!(?keys, "receiver dropped");
                }
            }
        }
    }

    /// Fails the request with the error of its frame's fetch.
    pub fn send_error(self, error: FetchError) {
        let sent = match self {
            LoadRequest::One(_, response_tx) => response_tx.send(Err(error.into())).is_ok(),
            LoadRequest::Many(_, response_tx) => response_tx.send(Err(error.into())).is_ok(),
        };
        if !sent {
            tracing::error!("receiver dropped");
        }
    }
}

fn lookup<K, V>(values: &HashMap<K, V>, key: &K) -> Result<V, LoadError>
where
    K: Eq + Hash + Debug,
    V: Clone,
{
    values.get(key).cloned().ok_or_else(|| LoadError::MissingKey(format!("{:?}", key)))
}
