use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::ops::Drop;

use tokio::sync::{mpsc, oneshot};
use tracing_futures::Instrument;

use crate::{
    batch_function::BatchFunction,
    error::LoadError,
    loader_op::{LoadRequest, LoaderOp},
    loader_worker::LoaderWorker,
};

/// Batch loads values from some expensive resource, primarily intended for mitigating GraphQL's
/// N+1 problem.
///
/// Users call [`Loader::load`] and [`Loader::load_many`] to fetch values from the underlying
/// resource. A load is registered as soon as it is called, but nothing is fetched until one of
/// the returned futures is polled. Every load issued up to that point, however many and from
/// however many call sites, ends up in a single invocation of the `BatchFunction`. There is no
/// cache: a `Loader` is meant to live for a single inbound request, and keys requested after a
/// flush are fetched again.
///
/// Requests are handed over a channel to a `LoaderWorker` task, which owns all frame state and
/// answers each caller on its own oneshot channel.
pub struct Loader<K, V>
where
    K: 'static + Eq + Debug + Clone + Send,
    V: 'static + Send + Debug + Clone,
{
    request_tx: mpsc::UnboundedSender<LoaderOp<K, V>>,
    load_task_handle: tokio::task::JoinHandle<()>,
}

impl<K, V> Drop for Loader<K, V>
where
    K: 'static + Eq + Debug + Clone + Send,
    V: 'static + Send + Debug + Clone,
{
    fn drop(&mut self) {
        self.load_task_handle.abort();
    }
}

impl<K, V> Loader<K, V>
where
    K: 'static + Eq + Hash + Debug + Clone + Send + Sync,
    V: 'static + Send + Debug + Clone,
{
    /// Creates a new Loader for the provided BatchFunction and Context type.
    ///
    /// Must be called from within a tokio runtime, which the worker task is spawned on.
    ///
    /// Note: the batch function is passed in as a marker for type inference.
    pub fn new<F, ContextT>(_: F, context: ContextT) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let span = tracing::trace_span!("LoaderWorker", kv = std::any::type_name::<(K, V)>());
        Self {
            request_tx: tx,
            load_task_handle: tokio::task::spawn(
                LoaderWorker::<K, V, F, ContextT>::new(rx, context).start().instrument(span),
            ),
        }
    }

    /// Loads a value from the underlying resource.
    ///
    /// The key is enqueued as soon as `load` is called. The first poll of the returned future
    /// asks the worker to flush, so loads issued back to back before any of them is awaited land
    /// in the same execution frame, on any runtime flavor.
    ///
    /// Fails with [`LoadError::Fetch`] if the frame's `BatchFunction` call failed, and with
    /// [`LoadError::MissingKey`] if it returned no value for `key`.
    pub fn load(&self, key: K) -> impl Future<Output = Result<V, LoadError>> {
        let (response_tx, response_rx) = oneshot::channel();
        self.enqueue(LoadRequest::One(key, response_tx), response_rx)
    }

    /// Loads many values at once.
    ///
    /// Values are returned in the order of `keys`. The keys join the current execution frame
    /// alongside any single loads; if any of them cannot be loaded the whole call fails.
    pub fn load_many(&self, keys: Vec<K>) -> impl Future<Output = Result<Vec<V>, LoadError>> {
        let (response_tx, response_rx) = oneshot::channel();
        self.enqueue(LoadRequest::Many(keys, response_tx), response_rx)
    }

    fn enqueue<T>(
        &self,
        request: LoadRequest<K, V>,
        response_rx: oneshot::Receiver<Result<T, LoadError>>,
    ) -> impl Future<Output = Result<T, LoadError>> {
        let sent =
            self.request_tx.send(LoaderOp::Load(request)).map_err(|_| LoadError::WorkerStopped);
        let request_tx = self.request_tx.clone();
        async move {
            sent?;
            request_tx.send(LoaderOp::Dispatch).map_err(|_| LoadError::WorkerStopped)?;
            response_rx.await.map_err(|_| LoadError::WorkerStopped)?
        }
    }
}
