use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

use tokio::sync::mpsc;

#[cfg(feature = "stats")]
use crate::worker_stats::WorkerStats;
use crate::{
    batch_function::BatchFunction,
    loader_op::{LoadRequest, LoaderOp},
};

/// A `LoaderWorker` is the "single-thread" worker task that actually does the loading work.
///
/// Once started, it runs in a loop until the parent Loader aborts its `JoinHandle` or every
/// sender of the request queue is dropped.
///
/// Each cycle through the loop is an "execution frame":
///
/// 1. Load requests are staged as they arrive: the request is kept, duplicates included, and its
///    keys are added to the set of keys to load. Nothing is fetched yet, so a caller that is
///    still registering loads on another thread cannot be cut off mid-turn.
/// 2. A `Dispatch` arrives once some handle is polled, meaning its issuer has left its
///    synchronous section. The worker yields once so that other tasks woken alongside it can
///    register their loads, then takes everything already queued with `try_recv`.
/// 3. The `BatchFunction` is invoked exactly once with the distinct staged keys. Each
///    outstanding request is answered from the returned map; if the `BatchFunction` failed,
///    every outstanding request receives that error. Nothing survives the frame.
///
/// A `Dispatch` that finds no staged request (its handle was answered by an earlier frame) is
/// ignored.
pub struct LoaderWorker<K, V, F, ContextT>
where
    K: 'static + Eq + Hash + Debug + Clone + Send + Sync,
    V: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    ContextT: Send + Sync + 'static,
{
    request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>,
    keys_to_load: Vec<K>,
    staged_keys: HashSet<K>,
    pending_requests: Vec<LoadRequest<K, V>>,
    context: ContextT,
    phantom_batch_function: PhantomData<F>,
    #[cfg(feature = "stats")]
    stats: WorkerStats,
}

impl<K, V, F, ContextT> LoaderWorker<K, V, F, ContextT>
where
    K: 'static + Eq + Hash + Debug + Clone + Send + Sync,
    V: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    ContextT: Send + Sync + 'static,
{
    pub fn new(request_rx: mpsc::UnboundedReceiver<LoaderOp<K, V>>, context: ContextT) -> Self {
        Self {
            request_rx,
            keys_to_load: Vec::new(),
            staged_keys: HashSet::new(),
            pending_requests: Vec::new(),
            context,
            phantom_batch_function: PhantomData,
            #[cfg(feature = "stats")]
            stats: WorkerStats::new(std::any::type_name::<(K, V)>()),
        }
    }

    pub async fn start(mut self) {
        loop {
            match self.request_rx.recv().await {
                None => {
                    tracing::info!("Tx channel closed. Terminating LoaderWorker.");
                    return;
                }
                Some(LoaderOp::Load(request)) => self.stage(request),
                Some(LoaderOp::Dispatch) if self.pending_requests.is_empty() => {}
                Some(LoaderOp::Dispatch) => {
                    tokio::task::yield_now().await;
                    // `try_recv` leaves the coop budget alone, so the drain cannot stop early.
                    while let Ok(op) = self.request_rx.try_recv() {
                        if let LoaderOp::Load(request) = op {
                            self.stage(request);
                        }
                    }
                    self.execute_load().await;
                }
            }
        }
    }

    fn stage(&mut self, request: LoadRequest<K, V>) {
        tracing::debug!(requested_keys = ?request.keys());
        #[cfg(feature = "stats")]
        self.stats.record_load_request(request.keys().len() as u32);
        for key in request.keys() {
            if self.staged_keys.insert(key.clone()) {
                self.keys_to_load.push(key.clone());
            }
        }
        self.pending_requests.push(request);
    }

    #[tracing::instrument(skip(self))]
    async fn execute_load(&mut self) {
        if self.keys_to_load.is_empty() {
            // Only empty `load_many` calls were staged; there is nothing to fetch.
            let values = HashMap::new();
            for request in self.pending_requests.drain(..) {
                request.send_response(&values);
            }
            return;
        }
        tracing::debug!(keys_to_load = ?self.keys_to_load, requests = self.pending_requests.len());
        #[cfg(feature = "stats")]
        self.stats
            .record_load_exec(self.pending_requests.len() as u32, self.keys_to_load.len() as u32);

        let loaded = F::load(&self.keys_to_load, &self.context).await;
        self.keys_to_load.clear();
        self.staged_keys.clear();

        match loaded {
            Ok(values) => {
                tracing::debug!(loaded_keyvals = ?values);
                for request in self.pending_requests.drain(..) {
                    request.send_response(&values);
                }
            }
            Err(error) => {
                tracing::warn!(%error, requests = self.pending_requests.len(), "batch load failed");
                #[cfg(feature = "stats")]
                self.stats.record_load_failure();
                for request in self.pending_requests.drain(..) {
                    request.send_error(error.clone());
                }
            }
        }
    }
}
