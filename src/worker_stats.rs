#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Human readable name used to identify this worker stats when it is reported.
    tag: &'static str,
    /// Number of load requests that were received by the worker.
    load_requests: u32,
    /// The total number of keys that were requested for loading (not necessarily unique).
    items_requested: u32,
    /// Number of times that this worker executed the `LoaderWorker::execute_load` function.
    loads: u32,
    /// Number of loads whose batch function returned an error.
    failed_loads: u32,
    /// The average number of requests answered by a single load.
    average_batch_size: f32,
    /// The max number of requests answered by a single load.
    max_batch_size: u32,
    /// The min number of requests answered by a single load.
    min_batch_size: u32,

    /// The max number of unique keys fetched during a single load.
    max_batch_unique: u32,
    /// The min number of unique keys fetched during a single load.
    min_batch_unique: u32,
}

impl WorkerStats {
    pub fn new(tag: &'static str) -> Self {
        Self { tag, min_batch_size: u32::MAX, min_batch_unique: u32::MAX, ..Default::default() }
    }

    pub fn record_load_request(&mut self, items_requested: u32) {
        self.load_requests += 1;
        self.items_requested += items_requested;
    }

    pub fn record_load_exec(&mut self, batch_size: u32, unique_batch_size: u32) {
        let new_total_load = self.loads + 1;
        self.average_batch_size = (((self.average_batch_size as f64 * self.loads as f64)
            + batch_size as f64)
            / new_total_load as f64) as f32;
        self.loads = new_total_load;
        self.max_batch_size = self.max_batch_size.max(batch_size);
        self.min_batch_size = self.min_batch_size.min(batch_size);
        self.max_batch_unique = self.max_batch_unique.max(unique_batch_size);
        self.min_batch_unique = self.min_batch_unique.min(unique_batch_size);
    }

    pub fn record_load_failure(&mut self) {
        self.failed_loads += 1;
    }
}

impl Drop for WorkerStats {
    fn drop(&mut self) {
        tracing::debug!(worker_stats = ?self);
    }
}
