mod batch_function;
pub mod coffees;
mod error;
mod loader;
mod loader_op;
mod loader_worker;
#[cfg(feature = "stats")]
mod worker_stats;

pub use batch_function::BatchFunction;
pub use error::{FetchError, LoadError};
pub use loader::Loader;
