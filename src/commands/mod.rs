pub mod annotate;
pub mod convert;

pub use annotate::annotate;
pub use convert::convert;

use crate::utils::util::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub(crate) fn build_thread_pool(num_threads: usize, command: &str) -> Result<ThreadPool> {
    log::debug!("Initializing {command} thread pool with {num_threads} threads...");
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name({
            let command = command.to_string();
            move |i| format!("rsidx-{command}-{i}")
        })
        .build()
        .map_err(|e| crate::rsidx_error!("Failed to initialize {command} thread pool: {e}"))
}
