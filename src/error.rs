use thiserror::Error;

use crate::cache::PolicyKind;

/// Convenient Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Every error the library can report
///
/// All of these are raised at construction boundaries or when joining workers, the simulation
/// loops themselves never fail
#[derive(Debug, Error)]
pub enum Error {
    /// A frame or page count which is negative but not the `-1` sentinel
    #[error("invalid {what}: {value}, expected a non-negative value or -1")]
    InvalidGeometry { what: &'static str, value: i64 },

    /// A reference to a page outside of the process's address space
    #[error("page {page} at position {position} is outside of 1..={page_count}")]
    PageOutOfRange {
        page: u32,
        position: usize,
        page_count: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A policy worker panicked, the whole process evaluation is discarded
    #[error("the {policy} worker panicked while simulating")]
    WorkerPanicked { policy: PolicyKind },

    /// A process worker panicked while evaluating a batch of processes
    #[error("process worker {worker} panicked while evaluating page size {page_size}")]
    ProcessWorkerPanicked { worker: usize, page_size: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("couldn't parse the configuration: {0}")]
    Json(#[from] serde_json::Error),
}
