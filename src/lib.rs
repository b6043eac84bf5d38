//! # PageSim
//!
//! PageSim compares page replacement policies on synthetic processes.
//!
//! It provides a generic fixed-capacity cache which can be parameterised by a replacement policy,
//! four policies (FIFO, LRU, MRU and Belady's optimal policy), and a sweep which evaluates all of
//! them over every page size that fits a given RAM and process size
//!
//! ```
//! use pagesim::config::SweepConfig;
//! use pagesim::sweep::{History, Sweep};
//!
//! let config = SweepConfig::new(8, 4, 8).with_seed(7);
//! let mut history = History::new();
//! let report = Sweep::new(config).unwrap().run_into(&mut history).unwrap();
//! assert_eq!(report.rows().len(), 9);
//! ```

/// Contains the fixed-capacity cache model and the enumeration of the provided policies
pub mod cache;

/// Contains definitions for the JSON input format and the sweep parameters
pub mod config;

/// Contains the error type shared by the library
pub mod error;

/// Contains the per page size cache geometry, including the undefined page size sentinel
pub mod geometry;

/// Interactive collection of sweep parameters
pub mod input;

/// Tracing subscriber setup for the binary
pub mod logging;

/// Contains the reference string type and its uniform random generator
pub mod reference;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Renders a report as an ASCII table
pub mod report;

/// Contains the access results and their aggregation
pub mod results;

/// Runs every policy against one reference string
pub mod runner;

/// Contains the page size sweep and the history of completed sweeps
pub mod sweep;

#[cfg(test)]
mod test;
