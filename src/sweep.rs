use std::ops::Range;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, trace};

use crate::config::SweepConfig;
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::reference::ReferenceString;
use crate::results::{AggregateRow, Report, ResultTable};
use crate::runner::{run_policies, run_policies_inline};

/// Sweeps every page size from 0 up to the smaller of the RAM and process sizes, evaluating all
/// policies on freshly generated processes for each one.
///
/// Every process draws its references from its own generator, seeded from the sweep seed, the
/// page size and the process number. The report for a given seed is therefore the same however
/// the processes are split over workers
pub struct Sweep {
    config: SweepConfig,
    seed: u64,
    simulation_time: Duration,
}

impl Sweep {
    /// Creates a sweep, validating its configuration and fixing its seed
    pub fn new(config: SweepConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self {
            config,
            seed,
            simulation_time: Duration::new(0, 0),
        })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// The seed in use, which reproduces this sweep when set in the configuration
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Gets the wall-clock time spent in run, accumulated over every call
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Runs the whole sweep, one report row per page size
    pub fn run(&mut self) -> Result<Report> {
        let start = Instant::now();
        let config = &self.config;
        info!(
            ram_size = config.ram_size,
            process_size = config.process_size,
            processes = config.process_count,
            workers = config.workers,
            seed = self.seed,
            "starting sweep"
        );
        let mut report = Report::new(config.ram_size, config.process_size);
        for page_size in 0..=config.max_page_size() {
            let geometry = Geometry::for_page_size(config.ram_size, config.process_size, page_size);
            let row = self.evaluate_page_size(page_size, geometry)?;
            debug!(page_size, pages = geometry.raw_pages(), frames = geometry.raw_frames(), "page size evaluated");
            report.push(row);
        }
        self.simulation_time += start.elapsed();
        info!(rows = report.rows().len(), elapsed = ?start.elapsed(), "sweep finished");
        Ok(report)
    }

    /// Runs the sweep and records it in a history, returning the recorded report
    ///
    /// The recorded configuration carries the seed actually used, so it can be replayed
    pub fn run_into<'h>(&mut self, history: &'h mut History) -> Result<&'h Report> {
        let report = self.run()?;
        let config = self.config.clone().with_seed(self.seed);
        Ok(history.record(config, report))
    }

    /// Evaluates every process for one page size, splitting them over the configured workers
    pub fn evaluate_page_size(&self, page_size: usize, geometry: Geometry) -> Result<AggregateRow> {
        let processes = self.config.process_count;
        let workers = self.config.workers.min(processes).max(1);
        if workers == 1 {
            return self.evaluate_processes(page_size, geometry, 0..processes);
        }
        let chunk = processes.div_ceil(workers);
        let ranges: Vec<Range<usize>> = (0..workers)
            .map(|w| w * chunk..((w + 1) * chunk).min(processes))
            .filter(|range| !range.is_empty())
            .collect();
        join_process_workers(page_size, geometry, ranges, |range| {
            self.evaluate_processes(page_size, geometry, range)
        })
    }

    fn evaluate_processes(&self, page_size: usize, geometry: Geometry, processes: Range<usize>) -> Result<AggregateRow> {
        let mut row = AggregateRow::new(page_size, geometry);
        for process in processes {
            let table = self.evaluate_process(page_size, geometry, process)?;
            row.fold(&table);
        }
        Ok(row)
    }

    /// Generates the reference string of one process and runs every policy on it
    pub fn evaluate_process(&self, page_size: usize, geometry: Geometry, process: usize) -> Result<ResultTable> {
        let pages = match geometry {
            Geometry::Undefined => return Ok(ResultTable::undefined()),
            Geometry::Defined { pages, .. } => pages,
        };
        let mut rng = StdRng::seed_from_u64(process_seed(self.seed, page_size, process));
        let references = ReferenceString::generate(pages, self.config.references_per_page, &mut rng)?;
        trace!(page_size, process, references = references.len(), "evaluating process");
        if self.config.parallel_policies {
            run_policies(&references, geometry)
        } else {
            Ok(run_policies_inline(&references, geometry))
        }
    }
}

/// Evaluates each range of processes on its own scoped thread with `job`, merging the partial rows
///
/// Every worker is joined before any outcome is looked at. A panicking worker fails the whole
/// page size with ProcessWorkerPanicked, and no partial row is returned
pub fn join_process_workers<F>(page_size: usize, geometry: Geometry, ranges: Vec<Range<usize>>, job: F) -> Result<AggregateRow>
where
    F: Fn(Range<usize>) -> Result<AggregateRow> + Sync,
{
    let job = &job;
    thread::scope(|scope| {
        let handles: Vec<_> = ranges
            .into_iter()
            .enumerate()
            .map(|(worker, range)| {
                let handle = thread::Builder::new()
                    .name(format!("process-worker-{worker}"))
                    .spawn_scoped(scope, move || job(range));
                (worker, handle)
            })
            .collect();
        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|(worker, handle)| (worker, handle.map(|h| h.join())))
            .collect();
        let mut row = AggregateRow::new(page_size, geometry);
        for (worker, outcome) in outcomes {
            let partial = outcome?.map_err(|_| Error::ProcessWorkerPanicked { worker, page_size })??;
            row = row.merge(&partial);
        }
        Ok(row)
    })
}

// Mixes the coordinates of a process into the sweep seed, so neighbouring processes and page sizes
// don't get correlated generators
fn process_seed(seed: u64, page_size: usize, process: usize) -> u64 {
    let mut z = seed
        ^ (page_size as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (process as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Every sweep run so far, with the configuration that produced it
///
/// Owned by the caller, so independent runs and tests never share state
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<(SweepConfig, Report)>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finished sweep, returning the stored report
    pub fn record(&mut self, config: SweepConfig, report: Report) -> &Report {
        self.entries.push((config, report));
        let Some((_, report)) = self.entries.last() else {
            unreachable!("an entry was just pushed");
        };
        report
    }

    /// The most recently recorded sweep
    pub fn latest(&self) -> Option<(&SweepConfig, &Report)> {
        self.entries.last().map(|(config, report)| (config, report))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SweepConfig, &Report)> {
        self.entries.iter().map(|(config, report)| (config, report))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
