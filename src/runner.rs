use std::thread;

use tracing::trace;

use crate::cache::PolicyKind;
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::reference::ReferenceString;
use crate::results::{AccessResult, ResultTable};

/// Runs every policy against the same reference string, one worker thread per policy
///
/// The reference string is shared read-only between the workers, and each worker hands back its
/// own result on join, so the table only depends on the inputs and never on the order the workers
/// finish in. If any worker fails the whole table is discarded.
///
/// For an undefined geometry nothing is simulated, and every policy reports the sentinel
///
/// # Arguments
///
/// * `references`: The reference string of one process
/// * `geometry`: The page and frame counts of the process for the current page size
///
/// returns: Result<ResultTable, Error>
pub fn run_policies(references: &ReferenceString, geometry: Geometry) -> Result<ResultTable> {
    let frames = match geometry {
        Geometry::Undefined => return Ok(ResultTable::undefined()),
        Geometry::Defined { frames, .. } => frames,
    };
    join_policy_workers(|policy| policy.simulate(references, frames))
}

/// Runs `job` for every policy on its own scoped thread and collects the results by policy
///
/// Every worker is joined before any outcome is looked at, so one failing worker never leaves the
/// others running. The first failure, in policy order, is returned in place of the table
pub fn join_policy_workers<F>(job: F) -> Result<ResultTable>
where
    F: Fn(PolicyKind) -> AccessResult + Sync,
{
    let job = &job;
    thread::scope(|scope| {
        let handles = PolicyKind::ALL.map(|policy| {
            let handle = thread::Builder::new()
                .name(format!("policy-{policy}"))
                .spawn_scoped(scope, move || job(policy));
            (policy, handle)
        });
        // The scope would otherwise re-raise the panic of a worker left behind
        let outcomes: Vec<(PolicyKind, Result<thread::Result<AccessResult>>)> = handles
            .into_iter()
            .map(|(policy, handle)| (policy, handle.map(|h| h.join()).map_err(Error::from)))
            .collect();
        let mut table = ResultTable::default();
        for (policy, outcome) in outcomes {
            let result = outcome?.map_err(|_| Error::WorkerPanicked { policy })?;
            trace!(%policy, misses = result.misses, total = result.total, "policy finished");
            table[policy] = result;
        }
        Ok(table)
    })
}

/// Runs every policy one after another on the calling thread
///
/// Produces the same table as run_policies, used where threads aren't worth spawning
pub fn run_policies_inline(references: &ReferenceString, geometry: Geometry) -> ResultTable {
    ResultTable::from_fn(|policy| policy.simulate_geometry(references, geometry))
}
