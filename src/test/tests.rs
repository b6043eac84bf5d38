use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cache::{CacheTrait, PolicyKind};
use crate::config::{Config, SweepConfig};
use crate::error;
use crate::geometry::Geometry;
use crate::input::prompt_sweep_config;
use crate::reference::ReferenceString;
use crate::replacement_policies::next_occurrences;
use crate::report::render_table;
use crate::results::{AccessResult, AggregateRow, ResultTable};
use crate::runner::{join_policy_workers, run_policies, run_policies_inline};
use crate::sweep::{join_process_workers, History, Sweep};

const TEXTBOOK_TRACE: [u32; 9] = [1, 2, 3, 1, 2, 4, 1, 2, 5];
const ANOMALY_TRACE: [u32; 12] = [1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5];
const SILBERSCHATZ_TRACE: [u32; 20] = [7, 0, 1, 2, 0, 3, 0, 4, 2, 3, 0, 3, 2, 1, 2, 0, 1, 7, 0, 1];

fn misses(policy: PolicyKind, references: &[u32], capacity: usize) -> i64 {
    let result = policy.simulate(references, capacity);
    assert_eq!(result.total, references.len() as i64);
    result.misses
}

fn defined(pages: usize, frames: usize) -> Geometry {
    Geometry::Defined { pages, frames }
}

#[test]
fn fifo_textbook_trace() {
    let result = PolicyKind::FirstInFirstOut.simulate(&TEXTBOOK_TRACE, 3);
    assert_eq!(result, AccessResult::new(7, 9));
}

#[test]
fn every_policy_on_textbook_trace() {
    assert_eq!(misses(PolicyKind::Optimal, &TEXTBOOK_TRACE, 3), 5);
    assert_eq!(misses(PolicyKind::LeastRecentlyUsed, &TEXTBOOK_TRACE, 3), 5);
    assert_eq!(misses(PolicyKind::MostRecentlyUsed, &TEXTBOOK_TRACE, 3), 6);
}

#[test]
fn classic_trace_with_three_frames() {
    assert_eq!(misses(PolicyKind::FirstInFirstOut, &SILBERSCHATZ_TRACE, 3), 15);
    assert_eq!(misses(PolicyKind::LeastRecentlyUsed, &SILBERSCHATZ_TRACE, 3), 12);
    assert_eq!(misses(PolicyKind::Optimal, &SILBERSCHATZ_TRACE, 3), 9);
}

#[test]
fn fifo_shows_beladys_anomaly() {
    assert_eq!(misses(PolicyKind::FirstInFirstOut, &ANOMALY_TRACE, 3), 9);
    assert_eq!(misses(PolicyKind::FirstInFirstOut, &ANOMALY_TRACE, 4), 10);
}

#[test]
fn saturated_cache_only_has_compulsory_misses() {
    let references = ReferenceString::new(vec![1, 2, 3, 4], 4).unwrap();
    let table = run_policies(&references, defined(4, 4)).unwrap();
    for (policy, result) in table.iter() {
        assert_eq!(result, AccessResult::new(4, 4), "{policy}");
    }
}

#[test]
fn zero_frames_miss_every_reference() {
    for policy in PolicyKind::ALL {
        assert_eq!(policy.simulate(&TEXTBOOK_TRACE, 0), AccessResult::new(9, 9), "{policy}");
    }
}

#[test]
fn empty_reference_string() {
    for policy in PolicyKind::ALL {
        assert_eq!(policy.simulate(&[], 3), AccessResult::ZERO, "{policy}");
    }
}

#[test]
fn cache_never_exceeds_capacity() {
    let mut cache = PolicyKind::Optimal.build_cache(&SILBERSCHATZ_TRACE, 3);
    for (position, &page) in SILBERSCHATZ_TRACE.iter().enumerate() {
        cache.reference(position, page);
        assert!(cache.resident_count() <= cache.capacity());
    }
    assert_eq!(cache.resident_count(), 3);
}

#[test]
fn undefined_geometry_short_circuits() {
    let references = ReferenceString::new(TEXTBOOK_TRACE.to_vec(), 5).unwrap();
    let table = run_policies(&references, Geometry::Undefined).unwrap();
    assert_eq!(table, ResultTable::undefined());
    for policy in PolicyKind::ALL {
        assert_eq!(policy.simulate_geometry(&references, Geometry::Undefined), AccessResult::UNDEFINED);
    }
}

#[test]
fn threaded_and_inline_runners_agree() {
    let mut rng = StdRng::seed_from_u64(42);
    let references = ReferenceString::generate(12, 100, &mut rng).unwrap();
    for frames in [0, 1, 5, 12, 20] {
        let geometry = defined(12, frames);
        assert_eq!(run_policies(&references, geometry).unwrap(), run_policies_inline(&references, geometry));
    }
}

#[test]
fn geometry_from_raw_counts() {
    assert_eq!(Geometry::from_raw(-1, -1).unwrap(), Geometry::Undefined);
    assert_eq!(Geometry::from_raw(8, 0).unwrap(), defined(8, 0));
    assert!(matches!(
        Geometry::from_raw(-2, 3),
        Err(error::Error::InvalidGeometry { what: "page count", value: -2 })
    ));
    assert!(matches!(Geometry::from_raw(4, -1), Err(error::Error::InvalidConfig(_))));
}

#[test]
fn geometry_for_page_sizes() {
    assert_eq!(Geometry::for_page_size(16, 10, 0), Geometry::Undefined);
    assert_eq!(Geometry::for_page_size(16, 10, 1), defined(10, 16));
    assert_eq!(Geometry::for_page_size(16, 10, 3), defined(4, 5));
    assert_eq!(Geometry::for_page_size(16, 10, 10), defined(1, 1));
}

#[test]
fn reference_strings_are_validated() {
    assert!(ReferenceString::new(vec![1, 2, 3], 3).is_ok());
    match ReferenceString::new(vec![1, 4, 2], 3) {
        Err(error::Error::PageOutOfRange { page, position, page_count }) => {
            assert_eq!((page, position, page_count), (4, 1, 3));
        }
        other => panic!("Expected a page out of range, got {other:?}"),
    }
    assert!(ReferenceString::new(vec![0], 3).is_err());
}

#[test]
fn generated_reference_strings_have_the_right_shape() {
    let mut rng = StdRng::seed_from_u64(1);
    let references = ReferenceString::generate(7, 100, &mut rng).unwrap();
    assert_eq!(references.len(), 700);
    assert_eq!(references.page_count(), 7);
    assert!(references.iter().all(|&page| (1..=7).contains(&page)));
    // 700 uniform draws over 7 pages miss one with negligible probability
    for page in 1..=7 {
        assert!(references.contains(&page));
    }
    assert!(ReferenceString::generate(0, 100, &mut rng).unwrap().is_empty());
}

#[test]
fn next_occurrences_point_forward() {
    assert_eq!(next_occurrences(&TEXTBOOK_TRACE), vec![3, 4, 9, 6, 7, 9, 9, 9, 9]);
    assert!(next_occurrences(&[]).is_empty());
}

#[test]
fn aggregating_two_tables() {
    let mut first = ResultTable::default();
    first[PolicyKind::FirstInFirstOut] = AccessResult::new(2, 5);
    let mut second = ResultTable::default();
    second[PolicyKind::FirstInFirstOut] = AccessResult::new(3, 5);

    let mut row = AggregateRow::new(3, defined(4, 2));
    row.fold(&first);
    row.fold(&second);
    assert_eq!(row.results[PolicyKind::FirstInFirstOut], AccessResult::new(5, 10));
    assert_eq!(row.processes, 2);
}

#[test]
fn undefined_results_absorb_aggregation() {
    let mut row = AggregateRow::new(0, Geometry::Undefined);
    for _ in 0..5 {
        row.fold(&ResultTable::undefined());
    }
    assert_eq!(row.results, ResultTable::undefined());
    assert_eq!(AccessResult::UNDEFINED + AccessResult::new(1, 2), AccessResult::UNDEFINED);
    assert_eq!(row.results[PolicyKind::Optimal].hit_rate(), None);
}

#[test]
fn partial_rows_merge() {
    let table = ResultTable::from_fn(|policy| AccessResult::new(policy.id() as u64, 10));
    let mut left = AggregateRow::new(2, defined(5, 4));
    left.fold(&table);
    let mut right = AggregateRow::new(2, defined(5, 4));
    right.fold(&table);
    right.fold(&table);
    let merged = left.merge(&right);
    assert_eq!(merged.processes, 3);
    assert_eq!(merged.results[PolicyKind::MostRecentlyUsed], AccessResult::new(12, 30));
}

#[test]
fn policy_ids_follow_column_order() {
    let ids: Vec<usize> = PolicyKind::ALL.iter().map(|p| p.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(PolicyKind::Optimal.to_string(), "OPT");
    assert_eq!(PolicyKind::MostRecentlyUsed.to_string(), "MRU");
}

#[test]
fn sweep_has_one_row_per_page_size() -> Result<(), Box<dyn Error>> {
    let config = SweepConfig::new(6, 3, 4).with_seed(11).with_references_per_page(20);
    let report = Sweep::new(config)?.run()?;
    assert_eq!(report.rows().len(), 5);
    let first = report.row(0).unwrap();
    assert_eq!(first.geometry, Geometry::Undefined);
    assert_eq!(first.results, ResultTable::undefined());
    for row in &report.rows()[1..] {
        assert_eq!(row.processes, 3);
        let Geometry::Defined { pages, .. } = row.geometry else {
            panic!("Page size {} should be defined", row.page_size);
        };
        for (policy, result) in row.results.iter() {
            assert_eq!(result.total, (3 * 20 * pages) as i64, "{policy}");
            assert!(result.misses <= result.total);
            assert!(result.misses >= 0);
            assert!(row.results[PolicyKind::Optimal].misses <= result.misses);
        }
    }
    Ok(())
}

#[test]
fn seeded_sweeps_are_reproducible_across_workers() -> Result<(), Box<dyn Error>> {
    let config = SweepConfig::new(12, 7, 9).with_seed(2024).with_references_per_page(10);
    let serial = Sweep::new(config.clone())?.run()?;
    let parallel = Sweep::new(config.clone().with_workers(3))?.run()?;
    let inline = Sweep::new(config.clone().with_parallel_policies(false).with_workers(8))?.run()?;
    let again = Sweep::new(config)?.run()?;
    assert_eq!(serial, parallel);
    assert_eq!(serial, inline);
    assert_eq!(serial, again);
    Ok(())
}

#[test]
fn history_records_the_seed_used() -> Result<(), Box<dyn Error>> {
    let mut history = History::new();
    assert!(history.latest().is_none());
    let mut sweep = Sweep::new(SweepConfig::new(4, 2, 4).with_references_per_page(5))?;
    let seed = sweep.seed();
    sweep.run_into(&mut history)?;
    Sweep::new(SweepConfig::new(2, 1, 2).with_seed(3))?.run_into(&mut history)?;
    assert_eq!(history.len(), 2);

    let (config, _) = history.iter().next().unwrap();
    assert_eq!(config.seed, Some(seed));
    let replayed = Sweep::new(config.clone())?.run()?;
    assert_eq!(&replayed, history.iter().next().unwrap().1);

    let (latest, report) = history.latest().unwrap();
    assert_eq!(latest.ram_size, 2);
    assert_eq!(report.rows().len(), 3);
    Ok(())
}

#[test]
fn invalid_sweeps_are_rejected() {
    assert!(Sweep::new(SweepConfig::new(4, 0, 4)).is_err());
    assert!(Sweep::new(SweepConfig::new(4, 1, 4).with_workers(0)).is_err());
    assert!(Sweep::new(SweepConfig::new(4, 1, 4).with_references_per_page(0)).is_err());
}

#[test]
fn overflowing_reference_strings_are_rejected() {
    let config = SweepConfig::new(2, 1, 2).with_seed(1).with_references_per_page(usize::MAX);
    assert!(matches!(Sweep::new(config), Err(error::Error::InvalidConfig(_))));

    let mut rng = StdRng::seed_from_u64(0);
    let generated = ReferenceString::generate(2, usize::MAX, &mut rng);
    assert!(matches!(generated, Err(error::Error::InvalidConfig(_))));
    // A single page still fits, the length is only checked, never allocated here
    assert!(crate::reference::reference_count(1, usize::MAX).is_ok());
}

#[test]
fn panicking_policy_worker_fails_the_table() {
    let finished = AtomicUsize::new(0);
    let result = join_policy_workers(|policy| {
        if policy == PolicyKind::LeastRecentlyUsed {
            panic!("simulated failure");
        }
        let result = policy.simulate(&TEXTBOOK_TRACE, 3);
        finished.fetch_add(1, Ordering::SeqCst);
        result
    });
    assert!(matches!(
        result,
        Err(error::Error::WorkerPanicked {
            policy: PolicyKind::LeastRecentlyUsed
        })
    ));
    assert_eq!(finished.load(Ordering::SeqCst), PolicyKind::COUNT - 1);
}

#[test]
fn panicking_process_worker_fails_the_page_size() {
    let geometry = defined(4, 2);
    let finished = AtomicUsize::new(0);
    let result = join_process_workers(3, geometry, vec![0..2, 2..4, 4..5], |range| {
        if range.start == 2 {
            panic!("simulated failure");
        }
        let mut row = AggregateRow::new(3, geometry);
        for _ in range {
            row.fold(&ResultTable::default());
        }
        finished.fetch_add(1, Ordering::SeqCst);
        Ok(row)
    });
    assert!(matches!(
        result,
        Err(error::Error::ProcessWorkerPanicked { worker: 1, page_size: 3 })
    ));
    assert_eq!(finished.load(Ordering::SeqCst), 2);

    let merged = join_process_workers(3, geometry, vec![0..2, 2..5], |range| {
        let mut row = AggregateRow::new(3, geometry);
        for _ in range {
            row.fold(&ResultTable::default());
        }
        Ok(row)
    })
    .unwrap();
    assert_eq!(merged.processes, 5);
}

#[test]
fn config_defaults_from_json() -> Result<(), Box<dyn Error>> {
    let json = r#"{ "ram_size": 32, "process_count": 4, "process_size": 20 }"#;
    let config = Config::from_reader(json.as_bytes())?;
    assert_eq!(config.sweep, SweepConfig::new(32, 4, 20));
    assert_eq!(config.sweep.max_page_size(), 20);
    assert_eq!(config.logging.level, "warn");
    assert!(config.logging.timestamps);

    let invalid = r#"{ "ram_size": 32, "process_count": 0, "process_size": 20 }"#;
    assert!(matches!(Config::from_reader(invalid.as_bytes()), Err(error::Error::InvalidConfig(_))));
    assert!(matches!(Config::from_reader("{".as_bytes()), Err(error::Error::Json(_))));
    Ok(())
}

#[test]
fn prompted_input() {
    let mut prompts = Vec::new();
    let config = prompt_sweep_config("\n3\n\n10\n6\n".as_bytes(), &mut prompts).unwrap();
    assert_eq!(config, SweepConfig::new(10, 3, 6));
    assert_eq!(String::from_utf8(prompts).unwrap().lines().count(), 3);

    assert!(prompt_sweep_config("3\nten\n".as_bytes(), Vec::<u8>::new()).is_err());
    assert!(prompt_sweep_config("3 4\n".as_bytes(), Vec::<u8>::new()).is_err());
}

#[test]
fn table_rendering() -> Result<(), Box<dyn Error>> {
    let report = Sweep::new(SweepConfig::new(3, 2, 3).with_seed(5).with_references_per_page(10))?.run()?;
    let table = render_table(&report);
    let lines: Vec<&str> = table.lines().collect();
    // Rule, header, four page sizes, rule
    assert_eq!(lines.len(), 7);
    assert!(lines[0].chars().all(|c| c == '-'));
    assert_eq!(lines[0].len(), lines[1].len());
    assert!(lines[1].starts_with("| Page Size | OPT(Hit Rate) | FIFO(Hit Rate) | LRU(Hit Rate) | MRU(Hit Rate) |"));
    assert!(lines[2].starts_with("| 0         | n/a"));
    assert!(lines.iter().all(|line| line.len() == lines[0].len()));
    Ok(())
}

#[test]
fn report_serialises_per_policy() -> Result<(), Box<dyn Error>> {
    let report = Sweep::new(SweepConfig::new(2, 1, 2).with_seed(9).with_references_per_page(4))?.run()?;
    let value = serde_json::to_value(&report)?;
    let rows = value["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["results"]["OPT"]["misses"], -1);
    assert_eq!(rows[0]["geometry"]["frames"], -1);
    assert_eq!(rows[2]["geometry"]["pages"], 1);
    assert_eq!(rows[2]["results"]["LRU"]["total"], 4);
    Ok(())
}

#[test]
fn error_display() {
    let err = error::Error::WorkerPanicked { policy: PolicyKind::LeastRecentlyUsed };
    assert_eq!(err.to_string(), "the LRU worker panicked while simulating");
    let err = error::Error::InvalidGeometry { what: "frame count", value: -5 };
    assert_eq!(err.to_string(), "invalid frame count: -5, expected a non-negative value or -1");
}
