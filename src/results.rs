use std::ops::{Add, AddAssign, Index, IndexMut};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::cache::PolicyKind;
use crate::geometry::Geometry;

/// Misses out of total references for one policy. Can be serialised to the JSON report
///
/// `(-1, -1)` is the sentinel for an undefined page size, where no simulation ran. The sentinel is
/// absorbing when results are added together, so it survives aggregation unchanged instead of
/// turning into a negative total
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct AccessResult {
    pub misses: i64,
    pub total: i64,
}

impl AccessResult {
    pub const UNDEFINED: Self = Self { misses: -1, total: -1 };
    pub const ZERO: Self = Self { misses: 0, total: 0 };

    pub fn new(misses: u64, total: u64) -> Self {
        debug_assert!(misses <= total, "{misses} misses out of {total} references");
        Self {
            misses: misses as i64,
            total: total as i64,
        }
    }

    pub fn is_undefined(&self) -> bool {
        *self == Self::UNDEFINED
    }

    pub fn hits(&self) -> Option<i64> {
        (!self.is_undefined()).then(|| self.total - self.misses)
    }

    /// The fraction of references which hit, or None for the undefined sentinel and for results
    /// with no references at all
    ///
    /// # Examples
    ///
    /// ```
    /// use pagesim::results::AccessResult;
    /// assert_eq!(AccessResult::new(1, 4).hit_rate(), Some(0.75));
    /// assert_eq!(AccessResult::UNDEFINED.hit_rate(), None);
    /// assert_eq!(AccessResult::ZERO.hit_rate(), None);
    /// ```
    pub fn hit_rate(&self) -> Option<f64> {
        match self.hits() {
            Some(hits) if self.total > 0 => Some(hits as f64 / self.total as f64),
            _ => None,
        }
    }
}

impl Default for AccessResult {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for AccessResult {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.is_undefined() || rhs.is_undefined() {
            return Self::UNDEFINED;
        }
        Self {
            misses: self.misses + rhs.misses,
            total: self.total + rhs.total,
        }
    }
}

impl AddAssign for AccessResult {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// One result per policy, indexed by policy rather than by the order the policies finished in
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct ResultTable {
    results: [AccessResult; PolicyKind::COUNT],
}

impl ResultTable {
    /// The table for an undefined page size, every policy reports the sentinel
    pub fn undefined() -> Self {
        Self {
            results: [AccessResult::UNDEFINED; PolicyKind::COUNT],
        }
    }

    pub fn from_fn<F: FnMut(PolicyKind) -> AccessResult>(mut f: F) -> Self {
        let mut table = Self::default();
        for policy in PolicyKind::ALL {
            table[policy] = f(policy);
        }
        table
    }

    pub fn iter(&self) -> impl Iterator<Item = (PolicyKind, AccessResult)> + '_ {
        PolicyKind::ALL.into_iter().map(|policy| (policy, self[policy]))
    }
}

impl Index<PolicyKind> for ResultTable {
    type Output = AccessResult;

    fn index(&self, policy: PolicyKind) -> &AccessResult {
        &self.results[policy.index()]
    }
}

impl IndexMut<PolicyKind> for ResultTable {
    fn index_mut(&mut self, policy: PolicyKind) -> &mut AccessResult {
        &mut self.results[policy.index()]
    }
}

impl Add for ResultTable {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_fn(|policy| self[policy] + rhs[policy])
    }
}

impl AddAssign<&ResultTable> for ResultTable {
    fn add_assign(&mut self, rhs: &ResultTable) {
        for policy in PolicyKind::ALL {
            self[policy] += rhs[policy];
        }
    }
}

impl Serialize for ResultTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PolicyKind::COUNT))?;
        for (policy, result) in self.iter() {
            map.serialize_entry(policy.name(), &result)?;
        }
        map.end()
    }
}

/// The results of every process for one page size, summed per policy
///
/// Folding is a field-wise sum, so tables can be folded in any order, and rows built from disjoint
/// sets of processes can be merged afterwards with the same outcome
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct AggregateRow {
    pub page_size: usize,
    pub geometry: Geometry,
    pub processes: usize,
    pub results: ResultTable,
}

impl AggregateRow {
    pub fn new(page_size: usize, geometry: Geometry) -> Self {
        Self {
            page_size,
            geometry,
            processes: 0,
            results: ResultTable::default(),
        }
    }

    /// Folds the result table of one more process into the row
    pub fn fold(&mut self, table: &ResultTable) {
        self.results += table;
        self.processes += 1;
    }

    /// Merges two partial rows for the same page size
    pub fn merge(mut self, other: &AggregateRow) -> Self {
        debug_assert_eq!(self.page_size, other.page_size);
        self.results += &other.results;
        self.processes += other.processes;
        self
    }
}

/// The outcome of a sweep, one row per page size from 0 upwards
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Report {
    ram_size: usize,
    process_size: usize,
    rows: Vec<AggregateRow>,
}

impl Report {
    pub fn new(ram_size: usize, process_size: usize) -> Self {
        Self {
            ram_size,
            process_size,
            rows: Vec::with_capacity(ram_size.min(process_size) + 1),
        }
    }

    pub fn push(&mut self, row: AggregateRow) {
        debug_assert_eq!(row.page_size, self.rows.len(), "rows must be pushed in page size order");
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    pub fn row(&self, page_size: usize) -> Option<&AggregateRow> {
        self.rows.get(page_size)
    }

    pub fn ram_size(&self) -> usize {
        self.ram_size
    }

    pub fn process_size(&self) -> usize {
        self.process_size
    }
}
