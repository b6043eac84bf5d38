use std::collections::HashSet;
use std::fmt;

use crate::geometry::Geometry;
use crate::reference::{PageId, ReferenceString};
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, MostRecentlyUsed, Optimal, ReplacementPolicy};
use crate::results::AccessResult;

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch instead of dyn Cache, but it keeps the
/// concrete caches and GenericCache interchangeable for the runner and the benchmarks
pub trait CacheTrait {
    /// References a page, returning true on a cache hit, and false otherwise
    ///
    /// On both hits and misses, the implementation must update residency and its replacement
    /// policy
    ///
    /// # Arguments
    ///
    /// * `position`: The index of the reference in the reference string
    /// * `page`: The page referenced
    ///
    /// returns: bool
    fn reference(&mut self, position: usize, page: PageId) -> bool;

    /// Gets the number of frames in the cache
    fn capacity(&self) -> usize;

    /// Gets the number of frames currently holding a page
    fn resident_count(&self) -> usize;

    /// Runs a whole reference string through the cache, counting the misses
    fn run(&mut self, references: &[PageId]) -> AccessResult {
        let mut misses = 0;
        for (position, &page) in references.iter().enumerate() {
            if !self.reference(position, page) {
                misses += 1;
            }
            debug_assert!(self.resident_count() <= self.capacity());
        }
        AccessResult::new(misses, references.len() as u64)
    }
}

/// A fully associative cache of fixed capacity, parameterised by a replacement policy
///
/// The cache tracks which pages are resident, and asks the policy for a victim only when a page
/// has to be loaded into a full cache. A cache with no frames never holds a page, so every
/// reference to it misses
pub struct Cache<R: ReplacementPolicy> {
    resident: HashSet<PageId>,
    capacity: usize,
    replacement_policy: R,
}

impl<R: ReplacementPolicy> Cache<R> {
    pub fn new(capacity: usize, policy: R) -> Self {
        Self {
            resident: HashSet::with_capacity(capacity),
            capacity,
            replacement_policy: policy,
        }
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    // Cache hit is true, cache miss is false
    fn reference(&mut self, position: usize, page: PageId) -> bool {
        if self.resident.contains(&page) {
            self.replacement_policy.update_on_hit(page, position);
            return true;
        }
        if self.capacity == 0 {
            return false;
        }
        if self.resident.len() == self.capacity {
            let victim = self.replacement_policy.evict();
            debug_assert!(victim.is_some(), "full cache with a policy tracking no pages");
            if let Some(victim) = victim {
                let was_resident = self.resident.remove(&victim);
                debug_assert!(was_resident, "policy evicted page {victim} which isn't resident");
            }
        }
        self.resident.insert(page);
        self.replacement_policy.record_load(page, position);
        false
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn resident_count(&self) -> usize {
        self.resident.len()
    }
}

/// The policies compared by a sweep, in report column order
///
/// This is a fixed enumeration rather than a registry, each variant maps straight onto a
/// concrete cache through GenericCache
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum PolicyKind {
    Optimal,
    FirstInFirstOut,
    LeastRecentlyUsed,
    MostRecentlyUsed,
}

impl PolicyKind {
    pub const COUNT: usize = 4;
    pub const ALL: [PolicyKind; PolicyKind::COUNT] = [
        PolicyKind::Optimal,
        PolicyKind::FirstInFirstOut,
        PolicyKind::LeastRecentlyUsed,
        PolicyKind::MostRecentlyUsed,
    ];

    /// A stable identifier, starting from 1, which is also the report column
    pub fn id(self) -> usize {
        self.index() + 1
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PolicyKind::Optimal => 0,
            PolicyKind::FirstInFirstOut => 1,
            PolicyKind::LeastRecentlyUsed => 2,
            PolicyKind::MostRecentlyUsed => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Optimal => "OPT",
            PolicyKind::FirstInFirstOut => "FIFO",
            PolicyKind::LeastRecentlyUsed => "LRU",
            PolicyKind::MostRecentlyUsed => "MRU",
        }
    }

    /// Creates an empty cache using this policy, ready to run `references`
    ///
    /// Only the optimal policy looks at the references up front
    pub fn build_cache(self, references: &[PageId], capacity: usize) -> GenericCache {
        match self {
            PolicyKind::Optimal => Cache::new(capacity, Optimal::new(references)).into(),
            PolicyKind::FirstInFirstOut => Cache::new(capacity, FirstInFirstOut::new(capacity)).into(),
            PolicyKind::LeastRecentlyUsed => Cache::new(capacity, LeastRecentlyUsed::new(capacity)).into(),
            PolicyKind::MostRecentlyUsed => Cache::new(capacity, MostRecentlyUsed::new(capacity)).into(),
        }
    }

    /// Simulates this policy over a reference string with a given number of frames
    ///
    /// # Examples
    ///
    /// ```
    /// use pagesim::cache::PolicyKind;
    /// let result = PolicyKind::FirstInFirstOut.simulate(&[1, 2, 3, 1, 2, 4, 1, 2, 5], 3);
    /// assert_eq!((result.misses, result.total), (7, 9));
    /// ```
    pub fn simulate(self, references: &[PageId], capacity: usize) -> AccessResult {
        self.build_cache(references, capacity).run(references)
    }

    /// Simulates this policy for a process geometry, short-circuiting to the sentinel result when
    /// the page size is undefined
    pub fn simulate_geometry(self, references: &ReferenceString, geometry: Geometry) -> AccessResult {
        match geometry {
            Geometry::Undefined => AccessResult::UNDEFINED,
            Geometry::Defined { frames, .. } => self.simulate(references, frames),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Enum for all 4 caches provided by the library
///
/// Using trait objects reduces boilerplate, but every reference would then go through dynamic
/// dispatch. Branching explicitly on the implementations lets the compiler reason about the
/// concrete types and inline the policy hooks into the simulation loop
pub enum GenericCache {
    Optimal(Cache<Optimal>),
    FirstInFirstOut(Cache<FirstInFirstOut>),
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    MostRecentlyUsed(Cache<MostRecentlyUsed>),
}

impl From<Cache<Optimal>> for GenericCache {
    fn from(value: Cache<Optimal>) -> Self {
        Self::Optimal(value)
    }
}

impl From<Cache<FirstInFirstOut>> for GenericCache {
    fn from(value: Cache<FirstInFirstOut>) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<MostRecentlyUsed>> for GenericCache {
    fn from(value: Cache<MostRecentlyUsed>) -> Self {
        Self::MostRecentlyUsed(value)
    }
}

impl CacheTrait for GenericCache {
    fn reference(&mut self, position: usize, page: PageId) -> bool {
        match self {
            GenericCache::Optimal(c) => c.reference(position, page),
            GenericCache::FirstInFirstOut(c) => c.reference(position, page),
            GenericCache::LeastRecentlyUsed(c) => c.reference(position, page),
            GenericCache::MostRecentlyUsed(c) => c.reference(position, page),
        }
    }

    // Dispatch once for the whole run rather than once per reference
    fn run(&mut self, references: &[PageId]) -> AccessResult {
        match self {
            GenericCache::Optimal(c) => c.run(references),
            GenericCache::FirstInFirstOut(c) => c.run(references),
            GenericCache::LeastRecentlyUsed(c) => c.run(references),
            GenericCache::MostRecentlyUsed(c) => c.run(references),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            GenericCache::Optimal(c) => c.capacity(),
            GenericCache::FirstInFirstOut(c) => c.capacity(),
            GenericCache::LeastRecentlyUsed(c) => c.capacity(),
            GenericCache::MostRecentlyUsed(c) => c.capacity(),
        }
    }

    fn resident_count(&self) -> usize {
        match self {
            GenericCache::Optimal(c) => c.resident_count(),
            GenericCache::FirstInFirstOut(c) => c.resident_count(),
            GenericCache::LeastRecentlyUsed(c) => c.resident_count(),
            GenericCache::MostRecentlyUsed(c) => c.resident_count(),
        }
    }
}
