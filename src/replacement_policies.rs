use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::reference::PageId;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// The cache owns residency, the policy only decides which resident page goes next. Positions are
/// indices into the reference string being simulated, and strictly increase between calls
pub trait ReplacementPolicy {
    /// Updates the policy when a resident page is referenced again
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    ///
    /// # Arguments
    ///
    /// * `page`: The page which was referenced
    /// * `position`: The index of the reference in the reference string
    ///
    /// returns: ()
    fn update_on_hit(&mut self, _page: PageId, _position: usize) {}

    /// Records that a page has just been loaded into a free frame
    ///
    /// # Arguments
    ///
    /// * `page`: The page which was loaded
    /// * `position`: The index of the reference which caused the load
    ///
    /// returns: ()
    fn record_load(&mut self, page: PageId, position: usize);

    /// Used by the cache to pick a victim when a page must be loaded into a full cache.
    ///
    /// Implementations must forget the returned page; the cache assumes it has been evicted.
    /// Returns None only if the policy tracks no pages, which the cache never allows when full
    fn evict(&mut self) -> Option<PageId>;
}

/// First in, first out. Evicts the page which was loaded the longest time ago, regardless of any
/// hits since
#[derive(Default)]
pub struct FirstInFirstOut {
    load_order: VecDeque<PageId>,
}

impl FirstInFirstOut {
    pub fn new(capacity: usize) -> Self {
        Self {
            load_order: VecDeque::with_capacity(capacity),
        }
    }
}

impl ReplacementPolicy for FirstInFirstOut {
    fn record_load(&mut self, page: PageId, _position: usize) {
        self.load_order.push_back(page);
    }

    fn evict(&mut self) -> Option<PageId> {
        self.load_order.pop_front()
    }
}

/// Orders resident pages by the position of their most recent reference
///
/// Positions are unique, so both ends of the order are always well defined. This gives the same
/// victims as scanning every resident page for the smallest or largest position, in logarithmic
/// rather than linear time
#[derive(Default)]
struct RecencyIndex {
    by_position: BTreeMap<usize, PageId>,
    last_reference: HashMap<PageId, usize>,
}

impl RecencyIndex {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            by_position: BTreeMap::new(),
            last_reference: HashMap::with_capacity(capacity),
        }
    }

    fn touch(&mut self, page: PageId, position: usize) {
        if let Some(previous) = self.last_reference.insert(page, position) {
            self.by_position.remove(&previous);
        }
        self.by_position.insert(position, page);
    }

    fn pop_least_recent(&mut self) -> Option<PageId> {
        let (_, page) = self.by_position.pop_first()?;
        self.last_reference.remove(&page);
        Some(page)
    }

    fn pop_most_recent(&mut self) -> Option<PageId> {
        let (_, page) = self.by_position.pop_last()?;
        self.last_reference.remove(&page);
        Some(page)
    }
}

/// Least Recently Used replacement policy
///
/// Hits refresh the recency of a page, and the page whose last reference is the oldest is evicted
#[derive(Default)]
pub struct LeastRecentlyUsed {
    recency: RecencyIndex,
}

impl LeastRecentlyUsed {
    pub fn new(capacity: usize) -> Self {
        Self {
            recency: RecencyIndex::with_capacity(capacity),
        }
    }
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn update_on_hit(&mut self, page: PageId, position: usize) {
        self.recency.touch(page, position);
    }

    fn record_load(&mut self, page: PageId, position: usize) {
        self.recency.touch(page, position);
    }

    fn evict(&mut self) -> Option<PageId> {
        self.recency.pop_least_recent()
    }
}

/// Most Recently Used replacement policy
///
/// The mirror image of LRU: evicts the page referenced most recently. Uniformly random references
/// have no locality for it to exploit, so it only serves as a poor baseline to compare against
#[derive(Default)]
pub struct MostRecentlyUsed {
    recency: RecencyIndex,
}

impl MostRecentlyUsed {
    pub fn new(capacity: usize) -> Self {
        Self {
            recency: RecencyIndex::with_capacity(capacity),
        }
    }
}

impl ReplacementPolicy for MostRecentlyUsed {
    fn update_on_hit(&mut self, page: PageId, position: usize) {
        self.recency.touch(page, position);
    }

    fn record_load(&mut self, page: PageId, position: usize) {
        self.recency.touch(page, position);
    }

    fn evict(&mut self) -> Option<PageId> {
        self.recency.pop_most_recent()
    }
}

/// Belady's optimal replacement policy
///
/// Clairvoyant, so it needs the whole reference string up front. It evicts the resident page whose
/// next reference is furthest in the future, pages which are never referenced again first. No
/// online policy can miss less often on the same reference string
pub struct Optimal {
    next_occurrence: Vec<usize>,
    // (next occurrence, page) for every resident page. The page breaks ties between pages which
    // are never referenced again, which all sit at the end of the reference string
    upcoming: BTreeSet<(usize, PageId)>,
}

impl Optimal {
    /// Builds the policy for a reference string with a single backward pass
    ///
    /// # Arguments
    ///
    /// * `references`: The whole reference string which will be simulated
    ///
    /// returns: Optimal
    pub fn new(references: &[PageId]) -> Self {
        Self {
            next_occurrence: next_occurrences(references),
            upcoming: BTreeSet::new(),
        }
    }
}

impl ReplacementPolicy for Optimal {
    fn update_on_hit(&mut self, page: PageId, position: usize) {
        // The resident key for this page was computed at its previous reference, and is exactly
        // this position. It has to go before the refreshed key is added
        let removed = self.upcoming.remove(&(position, page));
        debug_assert!(removed, "page {page} was resident without a key for position {position}");
        self.upcoming.insert((self.next_occurrence[position], page));
    }

    fn record_load(&mut self, page: PageId, position: usize) {
        self.upcoming.insert((self.next_occurrence[position], page));
    }

    fn evict(&mut self) -> Option<PageId> {
        self.upcoming.pop_last().map(|(_, page)| page)
    }
}

/// For each position, the position of the next reference to the same page, or the length of the
/// reference string if there is none
///
/// # Examples
///
/// ```
/// use pagesim::replacement_policies::next_occurrences;
/// assert_eq!(next_occurrences(&[1, 2, 1, 3]), vec![2, 4, 4, 4]);
/// ```
pub fn next_occurrences(references: &[PageId]) -> Vec<usize> {
    let total = references.len();
    let mut next = vec![total; total];
    let mut nearest: HashMap<PageId, usize> = HashMap::new();
    for (position, &page) in references.iter().enumerate().rev() {
        if let Some(&upcoming) = nearest.get(&page) {
            next[position] = upcoming;
        }
        nearest.insert(page, position);
    }
    next
}
