use std::ops::Deref;
use std::sync::Arc;

use rand::Rng;

use crate::error::{Error, Result};

/// Identifies a page within a process's address space, in `1..=page_count`
pub type PageId = u32;

/// The default number of references generated per page of the process
pub const REFERENCES_PER_PAGE: usize = 100;

/// An immutable, cheaply cloneable sequence of page references for one process
///
/// Every reference is validated to lie in `1..=page_count` on construction, so the policies can
/// rely on it without checking
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ReferenceString {
    pages: Arc<[PageId]>,
    page_count: usize,
}

impl ReferenceString {
    /// Creates a reference string for a process with `page_count` pages
    ///
    /// # Examples
    ///
    /// ```
    /// use pagesim::reference::ReferenceString;
    /// let stream = ReferenceString::new(vec![1, 2, 3, 1], 3).unwrap();
    /// assert_eq!(stream.len(), 4);
    /// assert!(ReferenceString::new(vec![0, 1], 3).is_err());
    /// ```
    pub fn new(pages: Vec<PageId>, page_count: usize) -> Result<Self> {
        if let Some((position, &page)) = pages
            .iter()
            .enumerate()
            .find(|(_, page)| **page == 0 || **page as usize > page_count)
        {
            return Err(Error::PageOutOfRange {
                page,
                position,
                page_count,
            });
        }
        Ok(Self {
            pages: pages.into(),
            page_count,
        })
    }

    /// Generates `references_per_page * page_count` references, each drawn uniformly from
    /// `1..=page_count`
    ///
    /// Fails if the reference string would have more than `usize::MAX` references
    pub fn generate<G: Rng>(page_count: usize, references_per_page: usize, rng: &mut G) -> Result<Self> {
        let length = reference_count(page_count, references_per_page)?;
        let pages = if page_count == 0 {
            Vec::new()
        } else {
            let upper = PageId::try_from(page_count).unwrap_or(PageId::MAX);
            (0..length).map(|_| rng.gen_range(1..=upper)).collect()
        };
        Ok(Self {
            pages: pages.into(),
            page_count,
        })
    }

    /// The number of pages in the process's address space
    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

impl Deref for ReferenceString {
    type Target = [PageId];

    fn deref(&self) -> &[PageId] {
        &self.pages
    }
}

/// The length of a generated reference string, `page_count * references_per_page`
pub fn reference_count(page_count: usize, references_per_page: usize) -> Result<usize> {
    page_count.checked_mul(references_per_page).ok_or_else(|| {
        Error::InvalidConfig(format!(
            "{page_count} pages with {references_per_page} references each overflows the reference string length"
        ))
    })
}
