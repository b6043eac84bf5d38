use serde::Serialize;

use crate::error::{Error, Result};

/// The raw value used for frame and page counts when the page size is undefined
pub const UNDEFINED: i64 = -1;

/// The frame and page counts of one process for one page size
///
/// A page size of 0 has no meaningful geometry, in which case both counts are undefined and no
/// simulation runs. Serialises to the raw counts, with `-1` for the undefined case
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Geometry {
    Undefined,
    Defined { pages: usize, frames: usize },
}

impl Geometry {
    /// Builds a geometry from raw counts, where `-1` is the undefined sentinel
    ///
    /// Both counts must be the sentinel or neither; any other negative value is rejected
    ///
    /// # Examples
    ///
    /// ```
    /// use pagesim::geometry::Geometry;
    /// assert_eq!(Geometry::from_raw(-1, -1).unwrap(), Geometry::Undefined);
    /// assert_eq!(Geometry::from_raw(10, 4).unwrap(), Geometry::Defined { pages: 10, frames: 4 });
    /// assert!(Geometry::from_raw(10, -3).is_err());
    /// ```
    pub fn from_raw(pages: i64, frames: i64) -> Result<Self> {
        let pages = Self::checked_count("page count", pages)?;
        let frames = Self::checked_count("frame count", frames)?;
        match (pages, frames) {
            (None, None) => Ok(Geometry::Undefined),
            (Some(pages), Some(frames)) => Ok(Geometry::Defined { pages, frames }),
            (pages, frames) => Err(Error::InvalidConfig(format!(
                "page count {} and frame count {} must both be defined or both be -1",
                Self::raw(pages),
                Self::raw(frames)
            ))),
        }
    }

    /// The geometry of a process of `process_size` units on a RAM of `ram_size` units, split into
    /// pages of `page_size` units. The last page may be partial
    ///
    /// # Examples
    ///
    /// ```
    /// use pagesim::geometry::Geometry;
    /// assert_eq!(Geometry::for_page_size(10, 7, 3), Geometry::Defined { pages: 3, frames: 3 });
    /// assert_eq!(Geometry::for_page_size(10, 7, 0), Geometry::Undefined);
    /// ```
    pub fn for_page_size(ram_size: usize, process_size: usize, page_size: usize) -> Self {
        if page_size == 0 {
            return Geometry::Undefined;
        }
        Geometry::Defined {
            pages: process_size.div_ceil(page_size),
            frames: ram_size / page_size,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Geometry::Undefined)
    }

    /// The raw page count, `-1` when undefined
    pub fn raw_pages(&self) -> i64 {
        match self {
            Geometry::Undefined => UNDEFINED,
            Geometry::Defined { pages, .. } => *pages as i64,
        }
    }

    /// The raw frame count, `-1` when undefined
    pub fn raw_frames(&self) -> i64 {
        match self {
            Geometry::Undefined => UNDEFINED,
            Geometry::Defined { frames, .. } => *frames as i64,
        }
    }

    fn checked_count(what: &'static str, value: i64) -> Result<Option<usize>> {
        match value {
            UNDEFINED => Ok(None),
            v if v < 0 => Err(Error::InvalidGeometry { what, value }),
            v => usize::try_from(v)
                .map(Some)
                .map_err(|_| Error::InvalidGeometry { what, value }),
        }
    }

    fn raw(count: Option<usize>) -> i64 {
        count.map_or(UNDEFINED, |c| c as i64)
    }
}

#[derive(Serialize)]
struct RawGeometry {
    pages: i64,
    frames: i64,
}

impl Serialize for Geometry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RawGeometry {
            pages: self.raw_pages(),
            frames: self.raw_frames(),
        }
        .serialize(serializer)
    }
}
