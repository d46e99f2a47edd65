/// Upper bound applied to any requested page size.
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Limit/offset window for paginated reads.
///
/// Deserialized windows pass through [`Pagination::new`], so they are always
/// clamped. Missing fields take the [`Default`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawPagination"))]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct RawPagination {
    limit: i64,
    offset: i64,
}

#[cfg(feature = "serde")]
impl Default for RawPagination {
    fn default() -> Self {
        let Pagination { limit, offset } = Pagination::default();
        Self { limit, offset }
    }
}

#[cfg(feature = "serde")]
impl From<RawPagination> for Pagination {
    fn from(raw: RawPagination) -> Self {
        Pagination::new(raw.limit, raw.offset)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

impl Pagination {
    /// Builds a window, clamping `limit` into `0..=MAX_PAGE_LIMIT` and
    /// negative offsets to zero.
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.clamp(0, MAX_PAGE_LIMIT),
            offset: offset.max(0),
        }
    }

    /// The same window with its bounds clamped. Fields are public, so
    /// storage code calls this before using a window it did not build.
    pub fn clamped(self) -> Self {
        Self::new(self.limit, self.offset)
    }

    /// Applies the window to an already sorted slice.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let window = self.clamped();
        let start = (window.offset as usize).min(items.len());
        let end = start.saturating_add(window.limit as usize).min(items.len());
        &items[start..end]
    }
}

/// One page of results plus the total number of matching records.
///
/// `total_count` does not depend on the window, so it is identical for
/// every page of the same query at a fixed point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64) -> Self {
        Self { items, total_count }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
        }
    }
}
