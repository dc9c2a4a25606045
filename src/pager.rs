use std::fmt;
use std::num::NonZeroUsize;

/// Number of rows on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageSize {
    Rows(NonZeroUsize),
    Unbounded,
}

pub const PAGE_SIZE_OPTIONS: [PageSize; 5] = [
    PageSize::Rows(NonZeroUsize::new(10).unwrap()),
    PageSize::Rows(NonZeroUsize::new(25).unwrap()),
    PageSize::Rows(NonZeroUsize::new(50).unwrap()),
    PageSize::Rows(NonZeroUsize::new(100).unwrap()),
    PageSize::Unbounded,
];

impl Default for PageSize {
    fn default() -> Self {
        PAGE_SIZE_OPTIONS[0]
    }
}

impl PageSize {
    /// `0` means a single page holding all rows.
    pub fn from_count(count: usize) -> Self {
        NonZeroUsize::new(count).map_or(PageSize::Unbounded, PageSize::Rows)
    }

    /// Neighbouring entry of `PAGE_SIZE_OPTIONS`, clamped at both ends.
    /// Sizes that are not an option jump to the nearest option in that direction.
    pub fn cycle(self, forward: bool) -> Self {
        let mut options = PAGE_SIZE_OPTIONS.iter().copied();
        if forward {
            options.find(|o| *o > self).unwrap_or(self)
        } else {
            options.filter(|o| *o < self).last().unwrap_or(self)
        }
    }
}

impl PartialOrd for PageSize {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        use PageSize::*;
        match (self, other) {
            (Rows(a), Rows(b)) => a.partial_cmp(b),
            (Rows(_), Unbounded) => Some(std::cmp::Ordering::Less),
            (Unbounded, Rows(_)) => Some(std::cmp::Ordering::Greater),
            (Unbounded, Unbounded) => Some(std::cmp::Ordering::Equal),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Rows(n) => write!(f, "{n}"),
            PageSize::Unbounded => write!(f, "All"),
        }
    }
}

/// `max(1, ceil(nrows / size))`. An empty row set still has one (empty) page.
pub fn total_pages(nrows: usize, size: PageSize) -> usize {
    match size {
        PageSize::Rows(n) => nrows.div_ceil(n.get()).max(1),
        PageSize::Unbounded => 1,
    }
}

/// Rows of the 1-based `page`. Pages past the end are empty.
pub fn page_slice<T>(rows: &[T], page: usize, size: PageSize) -> &[T] {
    match size {
        PageSize::Rows(n) => {
            let start = page.saturating_sub(1).saturating_mul(n.get()).min(rows.len());
            let end = start.saturating_add(n.get()).min(rows.len());
            &rows[start..end]
        }
        PageSize::Unbounded => rows,
    }
}

/// Current page and page size. Navigation never leaves `1..=total_pages`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pager {
    pub page: usize,
    pub size: PageSize,
}

impl Pager {
    pub fn new(size: PageSize) -> Self {
        Self { page: 1, size }
    }

    pub fn with_size(self, size: PageSize) -> Self {
        Self::new(size)
    }

    pub fn reset(self) -> Self {
        Self { page: 1, ..self }
    }

    pub fn total_pages(&self, nrows: usize) -> usize {
        total_pages(nrows, self.size)
    }

    pub fn previous(self) -> Self {
        if self.page > 1 {
            Self {
                page: self.page - 1,
                ..self
            }
        } else {
            self
        }
    }

    pub fn next(self, nrows: usize) -> Self {
        if self.page < self.total_pages(nrows) {
            Self {
                page: self.page + 1,
                ..self
            }
        } else {
            self
        }
    }

    pub fn first(self) -> Self {
        self.reset()
    }

    pub fn last(self, nrows: usize) -> Self {
        Self {
            page: self.total_pages(nrows),
            ..self
        }
    }

    pub fn slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        page_slice(rows, self.page, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> PageSize {
        PageSize::from_count(n)
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, rows(10)), 1);
        assert_eq!(total_pages(10, rows(10)), 1);
        assert_eq!(total_pages(11, rows(10)), 2);
        assert_eq!(total_pages(3, rows(1)), 3);
        assert_eq!(total_pages(1000, PageSize::Unbounded), 1);
    }

    #[test]
    fn slices_pages() {
        let data: Vec<usize> = (0..7).collect();
        assert_eq!(page_slice(&data, 1, rows(3)), [0, 1, 2]);
        assert_eq!(page_slice(&data, 3, rows(3)), [6]);
        assert_eq!(page_slice(&data, 4, rows(3)), [] as [usize; 0]);
        assert_eq!(page_slice(&data, 2, PageSize::Unbounded), data.as_slice());
    }

    #[test]
    fn empty_rows_have_one_empty_page() {
        let data: Vec<usize> = Vec::new();
        let pager = Pager::new(rows(10));
        assert_eq!(pager.total_pages(0), 1);
        assert!(pager.slice(&data).is_empty());
        assert_eq!(pager.next(0), pager);
    }

    #[test]
    fn pages_concatenate_to_all_rows() {
        for nrows in [0, 1, 9, 10, 11, 57] {
            for size in [rows(1), rows(3), rows(10), PageSize::Unbounded] {
                let data: Vec<usize> = (0..nrows).collect();
                let joined: Vec<usize> = (1..=total_pages(nrows, size))
                    .flat_map(|p| page_slice(&data, p, size).to_vec())
                    .collect();
                assert_eq!(joined, data, "{nrows} rows, size {size}");
            }
        }
    }

    #[test]
    fn navigation_stops_at_bounds() {
        let pager = Pager::new(rows(1));
        assert_eq!(pager.previous(), pager);

        let pager = pager.next(3).next(3);
        assert_eq!(pager.page, 3);
        assert_eq!(pager.next(3).page, 3);
        assert_eq!(pager.first().page, 1);
        assert_eq!(Pager::new(rows(2)).last(5).page, 3);
    }

    #[test]
    fn changing_size_resets_page() {
        let pager = Pager::new(rows(1)).last(5);
        assert_eq!(pager.page, 5);
        let pager = pager.with_size(rows(25));
        assert_eq!(pager, Pager::new(rows(25)));
    }

    #[test]
    fn cycle_page_size() {
        assert_eq!(rows(10).cycle(true), rows(25));
        assert_eq!(rows(10).cycle(false), rows(10));
        assert_eq!(rows(100).cycle(true), PageSize::Unbounded);
        assert_eq!(PageSize::Unbounded.cycle(true), PageSize::Unbounded);
        assert_eq!(PageSize::Unbounded.cycle(false), rows(100));
        assert_eq!(rows(7).cycle(true), rows(10));
        assert_eq!(rows(30).cycle(false), rows(25));
    }

    #[test]
    fn display() {
        assert_eq!(rows(0).to_string(), "All");
        assert_eq!(rows(50).to_string(), "50");
    }
}
