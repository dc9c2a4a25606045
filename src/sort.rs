use std::cmp::{Ordering, Reverse};
use tracing::trace;

use crate::filter::parse_number;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

/// Next sort state after the user picked `column`.
///
/// The picked column cycles ascending -> descending -> unsorted. Picking a
/// different column always starts ascending on that column.
pub fn toggle(current: Option<SortState>, column: usize) -> Option<SortState> {
    match current {
        Some(SortState {
            column: c,
            direction: SortDirection::Ascending,
        }) if c == column => Some(SortState {
            column,
            direction: SortDirection::Descending,
        }),
        Some(SortState {
            column: c,
            direction: SortDirection::Descending,
        }) if c == column => None,
        _ => Some(SortState {
            column,
            direction: SortDirection::Ascending,
        }),
    }
}

/// Sort key of a single cell.
///
/// Empty cells come first, then numbers in numeric order, then all other
/// cells as lower-cased strings. Keys of one column form a total order.
#[derive(Debug, Clone)]
enum SortKey {
    Empty,
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(cell: &str) -> Self {
        if cell.is_empty() {
            return SortKey::Empty;
        }
        match parse_number(cell) {
            Some(value) => SortKey::Number(value),
            None => SortKey::Text(cell.to_lowercase()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Empty => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // parse_number never yields NaN
            (SortKey::Number(a), SortKey::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

/// Stable sort of row indices by the cells of the sort column.
pub fn sort_rows(table: &Table, rows: &mut [usize], sort: Option<SortState>) {
    let Some(SortState { column, direction }) = sort else {
        return;
    };
    trace!("Sorting {} rows by column {} {:?}", rows.len(), column, direction);
    match direction {
        SortDirection::Ascending => {
            rows.sort_by_cached_key(|&ridx| SortKey::of(table.cell(ridx, column)))
        }
        SortDirection::Descending => {
            rows.sort_by_cached_key(|&ridx| Reverse(SortKey::of(table.cell(ridx, column))))
        }
    }
}
