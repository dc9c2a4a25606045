use rayon::prelude::*;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use crate::table::Table;

static COMPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(>=|<=|>|<|=)\s*(-?[0-9]+(\.[0-9]+)?)$").expect("valid comparator regex")
});

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?)(Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
        .expect("valid number regex")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparator {
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
}

impl Comparator {
    fn holds(&self, value: f64, reference: f64) -> bool {
        match self {
            Comparator::Greater => value > reference,
            Comparator::GreaterEqual => value >= reference,
            Comparator::Less => value < reference,
            Comparator::LessEqual => value <= reference,
            Comparator::Equal => value == reference,
        }
    }
}

/// A single column filter, compiled from the text the user typed.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFilter {
    Numeric(Comparator, f64),
    /// Lower-cased needle.
    Substring(String),
}

impl ColumnFilter {
    /// Returns `None` for an empty filter text. Anything that does not look
    /// like a comparison falls back to a substring filter.
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        if let Some(caps) = COMPARATOR.captures(text.trim()) {
            let comparator = match &caps[1] {
                ">=" => Comparator::GreaterEqual,
                "<=" => Comparator::LessEqual,
                ">" => Comparator::Greater,
                "<" => Comparator::Less,
                _ => Comparator::Equal,
            };
            if let Ok(value) = caps[2].parse::<f64>() {
                return Some(ColumnFilter::Numeric(comparator, value));
            }
        }
        Some(ColumnFilter::Substring(text.to_lowercase()))
    }

    pub fn matches(&self, cell: &str) -> bool {
        match self {
            ColumnFilter::Numeric(comparator, reference) => match parse_leading_number(cell) {
                Some(value) => comparator.holds(value, *reference),
                None => false,
            },
            ColumnFilter::Substring(needle) => cell.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Parses a whole cell as a number, surrounding whitespace allowed.
///
/// Accepts decimal and exponent notation and `Infinity` with an optional
/// sign. Rust only spellings like `inf` or `NaN` are not numbers.
pub fn parse_number(cell: &str) -> Option<f64> {
    let text = cell.trim();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    if unsigned == "Infinity" {
        return Some(signed_infinity(text));
    }
    if !unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Reads the number at the start of a cell and ignores whatever follows,
/// so `"12 kg"` is 12. `None` when the cell does not start with a number.
pub fn parse_leading_number(cell: &str) -> Option<f64> {
    let caps = LEADING_NUMBER.captures(cell)?;
    if &caps[2] == "Infinity" {
        return Some(signed_infinity(&caps[1]));
    }
    format!("{}{}", &caps[1], &caps[2]).parse::<f64>().ok()
}

fn signed_infinity(text: &str) -> f64 {
    if text.starts_with('-') {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    }
}

/// Compiled filters of all columns that have a non-empty filter text.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<(usize, ColumnFilter)>,
}

impl FilterSet {
    pub fn compile(texts: &[String]) -> Self {
        let filters = texts
            .iter()
            .enumerate()
            .filter_map(|(cidx, text)| ColumnFilter::parse(text).map(|f| (cidx, f)))
            .collect();
        Self { filters }
    }

    pub fn is_active(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn matches(&self, table: &Table, ridx: usize) -> bool {
        self.filters
            .iter()
            .all(|(cidx, filter)| filter.matches(table.cell(ridx, *cidx)))
    }
}

/// Keep the rows (indices into `table`) that satisfy every filter, in order.
pub fn filter_rows(table: &Table, rows: &[usize], filters: &FilterSet) -> Vec<usize> {
    if !filters.is_active() {
        return rows.to_vec();
    }
    let matches: Vec<usize> = rows
        .par_iter()
        .copied()
        .filter(|&ridx| filters.matches(table, ridx))
        .collect();
    trace!("Filter kept {} of {} rows", matches.len(), rows.len());
    matches
}
