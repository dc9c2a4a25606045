use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use thiserror::Error;

use crate::pager::PageSize;
use crate::table::Table;

#[derive(Debug, Error)]
pub enum TVError {
    #[error("I/O error: {0}")]
    IoError(#[from] Error),
    #[error("Failed to decode data: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Loading failed: {0}")]
    LoadingFailed(String),
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid path \"{0}\"")]
    InvalidPath(String),
}

#[derive(Debug, Clone, Setters)]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub page_size: PageSize,
    pub max_column_width: usize,
}

impl Default for TVConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            page_size: PageSize::default(),
            max_column_width: 30,
        }
    }
}

/// Everything the user can ask the viewer to do.
///
/// `Open` and `CopyRows` involve I/O and are resolved by the controller,
/// all other messages are handled by `Model::update`.
#[derive(Debug, Clone)]
pub enum Message {
    Open(PathBuf),
    Loaded { name: String, table: Table },
    LoadFailed(String),
    SetFilter(usize, String),
    ClearFilters,
    ToggleSort(usize),
    SortSelected,
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    SetPageSize(PageSize),
    CyclePageSize(bool),
    MoveLeft,
    MoveRight,
    CopyRows,
    Status(String),
    Help,
    Exit,
    Quit,
}

/// Which prompt currently owns the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    Filter(usize),
    Open,
}

pub const HELP_TEXT: &str = "\
tabview - CSV / Parquet viewer

  q            quit
  ← → / h l    select column
  s / Enter    sort selected column (asc → desc → off)
  f / '/'      filter selected column
               text:    case-insensitive substring
               >=5 <0 =3.5 ...   numeric comparison
  c            clear all filters
  n / PgDn     next page
  p / PgUp     previous page
  g / Home     first page
  G / End      last page
  + / -        change page size
  a            all rows on one page
  o            open another file
  y            copy filtered rows as CSV
  ?            this help
  Esc          close help / cancel prompt";
