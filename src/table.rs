use polars::prelude::*;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument, trace};

use crate::domain::TVError;

#[derive(Debug, PartialEq)]
enum FileType {
    TEXT,
    PARQUET,
}

/// Header plus rows of string cells, as loaded from a file.
///
/// Rows are expected to be as long as the header, but nothing enforces it.
/// Use `cell` to read a value, it treats missing cells as empty strings.
#[derive(Clone, Default, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from column-major data, e.g. decoded columnar files.
    pub fn from_columns(header: Vec<String>, columns: Vec<Vec<String>>) -> Self {
        let nrows = columns.iter().map(|c| c.len()).max().unwrap_or(0);
        let rows = (0..nrows)
            .map(|ridx| {
                columns
                    .iter()
                    .map(|c| c.get(ridx).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Self { header, rows }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn row(&self, ridx: usize) -> &[String] {
        self.rows.get(ridx).map(|r| r.as_slice()).unwrap_or(&[])
    }

    pub fn cell(&self, ridx: usize, cidx: usize) -> &str {
        self.rows
            .get(ridx)
            .and_then(|r| r.get(cidx))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn ncolumns(&self) -> usize {
        self.header.len()
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("header", &self.header)
            .field("nrows", &self.rows.len())
            .finish()
    }
}

/// Parse comma separated text.
///
/// The first line is the header and is split as is. Every other cell loses
/// at most one leading and one trailing double quote. Quoted commas,
/// embedded line breaks and escaped quotes are not supported. A leading
/// byte order mark is dropped.
pub fn parse(text: &str) -> Table {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text).trim();
    if text.is_empty() {
        return Table::default();
    }

    let mut lines = text.lines();
    let header = lines
        .next()
        .map(|line| line.split(',').map(String::from).collect())
        .unwrap_or_default();
    let rows = lines
        .map(|line| line.split(',').map(unquote).collect())
        .collect();

    Table { header, rows }
}

fn unquote(cell: &str) -> String {
    let cell = cell.strip_prefix('"').unwrap_or(cell);
    let cell = cell.strip_suffix('"').unwrap_or(cell);
    cell.to_string()
}

/// Expand `~` and environment variables in a user supplied path.
pub fn resolve_path(raw: &str) -> Result<PathBuf, TVError> {
    let expanded =
        shellexpand::full(raw.trim()).map_err(|e| TVError::InvalidPath(e.to_string()))?;
    if expanded.is_empty() {
        return Err(TVError::InvalidPath(raw.to_string()));
    }
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Load a file into a table, routed by its extension.
#[instrument(level = "debug")]
pub fn load_file(path: &Path) -> Result<Table, TVError> {
    let file_type = get_file_type(path)?;
    let start_time = Instant::now();

    let table = match file_type {
        FileType::PARQUET => load_parquet(path)?,
        FileType::TEXT => parse(&String::from_utf8_lossy(&fs::read(path)?)),
    };

    info!(
        "Loading {:?} with {} columns and {} rows took {}ms ...",
        file_type,
        table.ncolumns(),
        table.nrows(),
        start_time.elapsed().as_millis()
    );
    Ok(table)
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("???")
        .to_string()
}

fn get_file_type(path: &Path) -> Result<FileType, TVError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TVError::FileNotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => TVError::PermissionDenied(path.to_path_buf()),
        _ => TVError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TVError::LoadingFailed(format!(
            "{} is not a file!",
            path.display()
        )));
    }
    debug!("File {} has {} bytes", path.display(), metadata.len());
    Ok(detect_file_type(path))
}

fn detect_file_type(path: &Path) -> FileType {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("PARQUET") => FileType::PARQUET,
        _ => FileType::TEXT,
    }
}

#[instrument(level = "debug")]
fn load_parquet(path: &Path) -> Result<Table, TVError> {
    let df = LazyFrame::scan_parquet(
        PlPath::Local(path.into()),
        ScanArgsParquet::default(),
    )?
    .collect()?;

    // Each column is stringified in its own rayon task.
    let header: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let columns: Result<Vec<Vec<String>>, PolarsError> = header
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect();

    Ok(Table::from_columns(header, columns?))
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<String>, PolarsError> {
    let column = df.column(col_name)?;
    trace!("Column \"{}\" has type {:?}", col_name, column.dtype());

    // Nested columns (lists, structs, arrays) have no string cast.
    let col = match column.cast(&DataType::String) {
        Ok(col) => col,
        Err(e) => {
            debug!("Column \"{}\" formatted per value: {}", col_name, e);
            return (0..column.len())
                .map(|idx| {
                    column.get(idx).map(|value| match value {
                        AnyValue::Null => String::new(),
                        value => value.to_string(),
                    })
                })
                .collect();
        }
    };
    let series = col.str()?;
    Ok(series
        .into_iter()
        .map(|value| value.map(String::from).unwrap_or_default())
        .collect())
}
