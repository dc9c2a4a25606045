use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace};

use crate::domain::{Message, TVConfig};
use crate::filter::{FilterSet, filter_rows};
use crate::pager::{PageSize, Pager};
use crate::sort::{SortState, sort_rows, toggle};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    EMPTY,
    READY,
    QUITTING,
}

/// The complete view state.
///
/// A `Model` is never mutated in place. `update` returns the next state, which
/// keeps every transition testable without a terminal. The table and the row
/// mapping are shared between states through `Arc`.
#[derive(Debug, Clone)]
pub struct Model {
    pub status: Status,
    name: String,
    table: Arc<Table>,
    filters: Vec<String>,
    sort: Option<SortState>,
    pager: Pager,
    rows: Arc<Vec<usize>>, // Filtered and sorted indices into table rows
    selected_column: usize,
    show_help: bool,
    status_message: String,
}

impl Model {
    pub fn init(config: &TVConfig) -> Self {
        Self {
            status: Status::EMPTY,
            name: String::new(),
            table: Arc::new(Table::default()),
            filters: Vec::new(),
            sort: None,
            pager: Pager::new(config.page_size),
            rows: Arc::new(Vec::new()),
            selected_column: 0,
            show_help: false,
            status_message: "Press 'o' to open a file, '?' for help".to_string(),
        }
    }

    pub fn update(&self, message: Message) -> Model {
        trace!("Update: {:?}", message);
        let mut next = self.clone();

        if self.show_help {
            match message {
                Message::Quit => next.status = Status::QUITTING,
                Message::Exit | Message::Help => next.show_help = false,
                _ => (),
            }
            return next;
        }

        match message {
            Message::Loaded { name, table } => return next.load(name, table),
            Message::LoadFailed(reason) => {
                error!("Loading failed: {reason}");
                next.status_message = reason;
            }
            Message::SetFilter(column, text) => {
                if column < next.filters.len() && next.filters[column] != text {
                    next.filters[column] = text;
                    return next.apply_filters_and_sort();
                }
            }
            Message::ClearFilters => {
                if self.has_any_filter() {
                    next.filters = vec![String::new(); next.filters.len()];
                    next.status_message = "Cleared all filters".to_string();
                    return next.apply_filters_and_sort();
                }
            }
            Message::ToggleSort(column) => {
                if column < self.table.ncolumns() {
                    next.sort = toggle(self.sort, column);
                    return next.apply_filters_and_sort();
                }
            }
            Message::SortSelected => return next.update(Message::ToggleSort(self.selected_column)),
            Message::NextPage => next.pager = self.pager.next(self.rows.len()),
            Message::PreviousPage => next.pager = self.pager.previous(),
            Message::FirstPage => next.pager = self.pager.first(),
            Message::LastPage => next.pager = self.pager.last(self.rows.len()),
            Message::SetPageSize(size) => next.pager = self.pager.with_size(size),
            Message::CyclePageSize(forward) => {
                next.pager = self.pager.with_size(self.pager.size.cycle(forward));
            }
            Message::MoveLeft => next.selected_column = self.selected_column.saturating_sub(1),
            Message::MoveRight => {
                if self.selected_column + 1 < self.table.ncolumns() {
                    next.selected_column += 1;
                }
            }
            Message::Status(text) => next.status_message = text,
            Message::Help => next.show_help = true,
            Message::Exit => (),
            Message::Quit => next.status = Status::QUITTING,
            Message::Open(_) | Message::CopyRows => {
                debug!("Ignoring controller message {:?}", message);
            }
        }
        next
    }

    // A new table starts unfiltered and unsorted on page 1.
    fn load(mut self, name: String, table: Table) -> Self {
        info!(
            "Showing \"{}\" with {} columns and {} rows",
            name,
            table.ncolumns(),
            table.nrows()
        );
        self.status_message = format!("Loaded {} rows from {}", table.nrows(), name);
        self.status = Status::READY;
        self.name = name;
        self.filters = vec![String::new(); table.ncolumns()];
        self.sort = None;
        self.selected_column = 0;
        self.table = Arc::new(table);
        self.apply_filters_and_sort()
    }

    fn apply_filters_and_sort(mut self) -> Self {
        let start_time = Instant::now();
        let all: Vec<usize> = (0..self.table.nrows()).collect();
        let mut rows = filter_rows(&self.table, &all, &FilterSet::compile(&self.filters));
        sort_rows(&self.table, &mut rows, self.sort);
        trace!(
            "Filter and sort took {}ms, {} of {} rows visible",
            start_time.elapsed().as_millis(),
            rows.len(),
            self.table.nrows()
        );
        self.rows = Arc::new(rows);
        self.pager = self.pager.reset();
        self
    }

    // -------------------- Queries for the ui and controller ---------------------- //

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[String] {
        self.table.header()
    }

    pub fn filter(&self, column: usize) -> &str {
        self.filters.get(column).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn has_any_filter(&self) -> bool {
        self.filters.iter().any(|f| !f.is_empty())
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    pub fn selected_column(&self) -> usize {
        self.selected_column
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn page(&self) -> usize {
        self.pager.page
    }

    pub fn page_size(&self) -> PageSize {
        self.pager.size
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages(self.rows.len())
    }

    pub fn visible_row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn total_row_count(&self) -> usize {
        self.table.nrows()
    }

    /// Indices into the loaded table of the rows on the current page.
    pub fn page_row_indices(&self) -> &[usize] {
        self.pager.slice(&self.rows)
    }

    pub fn page_rows(&self) -> Vec<&[String]> {
        self.page_row_indices()
            .iter()
            .map(|&ridx| self.table.row(ridx))
            .collect()
    }

    /// Header and all filtered and sorted rows as CSV text.
    pub fn export_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(csv_line(self.table.header()));
        lines.extend(self.rows.iter().map(|&ridx| {
            let cells: Vec<&str> = (0..self.table.ncolumns())
                .map(|cidx| self.table.cell(ridx, cidx))
                .collect();
            csv_line(&cells)
        }));
        lines.join("\n")
    }
}

fn csv_line<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| wrap_cell_content(c.as_ref()))
        .collect::<Vec<String>>()
        .join(",")
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = needs_escaping || c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortDirection;
    use crate::table::parse;

    fn loaded(text: &str, page_size: usize) -> Model {
        let config = TVConfig::default().page_size(PageSize::from_count(page_size));
        Model::init(&config).update(Message::Loaded {
            name: "test.csv".to_string(),
            table: parse(text),
        })
    }

    fn page(model: &Model) -> Vec<Vec<String>> {
        model.page_rows().iter().map(|r| r.to_vec()).collect()
    }

    const PEOPLE: &str = "id,name\n1,Alice\n2,Bob\n3,Carol";

    #[test]
    fn init_is_empty() {
        let model = Model::init(&TVConfig::default());
        assert_eq!(model.status, Status::EMPTY);
        assert_eq!(model.total_pages(), 1);
        assert!(model.page_rows().is_empty());
    }

    #[test]
    fn load_shows_first_page() {
        let model = loaded(PEOPLE, 10);
        assert_eq!(model.status, Status::READY);
        assert_eq!(model.name(), "test.csv");
        assert_eq!((model.filter(0), model.filter(1)), ("", ""));
        assert_eq!(model.visible_row_count(), 3);
        assert_eq!(page(&model)[0], ["1", "Alice"]);
    }

    #[test]
    fn filter_then_sort_descending() {
        let model = loaded(PEOPLE, 10)
            .update(Message::SetFilter(0, ">1".into()))
            .update(Message::ToggleSort(1))
            .update(Message::ToggleSort(1));
        assert_eq!(
            model.sort(),
            Some(SortState {
                column: 1,
                direction: SortDirection::Descending
            })
        );
        assert_eq!(page(&model), [["3", "Carol"], ["2", "Bob"]]);
    }

    #[test]
    fn third_sort_click_restores_load_order() {
        let model = loaded("n\nb\nc\na", 10);
        let sorted = model
            .update(Message::SortSelected)
            .update(Message::SortSelected);
        assert_eq!(page(&sorted), [["c"], ["b"], ["a"]]);
        let unsorted = sorted.update(Message::SortSelected);
        assert_eq!(unsorted.sort(), None);
        assert_eq!(page(&unsorted), [["b"], ["c"], ["a"]]);
    }

    #[test]
    fn update_leaves_previous_state_untouched() {
        let before = loaded(PEOPLE, 10);
        let after = before.update(Message::SetFilter(1, "bob".into()));
        assert_eq!(before.visible_row_count(), 3);
        assert_eq!(after.visible_row_count(), 1);
    }

    #[test]
    fn paging_through_rows() {
        let model = loaded(PEOPLE, 1);
        assert_eq!(model.total_pages(), 3);
        let model = model.update(Message::NextPage).update(Message::NextPage);
        assert_eq!(model.page(), 3);
        assert_eq!(page(&model), [["3", "Carol"]]);
        let model = model.update(Message::NextPage);
        assert_eq!(model.page(), 3);
        assert_eq!(model.update(Message::FirstPage).page(), 1);
        assert_eq!(model.update(Message::PreviousPage).page(), 2);
        assert_eq!(loaded(PEOPLE, 1).update(Message::LastPage).page(), 3);
    }

    #[test]
    fn filter_sort_and_page_size_reset_page() {
        let on_last = loaded(PEOPLE, 1).update(Message::LastPage);
        assert_eq!(on_last.update(Message::SetFilter(1, "o".into())).page(), 1);
        assert_eq!(on_last.update(Message::ToggleSort(0)).page(), 1);
        assert_eq!(on_last.update(Message::CyclePageSize(true)).page(), 1);
        assert_eq!(
            on_last
                .update(Message::SetPageSize(PageSize::Unbounded))
                .total_pages(),
            1
        );
    }

    #[test]
    fn sort_survives_filter_changes_but_not_loads() {
        let model = loaded(PEOPLE, 10)
            .update(Message::ToggleSort(1))
            .update(Message::SetFilter(1, "o".into()));
        assert!(model.sort().is_some());
        assert_eq!(page(&model), [["2", "Bob"], ["3", "Carol"]]);

        let reloaded = model.update(Message::Loaded {
            name: "other.csv".into(),
            table: parse("x,y,z\n1,2,3"),
        });
        assert_eq!(reloaded.sort(), None);
        assert!(!reloaded.has_any_filter());
        assert_eq!(reloaded.header(), ["x", "y", "z"]);
        assert_eq!(reloaded.page_size(), model.page_size());
    }

    #[test]
    fn failed_load_keeps_previous_table() {
        let model = loaded(PEOPLE, 10).update(Message::SetFilter(1, "a".into()));
        let failed = model.update(Message::LoadFailed("broken.parquet: bad magic".into()));
        assert_eq!(failed.name(), "test.csv");
        assert_eq!(failed.filter(1), "a");
        assert_eq!(failed.visible_row_count(), model.visible_row_count());
        assert_eq!(failed.status_message(), "broken.parquet: bad magic");
    }

    #[test]
    fn clear_filters() {
        let model = loaded(PEOPLE, 10)
            .update(Message::SetFilter(0, "<2".into()))
            .update(Message::SetFilter(1, "x".into()));
        assert!(model.has_any_filter());
        assert_eq!(model.visible_row_count(), 0);
        assert_eq!(model.total_pages(), 1);

        let cleared = model.update(Message::ClearFilters);
        assert!(!cleared.has_any_filter());
        assert_eq!(cleared.visible_row_count(), 3);
    }

    #[test]
    fn out_of_range_columns_are_ignored() {
        let model = loaded(PEOPLE, 10);
        let next = model
            .update(Message::SetFilter(5, "x".into()))
            .update(Message::ToggleSort(5));
        assert_eq!(next.sort(), None);
        assert_eq!(next.visible_row_count(), 3);
    }

    #[test]
    fn column_selection_is_clamped() {
        let model = loaded(PEOPLE, 10);
        assert_eq!(model.update(Message::MoveLeft).selected_column(), 0);
        let right = model.update(Message::MoveRight).update(Message::MoveRight);
        assert_eq!(right.selected_column(), 1);
        assert_eq!(
            right.update(Message::SortSelected).sort().map(|s| s.column),
            Some(1)
        );
    }

    #[test]
    fn help_popup_swallows_messages() {
        let model = loaded(PEOPLE, 1).update(Message::Help);
        assert!(model.show_help());
        let model = model.update(Message::NextPage);
        assert_eq!(model.page(), 1);
        let model = model.update(Message::Exit);
        assert!(!model.show_help());
        assert_eq!(model.update(Message::Help).update(Message::Quit).status, Status::QUITTING);
    }

    #[test]
    fn export_filtered_rows_as_csv() {
        let model = loaded("id,name\n1,Ann Lee\n2,Bob\n3,\"\"Al\"\"", 1)
            .update(Message::SetFilter(0, ">1".into()))
            .update(Message::ToggleSort(0))
            .update(Message::ToggleSort(0));
        assert_eq!(model.export_csv(), "id,name\n3,\"\"\"Al\"\"\"\n2,Bob");
    }

    #[test]
    fn export_quotes_separators() {
        let model = loaded("a,b\nx y,1", 10);
        assert_eq!(model.export_csv(), "a,b\n\"x y\",1");
    }
}
