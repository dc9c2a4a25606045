use std::ops::Range;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table},
};

use crate::domain::{CMDMode, HELP_TEXT, TVConfig};
use crate::inputter::InputResult;
use crate::model::Model;
use crate::sort::{SortDirection, SortState};

pub const CMDLINE_HEIGH: u16 = 2;
pub const COLUMN_WIDTH_MARGIN: usize = 2; // room for the sort arrow
pub const COLUMN_WIDTH_MIN: usize = 3;

pub struct TableUI {
    max_column_width: usize,
}

impl TableUI {
    pub fn new(config: &TVConfig) -> Self {
        Self {
            max_column_width: config.max_column_width.max(COLUMN_WIDTH_MIN),
        }
    }

    pub fn draw(&self, model: &Model, prompt: Option<(CMDMode, &InputResult)>, f: &mut Frame) {
        let [table_area, cmdline_area] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(CMDLINE_HEIGH)])
                .areas(f.area());

        self.draw_table(model, f, table_area);
        self.draw_cmdline(model, prompt, f, cmdline_area);

        if model.show_help() {
            let area = f.area();
            draw_help(f, area);
        }
    }

    fn draw_table(&self, model: &Model, f: &mut Frame, area: Rect) {
        let title = if model.name().is_empty() {
            Line::from(" tabview ".bold())
        } else {
            Line::from(format!(" {} ", model.name()).bold())
        };
        let block = Block::bordered()
            .title(title.centered())
            .border_set(border::THICK);

        let header = model.header();
        if header.is_empty() {
            let text = Text::from(vec![Line::from(model.status_message().to_string())]);
            f.render_widget(Paragraph::new(text).centered().block(block), area);
            return;
        }

        let page_rows = model.page_rows();
        let index: Vec<String> = model
            .page_row_indices()
            .iter()
            .map(|idx| (idx + 1).to_string())
            .collect();
        let index_width = index.iter().map(|s| s.chars().count()).max().unwrap_or(1);

        let widths = column_widths(model, &page_rows, self.max_column_width);
        let available = (area.width as usize).saturating_sub(index_width + 3);
        let columns = visible_columns(&widths, model.selected_column(), available);

        let header_cells = std::iter::once(Cell::from("")).chain(columns.clone().map(|cidx| {
            let name = format!("{}{}", header[cidx], sort_marker(model.sort(), cidx));
            let filter = model.filter(cidx);
            let mut cell = Cell::from(Text::from(vec![
                Line::from(name).bold(),
                Line::from(filter.to_string()).fg(Color::Yellow),
            ]));
            if cidx == model.selected_column() {
                cell = cell.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            cell
        }));

        let rows = page_rows.iter().zip(index).map(|(row, idx)| {
            let cells = columns.clone().map(|cidx| {
                Cell::from(truncate(
                    row.get(cidx).map(|s| s.as_str()).unwrap_or(""),
                    widths[cidx],
                ))
            });
            Row::new(std::iter::once(Cell::from(idx.dark_gray())).chain(cells))
        });

        let constraints = std::iter::once(Constraint::Length(index_width as u16)).chain(
            columns
                .clone()
                .map(|cidx| Constraint::Length(widths[cidx] as u16)),
        );

        let table = Table::new(rows, constraints)
            .header(Row::new(header_cells).height(2).bottom_margin(1))
            .column_spacing(1)
            .block(block);
        f.render_widget(table, area);
    }

    fn draw_cmdline(
        &self,
        model: &Model,
        prompt: Option<(CMDMode, &InputResult)>,
        f: &mut Frame,
        area: Rect,
    ) {
        let mut info = vec![
            Span::from(format!(" Page {}/{}", model.page(), model.total_pages())),
            Span::from(format!(
                " · {} of {} rows · {} per page",
                model.visible_row_count(),
                model.total_row_count(),
                model.page_size()
            )),
        ];
        if model.has_any_filter() {
            info.push(" · filtered, ".into());
            info.push("<c>".blue().bold());
            info.push(" to clear".into());
        }
        info.push(" · ".into());
        info.push("<?>".blue().bold());
        info.push(" help".into());

        let second = match prompt {
            Some((mode, input)) => {
                let label = match mode {
                    CMDMode::Filter(cidx) => format!(
                        " Filter {}: ",
                        model.header().get(cidx).map(|s| s.as_str()).unwrap_or("")
                    ),
                    CMDMode::Open => " Open: ".to_string(),
                };
                let cursor_x = area.x + (label.chars().count() + input.curser_pos) as u16;
                f.set_cursor_position(Position::new(cursor_x, area.y + 1));
                Line::from(vec![label.yellow().bold(), Span::from(input.input.clone())])
            }
            None => Line::from(format!(" {}", model.status_message())),
        };

        f.render_widget(Paragraph::new(vec![Line::from(info), second]), area);
    }
}

fn draw_help(f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = HELP_TEXT.lines().map(Line::from).collect();
    let height = lines.len() as u16 + 2;
    let width = HELP_TEXT
        .lines()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0) as u16
        + 4;

    let [popup] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(popup);

    let block = Block::bordered()
        .title(Line::from(" Help ".bold()).centered())
        .title_bottom(Line::from(vec![" Close ".into(), "<Esc> ".blue().bold()]).centered())
        .border_set(border::THICK);
    f.render_widget(Clear, popup);
    f.render_widget(Paragraph::new(lines).block(block), popup);
}

fn sort_marker(sort: Option<SortState>, column: usize) -> &'static str {
    match sort {
        Some(SortState {
            column: c,
            direction: SortDirection::Ascending,
        }) if c == column => " ▲",
        Some(SortState {
            column: c,
            direction: SortDirection::Descending,
        }) if c == column => " ▼",
        _ => "",
    }
}

/// Width per column, from header, filter text and the cells on the current page.
fn column_widths(model: &Model, page_rows: &[&[String]], max_column_width: usize) -> Vec<usize> {
    model
        .header()
        .iter()
        .enumerate()
        .map(|(cidx, name)| {
            let cells = page_rows
                .iter()
                .map(|r| r.get(cidx).map(|s| s.chars().count()).unwrap_or(0))
                .max()
                .unwrap_or(0);
            let width = (name.chars().count() + COLUMN_WIDTH_MARGIN)
                .max(model.filter(cidx).chars().count())
                .max(cells);
            width.clamp(COLUMN_WIDTH_MIN, max_column_width)
        })
        .collect()
}

/// Range of columns to draw so that `selected` is visible, as many columns
/// as fit into `available` (one spacer per column).
fn visible_columns(widths: &[usize], selected: usize, available: usize) -> Range<usize> {
    if widths.is_empty() {
        return 0..0;
    }
    let selected = selected.min(widths.len() - 1);

    let mut first = selected;
    let mut used = widths[selected] + 1;
    while first > 0 && used + widths[first - 1] + 1 <= available {
        first -= 1;
        used += widths[first] + 1;
    }

    let mut end = selected + 1;
    while end < widths.len() && used + widths[end] + 1 <= available {
        used += widths[end] + 1;
        end += 1;
    }
    first..end
}

fn truncate(cell: &str, width: usize) -> String {
    if cell.chars().count() <= width {
        cell.to_string()
    } else {
        let mut out: String = cell.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;
    use crate::table::parse;

    #[test]
    fn visible_columns_keep_selection_in_view() {
        let widths = [5, 5, 5, 5, 5];
        assert_eq!(visible_columns(&widths, 0, 100), 0..5);
        assert_eq!(visible_columns(&widths, 0, 13), 0..2);
        assert_eq!(visible_columns(&widths, 4, 13), 3..5);
        assert_eq!(visible_columns(&widths, 2, 1), 2..3);
        assert_eq!(visible_columns(&[], 2, 10), 0..0);
    }

    #[test]
    fn widths_follow_content() {
        let model = Model::init(&TVConfig::default())
            .update(Message::Loaded {
                name: "t.csv".into(),
                table: parse("id,description\n1,a fairly long description text here\n22,x"),
            })
            .update(Message::SetFilter(0, ">=10".into()));
        let rows = model.page_rows();
        assert_eq!(column_widths(&model, &rows, 20), vec![4, 13]);
        assert_eq!(column_widths(&model, &rows, 3), vec![3, 3]);
    }

    #[test]
    fn markers_and_truncation() {
        let asc = Some(SortState {
            column: 1,
            direction: SortDirection::Ascending,
        });
        assert_eq!(sort_marker(asc, 1), " ▲");
        assert_eq!(sort_marker(asc, 0), "");
        assert_eq!(truncate("Berlin", 10), "Berlin");
        assert_eq!(truncate("Frankfurt", 6), "Frank…");
    }
}
