//! Rendering and keyboard handling for core [`Table`]s.
//!
//! The core table owns rows, sort, filters and pagination; this module
//! only keeps the cursor (selected row, picked column) and draws the
//! projected [`TableView`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table as TableWidget, TableState};

use peerly_core::table::{SortDirection, Table, TableRow, TableView};

use super::overlay;
use super::text_field::TextField;
use crate::theme;

const HALF_PAGE: isize = 5;

/// What a key did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKey {
    Handled,
    /// Open the filter prompt for the picked column.
    OpenFilter,
    /// Open the row action menu.
    OpenActions,
    Unhandled,
}

#[derive(Debug, Default, Clone)]
pub struct TableCursor {
    state: TableState,
    column: usize,
}

impl TableCursor {
    pub fn selected(&self) -> usize {
        self.state.selected().unwrap_or(0)
    }

    /// Index into the view's headers of the picked column.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn select(&mut self, idx: usize, len: usize) {
        if len == 0 {
            self.state.select(None);
        } else {
            self.state.select(Some(idx.min(len - 1)));
        }
    }

    pub fn move_by(&mut self, delta: isize, len: usize) {
        let next = self.selected().saturating_add_signed(delta);
        self.select(next, len);
    }

    /// Id of the selected row on the current page.
    pub fn selected_id(&self, view: &TableView) -> Option<i64> {
        view.rows.get(self.selected()).map(|r| r.id)
    }

    /// Navigation, sort, paging and column keys.
    pub fn handle_key<T: TableRow>(&mut self, key: KeyEvent, table: &mut Table<T>) -> TableKey {
        let view = table.view();
        let len = view.rows.len();
        match (key.modifiers, key.code) {
            (_, KeyCode::Char('j') | KeyCode::Down) => self.move_by(1, len),
            (_, KeyCode::Char('k') | KeyCode::Up) => self.move_by(-1, len),
            (KeyModifiers::NONE, KeyCode::Char('g')) => self.select(0, len),
            (_, KeyCode::Char('G')) => self.select(usize::MAX, len),
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => self.move_by(HALF_PAGE, len),
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => self.move_by(-HALF_PAGE, len),
            (_, KeyCode::Char('h') | KeyCode::Left) => {
                self.column = self.column.saturating_sub(1);
            }
            (_, KeyCode::Char('l') | KeyCode::Right) => {
                self.column = (self.column + 1).min(view.headers.len().saturating_sub(1));
            }
            (_, KeyCode::Char('s')) => {
                if let Some(header) = view.headers.get(self.column) {
                    table.toggle_sort(&header.id);
                }
            }
            (_, KeyCode::Char(']')) => {
                table.next_page();
                self.select(0, table.view().rows.len());
            }
            (_, KeyCode::Char('[')) => {
                table.previous_page();
                self.select(0, table.view().rows.len());
            }
            (_, KeyCode::Char('f')) => return TableKey::OpenFilter,
            (_, KeyCode::Char('a')) => return TableKey::OpenActions,
            _ => return TableKey::Unhandled,
        }
        TableKey::Handled
    }

    /// Keep the selection inside the current page after rows change.
    pub fn clamp<T: TableRow>(&mut self, table: &Table<T>) {
        let len = table.view().rows.len();
        self.select(self.selected(), len);
    }
}

/// Draw a table view with a titled frame and a page footer.
pub fn render_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    view: &TableView,
    cursor: &TableCursor,
    loading: bool,
) {
    let block = Block::default()
        .title(format!(" {title} "))
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [table_area, footer_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    let header = Row::new(view.headers.iter().enumerate().map(|(i, h)| {
        let marker = match h.sort {
            Some(SortDirection::Ascending) => " ▲",
            Some(SortDirection::Descending) => " ▼",
            None => "",
        };
        let filter = h
            .filter
            .as_deref()
            .map(|f| format!(" ~{f}"))
            .unwrap_or_default();
        let style = if i == cursor.column() {
            theme::table_header_picked()
        } else {
            theme::table_header()
        };
        Cell::from(format!("{}{marker}{filter}", h.title)).style(style)
    }));

    let selected = cursor.selected();
    let rows: Vec<Row> = view
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let prefix = if row.selected { "● " } else { "" };
            let cells = row.cells.iter().enumerate().map(|(c, text)| {
                if c == 0 {
                    Cell::from(format!("{prefix}{text}"))
                } else {
                    Cell::from(text.as_str())
                }
            });
            let style = if i == selected {
                theme::table_selected()
            } else {
                theme::table_row()
            };
            Row::new(cells).style(style)
        })
        .collect();

    let widths: Vec<Constraint> = view
        .headers
        .iter()
        .map(|_| Constraint::Ratio(1, u32::try_from(view.headers.len().max(1)).unwrap_or(1)))
        .collect();

    let table = TableWidget::new(rows, widths)
        .header(header)
        .row_highlight_style(theme::table_selected());
    let mut state = TableState::default();
    if !view.rows.is_empty() {
        state.select(Some(selected.min(view.rows.len() - 1)));
    }
    frame.render_stateful_widget(table, table_area, &mut state);

    if view.rows.is_empty() {
        let text = if loading { "  Loading…" } else { "  No records" };
        let empty_area = Rect {
            y: table_area.y.saturating_add(1),
            height: 1,
            ..table_area
        };
        frame.render_widget(Paragraph::new(Span::styled(text, theme::key_hint())), empty_area);
    }

    let mut footer = vec![Span::styled(
        format!(
            " Page {} of {}  ·  {} rows",
            view.page.index + 1,
            view.page.count,
            view.page.total_rows
        ),
        theme::key_hint(),
    )];
    if loading {
        footer.push(Span::styled("  ·  refreshing", Style::default().fg(theme::AMBER)));
    }
    frame.render_widget(Paragraph::new(Line::from(footer)), footer_area);
}

// ── Filter prompt ────────────────────────────────────────────────────

/// Live filter editor for one column, or the table-wide filter.
#[derive(Debug, Clone)]
pub struct FilterPrompt {
    column: Option<String>,
    title: String,
    field: TextField,
}

impl FilterPrompt {
    /// A prompt for the picked column when column filters are on and it
    /// is filterable; otherwise for the global filter when that is on.
    pub fn open<T: TableRow>(table: &Table<T>, cursor: &TableCursor) -> Option<Self> {
        let options = table.options();
        let view = table.view();
        let picked = view.headers.get(cursor.column()).and_then(|h| {
            table
                .columns()
                .iter()
                .find(|c| c.id == h.id && c.filterable)
                .map(|c| (c.id.clone(), c.header.clone()))
        });

        if let (true, Some((id, header))) = (options.column_filters, picked) {
            let current = table.column_filter(&id).unwrap_or_default().to_owned();
            return Some(Self {
                column: Some(id),
                title: format!("Filter {header}"),
                field: TextField::new(current),
            });
        }
        options.global_filter.then(|| Self {
            column: None,
            title: "Search".into(),
            field: TextField::new(table.global_filter()),
        })
    }

    /// Edit the filter text; the table is updated on every key. Returns
    /// `true` once the prompt should close.
    pub fn handle_key<T: TableRow>(&mut self, key: KeyEvent, table: &mut Table<T>) -> bool {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => return true,
            _ => {
                if !self.field.handle_key(key) {
                    return false;
                }
            }
        }
        match &self.column {
            Some(id) => table.set_column_filter(id, self.field.value()),
            None => table.set_global_filter(self.field.value()),
        }
        false
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let rect = overlay::centered(area, 50, 3);
        let inner = overlay::dialog(frame, rect, &self.title, theme::ACCENT);
        self.field.render(frame, inner, "›", true);
    }
}

// ── Row action menu ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ActionMenu {
    row_id: i64,
    /// (action id, label)
    items: Vec<(String, String)>,
    selected: usize,
}

/// What the menu decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Pending,
    Cancelled,
    Chosen { row_id: i64, action: String },
}

impl ActionMenu {
    /// Menu of every row action for the selected row, if any.
    pub fn open<T: TableRow>(table: &Table<T>, cursor: &TableCursor) -> Option<Self> {
        let row_id = cursor.selected_id(&table.view())?;
        let items: Vec<(String, String)> = table
            .row_actions()
            .into_iter()
            .map(|a| (a.id.clone(), a.label.clone()))
            .collect();
        (!items.is_empty()).then_some(Self {
            row_id,
            items,
            selected: 0,
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> MenuChoice {
        match key.code {
            KeyCode::Esc => MenuChoice::Cancelled,
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected = (self.selected + 1).min(self.items.len().saturating_sub(1));
                MenuChoice::Pending
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                MenuChoice::Pending
            }
            KeyCode::Enter => self
                .items
                .get(self.selected)
                .map_or(MenuChoice::Cancelled, |(id, _)| MenuChoice::Chosen {
                    row_id: self.row_id,
                    action: id.clone(),
                }),
            _ => MenuChoice::Pending,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let height = u16::try_from(self.items.len()).unwrap_or(u16::MAX).saturating_add(2);
        let rect = overlay::centered(area, 36, height);
        let inner = overlay::dialog(frame, rect, "Actions", theme::ACCENT);
        let lines: Vec<Line> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, (_, label))| {
                if i == self.selected {
                    Line::from(Span::styled(
                        format!("▸ {label}"),
                        theme::table_selected().add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(format!("  {label}"), theme::table_row()))
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// One line of `key description` pairs.
pub fn hints(pairs: &[(&str, &str)]) -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for (key, what) in pairs {
        spans.push(Span::styled(format!(" {key} "), theme::key_hint_key()));
        spans.push(Span::styled((*what).to_owned(), theme::key_hint()));
    }
    Line::from(spans)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use peerly_core::ColumnDef;
    use peerly_core::table::{RowAction, TableOptions};
    use peerly_core::RowCommand;

    #[derive(Debug, Clone)]
    struct Item {
        id: i64,
        name: &'static str,
    }

    impl TableRow for Item {
        fn row_id(&self) -> i64 {
            self.id
        }
    }

    fn table(options: TableOptions) -> Table<Item> {
        let mut table = Table::new(
            vec![
                ColumnDef::accessor("name", "Name", |i: &Item| i.name.into()),
                ColumnDef::actions(
                    "actions",
                    "Actions",
                    vec![RowAction::new("delete", "Delete", |i: &Item| RowCommand::Delete(i.id))],
                ),
            ],
            options,
        );
        table.set_rows(vec![
            Item { id: 1, name: "beta" },
            Item { id: 2, name: "alpha" },
            Item { id: 3, name: "gamma" },
        ]);
        table
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn selection_is_clamped_to_rows() {
        let mut t = table(TableOptions::default());
        let mut cursor = TableCursor::default();
        cursor.select(0, 3);
        cursor.handle_key(key('G'), &mut t);
        assert_eq!(cursor.selected(), 2);
        cursor.handle_key(key('j'), &mut t);
        assert_eq!(cursor.selected(), 2);
        cursor.handle_key(key('g'), &mut t);
        assert_eq!(cursor.selected_id(&t.view()), Some(1));
    }

    #[test]
    fn sort_key_toggles_picked_column() {
        let mut t = table(TableOptions::default());
        let mut cursor = TableCursor::default();
        cursor.select(0, 3);
        assert_eq!(cursor.handle_key(key('s'), &mut t), TableKey::Handled);
        assert_eq!(cursor.selected_id(&t.view()), Some(2));
    }

    #[test]
    fn global_filter_prompt_updates_live() {
        let mut t = table(TableOptions::default());
        let cursor = TableCursor::default();
        let mut prompt = FilterPrompt::open(&t, &cursor).unwrap();
        for c in "amm".chars() {
            assert!(!prompt.handle_key(key(c), &mut t));
        }
        let view = t.view();
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].id, 3);
        assert!(prompt.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &mut t));
    }

    #[test]
    fn no_prompt_when_filtering_is_off() {
        let t = table(TableOptions {
            global_filter: false,
            column_filters: false,
            ..TableOptions::default()
        });
        assert!(FilterPrompt::open(&t, &TableCursor::default()).is_none());
    }

    #[test]
    fn action_menu_chooses_for_selected_row() {
        let t = table(TableOptions::default());
        let mut cursor = TableCursor::default();
        cursor.select(1, 3);
        let mut menu = ActionMenu::open(&t, &cursor).unwrap();
        assert_eq!(
            menu.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
            MenuChoice::Chosen {
                row_id: 2,
                action: "delete".into()
            }
        );
    }
}
