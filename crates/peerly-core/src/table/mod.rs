// ── Generic table ──
//
// UI-agnostic table state: sort, visibility, filters, pagination and
// selection over a caller-supplied row set. Front-ends render the
// `TableView` it produces and route clicks back through `invoke`.

mod cell;
mod column;

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use serde::Serialize;

pub use cell::CellValue;
pub use column::{
    Accessor, ActionHandler, ColumnDef, Comparator, Navigation, Renderer, RowAction, RowCommand,
};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Rows must carry a stable identity for selection and actions.
pub trait TableRow {
    fn row_id(&self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

/// Feature switches, fixed per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub global_filter: bool,
    pub column_filters: bool,
    pub pagination: bool,
    pub page_size: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            global_filter: true,
            column_filters: false,
            pagination: true,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

// ── View model ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub id: String,
    pub title: String,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub id: i64,
    pub selected: bool,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Zero-based.
    pub index: usize,
    pub count: usize,
    pub size: usize,
    /// Rows after filtering, across all pages.
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    pub page: PageInfo,
}

// ── Table ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Table<T> {
    columns: Vec<ColumnDef<T>>,
    rows: Vec<T>,
    options: TableOptions,
    sort: Option<SortState>,
    hidden: HashSet<String>,
    global_filter: String,
    column_filters: IndexMap<String, String>,
    page: usize,
    selected: BTreeSet<i64>,
}

impl<T: TableRow> Table<T> {
    pub fn new(columns: Vec<ColumnDef<T>>, options: TableOptions) -> Self {
        let hidden = columns
            .iter()
            .filter(|c| !c.visible)
            .map(|c| c.id.clone())
            .collect();
        Self {
            columns,
            rows: Vec::new(),
            options,
            sort: None,
            hidden,
            global_filter: String::new(),
            column_filters: IndexMap::new(),
            page: 0,
            selected: BTreeSet::new(),
        }
    }

    pub fn options(&self) -> TableOptions {
        self.options
    }

    pub fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn row(&self, id: i64) -> Option<&T> {
        self.rows.iter().find(|r| r.row_id() == id)
    }

    /// Replace the data. Selection for vanished rows is dropped and the
    /// page index is clamped.
    pub fn set_rows(&mut self, rows: Vec<T>) {
        let present: HashSet<i64> = rows.iter().map(TableRow::row_id).collect();
        self.selected.retain(|id| present.contains(id));
        self.rows = rows;
        self.clamp_page();
    }

    /// Swap in rebuilt columns. Sort, filters and visibility survive for
    /// columns that still exist.
    pub fn set_columns(&mut self, columns: Vec<ColumnDef<T>>) {
        let ids: HashSet<&str> = columns.iter().map(|c| c.id.as_str()).collect();
        self.hidden.retain(|id| ids.contains(id.as_str()));
        self.column_filters.retain(|id, _| ids.contains(id.as_str()));
        if self.sort.as_ref().is_some_and(|s| !ids.contains(s.column.as_str())) {
            self.sort = None;
        }
        self.columns = columns;
        self.clamp_page();
    }

    fn column(&self, id: &str) -> Option<&ColumnDef<T>> {
        self.columns.iter().find(|c| c.id == id)
    }

    // ── Sort ──

    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Advance `column` through unsorted, ascending, descending, unsorted.
    /// Unknown or unsortable columns are ignored.
    pub fn toggle_sort(&mut self, column: &str) -> Option<&SortState> {
        if !self.column(column).is_some_and(|c| c.sortable) {
            return self.sort.as_ref();
        }
        self.sort = match self.sort.take() {
            Some(s) if s.column == column => match s.direction {
                SortDirection::Ascending => Some(SortState {
                    column: s.column,
                    direction: SortDirection::Descending,
                }),
                SortDirection::Descending => None,
            },
            _ => Some(SortState {
                column: column.to_owned(),
                direction: SortDirection::Ascending,
            }),
        };
        self.sort.as_ref()
    }

    // ── Visibility ──

    pub fn is_visible(&self, column: &str) -> bool {
        !self.hidden.contains(column)
    }

    pub fn set_visible(&mut self, column: &str, visible: bool) {
        if visible {
            self.hidden.remove(column);
        } else if self.column(column).is_some() {
            self.hidden.insert(column.to_owned());
        }
    }

    pub fn toggle_visible(&mut self, column: &str) {
        let visible = self.is_visible(column);
        self.set_visible(column, !visible);
    }

    // ── Filters ──

    pub fn global_filter(&self) -> &str {
        &self.global_filter
    }

    /// No-op when the global filter is switched off.
    pub fn set_global_filter(&mut self, text: &str) {
        if !self.options.global_filter || self.global_filter == text {
            return;
        }
        text.clone_into(&mut self.global_filter);
        self.page = 0;
    }

    pub fn column_filter(&self, column: &str) -> Option<&str> {
        self.column_filters.get(column).map(String::as_str)
    }

    /// Empty text clears the filter. Ignored for unfilterable columns.
    pub fn set_column_filter(&mut self, column: &str, text: &str) {
        if !self.options.column_filters || !self.column(column).is_some_and(|c| c.filterable) {
            return;
        }
        if text.is_empty() {
            self.column_filters.shift_remove(column);
        } else {
            self.column_filters.insert(column.to_owned(), text.to_owned());
        }
        self.page = 0;
    }

    fn matches_filters(&self, row: &T) -> bool {
        for (id, needle) in &self.column_filters {
            let Some(col) = self.column(id) else { continue };
            if !contains_ignore_case(&col.text(row), needle) {
                return false;
            }
        }
        if self.global_filter.is_empty() {
            return true;
        }
        self.columns
            .iter()
            .filter(|c| c.filterable)
            .any(|c| contains_ignore_case(&c.text(row), &self.global_filter))
    }

    /// Filtered then stably sorted rows, all pages.
    pub fn processed(&self) -> Vec<&T> {
        let mut rows: Vec<&T> = self.rows.iter().filter(|r| self.matches_filters(r)).collect();
        if let Some(sort) = &self.sort {
            if let Some(col) = self.column(&sort.column) {
                match sort.direction {
                    SortDirection::Ascending => rows.sort_by(|a, b| col.compare(a, b)),
                    SortDirection::Descending => rows.sort_by(|a, b| col.compare(b, a)),
                }
            }
        }
        rows
    }

    // ── Pagination ──

    pub fn page_index(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        if !self.options.pagination {
            return 1;
        }
        self.pages_for(self.processed().len())
    }

    fn pages_for(&self, total_rows: usize) -> usize {
        if !self.options.pagination {
            return 1;
        }
        total_rows.div_ceil(self.options.page_size.max(1)).max(1)
    }

    pub fn set_page(&mut self, index: usize) {
        self.page = index;
        self.clamp_page();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.page + 1);
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    fn clamp_page(&mut self) {
        self.page = self.page.min(self.page_count() - 1);
    }

    // ── Selection ──

    pub fn toggle_selected(&mut self, id: i64) {
        if !self.selected.remove(&id) && self.row(id).is_some() {
            self.selected.insert(id);
        }
    }

    pub fn selected(&self) -> impl Iterator<Item = i64> + '_ {
        self.selected.iter().copied()
    }

    // ── Projection ──

    pub fn view(&self) -> TableView {
        let visible: Vec<&ColumnDef<T>> = self
            .columns
            .iter()
            .filter(|c| self.is_visible(&c.id))
            .collect();

        let headers = visible
            .iter()
            .map(|c| HeaderView {
                id: c.id.clone(),
                title: c.header.clone(),
                sortable: c.sortable,
                sort: self
                    .sort
                    .as_ref()
                    .filter(|s| s.column == c.id)
                    .map(|s| s.direction),
                filter: self.column_filters.get(&c.id).cloned(),
            })
            .collect();

        let processed = self.processed();
        let total_rows = processed.len();
        let (start, size) = if self.options.pagination {
            (self.page * self.options.page_size, self.options.page_size)
        } else {
            (0, total_rows)
        };

        let rows = processed
            .into_iter()
            .skip(start)
            .take(size)
            .map(|row| RowView {
                id: row.row_id(),
                selected: self.selected.contains(&row.row_id()),
                cells: visible.iter().map(|c| c.text(row)).collect(),
            })
            .collect();

        TableView {
            headers,
            rows,
            page: PageInfo {
                index: self.page,
                count: self.pages_for(total_rows),
                size,
                total_rows,
            },
        }
    }

    /// Run `action` on row `row_id`. `None` when either is unknown.
    pub fn invoke(&self, row_id: i64, action: &str) -> Option<RowCommand> {
        let row = self.row(row_id)?;
        self.columns
            .iter()
            .find_map(|c| c.action(action))
            .map(|a| a.run(row))
    }

    /// Actions offered on each row, across all action columns.
    pub fn row_actions(&self) -> Vec<&RowAction<T>> {
        self.columns.iter().flat_map(|c| c.actions.iter()).collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i64,
        name: &'static str,
        score: i64,
    }

    impl TableRow for Item {
        fn row_id(&self) -> i64 {
            self.id
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item { id: 1, name: "delta", score: 2 },
            Item { id: 2, name: "alpha", score: 1 },
            Item { id: 3, name: "Charlie", score: 2 },
            Item { id: 4, name: "bravo", score: 1 },
        ]
    }

    fn columns() -> Vec<ColumnDef<Item>> {
        vec![
            ColumnDef::accessor("name", "Name", |i: &Item| i.name.into()),
            ColumnDef::accessor("score", "Score", |i: &Item| i.score.into()).filterable(false),
            ColumnDef::actions(
                "actions",
                "Actions",
                vec![
                    RowAction::new("edit", "Edit", |i: &Item| RowCommand::Edit(i.id)),
                    RowAction::new("delete", "Delete", |i: &Item| RowCommand::Delete(i.id)),
                ],
            ),
        ]
    }

    fn table(options: TableOptions) -> Table<Item> {
        let mut t = Table::new(columns(), options);
        t.set_rows(items());
        t
    }

    fn ids(t: &Table<Item>) -> Vec<i64> {
        t.view().rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn view_filters_and_sorts_once() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let score = ColumnDef::accessor("score", "Score", |i: &Item| i.score.into()).sort_by(
            move |a: &Item, b: &Item| {
                counter.fetch_add(1, AtomicOrdering::SeqCst);
                a.score.cmp(&b.score)
            },
        );
        let mut t = Table::new(vec![score], TableOptions { page_size: 3, ..TableOptions::default() });
        t.set_rows(items());
        t.toggle_sort("score");

        calls.store(0, AtomicOrdering::SeqCst);
        t.processed();
        let one_pass = calls.swap(0, AtomicOrdering::SeqCst);
        assert!(one_pass > 0);

        let view = t.view();
        assert_eq!(calls.load(AtomicOrdering::SeqCst), one_pass);
        assert_eq!(view.page.count, 2);
        assert_eq!(view.page.total_rows, 4);
    }

    #[test]
    fn sort_cycles_through_three_states() {
        let mut t = table(TableOptions::default());
        let unsorted = ids(&t);

        t.toggle_sort("score");
        let mut expected = items();
        expected.sort_by_key(|i| i.score);
        assert_eq!(ids(&t), expected.iter().map(|i| i.id).collect::<Vec<_>>());
        assert_eq!(ids(&t), vec![2, 4, 1, 3]);

        t.toggle_sort("score");
        assert_eq!(ids(&t), vec![1, 3, 2, 4]);

        t.toggle_sort("score");
        assert_eq!(t.sort_state(), None);
        assert_eq!(ids(&t), unsorted);
    }

    #[test]
    fn switching_column_restarts_ascending() {
        let mut t = table(TableOptions::default());
        t.toggle_sort("score");
        t.toggle_sort("score");
        t.toggle_sort("name");
        assert_eq!(
            t.sort_state(),
            Some(&SortState {
                column: "name".into(),
                direction: SortDirection::Ascending
            })
        );
        assert_eq!(ids(&t), vec![2, 4, 3, 1]);
    }

    #[test]
    fn actions_column_is_not_sortable() {
        let mut t = table(TableOptions::default());
        assert_eq!(t.toggle_sort("actions"), None);
    }

    #[test]
    fn comparator_override_wins() {
        let cols = vec![
            ColumnDef::accessor("name", "Name", |i: &Item| i.name.into())
                .sort_by(|a: &Item, b: &Item| a.name.len().cmp(&b.name.len())),
        ];
        let mut t = Table::new(cols, TableOptions::default());
        t.set_rows(items());
        t.toggle_sort("name");
        assert_eq!(ids(&t), vec![1, 2, 4, 3]);
    }

    #[test]
    fn global_filter_matches_filterable_columns_only() {
        let mut t = table(TableOptions::default());
        t.set_global_filter("CHAR");
        assert_eq!(ids(&t), vec![3]);
        t.set_global_filter("2");
        assert!(ids(&t).is_empty());
    }

    #[test]
    fn disabled_global_filter_is_ignored() {
        let mut t = table(TableOptions {
            global_filter: false,
            ..TableOptions::default()
        });
        t.set_global_filter("alpha");
        assert_eq!(ids(&t).len(), 4);
    }

    #[test]
    fn column_filter_narrows_rows() {
        let mut t = table(TableOptions {
            column_filters: true,
            ..TableOptions::default()
        });
        t.set_column_filter("name", "a");
        assert_eq!(ids(&t), vec![1, 2, 3, 4]);
        t.set_column_filter("name", "rav");
        assert_eq!(ids(&t), vec![4]);
        t.set_column_filter("name", "");
        assert_eq!(ids(&t).len(), 4);
    }

    #[test]
    fn hidden_columns_drop_out_of_view() {
        let mut t = table(TableOptions::default());
        t.set_visible("score", false);
        let view = t.view();
        assert_eq!(
            view.headers.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(),
            vec!["name", "actions"]
        );
        assert_eq!(view.rows[0].cells, vec!["delta", "Edit | Delete"]);
    }

    #[test]
    fn pagination_slices_and_clamps() {
        let many: Vec<Item> = (1..=25)
            .map(|id| Item { id, name: "row", score: id })
            .collect();
        let mut t = Table::new(columns(), TableOptions::default());
        t.set_rows(many);
        assert_eq!(t.page_count(), 3);
        t.set_page(2);
        assert_eq!(t.view().rows.len(), 5);

        t.set_rows(items());
        assert_eq!(t.page_index(), 0);
    }

    #[test]
    fn filter_change_resets_page() {
        let many: Vec<Item> = (1..=25)
            .map(|id| Item { id, name: "row", score: id })
            .collect();
        let mut t = Table::new(columns(), TableOptions::default());
        t.set_rows(many);
        t.next_page();
        t.set_global_filter("row");
        assert_eq!(t.page_index(), 0);
    }

    #[test]
    fn empty_data_renders_headers_only() {
        let t: Table<Item> = Table::new(columns(), TableOptions::default());
        let view = t.view();
        assert_eq!(view.headers.len(), 3);
        assert!(view.rows.is_empty());
        assert_eq!(view.page.count, 1);
    }

    #[test]
    fn replacing_rows_prunes_selection() {
        let mut t = table(TableOptions::default());
        t.toggle_selected(1);
        t.toggle_selected(2);
        t.set_rows(items().into_iter().filter(|i| i.id != 1).collect());
        assert_eq!(t.selected().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn invoke_runs_action_handler() {
        let t = table(TableOptions::default());
        assert_eq!(t.invoke(3, "delete"), Some(RowCommand::Delete(3)));
        assert_eq!(t.invoke(99, "delete"), None);
        assert_eq!(t.invoke(3, "explode"), None);
    }
}
