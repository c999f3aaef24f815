// ── Column definitions ──
//
// Declarative description of one column: header, how to read a value
// from a row, how to render it, and the actions it offers.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::CellValue;

pub type Accessor<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;
pub type Renderer<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
pub type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;
pub type ActionHandler<T> = Arc<dyn Fn(&T) -> RowCommand + Send + Sync>;

/// Where a navigation action wants to go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub to: String,
    /// Location to come back to, when the target page offers "back".
    pub from: Option<String>,
}

/// What a row action asks its page to do. Rows are never mutated by
/// the table itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RowCommand {
    Navigate(Navigation),
    Edit(i64),
    Delete(i64),
    /// Placeholder actions that only record the click.
    Log(String),
}

impl RowCommand {
    pub fn navigate(to: impl Into<String>) -> Self {
        RowCommand::Navigate(Navigation {
            to: to.into(),
            from: None,
        })
    }

    pub fn navigate_from(to: impl Into<String>, from: impl Into<String>) -> Self {
        RowCommand::Navigate(Navigation {
            to: to.into(),
            from: Some(from.into()),
        })
    }
}

pub struct RowAction<T> {
    pub id: String,
    pub label: String,
    handler: ActionHandler<T>,
}

impl<T> RowAction<T> {
    pub fn new(
        id: &str,
        label: &str,
        handler: impl Fn(&T) -> RowCommand + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.to_owned(),
            label: label.to_owned(),
            handler: Arc::new(handler),
        }
    }

    pub fn run(&self, row: &T) -> RowCommand {
        (self.handler)(row)
    }
}

impl<T> Clone for RowAction<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<T> fmt::Debug for RowAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

pub struct ColumnDef<T> {
    pub id: String,
    pub header: String,
    accessor: Accessor<T>,
    renderer: Option<Renderer<T>>,
    comparator: Option<Comparator<T>>,
    pub sortable: bool,
    pub filterable: bool,
    pub visible: bool,
    pub actions: Vec<RowAction<T>>,
}

impl<T> ColumnDef<T> {
    /// A data column reading its value through `accessor`. Sortable and
    /// filterable by default.
    pub fn accessor(
        id: &str,
        header: &str,
        accessor: impl Fn(&T) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.to_owned(),
            header: header.to_owned(),
            accessor: Arc::new(accessor),
            renderer: None,
            comparator: None,
            sortable: true,
            filterable: true,
            visible: true,
            actions: Vec::new(),
        }
    }

    /// A render-only column. Not sortable unless given a comparator.
    pub fn display(
        id: &str,
        header: &str,
        render: impl Fn(&T) -> String + Send + Sync + 'static,
    ) -> Self
    where
        T: 'static,
    {
        let render: Renderer<T> = Arc::new(render);
        let read = Arc::clone(&render);
        Self {
            renderer: Some(render),
            sortable: false,
            ..Self::accessor(id, header, move |row| CellValue::Text(read(row)))
        }
    }

    /// A column of row actions.
    pub fn actions(id: &str, header: &str, actions: Vec<RowAction<T>>) -> Self {
        let labels = actions
            .iter()
            .map(|a| a.label.clone())
            .collect::<Vec<_>>()
            .join(" | ");
        Self {
            sortable: false,
            filterable: false,
            actions,
            ..Self::accessor(id, header, move |_| CellValue::Text(labels.clone()))
        }
    }

    #[must_use]
    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    #[must_use]
    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Custom render for a data column; sorting still uses the value.
    #[must_use]
    pub fn render(mut self, render: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.renderer = Some(Arc::new(render));
        self
    }

    /// Comparator override. Implies sortable.
    #[must_use]
    pub fn sort_by(mut self, cmp: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        self.comparator = Some(Arc::new(cmp));
        self.sortable = true;
        self
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }

    pub fn text(&self, row: &T) -> String {
        match &self.renderer {
            Some(render) => render(row),
            None => self.value(row).to_string(),
        }
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        match &self.comparator {
            Some(cmp) => cmp(a, b),
            None => self.value(a).compare(&self.value(b)),
        }
    }

    pub fn action(&self, id: &str) -> Option<&RowAction<T>> {
        self.actions.iter().find(|a| a.id == id)
    }
}

impl<T> Clone for ColumnDef<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            header: self.header.clone(),
            accessor: Arc::clone(&self.accessor),
            renderer: self.renderer.clone(),
            comparator: self.comparator.clone(),
            sortable: self.sortable,
            filterable: self.filterable,
            visible: self.visible,
            actions: self.actions.clone(),
        }
    }
}

impl<T> fmt::Debug for ColumnDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("visible", &self.visible)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}
