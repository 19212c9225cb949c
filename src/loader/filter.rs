//! Client-side search and filter over an already-loaded collection.
//!
//! Everything here is pure: no I/O, no shared state. A view is recomputed
//! from the cached items and the current criteria every time either changes.

use super::LoadState;

pub const NO_DATA_MESSAGE: &str = "No Data Found";
pub const NO_MATCH_MESSAGE: &str = "No data matches the current filter";

/// Fields a list view can search and filter on.
pub trait Filterable {
    /// Text fields matched by the search box (name, email, phone...)
    fn search_fields(&self) -> Vec<&str>;

    /// Whether this record has the status named by `wanted`. Each entity
    /// parses `wanted` with its own encoding.
    fn matches_status(&self, _wanted: &str) -> bool {
        false
    }

    fn category(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    /// `None`, empty or `all` disables the status filter
    pub status: Option<String>,
    pub category: Option<String>,
}

impl FilterCriteria {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && active(&self.status).is_none()
            && active(&self.category).is_none()
    }

    pub fn matches<T: Filterable>(&self, item: &T) -> bool {
        let term = self.search.trim().to_lowercase();
        if !term.is_empty()
            && !item
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        {
            return false;
        }

        if let Some(status) = active(&self.status) {
            if !item.matches_status(status) {
                return false;
            }
        }

        if let Some(category) = active(&self.category) {
            match item.category() {
                Some(c) if c.trim().to_lowercase() == category.to_lowercase() => {}
                _ => return false,
            }
        }

        true
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Items matching `criteria`, in their cached order.
pub fn filter_items<T: Filterable + Clone>(items: &[T], criteria: &FilterCriteria) -> Vec<T> {
    items
        .iter()
        .filter(|item| criteria.matches(*item))
        .cloned()
        .collect()
}

/// What a list view renders.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<T> {
    Loading,
    Failed(String),
    /// The server returned an empty collection
    NoData,
    /// The collection is non-empty but nothing passes the filter
    NoMatch,
    Rows(Vec<T>),
}

impl<T> ListView<T> {
    /// Placeholder text for the non-row states.
    pub fn message(&self) -> Option<&str> {
        match self {
            ListView::Loading => Some("Loading..."),
            ListView::Failed(message) => Some(message),
            ListView::NoData => Some(NO_DATA_MESSAGE),
            ListView::NoMatch => Some(NO_MATCH_MESSAGE),
            ListView::Rows(_) => None,
        }
    }
}

pub fn view<T: Filterable + Clone>(state: &LoadState<T>, criteria: &FilterCriteria) -> ListView<T> {
    match state {
        LoadState::Idle | LoadState::Loading => ListView::Loading,
        LoadState::Failed(message) => ListView::Failed(message.clone()),
        LoadState::Loaded(items) if items.is_empty() => ListView::NoData,
        LoadState::Loaded(items) => {
            let rows = filter_items(items, criteria);
            if rows.is_empty() {
                ListView::NoMatch
            } else {
                ListView::Rows(rows)
            }
        }
    }
}
