//! Page window computation shared by every paged list view.
//!
//! The calculator turns `(current_page, total_pages)` into the ordered markers a
//! pagination control renders. Pages are 1-indexed throughout this module.

use std::fmt;

/// Marker slots shown before the window switches to ellipsis compression.
pub const VISIBLE_WINDOW: usize = 7;

/// One rendered unit of a pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageMarker {
    /// A clickable page number.
    Page(usize),
    /// A non-interactive placeholder for skipped pages.
    Ellipsis,
}

impl PageMarker {
    pub fn page(&self) -> Option<usize> {
        match self {
            PageMarker::Page(n) => Some(*n),
            PageMarker::Ellipsis => None,
        }
    }

    pub fn is_ellipsis(&self) -> bool {
        matches!(self, PageMarker::Ellipsis)
    }
}

impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageMarker::Page(n) => write!(f, "{}", n),
            PageMarker::Ellipsis => write!(f, "…"),
        }
    }
}

/// Compute the markers for a pagination control.
///
/// Boundaries are intentionally asymmetric: page 4 still shows the leading run
/// `1..=5`, and page `total_pages - 3` already shows the trailing run.
///
/// `total_pages == 0` yields no markers. A `current_page` outside
/// `[1, total_pages]` is clamped first, which selects the same branch the raw
/// value would.
pub fn page_markers(current_page: usize, total_pages: usize) -> Vec<PageMarker> {
    use PageMarker::{Ellipsis, Page};

    if total_pages <= VISIBLE_WINDOW {
        return (1..=total_pages).map(Page).collect();
    }

    let current = current_page.clamp(1, total_pages);

    if current <= 4 {
        let mut markers: Vec<PageMarker> = (1..=5).map(Page).collect();
        markers.push(Ellipsis);
        markers.push(Page(total_pages));
        markers
    } else if current >= total_pages - 3 {
        let mut markers = vec![Page(1), Ellipsis];
        markers.extend((total_pages - 4..=total_pages).map(Page));
        markers
    } else {
        vec![
            Page(1),
            Ellipsis,
            Page(current - 1),
            Page(current),
            Page(current + 1),
            Ellipsis,
            Page(total_pages),
        ]
    }
}

/// The "showing X-Y of Z" summary of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayRange {
    pub start_item: usize,
    pub end_item: usize,
    pub total_items: usize,
}

impl DisplayRange {
    pub fn new(current_page: usize, total_items: usize, items_per_page: usize) -> Self {
        let start_item = if total_items == 0 {
            0
        } else {
            current_page.saturating_sub(1) * items_per_page + 1
        };
        let end_item = (current_page * items_per_page).min(total_items);

        Self {
            start_item,
            end_item,
            total_items,
        }
    }
}

impl fmt::Display for DisplayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} of {}",
            self.start_item, self.end_item, self.total_items
        )
    }
}

/// Paging position of a list view. Recomputed on every navigation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: usize,
    pub total_items: usize,
    pub items_per_page: usize,
}

impl PaginationState {
    pub fn new(total_items: usize, items_per_page: usize) -> Self {
        Self {
            current_page: 1,
            total_items,
            items_per_page: items_per_page.max(1),
        }
    }

    /// At least 1, so an empty list still reads as "page 1 of 1".
    pub fn total_pages(&self) -> usize {
        if self.total_items == 0 {
            1
        } else {
            self.total_items.div_ceil(self.items_per_page)
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.total_pages() > 1
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// Target of the "previous" button, `None` on the first page.
    pub fn previous_page(&self) -> Option<usize> {
        self.can_go_prev().then(|| self.current_page - 1)
    }

    /// Target of the "next" button, `None` on the last page.
    pub fn next_page(&self) -> Option<usize> {
        self.can_go_next().then(|| self.current_page + 1)
    }

    /// Move to `page`, clamped into `[1, total_pages]`.
    pub fn go_to(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.total_pages());
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Replace the item count. The underlying set changed, so paging restarts at 1.
    pub fn set_total_items(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.reset();
    }

    pub fn markers(&self) -> Vec<PageMarker> {
        page_markers(self.current_page, self.total_pages())
    }

    pub fn display_range(&self) -> DisplayRange {
        DisplayRange::new(self.current_page, self.total_items, self.items_per_page)
    }

    /// Zero-based `[start, end)` bounds of the current page within the item list.
    pub fn page_range(&self) -> (usize, usize) {
        let start = (self.current_page.saturating_sub(1) * self.items_per_page)
            .min(self.total_items);
        let end = (start + self.items_per_page).min(self.total_items);
        (start, end)
    }
}

/// A user interaction with the pagination control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Previous,
    Next,
    Select(PageMarker),
}

/// Display-ready model of a pagination control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationControl {
    pub current_page: usize,
    pub total_pages: usize,
    pub markers: Vec<PageMarker>,
    pub range: DisplayRange,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationControl {
    /// Build the control from the raw caller contract. Returns `None` when
    /// `total_pages <= 1`, in which case nothing is rendered. An out-of-range
    /// `current_page` is clamped into `[1, total_pages]` for every field.
    pub fn from_parts(
        current_page: usize,
        total_pages: usize,
        total_items: usize,
        items_per_page: usize,
    ) -> Option<Self> {
        if total_pages <= 1 {
            return None;
        }
        let current_page = current_page.clamp(1, total_pages);

        Some(Self {
            current_page,
            total_pages,
            markers: page_markers(current_page, total_pages),
            range: DisplayRange::new(current_page, total_items, items_per_page),
            has_previous: current_page != 1,
            has_next: current_page != total_pages,
        })
    }

    pub fn build(state: &PaginationState) -> Option<Self> {
        Self::from_parts(
            state.current_page,
            state.total_pages(),
            state.total_items,
            state.items_per_page,
        )
    }

    pub fn label(&self) -> String {
        self.range.to_string()
    }

    pub fn is_current(&self, marker: &PageMarker) -> bool {
        marker.page() == Some(self.current_page)
    }

    /// Page the control reports for `action`, or `None` when it is a no-op.
    ///
    /// Selecting a numeric marker always reports it, including the current page.
    pub fn resolve(&self, action: PageAction) -> Option<usize> {
        match action {
            PageAction::Previous if self.has_previous => Some(self.current_page - 1),
            PageAction::Next if self.has_next => Some(self.current_page + 1),
            PageAction::Previous | PageAction::Next => None,
            PageAction::Select(marker) => marker.page(),
        }
    }

    /// Invoke `on_page_change` for `action` unless it is a no-op.
    /// Returns whether the callback ran.
    pub fn dispatch<F>(&self, action: PageAction, on_page_change: F) -> bool
    where
        F: FnOnce(usize),
    {
        match self.resolve(action) {
            Some(page) => {
                on_page_change(page);
                true
            }
            None => false,
        }
    }
}

/// A list together with the page being shown.
#[derive(Debug, Clone)]
pub struct PaginatedView<T> {
    items: Vec<T>,
    state: PaginationState,
}

impl<T> PaginatedView<T> {
    pub fn new(items: Vec<T>, items_per_page: usize) -> Self {
        let state = PaginationState::new(items.len(), items_per_page);
        Self { items, state }
    }

    pub fn empty(items_per_page: usize) -> Self {
        Self::new(Vec::new(), items_per_page)
    }

    /// Replace the items after a reload and go back to page 1.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.state.set_total_items(items.len());
        self.items = items;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    pub fn go_to(&mut self, page: usize) {
        self.state.go_to(page);
    }

    pub fn reset_page(&mut self) {
        self.state.reset();
    }

    pub fn current_items(&self) -> &[T] {
        let (start, end) = self.state.page_range();
        &self.items[start..end]
    }

    pub fn control(&self) -> Option<PaginationControl> {
        PaginationControl::build(&self.state)
    }

    /// Apply a control interaction. Returns whether the page changed hands to the callback.
    pub fn apply(&mut self, action: PageAction) -> bool {
        let Some(control) = self.control() else {
            return false;
        };
        control.dispatch(action, |page| self.state.go_to(page))
    }
}
