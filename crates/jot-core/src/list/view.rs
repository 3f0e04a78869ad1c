//! List view controller.

use super::criteria::{CategoryFilter, FilterCriteria};
use crate::note::Note;

/// Owns the working set and filter criteria, and keeps the visible
/// subset derived from them.
///
/// The derived view is a pure function of its two inputs and is re-run
/// whenever either changes. Filtering never touches the network; it
/// operates entirely on the already-fetched working set.
#[derive(Debug, Default)]
pub struct NoteListView {
    working_set: Vec<Note>,
    criteria: FilterCriteria,
    visible: Vec<Note>,
}

impl NoteListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the working set wholesale (after a fetch or reload) and
    /// re-derives the view.
    pub fn replace_working_set(&mut self, notes: Vec<Note>) {
        self.working_set = notes;
        self.derive();
    }

    /// Clears the working set (on sign-out) and re-derives the view.
    pub fn clear(&mut self) {
        self.working_set.clear();
        self.derive();
    }

    /// Updates the search term and re-derives the view.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.criteria.search = term.into();
        self.derive();
    }

    /// Updates the category selection and re-derives the view.
    pub fn set_category(&mut self, category: CategoryFilter) {
        self.criteria.category = category;
        self.derive();
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// The full working set, in fetch order.
    pub fn working_set(&self) -> &[Note] {
        &self.working_set
    }

    /// The visible subset, in working-set order.
    pub fn visible(&self) -> &[Note] {
        &self.visible
    }

    fn derive(&mut self) {
        self.visible = self
            .working_set
            .iter()
            .filter(|note| self.criteria.matches(note))
            .cloned()
            .collect();
    }
}
