//! Row selection keyed by record id
//!
//! The selection spans the whole record set, not the rendered page. Paging,
//! sorting and filtering never drop ids; only [`Selection::clear`] and
//! [`Selection::retain_existing`] do.

use propdesk_core::RecordId;
use std::collections::HashSet;

/// Header checkbox state over the visible rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibleSelection {
    None,
    Some,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<RecordId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one id. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &RecordId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    pub fn select(&mut self, id: RecordId) {
        self.ids.insert(id);
    }

    pub fn deselect(&mut self, id: &RecordId) {
        self.ids.remove(id);
    }

    /// Add every visible id
    pub fn select_visible<'a>(&mut self, visible: impl IntoIterator<Item = &'a RecordId>) {
        self.ids.extend(visible.into_iter().cloned());
    }

    /// Flip membership of every visible id
    pub fn invert_visible<'a>(&mut self, visible: impl IntoIterator<Item = &'a RecordId>) {
        for id in visible {
            self.toggle(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_selected(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    /// Selected ids in a stable (sorted) order
    pub fn selected_ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }

    /// How many of the given ids are selected
    pub fn count_within<'a>(&self, ids: impl IntoIterator<Item = &'a RecordId>) -> usize {
        ids.into_iter().filter(|id| self.ids.contains(*id)).count()
    }

    /// Drop ids whose records no longer exist in the source. Returns the count dropped.
    pub fn retain_existing<'a>(&mut self, existing: impl IntoIterator<Item = &'a RecordId>) -> usize {
        let existing: HashSet<&RecordId> = existing.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| existing.contains(id));
        before - self.ids.len()
    }

    pub fn visible_state<'a>(&self, visible: impl IntoIterator<Item = &'a RecordId>) -> VisibleSelection {
        let mut total = 0;
        let mut selected = 0;
        for id in visible {
            total += 1;
            if self.ids.contains(id) {
                selected += 1;
            }
        }
        match selected {
            0 => VisibleSelection::None,
            n if n == total => VisibleSelection::All,
            _ => VisibleSelection::Some,
        }
    }
}

impl FromIterator<RecordId> for Selection {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
