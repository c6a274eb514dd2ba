//! Multi-selection inside a folder gallery.
//!
//! The anchor is the most recently toggled photo. A range request with an
//! anchor and a non-empty selection adds the whole closed interval between
//! anchor and target; otherwise it is a plain toggle on the target.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub(crate) struct Selection {
    selected: HashSet<String>,
    anchor: Option<String>,
}

impl Selection {
    pub fn toggle(&mut self, locator: &str) {
        if !self.selected.remove(locator) {
            self.selected.insert(locator.to_string());
        }
        self.anchor = Some(locator.to_string());
    }

    /// Add every photo between the anchor and `target` (inclusive).
    ///
    /// `order` is the gallery order. A target outside the gallery is ignored.
    pub fn select_range(&mut self, order: &[String], target: &str) {
        let Some(target_idx) = order.iter().position(|l| l == target) else {
            return;
        };

        let anchor_idx = self
            .anchor
            .as_deref()
            .filter(|_| !self.selected.is_empty())
            .and_then(|anchor| order.iter().position(|l| l == anchor));

        match anchor_idx {
            Some(anchor_idx) => {
                let (start, end) = (anchor_idx.min(target_idx), anchor_idx.max(target_idx));
                self.selected.extend(order[start..=end].iter().cloned());
                self.anchor = Some(target.to_string());
            }
            None => self.toggle(target),
        }
    }

    pub fn select_all(&mut self, order: &[String]) {
        self.selected.extend(order.iter().cloned());
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected locators in gallery order.
    pub fn in_order(&self, order: &[String]) -> Vec<String> {
        order
            .iter()
            .filter(|l| self.selected.contains(*l))
            .cloned()
            .collect()
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
