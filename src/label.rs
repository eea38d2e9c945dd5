//! Hierarchical citation labels.
//!
//! A label is `[part, section, level1?, level2?, level3?, level4?]`. Absent
//! levels are left out of the emitted label, so emitted labels hold between
//! two and six entries.

use crate::grammar::MarkerChain;

/// A citation label with an explicit presence flag per paragraph level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    part: String,
    section: String,
    levels: [Option<String>; 4],
}

impl Label {
    /// A label naming a whole section.
    pub fn new(part: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            section: section.into(),
            levels: Default::default(),
        }
    }

    /// Replaces every paragraph level with those of `chain`.
    pub fn with_head(mut self, chain: &MarkerChain) -> Self {
        self.levels = chain.to_levels();
        self
    }

    /// Splices a list item into the running label.
    ///
    /// If the item's shallowest marker sits at depth `k`, levels `k..=4` are
    /// taken from the item (deeper levels it lacks become absent) and the
    /// levels above `k` are inherited unchanged.
    pub fn splice(&mut self, chain: &MarkerChain) {
        let Some(depth) = chain.depth() else {
            return;
        };
        for (slot, level) in self
            .levels
            .iter_mut()
            .zip(chain.to_levels())
            .skip(depth - 1)
        {
            *slot = level;
        }
    }

    /// The label as emitted: part, section, then the present levels in order.
    pub fn to_vec(&self) -> Vec<String> {
        let mut label = vec![self.part.clone(), self.section.clone()];
        label.extend(self.levels.iter().flatten().cloned());
        label
    }
}
