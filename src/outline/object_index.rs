use std::collections::HashMap;

use crate::core::types::Fragment;

/// Dense positions over the feed, ordered by `(page or 0, sequence)`; ties keep feed order.
#[derive(Debug, Clone)]
pub struct ObjectIndex<'a> {
    ordered: Vec<&'a Fragment>,
    positions: HashMap<&'a str, usize>,
}

impl<'a> ObjectIndex<'a> {
    pub fn build(fragments: &'a [Fragment]) -> Self {
        let mut ordered: Vec<&Fragment> = fragments.iter().collect();
        ordered.sort_by_key(|fragment| fragment.ordering_key());
        let positions = ordered
            .iter()
            .enumerate()
            .map(|(pos, fragment)| (fragment.id.as_str(), pos))
            .collect();
        Self { ordered, positions }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn position(&self, fragment_id: &str) -> Option<usize> {
        self.positions.get(fragment_id).copied()
    }

    pub fn get(&self, position: usize) -> Option<&'a Fragment> {
        self.ordered.get(position).copied()
    }

    pub fn id_at(&self, position: usize) -> Option<&'a str> {
        self.get(position).map(|fragment| fragment.id.as_str())
    }

    pub fn fragments(&self) -> &[&'a Fragment] {
        &self.ordered
    }

    pub fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.ordered.iter().map(|fragment| fragment.id.as_str())
    }
}
