use nalgebra::{Vector3, Vector4};

use crate::stem::{Stem, StemMap};

/// An ordered sequence of non-owning handles into a [`StemMap`].
///
/// Order is induced by ascending radius (stable tie-break by input order) once
/// [`StemGroup::sort_by_radius`] has been called; a freshly constructed group
/// preserves the order its indices were given in. The map passed at construction
/// must outlive the group.
#[derive(Debug, Clone)]
pub struct StemGroup<'a> {
    map: &'a StemMap,
    indices: Vec<usize>,
}

impl<'a> StemGroup<'a> {
    pub fn new(map: &'a StemMap, indices: Vec<usize>) -> Self {
        Self { map, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn map(&self) -> &'a StemMap {
        self.map
    }

    pub fn stem(&self, i: usize) -> &Stem {
        &self.map.stems()[self.indices[i]]
    }

    pub fn radius(&self, i: usize) -> f64 {
        self.stem(i).radius()
    }

    pub fn coords(&self, i: usize) -> Vector4<f64> {
        self.stem(i).coords()
    }

    pub fn position(&self, i: usize) -> Vector3<f64> {
        self.stem(i).position()
    }

    /// Whether the map index backing slot `i` is already `map_index`.
    pub fn contains_map_index(&self, map_index: usize) -> bool {
        self.indices.contains(&map_index)
    }

    /// Stable sort by ascending radius; ties keep their current relative order.
    pub fn sort_by_radius(&mut self) {
        let map = self.map;
        self.indices
            .sort_by(|&a, &b| map.stems()[a].radius().total_cmp(&map.stems()[b].radius()));
    }

    /// Append a new handle (does not re-sort).
    pub fn push(&mut self, map_index: usize) {
        self.indices.push(map_index);
    }
}
