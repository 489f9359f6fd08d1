use std::cmp::Ordering;

use nalgebra::Matrix4;

use crate::group::StemGroup;
use crate::procrustes::{solve_rigid_transform, SvdInstability};

/// A candidate correspondence between a target stem group and a source stem
/// group of equal size, along with the best rigid transform found so far.
///
/// Both groups are kept in radius-sorted order at construction (so stem `i` in
/// `source` corresponds by rank to stem `i` in `target`); once growth begins via
/// [`PairOfStemGroups::add_fitting_stem`] they are appended to in matched order
/// instead, per the correspondence discovered by the RANSAC loop.
pub struct PairOfStemGroups<'t, 's> {
    target: StemGroup<'t>,
    source: StemGroup<'s>,
    best_transform: Matrix4<f64>,
    transform_computed: bool,
    radius_similarity: Vec<f64>,
    mse: f64,
}

impl<'t, 's> PairOfStemGroups<'t, 's> {
    /// `target` and `source` must have the same non-zero length (at least 3).
    pub fn new(mut target: StemGroup<'t>, mut source: StemGroup<'s>) -> Self {
        assert_eq!(target.len(), source.len());
        assert!(target.len() >= 3);
        target.sort_by_radius();
        source.sort_by_radius();

        let mut pair = Self {
            target,
            source,
            best_transform: Matrix4::identity(),
            transform_computed: false,
            radius_similarity: Vec::new(),
            mse: f64::INFINITY,
        };
        pair.update_radius_similarity();
        pair
    }

    pub fn target_group(&self) -> &StemGroup<'t> {
        &self.target
    }

    pub fn source_group(&self) -> &StemGroup<'s> {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn best_transform(&self) -> &Matrix4<f64> {
        &self.best_transform
    }

    pub fn transform_computed(&self) -> bool {
        self.transform_computed
    }

    /// `|r_src[i] - r_tgt[i]| / mean(r_src[i], r_tgt[i])` for every paired stem.
    pub fn radius_similarity(&self) -> &[f64] {
        &self.radius_similarity
    }

    /// `| ||src[i] - src[i+1]|| - ||tgt[i] - tgt[i+1]|| |` for every edge of the
    /// cyclic polygon formed by the group (wrapping the last stem back to the
    /// first).
    pub fn vertice_difference(&self) -> Vec<f64> {
        let n = self.len();
        (0..n)
            .map(|i| {
                let next = (i + 1) % n;
                let source_edge = (self.source.position(i) - self.source.position(next)).norm();
                let target_edge = (self.target.position(i) - self.target.position(next)).norm();
                (source_edge - target_edge).abs()
            })
            .collect()
    }

    /// Solve the Procrustes alignment between the current groups, caching the
    /// transform and MSE. On SVD instability the previous transform (if any) is
    /// left untouched and `transform_computed` is cleared.
    pub fn compute_best_transform(&mut self) -> Result<Matrix4<f64>, SvdInstability> {
        let source_pts: Vec<_> = (0..self.len()).map(|i| self.source.position(i)).collect();
        let target_pts: Vec<_> = (0..self.len()).map(|i| self.target.position(i)).collect();

        match solve_rigid_transform(&source_pts, &target_pts) {
            Ok(transform) => {
                self.best_transform = transform;
                self.transform_computed = true;
                self.update_mean_squared_error();
                Ok(transform)
            }
            Err(e) => {
                self.transform_computed = false;
                Err(e)
            }
        }
    }

    /// Mean squared residual of the cached transform over the whole consensus
    /// group. Requires [`PairOfStemGroups::compute_best_transform`] to have
    /// succeeded at least once.
    pub fn mean_squared_error(&self) -> f64 {
        debug_assert!(
            self.transform_computed,
            "mean_squared_error called before a successful compute_best_transform"
        );
        self.mse
    }

    fn update_mean_squared_error(&mut self) {
        let mut mse = 0.0;
        for i in 0..self.len() {
            let residual = self.target.coords(i) - self.best_transform * self.source.coords(i);
            mse += residual.norm_squared();
        }
        self.mse = mse;
    }

    fn update_radius_similarity(&mut self) {
        self.radius_similarity = (0..self.len())
            .map(|i| {
                let r_src = self.source.radius(i);
                let r_tgt = self.target.radius(i);
                (r_src - r_tgt).abs() / ((r_src + r_tgt) / 2.0)
            })
            .collect();
    }

    /// Append a new correspondence found by the growth loop. Does not re-sort:
    /// once growth has started, append order defines the correspondence.
    pub fn add_fitting_stem(&mut self, source_index: usize, target_index: usize) {
        self.source.push(source_index);
        self.target.push(target_index);
        self.update_radius_similarity();
    }
}

/// Ranking order: a larger consensus group always outranks a smaller one; ties
/// are broken by lower MSE. Pairs whose transform never converged sort last.
pub fn compare_for_ranking(a: &PairOfStemGroups, b: &PairOfStemGroups) -> Ordering {
    match (a.transform_computed, b.transform_computed) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (true, true) => b
            .len()
            .cmp(&a.len())
            .then_with(|| a.mean_squared_error().total_cmp(&b.mean_squared_error())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stem::{Stem, StemMap};
    use approx::assert_relative_eq;

    fn triplet_maps() -> (StemMap, StemMap) {
        let target = StemMap::from_stems(vec![
            Stem::new(0.0, 0.0, 0.0, 0.10),
            Stem::new(1.0, 0.0, 0.0, 0.12),
            Stem::new(0.0, 1.0, 0.0, 0.15),
        ]);
        let source = target.clone();
        (target, source)
    }

    #[test]
    fn construction_sorts_both_groups_by_radius() {
        let (target, source) = triplet_maps();
        let target_group = StemGroup::new(&target, vec![2, 0, 1]);
        let source_group = StemGroup::new(&source, vec![1, 2, 0]);
        let pair = PairOfStemGroups::new(target_group, source_group);
        for i in 0..pair.len() - 1 {
            assert!(pair.target_group().radius(i) <= pair.target_group().radius(i + 1));
            assert!(pair.source_group().radius(i) <= pair.source_group().radius(i + 1));
        }
    }

    #[test]
    fn identity_pair_has_zero_mse() {
        let (target, source) = triplet_maps();
        let target_group = StemGroup::new(&target, vec![0, 1, 2]);
        let source_group = StemGroup::new(&source, vec![0, 1, 2]);
        let mut pair = PairOfStemGroups::new(target_group, source_group);
        pair.compute_best_transform().unwrap();
        assert_relative_eq!(pair.mean_squared_error(), 0.0, epsilon = 1e-18);
        for r in pair.radius_similarity() {
            assert_relative_eq!(*r, 0.0, epsilon = 1e-18);
        }
    }

    #[test]
    fn growth_appends_without_resorting() {
        let (target, source) = triplet_maps();
        let mut target_map_ext = target.clone();
        let mut source_map_ext = source.clone();
        target_map_ext.add_stem(Stem::new(5.0, 5.0, 0.0, 0.5));
        source_map_ext.add_stem(Stem::new(5.0, 5.0, 0.0, 0.5));

        let target_group = StemGroup::new(&target_map_ext, vec![0, 1, 2]);
        let source_group = StemGroup::new(&source_map_ext, vec![0, 1, 2]);
        let mut pair = PairOfStemGroups::new(target_group, source_group);
        assert_eq!(pair.len(), 3);
        pair.add_fitting_stem(3, 3);
        assert_eq!(pair.len(), 4);
        // the newly added stem keeps its append position, not a sorted one
        assert_eq!(pair.target_group().indices()[3], 3);
        assert_eq!(pair.source_group().indices()[3], 3);
    }

    #[test]
    fn ranking_prefers_larger_then_lower_mse() {
        let (target, source) = triplet_maps();
        let bigger = PairOfStemGroups::new(
            StemGroup::new(&target, vec![0, 1, 2]),
            StemGroup::new(&source, vec![0, 1, 2]),
        );
        let mut bigger = bigger;
        bigger.add_fitting_stem(0, 0); // size 4 now, reuses an index but fine for ranking test
        bigger.compute_best_transform().unwrap();

        let mut smaller = PairOfStemGroups::new(
            StemGroup::new(&target, vec![0, 1, 2]),
            StemGroup::new(&source, vec![0, 1, 2]),
        );
        smaller.compute_best_transform().unwrap();

        assert_eq!(compare_for_ranking(&bigger, &smaller), Ordering::Less);
    }
}
