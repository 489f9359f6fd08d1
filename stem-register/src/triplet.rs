use itertools::Itertools;
use nalgebra::linalg::SymmetricEigen;
use nalgebra::Matrix3;

use crate::group::StemGroup;
use crate::stem::StemMap;

/// A 3-subset of a stem map together with the eigenvalues of its position
/// covariance matrix.
///
/// Eigenvalues are sorted ascending; only their real parts matter downstream
/// (the covariance matrix of real positions is symmetric, so its eigenvalues are
/// guaranteed real).
pub struct StemTriplet<'a> {
    pub group: StemGroup<'a>,
    pub eigenvalues: [f64; 3],
}

impl<'a> StemTriplet<'a> {
    pub fn new(group: StemGroup<'a>) -> Self {
        debug_assert_eq!(group.len(), 3, "a StemTriplet's group must have size 3");
        let eigenvalues = covariance_eigenvalues(&group);
        Self { group, eigenvalues }
    }

    /// A triplet is degenerate (near-colinear) when its two largest eigenvalues
    /// are dominated by the largest one: `lambda_max / (lambda_max + lambda_mid)`
    /// exceeds `linearity_tol`. Three colinear points have one large eigenvalue
    /// along the line and two near-zero eigenvalues perpendicular to it, so this
    /// ratio tends to 1 exactly in the degenerate case.
    pub fn is_degenerate(&self, linearity_tol: f64) -> bool {
        let lambda_mid = self.eigenvalues[1];
        let lambda_max = self.eigenvalues[2];
        lambda_max / (lambda_max + lambda_mid) > linearity_tol
    }
}

fn covariance_eigenvalues(group: &StemGroup) -> [f64; 3] {
    let mean = (group.position(0) + group.position(1) + group.position(2)) / 3.0;
    let centered: Vec<_> = (0..3).map(|i| group.position(i) - mean).collect();

    let mut covariance = Matrix3::zeros();
    for i in 0..3 {
        for j in 0..3 {
            covariance[(i, j)] = centered.iter().map(|p| p[i] * p[j]).sum();
        }
    }

    let symmetric = (covariance + covariance.transpose()) * 0.5;
    let eigen = SymmetricEigen::new(symmetric);
    let mut eigenvalues = [eigen.eigenvalues[0], eigen.eigenvalues[1], eigen.eigenvalues[2]];
    eigenvalues.sort_by(f64::total_cmp);
    eigenvalues
}

/// Enumerate all `C(n, 3)` triplets of distinct stem indices in lexicographic
/// order on the index tuple. Requires `map.len() >= 3`.
pub fn generate_triplets(map: &StemMap) -> Vec<StemGroup<'_>> {
    (0..map.len())
        .combinations(3)
        .map(|idx| StemGroup::new(map, idx))
        .collect()
}

/// Generate triplets and their eigen-spectrum descriptors for every 3-subset of
/// `map`.
pub fn generate_descriptors(map: &StemMap) -> Vec<StemTriplet<'_>> {
    generate_triplets(map)
        .into_iter()
        .map(StemTriplet::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stem::Stem;
    use approx::assert_relative_eq;

    #[test]
    fn enumerates_all_triplets_in_lex_order() {
        let map = StemMap::from_stems(vec![
            Stem::new(0.0, 0.0, 0.0, 0.1),
            Stem::new(1.0, 0.0, 0.0, 0.1),
            Stem::new(2.0, 0.0, 0.0, 0.1),
            Stem::new(3.0, 0.0, 0.0, 0.1),
        ]);
        let triplets = generate_triplets(&map);
        let idx_tuples: Vec<_> = triplets.iter().map(|g| g.indices().to_vec()).collect();
        assert_eq!(
            idx_tuples,
            vec![
                vec![0, 1, 2],
                vec![0, 1, 3],
                vec![0, 2, 3],
                vec![1, 2, 3],
            ]
        );
    }

    #[test]
    fn eigenvalues_are_ascending() {
        let map = StemMap::from_stems(vec![
            Stem::new(0.0, 0.0, 0.0, 0.1),
            Stem::new(1.0, 0.3, 0.0, 0.1),
            Stem::new(0.2, 1.0, 0.5, 0.1),
        ]);
        let descriptors = generate_descriptors(&map);
        let eigs = descriptors[0].eigenvalues;
        assert!(eigs[0] <= eigs[1]);
        assert!(eigs[1] <= eigs[2]);
    }

    #[test]
    fn colinear_triplet_is_flagged_degenerate() {
        let map = StemMap::from_stems(vec![
            Stem::new(0.0, 0.0, 0.0, 0.1),
            Stem::new(1.0, 0.0, 0.0, 0.12),
            Stem::new(2.0, 0.0, 0.0, 0.15),
        ]);
        let descriptors = generate_descriptors(&map);
        let triplet = &descriptors[0];
        let ratio = triplet.eigenvalues[2] / (triplet.eigenvalues[2] + triplet.eigenvalues[1]);
        assert!(ratio > 0.975);
        assert!(triplet.is_degenerate(0.975));
    }

    #[test]
    fn non_colinear_triplet_is_not_degenerate() {
        let map = StemMap::from_stems(vec![
            Stem::new(0.0, 0.0, 0.0, 0.1),
            Stem::new(1.0, 0.0, 0.0, 0.1),
            Stem::new(0.0, 1.0, 0.0, 0.1),
        ]);
        let descriptors = generate_descriptors(&map);
        assert!(!descriptors[0].is_degenerate(0.975));
        assert_relative_eq!(descriptors[0].eigenvalues[0], 0.0, epsilon = 1e-12);
    }
}
