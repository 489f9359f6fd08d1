/// Max relative diameter error for two stems to be considered a match.
pub const DIAMETER_ERROR_TOL: f64 = 0.015;

/// Max `lambda_max / (lambda_max + lambda_mid)` ratio for a triplet's covariance
/// spectrum before it is flagged as (near-)colinear and unusable for a rigid solve.
pub const LINEARITY_TOL: f64 = 0.975;

/// Tolerances and feature flags the registration driver is parameterized over.
///
/// `ransac_tol` has no sensible default: it is a physical distance (meters) that
/// depends on scan noise and registration precision, typically 0.1-0.5m, and must
/// be supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistrationConfig {
    /// Max relative diameter error to accept a correspondence.
    pub diam_error_tol: f64,
    /// Max Euclidean distance (meters) for the RANSAC growth loop to accept a match.
    pub ransac_tol: f64,
    /// Max `lambda_max / (lambda_max + lambda_mid)` for a usable triplet.
    pub linearity_tol: f64,
    /// Drop degenerate (near-colinear) triplets before pairing.
    pub filter_degenerate_triplets: bool,
}

/// Whether two radii agree within `tol` relative error: `|r_a - r_b| /
/// mean(r_a, r_b) <= tol`. Shared by the pre-filter (§4.E) and the RANSAC growth
/// loop (§4.G), which the spec requires use the same tolerance constant.
pub(crate) fn within_diameter_tolerance(r_a: f64, r_b: f64, tol: f64) -> bool {
    (r_a - r_b).abs() / ((r_a + r_b) / 2.0) <= tol
}

impl RegistrationConfig {
    /// Construct a config with the spec's default diameter/linearity tolerances
    /// and the given RANSAC distance tolerance.
    pub fn new(ransac_tol: f64) -> Self {
        Self {
            diam_error_tol: DIAMETER_ERROR_TOL,
            ransac_tol,
            linearity_tol: LINEARITY_TOL,
            filter_degenerate_triplets: true,
        }
    }

    pub fn with_diam_error_tol(mut self, tol: f64) -> Self {
        self.diam_error_tol = tol;
        self
    }

    pub fn with_linearity_tol(mut self, tol: f64) -> Self {
        self.linearity_tol = tol;
        self
    }

    pub fn with_filter_degenerate_triplets(mut self, filter: bool) -> Self {
        self.filter_degenerate_triplets = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_spec() {
        let config = RegistrationConfig::new(0.2);
        assert_eq!(config.diam_error_tol, DIAMETER_ERROR_TOL);
        assert_eq!(config.linearity_tol, LINEARITY_TOL);
        assert_eq!(config.ransac_tol, 0.2);
        assert!(config.filter_degenerate_triplets);
    }

    #[rstest]
    #[case(0.10, 0.10, true)] // identical radii
    #[case(0.10, 0.1014, true)] // ~1.39% relative error, under the 1.5% default
    #[case(0.10, 0.1016, false)] // ~1.59% relative error, over the 1.5% default
    #[case(0.10, 0.11, false)] // grossly mismatched
    fn within_diameter_tolerance_boundary_cases(#[case] r_a: f64, #[case] r_b: f64, #[case] expected: bool) {
        assert_eq!(within_diameter_tolerance(r_a, r_b, DIAMETER_ERROR_TOL), expected);
    }
}
