use nalgebra::{Matrix3, Matrix4, Vector3};

/// The cross-covariance matrix was too ill-conditioned for a stable SVD (e.g. a
/// colinear or duplicated point set). The solver never panics on this; callers
/// should treat the affected candidate as unusable rather than trust its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvdInstability;

impl std::fmt::Display for SvdInstability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SVD of the cross-covariance matrix did not converge")
    }
}

impl std::error::Error for SvdInstability {}

/// Closed-form rigid (rotation + translation) alignment of `source` onto `target`
/// by Kabsch/Arun SVD least squares. Both slices must have the same length >= 3
/// and be in matched order (`source[i]` corresponds to `target[i]`).
///
/// Returns the 4x4 homogeneous transform `T` such that `T * source ~= target`.
pub fn solve_rigid_transform(
    source: &[Vector3<f64>],
    target: &[Vector3<f64>],
) -> Result<Matrix4<f64>, SvdInstability> {
    assert_eq!(source.len(), target.len());
    assert!(source.len() >= 3);

    let n = source.len() as f64;
    let p_bar: Vector3<f64> = source.iter().sum::<Vector3<f64>>() / n;
    let q_bar: Vector3<f64> = target.iter().sum::<Vector3<f64>>() / n;

    // S = X * Y^T, the 3x3 cross-covariance of the centered point sets.
    let mut s = Matrix3::zeros();
    for (p, q) in source.iter().zip(target.iter()) {
        let x = p - p_bar;
        let y = q - q_bar;
        s += x * y.transpose();
    }

    let svd = s.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(SvdInstability),
    };
    let v = v_t.transpose();

    // Sign correction so R is a proper rotation (det = +1), never a reflection.
    let det = (v * u.transpose()).determinant();
    let d = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, det.signum());

    let r = v * d * u.transpose();
    let t = q_bar - r * p_bar;

    let mut transform = Matrix4::identity();
    transform.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
    transform.fixed_view_mut::<3, 1>(0, 3).copy_from(&t);
    Ok(transform)
}
