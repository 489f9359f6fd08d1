use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info};
use nalgebra::Matrix4;
use rayon::prelude::*;

use crate::config::{within_diameter_tolerance, RegistrationConfig};
use crate::error::{RegistrationError, Side};
use crate::group::StemGroup;
use crate::pair::{compare_for_ranking, PairOfStemGroups};
use crate::ransac;
use crate::stem::{Stem, StemMap};
use crate::triplet::{generate_descriptors, StemTriplet};

/// The winning registration: the best rigid transform found, its residual error,
/// and the ordered list of stem pairs (target, source) that make up its
/// consensus group.
#[derive(Debug, Clone)]
pub struct RegistrationResult {
    pub transform: Matrix4<f64>,
    pub mse: f64,
    pub consensus: Vec<(Stem, Stem)>,
    /// Candidate pairs whose Procrustes solve hit an SVD instability and were
    /// excluded from ranking rather than crashing the batch.
    pub unstable_pairs_skipped: usize,
    /// Stems dropped by the lonely-stem pre-pruning step on either side.
    pub lonely_stems_removed: usize,
}

/// Register `source` onto `target`: find the rigid transform that best aligns
/// the two stem maps, discovering correspondence by triplet matching,
/// diameter/edge pre-filtering, closed-form Procrustes solves, and RANSAC-style
/// consensus growth.
///
/// A pure function: neither input map is mutated; both are cloned internally
/// before pruning.
pub fn register(
    target: &StemMap,
    source: &StemMap,
    config: &RegistrationConfig,
) -> Result<RegistrationResult, RegistrationError> {
    let (pruned_target, pruned_source, lonely_stems_removed) =
        remove_lonely_stems(target, source, config.diam_error_tol);
    debug!(
        "pruned {} lonely stem(s); target now has {}, source has {}",
        lonely_stems_removed,
        pruned_target.len(),
        pruned_source.len()
    );

    if pruned_target.len() < 3 {
        return Err(RegistrationError::InsufficientStems {
            side: Side::Target,
            count: pruned_target.len(),
        });
    }
    if pruned_source.len() < 3 {
        return Err(RegistrationError::InsufficientStems {
            side: Side::Source,
            count: pruned_source.len(),
        });
    }

    let mut target_descriptors = generate_descriptors(&pruned_target);
    let mut source_descriptors = generate_descriptors(&pruned_source);
    if config.filter_degenerate_triplets {
        target_descriptors.retain(|t| !t.is_degenerate(config.linearity_tol));
        source_descriptors.retain(|t| !t.is_degenerate(config.linearity_tol));
    }
    debug!(
        "{} target triplet(s), {} source triplet(s) after colinearity filtering",
        target_descriptors.len(),
        source_descriptors.len()
    );

    let mut pairs = generate_pairs(&target_descriptors, &source_descriptors, config);
    info!("{} candidate pair(s) survived the pre-filter", pairs.len());
    if pairs.is_empty() {
        return Err(RegistrationError::NoCandidatePairs);
    }

    let unstable = AtomicUsize::new(0);
    pairs.par_iter_mut().for_each(|pair| {
        if pair.compute_best_transform().is_ok() {
            ransac::grow(pair, &pruned_source, &pruned_target, config);
        }
        // Either the initial solve failed, or growth's last re-solve did; both
        // leave `transform_computed` false and the pair unusable for ranking.
        if !pair.transform_computed() {
            unstable.fetch_add(1, Ordering::Relaxed);
        }
    });

    pairs.sort_by(compare_for_ranking);
    let best = pairs.first().ok_or(RegistrationError::NoCandidatePairs)?;
    if !best.transform_computed() {
        return Err(RegistrationError::NoCandidatePairs);
    }

    info!(
        "best pair: {} stem(s), MSE {:.6e}",
        best.len(),
        best.mean_squared_error()
    );

    let consensus = (0..best.len())
        .map(|i| (*best.target_group().stem(i), *best.source_group().stem(i)))
        .collect();

    Ok(RegistrationResult {
        transform: *best.best_transform(),
        mse: best.mean_squared_error(),
        consensus,
        unstable_pairs_skipped: unstable.load(Ordering::Relaxed),
        lonely_stems_removed,
    })
}

/// Drop every source stem with no target stem within diameter tolerance, and
/// vice versa. Returns the pruned copies and the total number of stems removed
/// across both sides. Each side is a single filtering pass rather than
/// index-descending deletion, so removal order never matters.
fn remove_lonely_stems(
    target: &StemMap,
    source: &StemMap,
    diam_error_tol: f64,
) -> (StemMap, StemMap, usize) {
    let lonely_source: Vec<usize> = (0..source.len())
        .filter(|&i| {
            !target
                .stems()
                .iter()
                .any(|t| within_diameter_tolerance(t.radius(), source.stems()[i].radius(), diam_error_tol))
        })
        .collect();
    let mut pruned_source = source.clone();
    pruned_source.remove_indices(&lonely_source);

    let lonely_target: Vec<usize> = (0..target.len())
        .filter(|&j| {
            !source
                .stems()
                .iter()
                .any(|s| within_diameter_tolerance(s.radius(), target.stems()[j].radius(), diam_error_tol))
        })
        .collect();
    let mut pruned_target = target.clone();
    pruned_target.remove_indices(&lonely_target);

    (
        pruned_target,
        pruned_source,
        lonely_source.len() + lonely_target.len(),
    )
}

/// Cross-join every source triplet against every target triplet, accepting a
/// pair only if it passes the diameter and edge-length consistency tests. The
/// outer loop over source triplets runs in parallel; each worker's accepted
/// pairs are collected into its own buffer and concatenated, so there is no
/// shared mutable state to lock.
fn generate_pairs<'t, 's>(
    target_descriptors: &[StemTriplet<'t>],
    source_descriptors: &[StemTriplet<'s>],
    config: &RegistrationConfig,
) -> Vec<PairOfStemGroups<'t, 's>> {
    source_descriptors
        .par_iter()
        .flat_map_iter(|src_triplet| {
            target_descriptors.iter().filter_map(move |tgt_triplet| {
                let target_group = StemGroup::new(
                    tgt_triplet.group.map(),
                    tgt_triplet.group.indices().to_vec(),
                );
                let source_group = StemGroup::new(
                    src_triplet.group.map(),
                    src_triplet.group.indices().to_vec(),
                );
                let pair = PairOfStemGroups::new(target_group, source_group);
                passes_prefilter(&pair, config).then_some(pair)
            })
        })
        .collect()
}

fn passes_prefilter(pair: &PairOfStemGroups, config: &RegistrationConfig) -> bool {
    let diameter_ok = pair
        .radius_similarity()
        .iter()
        .all(|&e| e <= config.diam_error_tol);
    let edges_ok = pair
        .vertice_difference()
        .iter()
        .all(|&e| e <= 2.0 * config.ransac_tol);
    diameter_ok && edges_ok
}
