use log::trace;

use crate::config::{within_diameter_tolerance, RegistrationConfig};
use crate::pair::PairOfStemGroups;
use crate::stem::StemMap;

/// Grow `pair` in place by repeatedly scanning the whole source map (transformed
/// by the pair's current best transform) against the whole target map for
/// stems not yet in the consensus, appending every match, and re-solving.
/// Stops when a pass finds no new match, or when the re-solve becomes unstable.
///
/// Each match is claimed into `pair` as soon as it is found, not deferred to the
/// end of the pass: `pair.target_group()` must reflect every claim made earlier
/// in the *same* pass, so a target stem already claimed by one source index is
/// excluded from matching a later source index within that pass (mirroring the
/// live `stemAlreadyInGroup` check of the original growth loop this is
/// grounded on).
///
/// Returns the number of stems appended across every pass. Check
/// [`PairOfStemGroups::transform_computed`] afterward: a `false` result means
/// the last re-solve hit an SVD instability and the pair's transform is stale.
pub fn grow(
    pair: &mut PairOfStemGroups,
    source_map: &StemMap,
    target_map: &StemMap,
    config: &RegistrationConfig,
) -> usize {
    let mut total_added = 0usize;

    loop {
        let mut transformed_source = source_map.clone();
        transformed_source.apply_transform(pair.best_transform());

        let mut added_this_pass = 0usize;
        for i in 0..source_map.len() {
            if pair.source_group().contains_map_index(i) {
                continue;
            }
            let transformed_position = transformed_source.stems()[i].position();
            for j in 0..target_map.len() {
                if pair.target_group().contains_map_index(j) {
                    continue;
                }
                let distance = (transformed_position - target_map.stems()[j].position()).norm();
                if distance <= config.ransac_tol
                    && within_diameter_tolerance(
                        source_map.stems()[i].radius(),
                        target_map.stems()[j].radius(),
                        config.diam_error_tol,
                    )
                {
                    pair.add_fitting_stem(i, j);
                    added_this_pass += 1;
                }
            }
        }

        if added_this_pass == 0 {
            break;
        }

        total_added += added_this_pass;
        trace!(
            "RANSAC growth: +{} stems, consensus now {}",
            added_this_pass,
            pair.len()
        );

        if pair.compute_best_transform().is_err() {
            break;
        }
    }

    total_added
}
