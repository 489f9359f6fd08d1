//! Rigid registration between two stem maps recovered from terrestrial laser
//! scans.
//!
//! The entry point is [`register`]: given a target and a source [`StemMap`], it
//! discovers correspondence by triplet-based combinatorial matching and returns
//! the best rigid transform aligning `source` onto `target`, along with its
//! residual error and the consensus set of paired stems.
//!
//! Stem-map file parsing, CLI argument handling, and log initialization are
//! left to callers (see the sibling `stem-register-cli` crate); this crate is a
//! pure computational core with no I/O.

mod config;
mod error;
mod group;
mod pair;
mod procrustes;
mod ransac;
mod registration;
mod stem;
mod triplet;

pub use config::{RegistrationConfig, DIAMETER_ERROR_TOL, LINEARITY_TOL};
pub use error::{RegistrationError, Side};
pub use group::StemGroup;
pub use pair::{compare_for_ranking, PairOfStemGroups};
pub use procrustes::{solve_rigid_transform, SvdInstability};
pub use ransac::grow as ransac_grow;
pub use registration::{register, RegistrationResult};
pub use stem::{Stem, StemMap};
pub use triplet::{generate_descriptors, generate_triplets, StemTriplet};
