use thiserror::Error;

/// Which input map an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Target,
    Source,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Target => write!(f, "target"),
            Side::Source => write!(f, "source"),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
/// Error types for the **stem-register** registration engine
pub enum RegistrationError {
    #[error("{side} map has only {count} stem(s) after pruning, need at least 3")]
    InsufficientStems { side: Side, count: usize },
    #[error("no candidate pair of triplets survived the diameter/edge pre-filter")]
    NoCandidatePairs,
}
