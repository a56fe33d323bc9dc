use thiserror::Error;

/// Invalid analysis setup
///
/// These errors are fatal. Empty selections are *not* reported
/// through this type, they show up as NaN in the affected output slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Unknown particle category: {0}")]
    UnknownCategory(String),
    #[error("Bin partition needs at least two boundaries, got {0}")]
    TooFewBoundaries(usize),
    #[error("Bin boundary {0} is not a finite number")]
    NonFiniteBoundary(f64),
    #[error(
        "Bin boundaries not strictly increasing: \
         {lower} at index {index} is followed by {upper}"
    )]
    NonMonotonicBoundaries {
        index: usize,
        lower: f64,
        upper: f64,
    },
    #[error("Object record in event {0} has neither truth nor prediction")]
    EmptyObjectRecord(u64),
    #[error("Matched jet in event {0} lacks truth or predicted kinematics")]
    IncompleteMatchedJet(u64),
    #[error(
        "Got truth hits for {truth} events, but features for {features} events"
    )]
    MismatchedEventCount { truth: usize, features: usize },
}
