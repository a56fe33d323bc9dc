//! `pfeval` evaluates particle-flow reconstruction models by comparing
//! predicted showers and jets to the truth.
//!
//! The input is the output of an external matching stage: a table of
//! truth and predicted objects, a table of truth and predicted jets,
//! and optionally the hit-level truth and features of each event.
//! The output is a set of numeric summaries for an external plotting
//! layer.
//!
//! # How to use
//!
//! The easiest way is to build an [analysis::Analysis] from a
//! [config::Config] and [run](analysis::Analysis::run) it. The
//! individual metrics can also be computed directly.
//!
//! ## Most relevant modules
//!
//! - [prelude] exports a list of the most relevant classes and objects
//! - [mask] for selections of table rows
//! - [ratio] for efficiencies, fake rates, and classification probabilities
//! - [residual] for residual distributions
//! - [calibration] for the jet momentum calibration
//! - [distribution] for per-event multiplicities
//!

/// Run all metrics
pub mod analysis;
/// Bin partitions
pub mod bins;
/// Jet momentum calibration
pub mod calibration;
/// Analysis settings
pub mod config;
/// Object multiplicities per event
pub mod distribution;
/// Error types
pub mod error;
/// Row selections
pub mod mask;
/// Particle categories
pub mod pid;
/// Most important exports
pub mod prelude;
/// Binned ratios
pub mod ratio;
/// Truth and prediction records
pub mod record;
/// Residual distributions
pub mod residual;
/// Binned energy and momentum resolution
pub mod resolution;
/// Summary statistics
pub mod summary;

use lazy_static::lazy_static;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
lazy_static! {
    pub static ref VERSION_MAJOR: u32 =
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap();
    pub static ref VERSION_MINOR: u32 =
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap();
    pub static ref VERSION_PATCH: u32 =
        env!("CARGO_PKG_VERSION_PATCH").parse().unwrap();
}
pub const GIT_REV: Option<&str> = option_env!("VERGEN_GIT_SHA");
pub const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");
