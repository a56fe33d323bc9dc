use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::pid::{PidCategory, PidTable};

/// Default energy bins for efficiencies and fake rates in GeV
pub const EFFICIENCY_BINS: [f64; 9] = [1., 2., 3., 4., 5., 10., 20., 30., 50.];
/// Default true transverse momentum bins for jet calibration in GeV
pub const JET_CALIBRATION_BINS: [f64; 8] =
    [0., 5., 10., 20., 30., 50., 100., 1000.];
/// Default energy bins for the energy resolution in GeV
pub const RESOLUTION_BINS: [f64; 7] = [1., 5., 10., 20., 30., 50., 200.];
/// Default display range for relative residuals
pub const RELATIVE_RANGE: (f64, f64) = (-1., 1.);
/// Default display range for angular residuals of single objects
pub const PARTICLE_ANGLE_RANGE: (f64, f64) = (-0.4, 0.4);
/// Default display range for angular residuals of jets
pub const JET_ANGLE_RANGE: (f64, f64) = (-0.2, 0.2);

/// Default categories for efficiencies and fake rates
pub fn default_ratio_categories() -> Vec<PidCategory> {
    use PidCategory::*;
    vec![All, Photon, NeutralHadron]
}

/// Default categories for classification probabilities
pub fn default_classification_categories() -> Vec<PidCategory> {
    use PidCategory::*;
    vec![Photon, NeutralHadron, Charged]
}

/// Analysis settings
///
/// Every setting has a default, so an empty document is a valid
/// configuration.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub pid_categories: PidTable,
    pub efficiency_bins: Vec<f64>,
    pub jet_calibration_bins: Vec<f64>,
    pub resolution_bins: Vec<f64>,
    /// Categories for which efficiencies and fake rates are computed
    pub ratio_categories: Vec<PidCategory>,
    /// Categories for which the classification probability is computed
    pub classification_categories: Vec<PidCategory>,
    /// Whether to calibrate the jet transverse momentum
    pub calibrate_jets: bool,
    /// Display range for relative residuals
    pub relative_range: (f64, f64),
    /// Display range for angular residuals of single objects
    pub particle_angle_range: (f64, f64),
    /// Display range for angular residuals of jets
    pub jet_angle_range: (f64, f64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pid_categories: Default::default(),
            efficiency_bins: EFFICIENCY_BINS.to_vec(),
            jet_calibration_bins: JET_CALIBRATION_BINS.to_vec(),
            resolution_bins: RESOLUTION_BINS.to_vec(),
            ratio_categories: default_ratio_categories(),
            classification_categories: default_classification_categories(),
            calibrate_jets: true,
            relative_range: RELATIVE_RANGE,
            particle_angle_range: PARTICLE_ANGLE_RANGE,
            jet_angle_range: JET_ANGLE_RANGE,
        }
    }
}

impl Config {
    /// Read a YAML configuration
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }
}
