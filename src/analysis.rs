use std::collections::BTreeMap;
use std::convert::TryFrom;

use derive_builder::Builder;
use lazy_static::lazy_static;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::bins::Bins;
use crate::calibration::JetMomentumCalibrator;
use crate::config::{
    default_classification_categories, default_ratio_categories, Config,
    EFFICIENCY_BINS, JET_ANGLE_RANGE, JET_CALIBRATION_BINS,
    PARTICLE_ANGLE_RANGE, RELATIVE_RANGE, RESOLUTION_BINS,
};
use crate::distribution::{Distribution, DistributionSummarizer};
use crate::error::ConfigurationError;
use crate::mask::MaskEngine;
use crate::pid::{PidCategory, PidTable};
use crate::ratio::{BinnedRatioAggregator, BinnedRatios, Ratio};
use crate::record::{FeatureHit, JetTable, ObjectTable, TruthHit};
use crate::residual::{
    EventJetResiduals, JetResiduals, ResidualAggregator, Residuals,
};
use crate::resolution::{
    energy_resolution, pt_response, EnergyResolution, MeanWithError,
};
use crate::summary::Summary;

lazy_static! {
    static ref DEFAULT_EFFICIENCY_BINS: Bins =
        Bins::new(&EFFICIENCY_BINS).unwrap();
    static ref DEFAULT_JET_CALIBRATION_BINS: Bins =
        Bins::new(&JET_CALIBRATION_BINS).unwrap();
    static ref DEFAULT_RESOLUTION_BINS: Bins =
        Bins::new(&RESOLUTION_BINS).unwrap();
}

/// Output of the matching and jet-building stages
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Input {
    pub objects: ObjectTable,
    pub jets: JetTable,
    /// Truth information for the hits of each event
    #[serde(default)]
    pub truth_hits: Vec<Vec<TruthHit>>,
    /// Features of the hits of each event
    #[serde(default)]
    pub feature_hits: Vec<Vec<FeatureHit>>,
}

/// Bin boundaries together with the positions used for plotting
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct BinGeometry {
    pub edges: Vec<f64>,
    pub centres: Vec<f64>,
    pub half_widths: Vec<f64>,
}

impl From<&Bins> for BinGeometry {
    fn from(bins: &Bins) -> Self {
        Self {
            edges: bins.edges().collect(),
            centres: bins.centres(),
            half_widths: bins.half_widths(),
        }
    }
}

/// Summaries of the four kinds of residuals
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct ResidualSummaries {
    pub rel_energy: Summary,
    pub eta: Summary,
    pub phi: Summary,
    pub rel_pt: Summary,
}

/// Summaries of jet residuals
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct JetSummaries {
    pub eta: Summary,
    pub phi: Summary,
    pub rel_pt: Summary,
}

/// Numeric results handed to the plotting layer
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Report {
    pub efficiency_bins: BinGeometry,
    pub ratios: BTreeMap<PidCategory, BinnedRatios>,
    pub classification: BTreeMap<PidCategory, Vec<Ratio>>,
    pub neutral_residuals: Residuals,
    pub neutral_summaries: ResidualSummaries,
    pub particle_jets: EventJetResiduals,
    pub particle_jet_summaries: ResidualSummaries,
    /// Per-bin jet momentum corrections, if the jets were calibrated
    pub jet_corrections: Option<Vec<f64>>,
    pub jets: JetResiduals,
    pub jet_summaries: JetSummaries,
    pub resolution_bins: BinGeometry,
    pub energy_resolution: BTreeMap<PidCategory, EnergyResolution>,
    pub pt_response: Vec<MeanWithError>,
    pub distribution: Option<Distribution>,
}

/// Runs all metrics on the output of the matching stage
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct Analysis {
    #[builder(default)]
    pids: PidTable,
    #[builder(default = "DEFAULT_EFFICIENCY_BINS.clone()")]
    efficiency_bins: Bins,
    #[builder(default = "DEFAULT_JET_CALIBRATION_BINS.clone()")]
    jet_calibration_bins: Bins,
    #[builder(default = "DEFAULT_RESOLUTION_BINS.clone()")]
    resolution_bins: Bins,
    #[builder(default = "default_ratio_categories()")]
    ratio_categories: Vec<PidCategory>,
    #[builder(default = "default_classification_categories()")]
    classification_categories: Vec<PidCategory>,
    #[builder(default = "true")]
    calibrate_jets: bool,
    #[builder(default = "RELATIVE_RANGE")]
    relative_range: (f64, f64),
    #[builder(default = "PARTICLE_ANGLE_RANGE")]
    particle_angle_range: (f64, f64),
    #[builder(default = "JET_ANGLE_RANGE")]
    jet_angle_range: (f64, f64),
}

impl TryFrom<Config> for Analysis {
    type Error = ConfigurationError;

    fn try_from(cfg: Config) -> Result<Self, Self::Error> {
        Ok(Self {
            pids: cfg.pid_categories,
            efficiency_bins: Bins::new(&cfg.efficiency_bins)?,
            jet_calibration_bins: Bins::new(&cfg.jet_calibration_bins)?,
            resolution_bins: Bins::new(&cfg.resolution_bins)?,
            ratio_categories: cfg.ratio_categories,
            classification_categories: cfg.classification_categories,
            calibrate_jets: cfg.calibrate_jets,
            relative_range: cfg.relative_range,
            particle_angle_range: cfg.particle_angle_range,
            jet_angle_range: cfg.jet_angle_range,
        })
    }
}

impl Analysis {
    /// Run the analysis
    ///
    /// The jet table is consumed: if enabled, jet calibration runs
    /// before anything else reads the predicted jet momenta.
    pub fn run(&self, input: Input) -> Result<Report, ConfigurationError> {
        let Input {
            objects,
            jets,
            truth_hits,
            feature_hits,
        } = input;

        let (jets, jet_corrections) = if self.calibrate_jets {
            info!("Calibrating jet transverse momenta");
            let calibrated = JetMomentumCalibrator::new(
                self.jet_calibration_bins.clone(),
            )
            .calibrate(jets);
            let corrections = calibrated.corrections().to_vec();
            (calibrated.into_inner(), Some(corrections))
        } else {
            (jets, None)
        };

        let masks = MaskEngine::new(&self.pids);
        let rows = objects.rows();
        info!("Analysing {} objects and {} jets", rows.len(), jets.len());

        info!("Computing efficiencies");
        let ratio_agg = BinnedRatioAggregator::new(masks);
        let ratios = self
            .ratio_categories
            .iter()
            .map(|&c| {
                let ratios = ratio_agg.compute_binned_ratios(
                    rows,
                    &self.efficiency_bins,
                    c,
                );
                (c, ratios)
            })
            .collect();
        let classification = self
            .classification_categories
            .iter()
            .map(|&c| {
                let ratios = ratio_agg.compute_binned_ratios(
                    rows,
                    &self.efficiency_bins,
                    c,
                );
                (c, ratios.classification)
            })
            .collect();

        info!("Computing residuals");
        let residuals = ResidualAggregator::new();
        let matched = masks.matched_mask(rows);
        let neutral = &matched & &masks.pid_mask(rows, PidCategory::Neutral);
        let neutral_residuals = residuals.per_event_residuals(&neutral);
        let neutral_summaries =
            self.summarise(&neutral_residuals, self.particle_angle_range);
        let particle_jets = residuals.particle_jet_residuals(&matched);
        let particle_jet_summaries =
            self.summarise(&particle_jets.residuals, self.jet_angle_range);
        let jet_residuals = residuals.jet_residuals(jets.rows());
        let jet_summaries = JetSummaries {
            eta: Summary::of(&jet_residuals.eta, self.jet_angle_range),
            phi: Summary::of(&jet_residuals.phi, self.jet_angle_range),
            rel_pt: Summary::of(&jet_residuals.rel_pt, self.relative_range),
        };

        info!("Computing energy resolution");
        let energy_resolution = [
            PidCategory::All,
            PidCategory::Neutral,
            PidCategory::Charged,
        ]
        .into_iter()
        .map(|c| {
            let selected = &matched & &masks.pid_mask(rows, c);
            (c, energy_resolution(&selected, &self.resolution_bins))
        })
        .collect();
        let pt_response = pt_response(&matched, &self.resolution_bins);

        let distribution = if truth_hits.is_empty() && feature_hits.is_empty()
        {
            None
        } else {
            info!("Counting particles per event");
            let summarizer = DistributionSummarizer::new(&self.pids);
            let dist =
                summarizer.per_event_counts(&truth_hits, &feature_hits)?;
            for (name, mean) in dist.means() {
                debug!("Mean number of {name} per event: {mean}");
            }
            Some(dist)
        };

        Ok(Report {
            efficiency_bins: (&self.efficiency_bins).into(),
            ratios,
            classification,
            neutral_residuals,
            neutral_summaries,
            particle_jets,
            particle_jet_summaries,
            jet_corrections,
            jets: jet_residuals,
            jet_summaries,
            resolution_bins: (&self.resolution_bins).into(),
            energy_resolution,
            pt_response,
            distribution,
        })
    }

    fn summarise(
        &self,
        res: &Residuals,
        angle_range: (f64, f64),
    ) -> ResidualSummaries {
        ResidualSummaries {
            rel_energy: Summary::of(&res.rel_energy, self.relative_range),
            eta: Summary::of(&res.eta, angle_range),
            phi: Summary::of(&res.phi, angle_range),
            rel_pt: Summary::of(&res.rel_pt, self.relative_range),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{
        JetKinematics, JetRecord, ObjectRecord, PredictedObject, TruthObject,
    };
    use particle_id::ParticleID;

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn truth(energy: f64, pid: i32) -> TruthObject {
        TruthObject {
            energy,
            eta: 0.5,
            phi: 1.,
            pid: ParticleID::new(pid),
        }
    }

    fn pred(energy: f64, class: i64) -> PredictedObject {
        PredictedObject {
            energy,
            eta: 0.5,
            phi: 1.,
            class,
        }
    }

    fn jet(pt: f64) -> JetKinematics {
        JetKinematics {
            pt,
            eta: 0.,
            phi: 0.,
            n_constituents: 3,
        }
    }

    fn input() -> Input {
        Input {
            objects: ObjectTable::new(vec![
                ObjectRecord::matched(0, truth(2., 22), pred(2.2, 0)),
                ObjectRecord::missed(0, truth(2., 130)),
                ObjectRecord::matched(1, truth(12., 211), pred(11., 2)),
                ObjectRecord::fake(1, pred(3., 1)),
            ]),
            jets: JetTable::new(vec![
                JetRecord::matched(0, jet(10.), jet(8.)),
                JetRecord::matched(1, jet(12.), jet(12.)),
            ]),
            truth_hits: vec![
                vec![TruthHit { particle: 0, pid: ParticleID::new(22) }],
                vec![],
            ],
            feature_hits: vec![
                vec![FeatureHit { track_marker: 0 }],
                vec![FeatureHit { track_marker: 1 }],
            ],
        }
    }

    #[test]
    fn default_run() {
        log_init();
        let analysis = Analysis::try_from(Config::default()).unwrap();
        let report = analysis.run(input()).unwrap();

        assert_eq!(report.efficiency_bins.edges, EFFICIENCY_BINS.to_vec());
        assert_eq!(report.ratios.len(), 3);
        let all = &report.ratios[&PidCategory::All];
        assert_eq!(all.len(), EFFICIENCY_BINS.len() - 1);
        // [2, 3) holds the two truth objects with 2 GeV
        assert_eq!(all.efficiency[1].value, 0.5);
        assert_eq!(report.classification.len(), 3);

        // photon only: the charged pion is not neutral
        assert_eq!(report.neutral_residuals.len(), 1);
        assert_eq!(report.neutral_summaries.rel_energy.count, 1);

        let corrections = report.jet_corrections.as_ref().unwrap();
        assert_eq!(corrections.len(), JET_CALIBRATION_BINS.len() - 1);
        // bin [10, 20): residuals 0.2 and 0
        assert!((corrections[2] - 0.1).abs() < 1e-12);
        assert_eq!(report.jets.rel_pt.len(), 2);

        let dist = report.distribution.unwrap();
        assert_eq!(dist.photons, vec![1, 0]);
        assert_eq!(dist.tracks, vec![0, 1]);
    }

    #[test]
    fn builder() {
        log_init();
        let analysis = AnalysisBuilder::default()
            .efficiency_bins(Bins::new(&[1., 10., 20.]).unwrap())
            .calibrate_jets(false)
            .build()
            .unwrap();
        let mut input = input();
        input.feature_hits.pop();
        let err = analysis.run(input.clone()).unwrap_err();
        assert!(matches!(err, ConfigurationError::MismatchedEventCount { .. }));

        input.truth_hits.clear();
        input.feature_hits.clear();
        let report = analysis.run(input).unwrap();
        assert!(report.jet_corrections.is_none());
        assert!(report.distribution.is_none());
        let all = &report.ratios[&PidCategory::All];
        assert_eq!(all.efficiency[0].value, 0.5);
        assert_eq!(all.efficiency[1].value, 1.);
        // uncalibrated: (10 - 8)/10
        assert!((report.jets.rel_pt[0] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn builder_defaults() {
        let built = AnalysisBuilder::default().build().unwrap();
        let from_config = Analysis::try_from(Config::default()).unwrap();
        assert_eq!(built, from_config);
        assert_eq!(built.classification_categories.len(), 3);
    }

    #[test]
    fn bad_config() {
        let cfg = Config {
            resolution_bins: vec![5., 1.],
            ..Default::default()
        };
        assert!(matches!(
            Analysis::try_from(cfg),
            Err(ConfigurationError::NonMonotonicBoundaries { .. })
        ));
    }
}
