pub use crate::{
    analysis::{Analysis, AnalysisBuilder, Input, Report},
    bins::Bins,
    calibration::{CalibratedJets, JetMomentumCalibrator},
    config::Config,
    distribution::DistributionSummarizer,
    error::ConfigurationError,
    mask::{MaskEngine, Selection},
    pid::{PidCategory, PidTable},
    ratio::BinnedRatioAggregator,
    record::{JetRecord, JetTable, ObjectRecord, ObjectTable},
    residual::ResidualAggregator,
};
