use log::debug;
use serde::{Deserialize, Serialize};

use crate::bins::Bins;
use crate::mask::{MaskEngine, Selection};
use crate::pid::PidCategory;
use crate::record::{ObjectField, ObjectRecord};

/// A ratio with its statistical uncertainty
///
/// Both are NaN if the ratio is undefined because nothing was selected.
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct Ratio {
    pub value: f64,
    pub error: f64,
}

impl Ratio {
    /// The ratio `numerator/denominator` with binomial-style uncertainty
    /// `sqrt(p(1-p)/n)`, where `n` is `sample_size`
    ///
    /// Note that the analyses using this pass numerator counts as
    /// `sample_size` instead of the usual denominator.
    pub fn binomial(
        numerator: usize,
        denominator: usize,
        sample_size: usize,
    ) -> Self {
        let p = numerator as f64 / denominator as f64;
        let error = (p * (1. - p) / sample_size as f64).sqrt();
        Self { value: p, error }
    }

    pub fn is_nan(&self) -> bool {
        self.value.is_nan()
    }
}

/// Efficiency, fake rate, and classification probability in each bin
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct BinnedRatios {
    pub efficiency: Vec<Ratio>,
    pub fake_rate: Vec<Ratio>,
    pub classification: Vec<Ratio>,
}

impl BinnedRatios {
    /// Number of bins
    pub fn len(&self) -> usize {
        self.efficiency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.efficiency.is_empty()
    }
}

/// Computes per-bin ratios over truth and predicted energy
#[derive(Copy, Clone, Debug)]
pub struct BinnedRatioAggregator<'p> {
    masks: MaskEngine<'p>,
}

impl<'p> BinnedRatioAggregator<'p> {
    pub fn new(masks: MaskEngine<'p>) -> Self {
        Self { masks }
    }

    /// Compute binned ratios for the objects in `rows`
    ///
    /// For each energy bin:
    /// - efficiency: truth objects in the bin with a valid prediction,
    ///   over all truth objects in the bin
    /// - fake rate: predictions in the bin without valid truth, over all
    ///   predictions in the bin
    /// - classification: truth objects in the bin with a valid
    ///   prediction of the right class, over truth objects in the bin
    ///   with a valid prediction
    ///
    /// Truth-side counts are restricted to truth objects in `pid_filter`,
    /// prediction-side counts to predictions of the corresponding class.
    /// Empty bins yield NaN.
    pub fn compute_binned_ratios(
        &self,
        rows: &[ObjectRecord],
        bins: &Bins,
        pid_filter: PidCategory,
    ) -> BinnedRatios {
        let all = Selection::all(rows);
        let has_pred =
            self.masks.validity_mask(rows, ObjectField::PredEnergy);
        let has_truth =
            self.masks.validity_mask(rows, ObjectField::TruthEnergy);
        let no_truth = !&has_truth;
        let pid_truth = self.masks.pid_mask(rows, pid_filter);
        let pid_pred = self.masks.pred_class_mask(rows, pid_filter);
        let pid_both = &pid_truth & &pid_pred;

        let mut res = BinnedRatios::default();
        for idx in 0..bins.len() {
            let in_truth_bin =
                bins.membership(&all, &ObjectField::TruthEnergy, idx);
            let in_pred_bin =
                bins.membership(&all, &ObjectField::PredEnergy, idx);
            let found = &has_pred & &in_truth_bin;
            let faked = &in_pred_bin & &no_truth;

            let nfound = found.count_and(&pid_truth);
            let ntruth = in_truth_bin.count_and(&pid_truth);
            let nfaked = faked.count_and(&pid_pred);
            let npred = in_pred_bin.count_and(&pid_pred);
            let ncorrect = found.count_and(&pid_both);
            debug!(
                "{pid_filter} bin {idx}: {nfound}/{ntruth} found, \
                 {nfaked}/{npred} fake, {ncorrect} correctly classified"
            );

            res.efficiency.push(Ratio::binomial(nfound, ntruth, nfound));
            res.fake_rate.push(Ratio::binomial(nfaked, npred, nfaked));
            res.classification
                .push(Ratio::binomial(ncorrect, nfound, nfound));
        }
        res
    }
}
