use log::{debug, info, warn};

use crate::bins::Bins;
use crate::mask::Selection;
use crate::record::{JetField, JetRecord, JetTable};
use crate::residual::{mean, relative_residual};

/// A jet table whose predicted transverse momenta have been calibrated
///
/// A calibrated table cannot be calibrated again. Recovering the raw
/// table with [into_inner](Self::into_inner) and
/// calibrating it a second time shifts the momenta again.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibratedJets {
    jets: JetTable,
    corrections: Vec<f64>,
}

impl CalibratedJets {
    pub fn jets(&self) -> &JetTable {
        &self.jets
    }

    /// The correction applied in each bin
    ///
    /// NaN for bins without matched jets, which are left unchanged.
    pub fn corrections(&self) -> &[f64] {
        &self.corrections
    }

    pub fn into_inner(self) -> JetTable {
        self.jets
    }
}

/// Removes the bias in reconstructed jet transverse momentum
///
/// In each bin of true transverse momentum the mean relative residual
/// `c = <(pt_true - pt_pred)/pt_true>` over matched jets is computed
/// and the predicted momentum of every jet with true momentum in the
/// bin is rescaled by `1 + c`.
#[derive(Clone, Debug)]
pub struct JetMomentumCalibrator {
    bins: Bins,
}

impl JetMomentumCalibrator {
    pub fn new(bins: Bins) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &Bins {
        &self.bins
    }

    /// Calibrate `jets`, consuming the uncalibrated table
    pub fn calibrate(&self, mut jets: JetTable) -> CalibratedJets {
        let mut corrections = Vec::with_capacity(self.bins.len());
        for (idx, (lo, hi)) in self.bins.iter().enumerate() {
            let rows = jets.rows();
            let in_bin = self.bins.membership(
                &Selection::all(rows),
                &JetField::TruePt,
                idx,
            );
            let matched = in_bin.filter(|j| j.is_matched());
            let correction = mean(matched.iter().filter_map(rel_pt_residual));
            debug!(
                "pt bin [{lo}, {hi}): {} jets, {} matched",
                in_bin.count(),
                matched.count()
            );
            corrections.push(correction);
            if correction.is_nan() {
                warn!(
                    "No matched jets with true pt in [{lo}, {hi}), \
                     leaving bin uncalibrated"
                );
                continue;
            }
            info!("Correction factor for pt in [{lo}, {hi}): {correction}");
            let selected: Vec<usize> = in_bin.indices().collect();
            let rows = jets.rows_mut();
            for n in selected {
                rows[n].scale_pred_pt(1. + correction);
            }
        }
        CalibratedJets { jets, corrections }
    }
}

fn rel_pt_residual(jet: &JetRecord) -> Option<f64> {
    Some(relative_residual(jet.truth()?.pt, jet.pred()?.pt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, JetKinematics};

    fn log_init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn jet(pt: f64) -> JetKinematics {
        JetKinematics {
            pt,
            eta: 0.,
            phi: 0.,
            n_constituents: 1,
        }
    }

    fn pred_pts(jets: &JetTable) -> Vec<Option<f64>> {
        jets.rows().iter().map(|j| JetField::PredPt.value(j)).collect()
    }

    fn bins() -> Bins {
        Bins::new(&[0., 5., 10., 20., 30., 50., 100., 1000.]).unwrap()
    }

    #[test]
    fn unbiased() {
        log_init();
        let jets: JetTable = [3., 7., 15., 25., 40., 70.]
            .into_iter()
            .enumerate()
            .map(|(n, pt)| JetRecord::matched(n as u64, jet(pt), jet(pt)))
            .collect();
        let before = pred_pts(&jets);
        let calibrated = JetMomentumCalibrator::new(bins()).calibrate(jets);
        assert_eq!(pred_pts(calibrated.jets()), before);
        for (n, c) in calibrated.corrections().iter().enumerate() {
            if n < 6 {
                assert_eq!(*c, 0.);
            } else {
                assert!(c.is_nan());
            }
        }
    }

    #[test]
    fn biased() {
        log_init();
        let jets = JetTable::new(vec![
            JetRecord::matched(0, jet(12.), jet(10.)),
            JetRecord::matched(1, jet(16.), jet(12.)),
            // unmatched jets in the bin are corrected, too
            JetRecord::unmatched(1, Some(jet(14.)), Some(jet(11.))),
            JetRecord::unmatched(2, None, Some(jet(13.))),
            JetRecord::matched(2, jet(40.), jet(40.)),
        ]);
        let calibrated = JetMomentumCalibrator::new(bins()).calibrate(jets);
        // residuals 1/6 and 1/4 in [10, 20)
        let c = (1. / 6. + 1. / 4.) / 2.;
        assert!((calibrated.corrections()[2] - c).abs() < 1e-12);
        let pts = pred_pts(calibrated.jets());
        assert!((pts[0].unwrap() - 10. * (1. + c)).abs() < 1e-12);
        assert!((pts[1].unwrap() - 12. * (1. + c)).abs() < 1e-12);
        assert!((pts[2].unwrap() - 11. * (1. + c)).abs() < 1e-12);
        // no true pt, not in any bin
        assert_eq!(pts[3], Some(13.));
        assert_eq!(pts[4], Some(40.));
    }

    #[test]
    fn not_idempotent() {
        log_init();
        let jets = JetTable::new(vec![
            JetRecord::matched(0, jet(10.), jet(8.)),
            JetRecord::matched(1, jet(15.), jet(9.)),
        ]);
        let calibrator = JetMomentumCalibrator::new(bins());
        let once = calibrator.calibrate(jets);
        let twice = calibrator.calibrate(once.clone().into_inner());
        assert_ne!(pred_pts(once.jets()), pred_pts(twice.jets()));
        assert_ne!(twice.corrections()[2], 0.);
    }
}
