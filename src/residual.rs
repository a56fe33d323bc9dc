use std::f64::consts::{PI, TAU};

use log::{info, trace};
use serde::{Deserialize, Serialize};

use crate::mask::Selection;
use crate::record::{pt_from_energy, JetRecord, ObjectRecord};

/// Azimuthal difference `truth_phi - pred_phi`, wrapped into (-π, π]
///
/// Differences already inside the interval are returned unchanged.
pub fn delta_phi(truth_phi: f64, pred_phi: f64) -> f64 {
    let d = truth_phi - pred_phi;
    if d > -PI && d <= PI {
        return d;
    }
    let d = d.rem_euclid(TAU);
    if d > PI {
        d - TAU
    } else {
        d
    }
}

/// Relative residual `(truth - pred)/truth`
pub fn relative_residual(truth: f64, pred: f64) -> f64 {
    (truth - pred) / truth
}

/// Residuals of matched objects, concatenated over events
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Residuals {
    /// `(E_true - E_pred)/E_true`
    pub rel_energy: Vec<f64>,
    /// `eta_true - eta_pred`
    pub eta: Vec<f64>,
    /// Circular `phi_true - phi_pred`
    pub phi: Vec<f64>,
    /// `(pt_true - pt_pred)/pt_true`
    pub rel_pt: Vec<f64>,
}

impl Residuals {
    pub fn len(&self) -> usize {
        self.eta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eta.is_empty()
    }
}

/// Residuals of matched jets, concatenated over events
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct JetResiduals {
    pub eta: Vec<f64>,
    pub phi: Vec<f64>,
    pub rel_pt: Vec<f64>,
    pub true_constituents: Vec<u32>,
    pub pred_constituents: Vec<u32>,
    /// Number of jets without a match
    pub unmatched: usize,
}

/// Residuals of jets built from the matched objects of each event
///
/// Each entry corresponds to one event.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct EventJetResiduals {
    pub residuals: Residuals,
    /// Number of predicted objects in each event
    pub n_pred: Vec<usize>,
    /// Number of truth objects in each event
    pub n_truth: Vec<usize>,
}

/// Collects residual distributions of matched pairs
#[derive(Copy, Clone, Debug, Default)]
pub struct ResidualAggregator {}

impl ResidualAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// Residuals for every object selected by `matched`
    ///
    /// Events are visited in ascending order of their id; within an
    /// event, rows keep their table order. Rows without truth or
    /// prediction are skipped even if selected.
    pub fn per_event_residuals(
        &self,
        matched: &Selection<'_, ObjectRecord>,
    ) -> Residuals {
        let rows = matched.rows();
        let mut res = Residuals::default();
        for (event_id, idx) in matched.by_event() {
            trace!("event {event_id}: {} matched objects", idx.len());
            for n in idx {
                let (Some(t), Some(p)) = (rows[n].truth(), rows[n].pred())
                else {
                    continue;
                };
                res.rel_energy.push(relative_residual(t.energy, p.energy));
                res.eta.push(t.eta - p.eta);
                res.phi.push(delta_phi(t.phi, p.phi));
                res.rel_pt.push(relative_residual(t.pt(), p.pt()));
            }
        }
        res
    }

    /// Residuals for all matched jets in `jets`
    pub fn jet_residuals(&self, jets: &[JetRecord]) -> JetResiduals {
        let matched = Selection::from_fn(jets, |j| j.is_matched());
        let mut res = JetResiduals {
            unmatched: jets.len() - matched.count(),
            ..Default::default()
        };
        info!("Total unmatched jets: {}", res.unmatched);
        for idx in matched.by_event().into_values() {
            for n in idx {
                let (Some(t), Some(p)) = (jets[n].truth(), jets[n].pred())
                else {
                    continue;
                };
                res.eta.push(t.eta - p.eta);
                res.phi.push(delta_phi(t.phi, p.phi));
                res.rel_pt.push(relative_residual(t.pt, p.pt));
                res.true_constituents.push(t.n_constituents);
                res.pred_constituents.push(p.n_constituents);
            }
        }
        res
    }

    /// Treat the matched objects of each event as a single jet
    ///
    /// Jet energies are the summed object energies, jet directions
    /// the mean object pseudorapidity and azimuth. Events without any
    /// matched object contribute NaN residuals.
    pub fn particle_jet_residuals(
        &self,
        matched: &Selection<'_, ObjectRecord>,
    ) -> EventJetResiduals {
        let rows = matched.rows();
        let all_events = Selection::all(rows).by_event();
        let matched_events = matched.by_event();
        let mut res = EventJetResiduals::default();
        for (event_id, idx) in all_events {
            let n_pred =
                idx.iter().filter(|&&n| rows[n].pred().is_some()).count();
            let n_truth =
                idx.iter().filter(|&&n| rows[n].truth().is_some()).count();
            res.n_pred.push(n_pred);
            res.n_truth.push(n_truth);

            let pairs: Vec<_> = matched_events
                .get(&event_id)
                .map(|idx| idx.as_slice())
                .unwrap_or_default()
                .iter()
                .filter_map(|&n| Some((rows[n].truth()?, rows[n].pred()?)))
                .collect();
            let e_true: f64 = pairs.iter().map(|(t, _)| t.energy).sum();
            let e_pred: f64 = pairs.iter().map(|(_, p)| p.energy).sum();
            let eta_true = mean(pairs.iter().map(|(t, _)| t.eta));
            let eta_pred = mean(pairs.iter().map(|(_, p)| p.eta));
            let phi_true = mean(pairs.iter().map(|(t, _)| t.phi));
            let phi_pred = mean(pairs.iter().map(|(_, p)| p.phi));

            let r = &mut res.residuals;
            r.rel_energy.push(relative_residual(e_true, e_pred));
            r.eta.push(eta_true - eta_pred);
            r.phi.push(delta_phi(phi_true, phi_pred));
            r.rel_pt.push(relative_residual(
                pt_from_energy(e_true, eta_true),
                pt_from_energy(e_pred, eta_pred),
            ));
        }
        res
    }
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0., 0usize), |(s, n), v| (s + v, n + 1));
    sum / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::MaskEngine;
    use crate::pid::PidTable;
    use crate::record::{JetKinematics, PredictedObject, TruthObject};
    use particle_id::ParticleID;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    fn truth(energy: f64, eta: f64, phi: f64) -> TruthObject {
        TruthObject {
            energy,
            eta,
            phi,
            pid: ParticleID::new(22),
        }
    }

    fn pred(energy: f64, eta: f64, phi: f64) -> PredictedObject {
        PredictedObject {
            energy,
            eta,
            phi,
            class: 0,
        }
    }

    fn jet(pt: f64, eta: f64, phi: f64, n: u32) -> JetKinematics {
        JetKinematics {
            pt,
            eta,
            phi,
            n_constituents: n,
        }
    }

    #[test]
    fn circular() {
        assert_close(delta_phi(3., -3.), 6. - TAU);
        assert_close(delta_phi(-3., 3.), TAU - 6.);
        assert_close(delta_phi(0.5, 0.2), 0.3);
        assert_close(delta_phi(PI, 0.), PI);
        assert_close(delta_phi(0., PI), PI);
        assert_eq!(delta_phi(1e-10, 0.), 1e-10);
        assert_eq!(delta_phi(3., -3.), 6. - TAU);
        for (t, p) in [(0.3, -0.2), (-1.7, 1.1), (3.1, 0.), (-2., 1.)] {
            assert_eq!(delta_phi(t, p), t - p);
        }

        let phis: Vec<f64> =
            (0..40).map(|n| -PI + n as f64 * TAU / 40.).collect();
        for &t in &phis {
            for &p in &phis {
                let d = delta_phi(t, p);
                assert!(d > -PI && d <= PI, "{t} - {p} -> {d}");
                let shifted = delta_phi(t + TAU, p);
                let diff = (shifted - d).abs();
                // both ends of the interval describe the same angle
                assert!(diff < 1e-9 || (diff - TAU).abs() < 1e-9);
                let shifted = delta_phi(t, p + TAU);
                let diff = (shifted - d).abs();
                assert!(diff < 1e-9 || (diff - TAU).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn objects() {
        let rows = vec![
            ObjectRecord::matched(2, truth(10., 0., 3.), pred(8., 0.1, -3.)),
            ObjectRecord::missed(2, truth(5., 0., 0.)),
            ObjectRecord::matched(0, truth(4., 1., 0.), pred(5., 1., 0.1)),
            ObjectRecord::fake(1, pred(1., 0., 0.)),
        ];
        let pids = PidTable::default();
        let masks = MaskEngine::new(&pids);
        let matched = masks.matched_mask(&rows);
        let res = ResidualAggregator::new().per_event_residuals(&matched);
        assert_eq!(res.len(), 2);
        // event 0 comes first
        assert_close(res.rel_energy[0], -0.25);
        assert_close(res.eta[0], 0.);
        assert_close(res.phi[0], -0.1);
        assert_close(res.rel_pt[0], -0.25);
        assert_close(res.rel_energy[1], 0.2);
        assert_close(res.eta[1], -0.1);
        assert_close(res.phi[1], 6. - TAU);
        let pt_true = 10.;
        let pt_pred = 8. / 0.1f64.cosh();
        assert_close(res.rel_pt[1], (pt_true - pt_pred) / pt_true);

        let none = Selection::none(&rows);
        let res = ResidualAggregator::new().per_event_residuals(&none);
        assert!(res.is_empty());
    }

    #[test]
    fn jets() {
        let jets = vec![
            JetRecord::matched(
                1,
                jet(20., 0.5, 3.1, 8),
                jet(18., 0.4, -3.1, 7),
            ),
            JetRecord::unmatched(1, Some(jet(5., 0., 0., 2)), None),
            JetRecord::matched(
                0,
                jet(40., -1., 0., 12),
                jet(44., -1.1, 0.05, 13),
            ),
        ];
        let res = ResidualAggregator::new().jet_residuals(&jets);
        assert_eq!(res.unmatched, 1);
        assert_eq!(res.rel_pt.len(), 2);
        assert_close(res.rel_pt[0], -0.1);
        assert_close(res.eta[0], 0.1);
        assert_close(res.phi[0], -0.05);
        assert_close(res.rel_pt[1], 0.1);
        assert_close(res.phi[1], 6.2 - TAU);
        assert_eq!(res.true_constituents, vec![12, 8]);
        assert_eq!(res.pred_constituents, vec![13, 7]);
    }

    #[test]
    fn particle_jets() {
        let rows = vec![
            ObjectRecord::matched(0, truth(6., 0.2, 0.1), pred(5., 0.2, 0.1)),
            ObjectRecord::matched(0, truth(4., 0.4, 0.3), pred(5., 0.2, 0.1)),
            ObjectRecord::fake(0, pred(1., 0., 0.)),
            ObjectRecord::missed(3, truth(1., 0., 0.)),
        ];
        let pids = PidTable::default();
        let masks = MaskEngine::new(&pids);
        let matched = masks.matched_mask(&rows);
        let res = ResidualAggregator::new().particle_jet_residuals(&matched);
        assert_eq!(res.n_pred, vec![3, 0]);
        assert_eq!(res.n_truth, vec![2, 1]);
        let r = &res.residuals;
        assert_eq!(r.len(), 2);
        assert_close(r.rel_energy[0], 0.);
        assert_close(r.eta[0], 0.1);
        assert_close(r.phi[0], 0.1);
        assert!(r.rel_energy[1].is_nan());
    }
}
