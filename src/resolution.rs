use serde::{Deserialize, Serialize};

use crate::bins::Bins;
use crate::mask::Selection;
use crate::record::{ObjectField, ObjectRecord};

/// Mean with its standard error `std/sqrt(n)`
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct MeanWithError {
    pub mean: f64,
    pub error: f64,
}

impl MeanWithError {
    /// NaN for empty input
    pub fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var =
            values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Self {
            mean,
            error: var.sqrt() / n.sqrt(),
        }
    }
}

/// Energy resolution in bins of true energy
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct EnergyResolution {
    /// Mean of `|E_pred - E_true|`
    pub abs_diff: Vec<MeanWithError>,
    /// Mean of `E_pred/E_true`
    pub response: Vec<MeanWithError>,
}

/// Energy resolution of the matched objects in `matched`, binned in
/// true energy
pub fn energy_resolution(
    matched: &Selection<'_, ObjectRecord>,
    bins: &Bins,
) -> EnergyResolution {
    let mut res = EnergyResolution::default();
    for idx in 0..bins.len() {
        let in_bin = bins.membership(matched, &ObjectField::TruthEnergy, idx);
        let pairs: Vec<_> = in_bin
            .iter()
            .filter_map(|r| Some((r.truth()?.energy, r.pred()?.energy)))
            .collect();
        let diffs: Vec<_> = pairs.iter().map(|(t, p)| (p - t).abs()).collect();
        let ratios: Vec<_> = pairs.iter().map(|(t, p)| p / t).collect();
        res.abs_diff.push(MeanWithError::of(&diffs));
        res.response.push(MeanWithError::of(&ratios));
    }
    res
}

/// Mean of `pt_pred/pt_true` of the matched objects in `matched`,
/// binned in true energy
pub fn pt_response(
    matched: &Selection<'_, ObjectRecord>,
    bins: &Bins,
) -> Vec<MeanWithError> {
    (0..bins.len())
        .map(|idx| {
            let ratios: Vec<_> = bins
                .membership(matched, &ObjectField::TruthEnergy, idx)
                .iter()
                .filter_map(|r| Some(r.pred()?.pt() / r.truth()?.pt()))
                .collect();
            MeanWithError::of(&ratios)
        })
        .collect()
}
