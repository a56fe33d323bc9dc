use serde::{Deserialize, Serialize};

/// Summary statistics of a residual distribution
///
/// Non-finite values are ignored. `displayed` is the fraction of the
/// finite values inside the display range, `mu` and `sigma` are the
/// maximum-likelihood Gaussian parameters of the values in that range.
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub displayed: f64,
    pub mu: f64,
    pub sigma: f64,
}

impl Summary {
    pub fn of(values: &[f64], range: (f64, f64)) -> Self {
        let finite: Vec<_> =
            values.iter().copied().filter(|v| v.is_finite()).collect();
        let (mean, std) = mean_std(&finite);
        let (lo, hi) = range;
        let shown: Vec<_> = finite
            .iter()
            .copied()
            .filter(|&v| v >= lo && v < hi)
            .collect();
        let (mu, sigma) = mean_std(&shown);
        Self {
            count: finite.len(),
            mean,
            std,
            displayed: shown.len() as f64 / finite.len() as f64,
            mu,
            sigma,
        }
    }
}

// mean and population standard deviation
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}
