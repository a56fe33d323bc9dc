use std::convert::TryFrom;

use noisy_float::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::mask::Selection;
use crate::record::Field;

/// A partition of a numeric axis into contiguous half-open bins
///
/// Bin `i` is the interval `[edges[i], edges[i+1])`. Values at or
/// above the last edge are not in any bin.
#[derive(
    Deserialize, Serialize, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash,
)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Bins {
    edges: Vec<N64>,
}

impl Bins {
    /// Construct from strictly increasing finite boundaries
    pub fn new(edges: &[f64]) -> Result<Self, ConfigurationError> {
        use ConfigurationError::*;
        if edges.len() < 2 {
            return Err(TooFewBoundaries(edges.len()));
        }
        if let Some(&bad) = edges.iter().find(|e| !e.is_finite()) {
            return Err(NonFiniteBoundary(bad));
        }
        if let Some(index) = edges.windows(2).position(|w| w[0] >= w[1]) {
            return Err(NonMonotonicBoundaries {
                index,
                lower: edges[index],
                upper: edges[index + 1],
            });
        }
        let edges = edges.iter().map(|&e| n64(e)).collect();
        Ok(Self { edges })
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn edges(&self) -> impl Iterator<Item = f64> + '_ {
        self.edges.iter().map(|e| f64::from(*e))
    }

    /// Lower and upper boundary of each bin
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.edges
            .windows(2)
            .map(|w| (f64::from(w[0]), f64::from(w[1])))
    }

    /// Index of the bin containing `x`
    pub fn find(&self, x: f64) -> Option<usize> {
        if x.is_nan() {
            return None;
        }
        let x = n64(x);
        match self.edges.binary_search(&x) {
            Ok(idx) if idx < self.len() => Some(idx),
            Ok(_) => None,
            Err(0) => None,
            Err(idx) if idx <= self.len() => Some(idx - 1),
            Err(_) => None,
        }
    }

    /// Bin centres
    pub fn centres(&self) -> Vec<f64> {
        self.iter().map(|(lo, hi)| 0.5 * (lo + hi)).collect()
    }

    /// Half of each bin width
    pub fn half_widths(&self) -> Vec<f64> {
        self.iter().map(|(lo, hi)| 0.5 * (hi - lo)).collect()
    }

    /// Rows of `selection` where `field` lies inside bin `idx`
    ///
    /// Rows where the field is absent or NaN are never inside a bin.
    pub fn membership<'t, R, F>(
        &self,
        selection: &Selection<'t, R>,
        field: &F,
        idx: usize,
    ) -> Selection<'t, R>
    where
        F: Field<R>,
    {
        selection.filter(|r| {
            field.value(r).and_then(|v| self.find(v)) == Some(idx)
        })
    }
}

impl TryFrom<Vec<f64>> for Bins {
    type Error = ConfigurationError;

    fn try_from(edges: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(&edges)
    }
}

impl From<Bins> for Vec<f64> {
    fn from(bins: Bins) -> Self {
        bins.edges().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct() {
        let bins =
            Bins::new(&[1., 2., 3., 4., 5., 10., 20., 30., 50.]).unwrap();
        assert_eq!(bins.len(), 8);
        assert_eq!(bins.iter().next(), Some((1., 2.)));
        assert_eq!(bins.centres()[5], 15.);
        assert_eq!(bins.half_widths()[7], 10.);

        assert_eq!(
            Bins::new(&[1.]),
            Err(ConfigurationError::TooFewBoundaries(1))
        );
        assert_eq!(
            Bins::new(&[1., 5., 5.]),
            Err(ConfigurationError::NonMonotonicBoundaries {
                index: 1,
                lower: 5.,
                upper: 5.
            })
        );
        assert!(matches!(
            Bins::new(&[0., f64::INFINITY]),
            Err(ConfigurationError::NonFiniteBoundary(_))
        ));
        assert!(Bins::new(&[0., f64::NAN]).is_err());
    }

    #[test]
    fn find() {
        let bins = Bins::new(&[0., 5., 10., 20.]).unwrap();
        assert_eq!(bins.find(-1.), None);
        assert_eq!(bins.find(0.), Some(0));
        assert_eq!(bins.find(4.99), Some(0));
        assert_eq!(bins.find(5.), Some(1));
        assert_eq!(bins.find(19.9), Some(2));
        assert_eq!(bins.find(20.), None);
        assert_eq!(bins.find(100.), None);
        assert_eq!(bins.find(f64::NAN), None);
    }

    #[test]
    fn deserialize() {
        let bins: Bins = serde_yaml::from_str("[1, 10, 20]").unwrap();
        assert_eq!(bins.len(), 2);
        assert!(serde_yaml::from_str::<Bins>("[10, 1]").is_err());
    }
}
