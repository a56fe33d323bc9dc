use std::collections::BTreeSet;

use itertools::zip_eq;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::pid::{PidCategory, PidTable};
use crate::record::{FeatureHit, TruthHit};

/// Object multiplicities in a single event
#[derive(
    Deserialize, Serialize, Copy, Clone, Debug, Default, Eq, PartialEq, Hash,
)]
pub struct EventCounts {
    pub tracks: usize,
    /// Calorimeter hits, i.e. all hits that are not tracks
    pub hits: usize,
    /// Distinct truth particles
    pub particles: usize,
    pub leptons: usize,
    pub charged_hadrons: usize,
    pub photons: usize,
    pub neutral_hadrons: usize,
}

/// Per-event multiplicities, one entry per event in each vector
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Distribution {
    pub tracks: Vec<usize>,
    pub hits: Vec<usize>,
    pub particles: Vec<usize>,
    pub leptons: Vec<usize>,
    pub charged_hadrons: Vec<usize>,
    pub photons: Vec<usize>,
    pub neutral_hadrons: Vec<usize>,
}

impl Distribution {
    fn push(&mut self, c: EventCounts) {
        self.tracks.push(c.tracks);
        self.hits.push(c.hits);
        self.particles.push(c.particles);
        self.leptons.push(c.leptons);
        self.charged_hadrons.push(c.charged_hadrons);
        self.photons.push(c.photons);
        self.neutral_hadrons.push(c.neutral_hadrons);
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Mean multiplicity for each kind of object
    pub fn means(&self) -> Vec<(&'static str, f64)> {
        let mean = |v: &[usize]| {
            v.iter().sum::<usize>() as f64 / v.len() as f64
        };
        vec![
            ("leptons", mean(&self.leptons)),
            ("charged_hadrons", mean(&self.charged_hadrons)),
            ("neutral_hadrons", mean(&self.neutral_hadrons)),
            ("photons", mean(&self.photons)),
            ("particles", mean(&self.particles)),
            ("tracks", mean(&self.tracks)),
            ("hits", mean(&self.hits)),
        ]
    }
}

/// Counts objects by category in each event
#[derive(Copy, Clone, Debug)]
pub struct DistributionSummarizer<'p> {
    pids: &'p PidTable,
}

impl<'p> DistributionSummarizer<'p> {
    pub fn new(pids: &'p PidTable) -> Self {
        Self { pids }
    }

    /// Multiplicities in a single event
    pub fn event_counts(
        &self,
        truth: &[TruthHit],
        features: &[FeatureHit],
    ) -> EventCounts {
        let tracks = features.iter().filter(|f| f.is_track()).count();
        EventCounts {
            tracks,
            hits: features.len() - tracks,
            particles: self.distinct_particles(truth, PidCategory::All),
            leptons: self.distinct_particles(truth, PidCategory::Lepton),
            charged_hadrons: self
                .distinct_particles(truth, PidCategory::ChargedHadron),
            photons: self.distinct_particles(truth, PidCategory::Photon),
            neutral_hadrons: self
                .distinct_particles(truth, PidCategory::NeutralHadron),
        }
    }

    /// Multiplicities for each event
    ///
    /// `truth` and `features` hold the hits of the same events in the
    /// same order.
    pub fn per_event_counts<T, F>(
        &self,
        truth: &[T],
        features: &[F],
    ) -> Result<Distribution, ConfigurationError>
    where
        T: AsRef<[TruthHit]>,
        F: AsRef<[FeatureHit]>,
    {
        if truth.len() != features.len() {
            return Err(ConfigurationError::MismatchedEventCount {
                truth: truth.len(),
                features: features.len(),
            });
        }
        let mut res = Distribution::default();
        for (t, f) in zip_eq(truth, features) {
            res.push(self.event_counts(t.as_ref(), f.as_ref()));
        }
        Ok(res)
    }

    fn distinct_particles(
        &self,
        truth: &[TruthHit],
        category: PidCategory,
    ) -> usize {
        truth
            .iter()
            .filter(|h| self.pids.contains(category, h.pid))
            .map(|h| h.particle)
            .collect::<BTreeSet<_>>()
            .len()
    }
}
