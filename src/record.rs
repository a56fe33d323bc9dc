use std::convert::TryFrom;

use particle_id::ParticleID;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Transverse momentum from energy and pseudorapidity of a massless object
pub fn pt_from_energy(energy: f64, eta: f64) -> f64 {
    energy / eta.cosh()
}

/// Anything that belongs to a single event
pub trait Record {
    fn event_id(&self) -> u64;
}

/// A numeric column of a table with rows of type `R`
///
/// `None` means the value is absent for that row.
pub trait Field<R> {
    fn value(&self, row: &R) -> Option<f64>;
}

/// A true shower
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct TruthObject {
    pub energy: f64,
    pub eta: f64,
    pub phi: f64,
    pub pid: ParticleID,
}

impl TruthObject {
    pub fn pt(&self) -> f64 {
        pt_from_energy(self.energy, self.eta)
    }
}

/// A reconstructed shower
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct PredictedObject {
    pub energy: f64,
    pub eta: f64,
    pub phi: f64,
    /// Index of the predicted particle class
    pub class: i64,
}

impl PredictedObject {
    pub fn pt(&self) -> f64 {
        pt_from_energy(self.energy, self.eta)
    }
}

/// One truth or predicted object, possibly matched to its counterpart
///
/// At least one of `truth` and `pred` is always present.
#[derive(Serialize, Copy, Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    event_id: u64,
    truth: Option<TruthObject>,
    pred: Option<PredictedObject>,
    matched: bool,
}

impl ObjectRecord {
    /// A truth object with its matched prediction
    pub fn matched(
        event_id: u64,
        truth: TruthObject,
        pred: PredictedObject,
    ) -> Self {
        Self {
            event_id,
            truth: Some(truth),
            pred: Some(pred),
            matched: true,
        }
    }

    /// A truth object without a prediction
    pub fn missed(event_id: u64, truth: TruthObject) -> Self {
        Self {
            event_id,
            truth: Some(truth),
            pred: None,
            matched: false,
        }
    }

    /// A prediction without a truth object
    pub fn fake(event_id: u64, pred: PredictedObject) -> Self {
        Self {
            event_id,
            truth: None,
            pred: Some(pred),
            matched: false,
        }
    }

    pub fn truth(&self) -> Option<&TruthObject> {
        self.truth.as_ref()
    }

    pub fn pred(&self) -> Option<&PredictedObject> {
        self.pred.as_ref()
    }

    /// The flag set by the matching stage
    pub fn is_matched(&self) -> bool {
        self.matched
    }
}

impl Record for ObjectRecord {
    fn event_id(&self) -> u64 {
        self.event_id
    }
}

#[derive(Deserialize)]
struct RawObjectRecord {
    event_id: u64,
    #[serde(default)]
    truth: Option<TruthObject>,
    #[serde(default)]
    pred: Option<PredictedObject>,
    #[serde(default)]
    matched: bool,
}

impl TryFrom<RawObjectRecord> for ObjectRecord {
    type Error = ConfigurationError;

    fn try_from(raw: RawObjectRecord) -> Result<Self, Self::Error> {
        let RawObjectRecord {
            event_id,
            truth,
            pred,
            matched,
        } = raw;
        if truth.is_none() && pred.is_none() {
            return Err(ConfigurationError::EmptyObjectRecord(event_id));
        }
        Ok(Self {
            event_id,
            truth,
            pred,
            matched,
        })
    }
}

impl<'de> Deserialize<'de> for ObjectRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawObjectRecord::deserialize(deserializer)?;
        ObjectRecord::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Columns of an [ObjectRecord]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ObjectField {
    TruthEnergy,
    TruthEta,
    TruthPhi,
    TruthPt,
    PredEnergy,
    PredEta,
    PredPhi,
    PredPt,
}

impl Field<ObjectRecord> for ObjectField {
    fn value(&self, row: &ObjectRecord) -> Option<f64> {
        use ObjectField::*;
        match self {
            TruthEnergy => row.truth.map(|t| t.energy),
            TruthEta => row.truth.map(|t| t.eta),
            TruthPhi => row.truth.map(|t| t.phi),
            TruthPt => row.truth.map(|t| t.pt()),
            PredEnergy => row.pred.map(|p| p.energy),
            PredEta => row.pred.map(|p| p.eta),
            PredPhi => row.pred.map(|p| p.phi),
            PredPt => row.pred.map(|p| p.pt()),
        }
    }
}

/// All objects of a run, across events
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct ObjectTable {
    rows: Vec<ObjectRecord>,
}

impl ObjectTable {
    pub fn new(rows: Vec<ObjectRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ObjectRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append the objects of another table
    pub fn extend(&mut self, other: ObjectTable) {
        self.rows.extend(other.rows)
    }
}

impl FromIterator<ObjectRecord> for ObjectTable {
    fn from_iter<I: IntoIterator<Item = ObjectRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Kinematics of a single jet
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq)]
pub struct JetKinematics {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub n_constituents: u32,
}

/// One truth or predicted jet
///
/// A matched jet always has both truth and predicted kinematics.
#[derive(Serialize, Copy, Clone, Debug, PartialEq)]
pub struct JetRecord {
    event_id: u64,
    matched: bool,
    truth: Option<JetKinematics>,
    pred: Option<JetKinematics>,
}

impl JetRecord {
    pub fn matched(
        event_id: u64,
        truth: JetKinematics,
        pred: JetKinematics,
    ) -> Self {
        Self {
            event_id,
            matched: true,
            truth: Some(truth),
            pred: Some(pred),
        }
    }

    /// A jet that was not matched by the jet-matching stage
    pub fn unmatched(
        event_id: u64,
        truth: Option<JetKinematics>,
        pred: Option<JetKinematics>,
    ) -> Self {
        Self {
            event_id,
            matched: false,
            truth,
            pred,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    pub fn truth(&self) -> Option<&JetKinematics> {
        self.truth.as_ref()
    }

    pub fn pred(&self) -> Option<&JetKinematics> {
        self.pred.as_ref()
    }

    pub(crate) fn scale_pred_pt(&mut self, factor: f64) {
        if let Some(pred) = self.pred.as_mut() {
            pred.pt *= factor;
        }
    }
}

impl Record for JetRecord {
    fn event_id(&self) -> u64 {
        self.event_id
    }
}

#[derive(Deserialize)]
struct RawJetRecord {
    event_id: u64,
    #[serde(default)]
    matched: bool,
    #[serde(default)]
    truth: Option<JetKinematics>,
    #[serde(default)]
    pred: Option<JetKinematics>,
}

impl TryFrom<RawJetRecord> for JetRecord {
    type Error = ConfigurationError;

    fn try_from(raw: RawJetRecord) -> Result<Self, Self::Error> {
        let RawJetRecord {
            event_id,
            matched,
            truth,
            pred,
        } = raw;
        if matched && (truth.is_none() || pred.is_none()) {
            return Err(ConfigurationError::IncompleteMatchedJet(event_id));
        }
        Ok(Self {
            event_id,
            matched,
            truth,
            pred,
        })
    }
}

impl<'de> Deserialize<'de> for JetRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawJetRecord::deserialize(deserializer)?;
        JetRecord::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Columns of a [JetRecord]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum JetField {
    TruePt,
    TrueEta,
    TruePhi,
    PredPt,
    PredEta,
    PredPhi,
}

impl Field<JetRecord> for JetField {
    fn value(&self, row: &JetRecord) -> Option<f64> {
        use JetField::*;
        match self {
            TruePt => row.truth.map(|t| t.pt),
            TrueEta => row.truth.map(|t| t.eta),
            TruePhi => row.truth.map(|t| t.phi),
            PredPt => row.pred.map(|p| p.pt),
            PredEta => row.pred.map(|p| p.eta),
            PredPhi => row.pred.map(|p| p.phi),
        }
    }
}

/// All jets of a run, across events
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct JetTable {
    rows: Vec<JetRecord>,
}

impl JetTable {
    pub fn new(rows: Vec<JetRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[JetRecord] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [JetRecord] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<JetRecord> for JetTable {
    fn from_iter<I: IntoIterator<Item = JetRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Truth information attached to a single detector hit
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct TruthHit {
    /// Identifier of the truth particle the hit is assigned to
    pub particle: i64,
    pub pid: ParticleID,
}

/// Input features of a single detector hit
#[derive(Deserialize, Serialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct FeatureHit {
    /// Non-zero for tracks, zero for calorimeter hits
    pub track_marker: i32,
}

impl FeatureHit {
    pub fn is_track(&self) -> bool {
        self.track_marker != 0
    }
}
