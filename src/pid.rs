use std::convert::TryFrom;
use std::str::FromStr;

use particle_id::ParticleID;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::ConfigurationError;

/// Particle categories used to stratify metrics
#[derive(
    Deserialize,
    Serialize,
    Display,
    EnumIter,
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
)]
#[serde(rename_all = "snake_case", try_from = "String")]
#[strum(serialize_all = "snake_case")]
pub enum PidCategory {
    Photon,
    NeutralHadron,
    ChargedHadron,
    Lepton,
    /// Photons and neutral hadrons
    Neutral,
    /// Leptons and charged hadrons
    Charged,
    /// No filtering
    All,
}

impl FromStr for PidCategory {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photon" | "gamma" => Ok(Self::Photon),
            "neutral_hadron" | "neutral-hadron" | "nh" => {
                Ok(Self::NeutralHadron)
            }
            "charged_hadron" | "charged-hadron" | "ch" => {
                Ok(Self::ChargedHadron)
            }
            "lepton" => Ok(Self::Lepton),
            "neutral" => Ok(Self::Neutral),
            "charged" => Ok(Self::Charged),
            "all" => Ok(Self::All),
            _ => Err(ConfigurationError::UnknownCategory(s.to_owned())),
        }
    }
}

impl TryFrom<String> for PidCategory {
    type Error = ConfigurationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Which predicted classes pass a category filter
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClassFilter {
    /// Every predicted class passes
    Any,
    /// Only the given class index passes
    Class(i64),
    /// The category has no single predicted class
    Nothing,
}

impl ClassFilter {
    pub fn accepts(&self, class: i64) -> bool {
        match self {
            ClassFilter::Any => true,
            ClassFilter::Class(c) => *c == class,
            ClassFilter::Nothing => false,
        }
    }
}

/// The particle codes of a single base category
#[derive(Deserialize, Serialize, Clone, Debug, Eq, PartialEq)]
pub struct CategoryCodes {
    /// Truth particle ids belonging to the category
    pub codes: Vec<ParticleID>,
    /// Index of the category in the classifier output, if any
    pub pred_class: Option<i64>,
}

impl CategoryCodes {
    fn new(codes: &[i32], pred_class: Option<i64>) -> Self {
        Self {
            codes: codes.iter().map(|&c| ParticleID::new(c)).collect(),
            pred_class,
        }
    }

    fn contains(&self, pid: ParticleID) -> bool {
        self.codes.contains(&pid)
    }
}

/// Mapping from particle category to particle ids
///
/// Composite categories are unions of the base categories:
/// `neutral` = `photon` ∪ `neutral_hadron`,
/// `charged` = `lepton` ∪ `charged_hadron`.
#[derive(Deserialize, Serialize, Clone, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct PidTable {
    pub photon: CategoryCodes,
    pub neutral_hadron: CategoryCodes,
    pub charged_hadron: CategoryCodes,
    pub lepton: CategoryCodes,
}

impl Default for PidTable {
    fn default() -> Self {
        Self {
            photon: CategoryCodes::new(&[22], Some(0)),
            neutral_hadron: CategoryCodes::new(
                &[130, 310, 311, 2112, -2112, 3122, -3122, 3322, -3322],
                Some(1),
            ),
            charged_hadron: CategoryCodes::new(
                &[
                    211, -211, 321, -321, 2212, -2212, 3112, -3112, 3222,
                    -3222, 3312, -3312,
                ],
                Some(2),
            ),
            lepton: CategoryCodes::new(&[11, -11, 13, -13], Some(2)),
        }
    }
}

impl PidTable {
    /// Whether the truth particle id `pid` belongs to `category`
    pub fn contains(&self, category: PidCategory, pid: ParticleID) -> bool {
        use PidCategory::*;
        match category {
            Photon => self.photon.contains(pid),
            NeutralHadron => self.neutral_hadron.contains(pid),
            ChargedHadron => self.charged_hadron.contains(pid),
            Lepton => self.lepton.contains(pid),
            Neutral => {
                self.photon.contains(pid) || self.neutral_hadron.contains(pid)
            }
            Charged => {
                self.lepton.contains(pid) || self.charged_hadron.contains(pid)
            }
            All => true,
        }
    }

    /// The predicted classes compatible with `category`
    pub fn class_filter(&self, category: PidCategory) -> ClassFilter {
        use PidCategory::*;
        let class = match category {
            Photon => self.photon.pred_class,
            NeutralHadron => self.neutral_hadron.pred_class,
            ChargedHadron | Charged => self.charged_hadron.pred_class,
            Lepton => self.lepton.pred_class,
            Neutral => None,
            All => return ClassFilter::Any,
        };
        class.map(ClassFilter::Class).unwrap_or(ClassFilter::Nothing)
    }
}
