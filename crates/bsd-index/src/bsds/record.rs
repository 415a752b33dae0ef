use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bsda::Bsda;
use super::bsdasri::Bsdasri;
use super::bsdd::Bsdd;
use super::bsff::Bsff;
use super::bsvhu::Bsvhu;
use super::classifier::{self, Transition, TransportLeg};
use super::normalizer::{self, SourceFields};
use super::participants::Participant;
use super::returns::{self, ReturnSignal};
use super::tabs::BucketAssignment;
use super::unified::UnifiedWasteRecord;
use super::org::OrgId;

/// The five legal document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BsdType {
    Bsdd,
    Bsda,
    Bsdasri,
    Bsff,
    Bsvhu,
}

impl BsdType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bsdd => "BSDD",
            Self::Bsda => "BSDA",
            Self::Bsdasri => "BSDASRI",
            Self::Bsff => "BSFF",
            Self::Bsvhu => "BSVHU",
        }
    }

    pub const fn ordered() -> [Self; 5] {
        [Self::Bsdd, Self::Bsda, Self::Bsdasri, Self::Bsff, Self::Bsvhu]
    }
}

impl fmt::Display for BsdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBsdType(pub String);

impl fmt::Display for UnknownBsdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown document type '{}'", self.0)
    }
}

impl std::error::Error for UnknownBsdType {}

impl FromStr for BsdType {
    type Err = UnknownBsdType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|bsd_type| bsd_type.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownBsdType(value.to_string()))
    }
}

/// Behavior every document type provides to the normalizer and the classifier.
pub trait Bordereau {
    fn bsd_type(&self) -> BsdType;

    fn id(&self) -> &str;

    fn is_draft(&self) -> bool;

    fn status_label(&self) -> &'static str;

    /// Declarative mapping of the type's fields onto the unified record.
    fn source_fields(&self) -> SourceFields<'_>;

    /// Roles held by identified organizations.
    fn participants(&self) -> Vec<Participant>;

    /// Status table entry for the current status, ignoring the draft flag.
    fn transition(&self) -> Transition;

    fn transport_legs(&self) -> Vec<TransportLeg> {
        Vec::new()
    }

    fn return_signal(&self) -> Option<ReturnSignal> {
        None
    }
}

/// A document of any of the five types, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum WasteDocument {
    Bsdd(Bsdd),
    Bsda(Bsda),
    Bsdasri(Bsdasri),
    Bsff(Bsff),
    Bsvhu(Bsvhu),
}

impl WasteDocument {
    pub fn as_bordereau(&self) -> &dyn Bordereau {
        match self {
            Self::Bsdd(record) => record,
            Self::Bsda(record) => record,
            Self::Bsdasri(record) => record,
            Self::Bsff(record) => record,
            Self::Bsvhu(record) => record,
        }
    }

    pub fn id(&self) -> &str {
        self.as_bordereau().id()
    }

    pub fn bsd_type(&self) -> BsdType {
        self.as_bordereau().bsd_type()
    }

    pub fn normalize(&self) -> UnifiedWasteRecord {
        match self {
            Self::Bsdd(record) => normalizer::normalize(record),
            Self::Bsda(record) => normalizer::normalize(record),
            Self::Bsdasri(record) => normalizer::normalize(record),
            Self::Bsff(record) => normalizer::normalize(record),
            Self::Bsvhu(record) => normalizer::normalize(record),
        }
    }

    pub fn classify(&self) -> BucketAssignment {
        classifier::classify(self.as_bordereau())
    }

    /// Organizations that should see the document in their return tab at `now`.
    pub fn return_org_ids(&self, now: DateTime<Utc>) -> Vec<OrgId> {
        returns::return_org_ids(self.as_bordereau(), now)
    }
}

impl From<Bsdd> for WasteDocument {
    fn from(value: Bsdd) -> Self {
        Self::Bsdd(value)
    }
}

impl From<Bsda> for WasteDocument {
    fn from(value: Bsda) -> Self {
        Self::Bsda(value)
    }
}

impl From<Bsdasri> for WasteDocument {
    fn from(value: Bsdasri) -> Self {
        Self::Bsdasri(value)
    }
}

impl From<Bsff> for WasteDocument {
    fn from(value: Bsff) -> Self {
        Self::Bsff(value)
    }
}

impl From<Bsvhu> for WasteDocument {
    fn from(value: Bsvhu) -> Self {
        Self::Bsvhu(value)
    }
}
