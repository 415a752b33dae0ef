use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::TransportLeg;
use super::org::OrgId;

/// Company block shared by every actor of every document type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub siret: Option<String>,
    pub vat_number: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub mail: Option<String>,
}

impl CompanyInfo {
    /// SIRET when present, VAT number otherwise.
    pub fn org_id(&self) -> Option<OrgId> {
        OrgId::from_optional(self.siret.as_deref())
            .or_else(|| OrgId::from_optional(self.vat_number.as_deref()))
    }

    pub fn siret_id(&self) -> Option<OrgId> {
        OrgId::from_optional(self.siret.as_deref())
    }
}

/// One leg of a multi-modal transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransporterEntry {
    pub number: u8,
    pub company: CompanyInfo,
    pub custom_info: Option<String>,
    pub transport_plates: Vec<String>,
    pub taken_over_at: Option<DateTime<Utc>>,
}

/// How a destination received a shipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcceptationStatus {
    Accepted,
    Refused,
    PartiallyRefused,
}

/// Position an organization holds on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Emitter,
    EcoOrganisme,
    Worker,
    Transporter(u8),
    Destination,
    TempStorageTransporter,
    TempStorageDestination,
    Broker,
    Trader,
    Intermediary(u8),
    Detenteur(u8),
}

/// A role held by an identified organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub role: Role,
    pub org_id: OrgId,
}

/// Collects participants, skipping roles whose company has no identifier.
#[derive(Debug, Default)]
pub struct ParticipantList {
    participants: Vec<Participant>,
}

impl ParticipantList {
    pub fn push(&mut self, role: Role, org_id: Option<OrgId>) -> &mut Self {
        if let Some(org_id) = org_id {
            self.participants.push(Participant { role, org_id });
        }
        self
    }

    pub fn company(&mut self, role: Role, company: &CompanyInfo) -> &mut Self {
        self.push(role, company.org_id())
    }

    pub fn transporters(&mut self, transporters: &[TransporterEntry]) -> &mut Self {
        for transporter in transporters {
            self.company(Role::Transporter(transporter.number), &transporter.company);
        }
        self
    }

    pub fn intermediaries(&mut self, intermediaries: &[CompanyInfo]) -> &mut Self {
        for (index, company) in intermediaries.iter().enumerate() {
            self.company(Role::Intermediary(ordinal(index)), company);
        }
        self
    }

    pub fn finish(&mut self) -> Vec<Participant> {
        std::mem::take(&mut self.participants)
    }
}

/// 1-based position, saturating for absurdly long lists.
pub(crate) fn ordinal(index: usize) -> u8 {
    u8::try_from(index + 1).unwrap_or(u8::MAX)
}

pub(crate) fn first_transporter(transporters: &[TransporterEntry]) -> Option<&TransporterEntry> {
    transporters.iter().min_by_key(|transporter| transporter.number)
}

pub(crate) fn last_transporter(transporters: &[TransporterEntry]) -> Option<&TransporterEntry> {
    transporters.iter().max_by_key(|transporter| transporter.number)
}

pub(crate) fn transport_legs(transporters: &[TransporterEntry]) -> Vec<TransportLeg> {
    transporters
        .iter()
        .map(|transporter| TransportLeg {
            number: transporter.number,
            org_id: transporter.company.org_id(),
            taken_over: transporter.taken_over_at.is_some(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn company_for_tests(siret: &str) -> CompanyInfo {
    CompanyInfo {
        name: Some(format!("Company {siret}")),
        siret: Some(siret.to_string()),
        ..CompanyInfo::default()
    }
}

#[cfg(test)]
pub(crate) fn transporter_for_tests(number: u8, siret: &str, taken_over: bool) -> TransporterEntry {
    TransporterEntry {
        number,
        company: company_for_tests(siret),
        taken_over_at: taken_over.then(Utc::now),
        ..TransporterEntry::default()
    }
}
