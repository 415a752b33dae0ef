//! BSVHU: end-of-life vehicles.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::{Move, Slot, Transition, TransportLeg};
use super::normalizer::{join_address, PartySource, SourceFields};
use super::participants::{
    first_transporter, last_transporter, transport_legs, AcceptationStatus, CompanyInfo,
    Participant, ParticipantList, Role, TransporterEntry,
};
use super::record::{Bordereau, BsdType};
use super::returns::ReturnSignal;
use super::tabs::Bucket;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BsvhuStatus {
    #[default]
    Initial,
    SignedByProducer,
    Sent,
    Received,
    Processed,
    Refused,
    #[serde(other)]
    Unknown,
}

impl BsvhuStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::SignedByProducer => "SIGNED_BY_PRODUCER",
            Self::Sent => "SENT",
            Self::Received => "RECEIVED",
            Self::Processed => "PROCESSED",
            Self::Refused => "REFUSED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bsvhu {
    pub id: String,
    pub custom_id: Option<String>,
    pub status: BsvhuStatus,
    pub is_draft: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    pub emitter: CompanyInfo,
    pub emitter_company_street: Option<String>,
    pub emitter_company_postal_code: Option<String>,
    pub emitter_company_city: Option<String>,
    pub emitter_custom_info: Option<String>,
    /// The emitter is not registered and will not sign: the transporter starts the chain.
    pub emitter_not_on_td: bool,
    /// The emitter has no SIRET (e.g. abandoned vehicle).
    pub emitter_no_siret: bool,
    pub emitter_emission_signature_date: Option<DateTime<Utc>>,
    pub eco_organisme: CompanyInfo,
    pub transporters: Vec<TransporterEntry>,
    pub destination: CompanyInfo,
    pub destination_custom_info: Option<String>,
    pub broker: CompanyInfo,
    pub trader: CompanyInfo,
    pub intermediaries: Vec<CompanyInfo>,
    pub next_destination: CompanyInfo,

    pub waste_code: Option<String>,
    pub identification_numbers: Vec<String>,
    pub destination_reception_date: Option<DateTime<Utc>>,
    pub destination_reception_weight: Option<f64>,
    pub destination_reception_acceptation_status: Option<AcceptationStatus>,
    pub destination_operation_code: Option<String>,
    pub destination_operation_mode: Option<String>,
    pub destination_operation_date: Option<DateTime<Utc>>,
}

impl Bsvhu {
    /// Combined address, rebuilt from its parts when only those are filled.
    fn emitter_address(&self) -> Option<Cow<'_, str>> {
        match self.emitter.address.as_deref().filter(|address| !address.trim().is_empty()) {
            Some(_) => None,
            None => join_address([
                self.emitter_company_street.as_deref(),
                self.emitter_company_postal_code.as_deref(),
                self.emitter_company_city.as_deref(),
            ]),
        }
    }
}

impl Bordereau for Bsvhu {
    fn bsd_type(&self) -> BsdType {
        BsdType::Bsvhu
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn is_draft(&self) -> bool {
        self.is_draft
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn source_fields(&self) -> SourceFields<'_> {
        let transporter = first_transporter(&self.transporters);

        let mut companies = vec![&self.emitter, &self.eco_organisme];
        companies.extend(self.transporters.iter().map(|entry| &entry.company));
        companies.extend([&self.destination, &self.broker, &self.trader]);
        companies.extend(self.intermediaries.iter());

        SourceFields {
            custom_id: self.custom_id.as_deref(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            emitter_emission_date: self.emitter_emission_signature_date,
            transporter_taken_over_at: transporter.and_then(|entry| entry.taken_over_at),
            destination_reception_date: self.destination_reception_date,
            destination_acceptation_date: self.destination_reception_date,
            destination_operation_date: self.destination_operation_date,
            waste_code: self.waste_code.as_deref(),
            identification_numbers: self
                .identification_numbers
                .iter()
                .map(String::as_str)
                .collect(),
            emitter: PartySource::of(&self.emitter)
                .address(self.emitter_address())
                .custom_info(self.emitter_custom_info.as_deref()),
            eco_organisme: PartySource::of(&self.eco_organisme),
            transporter: PartySource::transporter(transporter),
            transporter_transport_plates: transporter
                .map(|entry| entry.transport_plates.iter().map(String::as_str).collect())
                .unwrap_or_default(),
            destination: PartySource::of(&self.destination)
                .custom_info(self.destination_custom_info.as_deref()),
            destination_operation_code: self.destination_operation_code.as_deref(),
            destination_operation_mode: self.destination_operation_mode.as_deref(),
            destination_reception_weight: self.destination_reception_weight,
            destination_acceptation_weight: self.destination_reception_weight,
            next_destination: PartySource::of(&self.next_destination),
            broker: PartySource::of(&self.broker),
            trader: PartySource::of(&self.trader),
            companies,
            ..SourceFields::default()
        }
    }

    fn participants(&self) -> Vec<Participant> {
        let mut list = ParticipantList::default();
        if !self.emitter_no_siret {
            list.company(Role::Emitter, &self.emitter);
        }
        list.company(Role::EcoOrganisme, &self.eco_organisme)
            .transporters(&self.transporters)
            .company(Role::Destination, &self.destination)
            .company(Role::Broker, &self.broker)
            .company(Role::Trader, &self.trader)
            .intermediaries(&self.intermediaries)
            .finish()
    }

    fn transition(&self) -> Transition {
        match self.status {
            BsvhuStatus::Initial if self.emitter_no_siret => {
                Transition::set(Slot::FirstTransporter, Bucket::ToCollect)
            }
            BsvhuStatus::Initial if self.emitter_not_on_td => Transition::Moves(vec![
                Move::Set(Slot::Emitter, Bucket::ForAction),
                Move::Set(Slot::FirstTransporter, Bucket::ToCollect),
            ]),
            // The transporter keeps following until the producer has signed.
            BsvhuStatus::Initial => Transition::set(Slot::Emitter, Bucket::ForAction),
            BsvhuStatus::SignedByProducer => {
                Transition::set(Slot::FirstTransporter, Bucket::ToCollect)
            }
            BsvhuStatus::Sent => Transition::Moves(vec![Move::Relay {
                destination: Slot::Destination,
            }]),
            BsvhuStatus::Received => Transition::set(Slot::Destination, Bucket::ForAction),
            BsvhuStatus::Processed | BsvhuStatus::Refused => Transition::Archive,
            BsvhuStatus::Unknown => Transition::Unbucketed,
        }
    }

    fn transport_legs(&self) -> Vec<TransportLeg> {
        transport_legs(&self.transporters)
    }

    fn return_signal(&self) -> Option<ReturnSignal> {
        Some(ReturnSignal {
            received_at: self.destination_reception_date?,
            fully_accepted: self.status != BsvhuStatus::Refused
                && self.destination_reception_acceptation_status
                    == Some(AcceptationStatus::Accepted),
            last_transporter: last_transporter(&self.transporters)
                .and_then(|entry| entry.company.siret_id()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsds::classifier::classify;
    use crate::bsds::org::OrgId;
    use crate::bsds::participants::{company_for_tests, transporter_for_tests};

    const EMITTER: &str = "11111111111111";
    const TRANSPORTER: &str = "22222222222222";
    const DESTINATION: &str = "33333333333333";

    fn org(value: &str) -> OrgId {
        OrgId::parse(value).expect("valid org id")
    }

    fn vhu(status: BsvhuStatus) -> Bsvhu {
        Bsvhu {
            id: "VHU-20210101-AAAAAAAA".into(),
            status,
            emitter: company_for_tests(EMITTER),
            transporters: vec![transporter_for_tests(1, TRANSPORTER, false)],
            destination: company_for_tests(DESTINATION),
            ..Bsvhu::default()
        }
    }

    #[test]
    fn emitter_without_siret_leaves_the_transporter_in_charge() {
        let mut record = vhu(BsvhuStatus::Initial);
        record.emitter_no_siret = true;
        let assignment = classify(&record);
        assert_eq!(assignment.bucket_of(&org(EMITTER)), None);
        assert_eq!(assignment.bucket_of(&org(TRANSPORTER)), Some(Bucket::ToCollect));
    }

    #[test]
    fn unregistered_emitter_lets_the_transporter_collect() {
        let mut record = vhu(BsvhuStatus::Initial);
        record.emitter_not_on_td = true;
        let assignment = classify(&record);
        assert_eq!(assignment.bucket_of(&org(EMITTER)), Some(Bucket::ForAction));
        assert_eq!(assignment.bucket_of(&org(TRANSPORTER)), Some(Bucket::ToCollect));
    }

    #[test]
    fn rebuilds_emitter_address_from_parts() {
        let mut record = vhu(BsvhuStatus::Initial);
        record.emitter_company_street = Some("4 boulevard Pasteur".into());
        record.emitter_company_postal_code = Some("44100".into());
        record.emitter_company_city = Some("Nantes".into());
        let unified = crate::bsds::normalize(&record);
        assert_eq!(unified.emitter.address, "4 boulevard Pasteur, 44100, Nantes");

        record.emitter.address = Some("1 rue de la Paix".into());
        let unified = crate::bsds::normalize(&record);
        assert_eq!(unified.emitter.address, "1 rue de la Paix");
    }

    #[test]
    fn unknown_status_is_unbucketed() {
        let record: Bsvhu = serde_json::from_value(serde_json::json!({
            "id": "VHU-1",
            "status": "ARCHIVED_SOMEWHERE_ELSE",
            "emitter": { "siret": EMITTER }
        }))
        .expect("unknown statuses deserialize");
        assert_eq!(record.status, BsvhuStatus::Unknown);
        assert!(classify(&record).is_empty());
    }
}
