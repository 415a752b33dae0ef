//! BSDASRI: infectious healthcare waste, carried by a single transporter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::{Slot, Transition, TransportLeg};
use super::normalizer::{join_address, PartySource, SourceFields};
use super::participants::{
    AcceptationStatus, CompanyInfo, Participant, ParticipantList, Role,
};
use super::record::{Bordereau, BsdType};
use super::returns::ReturnSignal;
use super::tabs::Bucket;

/// Leg number of the only transporter.
const TRANSPORTER: u8 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BsdasriStatus {
    #[default]
    Initial,
    SignedByProducer,
    Sent,
    Received,
    Processed,
    Refused,
    AwaitingGroup,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl BsdasriStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::SignedByProducer => "SIGNED_BY_PRODUCER",
            Self::Sent => "SENT",
            Self::Received => "RECEIVED",
            Self::Processed => "PROCESSED",
            Self::Refused => "REFUSED",
            Self::AwaitingGroup => "AWAITING_GROUP",
            Self::Canceled => "CANCELED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BsdasriType {
    #[default]
    Simple,
    Grouping,
    /// Built by the transporter from collected dasris; emitter and transporter coincide.
    Synthesis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bsdasri {
    pub id: String,
    pub status: BsdasriStatus,
    pub is_draft: bool,
    pub bsdasri_type: BsdasriType,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    pub emitter: CompanyInfo,
    pub emitter_custom_info: Option<String>,
    pub emitter_pickup_site_name: Option<String>,
    pub emitter_pickup_site_address: Option<String>,
    pub emitter_pickup_site_postal_code: Option<String>,
    pub emitter_pickup_site_city: Option<String>,
    pub emitter_emission_signature_date: Option<DateTime<Utc>>,
    pub eco_organisme: CompanyInfo,
    pub transporter: CompanyInfo,
    pub transporter_custom_info: Option<String>,
    pub transporter_transport_plates: Vec<String>,
    pub transporter_taken_over_at: Option<DateTime<Utc>>,
    pub destination: CompanyInfo,
    pub destination_cap: Option<String>,
    pub destination_custom_info: Option<String>,
    pub broker: CompanyInfo,
    pub trader: CompanyInfo,
    pub intermediaries: Vec<CompanyInfo>,

    pub waste_code: Option<String>,
    pub waste_adr: Option<String>,
    pub identification_numbers: Vec<String>,
    pub destination_reception_date: Option<DateTime<Utc>>,
    pub destination_reception_acceptation_status: Option<AcceptationStatus>,
    pub destination_reception_waste_weight_value: Option<f64>,
    pub destination_operation_code: Option<String>,
    pub destination_operation_mode: Option<String>,
    pub destination_operation_date: Option<DateTime<Utc>>,
}

impl Bordereau for Bsdasri {
    fn bsd_type(&self) -> BsdType {
        BsdType::Bsdasri
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
        let mut companies = vec![
            &self.emitter,
            &self.eco_organisme,
            &self.transporter,
            &self.destination,
            &self.broker,
            &self.trader,
        ];
        companies.extend(self.intermediaries.iter());

        SourceFields {
            created_at: self.created_at,
            updated_at: self.updated_at,
            emitter_emission_date: self.emitter_emission_signature_date,
            transporter_taken_over_at: self.transporter_taken_over_at,
            destination_reception_date: self.destination_reception_date,
            destination_acceptation_date: self.destination_reception_date,
            destination_operation_date: self.destination_operation_date,
            waste_code: self.waste_code.as_deref(),
            waste_adr: self.waste_adr.as_deref(),
            identification_numbers: self
                .identification_numbers
                .iter()
                .map(String::as_str)
                .collect(),
            emitter: PartySource::of(&self.emitter)
                .custom_info(self.emitter_custom_info.as_deref()),
            emitter_pickup_site_name: self.emitter_pickup_site_name.as_deref(),
            emitter_pickup_site_address: join_address([
                self.emitter_pickup_site_address.as_deref(),
                self.emitter_pickup_site_postal_code.as_deref(),
                self.emitter_pickup_site_city.as_deref(),
            ]),
            eco_organisme: PartySource::of(&self.eco_organisme),
            transporter: PartySource::of(&self.transporter)
                .custom_info(self.transporter_custom_info.as_deref()),
            transporter_transport_plates: self
                .transporter_transport_plates
                .iter()
                .map(String::as_str)
                .collect(),
            destination: PartySource::of(&self.destination)
                .custom_info(self.destination_custom_info.as_deref()),
            destination_cap: self.destination_cap.as_deref(),
            destination_operation_code: self.destination_operation_code.as_deref(),
            destination_operation_mode: self.destination_operation_mode.as_deref(),
            destination_acceptation_weight: self.destination_reception_waste_weight_value,
            broker: PartySource::of(&self.broker),
            trader: PartySource::of(&self.trader),
            companies,
            ..SourceFields::default()
        }
    }

    fn participants(&self) -> Vec<Participant> {
        ParticipantList::default()
            .company(Role::Emitter, &self.emitter)
            .company(Role::EcoOrganisme, &self.eco_organisme)
            .company(Role::Transporter(TRANSPORTER), &self.transporter)
            .company(Role::Destination, &self.destination)
            .company(Role::Broker, &self.broker)
            .company(Role::Trader, &self.trader)
            .intermediaries(&self.intermediaries)
            .finish()
    }

    fn transition(&self) -> Transition {
        use super::classifier::Move::Set;

        match self.status {
            BsdasriStatus::Initial if self.bsdasri_type == BsdasriType::Synthesis => {
                Transition::set(Slot::FirstTransporter, Bucket::ToCollect)
            }
            BsdasriStatus::Initial => Transition::Moves(vec![
                Set(Slot::Emitter, Bucket::ForAction),
                Set(Slot::FirstTransporter, Bucket::ToCollect),
            ]),
            BsdasriStatus::SignedByProducer => {
                Transition::set(Slot::FirstTransporter, Bucket::ToCollect)
            }
            BsdasriStatus::Sent => Transition::Moves(vec![
                Set(Slot::Destination, Bucket::ForAction),
                Set(Slot::FirstTransporter, Bucket::Collected),
            ]),
            BsdasriStatus::Received => Transition::set(Slot::Destination, Bucket::ForAction),
            BsdasriStatus::Processed | BsdasriStatus::Refused | BsdasriStatus::Canceled => {
                Transition::Archive
            }
            BsdasriStatus::AwaitingGroup => Transition::follow(),
            BsdasriStatus::Unknown => Transition::Unbucketed,
        }
    }

    fn transport_legs(&self) -> Vec<TransportLeg> {
        vec![TransportLeg {
            number: TRANSPORTER,
            org_id: self.transporter.org_id(),
            taken_over: self.transporter_taken_over_at.is_some(),
        }]
    }

    fn return_signal(&self) -> Option<ReturnSignal> {
        Some(ReturnSignal {
            received_at: self.destination_reception_date?,
            fully_accepted: self.status != BsdasriStatus::Refused
                && self.destination_reception_acceptation_status
                    == Some(AcceptationStatus::Accepted),
            last_transporter: self.transporter.siret_id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsds::classifier::classify;
    use crate::bsds::org::OrgId;
    use crate::bsds::participants::company_for_tests;

    const EMITTER: &str = "11111111111111";
    const ECO: &str = "22222222222222";
    const TRANSPORTER_SIRET: &str = "33333333333333";
    const DESTINATION: &str = "44444444444444";

    fn org(value: &str) -> OrgId {
        OrgId::parse(value).expect("valid org id")
    }

    fn dasri(status: BsdasriStatus) -> Bsdasri {
        Bsdasri {
            id: "DASRI-20210101-AAAAAAAA".into(),
            status,
            emitter: company_for_tests(EMITTER),
            eco_organisme: company_for_tests(ECO),
            transporter: company_for_tests(TRANSPORTER_SIRET),
            destination: company_for_tests(DESTINATION),
            ..Bsdasri::default()
        }
    }

    #[test]
    fn synthesis_waits_on_its_transporter_only() {
        let mut record = dasri(BsdasriStatus::Initial);
        record.bsdasri_type = BsdasriType::Synthesis;
        let assignment = classify(&record);
        assert_eq!(assignment.bucket_of(&org(EMITTER)), Some(Bucket::Follow));
        assert_eq!(assignment.bucket_of(&org(ECO)), Some(Bucket::Follow));
        assert_eq!(assignment.bucket_of(&org(TRANSPORTER_SIRET)), Some(Bucket::ToCollect));
    }

    #[test]
    fn emitter_also_transporting_sees_the_most_actionable_tab() {
        let mut record = dasri(BsdasriStatus::Sent);
        record.transporter = company_for_tests(EMITTER);
        let assignment = classify(&record);
        assert_eq!(assignment.bucket_of(&org(EMITTER)), Some(Bucket::Collected));
        assert!(assignment.bucket(Bucket::Follow).contains(&org(ECO)));
    }

    #[test]
    fn awaiting_group_is_followed_by_everyone() {
        let assignment = classify(&dasri(BsdasriStatus::AwaitingGroup));
        assert_eq!(assignment.bucket(Bucket::Follow).len(), 4);
    }

    #[test]
    fn maps_pickup_site_and_weight() {
        let mut record = dasri(BsdasriStatus::Received);
        record.emitter_pickup_site_address = Some("3 rue des Lilas".into());
        record.emitter_pickup_site_city = Some("Nantes".into());
        record.destination_reception_waste_weight_value = Some(12.5);
        record.transporter_transport_plates = vec!["AB-123-CD".into()];

        let unified = crate::bsds::normalize(&record);
        assert_eq!(unified.emitter_pickup_site_address, "3 rue des Lilas, Nantes");
        assert_eq!(unified.destination_acceptation_weight, Some(12.5));
        assert_eq!(unified.destination_reception_weight, None);
        assert_eq!(unified.transporter_transport_plates, vec!["AB123CD".to_string()]);
        assert!(unified.packaging_numbers.is_empty());
    }
}
