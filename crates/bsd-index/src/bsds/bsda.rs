//! BSDA: asbestos waste, usually removed by a certified worker before transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::{Move, Slot, Transition, TransportLeg};
use super::normalizer::{PartySource, SourceFields};
use super::participants::{
    first_transporter, last_transporter, transport_legs, AcceptationStatus, CompanyInfo,
    Participant, ParticipantList, Role, TransporterEntry,
};
use super::record::{Bordereau, BsdType};
use super::returns::ReturnSignal;
use super::tabs::Bucket;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BsdaStatus {
    #[default]
    Initial,
    SignedByProducer,
    SignedByWorker,
    Sent,
    Processed,
    Refused,
    AwaitingChild,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl BsdaStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::SignedByProducer => "SIGNED_BY_PRODUCER",
            Self::SignedByWorker => "SIGNED_BY_WORKER",
            Self::Sent => "SENT",
            Self::Processed => "PROCESSED",
            Self::Refused => "REFUSED",
            Self::AwaitingChild => "AWAITING_CHILD",
            Self::Canceled => "CANCELED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BsdaType {
    #[default]
    Other,
    /// Collection by a 2710 waste collection point, which signs as destination first.
    #[serde(rename = "COLLECTION_2710")]
    Collection2710,
    Gathering,
    Reshipment,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bsda {
    pub id: String,
    pub status: BsdaStatus,
    pub is_draft: bool,
    pub bsda_type: BsdaType,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    pub emitter: CompanyInfo,
    pub emitter_is_private_individual: bool,
    pub emitter_custom_info: Option<String>,
    pub emitter_pickup_site_name: Option<String>,
    pub emitter_pickup_site_address: Option<String>,
    pub emitter_emission_signature_date: Option<DateTime<Utc>>,
    pub eco_organisme: CompanyInfo,
    pub worker: CompanyInfo,
    pub worker_is_disabled: bool,
    pub worker_work_signature_date: Option<DateTime<Utc>>,
    pub transporters: Vec<TransporterEntry>,
    pub destination: CompanyInfo,
    pub destination_cap: Option<String>,
    pub destination_custom_info: Option<String>,
    pub broker: CompanyInfo,
    pub intermediaries: Vec<CompanyInfo>,
    pub next_destination: CompanyInfo,

    pub waste_code: Option<String>,
    pub waste_adr: Option<String>,
    pub waste_material_name: Option<String>,
    pub waste_seal_numbers: Vec<String>,
    pub packaging_numbers: Vec<String>,
    pub destination_reception_date: Option<DateTime<Utc>>,
    pub destination_reception_weight: Option<f64>,
    pub destination_reception_acceptation_status: Option<AcceptationStatus>,
    pub destination_operation_code: Option<String>,
    pub destination_operation_mode: Option<String>,
    pub destination_operation_date: Option<DateTime<Utc>>,
}

impl Bsda {
    fn has_active_worker(&self) -> bool {
        !self.worker_is_disabled && self.worker.org_id().is_some()
    }
}

impl Bordereau for Bsda {
    fn bsd_type(&self) -> BsdType {
        BsdType::Bsda
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

        let mut companies = vec![&self.emitter, &self.eco_organisme, &self.worker];
        companies.extend(self.transporters.iter().map(|entry| &entry.company));
        companies.extend([&self.destination, &self.broker]);
        companies.extend(self.intermediaries.iter());

        SourceFields {
            created_at: self.created_at,
            updated_at: self.updated_at,
            emitter_emission_date: self.emitter_emission_signature_date,
            worker_work_date: self.worker_work_signature_date,
            transporter_taken_over_at: transporter.and_then(|entry| entry.taken_over_at),
            destination_reception_date: self.destination_reception_date,
            destination_acceptation_date: self.destination_reception_date,
            destination_operation_date: self.destination_operation_date,
            waste_code: self.waste_code.as_deref(),
            waste_adr: self.waste_adr.as_deref(),
            waste_description: self.waste_material_name.as_deref(),
            packaging_numbers: self.packaging_numbers.iter().map(String::as_str).collect(),
            waste_seal_numbers: self.waste_seal_numbers.iter().map(String::as_str).collect(),
            emitter: PartySource::of(&self.emitter)
                .custom_info(self.emitter_custom_info.as_deref()),
            emitter_pickup_site_name: self.emitter_pickup_site_name.as_deref(),
            emitter_pickup_site_address: self.emitter_pickup_site_address.as_deref().map(Into::into),
            eco_organisme: PartySource::of(&self.eco_organisme),
            worker: PartySource::of(&self.worker),
            transporter: PartySource::transporter(transporter),
            transporter_transport_plates: transporter
                .map(|entry| entry.transport_plates.iter().map(String::as_str).collect())
                .unwrap_or_default(),
            destination: PartySource::of(&self.destination)
                .custom_info(self.destination_custom_info.as_deref()),
            destination_cap: self.destination_cap.as_deref(),
            destination_operation_code: self.destination_operation_code.as_deref(),
            destination_operation_mode: self.destination_operation_mode.as_deref(),
            destination_reception_weight: self.destination_reception_weight,
            destination_acceptation_weight: self.destination_reception_weight,
            next_destination: PartySource::of(&self.next_destination),
            broker: PartySource::of(&self.broker),
            companies,
            ..SourceFields::default()
        }
    }

    fn participants(&self) -> Vec<Participant> {
        let mut list = ParticipantList::default();
        list.company(Role::Emitter, &self.emitter)
            .company(Role::EcoOrganisme, &self.eco_organisme);
        if !self.worker_is_disabled {
            list.company(Role::Worker, &self.worker);
        }
        list.transporters(&self.transporters)
            .company(Role::Destination, &self.destination)
            .company(Role::Broker, &self.broker)
            .intermediaries(&self.intermediaries)
            .finish()
    }

    fn transition(&self) -> Transition {
        match self.status {
            BsdaStatus::Initial => {
                if self.bsda_type == BsdaType::Collection2710 {
                    Transition::set(Slot::Destination, Bucket::ForAction)
                } else if self.emitter_is_private_individual && self.has_active_worker() {
                    Transition::set(Slot::Worker, Bucket::ForAction)
                } else {
                    Transition::set(Slot::Emitter, Bucket::ForAction)
                }
            }
            BsdaStatus::SignedByProducer => {
                if self.has_active_worker() {
                    Transition::set(Slot::Worker, Bucket::ForAction)
                } else {
                    Transition::set(Slot::FirstTransporter, Bucket::ToCollect)
                }
            }
            BsdaStatus::SignedByWorker => {
                Transition::set(Slot::FirstTransporter, Bucket::ToCollect)
            }
            BsdaStatus::Sent => Transition::Moves(vec![Move::Relay {
                destination: Slot::Destination,
            }]),
            BsdaStatus::Processed | BsdaStatus::Refused | BsdaStatus::Canceled => {
                Transition::Archive
            }
            BsdaStatus::AwaitingChild => Transition::follow(),
            BsdaStatus::Unknown => Transition::Unbucketed,
        }
    }

    fn transport_legs(&self) -> Vec<TransportLeg> {
        transport_legs(&self.transporters)
    }

    fn return_signal(&self) -> Option<ReturnSignal> {
        Some(ReturnSignal {
            received_at: self.destination_reception_date?,
            fully_accepted: self.status != BsdaStatus::Refused
                && self.destination_reception_acceptation_status
                    == Some(AcceptationStatus::Accepted),
            last_transporter: last_transporter(&self.transporters)
                .and_then(|entry| entry.company.siret_id()),
        })
    }
}
