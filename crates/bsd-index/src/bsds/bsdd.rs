//! BSDD: generic hazardous waste forms, with optional temporary storage.

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
pub enum BsddStatus {
    #[default]
    Draft,
    Sealed,
    SignedByProducer,
    Sent,
    Received,
    Accepted,
    Processed,
    AwaitingGroup,
    Grouped,
    FollowedWithPnttd,
    NoTraceability,
    Refused,
    TempStored,
    TempStorerAccepted,
    Resealed,
    SignedByTempStorer,
    Resent,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl BsddStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sealed => "SEALED",
            Self::SignedByProducer => "SIGNED_BY_PRODUCER",
            Self::Sent => "SENT",
            Self::Received => "RECEIVED",
            Self::Accepted => "ACCEPTED",
            Self::Processed => "PROCESSED",
            Self::AwaitingGroup => "AWAITING_GROUP",
            Self::Grouped => "GROUPED",
            Self::FollowedWithPnttd => "FOLLOWED_WITH_PNTTD",
            Self::NoTraceability => "NO_TRACEABILITY",
            Self::Refused => "REFUSED",
            Self::TempStored => "TEMP_STORED",
            Self::TempStorerAccepted => "TEMP_STORER_ACCEPTED",
            Self::Resealed => "RESEALED",
            Self::SignedByTempStorer => "SIGNED_BY_TEMP_STORER",
            Self::Resent => "RESENT",
            Self::Canceled => "CANCELED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmitterType {
    Producer,
    Other,
    Appendix1,
    Appendix1Producer,
    Appendix2,
}

/// Second leg of a form whose first recipient is a temporary storage facility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TempStorage {
    pub emitted_at: Option<DateTime<Utc>>,
    pub transporter: Option<TransporterEntry>,
    pub recipient: CompanyInfo,
    pub recipient_cap: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bsdd {
    pub id: String,
    pub readable_id: String,
    pub custom_id: Option<String>,
    pub status: BsddStatus,
    pub emitter_type: Option<EmitterType>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    pub emitter: CompanyInfo,
    pub emitter_work_site_name: Option<String>,
    pub emitter_work_site_address: Option<String>,
    pub emitted_at: Option<DateTime<Utc>>,
    pub eco_organisme: CompanyInfo,
    pub transporters: Vec<TransporterEntry>,
    pub recipient: CompanyInfo,
    pub recipient_cap: Option<String>,
    pub recipient_is_temp_storage: bool,
    pub forwarded_in: Option<TempStorage>,
    pub trader: CompanyInfo,
    pub broker: CompanyInfo,
    pub intermediaries: Vec<CompanyInfo>,
    pub next_destination: CompanyInfo,

    pub waste_details_code: Option<String>,
    pub waste_details_name: Option<String>,
    pub waste_details_onu_code: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub signed_at: Option<DateTime<Utc>>,
    pub quantity_received: Option<f64>,
    pub quantity_accepted: Option<f64>,
    pub waste_acceptation_status: Option<AcceptationStatus>,
    pub processing_operation_done: Option<String>,
    pub destination_operation_mode: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub empty_return_adr: Option<String>,
    pub has_citerne_been_washed_out: Option<bool>,
}

impl Bsdd {
    /// Temporary storage leg, once the storage facility has sent the waste on.
    fn emitted_forward(&self) -> Option<&TempStorage> {
        self.forwarded_in
            .as_ref()
            .filter(|storage| storage.emitted_at.is_some())
    }

    fn final_destination(&self) -> Slot {
        if self.recipient_is_temp_storage {
            Slot::TempStorageDestination
        } else {
            Slot::Destination
        }
    }
}

impl Bordereau for Bsdd {
    fn bsd_type(&self) -> BsdType {
        BsdType::Bsdd
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn is_draft(&self) -> bool {
        self.status == BsddStatus::Draft
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn source_fields(&self) -> SourceFields<'_> {
        let transporter = first_transporter(&self.transporters);
        let (destination, destination_cap) = match self.emitted_forward() {
            Some(storage) => (&storage.recipient, storage.recipient_cap.as_deref()),
            None => (&self.recipient, self.recipient_cap.as_deref()),
        };

        let mut companies = vec![&self.emitter, &self.eco_organisme];
        companies.extend(self.transporters.iter().map(|entry| &entry.company));
        companies.push(&self.recipient);
        if let Some(storage) = &self.forwarded_in {
            companies.extend(storage.transporter.as_ref().map(|entry| &entry.company));
            companies.push(&storage.recipient);
        }
        companies.extend([&self.trader, &self.broker]);
        companies.extend(self.intermediaries.iter());

        SourceFields {
            readable_id: Some(self.readable_id.as_str()).filter(|value| !value.is_empty()),
            custom_id: self.custom_id.as_deref(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            emitter_emission_date: self.emitted_at,
            transporter_taken_over_at: transporter.and_then(|entry| entry.taken_over_at),
            destination_reception_date: self.received_at,
            destination_acceptation_date: self.signed_at,
            destination_operation_date: self.processed_at,
            waste_code: self.waste_details_code.as_deref(),
            waste_adr: self.waste_details_onu_code.as_deref(),
            waste_description: self.waste_details_name.as_deref(),
            emitter: PartySource::of(&self.emitter),
            emitter_pickup_site_name: self.emitter_work_site_name.as_deref(),
            emitter_pickup_site_address: self.emitter_work_site_address.as_deref().map(Into::into),
            eco_organisme: PartySource::of(&self.eco_organisme),
            transporter: PartySource::transporter(transporter),
            transporter_transport_plates: transporter
                .map(|entry| entry.transport_plates.iter().map(String::as_str).collect())
                .unwrap_or_default(),
            destination: PartySource::of(destination),
            destination_cap,
            destination_operation_code: self.processing_operation_done.as_deref(),
            destination_operation_mode: self.destination_operation_mode.as_deref(),
            destination_reception_weight: self.quantity_received,
            destination_acceptation_weight: self.quantity_accepted,
            next_destination: PartySource::of(&self.next_destination),
            broker: PartySource::of(&self.broker),
            trader: PartySource::of(&self.trader),
            companies,
            ..SourceFields::default()
        }
    }

    fn participants(&self) -> Vec<Participant> {
        let mut list = ParticipantList::default();
        list.company(Role::Emitter, &self.emitter)
            .company(Role::EcoOrganisme, &self.eco_organisme);

        // Appendix 1 producer forms only show up for the emitter side and the collector.
        if self.emitter_type == Some(EmitterType::Appendix1Producer) {
            if let Some(transporter) = first_transporter(&self.transporters) {
                list.company(Role::Transporter(transporter.number), &transporter.company);
            }
            return list.finish();
        }

        list.transporters(&self.transporters)
            .company(Role::Destination, &self.recipient);
        if let Some(storage) = &self.forwarded_in {
            if let Some(transporter) = &storage.transporter {
                list.company(Role::TempStorageTransporter, &transporter.company);
            }
            list.company(Role::TempStorageDestination, &storage.recipient);
        }
        list.company(Role::Trader, &self.trader)
            .company(Role::Broker, &self.broker)
            .intermediaries(&self.intermediaries)
            .finish()
    }

    fn transition(&self) -> Transition {
        match self.status {
            BsddStatus::Draft => Transition::Draft,
            BsddStatus::Sealed => {
                let mut moves = vec![Move::Set(Slot::Emitter, Bucket::ForAction)];
                if self.emitter_type != Some(EmitterType::Appendix1) {
                    moves.push(Move::Set(Slot::FirstTransporter, Bucket::ToCollect));
                }
                Transition::Moves(moves)
            }
            BsddStatus::SignedByProducer => {
                Transition::set(Slot::FirstTransporter, Bucket::ToCollect)
            }
            BsddStatus::Sent => Transition::Moves(vec![Move::Relay {
                destination: Slot::Destination,
            }]),
            BsddStatus::TempStored | BsddStatus::TempStorerAccepted => {
                Transition::set(Slot::Destination, Bucket::ForAction)
            }
            BsddStatus::Resealed => Transition::Moves(vec![
                Move::Set(Slot::Destination, Bucket::ForAction),
                Move::Set(Slot::TempStorageTransporter, Bucket::ToCollect),
            ]),
            BsddStatus::SignedByTempStorer => {
                Transition::set(Slot::TempStorageTransporter, Bucket::ToCollect)
            }
            BsddStatus::Resent => Transition::Moves(vec![
                Move::Set(Slot::TempStorageTransporter, Bucket::Collected),
                Move::Set(self.final_destination(), Bucket::ForAction),
            ]),
            BsddStatus::Received | BsddStatus::Accepted => {
                Transition::set(self.final_destination(), Bucket::ForAction)
            }
            BsddStatus::Refused
            | BsddStatus::Processed
            | BsddStatus::FollowedWithPnttd
            | BsddStatus::Canceled
            | BsddStatus::NoTraceability => Transition::Archive,
            BsddStatus::AwaitingGroup | BsddStatus::Grouped => Transition::follow(),
            BsddStatus::Unknown => Transition::Unbucketed,
        }
    }

    fn transport_legs(&self) -> Vec<TransportLeg> {
        transport_legs(&self.transporters)
    }

    fn return_signal(&self) -> Option<ReturnSignal> {
        let received_at = self.received_at?;
        let tank_business =
            self.empty_return_adr.is_some() || self.has_citerne_been_washed_out.is_some();
        let not_fully_accepted = self.status == BsddStatus::Refused
            || self.waste_acceptation_status != Some(AcceptationStatus::Accepted);

        Some(ReturnSignal {
            received_at,
            fully_accepted: !(tank_business || not_fully_accepted),
            last_transporter: last_transporter(&self.transporters)
                .and_then(|entry| entry.company.siret_id()),
        })
    }
}
