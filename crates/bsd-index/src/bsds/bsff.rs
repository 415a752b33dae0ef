//! BSFF: fluorinated gases, shipped in packagings collected from detenteurs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::{Move, Slot, Transition, TransportLeg};
use super::normalizer::{PartySource, SourceFields};
use super::participants::{
    first_transporter, last_transporter, ordinal, transport_legs, AcceptationStatus,
    CompanyInfo, Participant, ParticipantList, Role, TransporterEntry,
};
use super::record::{Bordereau, BsdType};
use super::returns::ReturnSignal;
use super::tabs::Bucket;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BsffStatus {
    #[default]
    Initial,
    SignedByEmitter,
    Sent,
    Received,
    Accepted,
    Refused,
    PartiallyRefused,
    IntermediatelyProcessed,
    Processed,
    #[serde(other)]
    Unknown,
}

impl BsffStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::SignedByEmitter => "SIGNED_BY_EMITTER",
            Self::Sent => "SENT",
            Self::Received => "RECEIVED",
            Self::Accepted => "ACCEPTED",
            Self::Refused => "REFUSED",
            Self::PartiallyRefused => "PARTIALLY_REFUSED",
            Self::IntermediatelyProcessed => "INTERMEDIATELY_PROCESSED",
            Self::Processed => "PROCESSED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Intervention on refrigeration equipment, naming the equipment holder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FicheIntervention {
    pub numero: String,
    pub detenteur: CompanyInfo,
}

/// Container tracked individually from acceptation to treatment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BsffPackaging {
    pub numero: String,
    pub acceptation_status: Option<AcceptationStatus>,
    pub acceptation_date: Option<DateTime<Utc>>,
    pub acceptation_weight: Option<f64>,
    pub operation_code: Option<String>,
    pub operation_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bsff {
    pub id: String,
    pub status: BsffStatus,
    pub is_draft: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    pub emitter: CompanyInfo,
    pub emitter_custom_info: Option<String>,
    pub emitter_emission_signature_date: Option<DateTime<Utc>>,
    pub transporters: Vec<TransporterEntry>,
    pub destination: CompanyInfo,
    pub destination_cap: Option<String>,
    pub destination_custom_info: Option<String>,
    pub destination_reception_date: Option<DateTime<Utc>>,
    pub fiches_intervention: Vec<FicheIntervention>,
    pub packagings: Vec<BsffPackaging>,

    pub waste_code: Option<String>,
    pub waste_adr: Option<String>,
    pub waste_description: Option<String>,
}

impl Bsff {
    fn acceptation_date(&self) -> Option<DateTime<Utc>> {
        self.packagings
            .iter()
            .filter_map(|packaging| packaging.acceptation_date)
            .min()
    }

    fn acceptation_weight(&self) -> Option<f64> {
        self.packagings
            .iter()
            .filter_map(|packaging| packaging.acceptation_weight)
            .fold(None, |total, weight| Some(total.unwrap_or(0.0) + weight))
    }

    fn operation_date(&self) -> Option<DateTime<Utc>> {
        self.packagings
            .iter()
            .filter_map(|packaging| packaging.operation_date)
            .max()
    }
}

impl Bordereau for Bsff {
    fn bsd_type(&self) -> BsdType {
        BsdType::Bsff
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

        let mut companies = vec![&self.emitter];
        companies.extend(self.transporters.iter().map(|entry| &entry.company));
        companies.push(&self.destination);
        companies.extend(self.fiches_intervention.iter().map(|fiche| &fiche.detenteur));

        SourceFields {
            created_at: self.created_at,
            updated_at: self.updated_at,
            emitter_emission_date: self.emitter_emission_signature_date,
            transporter_taken_over_at: transporter.and_then(|entry| entry.taken_over_at),
            destination_reception_date: self.destination_reception_date,
            destination_acceptation_date: self.acceptation_date(),
            destination_operation_date: self.operation_date(),
            destination_acceptation_weight: self.acceptation_weight(),
            waste_code: self.waste_code.as_deref(),
            waste_adr: self.waste_adr.as_deref(),
            waste_description: self.waste_description.as_deref(),
            packaging_numbers: self
                .packagings
                .iter()
                .map(|packaging| packaging.numero.as_str())
                .collect(),
            fiche_intervention_numbers: self
                .fiches_intervention
                .iter()
                .map(|fiche| fiche.numero.as_str())
                .collect(),
            emitter: PartySource::of(&self.emitter)
                .custom_info(self.emitter_custom_info.as_deref()),
            transporter: PartySource::transporter(transporter),
            transporter_transport_plates: transporter
                .map(|entry| entry.transport_plates.iter().map(String::as_str).collect())
                .unwrap_or_default(),
            destination: PartySource::of(&self.destination)
                .custom_info(self.destination_custom_info.as_deref()),
            destination_cap: self.destination_cap.as_deref(),
            companies,
            ..SourceFields::default()
        }
    }

    fn participants(&self) -> Vec<Participant> {
        let mut list = ParticipantList::default();
        list.company(Role::Emitter, &self.emitter)
            .company(Role::Destination, &self.destination);
        for (index, fiche) in self.fiches_intervention.iter().enumerate() {
            list.push(Role::Detenteur(ordinal(index)), fiche.detenteur.siret_id());
        }
        list.transporters(&self.transporters).finish()
    }

    fn transition(&self) -> Transition {
        match self.status {
            BsffStatus::Initial => Transition::set(Slot::Emitter, Bucket::ForAction),
            BsffStatus::SignedByEmitter => {
                Transition::set(Slot::FirstTransporter, Bucket::ToCollect)
            }
            BsffStatus::Sent => Transition::Moves(vec![Move::Relay {
                destination: Slot::Destination,
            }]),
            BsffStatus::Received | BsffStatus::Accepted | BsffStatus::PartiallyRefused => {
                Transition::set(Slot::Destination, Bucket::ForAction)
            }
            BsffStatus::Refused | BsffStatus::Processed => Transition::Archive,
            BsffStatus::IntermediatelyProcessed => Transition::follow(),
            BsffStatus::Unknown => Transition::Unbucketed,
        }
    }

    fn transport_legs(&self) -> Vec<TransportLeg> {
        transport_legs(&self.transporters)
    }

    fn return_signal(&self) -> Option<ReturnSignal> {
        let any_packaging_not_accepted = self
            .packagings
            .iter()
            .any(|packaging| packaging.acceptation_status != Some(AcceptationStatus::Accepted));

        Some(ReturnSignal {
            received_at: self.destination_reception_date?,
            fully_accepted: self.status != BsffStatus::Refused && !any_packaging_not_accepted,
            last_transporter: last_transporter(&self.transporters)
                .and_then(|entry| entry.company.siret_id()),
        })
    }
}
