use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::BsdType;

/// Company block of one role in the unified record. Absent values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub name: String,
    pub siret: String,
    pub vat_number: String,
    pub address: String,
    pub custom_info: String,
    pub contact: String,
    pub phone: String,
    pub mail: String,
}

/// Company mentioned anywhere on a document, feeding the free-text aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMention {
    pub name: String,
    pub siret: String,
    pub vat_number: String,
}

/// Type-agnostic projection of a document.
///
/// Every field exists for every type; fields a type does not carry hold `""`, `[]` or
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedWasteRecord {
    pub id: String,
    pub readable_id: String,
    pub custom_id: String,
    pub bsd_type: BsdType,
    pub status: String,
    pub is_draft: bool,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub emitter_emission_date: Option<DateTime<Utc>>,
    pub worker_work_date: Option<DateTime<Utc>>,
    pub transporter_taken_over_at: Option<DateTime<Utc>>,
    pub destination_reception_date: Option<DateTime<Utc>>,
    pub destination_acceptation_date: Option<DateTime<Utc>>,
    pub destination_operation_date: Option<DateTime<Utc>>,

    pub waste_code: String,
    pub waste_adr: String,
    pub waste_description: String,
    pub packaging_numbers: Vec<String>,
    pub waste_seal_numbers: Vec<String>,
    pub identification_numbers: Vec<String>,
    pub fiche_intervention_numbers: Vec<String>,

    pub emitter: Party,
    pub emitter_pickup_site_name: String,
    pub emitter_pickup_site_address: String,
    pub eco_organisme: Party,
    pub worker: Party,
    pub transporter: Party,
    pub transporter_transport_plates: Vec<String>,
    pub destination: Party,
    pub destination_cap: String,
    pub destination_operation_code: String,
    pub destination_operation_mode: String,
    pub destination_reception_weight: Option<f64>,
    pub destination_acceptation_weight: Option<f64>,
    pub next_destination: Party,
    pub broker: Party,
    pub trader: Party,

    pub companies: Vec<CompanyMention>,
    pub raw_bsd: serde_json::Value,
}
