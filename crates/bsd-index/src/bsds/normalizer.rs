use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::participants::{CompanyInfo, TransporterEntry};
use super::record::Bordereau;
use super::unified::{CompanyMention, Party, UnifiedWasteRecord};

/// Borrowed view of one role's company, as a type maps it.
#[derive(Debug, Clone, Default)]
pub struct PartySource<'a> {
    pub company: Option<&'a CompanyInfo>,
    pub address: Option<Cow<'a, str>>,
    pub custom_info: Option<&'a str>,
}

impl<'a> PartySource<'a> {
    pub fn of(company: &'a CompanyInfo) -> Self {
        Self {
            company: Some(company),
            address: None,
            custom_info: None,
        }
    }

    pub fn transporter(entry: Option<&'a TransporterEntry>) -> Self {
        match entry {
            Some(entry) => Self::of(&entry.company).custom_info(entry.custom_info.as_deref()),
            None => Self::default(),
        }
    }

    pub fn custom_info(mut self, custom_info: Option<&'a str>) -> Self {
        self.custom_info = custom_info;
        self
    }

    /// Replaces the company address, e.g. when a type stores it split in parts.
    pub fn address(mut self, address: Option<Cow<'a, str>>) -> Self {
        if address.is_some() {
            self.address = address;
        }
        self
    }
}

/// Per-type field mapping onto the unified record. Everything defaults to absent.
#[derive(Debug, Clone, Default)]
pub struct SourceFields<'a> {
    pub readable_id: Option<&'a str>,
    pub custom_id: Option<&'a str>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub emitter_emission_date: Option<DateTime<Utc>>,
    pub worker_work_date: Option<DateTime<Utc>>,
    pub transporter_taken_over_at: Option<DateTime<Utc>>,
    pub destination_reception_date: Option<DateTime<Utc>>,
    pub destination_acceptation_date: Option<DateTime<Utc>>,
    pub destination_operation_date: Option<DateTime<Utc>>,

    pub waste_code: Option<&'a str>,
    pub waste_adr: Option<&'a str>,
    pub waste_description: Option<&'a str>,
    pub packaging_numbers: Vec<&'a str>,
    pub waste_seal_numbers: Vec<&'a str>,
    pub identification_numbers: Vec<&'a str>,
    pub fiche_intervention_numbers: Vec<&'a str>,

    pub emitter: PartySource<'a>,
    pub emitter_pickup_site_name: Option<&'a str>,
    pub emitter_pickup_site_address: Option<Cow<'a, str>>,
    pub eco_organisme: PartySource<'a>,
    pub worker: PartySource<'a>,
    pub transporter: PartySource<'a>,
    pub transporter_transport_plates: Vec<&'a str>,
    pub destination: PartySource<'a>,
    pub destination_cap: Option<&'a str>,
    pub destination_operation_code: Option<&'a str>,
    pub destination_operation_mode: Option<&'a str>,
    pub destination_reception_weight: Option<f64>,
    pub destination_acceptation_weight: Option<f64>,
    pub next_destination: PartySource<'a>,
    pub broker: PartySource<'a>,
    pub trader: PartySource<'a>,

    /// Every company on the document, in role order, for the free-text aggregates.
    pub companies: Vec<&'a CompanyInfo>,
}

/// Projects a document onto the unified record.
pub fn normalize<B: Bordereau + Serialize>(record: &B) -> UnifiedWasteRecord {
    let fields = record.source_fields();

    UnifiedWasteRecord {
        id: record.id().to_string(),
        readable_id: text(fields.readable_id.or(Some(record.id()))),
        custom_id: text(fields.custom_id),
        bsd_type: record.bsd_type(),
        status: record.status_label().to_string(),
        is_draft: record.is_draft(),

        created_at: fields.created_at,
        updated_at: fields.updated_at,
        emitter_emission_date: fields.emitter_emission_date,
        worker_work_date: fields.worker_work_date,
        transporter_taken_over_at: fields.transporter_taken_over_at,
        destination_reception_date: fields.destination_reception_date,
        destination_acceptation_date: fields.destination_acceptation_date,
        destination_operation_date: fields.destination_operation_date,

        waste_code: text(fields.waste_code),
        waste_adr: text(fields.waste_adr),
        waste_description: text(fields.waste_description),
        packaging_numbers: texts(&fields.packaging_numbers),
        waste_seal_numbers: texts(&fields.waste_seal_numbers),
        identification_numbers: texts(&fields.identification_numbers),
        fiche_intervention_numbers: texts(&fields.fiche_intervention_numbers),

        emitter: party(&fields.emitter),
        emitter_pickup_site_name: text(fields.emitter_pickup_site_name),
        emitter_pickup_site_address: fields
            .emitter_pickup_site_address
            .map(Cow::into_owned)
            .unwrap_or_default(),
        eco_organisme: party(&fields.eco_organisme),
        worker: party(&fields.worker),
        transporter: party(&fields.transporter),
        transporter_transport_plates: fields
            .transporter_transport_plates
            .iter()
            .map(|plate| normalize_plate(plate))
            .filter(|plate| !plate.is_empty())
            .collect(),
        destination: party(&fields.destination),
        destination_cap: text(fields.destination_cap),
        destination_operation_code: text(fields.destination_operation_code),
        destination_operation_mode: text(fields.destination_operation_mode),
        destination_reception_weight: fields.destination_reception_weight,
        destination_acceptation_weight: fields.destination_acceptation_weight,
        next_destination: party(&fields.next_destination),
        broker: party(&fields.broker),
        trader: party(&fields.trader),

        companies: fields.companies.iter().map(|company| mention(company)).collect(),
        raw_bsd: raw_snapshot(record.id(), record),
    }
}

fn text(value: Option<&str>) -> String {
    value.map(str::to_owned).unwrap_or_default()
}

fn texts(values: &[&str]) -> Vec<String> {
    values
        .iter()
        .filter(|value| !value.is_empty())
        .map(|value| (*value).to_owned())
        .collect()
}

fn party(source: &PartySource<'_>) -> Party {
    let company = source.company.cloned().unwrap_or_default();
    let address = match &source.address {
        Some(address) => address.to_string(),
        None => company.address.unwrap_or_default(),
    };

    Party {
        name: company.name.unwrap_or_default(),
        siret: company.siret.unwrap_or_default(),
        vat_number: company.vat_number.unwrap_or_default(),
        address,
        custom_info: text(source.custom_info),
        contact: company.contact.unwrap_or_default(),
        phone: company.phone.unwrap_or_default(),
        mail: company.mail.unwrap_or_default(),
    }
}

fn mention(company: &CompanyInfo) -> CompanyMention {
    CompanyMention {
        name: company.name.clone().unwrap_or_default(),
        siret: company.siret.clone().unwrap_or_default(),
        vat_number: company.vat_number.clone().unwrap_or_default(),
    }
}

/// Plates are searched without spaces and dashes.
pub(crate) fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Joins the non-empty parts of an address with `", "`, `None` when all are empty.
pub(crate) fn join_address<'a>(
    parts: impl IntoIterator<Item = Option<&'a str>>,
) -> Option<Cow<'a, str>> {
    let parts: Vec<&str> = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(Cow::Owned(parts.join(", ")))
    }
}

/// Source document as JSON; `null` when it cannot be serialized.
fn raw_snapshot<T: Serialize + ?Sized>(id: &str, record: &T) -> Value {
    serde_json::to_value(record).unwrap_or_else(|error| {
        warn!(bsd_id = id, %error, "raw document not serializable, storing null");
        Value::Null
    })
}
