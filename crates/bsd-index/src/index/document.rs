use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bsds::{BsdType, BucketAssignment, OrgId, UnifiedWasteRecord};

/// Document stored in the search index, one per bordereau, keyed by `id`.
///
/// Dates travel as epoch milliseconds. Text fields absent for a type are empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    #[serde(rename = "type")]
    pub bsd_type: BsdType,
    pub id: String,
    pub readable_id: String,
    pub custom_id: String,
    pub status: String,
    pub is_draft: bool,

    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub emitter_emission_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub worker_work_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub transporter_transport_taken_over_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub destination_reception_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub destination_acceptation_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub destination_operation_date: Option<DateTime<Utc>>,

    pub waste_code: String,
    pub waste_adr: String,
    pub waste_description: String,
    pub packaging_numbers: Vec<String>,
    pub waste_seal_numbers: Vec<String>,
    pub identification_numbers: Vec<String>,
    pub fiche_intervention_numbers: Vec<String>,

    pub emitter_company_name: String,
    pub emitter_company_siret: String,
    pub emitter_company_vat_number: String,
    pub emitter_company_address: String,
    pub emitter_pickup_site_name: String,
    pub emitter_pickup_site_address: String,
    pub emitter_custom_info: String,

    pub worker_company_name: String,
    pub worker_company_siret: String,
    pub worker_company_address: String,

    pub transporter_company_name: String,
    pub transporter_company_siret: String,
    pub transporter_company_vat_number: String,
    pub transporter_company_address: String,
    pub transporter_custom_info: String,
    pub transporter_transport_plates: Vec<String>,

    pub destination_company_name: String,
    pub destination_company_siret: String,
    pub destination_company_address: String,
    pub destination_custom_info: String,
    pub destination_cap: String,

    pub broker_company_name: String,
    pub broker_company_siret: String,
    pub broker_company_address: String,

    pub trader_company_name: String,
    pub trader_company_siret: String,
    pub trader_company_address: String,

    pub eco_organisme_name: String,
    pub eco_organisme_siret: String,

    pub next_destination_company_name: String,
    pub next_destination_company_siret: String,
    pub next_destination_company_vat_number: String,
    pub next_destination_company_address: String,

    pub destination_operation_code: String,
    pub destination_operation_mode: String,
    pub destination_reception_weight: Option<f64>,
    pub destination_acceptation_weight: Option<f64>,

    #[serde(flatten)]
    pub tabs: BucketAssignment,
    pub is_return_for: Vec<OrgId>,
    pub sirets: Vec<OrgId>,
    pub company_names: String,
    pub company_org_ids: Vec<String>,
    pub raw_bsd: serde_json::Value,
}

impl IndexDocument {
    /// Builds the index document. `sirets` is exactly the union of the six tabs.
    pub fn from_parts(
        record: UnifiedWasteRecord,
        tabs: BucketAssignment,
        is_return_for: Vec<OrgId>,
    ) -> Self {
        let company_names = record
            .companies
            .iter()
            .map(|company| company.name.as_str())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let company_org_ids = record
            .companies
            .iter()
            .flat_map(|company| [company.siret.as_str(), company.vat_number.as_str()])
            .filter(|org_id| !org_id.is_empty())
            .map(str::to_owned)
            .collect();
        let sirets = tabs.sirets().into_iter().collect();

        Self {
            bsd_type: record.bsd_type,
            id: record.id,
            readable_id: record.readable_id,
            custom_id: record.custom_id,
            status: record.status,
            is_draft: record.is_draft,

            created_at: record.created_at,
            updated_at: record.updated_at,
            emitter_emission_date: record.emitter_emission_date,
            worker_work_date: record.worker_work_date,
            transporter_transport_taken_over_at: record.transporter_taken_over_at,
            destination_reception_date: record.destination_reception_date,
            destination_acceptation_date: record.destination_acceptation_date,
            destination_operation_date: record.destination_operation_date,

            waste_code: record.waste_code,
            waste_adr: record.waste_adr,
            waste_description: record.waste_description,
            packaging_numbers: record.packaging_numbers,
            waste_seal_numbers: record.waste_seal_numbers,
            identification_numbers: record.identification_numbers,
            fiche_intervention_numbers: record.fiche_intervention_numbers,

            emitter_company_name: record.emitter.name,
            emitter_company_siret: record.emitter.siret,
            emitter_company_vat_number: record.emitter.vat_number,
            emitter_company_address: record.emitter.address,
            emitter_pickup_site_name: record.emitter_pickup_site_name,
            emitter_pickup_site_address: record.emitter_pickup_site_address,
            emitter_custom_info: record.emitter.custom_info,

            worker_company_name: record.worker.name,
            worker_company_siret: record.worker.siret,
            worker_company_address: record.worker.address,

            transporter_company_name: record.transporter.name,
            transporter_company_siret: record.transporter.siret,
            transporter_company_vat_number: record.transporter.vat_number,
            transporter_company_address: record.transporter.address,
            transporter_custom_info: record.transporter.custom_info,
            transporter_transport_plates: record.transporter_transport_plates,

            destination_company_name: record.destination.name,
            destination_company_siret: record.destination.siret,
            destination_company_address: record.destination.address,
            destination_custom_info: record.destination.custom_info,
            destination_cap: record.destination_cap,

            broker_company_name: record.broker.name,
            broker_company_siret: record.broker.siret,
            broker_company_address: record.broker.address,

            trader_company_name: record.trader.name,
            trader_company_siret: record.trader.siret,
            trader_company_address: record.trader.address,

            eco_organisme_name: record.eco_organisme.name,
            eco_organisme_siret: record.eco_organisme.siret,

            next_destination_company_name: record.next_destination.name,
            next_destination_company_siret: record.next_destination.siret,
            next_destination_company_vat_number: record.next_destination.vat_number,
            next_destination_company_address: record.next_destination.address,

            destination_operation_code: record.destination_operation_code,
            destination_operation_mode: record.destination_operation_mode,
            destination_reception_weight: record.destination_reception_weight,
            destination_acceptation_weight: record.destination_acceptation_weight,

            tabs,
            is_return_for,
            sirets,
            company_names,
            company_org_ids,
            raw_bsd: record.raw_bsd,
        }
    }

    /// Value of a filterable field, as the predicates see it.
    pub fn field(&self, field: IndexField) -> FieldValue<'_> {
        match field {
            IndexField::Id => FieldValue::Keyword(&self.id),
            IndexField::ReadableId => FieldValue::Keyword(&self.readable_id),
            IndexField::Type => FieldValue::Keyword(self.bsd_type.as_str()),
            IndexField::CreatedAt => FieldValue::Date(self.created_at),
            IndexField::TransporterTransportTakenOverAt => {
                FieldValue::Date(self.transporter_transport_taken_over_at)
            }
            IndexField::DestinationReceptionDate => {
                FieldValue::Date(self.destination_reception_date)
            }
            IndexField::DestinationOperationDate => {
                FieldValue::Date(self.destination_operation_date)
            }
            IndexField::EmitterCompanySiret => FieldValue::Keyword(&self.emitter_company_siret),
            IndexField::TransporterCompanySiret => {
                FieldValue::Keyword(&self.transporter_company_siret)
            }
            IndexField::DestinationCompanySiret => {
                FieldValue::Keyword(&self.destination_company_siret)
            }
            IndexField::WasteCode => FieldValue::Keyword(&self.waste_code),
            IndexField::DestinationOperationCode => {
                FieldValue::Keyword(&self.destination_operation_code)
            }
            IndexField::DestinationReceptionWeight => {
                FieldValue::Number(self.destination_reception_weight)
            }
        }
    }
}

/// Index attributes registry filters can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexField {
    Id,
    ReadableId,
    Type,
    CreatedAt,
    TransporterTransportTakenOverAt,
    DestinationReceptionDate,
    DestinationOperationDate,
    EmitterCompanySiret,
    TransporterCompanySiret,
    DestinationCompanySiret,
    WasteCode,
    DestinationOperationCode,
    DestinationReceptionWeight,
}

impl IndexField {
    /// Attribute name in the index mappings.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::ReadableId => "readableId",
            Self::Type => "type",
            Self::CreatedAt => "createdAt",
            Self::TransporterTransportTakenOverAt => "transporterTransportTakenOverAt",
            Self::DestinationReceptionDate => "destinationReceptionDate",
            Self::DestinationOperationDate => "destinationOperationDate",
            Self::EmitterCompanySiret => "emitterCompanySiret",
            Self::TransporterCompanySiret => "transporterCompanySiret",
            Self::DestinationCompanySiret => "destinationCompanySiret",
            Self::WasteCode => "wasteCode",
            Self::DestinationOperationCode => "destinationOperationCode",
            Self::DestinationReceptionWeight => "destinationReceptionWeight",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Keyword(&'a str),
    Date(Option<DateTime<Utc>>),
    Number(Option<f64>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsds::participants::{company_for_tests, transporter_for_tests};
    use crate::bsds::{Bsff, BsffStatus, FicheIntervention, WasteDocument};
    use chrono::TimeZone;

    fn bsff() -> WasteDocument {
        let mut transporter = transporter_for_tests(1, "22222222222222", false);
        transporter.company.vat_number = Some("BE0541696005".into());
        WasteDocument::Bsff(Bsff {
            id: "FF-1".into(),
            status: BsffStatus::Initial,
            created_at: Some(Utc.with_ymd_and_hms(2021, 1, 2, 0, 0, 0).unwrap()),
            emitter: company_for_tests("11111111111111"),
            transporters: vec![transporter],
            fiches_intervention: vec![FicheIntervention {
                numero: "FI".into(),
                detenteur: Default::default(),
            }],
            ..Bsff::default()
        })
    }

    #[test]
    fn aggregates_company_names_and_identifiers() {
        let record = bsff();
        let document = IndexDocument::from_parts(record.normalize(), record.classify(), vec![]);

        assert_eq!(
            document.company_names,
            "Company 11111111111111 Company 22222222222222"
        );
        assert_eq!(
            document.company_org_ids,
            vec!["11111111111111", "22222222222222", "BE0541696005"]
        );
        assert_eq!(document.sirets.len(), 2);
    }

    #[test]
    fn serializes_the_wire_contract() {
        let record = bsff();
        let document = IndexDocument::from_parts(record.normalize(), record.classify(), vec![]);
        let json = serde_json::to_value(&document).expect("serializes");

        assert_eq!(json["type"], "BSFF");
        assert_eq!(json["readableId"], "FF-1");
        assert_eq!(json["createdAt"], 1_609_545_600_000_i64);
        assert_eq!(json["workerCompanySiret"], "");
        assert!(json["destinationReceptionDate"].is_null());
        assert_eq!(json["isForActionFor"], serde_json::json!(["11111111111111"]));
        assert_eq!(json["isReturnFor"], serde_json::json!([]));
        assert_eq!(json["rawBsd"]["id"], "FF-1");

        let back: IndexDocument = serde_json::from_value(json).expect("round trips");
        assert_eq!(back, document);
    }
}
