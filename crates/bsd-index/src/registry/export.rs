use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::index::IndexDocument;

#[derive(Debug, Serialize)]
struct RegistryRow<'a> {
    #[serde(rename = "Type")]
    bsd_type: &'static str,
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "Readable Id")]
    readable_id: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
    #[serde(rename = "Created At")]
    created_at: String,
    #[serde(rename = "Waste Code")]
    waste_code: &'a str,
    #[serde(rename = "Emitter Siret")]
    emitter_siret: &'a str,
    #[serde(rename = "Transporter Siret")]
    transporter_siret: &'a str,
    #[serde(rename = "Destination Siret")]
    destination_siret: &'a str,
    #[serde(rename = "Operation Code")]
    operation_code: &'a str,
    #[serde(rename = "Reception Weight")]
    reception_weight: Option<f64>,
}

impl<'a> RegistryRow<'a> {
    fn from_document(document: &'a IndexDocument) -> Self {
        Self {
            bsd_type: document.bsd_type.as_str(),
            id: &document.id,
            readable_id: &document.readable_id,
            status: &document.status,
            created_at: format_date(document.created_at),
            waste_code: &document.waste_code,
            emitter_siret: &document.emitter_company_siret,
            transporter_siret: &document.transporter_company_siret,
            destination_siret: &document.destination_company_siret,
            operation_code: &document.destination_operation_code,
            reception_weight: document.destination_reception_weight,
        }
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Writes one registry row per document and returns the number of rows.
pub fn export_csv<W: Write>(documents: &[IndexDocument], writer: W) -> Result<usize, csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for document in documents {
        csv_writer.serialize(RegistryRow::from_document(document))?;
    }
    csv_writer.flush()?;
    Ok(documents.len())
}
