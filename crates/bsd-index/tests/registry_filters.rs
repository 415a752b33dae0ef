//! Registry filters evaluated against an indexed set of documents.
//!
//! Four BSDASRI documents created on 2021-01-01 through 2021-01-04 are indexed in
//! memory; each scenario translates a `where` clause and checks the ids returned,
//! in `createdAt` order.

mod common {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use bsd_index::bsds::{Bsdasri, BsdasriStatus, CompanyInfo};
    use bsd_index::{InMemoryIndex, SearchIndex, UnionIndexWriter, WasteDocument};

    pub(super) const ALIAS: &str = "bsds";

    fn company(siret: &str) -> CompanyInfo {
        CompanyInfo {
            name: Some(format!("Company {siret}")),
            siret: Some(siret.to_string()),
            ..CompanyInfo::default()
        }
    }

    pub(super) fn dasri(day: u32) -> WasteDocument {
        WasteDocument::Bsdasri(Bsdasri {
            id: format!("DASRI-2021010{day}-ABC"),
            status: BsdasriStatus::Received,
            created_at: Some(Utc.with_ymd_and_hms(2021, 1, day, 0, 0, 0).unwrap()),
            emitter: company(&format!("1111111111111{day}")),
            transporter: company("22222222222222"),
            destination: company("33333333333333"),
            waste_code: Some(if day % 2 == 0 { "18 01 03*" } else { "18 02 02*" }.to_string()),
            ..Bsdasri::default()
        })
    }

    pub(super) fn seeded_index() -> Arc<InMemoryIndex> {
        let index = Arc::new(InMemoryIndex::new());
        // Reverse order so the sort is exercised.
        let documents: Vec<_> = (1..=4)
            .rev()
            .map(|day| UnionIndexWriter::<InMemoryIndex>::build(&dasri(day), Utc::now()))
            .collect();
        index.submit(ALIAS, &documents).expect("in-memory submit");
        index
    }
}

use bsd_index::registry::to_query_body;
use bsd_index::{translate, FilterError, FilterExpression, SearchIndex};
use common::*;
use serde_json::json;

fn search(filter: serde_json::Value) -> Vec<String> {
    let expression: FilterExpression = serde_json::from_value(filter).expect("valid where");
    let predicates = translate(&expression).expect("translatable filter");
    seeded_index()
        .search(ALIAS, &predicates)
        .expect("alias exists")
        .into_iter()
        .map(|document| document.id)
        .collect()
}

fn ids(days: &[u32]) -> Vec<String> {
    days.iter()
        .map(|day| format!("DASRI-2021010{day}-ABC"))
        .collect()
}

#[test]
fn strict_bounds_exclude_the_edges() {
    let found = search(json!({
        "createdAt": { "_gt": "2021-01-01T00:00:00Z", "_lt": "2021-01-04T00:00:00Z" }
    }));
    assert_eq!(found, ids(&[2, 3]));
}

#[test]
fn inclusive_bounds_keep_the_edges() {
    let found = search(json!({
        "createdAt": { "_gte": "2021-01-02T00:00:00Z", "_lte": "2021-01-04T00:00:00Z" }
    }));
    assert_eq!(found, ids(&[2, 3, 4]));
}

#[test]
fn equality_matches_one_instant() {
    let found = search(json!({ "createdAt": { "_eq": "2021-01-02T00:00:00Z" } }));
    assert_eq!(found, ids(&[2]));
}

#[test]
fn contradictory_bounds_fail_before_searching() {
    let expression: FilterExpression = serde_json::from_value(json!({
        "createdAt": { "_gt": "2021-01-01T00:00:00Z", "_gte": "2021-01-02T00:00:00Z" }
    }))
    .expect("valid where");

    match translate(&expression) {
        Err(FilterError::ConflictingBounds {
            field,
            first,
            second,
        }) => {
            assert_eq!(field, "createdAt");
            assert_eq!((first, second), ("_gt", "_gte"));
        }
        other => panic!("expected conflicting bounds, got {other:?}"),
    }
}

#[test]
fn substring_filter_is_unanchored() {
    assert_eq!(search(json!({ "wasteCode": { "_contains": "01 0" } })), ids(&[2, 4]));
    assert_eq!(search(json!({ "emitterCompanySiret": { "_contains": "13" } })), ids(&[3]));
    assert!(search(json!({ "wasteCode": { "_contains": "x" } })).is_empty());
}

#[test]
fn id_filter_matches_either_identifier() {
    let found = search(json!({
        "id": { "_in": ["DASRI-20210103-ABC", "DASRI-20210101-ABC", "UNKNOWN"] }
    }));
    assert_eq!(found, ids(&[1, 3]));
}

#[test]
fn fields_are_combined_with_and() {
    let found = search(json!({
        "bsdType": { "_eq": "BSDASRI" },
        "createdAt": { "_gte": "2021-01-02T00:00:00Z" },
        "destinationCompanySiret": { "_eq": "33333333333333" },
        "wasteCode": { "_in": ["18 02 02*"] }
    }));
    assert_eq!(found, ids(&[3]));
}

#[test]
fn empty_filter_returns_everything_in_creation_order() {
    assert_eq!(search(json!({})), ids(&[1, 2, 3, 4]));
}

#[test]
fn query_body_uses_epoch_millis_for_dates() {
    let expression: FilterExpression = serde_json::from_value(json!({
        "createdAt": { "_gte": "2021-01-02T00:00:00Z" }
    }))
    .expect("valid where");
    let body = to_query_body(&translate(&expression).expect("translatable"));

    assert_eq!(
        body["query"]["bool"]["filter"][0],
        json!({ "range": { "createdAt": { "gte": 1_609_545_600_000_i64 } } })
    );
}

#[test]
fn id_filter_finds_documents_by_readable_id() {
    use bsd_index::bsds::{Bsdd, BsddStatus};
    use bsd_index::{InMemoryIndex, UnionIndexWriter, WasteDocument};
    use chrono::Utc;

    let index = seeded_index();
    let bsdd = WasteDocument::Bsdd(Bsdd {
        id: "ckv0a1b2c3".into(),
        readable_id: "BSD-20210105-XYZ12345".into(),
        status: BsddStatus::Sealed,
        ..Bsdd::default()
    });
    index
        .submit(ALIAS, &[UnionIndexWriter::<InMemoryIndex>::build(&bsdd, Utc::now())])
        .expect("in-memory submit");

    for wanted in ["BSD-20210105-XYZ12345", "ckv0a1b2c3"] {
        let expression: FilterExpression =
            serde_json::from_value(json!({ "id": { "_eq": wanted } })).expect("valid where");
        let found = index
            .search(ALIAS, &translate(&expression).expect("translatable"))
            .expect("alias exists");
        assert_eq!(found.len(), 1, "{wanted}");
        assert_eq!(found[0].id, "ckv0a1b2c3");
    }
}
