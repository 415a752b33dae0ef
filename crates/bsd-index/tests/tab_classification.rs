//! Dashboard tab classification across document types, exercised through the public API.

mod common {
    use chrono::{DateTime, Utc};

    use bsd_index::bsds::{CompanyInfo, TransporterEntry};

    pub(super) const EMITTER: &str = "11111111111111";
    pub(super) const TRANSPORTER: &str = "22222222222222";
    pub(super) const DESTINATION: &str = "33333333333333";
    pub(super) const WORKER: &str = "44444444444444";
    pub(super) const SECOND_TRANSPORTER: &str = "55555555555555";

    pub(super) fn company(siret: &str) -> CompanyInfo {
        CompanyInfo {
            name: Some(format!("Company {siret}")),
            siret: Some(siret.to_string()),
            ..CompanyInfo::default()
        }
    }

    pub(super) fn transporter(
        number: u8,
        siret: &str,
        taken_over_at: Option<DateTime<Utc>>,
    ) -> TransporterEntry {
        TransporterEntry {
            number,
            company: company(siret),
            taken_over_at,
            ..TransporterEntry::default()
        }
    }
}

use std::collections::BTreeSet;

use chrono::{Duration, Utc};

use bsd_index::bsds::{
    AcceptationStatus, Bsda, BsdaStatus, Bsdasri, BsdasriStatus, BsdasriType, Bsdd, BsddStatus,
    Bsff, BsffStatus, Bsvhu, BsvhuStatus,
};
use bsd_index::{Bucket, BucketAssignment, OrgId, WasteDocument};
use common::*;

fn org(siret: &str) -> OrgId {
    OrgId::parse(siret).expect("non-empty identifier")
}

fn sample_documents() -> Vec<WasteDocument> {
    let now = Utc::now();
    vec![
        WasteDocument::Bsdd(Bsdd {
            id: "BSDD-1".into(),
            readable_id: "BSD-20210101-AAAAAAAA".into(),
            status: BsddStatus::Sent,
            emitter: company(EMITTER),
            transporters: vec![
                transporter(1, TRANSPORTER, Some(now)),
                transporter(2, SECOND_TRANSPORTER, None),
            ],
            recipient: company(DESTINATION),
            ..Bsdd::default()
        }),
        WasteDocument::Bsda(Bsda {
            id: "BSDA-1".into(),
            status: BsdaStatus::SignedByProducer,
            emitter: company(EMITTER),
            worker: company(WORKER),
            transporters: vec![transporter(1, TRANSPORTER, None)],
            destination: company(DESTINATION),
            ..Bsda::default()
        }),
        WasteDocument::Bsdasri(Bsdasri {
            id: "DASRI-1".into(),
            status: BsdasriStatus::Sent,
            emitter: company(EMITTER),
            transporter: company(TRANSPORTER),
            destination: company(DESTINATION),
            ..Bsdasri::default()
        }),
        WasteDocument::Bsff(Bsff {
            id: "FF-1".into(),
            status: BsffStatus::Received,
            emitter: company(EMITTER),
            transporters: vec![transporter(1, TRANSPORTER, Some(now))],
            destination: company(DESTINATION),
            ..Bsff::default()
        }),
        WasteDocument::Bsvhu(Bsvhu {
            id: "VHU-1".into(),
            status: BsvhuStatus::Initial,
            emitter: company(EMITTER),
            transporters: vec![transporter(1, TRANSPORTER, None)],
            destination: company(DESTINATION),
            ..Bsvhu::default()
        }),
    ]
}

fn union_of_buckets(tabs: &BucketAssignment) -> BTreeSet<OrgId> {
    tabs.iter()
        .flat_map(|(_, members)| members.iter().cloned())
        .collect()
}

#[test]
fn classification_is_deterministic() {
    for document in sample_documents() {
        assert_eq!(document.classify(), document.classify(), "{}", document.id());
    }
}

#[test]
fn buckets_are_mutually_exclusive_and_flatten_to_sirets() {
    for document in sample_documents() {
        let tabs = document.classify();
        let total: usize = tabs.iter().map(|(_, members)| members.len()).sum();
        let union = union_of_buckets(&tabs);

        assert_eq!(total, union.len(), "{} places an org twice", document.id());
        assert_eq!(tabs.sirets(), union, "{}", document.id());
    }
}

#[test]
fn drafts_override_every_status() {
    let drafts = vec![
        WasteDocument::Bsda(Bsda {
            id: "BSDA-D".into(),
            status: BsdaStatus::Sent,
            is_draft: true,
            emitter: company(EMITTER),
            destination: company(DESTINATION),
            ..Bsda::default()
        }),
        WasteDocument::Bsdasri(Bsdasri {
            id: "DASRI-D".into(),
            status: BsdasriStatus::Received,
            is_draft: true,
            emitter: company(EMITTER),
            destination: company(DESTINATION),
            ..Bsdasri::default()
        }),
        WasteDocument::Bsvhu(Bsvhu {
            id: "VHU-D".into(),
            status: BsvhuStatus::Processed,
            is_draft: true,
            emitter: company(EMITTER),
            destination: company(DESTINATION),
            ..Bsvhu::default()
        }),
        WasteDocument::Bsff(Bsff {
            id: "FF-D".into(),
            status: BsffStatus::Accepted,
            is_draft: true,
            emitter: company(EMITTER),
            destination: company(DESTINATION),
            ..Bsff::default()
        }),
        WasteDocument::Bsdd(Bsdd {
            id: "BSDD-D".into(),
            status: BsddStatus::Draft,
            emitter: company(EMITTER),
            recipient: company(DESTINATION),
            ..Bsdd::default()
        }),
    ];

    for document in drafts {
        let tabs = document.classify();
        let expected: BTreeSet<OrgId> = [org(EMITTER), org(DESTINATION)].into_iter().collect();
        assert_eq!(tabs.bucket(Bucket::Draft), &expected, "{}", document.id());
        assert_eq!(tabs.sirets(), expected, "{}", document.id());
    }
}

#[test]
fn sent_dasri_waits_on_destination_and_is_collected() {
    let tabs = sample_documents()
        .into_iter()
        .find(|document| document.id() == "DASRI-1")
        .expect("fixture present")
        .classify();

    assert_eq!(tabs.bucket_of(&org(DESTINATION)), Some(Bucket::ForAction));
    assert_eq!(tabs.bucket_of(&org(TRANSPORTER)), Some(Bucket::Collected));
    assert_eq!(tabs.bucket_of(&org(EMITTER)), Some(Bucket::Follow));
}

#[test]
fn initial_dasri_waits_on_emitter_and_transporter() {
    let document = WasteDocument::Bsdasri(Bsdasri {
        id: "DASRI-2".into(),
        status: BsdasriStatus::Initial,
        bsdasri_type: BsdasriType::Simple,
        emitter: company(EMITTER),
        transporter: company(TRANSPORTER),
        destination: company(DESTINATION),
        ..Bsdasri::default()
    });
    let tabs = document.classify();

    assert_eq!(tabs.bucket_of(&org(EMITTER)), Some(Bucket::ForAction));
    assert_eq!(tabs.bucket_of(&org(TRANSPORTER)), Some(Bucket::ToCollect));
    assert_eq!(tabs.bucket_of(&org(DESTINATION)), Some(Bucket::Follow));
}

#[test]
fn initial_vhu_leaves_the_transporter_following() {
    let tabs = sample_documents()
        .into_iter()
        .find(|document| document.id() == "VHU-1")
        .expect("fixture present")
        .classify();

    assert_eq!(tabs.bucket_of(&org(EMITTER)), Some(Bucket::ForAction));
    assert_eq!(tabs.bucket_of(&org(TRANSPORTER)), Some(Bucket::Follow));
}

#[test]
fn multi_transport_hands_over_between_legs() {
    let tabs = sample_documents()
        .into_iter()
        .find(|document| document.id() == "BSDD-1")
        .expect("fixture present")
        .classify();

    assert_eq!(tabs.bucket_of(&org(TRANSPORTER)), Some(Bucket::Collected));
    assert_eq!(tabs.bucket_of(&org(SECOND_TRANSPORTER)), Some(Bucket::ToCollect));
    assert_eq!(tabs.bucket_of(&org(DESTINATION)), Some(Bucket::ForAction));
}

#[test]
fn an_org_holding_several_roles_keeps_the_most_urgent_bucket() {
    let document = WasteDocument::Bsdasri(Bsdasri {
        id: "DASRI-3".into(),
        status: BsdasriStatus::Sent,
        emitter: company(DESTINATION),
        transporter: company(TRANSPORTER),
        destination: company(DESTINATION),
        ..Bsdasri::default()
    });
    let tabs = document.classify();

    assert_eq!(tabs.bucket_of(&org(DESTINATION)), Some(Bucket::ForAction));
    assert!(tabs.bucket(Bucket::Follow).is_empty());
}

#[test]
fn unknown_statuses_leave_every_tab_empty() {
    let document: WasteDocument = serde_json::from_value(serde_json::json!({
        "type": "BSDA",
        "id": "BSDA-NEW",
        "status": "SOMETHING_NEW",
        "emitter": { "siret": EMITTER }
    }))
    .expect("unknown statuses still deserialize");

    assert!(document.classify().is_empty());
}

#[test]
fn refused_bsdd_shows_in_the_last_transporter_returns_for_two_days() {
    let now = Utc::now();
    let mut bsdd = Bsdd {
        id: "BSDD-R".into(),
        status: BsddStatus::Refused,
        emitter: company(EMITTER),
        transporters: vec![
            transporter(1, TRANSPORTER, Some(now - Duration::hours(30))),
            transporter(2, SECOND_TRANSPORTER, Some(now - Duration::hours(20))),
        ],
        recipient: company(DESTINATION),
        received_at: Some(now - Duration::hours(10)),
        waste_acceptation_status: Some(AcceptationStatus::Refused),
        ..Bsdd::default()
    };

    let recent = WasteDocument::Bsdd(bsdd.clone());
    assert_eq!(recent.return_org_ids(now), vec![org(SECOND_TRANSPORTER)]);

    bsdd.received_at = Some(now - Duration::hours(49));
    let stale = WasteDocument::Bsdd(bsdd);
    assert!(stale.return_org_ids(now).is_empty());
}

#[test]
fn accepted_documents_have_no_return() {
    let now = Utc::now();
    let document = WasteDocument::Bsdd(Bsdd {
        id: "BSDD-A".into(),
        status: BsddStatus::Accepted,
        transporters: vec![transporter(1, TRANSPORTER, Some(now - Duration::hours(5)))],
        recipient: company(DESTINATION),
        received_at: Some(now - Duration::hours(1)),
        waste_acceptation_status: Some(AcceptationStatus::Accepted),
        ..Bsdd::default()
    });

    assert!(document.return_org_ids(now).is_empty());
}
