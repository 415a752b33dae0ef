use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::org::OrgId;

/// Dashboard tab an organization sees a document in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Draft,
    ForAction,
    Follow,
    Archived,
    ToCollect,
    Collected,
}

impl Bucket {
    /// Attribute name in the search index document.
    pub const fn index_field(self) -> &'static str {
        match self {
            Self::Draft => "isDraftFor",
            Self::ForAction => "isForActionFor",
            Self::Follow => "isFollowFor",
            Self::Archived => "isArchivedFor",
            Self::ToCollect => "isToCollectFor",
            Self::Collected => "isCollectedFor",
        }
    }

    pub const fn ordered() -> [Self; 6] {
        [
            Self::Draft,
            Self::ForAction,
            Self::Follow,
            Self::Archived,
            Self::ToCollect,
            Self::Collected,
        ]
    }

    /// Lower wins when one organization holds roles landing in different buckets.
    const fn precedence(self) -> u8 {
        match self {
            Self::Draft => 0,
            Self::ForAction => 1,
            Self::ToCollect => 2,
            Self::Collected => 3,
            Self::Follow => 4,
            Self::Archived => 5,
        }
    }
}

/// Result of classifying one document: the organizations listed in each tab.
///
/// Values are only produced by [`AssignmentBuilder`], which keeps every organization in a
/// single bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAssignment {
    #[serde(rename = "isDraftFor")]
    draft: BTreeSet<OrgId>,
    #[serde(rename = "isForActionFor")]
    for_action: BTreeSet<OrgId>,
    #[serde(rename = "isFollowFor")]
    follow: BTreeSet<OrgId>,
    #[serde(rename = "isArchivedFor")]
    archived: BTreeSet<OrgId>,
    #[serde(rename = "isToCollectFor")]
    to_collect: BTreeSet<OrgId>,
    #[serde(rename = "isCollectedFor")]
    collected: BTreeSet<OrgId>,
}

impl BucketAssignment {
    pub fn bucket(&self, bucket: Bucket) -> &BTreeSet<OrgId> {
        match bucket {
            Bucket::Draft => &self.draft,
            Bucket::ForAction => &self.for_action,
            Bucket::Follow => &self.follow,
            Bucket::Archived => &self.archived,
            Bucket::ToCollect => &self.to_collect,
            Bucket::Collected => &self.collected,
        }
    }

    pub fn bucket_of(&self, org: &OrgId) -> Option<Bucket> {
        Bucket::ordered()
            .into_iter()
            .find(|bucket| self.bucket(*bucket).contains(org))
    }

    /// Every organization that sees the document, whatever the tab.
    pub fn sirets(&self) -> BTreeSet<OrgId> {
        self.iter()
            .flat_map(|(_, orgs)| orgs.iter().cloned())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &BTreeSet<OrgId>)> + '_ {
        Bucket::ordered()
            .into_iter()
            .map(move |bucket| (bucket, self.bucket(bucket)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, orgs)| orgs.is_empty())
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut BTreeSet<OrgId> {
        match bucket {
            Bucket::Draft => &mut self.draft,
            Bucket::ForAction => &mut self.for_action,
            Bucket::Follow => &mut self.follow,
            Bucket::Archived => &mut self.archived,
            Bucket::ToCollect => &mut self.to_collect,
            Bucket::Collected => &mut self.collected,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct AssignmentBuilder {
    placements: BTreeMap<OrgId, Bucket>,
}

impl AssignmentBuilder {
    pub(crate) fn place(&mut self, org: OrgId, bucket: Bucket) {
        self.placements
            .entry(org)
            .and_modify(|current| {
                if bucket.precedence() < current.precedence() {
                    *current = bucket;
                }
            })
            .or_insert(bucket);
    }

    pub(crate) fn build(self) -> BucketAssignment {
        let mut assignment = BucketAssignment::default();
        for (org, bucket) in self.placements {
            assignment.bucket_mut(bucket).insert(org);
        }
        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(value: &str) -> OrgId {
        OrgId::parse(value).expect("valid org id")
    }

    #[test]
    fn most_actionable_bucket_wins() {
        let mut builder = AssignmentBuilder::default();
        builder.place(org("A"), Bucket::Follow);
        builder.place(org("A"), Bucket::ToCollect);
        builder.place(org("A"), Bucket::Archived);
        builder.place(org("B"), Bucket::Collected);
        builder.place(org("B"), Bucket::ForAction);

        let assignment = builder.build();
        assert_eq!(assignment.bucket_of(&org("A")), Some(Bucket::ToCollect));
        assert_eq!(assignment.bucket_of(&org("B")), Some(Bucket::ForAction));
        assert!(assignment.bucket(Bucket::Follow).is_empty());
    }

    #[test]
    fn serializes_all_six_lists() {
        let mut builder = AssignmentBuilder::default();
        builder.place(org("X"), Bucket::Draft);
        let json = serde_json::to_value(builder.build()).expect("serializes");
        for bucket in Bucket::ordered() {
            assert!(json.get(bucket.index_field()).is_some(), "{bucket:?} missing");
        }
        assert_eq!(json["isDraftFor"], serde_json::json!(["X"]));
    }
}
