//! Table-driven tab classification.
//!
//! Each document type describes its present roles and, for its current status, a
//! [`Transition`]. The engine below turns both into a [`BucketAssignment`]: every present
//! role starts in [`Bucket::Follow`], the transition's moves are applied, and roles are
//! flushed into buckets with the most actionable bucket winning per organization.

use std::collections::BTreeMap;

use tracing::debug;

use super::org::OrgId;
use super::participants::{Participant, Role};
use super::record::Bordereau;
use super::tabs::{AssignmentBuilder, Bucket, BucketAssignment};

/// Group of roles a transition targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The emitter, together with the eco-organisme and detenteurs acting on its behalf.
    Emitter,
    Worker,
    Destination,
    FirstTransporter,
    TempStorageTransporter,
    TempStorageDestination,
}

impl Slot {
    fn covers(self, role: Role, first_transporter: Option<u8>) -> bool {
        match self {
            Slot::Emitter => matches!(
                role,
                Role::Emitter | Role::EcoOrganisme | Role::Detenteur(_)
            ),
            Slot::Worker => role == Role::Worker,
            Slot::Destination => role == Role::Destination,
            Slot::FirstTransporter => match (role, first_transporter) {
                (Role::Transporter(number), Some(first)) => number == first,
                _ => false,
            },
            Slot::TempStorageTransporter => role == Role::TempStorageTransporter,
            Slot::TempStorageDestination => role == Role::TempStorageDestination,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    Set(Slot, Bucket),
    /// Hand-over between successive transporters of a shipment on the road.
    ///
    /// The destination acts unless the next transporter to take over is the destination
    /// itself. The last transporter that took over has collected the waste; the one right
    /// after it has to collect.
    Relay { destination: Slot },
}

/// Outcome of a type's status table for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Draft,
    Archive,
    /// Status without a modeled entry: no organization sees the document.
    Unbucketed,
    Moves(Vec<Move>),
}

impl Transition {
    /// Everyone keeps following.
    pub fn follow() -> Self {
        Self::Moves(Vec::new())
    }

    pub fn set(slot: Slot, bucket: Bucket) -> Self {
        Self::Moves(vec![Move::Set(slot, bucket)])
    }
}

/// Transport leg as seen by the relay rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportLeg {
    pub number: u8,
    pub org_id: Option<OrgId>,
    pub taken_over: bool,
}

/// Classifies a document into dashboard tabs.
pub fn classify<B: Bordereau + ?Sized>(record: &B) -> BucketAssignment {
    let participants = record.participants();
    let transition = if record.is_draft() {
        Transition::Draft
    } else {
        record.transition()
    };

    debug!(
        id = record.id(),
        bsd_type = record.bsd_type().as_str(),
        ?transition,
        participants = participants.len(),
        "classifying document"
    );

    resolve(&participants, &record.transport_legs(), &transition)
}

pub(crate) fn resolve(
    participants: &[Participant],
    legs: &[TransportLeg],
    transition: &Transition,
) -> BucketAssignment {
    let mut builder = AssignmentBuilder::default();

    let moves = match transition {
        Transition::Unbucketed => return builder.build(),
        Transition::Draft => {
            place_all(&mut builder, participants, Bucket::Draft);
            return builder.build();
        }
        Transition::Archive => {
            place_all(&mut builder, participants, Bucket::Archived);
            return builder.build();
        }
        Transition::Moves(moves) => moves,
    };

    let mut legs: Vec<&TransportLeg> = legs.iter().collect();
    legs.sort_by_key(|leg| leg.number);
    let first_transporter = legs.first().map(|leg| leg.number);

    let mut roles: BTreeMap<Role, Bucket> = participants
        .iter()
        .map(|participant| (participant.role, Bucket::Follow))
        .collect();

    for step in moves {
        match step {
            Move::Set(slot, bucket) => {
                for (role, current) in roles.iter_mut() {
                    if slot.covers(*role, first_transporter) {
                        *current = *bucket;
                    }
                }
            }
            Move::Relay { destination } => {
                relay(&mut roles, participants, &legs, *destination, first_transporter)
            }
        }
    }

    for participant in participants {
        let bucket = roles
            .get(&participant.role)
            .copied()
            .unwrap_or(Bucket::Follow);
        builder.place(participant.org_id.clone(), bucket);
    }
    builder.build()
}

fn relay(
    roles: &mut BTreeMap<Role, Bucket>,
    participants: &[Participant],
    legs: &[&TransportLeg],
    destination: Slot,
    first_transporter: Option<u8>,
) {
    let destination_id = participants
        .iter()
        .find(|participant| destination.covers(participant.role, first_transporter))
        .map(|participant| &participant.org_id);
    let next_transporter = legs.iter().find(|leg| !leg.taken_over);
    let destination_is_next = match (next_transporter, destination_id) {
        (Some(next), Some(destination_id)) => next.org_id.as_ref() == Some(destination_id),
        _ => false,
    };

    if !destination_is_next {
        for (role, current) in roles.iter_mut() {
            if destination.covers(*role, first_transporter) {
                *current = Bucket::ForAction;
            }
        }
    }

    for (position, leg) in legs.iter().enumerate() {
        let Some(current) = roles.get_mut(&Role::Transporter(leg.number)) else {
            continue;
        };
        if leg.taken_over {
            let relayed = legs[position + 1..].iter().any(|later| later.taken_over);
            if !relayed {
                *current = Bucket::Collected;
            }
        } else if position > 0 && legs[position - 1].taken_over {
            *current = Bucket::ToCollect;
        }
    }
}

fn place_all(builder: &mut AssignmentBuilder, participants: &[Participant], bucket: Bucket) {
    for participant in participants {
        builder.place(participant.org_id.clone(), bucket);
    }
}
