//! Document types, their projection onto the unified record, and tab classification.

pub mod bsda;
pub mod bsdasri;
pub mod bsdd;
pub mod bsff;
pub mod bsvhu;
pub mod classifier;
pub mod normalizer;
pub mod org;
pub mod participants;
pub mod record;
pub mod returns;
pub mod tabs;
pub mod unified;

pub use bsda::{Bsda, BsdaStatus, BsdaType};
pub use bsdasri::{Bsdasri, BsdasriStatus, BsdasriType};
pub use bsdd::{Bsdd, BsddStatus, EmitterType, TempStorage};
pub use bsff::{Bsff, BsffPackaging, BsffStatus, FicheIntervention};
pub use bsvhu::{Bsvhu, BsvhuStatus};
pub use classifier::{classify, Move, Slot, Transition, TransportLeg};
pub use normalizer::{normalize, PartySource, SourceFields};
pub use org::OrgId;
pub use participants::{
    AcceptationStatus, CompanyInfo, Participant, ParticipantList, Role, TransporterEntry,
};
pub use record::{Bordereau, BsdType, UnknownBsdType, WasteDocument};
pub use returns::{ReturnSignal, RETURN_WINDOW_HOURS};
pub use tabs::{Bucket, BucketAssignment};
pub use unified::{CompanyMention, Party, UnifiedWasteRecord};
