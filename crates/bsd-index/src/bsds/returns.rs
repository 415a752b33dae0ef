use chrono::{DateTime, Duration, Utc};

use super::org::OrgId;
use super::record::Bordereau;

/// How long a partially refused shipment stays in the return tab.
pub const RETURN_WINDOW_HOURS: i64 = 48;

/// Reception facts a type exposes so the return tab can be computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnSignal {
    pub received_at: DateTime<Utc>,
    pub fully_accepted: bool,
    /// Transporter driving the waste back.
    pub last_transporter: Option<OrgId>,
}

pub(crate) fn return_org_ids<B: Bordereau + ?Sized>(record: &B, now: DateTime<Utc>) -> Vec<OrgId> {
    let Some(signal) = record.return_signal() else {
        return Vec::new();
    };
    if signal.fully_accepted {
        return Vec::new();
    }

    let window_start = now - Duration::hours(RETURN_WINDOW_HOURS);
    if signal.received_at <= window_start {
        return Vec::new();
    }

    signal.last_transporter.into_iter().collect()
}
