use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::{
    model::{actor::Actor, attendance::AttendanceStatus, session::SessionKind},
    store::AttendanceStore,
};

/// Streak shown to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "days", rename_all = "snake_case")]
pub enum Streak {
    Days(u32),
    /// Caller has no attendance identity (admins).
    NotApplicable,
    /// History could not be read.
    Unknown,
}

/// Consecutive daily `Present` marks ending at the most recent entry.
///
/// Input order does not matter. Walking back from the newest entry, the run
/// stops at the first entry that is not `Present` or is not exactly one
/// calendar day before the one after it (so a repeated date also stops it).
pub fn compute_streak(history: &[(AttendanceStatus, NaiveDate)]) -> u32 {
    let mut sorted = history.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut streak = 0;
    let mut newer: Option<NaiveDate> = None;

    for (status, date) in sorted {
        if !status.is_present() {
            break;
        }
        if let Some(newer) = newer {
            if newer.signed_duration_since(date).num_days() != 1 {
                break;
            }
        }
        streak += 1;
        newer = Some(date);
    }

    streak
}

/// Standup streak for whoever is asking.
pub async fn streak_for<S: AttendanceStore>(store: &S, actor: &Actor, tz: FixedOffset) -> Streak {
    let Some(employee_id) = actor.employee_id() else {
        return Streak::NotApplicable;
    };

    match store.attendance_history(SessionKind::Standup, employee_id).await {
        Ok(history) => {
            let days: Vec<_> = history
                .iter()
                .map(|h| (h.status, h.scheduled_at.with_timezone(&tz).date_naive()))
                .collect();
            Streak::Days(compute_streak(&days))
        }
        Err(e) => {
            warn!(error = %e, employee_id, "Failed to read attendance history for streak");
            Streak::Unknown
        }
    }
}
