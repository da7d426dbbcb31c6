use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::attendance::AttendanceStatus;

/// Standups and learning hours share one lifecycle; only their tables and
/// the status used for "not there" differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SessionKind {
    Standup,
    LearningHour,
}

impl SessionKind {
    pub fn session_table(self) -> &'static str {
        match self {
            SessionKind::Standup => "standups",
            SessionKind::LearningHour => "learning_hours",
        }
    }

    pub fn attendance_table(self) -> &'static str {
        match self {
            SessionKind::Standup => "attendance",
            SessionKind::LearningHour => "learning_hours_attendance",
        }
    }

    /// Column in the attendance table that points at the session row.
    pub fn session_column(self) -> &'static str {
        match self {
            SessionKind::Standup => "standup_id",
            SessionKind::LearningHour => "learning_hour_id",
        }
    }

    /// Status seeded on start and used when an edit leaves an employee unset.
    pub fn absence_status(self) -> AttendanceStatus {
        match self {
            SessionKind::Standup => AttendanceStatus::Absent,
            SessionKind::LearningHour => AttendanceStatus::Missed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
pub enum SessionState {
    NoSessionToday,
    Scheduled,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "5d1c2a90-7e3b-4c1f-8a6d-9b2e0f4c3d21",
        "kind": "standup",
        "scheduled_at": "2026-01-05T09:30:00Z",
        "created_at": "2026-01-04T17:02:11Z",
        "created_by": "admin",
        "started_at": null,
        "finalized_at": null
    })
)]
pub struct Session {
    pub id: String,
    pub kind: SessionKind,
    #[schema(value_type = String, format = "date-time")]
    pub scheduled_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub started_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn state(&self) -> SessionState {
        if self.finalized_at.is_some() {
            SessionState::Completed
        } else if self.started_at.is_some() {
            SessionState::InProgress
        } else {
            SessionState::Scheduled
        }
    }

    pub fn local_date(&self, tz: FixedOffset) -> NaiveDate {
        self.scheduled_at.with_timezone(&tz).date_naive()
    }
}

/// Half-open UTC range `[start, end)` covering `date` in `tz`.
pub fn day_bounds(date: NaiveDate, tz: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc_midnight = local_midnight - Duration::seconds(i64::from(tz.local_minus_utc()));
    let start = Utc.from_utc_datetime(&utc_midnight);
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(ts: &str) -> Session {
        let scheduled_at = ts.parse::<DateTime<Utc>>().unwrap();
        Session {
            id: "s1".into(),
            kind: SessionKind::Standup,
            scheduled_at,
            created_at: scheduled_at,
            created_by: None,
            started_at: None,
            finalized_at: None,
        }
    }

    #[test]
    fn state_follows_lifecycle_markers() {
        let mut session = session_at("2026-01-05T09:30:00Z");
        assert_eq!(session.state(), SessionState::Scheduled);

        session.started_at = Some(session.scheduled_at);
        assert_eq!(session.state(), SessionState::InProgress);

        session.finalized_at = Some(session.scheduled_at);
        assert_eq!(session.state(), SessionState::Completed);
    }

    #[test]
    fn local_date_uses_configured_offset() {
        let session = session_at("2026-01-05T22:30:00Z");
        let utc = FixedOffset::east_opt(0).unwrap();
        let dhaka = FixedOffset::east_opt(6 * 3600).unwrap();

        assert_eq!(session.local_date(utc), NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(session.local_date(dhaka), NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
    }

    #[test]
    fn day_bounds_cover_one_local_day() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 6).unwrap();
        let dhaka = FixedOffset::east_opt(6 * 3600).unwrap();
        let (start, end) = day_bounds(date, dhaka);

        assert_eq!(start, "2026-01-05T18:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(end, "2026-01-06T18:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn kind_parses_from_path_segment() {
        assert_eq!("learning-hour".parse::<SessionKind>().unwrap(), SessionKind::LearningHour);
        assert_eq!(SessionKind::Standup.to_string(), "standup");
        assert_eq!(SessionKind::LearningHour.absence_status(), AttendanceStatus::Missed);
    }
}
