use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Missed,
    #[serde(alias = "Not Available")]
    #[strum(to_string = "NotAvailable", serialize = "Not Available")]
    NotAvailable,
}

impl AttendanceStatus {
    pub fn is_present(self) -> bool {
        self == AttendanceStatus::Present
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": "0b8f7c1e-4a52-4f5e-9d3a-2c7f1b0e9a11",
        "session_id": "5d1c2a90-7e3b-4c1f-8a6d-9b2e0f4c3d21",
        "employee_id": "EMP-001",
        "status": "Absent",
        "marked_at": "2026-01-05T09:30:00Z"
    })
)]
pub struct AttendanceRecord {
    pub id: String,
    pub session_id: String,
    pub employee_id: String,
    pub status: AttendanceStatus,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub marked_at: Option<DateTime<Utc>>,
}

/// One row of an employee's history: how they were marked and when the
/// session was scheduled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub status: AttendanceStatus,
    pub scheduled_at: DateTime<Utc>,
}
