//! One day's standup or learning hour as a state machine.
//!
//! ```text
//! NoSessionToday --schedule--> Scheduled --start--> InProgress --stop--> Completed
//!                                                    |    ^
//!                                                    +----+ toggle
//! ```
//!
//! Every operation re-reads the store before deciding, and only writes the
//! lifecycle marker once all attendance writes have succeeded.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use super::error::LifecycleError;
use crate::{
    model::{
        actor::Actor,
        attendance::{AttendanceRecord, AttendanceStatus},
        employee::Employee,
        session::{Session, SessionKind, SessionState},
    },
    store::AttendanceStore,
};

pub fn can_start(session: &Session, now: DateTime<Utc>) -> bool {
    now >= session.scheduled_at
}

/// Count-based completeness as the dashboards reported it. The explicit
/// `finalized_at` marker is authoritative; this is kept for display.
pub fn is_complete(records: &[AttendanceRecord], employees: &[Employee]) -> bool {
    !employees.is_empty() && records.len() == employees.len()
}

pub fn state_of(session: Option<&Session>) -> SessionState {
    session.map_or(SessionState::NoSessionToday, Session::state)
}

fn require_admin(actor: &Actor) -> Result<(), LifecycleError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(LifecycleError::Forbidden)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DaySnapshot {
    pub kind: SessionKind,
    pub state: SessionState,
    pub session: Option<Session>,
    pub employees: Vec<Employee>,
    pub attendance: Vec<AttendanceRecord>,
    pub can_start: bool,
    pub is_complete: bool,
    pub present_count: usize,
}

pub struct Lifecycle<'a, S> {
    store: &'a S,
    kind: SessionKind,
    tz: FixedOffset,
}

impl<'a, S: AttendanceStore> Lifecycle<'a, S> {
    pub fn new(store: &'a S, kind: SessionKind, tz: FixedOffset) -> Self {
        Self { store, kind, tz }
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    async fn today_session(&self, now: DateTime<Utc>) -> Result<Option<Session>, LifecycleError> {
        let session = self
            .store
            .find_session_for_date(self.kind, self.local_date(now), self.tz)
            .await?;
        Ok(session)
    }

    async fn require_today(&self, now: DateTime<Utc>) -> Result<Session, LifecycleError> {
        self.today_session(now)
            .await?
            .ok_or(LifecycleError::NoSessionToday(self.kind))
    }

    async fn build_snapshot(&self, session: Option<Session>, now: DateTime<Utc>) -> Result<DaySnapshot, LifecycleError> {
        let employees = self.store.list_employees().await?;
        let attendance = match &session {
            Some(s) => self.store.list_attendance(self.kind, &s.id).await?,
            None => Vec::new(),
        };

        Ok(DaySnapshot {
            kind: self.kind,
            state: state_of(session.as_ref()),
            can_start: session.as_ref().is_some_and(|s| can_start(s, now)),
            is_complete: is_complete(&attendance, &employees),
            present_count: attendance.iter().filter(|r| r.status.is_present()).count(),
            session,
            employees,
            attendance,
        })
    }

    /// Read-only view of today's session.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<DaySnapshot, LifecycleError> {
        let session = self.today_session(now).await?;
        self.build_snapshot(session, now).await
    }

    /// `NoSessionToday -> Scheduled` for the day `scheduled_at` falls on.
    #[instrument(name = "lifecycle_schedule", skip(self, actor), fields(kind = %self.kind))]
    pub async fn schedule(
        &self,
        actor: &Actor,
        scheduled_at: DateTime<Utc>,
        created_by: Option<String>,
    ) -> Result<Session, LifecycleError> {
        require_admin(actor)?;

        let date = self.local_date(scheduled_at);
        if self
            .store
            .find_session_for_date(self.kind, date, self.tz)
            .await?
            .is_some()
        {
            return Err(LifecycleError::AlreadyScheduled(self.kind, date));
        }

        let session = self
            .store
            .create_session(self.kind, scheduled_at, created_by, self.tz)
            .await?;

        info!(session_id = %session.id, %date, "Session scheduled");
        Ok(session)
    }

    /// `Scheduled -> InProgress`. Seeds the absence status for every employee
    /// without a record; existing records are left alone.
    #[instrument(name = "lifecycle_start", skip(self, actor), fields(kind = %self.kind))]
    pub async fn start(&self, actor: &Actor, now: DateTime<Utc>) -> Result<DaySnapshot, LifecycleError> {
        require_admin(actor)?;

        let session = self.require_today(now).await?;
        let state = session.state();
        if state != SessionState::Scheduled {
            return Err(LifecycleError::InvalidTransition { state, action: "start" });
        }
        if !can_start(&session, now) {
            return Err(LifecycleError::NotYetStartable {
                scheduled_at: session.scheduled_at,
            });
        }

        let employees = self.store.list_employees().await?;
        if employees.is_empty() {
            return Err(LifecycleError::NoEmployees);
        }

        let existing: HashSet<String> = self
            .store
            .list_attendance(self.kind, &session.id)
            .await?
            .into_iter()
            .map(|r| r.employee_id)
            .collect();

        let absence = self.kind.absence_status();
        let mut seeded = 0usize;
        for employee in employees.iter().filter(|e| !existing.contains(&e.employee_id)) {
            self.store
                .insert_attendance(self.kind, &session.id, &employee.employee_id, absence)
                .await?;
            seeded += 1;
        }
        debug!(session_id = %session.id, seeded, "Attendance seeded");

        let session = self.store.mark_started(self.kind, &session.id, now).await?;
        info!(session_id = %session.id, "Session started");

        self.build_snapshot(Some(session), now).await
    }

    /// Flip one employee between `Present` and the absence status while the
    /// session is in progress.
    #[instrument(name = "lifecycle_toggle", skip(self, actor), fields(kind = %self.kind))]
    pub async fn toggle(
        &self,
        actor: &Actor,
        employee_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, LifecycleError> {
        require_admin(actor)?;

        let session = self.require_today(now).await?;
        let state = session.state();
        if state != SessionState::InProgress {
            return Err(LifecycleError::InvalidTransition { state, action: "toggle" });
        }

        if self.store.get_employee(employee_id).await?.is_none() {
            return Err(LifecycleError::EmployeeNotFound(employee_id.to_string()));
        }

        let current = self
            .store
            .list_attendance(self.kind, &session.id)
            .await?
            .into_iter()
            .find(|r| r.employee_id == employee_id);

        let record = match current {
            Some(record) => {
                let next = if record.status.is_present() {
                    self.kind.absence_status()
                } else {
                    AttendanceStatus::Present
                };
                self.store
                    .update_attendance_status(self.kind, &session.id, employee_id, next)
                    .await?
            }
            // employee added after the seed ran
            None => {
                self.store
                    .upsert_attendance(self.kind, &session.id, employee_id, AttendanceStatus::Present)
                    .await?
            }
        };

        debug!(session_id = %session.id, employee_id, status = %record.status, "Attendance toggled");
        Ok(record)
    }

    /// `InProgress -> Completed`. Ordinary toggles are refused afterwards.
    #[instrument(name = "lifecycle_stop", skip(self, actor), fields(kind = %self.kind))]
    pub async fn stop(&self, actor: &Actor, now: DateTime<Utc>) -> Result<DaySnapshot, LifecycleError> {
        require_admin(actor)?;

        let session = self.require_today(now).await?;
        let state = session.state();
        if state != SessionState::InProgress {
            return Err(LifecycleError::InvalidTransition { state, action: "stop" });
        }

        let session = self.store.mark_finalized(self.kind, &session.id, now).await?;
        info!(session_id = %session.id, "Session finalized");

        self.build_snapshot(Some(session), now).await
    }

    /// Administrative overwrite of a whole session's attendance, allowed in
    /// any state. Employees missing from `edits` get the absence status.
    #[instrument(name = "lifecycle_admin_edit", skip(self, actor, edits), fields(kind = %self.kind))]
    pub async fn admin_edit(
        &self,
        actor: &Actor,
        session_id: &str,
        edits: &HashMap<String, AttendanceStatus>,
    ) -> Result<Vec<AttendanceRecord>, LifecycleError> {
        require_admin(actor)?;

        let session = self
            .store
            .get_session(self.kind, session_id)
            .await?
            .ok_or(LifecycleError::SessionNotFound)?;

        let employees = self.store.list_employees().await?;
        if let Some(unknown) = edits
            .keys()
            .find(|id| !employees.iter().any(|e| &e.employee_id == *id))
        {
            return Err(LifecycleError::EmployeeNotFound(unknown.clone()));
        }

        let absence = self.kind.absence_status();
        let mut records = Vec::with_capacity(employees.len());
        for employee in &employees {
            let status = edits.get(&employee.employee_id).copied().unwrap_or(absence);
            let record = self
                .store
                .upsert_attendance(self.kind, &session.id, &employee.employee_id, status)
                .await?;
            records.push(record);
        }

        info!(session_id = %session.id, updated = records.len(), "Attendance edited by admin");
        Ok(records)
    }
}
