//! In-process `AttendanceStore` used by the engine tests.

use std::sync::{
    Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use uuid::Uuid;

use super::{AttendanceStore, StoreError, StoreResult};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, HistoryEntry},
    employee::Employee,
    role::Role,
    session::{Session, SessionKind},
    user::User,
};

#[derive(Default)]
struct Tables {
    employees: Vec<Employee>,
    sessions: Vec<Session>,
    attendance: Vec<(SessionKind, AttendanceRecord)>,
    users: Vec<User>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn with_employees(ids: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut tables = store.lock();
            tables.employees = ids
                .iter()
                .map(|id| Employee {
                    employee_id: id.to_string(),
                    name: format!("Employee {id}"),
                    email: format!("{id}@example.com"),
                    role: None,
                    ratings_sheet_link: None,
                })
                .collect();
        }
        store
    }

    /// Every subsequent write fails with `TransientIo` until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn insert_session(&self, session: Session) {
        self.lock().sessions.push(session);
    }

    pub fn record_count(&self, session_id: &str) -> usize {
        self.lock()
            .attendance
            .iter()
            .filter(|(_, r)| r.session_id == session_id)
            .count()
    }

    pub fn user(&self, username: &str) -> Option<User> {
        self.lock().users.iter().find(|u| u.username == username).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::TransientIo("read failed".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::TransientIo("write failed".into()));
        }
        Ok(())
    }

    fn session_mut<'a>(tables: &'a mut Tables, kind: SessionKind, id: &str) -> StoreResult<&'a mut Session> {
        tables
            .sessions
            .iter_mut()
            .find(|s| s.kind == kind && s.id == id)
            .ok_or(StoreError::NotFound)
    }
}

impl AttendanceStore for MemoryStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        self.check_read()?;
        Ok(self.lock().employees.clone())
    }

    async fn get_employee(&self, employee_id: &str) -> StoreResult<Option<Employee>> {
        self.check_read()?;
        Ok(self.lock().employees.iter().find(|e| e.employee_id == employee_id).cloned())
    }

    async fn create_employee(&self, employee: Employee) -> StoreResult<Employee> {
        self.check_write()?;
        let mut tables = self.lock();
        if tables.employees.iter().any(|e| e.employee_id == employee.employee_id) {
            return Err(StoreError::WriteConflict("duplicate employee".into()));
        }
        tables.employees.push(employee.clone());
        Ok(employee)
    }

    async fn delete_employee(&self, employee_id: &str) -> StoreResult<bool> {
        self.check_write()?;
        let mut tables = self.lock();
        let before = tables.employees.len();
        tables.employees.retain(|e| e.employee_id != employee_id);
        Ok(tables.employees.len() < before)
    }

    async fn find_session_for_date(
        &self,
        kind: SessionKind,
        date: NaiveDate,
        tz: FixedOffset,
    ) -> StoreResult<Option<Session>> {
        self.check_read()?;
        Ok(self
            .lock()
            .sessions
            .iter()
            .filter(|s| s.kind == kind && s.local_date(tz) == date)
            .max_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then_with(|| a.id.cmp(&b.id)))
            .cloned())
    }

    async fn list_sessions(&self, kind: SessionKind) -> StoreResult<Vec<Session>> {
        self.check_read()?;
        let mut sessions: Vec<Session> = self.lock().sessions.iter().filter(|s| s.kind == kind).cloned().collect();
        sessions.sort_by_key(|s| s.scheduled_at);
        Ok(sessions)
    }

    async fn get_session(&self, kind: SessionKind, session_id: &str) -> StoreResult<Option<Session>> {
        self.check_read()?;
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| s.kind == kind && s.id == session_id)
            .cloned())
    }

    async fn create_session(
        &self,
        kind: SessionKind,
        scheduled_at: DateTime<Utc>,
        created_by: Option<String>,
        tz: FixedOffset,
    ) -> StoreResult<Session> {
        self.check_write()?;
        let session = Session {
            id: Uuid::new_v4().to_string(),
            kind,
            scheduled_at,
            created_at: Utc::now(),
            created_by,
            started_at: None,
            finalized_at: None,
        };

        let mut tables = self.lock();
        let date = session.local_date(tz);
        if tables.sessions.iter().any(|s| s.kind == kind && s.local_date(tz) == date) {
            return Err(StoreError::WriteConflict("session already exists for date".into()));
        }
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn mark_started(&self, kind: SessionKind, session_id: &str, at: DateTime<Utc>) -> StoreResult<Session> {
        self.check_write()?;
        let mut tables = self.lock();
        let session = Self::session_mut(&mut tables, kind, session_id)?;
        if session.started_at.is_some() {
            return Err(StoreError::WriteConflict("already started".into()));
        }
        session.started_at = Some(at);
        Ok(session.clone())
    }

    async fn mark_finalized(&self, kind: SessionKind, session_id: &str, at: DateTime<Utc>) -> StoreResult<Session> {
        self.check_write()?;
        let mut tables = self.lock();
        let session = Self::session_mut(&mut tables, kind, session_id)?;
        if session.started_at.is_none() || session.finalized_at.is_some() {
            return Err(StoreError::WriteConflict("not finalizable".into()));
        }
        session.finalized_at = Some(at);
        Ok(session.clone())
    }

    async fn list_attendance(&self, kind: SessionKind, session_id: &str) -> StoreResult<Vec<AttendanceRecord>> {
        self.check_read()?;
        Ok(self
            .lock()
            .attendance
            .iter()
            .filter(|(k, r)| *k == kind && r.session_id == session_id)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn insert_attendance(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceRecord> {
        self.check_write()?;
        let mut tables = self.lock();
        if tables
            .attendance
            .iter()
            .any(|(k, r)| *k == kind && r.session_id == session_id && r.employee_id == employee_id)
        {
            return Err(StoreError::WriteConflict("duplicate attendance".into()));
        }

        let record = AttendanceRecord {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            employee_id: employee_id.to_string(),
            status,
            marked_at: Some(Utc::now()),
        };
        tables.attendance.push((kind, record.clone()));
        Ok(record)
    }

    async fn update_attendance_status(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceRecord> {
        self.check_write()?;
        let mut tables = self.lock();
        let (_, record) = tables
            .attendance
            .iter_mut()
            .find(|(k, r)| *k == kind && r.session_id == session_id && r.employee_id == employee_id)
            .ok_or(StoreError::NotFound)?;
        record.status = status;
        record.marked_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn upsert_attendance(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceRecord> {
        match self.update_attendance_status(kind, session_id, employee_id, status).await {
            Err(StoreError::NotFound) => self.insert_attendance(kind, session_id, employee_id, status).await,
            other => other,
        }
    }

    async fn attendance_history(&self, kind: SessionKind, employee_id: &str) -> StoreResult<Vec<HistoryEntry>> {
        self.check_read()?;
        let tables = self.lock();
        let mut history: Vec<HistoryEntry> = tables
            .attendance
            .iter()
            .filter(|(k, r)| *k == kind && r.employee_id == employee_id)
            .filter_map(|(_, r)| {
                tables
                    .sessions
                    .iter()
                    .find(|s| s.id == r.session_id)
                    .map(|s| HistoryEntry {
                        status: r.status,
                        scheduled_at: s.scheduled_at,
                    })
            })
            .collect();
        history.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(history)
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        self.check_read()?;
        Ok(self.lock().users.iter().any(|u| u.role_id == Role::Admin.id()))
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        employee_id: Option<&str>,
    ) -> StoreResult<u64> {
        self.check_write()?;
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.username == username) {
            return Err(StoreError::WriteConflict("duplicate username".into()));
        }
        if let Some(id) = employee_id {
            if !tables.employees.iter().any(|e| e.employee_id == id) {
                return Err(StoreError::WriteConflict("unknown employee".into()));
            }
        }

        let id = tables.users.len() as u64 + 1;
        tables.users.push(User {
            id,
            username: username.to_string(),
            password: password_hash.to_string(),
            role_id: role.id(),
            employee_id: employee_id.map(str::to_string),
        });
        Ok(id)
    }
}
