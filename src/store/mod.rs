//! Narrow interface between the attendance engine and the record store.
//!
//! # Tables
//!
//! - `employees` - team members that attendance is taken for
//! - `standups` / `learning_hours` - one scheduled session per local day
//! - `attendance` / `learning_hours_attendance` - one row per (session, employee)
//! - `users` - logins, optionally linked to an employee
//!
//! Schema lives in `migrations/`.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use std::future::Future;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use thiserror::Error;

use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, HistoryEntry},
    employee::Employee,
    role::Role,
    session::{Session, SessionKind},
};

pub use mysql::MySqlStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Requested row does not exist.
    #[error("not found")]
    NotFound,

    /// Store rejected an insert or update (e.g. unique key violation).
    #[error("write conflict: {0}")]
    WriteConflict(String),

    /// Store unreachable or the call failed mid-flight.
    #[error("store unavailable: {0}")]
    TransientIo(String),

    /// A stored value could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
                StoreError::WriteConflict(db_err.message().to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::DataCorruption(e.to_string())
            }
            _ => StoreError::TransientIo(e.to_string()),
        }
    }
}

pub trait AttendanceStore {
    fn list_employees(&self) -> impl Future<Output = StoreResult<Vec<Employee>>> + Send;

    fn get_employee(&self, employee_id: &str) -> impl Future<Output = StoreResult<Option<Employee>>> + Send;

    fn create_employee(&self, employee: Employee) -> impl Future<Output = StoreResult<Employee>> + Send;

    /// Returns `false` when no such employee existed.
    fn delete_employee(&self, employee_id: &str) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Today's session for `kind`. When several exist on one day the latest
    /// `scheduled_at` wins.
    fn find_session_for_date(
        &self,
        kind: SessionKind,
        date: NaiveDate,
        tz: FixedOffset,
    ) -> impl Future<Output = StoreResult<Option<Session>>> + Send;

    fn list_sessions(&self, kind: SessionKind) -> impl Future<Output = StoreResult<Vec<Session>>> + Send;

    fn get_session(
        &self,
        kind: SessionKind,
        session_id: &str,
    ) -> impl Future<Output = StoreResult<Option<Session>>> + Send;

    fn create_session(
        &self,
        kind: SessionKind,
        scheduled_at: DateTime<Utc>,
        created_by: Option<String>,
        tz: FixedOffset,
    ) -> impl Future<Output = StoreResult<Session>> + Send;

    /// Sets `started_at` only if it is still unset.
    fn mark_started(
        &self,
        kind: SessionKind,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Session>> + Send;

    /// Sets `finalized_at` only on a started, unfinalized session.
    fn mark_finalized(
        &self,
        kind: SessionKind,
        session_id: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = StoreResult<Session>> + Send;

    fn list_attendance(
        &self,
        kind: SessionKind,
        session_id: &str,
    ) -> impl Future<Output = StoreResult<Vec<AttendanceRecord>>> + Send;

    fn insert_attendance(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
        status: AttendanceStatus,
    ) -> impl Future<Output = StoreResult<AttendanceRecord>> + Send;

    /// Fails with `NotFound` when the pair has no record yet.
    fn update_attendance_status(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
        status: AttendanceStatus,
    ) -> impl Future<Output = StoreResult<AttendanceRecord>> + Send;

    /// Single-statement insert-or-update keyed on (session, employee).
    fn upsert_attendance(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
        status: AttendanceStatus,
    ) -> impl Future<Output = StoreResult<AttendanceRecord>> + Send;

    /// Every record for one employee joined with its session time, newest first.
    fn attendance_history(
        &self,
        kind: SessionKind,
        employee_id: &str,
    ) -> impl Future<Output = StoreResult<Vec<HistoryEntry>>> + Send;

    fn admin_exists(&self) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Inserts a login with an already hashed password and returns its id.
    /// A taken username (or unknown employee) is a `WriteConflict`.
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        employee_id: Option<&str>,
    ) -> impl Future<Output = StoreResult<u64>> + Send;
}
