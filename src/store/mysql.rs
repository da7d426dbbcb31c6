use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use sqlx::MySqlPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::{AttendanceStore, StoreError, StoreResult};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, HistoryEntry},
    employee::Employee,
    role::Role,
    session::{Session, SessionKind, day_bounds},
};

// -------------------- Row types --------------------

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    scheduled_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
    started_at: Option<DateTime<Utc>>,
    finalized_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    fn into_session(self, kind: SessionKind) -> Session {
        Session {
            id: self.id,
            kind,
            scheduled_at: self.scheduled_at,
            created_at: self.created_at,
            created_by: self.created_by,
            started_at: self.started_at,
            finalized_at: self.finalized_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AttendanceRow {
    id: String,
    session_id: String,
    employee_id: String,
    status: String,
    marked_at: Option<DateTime<Utc>>,
}

fn parse_status(raw: &str) -> StoreResult<AttendanceStatus> {
    raw.parse()
        .map_err(|_| StoreError::DataCorruption(format!("unknown attendance status {raw:?}")))
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: parse_status(&row.status)?,
            id: row.id,
            session_id: row.session_id,
            employee_id: row.employee_id,
            marked_at: row.marked_at,
        })
    }
}

const SESSION_COLUMNS: &str = "id, scheduled_at, created_at, created_by, started_at, finalized_at";

fn attendance_select(kind: SessionKind) -> String {
    format!(
        "SELECT id, {col} AS session_id, employee_id, status, marked_at FROM {table}",
        col = kind.session_column(),
        table = kind.attendance_table(),
    )
}

// -------------------- Store --------------------

/// `AttendanceStore` backed by MySQL.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn fetch_record(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
    ) -> StoreResult<AttendanceRecord> {
        let sql = format!(
            "{} WHERE {} = ? AND employee_id = ?",
            attendance_select(kind),
            kind.session_column()
        );

        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(session_id)
            .bind(employee_id)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    /// Resolve why a guarded lifecycle update touched no rows.
    async fn guard_failed(&self, kind: SessionKind, session_id: &str, action: &str) -> StoreError {
        match self.get_session(kind, session_id).await {
            Ok(Some(_)) => StoreError::WriteConflict(format!("session {session_id} cannot be {action}")),
            Ok(None) => StoreError::NotFound,
            Err(e) => e,
        }
    }
}

impl AttendanceStore for MySqlStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT employee_id, name, email, role, ratings_sheet_link
            FROM employees
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list employees");
            StoreError::from(e)
        })?;

        Ok(employees)
    }

    async fn get_employee(&self, employee_id: &str) -> StoreResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT employee_id, name, email, role, ratings_sheet_link
            FROM employees
            WHERE employee_id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn create_employee(&self, employee: Employee) -> StoreResult<Employee> {
        sqlx::query(
            r#"
            INSERT INTO employees (employee_id, name, email, role, ratings_sheet_link)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.employee_id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.role)
        .bind(&employee.ratings_sheet_link)
        .execute(&self.pool)
        .await?;

        Ok(employee)
    }

    async fn delete_employee(&self, employee_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE employee_id = ?")
            .bind(employee_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_session_for_date(
        &self,
        kind: SessionKind,
        date: NaiveDate,
        tz: FixedOffset,
    ) -> StoreResult<Option<Session>> {
        let (start, end) = day_bounds(date, tz);
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM {} \
             WHERE scheduled_at >= ? AND scheduled_at < ? \
             ORDER BY scheduled_at DESC, id DESC LIMIT 1",
            kind.session_table()
        );
        debug!(sql = %sql, %start, %end, "Finding session for date");

        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_session(kind)))
    }

    async fn list_sessions(&self, kind: SessionKind) -> StoreResult<Vec<Session>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM {} ORDER BY scheduled_at ASC",
            kind.session_table()
        );

        let rows = sqlx::query_as::<_, SessionRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_session(kind)).collect())
    }

    async fn get_session(&self, kind: SessionKind, session_id: &str) -> StoreResult<Option<Session>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM {} WHERE id = ?", kind.session_table());

        let row = sqlx::query_as::<_, SessionRow>(&sql)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_session(kind)))
    }

    async fn create_session(
        &self,
        kind: SessionKind,
        scheduled_at: DateTime<Utc>,
        created_by: Option<String>,
        tz: FixedOffset,
    ) -> StoreResult<Session> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            kind,
            scheduled_at,
            created_at: Utc::now(),
            created_by,
            started_at: None,
            finalized_at: None,
        };

        // session_date carries the one-per-day unique key
        let sql = format!(
            "INSERT INTO {} (id, scheduled_at, session_date, created_at, created_by) VALUES (?, ?, ?, ?, ?)",
            kind.session_table()
        );

        sqlx::query(&sql)
            .bind(&session.id)
            .bind(session.scheduled_at)
            .bind(session.local_date(tz))
            .bind(session.created_at)
            .bind(&session.created_by)
            .execute(&self.pool)
            .await?;

        Ok(session)
    }

    async fn mark_started(&self, kind: SessionKind, session_id: &str, at: DateTime<Utc>) -> StoreResult<Session> {
        let sql = format!(
            "UPDATE {} SET started_at = ? WHERE id = ? AND started_at IS NULL",
            kind.session_table()
        );

        let result = sqlx::query(&sql).bind(at).bind(session_id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(self.guard_failed(kind, session_id, "started").await);
        }

        self.get_session(kind, session_id).await?.ok_or(StoreError::NotFound)
    }

    async fn mark_finalized(&self, kind: SessionKind, session_id: &str, at: DateTime<Utc>) -> StoreResult<Session> {
        let sql = format!(
            "UPDATE {} SET finalized_at = ? \
             WHERE id = ? AND started_at IS NOT NULL AND finalized_at IS NULL",
            kind.session_table()
        );

        let result = sqlx::query(&sql).bind(at).bind(session_id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(self.guard_failed(kind, session_id, "finalized").await);
        }

        self.get_session(kind, session_id).await?.ok_or(StoreError::NotFound)
    }

    async fn list_attendance(&self, kind: SessionKind, session_id: &str) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!("{} WHERE {} = ?", attendance_select(kind), kind.session_column());

        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(AttendanceRecord::try_from).collect()
    }

    async fn insert_attendance(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceRecord> {
        let record = AttendanceRecord {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            employee_id: employee_id.to_string(),
            status,
            marked_at: Some(Utc::now()),
        };

        let sql = format!(
            "INSERT INTO {} (id, {}, employee_id, status, marked_at) VALUES (?, ?, ?, ?, ?)",
            kind.attendance_table(),
            kind.session_column()
        );

        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.session_id)
            .bind(&record.employee_id)
            .bind(record.status.as_ref())
            .bind(record.marked_at)
            .execute(&self.pool)
            .await?;

        Ok(record)
    }

    async fn update_attendance_status(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceRecord> {
        let sql = format!(
            "UPDATE {} SET status = ?, marked_at = ? WHERE {} = ? AND employee_id = ?",
            kind.attendance_table(),
            kind.session_column()
        );

        let result = sqlx::query(&sql)
            .bind(status.as_ref())
            .bind(Utc::now())
            .bind(session_id)
            .bind(employee_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.fetch_record(kind, session_id, employee_id).await
    }

    async fn upsert_attendance(
        &self,
        kind: SessionKind,
        session_id: &str,
        employee_id: &str,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceRecord> {
        let sql = format!(
            "INSERT INTO {} (id, {}, employee_id, status, marked_at) VALUES (?, ?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE status = VALUES(status), marked_at = VALUES(marked_at)",
            kind.attendance_table(),
            kind.session_column()
        );

        sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(session_id)
            .bind(employee_id)
            .bind(status.as_ref())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        self.fetch_record(kind, session_id, employee_id).await
    }

    async fn attendance_history(&self, kind: SessionKind, employee_id: &str) -> StoreResult<Vec<HistoryEntry>> {
        let sql = format!(
            "SELECT a.status, s.scheduled_at FROM {att} a \
             JOIN {sessions} s ON s.id = a.{col} \
             WHERE a.employee_id = ? \
             ORDER BY s.scheduled_at DESC",
            att = kind.attendance_table(),
            sessions = kind.session_table(),
            col = kind.session_column(),
        );

        let rows = sqlx::query_as::<_, (String, DateTime<Utc>)>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|(status, scheduled_at)| {
                Ok(HistoryEntry {
                    status: parse_status(&status)?,
                    scheduled_at,
                })
            })
            .collect()
    }

    async fn admin_exists(&self) -> StoreResult<bool> {
        let admins = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role_id = ?")
            .bind(Role::Admin.id())
            .fetch_one(&self.pool)
            .await?;

        Ok(admins > 0)
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
        employee_id: Option<&str>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password, role_id, employee_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.id())
        .bind(employee_id)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }
}
