use std::collections::HashMap;

use crate::{
    auth::auth::AuthUser,
    config::Config,
    model::{
        attendance::{AttendanceRecord, AttendanceStatus},
        session::{Session, SessionKind},
    },
    service::lifecycle::{DaySnapshot, Lifecycle},
    store::{AttendanceStore, MySqlStore},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ScheduleSession {
    #[schema(example = "2026-01-05T09:30:00Z", format = "date-time", value_type = String)]
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct EditAttendance {
    /// employee_id -> status; employees left out get the kind's absence status
    #[schema(example = json!({ "EMP-001": "Present", "EMP-002": "NotAvailable" }))]
    pub statuses: HashMap<String, AttendanceStatus>,
}

fn lifecycle<'a>(store: &'a MySqlStore, config: &Config, kind: SessionKind) -> Lifecycle<'a, MySqlStore> {
    Lifecycle::new(store, kind, config.utc_offset)
}

#[utoipa::path(
    get,
    path = "/api/sessions/{kind}",
    params(
        ("kind" = SessionKind, Path, description = "standup or learning-hour")
    ),
    responses(
        (status = 200, description = "Sessions ordered by scheduled time", body = [Session])
    ),
    tag = "Session",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_sessions(
    store: web::Data<MySqlStore>,
    path: web::Path<SessionKind>,
) -> actix_web::Result<impl Responder> {
    let sessions = store.list_sessions(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(sessions))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{kind}",
    params(
        ("kind" = SessionKind, Path, description = "standup or learning-hour")
    ),
    request_body = ScheduleSession,
    responses(
        (status = 201, description = "Session scheduled", body = Session),
        (status = 403, description = "Admin only"),
        (status = 409, description = "A session of this kind already exists that day")
    ),
    tag = "Session",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn schedule_session(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<SessionKind>,
    payload: web::Json<ScheduleSession>,
) -> actix_web::Result<impl Responder> {
    let session = lifecycle(&store, &config, path.into_inner())
        .schedule(&auth.actor(), payload.scheduled_at, Some(auth.username.clone()))
        .await?;

    Ok(HttpResponse::Created().json(session))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{kind}/today",
    params(
        ("kind" = SessionKind, Path, description = "standup or learning-hour")
    ),
    responses(
        (status = 200, description = "Today's session, state and attendance", body = DaySnapshot)
    ),
    tag = "Session",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn today(
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<SessionKind>,
) -> actix_web::Result<impl Responder> {
    let snapshot = lifecycle(&store, &config, path.into_inner())
        .snapshot(Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(snapshot))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{kind}/today/start",
    params(
        ("kind" = SessionKind, Path, description = "standup or learning-hour")
    ),
    responses(
        (status = 200, description = "Session started; every employee has a record", body = DaySnapshot),
        (status = 400, description = "Before scheduled time, or no employees"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Nothing scheduled today"),
        (status = 409, description = "Session is not in the Scheduled state")
    ),
    tag = "Session",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn start_session(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<SessionKind>,
) -> actix_web::Result<impl Responder> {
    let snapshot = lifecycle(&store, &config, path.into_inner())
        .start(&auth.actor(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(snapshot))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{kind}/today/stop",
    params(
        ("kind" = SessionKind, Path, description = "standup or learning-hour")
    ),
    responses(
        (status = 200, description = "Session finalized", body = DaySnapshot),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Nothing scheduled today"),
        (status = 409, description = "Session is not in progress")
    ),
    tag = "Session",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn stop_session(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<SessionKind>,
) -> actix_web::Result<impl Responder> {
    let snapshot = lifecycle(&store, &config, path.into_inner())
        .stop(&auth.actor(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(snapshot))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{kind}/today/attendance/{employee_id}",
    params(
        ("kind" = SessionKind, Path, description = "standup or learning-hour"),
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Attendance flipped", body = AttendanceRecord),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Nothing scheduled today, or unknown employee"),
        (status = 409, description = "Session is not in progress")
    ),
    tag = "Session",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<(SessionKind, String)>,
) -> actix_web::Result<impl Responder> {
    let (kind, employee_id) = path.into_inner();

    let record = lifecycle(&store, &config, kind)
        .toggle(&auth.actor(), &employee_id, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{kind}/{session_id}/attendance",
    params(
        ("kind" = SessionKind, Path, description = "standup or learning-hour"),
        ("session_id" = String, Path, description = "Session ID")
    ),
    request_body = EditAttendance,
    responses(
        (status = 200, description = "Attendance for every employee after the edit", body = [AttendanceRecord]),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown session or employee")
    ),
    tag = "Session",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn edit_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<(SessionKind, String)>,
    payload: web::Json<EditAttendance>,
) -> actix_web::Result<impl Responder> {
    let (kind, session_id) = path.into_inner();

    let records = lifecycle(&store, &config, kind)
        .admin_edit(&auth.actor(), &session_id, &payload.statuses)
        .await?;

    Ok(HttpResponse::Ok().json(records))
}
