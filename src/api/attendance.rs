use crate::{
    auth::auth::AuthUser,
    config::Config,
    model::{actor::Actor, session::SessionKind},
    service::{
        history::{DayMark, HistoryBucket, HistoryView, aggregate, filter_by_range},
        streak::streak_for,
    },
    store::{AttendanceStore, MySqlStore},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// First local date to include (inclusive)
    #[param(value_type = Option<String>, example = "2026-03-01")]
    pub start: Option<NaiveDate>,
    /// Last local date to include (inclusive)
    #[param(value_type = Option<String>, example = "2026-03-31")]
    pub end: Option<NaiveDate>,
    #[param(inline)]
    pub view: Option<HistoryView>,
    /// Defaults to standup
    #[param(inline)]
    pub kind: Option<SessionKind>,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    pub employee_id: String,
    pub kind: SessionKind,
    pub marks: Vec<DayMark>,
    pub buckets: Vec<HistoryBucket>,
}

/// Members may only read their own history.
fn can_view(actor: &Actor, employee_id: &str) -> bool {
    actor.is_admin() || actor.employee_id() == Some(employee_id)
}

#[utoipa::path(
    get,
    path = "/api/streak",
    responses(
        (status = 200, description = "Caller's standup streak", body = Object, example = json!({
            "type": "days",
            "days": 4
        }))
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_streak(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
) -> impl Responder {
    let streak = streak_for(store.get_ref(), &auth.actor(), config.utc_offset).await;
    HttpResponse::Ok().json(streak)
}

#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}/attendance",
    params(
        ("employee_id" = String, Path, description = "Employee ID"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Marks in range plus weekly or monthly totals", body = HistoryResponse),
        (status = 403, description = "Members may only view their own history"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn employee_history(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    if !can_view(&auth.actor(), &employee_id) {
        return Ok(HttpResponse::Forbidden().json(json!({
            "message": "Members may only view their own history"
        })));
    }

    if store.get_employee(&employee_id).await?.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    let kind = query.kind.unwrap_or(SessionKind::Standup);
    let view = query.view.unwrap_or_default();

    let entries = store.attendance_history(kind, &employee_id).await?;
    let marks = filter_by_range(&entries, config.utc_offset, query.start, query.end);
    let buckets = aggregate(&marks, view);

    debug!(employee_id = %employee_id, %kind, marks = marks.len(), "History read");

    Ok(HttpResponse::Ok().json(HistoryResponse {
        employee_id,
        kind,
        marks,
        buckets,
    }))
}
