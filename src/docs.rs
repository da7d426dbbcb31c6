use crate::api::attendance::HistoryResponse;
use crate::api::employee::CreateEmployee;
use crate::api::feedback::{FeedbackMetricsReq, FeedbackMetricsResponse};
use crate::api::session::{EditAttendance, ScheduleSession};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::Employee;
use crate::model::session::{Session, SessionKind, SessionState};
use crate::models::{LoginReqDto, LoginResponse, RegisterReq};
use crate::service::feedback::{ChartPoint, DashboardMetrics, StudentFeedback};
use crate::service::history::{DayMark, HistoryBucket, HistoryView};
use crate::service::lifecycle::DaySnapshot;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Standup Tracker API",
        version = "0.1.0",
        description = r#"
## Standup & Learning Hour Attendance

Admins schedule one standup and one learning hour per day, start it,
mark who showed up, and stop it. Starting a session seeds an absence
record for every employee; toggling flips a record between present and
absent until the session is stopped.

### Security
Every `/api` endpoint needs a **JWT Bearer** token from `/auth/login`.
Only admins may schedule, start, toggle, stop or edit attendance, and
register new logins.

### Streaks
`/api/streak` reports how many consecutive days the caller was present
at standup, counting back from the most recent one.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::register,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::delete_employee,

        crate::api::session::list_sessions,
        crate::api::session::schedule_session,
        crate::api::session::today,
        crate::api::session::start_session,
        crate::api::session::stop_session,
        crate::api::session::toggle_attendance,
        crate::api::session::edit_attendance,

        crate::api::attendance::my_streak,
        crate::api::attendance::employee_history,

        crate::api::feedback::feedback_metrics
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            CreateEmployee,
            Employee,
            Session,
            SessionKind,
            SessionState,
            ScheduleSession,
            EditAttendance,
            AttendanceRecord,
            AttendanceStatus,
            DaySnapshot,
            HistoryView,
            DayMark,
            HistoryBucket,
            HistoryResponse,
            StudentFeedback,
            DashboardMetrics,
            ChartPoint,
            FeedbackMetricsReq,
            FeedbackMetricsResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Login and admin-only registration"),
        (name = "Employee", description = "Employee roster APIs"),
        (name = "Session", description = "Standup and learning hour lifecycle APIs"),
        (name = "Attendance", description = "Streaks and attendance history"),
        (name = "Feedback", description = "Learning hour feedback metrics"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
