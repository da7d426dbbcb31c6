use crate::service::feedback::{
    ChartPoint, DashboardMetrics, StudentFeedback, calculate_metrics, filter_by_date_range, prepare_chart_data,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct FeedbackMetricsReq {
    pub rows: Vec<StudentFeedback>,
    #[schema(value_type = Option<String>, format = "date", example = "2026-03-01")]
    pub start: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date", example = "2026-03-31")]
    pub end: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct FeedbackMetricsResponse {
    pub metrics: DashboardMetrics,
    pub chart: Vec<ChartPoint>,
}

fn dashboard(req: FeedbackMetricsReq) -> FeedbackMetricsResponse {
    let rows = match (req.start, req.end) {
        (None, None) => req.rows,
        (start, end) => filter_by_date_range(
            &req.rows,
            start.unwrap_or(NaiveDate::MIN),
            end.unwrap_or(NaiveDate::MAX),
        ),
    };

    FeedbackMetricsResponse {
        metrics: calculate_metrics(&rows),
        chart: prepare_chart_data(&rows),
    }
}

#[utoipa::path(
    post,
    path = "/api/feedback/metrics",
    request_body = FeedbackMetricsReq,
    responses(
        (status = 200, description = "Averages and per-day chart data", body = FeedbackMetricsResponse),
        (status = 400, description = "Malformed feedback rows")
    ),
    tag = "Feedback",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn feedback_metrics(payload: web::Json<FeedbackMetricsReq>) -> impl Responder {
    HttpResponse::Ok().json(dashboard(payload.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<StudentFeedback> {
        serde_json::from_value(serde_json::json!([
            { "id": "1", "date": "3/2/2026", "studentUnderstandingRating": 4.0, "instructorRating": 5.0 },
            { "id": "2", "date": "3/2/2026", "studentUnderstandingRating": 3.0, "instructorRating": 4.0 },
            { "id": "3", "date": "3/9/2026", "studentUnderstandingRating": 5.0, "instructorRating": 5.0 }
        ]))
        .unwrap()
    }

    #[test]
    fn no_range_uses_every_row() {
        let resp = dashboard(FeedbackMetricsReq {
            rows: rows(),
            start: None,
            end: None,
        });
        assert_eq!(resp.metrics.total_feedbacks, 3);
        assert_eq!(resp.chart.len(), 2);
    }

    #[test]
    fn open_ended_range_filters_one_side() {
        let resp = dashboard(FeedbackMetricsReq {
            rows: rows(),
            start: NaiveDate::from_ymd_opt(2026, 3, 5),
            end: None,
        });
        assert_eq!(resp.metrics.total_feedbacks, 1);
        assert_eq!(resp.metrics.avg_student_understanding, 5.0);
    }
}
