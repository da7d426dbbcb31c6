//! Learning-hour feedback dashboard figures, computed over rows the caller
//! already fetched.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Feedback rows carry US-style `M/D/YYYY` dates.
mod us_date {
    use chrono::NaiveDate;
    use serde::Serializer;

    const FORMAT: &str = "%m/%d/%Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    /// A row whose date does not parse keeps `None` instead of failing the
    /// whole batch.
    pub mod lenient {
        use chrono::NaiveDate;
        use serde::{Deserialize, Deserializer, Serializer};

        use super::FORMAT;

        pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            Ok(raw.and_then(|raw| NaiveDate::parse_from_str(raw.trim(), FORMAT).ok()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentFeedback {
    pub id: String,
    /// `None` when the sheet cell is not an `M/D/YYYY` date
    #[serde(default, with = "us_date::lenient")]
    #[schema(value_type = Option<String>, example = "3/10/2026")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: String,
    pub student_understanding_rating: f64,
    pub instructor_rating: f64,
    #[serde(default)]
    pub student_remark: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub avg_student_understanding: f64,
    pub avg_instructor_rating: f64,
    pub total_feedbacks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    #[serde(serialize_with = "us_date::serialize")]
    #[schema(value_type = String, example = "3/10/2026")]
    pub date: NaiveDate,
    pub student_understanding: f64,
    pub instructor_rating: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Rows dated within `[start, end]`. Undated rows and a reversed range match
/// nothing.
pub fn filter_by_date_range(rows: &[StudentFeedback], start: NaiveDate, end: NaiveDate) -> Vec<StudentFeedback> {
    rows.iter()
        .filter(|row| row.date.is_some_and(|date| date >= start && date <= end))
        .cloned()
        .collect()
}

pub fn calculate_metrics(rows: &[StudentFeedback]) -> DashboardMetrics {
    DashboardMetrics {
        avg_student_understanding: round1(mean(rows.iter().map(|r| r.student_understanding_rating))),
        avg_instructor_rating: round1(mean(rows.iter().map(|r| r.instructor_rating))),
        total_feedbacks: rows.len(),
    }
}

/// Per-day averages, oldest day first. Undated rows have no place on the chart.
pub fn prepare_chart_data(rows: &[StudentFeedback]) -> Vec<ChartPoint> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&StudentFeedback>> = BTreeMap::new();
    for row in rows {
        if let Some(date) = row.date {
            by_date.entry(date).or_default().push(row);
        }
    }

    by_date
        .into_iter()
        .map(|(date, day)| ChartPoint {
            date,
            student_understanding: round1(mean(day.iter().map(|r| r.student_understanding_rating))),
            instructor_rating: round1(mean(day.iter().map(|r| r.instructor_rating))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<StudentFeedback> {
        serde_json::from_value(json!([
            { "id": "1", "date": "3/10/2026", "time": "10:00", "studentUnderstandingRating": 4, "instructorRating": 5, "studentRemark": "clear" },
            { "id": "2", "date": "3/10/2026", "time": "10:05", "studentUnderstandingRating": 3, "instructorRating": 4, "studentRemark": "" },
            { "id": "3", "date": "03/09/2026", "time": "10:00", "studentUnderstandingRating": 5, "instructorRating": 5, "studentRemark": "great" },
            { "id": "4", "date": "3/1/2026", "studentUnderstandingRating": 2, "instructorRating": 3 }
        ]))
        .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_unpadded_us_dates() {
        let rows = rows();
        assert_eq!(rows[0].date, Some(date(2026, 3, 10)));
        assert_eq!(rows[3].date, Some(date(2026, 3, 1)));
        assert!(rows[3].student_remark.is_empty());
    }

    #[test]
    fn single_day_range_matches_that_day_only() {
        let filtered = filter_by_date_range(&rows(), date(2026, 3, 10), date(2026, 3, 10));
        let ids: Vec<_> = filtered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn range_is_inclusive_and_reversed_range_is_empty() {
        assert_eq!(filter_by_date_range(&rows(), date(2026, 3, 1), date(2026, 3, 9)).len(), 2);
        assert!(filter_by_date_range(&rows(), date(2026, 3, 10), date(2026, 3, 1)).is_empty());
    }

    #[test]
    fn metrics_round_to_one_decimal() {
        let metrics = calculate_metrics(&rows());
        assert_eq!(metrics.total_feedbacks, 4);
        assert_eq!(metrics.avg_student_understanding, 3.5);
        assert_eq!(metrics.avg_instructor_rating, 4.3);
    }

    #[test]
    fn metrics_of_nothing_are_zero() {
        let metrics = calculate_metrics(&[]);
        assert_eq!(metrics.total_feedbacks, 0);
        assert_eq!(metrics.avg_student_understanding, 0.0);
        assert_eq!(metrics.avg_instructor_rating, 0.0);
    }

    #[test]
    fn chart_groups_by_day_in_date_order() {
        let chart = prepare_chart_data(&rows());
        let dates: Vec<_> = chart.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date(2026, 3, 1), date(2026, 3, 9), date(2026, 3, 10)]);

        let tenth = &chart[2];
        assert_eq!(tenth.student_understanding, 3.5);
        assert_eq!(tenth.instructor_rating, 4.5);
    }

    #[test]
    fn malformed_date_drops_only_that_row() {
        let rows: Vec<StudentFeedback> = serde_json::from_value(json!([
            { "id": "1", "date": "3/10/2026", "studentUnderstandingRating": 4, "instructorRating": 5 },
            { "id": "2", "date": "tenth of march", "studentUnderstandingRating": 1, "instructorRating": 1 },
            { "id": "3", "studentUnderstandingRating": 2, "instructorRating": 2 }
        ]))
        .unwrap();

        assert_eq!(rows[1].date, None);
        assert_eq!(rows[2].date, None);

        let filtered = filter_by_date_range(&rows, date(2026, 3, 1), date(2026, 3, 31));
        let ids: Vec<_> = filtered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
        assert_eq!(prepare_chart_data(&rows).len(), 1);
    }

    #[test]
    fn chart_dates_use_the_input_format() {
        let chart = prepare_chart_data(&rows());
        let value = serde_json::to_value(&chart[0]).unwrap();
        assert_eq!(value["date"], json!("03/01/2026"));
        assert_eq!(value["studentUnderstanding"], json!(2.0));
    }
}
