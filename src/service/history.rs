use std::collections::BTreeMap;

use chrono::{Datelike, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceStatus, HistoryEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryView {
    #[default]
    Weekly,
    Monthly,
}

/// One session's mark on the employee's local calendar.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DayMark {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoryBucket {
    /// `2026-W11` or `2026-03`
    pub label: String,
    #[schema(value_type = String, format = "date")]
    pub start: NaiveDate,
    pub present: u32,
    pub total: u32,
}

/// Local-date marks inside `[start, end]`, newest first. Open ends are unbounded.
pub fn filter_by_range(
    entries: &[HistoryEntry],
    tz: FixedOffset,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<DayMark> {
    let mut marks: Vec<DayMark> = entries
        .iter()
        .map(|e| DayMark {
            date: e.scheduled_at.with_timezone(&tz).date_naive(),
            status: e.status,
        })
        .filter(|m| start.is_none_or(|s| m.date >= s) && end.is_none_or(|e| m.date <= e))
        .collect();
    marks.sort_by(|a, b| b.date.cmp(&a.date));
    marks
}

fn bucket_of(date: NaiveDate, view: HistoryView) -> (NaiveDate, String) {
    match view {
        HistoryView::Weekly => {
            let week = date.iso_week();
            let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
            (monday, format!("{}-W{:02}", week.year(), week.week()))
        }
        HistoryView::Monthly => {
            let first = date - Duration::days(i64::from(date.day0()));
            (first, format!("{}-{:02}", date.year(), date.month()))
        }
    }
}

/// Present/total counts per week or month, oldest bucket first.
pub fn aggregate(marks: &[DayMark], view: HistoryView) -> Vec<HistoryBucket> {
    let mut buckets: BTreeMap<NaiveDate, HistoryBucket> = BTreeMap::new();

    for mark in marks {
        let (start, label) = bucket_of(mark.date, view);
        let bucket = buckets.entry(start).or_insert_with(|| HistoryBucket {
            label,
            start,
            present: 0,
            total: 0,
        });
        bucket.total += 1;
        if mark.status.is_present() {
            bucket.present += 1;
        }
    }

    buckets.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(y: i32, m: u32, d: u32, status: AttendanceStatus) -> HistoryEntry {
        HistoryEntry {
            status,
            scheduled_at: Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_is_inclusive_and_newest_first() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let entries = vec![
            entry(2026, 3, 2, AttendanceStatus::Present),
            entry(2026, 3, 4, AttendanceStatus::Absent),
            entry(2026, 3, 6, AttendanceStatus::Present),
        ];

        let marks = filter_by_range(&entries, utc, Some(date(2026, 3, 2)), Some(date(2026, 3, 4)));
        let dates: Vec<_> = marks.iter().map(|m| m.date).collect();
        assert_eq!(dates, vec![date(2026, 3, 4), date(2026, 3, 2)]);

        assert_eq!(filter_by_range(&entries, utc, None, None).len(), 3);
    }

    #[test]
    fn weekly_buckets_start_on_monday() {
        let marks = vec![
            DayMark { date: date(2026, 3, 9), status: AttendanceStatus::Present },
            DayMark { date: date(2026, 3, 11), status: AttendanceStatus::Absent },
            DayMark { date: date(2026, 3, 3), status: AttendanceStatus::Present },
        ];

        let buckets = aggregate(&marks, HistoryView::Weekly);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, date(2026, 3, 2));
        assert_eq!(buckets[0].label, "2026-W10");
        assert_eq!((buckets[1].present, buckets[1].total), (1, 2));
    }

    #[test]
    fn monthly_buckets_group_by_calendar_month() {
        let marks = vec![
            DayMark { date: date(2026, 2, 27), status: AttendanceStatus::Missed },
            DayMark { date: date(2026, 3, 1), status: AttendanceStatus::Present },
            DayMark { date: date(2026, 3, 31), status: AttendanceStatus::Present },
        ];

        let buckets = aggregate(&marks, HistoryView::Monthly);
        let summary: Vec<_> = buckets.iter().map(|b| (b.label.as_str(), b.present, b.total)).collect();
        assert_eq!(summary, vec![("2026-02", 0, 1), ("2026-03", 2, 2)]);
    }
}
