//! Uptime aggregation over stored checks.
//!
//! All functions here are pure; callers fetch the checks for the window and
//! pass the reference time explicitly.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::check::StatusCheck;
use crate::status::StatusLevel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeStats {
    pub percentage: f64,
    pub total_checks: u64,
    pub operational_checks: u64,
    pub degraded_checks: u64,
    pub outage_checks: u64,
}

impl Default for UptimeStats {
    fn default() -> Self {
        Self {
            percentage: 100.0,
            total_checks: 0,
            operational_checks: 0,
            degraded_checks: 0,
            outage_checks: 0,
        }
    }
}

/// One bar of the history chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUptime {
    pub date: NaiveDate,
    pub status: StatusLevel,
    pub uptime_percentage: f64,
    /// False when no check landed on this day and the values are the
    /// operational default.
    pub has_data: bool,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Start of a `days`-long window ending at `now`. Windows reaching past the
/// representable range start at the earliest representable instant.
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Count statuses and derive the uptime percentage. An empty input is 100%.
pub fn summarize<I>(statuses: I) -> UptimeStats
where
    I: IntoIterator<Item = StatusLevel>,
{
    let mut stats = UptimeStats::default();
    for status in statuses {
        stats.total_checks += 1;
        match status {
            StatusLevel::Operational => stats.operational_checks += 1,
            StatusLevel::Degraded => stats.degraded_checks += 1,
            StatusLevel::PartialOutage | StatusLevel::MajorOutage => stats.outage_checks += 1,
        }
    }
    if stats.total_checks > 0 {
        let up = stats.operational_checks + stats.degraded_checks;
        stats.percentage = round2(up as f64 / stats.total_checks as f64 * 100.0);
    }
    stats
}

/// Bucket checks by UTC calendar day over `days` days ending at `today`,
/// oldest first. Checks outside the range are ignored.
pub fn daily_history(checks: &[StatusCheck], today: NaiveDate, days: u32) -> Vec<DailyUptime> {
    if days == 0 {
        return Vec::new();
    }
    let first = today - Duration::days(i64::from(days) - 1);

    let mut buckets: BTreeMap<NaiveDate, Vec<StatusLevel>> = BTreeMap::new();
    for check in checks {
        let date = check.timestamp.date_naive();
        if date >= first && date <= today {
            buckets.entry(date).or_default().push(check.status);
        }
    }

    first
        .iter_days()
        .take(days as usize)
        .map(|date| match buckets.get(&date) {
            Some(statuses) => DailyUptime {
                date,
                status: crate::status::overall_status(statuses.iter().copied()),
                uptime_percentage: summarize(statuses.iter().copied()).percentage,
                has_data: true,
            },
            None => DailyUptime {
                date,
                status: StatusLevel::Operational,
                uptime_percentage: 100.0,
                has_data: false,
            },
        })
        .collect()
}

/// Mean response time rounded to whole milliseconds; 0 for no checks.
pub fn average_response_time(checks: &[StatusCheck]) -> u64 {
    if checks.is_empty() {
        return 0;
    }
    let total: u128 = checks.iter().map(|check| u128::from(check.response_time)).sum();
    (total as f64 / checks.len() as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::ComponentType;
    use chrono::TimeZone;

    #[test]
    fn huge_windows_saturate() {
        let now = Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap();
        assert_eq!(window_start(now, 7), now - Duration::days(7));
        assert_eq!(window_start(now, u32::MAX), DateTime::<Utc>::MIN_UTC);
    }

    fn check_at(ts: DateTime<Utc>, status: StatusLevel, response_time: u64) -> StatusCheck {
        StatusCheck::new(ts, ComponentType::Api, status, response_time, 200)
    }

    fn day(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn no_checks_is_full_uptime() {
        let stats = summarize(Vec::new());
        assert_eq!(stats.percentage, 100.0);
        assert_eq!(stats.total_checks, 0);
    }

    #[test]
    fn degraded_counts_as_up() {
        let stats = summarize([
            StatusLevel::Operational,
            StatusLevel::Degraded,
            StatusLevel::PartialOutage,
        ]);
        assert_eq!(stats.total_checks, 3);
        assert_eq!(stats.outage_checks, 1);
        assert_eq!(stats.percentage, 66.67);
    }

    #[test]
    fn percentage_stays_in_bounds() {
        let all_down = summarize([StatusLevel::MajorOutage; 7]);
        assert_eq!(all_down.percentage, 0.0);
        let all_up = summarize([StatusLevel::Degraded; 7]);
        assert_eq!(all_up.percentage, 100.0);
    }

    #[test]
    fn history_buckets_by_day_with_worst_status() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let checks = vec![
            check_at(day(2026, 3, 9, 1), StatusLevel::Operational, 100),
            check_at(day(2026, 3, 9, 2), StatusLevel::MajorOutage, 100),
            check_at(day(2026, 3, 9, 3), StatusLevel::Degraded, 100),
            check_at(day(2026, 3, 9, 4), StatusLevel::Operational, 100),
            check_at(day(2026, 3, 10, 0), StatusLevel::Degraded, 100),
            // Outside the window.
            check_at(day(2026, 3, 1, 0), StatusLevel::MajorOutage, 100),
        ];

        let history = daily_history(&checks, today, 3);
        assert_eq!(history.len(), 3);

        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2026, 3, 8).unwrap());
        assert!(!history[0].has_data);
        assert_eq!(history[0].status, StatusLevel::Operational);
        assert_eq!(history[0].uptime_percentage, 100.0);

        assert_eq!(history[1].status, StatusLevel::MajorOutage);
        assert_eq!(history[1].uptime_percentage, 75.0);
        assert!(history[1].has_data);

        assert_eq!(history[2].date, today);
        assert_eq!(history[2].status, StatusLevel::Degraded);
        assert_eq!(history[2].uptime_percentage, 100.0);
    }

    #[test]
    fn history_is_deterministic() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let checks: Vec<_> = (0..48)
            .map(|i| {
                let status = if i % 5 == 0 {
                    StatusLevel::PartialOutage
                } else {
                    StatusLevel::Operational
                };
                check_at(day(2026, 1, 30, 0) + Duration::hours(i), status, 80)
            })
            .collect();
        let mut reversed = checks.clone();
        reversed.reverse();

        assert_eq!(
            daily_history(&checks, today, 7),
            daily_history(&reversed, today, 7)
        );
    }

    #[test]
    fn zero_days_yields_nothing() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(daily_history(&[], today, 0).is_empty());
    }

    #[test]
    fn average_rounds_to_nearest_ms() {
        let ts = day(2026, 2, 2, 2);
        let checks = vec![
            check_at(ts, StatusLevel::Operational, 100),
            check_at(ts, StatusLevel::Operational, 101),
        ];
        assert_eq!(average_response_time(&checks), 101);
        assert_eq!(average_response_time(&[]), 0);
    }
}
