//! Reminder window arithmetic for the scheduled notification pipeline.
//!
//! All windows are deliberately wide (±1h around the nominal 24h mark, ±30m
//! around the 2h mark) so an hourly cron invocation cannot miss an entity
//! between two runs. Every function takes `now` explicitly; the pipeline is
//! a pure function of (clock, datastore).

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderLead {
    Hours24,
    Hours2,
}

impl ReminderLead {
    /// Human phrasing used in subjects, titles, and templates.
    pub fn time_text(&self) -> &'static str {
        match self {
            Self::Hours24 => "24 hours",
            Self::Hours2 => "2 hours",
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Hours2)
    }
}

/// Inclusive timestamp range used by the quotation warning queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }
}

/// Quotations whose expiry lands in `[now+23h, now+25h]`.
pub fn quotation_expiry_window_24h(now: DateTime<Utc>) -> TimeWindow {
    TimeWindow { from: now + Duration::hours(23), to: now + Duration::hours(25) }
}

/// Quotations whose expiry lands in `[now+1.5h, now+2.5h]`.
pub fn quotation_expiry_window_2h(now: DateTime<Utc>) -> TimeWindow {
    TimeWindow { from: now + Duration::minutes(90), to: now + Duration::minutes(150) }
}

/// The 24h booking window is the next *calendar day*, not a rolling offset.
/// Near midnight that deliberately captures a different set than `now+24h`.
pub fn booking_reminder_day_24h(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive() + Duration::days(1)
}

/// The 2h booking scan looks at today's bookings only.
pub fn booking_reminder_day_2h(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// True when a booking on `date` at `time` starts strictly between 1.5h and
/// 2.5h from `now`. Bounds are exclusive, matching the hour-difference
/// comparison the window was designed around.
pub fn booking_starts_within_2h_window(
    now: DateTime<Utc>,
    date: NaiveDate,
    time: NaiveTime,
) -> bool {
    if date != booking_reminder_day_2h(now) {
        return false;
    }

    let starts_at = date.and_time(time).and_utc();
    let lead = starts_at - now;
    lead > Duration::minutes(90) && lead < Duration::minutes(150)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

    use super::{
        booking_reminder_day_24h, booking_starts_within_2h_window, quotation_expiry_window_24h,
        quotation_expiry_window_2h, ReminderLead,
    };

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).expect("valid rfc3339").with_timezone(&Utc)
    }

    #[test]
    fn quotation_24h_window_selects_the_nominal_mark_and_rejects_the_edges() {
        let now = at("2026-03-10T09:00:00Z");
        let window = quotation_expiry_window_24h(now);

        assert!(window.contains(now + Duration::hours(24)));
        assert!(window.contains(now + Duration::hours(23)));
        assert!(window.contains(now + Duration::hours(25)));
        assert!(!window.contains(now + Duration::hours(22)));
        assert!(!window.contains(now + Duration::hours(26)));
    }

    #[test]
    fn quotation_2h_window_spans_ninety_to_one_fifty_minutes() {
        let now = at("2026-03-10T09:00:00Z");
        let window = quotation_expiry_window_2h(now);

        assert!(window.contains(now + Duration::hours(2)));
        assert!(window.contains(now + Duration::minutes(90)));
        assert!(window.contains(now + Duration::minutes(150)));
        assert!(!window.contains(now + Duration::minutes(89)));
        assert!(!window.contains(now + Duration::minutes(151)));
    }

    #[test]
    fn booking_24h_window_is_a_calendar_day_not_a_rolling_offset() {
        // 23:30 local: a rolling now+24h would reach into the day after
        // tomorrow, but the calendar-day rule still targets tomorrow.
        let late_evening = at("2026-03-10T23:30:00Z");
        assert_eq!(
            booking_reminder_day_24h(late_evening),
            NaiveDate::from_ymd_opt(2026, 3, 11).expect("valid date"),
        );

        let early_morning = at("2026-03-10T00:10:00Z");
        assert_eq!(
            booking_reminder_day_24h(early_morning),
            NaiveDate::from_ymd_opt(2026, 3, 11).expect("valid date"),
        );
    }

    #[test]
    fn booking_2h_window_bounds_are_exclusive() {
        let now = at("2026-03-10T10:05:00Z");
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date");

        // 12:00 is 1h55m out: inside.
        assert!(booking_starts_within_2h_window(
            now,
            today,
            NaiveTime::from_hms_opt(12, 0, 0).expect("valid time"),
        ));
        // Exactly 1.5h out: excluded.
        assert!(!booking_starts_within_2h_window(
            now,
            today,
            NaiveTime::from_hms_opt(11, 35, 0).expect("valid time"),
        ));
        // Exactly 2.5h out: excluded.
        assert!(!booking_starts_within_2h_window(
            now,
            today,
            NaiveTime::from_hms_opt(12, 35, 0).expect("valid time"),
        ));
        // Already departed: excluded.
        assert!(!booking_starts_within_2h_window(
            now,
            today,
            NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        ));
    }

    #[test]
    fn booking_2h_window_ignores_other_days() {
        let now = at("2026-03-10T22:30:00Z");
        let tomorrow = NaiveDate::from_ymd_opt(2026, 3, 11).expect("valid date");

        // Tomorrow 00:30 is two hours out on the clock but belongs to the
        // next calendar day, so the 2h scan does not pick it up.
        assert!(!booking_starts_within_2h_window(
            now,
            tomorrow,
            NaiveTime::from_hms_opt(0, 30, 0).expect("valid time"),
        ));
    }

    #[test]
    fn lead_phrasing_matches_subject_conventions() {
        assert_eq!(ReminderLead::Hours24.time_text(), "24 hours");
        assert_eq!(ReminderLead::Hours2.time_text(), "2 hours");
        assert!(ReminderLead::Hours2.is_urgent());
        assert!(!ReminderLead::Hours24.is_urgent());
    }
}
