//! Calendar-invite deep links following the standard
//! `action=TEMPLATE&text&dates&details&location` query convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

const RENDER_ENDPOINT: &str = "https://calendar.google.com/calendar/render";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub description: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn google_calendar_link(event: &CalendarEvent) -> String {
    let dates = format!("{}/{}", compact_timestamp(event.start), compact_timestamp(event.end));

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("action", "TEMPLATE")
        .append_pair("text", &event.title)
        .append_pair("dates", &dates)
        .append_pair("details", &event.description)
        .append_pair("location", &event.location)
        .finish();

    format!("{RENDER_ENDPOINT}?{query}")
}

/// `20260314T103000Z` — RFC3339 stripped of separators and subseconds.
fn compact_timestamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}
