use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Fixed length of a match slot; the schedule page carries no end time.
pub const MATCH_DURATION_HOURS: i64 = 2;

/// One scheduled match involving the club.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    /// `"Home — Away"` with the club's canonical name on its side.
    pub title: String,
    pub is_home: bool,
    #[serde(rename = "startISO", serialize_with = "serialize_iso")]
    pub start: DateTime<Utc>,
    #[serde(rename = "endISO", serialize_with = "serialize_iso")]
    pub end: DateTime<Utc>,
    /// Venue for home games, empty for away games.
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_url: Option<String>,
}

impl Fixture {
    pub fn is_away(&self) -> bool {
        !self.is_home
    }
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2026-04-12T16:00:00.000Z`.
pub fn iso_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso_millis(dt))
}
