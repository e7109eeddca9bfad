use icalendar::{Calendar, Component, Event, EventLike};

use crate::config::ClubConfig;
use crate::model::match_key::normalize_opponent;
use crate::model::Fixture;

/// Build a calendar with one VEVENT per fixture.
/// Home games carry the venue; ticket links go into URL and DESCRIPTION.
pub fn fixtures_calendar(fixtures: &[Fixture], club: &ClubConfig) -> Calendar {
    let mut calendar = Calendar::new();
    calendar.name(&format!("{} fixtures", club.name));

    for fixture in fixtures {
        let mut event = Event::new();
        event
            .uid(&event_uid(fixture))
            .summary(&fixture.title)
            .starts(fixture.start)
            .ends(fixture.end);
        if !fixture.location.is_empty() {
            event.location(&fixture.location);
        }
        if let Some(url) = &fixture.ticket_url {
            event.add_property("URL", url);
            event.description(&format!("Tickets: {}", url));
        }
        calendar.push(event.done());
    }

    calendar.done()
}

pub fn to_ics(fixtures: &[Fixture], club: &ClubConfig) -> String {
    fixtures_calendar(fixtures, club).to_string()
}

// Same fixture, same UID on every scrape.
fn event_uid(fixture: &Fixture) -> String {
    format!(
        "{}-{}@loko-fixtures",
        fixture.start.format("%Y%m%dT%H%MZ"),
        normalize_opponent(&fixture.title.replace('—', " ")).replace(' ', "-")
    )
}
