use std::collections::HashMap;

use chrono::{Datelike, Timelike};
use tracing::info;

use crate::config::ClubConfig;
use crate::model::{Fixture, MatchKey};

/// Key a home fixture would have on the tickets page. Away fixtures have none.
pub fn match_key_for(fixture: &Fixture, club: &ClubConfig) -> Option<MatchKey> {
    if !fixture.is_home {
        return None;
    }
    let local = fixture.start.with_timezone(&club.timezone);
    let prefix = club.home_title_prefix();
    let opponent = fixture.title.strip_prefix(prefix.as_str()).unwrap_or(&fixture.title);
    Some(MatchKey::home(local.month(), local.day(), local.hour(), local.minute(), opponent))
}

/// Attach ticket URLs to home fixtures found in `tickets`. Returns how many were attached.
pub fn attach_tickets(fixtures: &mut [Fixture], tickets: &HashMap<MatchKey, String>, club: &ClubConfig) -> usize {
    let mut attached = 0;
    for fixture in fixtures.iter_mut() {
        let Some(key) = match_key_for(fixture, club) else {
            continue;
        };
        if let Some(url) = tickets.get(&key) {
            fixture.ticket_url = Some(url.clone());
            attached += 1;
        }
    }
    info!(attached, "Attached ticket links to home fixtures");
    attached
}
