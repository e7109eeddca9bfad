use std::collections::HashMap;
use std::ops::Range;

use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use tracing::{info, instrument};

use crate::config::ClubConfig;
use crate::model::fixture::MATCH_DURATION_HOURS;
use crate::model::Fixture;

pub const DATE_PATTERN: &str = r"(?-u:\b)([0-9]{1,2})\.([0-9]{1,2})(?-u:\b)";
pub const TIME_PATTERN: &str = r"(?-u:\b)([0-9]{1,2}):([0-9]{2})(?-u:\b)";
pub const TEAM_PAIR_PATTERN: &str = r"(?i)(.+?)\s*(?:vs|—|-|:)\s*(.+)";

/// Date, time and the two team-name groups pulled out of a single line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineMatch {
    pub day: u32,
    pub month: u32,
    pub hour: u32,
    pub minute: u32,
    pub left: String,
    pub right: String,
}

/// Turns one line of schedule text into its raw components.
/// Returns `None` when any component is missing; the line is then ignored.
pub trait LineParser: Send + Sync {
    fn parse(&self, line: &str) -> Option<LineMatch>;
}

/// Default [`LineParser`] built from three independent regexes.
///
/// Each pattern can be replaced on its own:
/// - date: two capture groups, day then month
/// - time: two capture groups, hour then minute
/// - team pair: two capture groups, left then right team
#[derive(Clone, Debug)]
pub struct RegexLineParser {
    date: Regex,
    time: Regex,
    team_pair: Regex,
}

impl RegexLineParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            date: Regex::new(DATE_PATTERN)?,
            time: Regex::new(TIME_PATTERN)?,
            team_pair: Regex::new(TEAM_PAIR_PATTERN)?,
        })
    }

    pub fn with_date_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.date = Regex::new(pattern)?;
        Ok(self)
    }

    pub fn with_time_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.time = Regex::new(pattern)?;
        Ok(self)
    }

    pub fn with_team_pair_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.team_pair = Regex::new(pattern)?;
        Ok(self)
    }

    /// First `(day, month)` in the text and where it sits.
    pub fn find_date(&self, text: &str) -> Option<(u32, u32, Range<usize>)> {
        find_pair(&self.date, text)
    }

    /// First `(hour, minute)` in the text and where it sits.
    pub fn find_time(&self, text: &str) -> Option<(u32, u32, Range<usize>)> {
        find_pair(&self.time, text)
    }
}

impl LineParser for RegexLineParser {
    fn parse(&self, line: &str) -> Option<LineMatch> {
        let (day, month, date_span) = self.find_date(line)?;
        let (hour, minute, time_span) = self.find_time(line)?;

        // The time's colon would otherwise be taken as the team separator.
        let teams_text = blank_out(line, &[date_span, time_span]);
        let caps = self.team_pair.captures(teams_text.trim())?;
        let left = trim_team(caps.get(1)?.as_str()).to_string();
        let right = trim_team(caps.get(2)?.as_str()).to_string();
        if left.is_empty() || right.is_empty() {
            return None;
        }

        Some(LineMatch { day, month, hour, minute, left, right })
    }
}

fn find_pair(re: &Regex, text: &str) -> Option<(u32, u32, Range<usize>)> {
    let caps = re.captures(text)?;
    let first = caps.get(1)?.as_str().parse().ok()?;
    let second = caps.get(2)?.as_str().parse().ok()?;
    Some((first, second, caps.get(0)?.range()))
}

// Punctuation that separated the blanked-out date and time from the teams.
fn trim_team(group: &str) -> &str {
    group.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|'))
}

/// Replace every byte range with a single space.
fn blank_out(text: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, ch) in text.char_indices() {
        if spans.iter().any(|span| span.contains(&i)) {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Builds deduplicated [`Fixture`]s from rendered schedule lines.
#[derive(Clone, Debug)]
pub struct FixtureExtractor<P: LineParser = RegexLineParser> {
    parser: P,
    club: ClubConfig,
}

impl FixtureExtractor<RegexLineParser> {
    /// Extractor with the built-in patterns.
    pub fn for_club(club: ClubConfig) -> Result<Self, regex::Error> {
        Ok(Self::new(RegexLineParser::new()?, club))
    }
}

impl<P: LineParser> FixtureExtractor<P> {
    pub fn new(parser: P, club: ClubConfig) -> Self {
        Self { parser, club }
    }

    pub fn club(&self) -> &ClubConfig {
        &self.club
    }

    /// Extract fixtures from `lines`. `now` fixes the calendar year, taken in the club's timezone.
    ///
    /// Lines lacking a date, time or team pair, and lines where both or neither
    /// team mentions the club, are skipped silently. A later line with the same
    /// `(title, start)` replaces the earlier fixture in place.
    #[instrument(level = "info", skip(self, lines), fields(lines = lines.len()))]
    pub fn extract<S: AsRef<str>>(&self, lines: &[S], now: DateTime<Utc>) -> Vec<Fixture> {
        let year = now.with_timezone(&self.club.timezone).year();

        let mut fixtures: Vec<Fixture> = Vec::new();
        let mut positions: HashMap<(String, DateTime<Utc>), usize> = HashMap::new();

        for line in lines {
            let Some(fixture) = self.fixture_from_line(line.as_ref(), year) else {
                continue;
            };
            let key = (fixture.title.clone(), fixture.start);
            match positions.get(&key) {
                Some(&idx) => fixtures[idx] = fixture,
                None => {
                    positions.insert(key, fixtures.len());
                    fixtures.push(fixture);
                }
            }
        }

        info!(fixtures = fixtures.len(), "Extracted fixtures from schedule lines");
        fixtures
    }

    fn fixture_from_line(&self, line: &str, year: i32) -> Option<Fixture> {
        let m = self.parser.parse(line)?;

        let left_is_club = self.club.is_mentioned_in(&m.left);
        let right_is_club = self.club.is_mentioned_in(&m.right);
        let (is_home, title) = match (left_is_club, right_is_club) {
            (true, false) => (true, format!("{} — {}", self.club.name, m.right)),
            (false, true) => (false, format!("{} — {}", m.left, self.club.name)),
            _ => return None,
        };

        let start = kickoff(year, m.month, m.day, m.hour, m.minute, self.club.timezone)?;
        Some(Fixture {
            title,
            is_home,
            start,
            end: start + Duration::hours(MATCH_DURATION_HOURS),
            location: if is_home { self.club.venue.clone() } else { String::new() },
            ticket_url: None,
        })
    }
}

/// Wall-clock kickoff in `tz` converted to UTC.
///
/// Components are not range-checked: they are added onto January 1st so that
/// e.g. `31.04` rolls over to May 1st and `25:00` to the next day.
pub fn kickoff(year: i32, month: u32, day: u32, hour: u32, minute: u32, tz: Tz) -> Option<DateTime<Utc>> {
    let months = i64::from(month) - 1;
    let y = i32::try_from(i64::from(year) + months.div_euclid(12)).ok()?;
    let m = u32::try_from(months.rem_euclid(12)).ok()? + 1;

    let naive = NaiveDate::from_ymd_opt(y, m, 1)?.and_hms_opt(0, 0, 0)?
        + Duration::days(i64::from(day) - 1)
        + Duration::hours(i64::from(hour))
        + Duration::minutes(i64::from(minute));
    localize(naive, tz)
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        // Skipped by a DST jump: move forward past the gap.
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}
