use std::env;
use std::time::Duration;

use chrono_tz::Tz;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SCHEDULE_URL: &str = "https://www.fclm.ru/schedule/";
pub const DEFAULT_TICKETS_URL: &str = "https://www.fclm.ru/tickets/";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome Safari";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "ru,en;q=0.9";
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 60;

/// The club whose fixtures are tracked.
#[derive(Debug, Clone)]
pub struct ClubConfig {
    /// Canonical display name, used in titles and stripped when building match keys.
    pub name: String,
    // Lowercased name used for case-insensitive "mentions the club" checks
    match_token: String,
    /// Home venue, attached to home fixtures only.
    pub venue: String,
    /// Zone the schedule page prints its wall-clock times in.
    pub timezone: Tz,
}

impl ClubConfig {
    pub fn new(name: impl Into<String>, venue: impl Into<String>, timezone: Tz) -> Self {
        let name = name.into();
        let match_token = name.trim().to_lowercase();
        Self { name, match_token, venue: venue.into(), timezone }
    }

    /// Case-insensitive check whether a team-name fragment refers to the club.
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        !self.match_token.is_empty() && text.to_lowercase().contains(&self.match_token)
    }

    /// Prefix that home titles start with, e.g. `"Локомотив — "`.
    pub fn home_title_prefix(&self) -> String {
        format!("{} — ", self.name)
    }
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self::new("Локомотив", "РЖД Арена, Москва", chrono_tz::Europe::Moscow)
    }
}

/// Page-fetching settings shared by every renderer session.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub navigation_timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
        }
    }
}

/// Startup configuration, read once in `main` and handed to the router.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub schedule_url: String,
    pub tickets_url: String,
    pub render: RenderConfig,
    pub club: ClubConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            schedule_url: DEFAULT_SCHEDULE_URL.to_string(),
            tickets_url: DEFAULT_TICKETS_URL.to_string(),
            render: RenderConfig::default(),
            club: ClubConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build the configuration from environment variables, falling back to defaults.
    /// Only an unknown `CLUB_TIMEZONE` is an error.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] but with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = var("PORT").and_then(|s| s.parse().ok()).unwrap_or(defaults.port);
        let timeout_secs = var("NAVIGATION_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_NAVIGATION_TIMEOUT_SECS);

        let timezone = match var("CLUB_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| format!("Invalid CLUB_TIMEZONE {:?}: {}", name, e))?,
            None => defaults.club.timezone,
        };
        let club = ClubConfig::new(
            var("CLUB_NAME").unwrap_or(defaults.club.name),
            var("CLUB_VENUE").unwrap_or(defaults.club.venue),
            timezone,
        );

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port,
            schedule_url: var("SCHEDULE_URL").unwrap_or(defaults.schedule_url),
            tickets_url: var("TICKETS_URL").unwrap_or(defaults.tickets_url),
            render: RenderConfig {
                user_agent: var("USER_AGENT").unwrap_or(defaults.render.user_agent),
                accept_language: var("ACCEPT_LANGUAGE").unwrap_or(defaults.render.accept_language),
                navigation_timeout: Duration::from_secs(timeout_secs),
            },
            club,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
