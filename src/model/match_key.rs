use std::fmt;

/// Join key between schedule fixtures and ticket links:
/// `home:MM-DD HH:MM <normalized opponent>`.
///
/// Both sides of the join must build it through [`MatchKey::home`] so that
/// the strings are byte-identical for the same match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchKey(String);

impl MatchKey {
    pub fn home(month: u32, day: u32, hour: u32, minute: u32, opponent: &str) -> Self {
        MatchKey(format!(
            "home:{:02}-{:02} {:02}:{:02} {}",
            month,
            day,
            hour,
            minute,
            normalize_opponent(opponent)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim, collapse whitespace runs to a single space and lowercase.
pub fn normalize_opponent(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
